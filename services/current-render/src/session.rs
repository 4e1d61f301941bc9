//! Replays a viewport session and writes one PNG per frame.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use current_common::CurrentSample;
use renderer::png::encode_pixmap;
use renderer::{FrameStats, GeoViewport, VectorFieldOverlay};
use tracing::{info, warn};

use crate::config::SessionConfig;

/// Summary of a finished session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub frames: Vec<PathBuf>,
    pub redraws: u64,
    pub glyphs: usize,
    /// Redraw count when glyphs were last added.
    counted_redraws: u64,
}

/// Attach an overlay, write the initial frame, then apply each step and
/// write a frame after it.
pub fn run_session(
    config: &SessionConfig,
    samples: Vec<CurrentSample>,
    output_dir: &Path,
) -> Result<SessionReport> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let viewport = Rc::new(RefCell::new(config.viewport.build()?));
    let mut overlay = VectorFieldOverlay::new(config.overlay.clone())?;
    overlay
        .attach(Rc::clone(&viewport), samples, config.opacity)
        .context("Failed to attach overlay")?;

    let mut report = SessionReport::default();
    write_frame(&viewport, &overlay, output_dir, 0, "attach", &mut report)?;

    for (i, step) in config.steps.iter().enumerate() {
        step.apply(&mut viewport.borrow_mut());
        write_frame(&viewport, &overlay, output_dir, i + 1, step.name(), &mut report)?;
    }

    report.redraws = overlay.redraw_count();
    overlay.detach();

    Ok(report)
}

fn write_frame(
    viewport: &RefCell<GeoViewport>,
    overlay: &VectorFieldOverlay,
    output_dir: &Path,
    index: usize,
    reason: &str,
    report: &mut SessionReport,
) -> Result<()> {
    let path = output_dir.join(format!("frame_{:03}.png", index));

    let Some(pixmap) = viewport.borrow().compose() else {
        warn!(frame = index, reason, "Viewport has no area, skipping frame");
        return Ok(());
    };
    let png = encode_pixmap(&pixmap)?;
    std::fs::write(&path, &png).with_context(|| format!("Failed to write frame {:?}", path))?;

    // A frame composed without a new redraw shows glyphs already counted.
    let redraws = overlay.redraw_count();
    let stats: FrameStats = if redraws > report.counted_redraws {
        report.counted_redraws = redraws;
        overlay.last_frame().unwrap_or_default()
    } else {
        FrameStats::default()
    };
    report.glyphs += stats.glyphs;
    info!(
        frame = index,
        reason,
        path = %path.display(),
        bytes = png.len(),
        grid_points = stats.grid_points,
        glyphs = stats.glyphs,
        too_far = stats.too_far,
        too_slow = stats.too_slow,
        "Wrote frame"
    );

    report.frames.push(path);
    Ok(())
}
