//! Streamline overlay kept in sync with a map viewport.
//!
//! The overlay owns at most one surface in its viewport's overlay pane and
//! one view-change subscription. Every redraw clears the surface, walks a
//! fixed-pixel grid, matches each grid point to its nearest current sample
//! and paints a streamline stub for matches that are close and fast enough.
//!
//! Redraws are synchronous: they run inside `attach`, `update_samples`, or the
//! viewport's event dispatch. The listener only holds a weak reference to the
//! overlay state plus the generation of the attachment that registered it.
//! `detach` bumps the generation, so a listener the host still holds can never
//! draw into a later attachment. When the viewport is borrowed during
//! `detach`, its surface and listener are released on the next overlay call.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use current_common::CurrentSample;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::field::CurrentField;
use crate::glyph::streamline_stub;
use crate::surface::{SharedSurface, SurfaceId};
use crate::viewport::{MapViewport, SubscriptionId, ViewportProjection};

/// Counters for one redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Grid points visited.
    pub grid_points: usize,
    /// Glyphs painted.
    pub glyphs: usize,
    /// Grid points with no sample within the proximity threshold.
    pub too_far: usize,
    /// Grid points whose nearest sample was too slow to draw.
    pub too_slow: usize,
}

struct OverlayState {
    config: OverlayConfig,
    field: CurrentField,
    surface: Option<SharedSurface>,
    last_frame: Option<FrameStats>,
    redraws: u64,
    /// Bumped on every attach and detach.
    generation: u64,
    /// Samples changed while the viewport could not be read.
    pending_redraw: bool,
}

impl OverlayState {
    fn handle_view_change(&mut self, view: &dyn ViewportProjection) {
        let Some(surface) = &self.surface else {
            return;
        };
        surface.borrow_mut().resize(view.pixel_size());
        self.redraw(view, "view_change");
    }

    fn redraw<P>(&mut self, view: &P, reason: &'static str) -> FrameStats
    where
        P: ViewportProjection + ?Sized,
    {
        let Some(surface) = &self.surface else {
            return FrameStats::default();
        };
        let mut surface = surface.borrow_mut();
        self.pending_redraw = false;

        let size = surface.size();
        if size.is_empty() {
            debug!(reason, "Skipping redraw of empty surface");
            return FrameStats::default();
        }

        surface.clear();

        let spacing = self.config.grid_spacing_px as usize;
        let mut stats = FrameStats::default();

        for x in (0..size.width).step_by(spacing) {
            for y in (0..size.height).step_by(spacing) {
                stats.grid_points += 1;

                let (px, py) = (x as f64, y as f64);
                let Some(m) = self.field.nearest(view.pixel_to_geo(px, py)) else {
                    stats.too_far += 1;
                    continue;
                };

                let sample = self.field.sample(&m);
                if !(sample.speed > self.config.min_visible_speed) {
                    stats.too_slow += 1;
                    continue;
                }

                surface.draw_glyph(&streamline_stub(px, py, sample, &self.config));
                stats.glyphs += 1;
            }
        }

        self.redraws += 1;
        self.last_frame = Some(stats);

        debug!(
            reason,
            width = size.width,
            height = size.height,
            samples = self.field.len(),
            bucketed = self.field.is_bucketed(),
            grid_points = stats.grid_points,
            glyphs = stats.glyphs,
            too_far = stats.too_far,
            too_slow = stats.too_slow,
            "Redrew streamline overlay"
        );

        stats
    }
}

struct Attachment {
    viewport: Rc<RefCell<dyn MapViewport>>,
    surface_id: SurfaceId,
    subscription: SubscriptionId,
}

impl Attachment {
    /// Hand the surface and listener back to the host. Gives the attachment
    /// back if the viewport is borrowed.
    fn release(self) -> Result<(), Attachment> {
        let released = match self.viewport.try_borrow_mut() {
            Ok(mut vp) => {
                vp.off_view_change(self.subscription);
                vp.remove_surface(self.surface_id);
                true
            }
            Err(_) => false,
        };
        if released {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Draws a current vector field as streamline stubs over a map viewport.
pub struct VectorFieldOverlay {
    state: Rc<RefCell<OverlayState>>,
    attachment: Option<Attachment>,
    /// Detached attachments whose viewport was busy at the time.
    orphans: Vec<Attachment>,
}

impl VectorFieldOverlay {
    pub fn new(config: OverlayConfig) -> OverlayResult<Self> {
        config.validate()?;
        let field = CurrentField::new(Vec::new(), &config);
        Ok(Self {
            state: Rc::new(RefCell::new(OverlayState {
                config,
                field,
                surface: None,
                last_frame: None,
                redraws: 0,
                generation: 0,
                pending_redraw: false,
            })),
            attachment: None,
            orphans: Vec::new(),
        })
    }

    /// Attach to `viewport`, replacing any previous attachment.
    ///
    /// Creates a surface covering the viewport, draws the field once and
    /// subscribes to view changes. If the viewport is borrowed or cannot
    /// provide a surface, `SurfaceUnavailable` is returned and the overlay is
    /// left detached.
    pub fn attach<V>(
        &mut self,
        viewport: Rc<RefCell<V>>,
        samples: Vec<CurrentSample>,
        opacity: f32,
    ) -> OverlayResult<()>
    where
        V: MapViewport + 'static,
    {
        self.detach();

        let opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        let viewport: Rc<RefCell<dyn MapViewport>> = viewport;
        let mut vp = viewport
            .try_borrow_mut()
            .map_err(|_| OverlayError::SurfaceUnavailable("viewport is busy".to_string()))?;

        let generation = {
            let mut state = self.state.borrow_mut();
            let field = CurrentField::new(samples, &state.config);
            state.field = field;
            state.generation += 1;
            state.generation
        };

        let (surface_id, surface) = vp.attach_surface()?;
        {
            let mut s = surface.borrow_mut();
            s.set_opacity(opacity);
            s.resize(vp.pixel_size());
        }

        let mut state = self.state.borrow_mut();
        state.surface = Some(surface);
        let stats = state.redraw(&*vp, "attach");
        drop(state);

        let weak: Weak<RefCell<OverlayState>> = Rc::downgrade(&self.state);
        let subscription = vp.on_view_change(Box::new(move |view: &dyn ViewportProjection| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            match state.try_borrow_mut() {
                Ok(mut state) if state.generation == generation => {
                    state.handle_view_change(view)
                }
                Ok(_) => debug!(generation, "Ignoring view change for a stale attachment"),
                Err(_) => warn!("Overlay busy, dropping view change"),
            };
        }));

        let size = vp.pixel_size();
        drop(vp);

        info!(
            width = size.width,
            height = size.height,
            opacity,
            glyphs = stats.glyphs,
            "Attached streamline overlay"
        );

        self.attachment = Some(Attachment {
            viewport,
            surface_id,
            subscription,
        });
        Ok(())
    }

    /// Remove the surface and unsubscribe. Does nothing when detached.
    ///
    /// The overlay stops drawing immediately. If the viewport is borrowed
    /// (for example when called from inside its own dispatch) the host keeps
    /// the surface and an inert listener until the next overlay call.
    pub fn detach(&mut self) {
        self.release_orphans();

        let Some(attachment) = self.attachment.take() else {
            return;
        };

        {
            let mut state = self.state.borrow_mut();
            state.surface = None;
            state.generation += 1;
            state.pending_redraw = false;
        }

        match attachment.release() {
            Ok(()) => info!("Detached streamline overlay"),
            Err(attachment) => {
                warn!("Viewport busy during detach, releasing surface and listener later");
                self.orphans.push(attachment);
            }
        }
    }

    fn release_orphans(&mut self) {
        if self.orphans.is_empty() {
            return;
        }
        for orphan in std::mem::take(&mut self.orphans) {
            match orphan.release() {
                Ok(()) => debug!("Released surface and listener of an earlier attachment"),
                Err(orphan) => self.orphans.push(orphan),
            }
        }
    }

    /// Replace the samples and redraw immediately when attached.
    ///
    /// If the viewport is mutably borrowed the old frame stays on screen and
    /// the redraw is marked pending. The next view change, `update_samples`
    /// or [`refresh`](Self::refresh) draws it.
    pub fn update_samples(&mut self, samples: Vec<CurrentSample>) {
        self.release_orphans();

        let mut state = self.state.borrow_mut();
        let field = CurrentField::new(samples, &state.config);
        state.field = field;

        let Some(attachment) = &self.attachment else {
            return;
        };
        match attachment.viewport.try_borrow() {
            Ok(vp) => {
                state.redraw(&*vp, "samples");
            }
            Err(_) => {
                state.pending_redraw = true;
                warn!("Viewport busy, sample update deferred");
            }
        };
    }

    /// Run a redraw that `update_samples` had to defer. Returns true when
    /// one ran.
    pub fn refresh(&mut self) -> bool {
        self.release_orphans();

        let Some(attachment) = &self.attachment else {
            return false;
        };
        let mut state = self.state.borrow_mut();
        if !state.pending_redraw {
            return false;
        }
        let Ok(vp) = attachment.viewport.try_borrow() else {
            return false;
        };
        state.redraw(&*vp, "refresh");
        true
    }

    /// Whether the surface shows samples older than the current ones.
    pub fn has_pending_redraw(&self) -> bool {
        self.state.borrow().pending_redraw
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn config(&self) -> OverlayConfig {
        self.state.borrow().config.clone()
    }

    /// Stats of the most recent completed redraw.
    pub fn last_frame(&self) -> Option<FrameStats> {
        self.state.borrow().last_frame
    }

    /// Number of completed redraws since creation.
    pub fn redraw_count(&self) -> u64 {
        self.state.borrow().redraws
    }
}

impl Drop for VectorFieldOverlay {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelSize;
    use crate::viewport::{GeoViewport, Projection};
    use current_common::GeoPoint;

    fn viewport(width: u32, height: u32) -> Rc<RefCell<GeoViewport>> {
        Rc::new(RefCell::new(GeoViewport::new(
            Projection::Equirectangular,
            GeoPoint::new(10.0, 75.0),
            0.01,
            PixelSize::new(width, height),
        )))
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = OverlayConfig {
            segments: 0,
            ..OverlayConfig::default()
        };
        assert!(VectorFieldOverlay::new(config).is_err());
    }

    #[test]
    fn test_drop_releases_surface_and_listener() {
        let vp = viewport(100, 100);
        {
            let mut overlay = VectorFieldOverlay::new(OverlayConfig::default()).unwrap();
            overlay
                .attach(Rc::clone(&vp), vec![CurrentSample::new(10.0, 75.0, 0.5, 90.0)], 0.7)
                .unwrap();
            assert_eq!(vp.borrow().surface_count(), 1);
            assert_eq!(vp.borrow().listener_count(), 1);
        }
        assert_eq!(vp.borrow().surface_count(), 0);
        assert_eq!(vp.borrow().listener_count(), 0);
    }

    #[test]
    fn test_update_samples_while_detached_is_stored() {
        let mut overlay = VectorFieldOverlay::new(OverlayConfig::default()).unwrap();
        overlay.update_samples(vec![CurrentSample::new(0.0, 0.0, 0.5, 0.0)]);
        assert_eq!(overlay.redraw_count(), 0);
        assert!(overlay.last_frame().is_none());
    }
}
