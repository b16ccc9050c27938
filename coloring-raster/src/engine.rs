//! The coloring canvas engine.
//!
//! Binds the five subsystems - surface, input pipeline, stroke rendering,
//! line-art overlay, and progress persistence - behind the boundary contract
//! the host UI consumes: pointer/touch entry points, tool selection, a
//! completion callback, and a capture operation. The host owns the event
//! loop; every call here is synchronous and returns before the next event.

use std::time::{Duration, Instant};

use coloring_core::{
    BrushKind, InputPipeline, Point, ProgressStore, Rgba, SaveScheduler, Size, StrokeEvent,
    Tool, TouchPoint, ViewportTransform, DEFAULT_QUIET_PERIOD,
};
use image::imageops;

use crate::codec;
use crate::error::RasterResult;
use crate::lineart::{multiply_blend, LineArtOverlay, OverlayCache};
use crate::stroke::StrokeEngine;
use crate::surface::{fit_dimensions, RasterSurface};

/// Default logical canvas width (portrait phone layout).
const DEFAULT_WIDTH: f32 = 360.0;

/// Default logical canvas height.
const DEFAULT_HEIGHT: f32 = 480.0;

/// Configuration for one canvas instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Logical container size in CSS pixels.
    pub container: Size,
    /// Device pixel ratio used to size the backing buffer.
    pub device_pixel_ratio: f32,
    /// Layered mode: color on a blank surface beneath a line-art overlay.
    /// Flat mode bakes the background image into the drawable surface.
    pub layered: bool,
    /// Opaque persistence key. `None` disables persistence entirely.
    pub save_key: Option<String>,
    /// Quiet period before a scheduled progress save fires.
    pub quiet_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            container: Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            device_pixel_ratio: 1.0,
            layered: true,
            save_key: None,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Lifecycle of the line-art overlay for the current background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// No background requested.
    None,
    /// A background was requested but its pixels have not arrived yet; the
    /// host shows a processing indicator and must not composite an overlay.
    /// The surface stays interactive meanwhile.
    Pending,
    /// The overlay for the current background is ready to composite.
    Ready,
}

/// The embeddable coloring canvas engine.
pub struct ColoringEngine {
    config: EngineConfig,
    surface: RasterSurface,
    pipeline: InputPipeline,
    strokes: StrokeEngine,
    overlays: OverlayCache,
    overlay_key: Option<String>,
    pending_key: Option<String>,
    background: Option<image::RgbaImage>,
    store: Option<Box<dyn ProgressStore>>,
    scheduler: SaveScheduler,
    tool: Tool,
    color: Rgba,
    size: f32,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl ColoringEngine {
    /// Create an engine. Persistence is active only when both a save key
    /// (in `config`) and a store are supplied.
    #[must_use]
    pub fn new(config: EngineConfig, store: Option<Box<dyn ProgressStore>>) -> Self {
        let surface = RasterSurface::new(config.container, config.device_pixel_ratio);
        let pipeline = InputPipeline::new(config.container);
        let scheduler = SaveScheduler::with_quiet_period(config.quiet_period);
        let default_brush = BrushKind::Brush;
        Self {
            config,
            surface,
            pipeline,
            strokes: StrokeEngine::new(),
            overlays: OverlayCache::new(),
            overlay_key: None,
            pending_key: None,
            background: None,
            store,
            scheduler,
            tool: Tool::Brush(default_brush),
            color: Rgba::BLACK,
            size: default_brush.spec().default_size,
            on_complete: None,
        }
    }

    /// Attach the completion callback, invoked exactly once by
    /// [`complete`](Self::complete).
    #[must_use]
    pub fn with_completion(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The raster surface (read-only).
    #[must_use]
    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// The current viewport transform.
    #[must_use]
    pub fn viewport(&self) -> ViewportTransform {
        self.pipeline.viewport()
    }

    /// The overlay lifecycle state for the current background.
    #[must_use]
    pub fn overlay_state(&self) -> OverlayState {
        if self.pending_key.is_some() {
            OverlayState::Pending
        } else if self.overlay_key.is_some() {
            OverlayState::Ready
        } else {
            OverlayState::None
        }
    }

    /// Whether persistence is active for this instance.
    #[must_use]
    pub fn persistence_enabled(&self) -> bool {
        self.config.save_key.is_some() && self.store.is_some()
    }

    // -----------------------------------------------------------------------
    // Background and overlay
    // -----------------------------------------------------------------------

    /// Announce that a background image is being fetched for `key`. Until
    /// [`supply_background`](Self::supply_background) delivers its bytes the
    /// overlay state reads [`OverlayState::Pending`] and no overlay may be
    /// composited; drawing continues normally underneath.
    pub fn request_background(&mut self, key: &str) {
        self.pending_key = Some(key.to_string());
    }

    /// Deliver the fetched background bytes for `key`.
    ///
    /// In flat mode the image is baked fit-and-centered into the surface.
    /// In layered mode the surface is left untouched (it stays white plus
    /// whatever the user drew) and a line-art overlay is derived, at most
    /// once per distinct key. An undecodable image is logged and leaves the
    /// canvas in its prior state.
    pub fn supply_background(&mut self, key: &str, data: &[u8]) {
        if self.pending_key.as_deref() == Some(key) {
            self.pending_key = None;
        }
        if self.config.layered {
            self.overlays.get_or_extract(key, data);
            // Keep the decoded original around for degraded-mode capture.
            self.background = codec::decode_image(data).ok();
            self.overlay_key = Some(key.to_string());
        } else {
            match codec::decode_image(data) {
                Ok(decoded) => {
                    self.surface.draw_background(&decoded);
                    self.background = Some(decoded);
                }
                Err(e) => {
                    tracing::warn!("background image failed to decode, keeping prior surface: {e}");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tool selection
    // -----------------------------------------------------------------------

    /// Select the active tool.
    pub fn select_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if let Tool::Brush(kind) = tool {
            self.size = kind.spec().clamp_size(self.size);
        }
    }

    /// Select the stroke color.
    pub fn select_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Select the stroke size (diameter, logical pixels). Clamped to the
    /// active brush's range when a stroke begins.
    pub fn select_size(&mut self, size: f32) {
        self.size = size;
    }

    // -----------------------------------------------------------------------
    // Input entry points
    // -----------------------------------------------------------------------

    /// Pointer pressed at a container-relative position.
    pub fn pointer_down(&mut self, at: Point) {
        let event = self.pipeline.pointer_down(at);
        self.dispatch(event);
    }

    /// Pointer dragged.
    pub fn pointer_move(&mut self, at: Point) {
        let event = self.pipeline.pointer_move(at);
        self.dispatch(event);
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        let event = self.pipeline.pointer_up();
        self.dispatch(event);
    }

    /// Pointer left the canvas; a stroke in progress ends here.
    pub fn pointer_leave(&mut self) {
        let event = self.pipeline.pointer_leave();
        self.dispatch(event);
    }

    /// Touches landed.
    pub fn touch_start(&mut self, touches: &[TouchPoint]) {
        let event = self.pipeline.touch_start(touches);
        self.dispatch(event);
    }

    /// Touches moved.
    pub fn touch_move(&mut self, touches: &[TouchPoint]) {
        let event = self.pipeline.touch_move(touches);
        self.dispatch(event);
    }

    /// Touches lifted; `remaining` holds the touches still down.
    pub fn touch_end(&mut self, remaining: &[TouchPoint]) {
        let event = self.pipeline.touch_end(remaining);
        self.dispatch(event);
    }

    /// Toggle zoom mode: while active, touches pan and pinch instead of
    /// drawing.
    pub fn set_zoom_mode(&mut self, enabled: bool) {
        let event = self.pipeline.set_zoom_mode(enabled);
        self.dispatch(event);
    }

    /// Reset zoom and pan to the identity view.
    pub fn reset_view(&mut self) {
        self.pipeline.reset_view();
    }

    fn dispatch(&mut self, event: Option<StrokeEvent>) {
        match event {
            Some(StrokeEvent::Begin(at)) => {
                self.strokes
                    .begin_stroke(&mut self.surface, at, self.tool, self.color, self.size);
            }
            Some(StrokeEvent::Extend { from, to }) => {
                self.strokes.extend_stroke(&mut self.surface, from, to);
            }
            Some(StrokeEvent::End) => {
                if self.strokes.end_stroke() && self.persistence_enabled() {
                    self.scheduler.note_activity(Instant::now());
                }
            }
            None => {}
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Resize the canvas to a new logical container size.
    ///
    /// The backing buffer is destroyed and reinitialized blank; an
    /// in-progress stroke is abandoned and any pending save is cancelled so
    /// the blank buffer cannot clobber a previously saved record.
    pub fn resize(&mut self, container: Size) {
        self.config.container = container;
        self.surface.resize(container);
        self.pipeline.set_container(container);
        self.strokes.abandon();
        self.scheduler.cancel();
        // The overlay is derived from the background, not the surface, so it
        // survives the resize; only flat mode has to rebake the image.
        if !self.config.layered {
            if let Some(ref bg) = self.background {
                let bg = bg.clone();
                self.surface.draw_background(&bg);
            }
        }
    }

    /// Poll the save scheduler. The host calls this from its idle loop; a
    /// save fires only after the quiet period has elapsed since the last
    /// stroke completion.
    pub fn tick(&mut self, now: Instant) {
        if self.scheduler.poll(now) {
            self.save_progress();
        }
    }

    /// Serialize the surface and write it under the save key immediately.
    ///
    /// Storage failures are logged and swallowed; drawing continues
    /// unaffected.
    pub fn save_progress(&mut self) {
        let Some(key) = self.config.save_key.clone() else {
            return;
        };
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let record = match codec::encode_record(&self.surface.flatten()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("progress encoding failed: {e}");
                return;
            }
        };
        if let Err(e) = store.set(&key, &record) {
            tracing::warn!("progress save failed for {key}: {e}");
        } else {
            tracing::debug!("progress saved for {key}");
        }
    }

    /// Restore saved progress onto the surface, if a record exists.
    /// Returns whether anything was restored.
    pub fn load_progress(&mut self) -> bool {
        let Some(key) = self.config.save_key.as_deref() else {
            return false;
        };
        let Some(record) = self.store.as_ref().and_then(|s| s.get(key)) else {
            return false;
        };
        match codec::decode_record(&record) {
            Ok(saved) => {
                self.surface.restore_from(&saved);
                true
            }
            Err(e) => {
                tracing::warn!("saved progress for {key} is unreadable: {e}");
                false
            }
        }
    }

    /// Start over: blank the surface and delete the stored record, so a
    /// later load finds nothing until the next save.
    pub fn start_over(&mut self) {
        self.surface.clear();
        self.scheduler.cancel();
        if !self.config.layered {
            if let Some(ref bg) = self.background {
                let bg = bg.clone();
                self.surface.draw_background(&bg);
            }
        }
        if let (Some(key), Some(store)) = (self.config.save_key.as_deref(), self.store.as_mut()) {
            store.remove(key);
        }
    }

    /// Signal that the user is done coloring. Invokes the completion
    /// callback; repeated calls are no-ops.
    pub fn complete(&mut self) {
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }

    /// Tear down before unmount: cancels any pending debounced save. No
    /// final synchronous save is attempted - progress since the last fired
    /// save is accepted as lost on abrupt close.
    pub fn unmount(&mut self) {
        self.scheduler.cancel();
        self.strokes.abandon();
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    /// Render the current visible composition - coloring plus any overlay -
    /// to a single flattened PNG.
    ///
    /// Zoom/pan is temporarily reset so the capture covers the full artwork,
    /// then the prior view is restored.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the PNG encoder fails.
    pub fn capture_composition(&mut self) -> RasterResult<Vec<u8>> {
        let prior_view = self.pipeline.viewport();
        self.pipeline.reset_view();

        let mut composed = self.surface.flatten();
        if self.config.layered {
            match self.overlay_key.as_deref().and_then(|k| self.overlays.peek(k)) {
                Some(LineArtOverlay::Extracted(mask)) => {
                    let (x, y, w, h) = fit_dimensions(mask.dimensions(), composed.dimensions());
                    let resized = imageops::resize(mask, w, h, imageops::FilterType::Lanczos3);
                    imageops::overlay(&mut composed, &resized, x, y);
                }
                Some(LineArtOverlay::Original) => {
                    if let Some(ref bg) = self.background {
                        multiply_blend(&mut composed, bg);
                    }
                }
                None => {}
            }
        }
        let encoded = codec::encode_png(&composed);

        self.pipeline.set_viewport(prior_view);
        encoded
    }
}
