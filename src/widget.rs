// ============================================================================
// WIDGET
// ============================================================================
//
// Owns configuration, the size-dependent layout, Render State and the
// sequencer. Everything runs on the caller's thread: input and ticks go in,
// frames come out through a `FrameSink`.

use std::time::Duration;

use tracing::debug;

use crate::config::ForwardConfig;
use crate::geometry::{ArcLayout, GeometrySnapshot, Size};
use crate::listener::AnimationListener;
use crate::render::measure_label;
use crate::sequencer::{Activation, Choreography, Sequencer, Timing};
use crate::state::RenderState;

/// Receives one frame worth of state and derived geometry
pub trait FrameSink {
    fn render(&mut self, state: &RenderState, geometry: &GeometrySnapshot);
}

pub struct Widget {
    config: ForwardConfig,
    layout: ArcLayout,
    state: RenderState,
    sequencer: Sequencer,
    listeners: Vec<Box<dyn AnimationListener>>,
    label_width: f32,
}

impl Widget {
    /// Creates a zero-sized widget; call `resize` before the first frame
    pub fn new(config: ForwardConfig) -> Self {
        let label_width = measure_label(&config.shifting_label(), None, config.text_size);
        let layout = ArcLayout::new(Size::default(), config.margins());
        Self {
            config,
            layout,
            state: RenderState::default(),
            sequencer: Sequencer::new(),
            listeners: Vec::new(),
            label_width,
        }
    }

    /// Registers another listener; all of them see every notification
    pub fn add_listener(&mut self, listener: impl AnimationListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Overrides the estimated width of the "+N" label, e.g. once a font is loaded
    pub fn set_label_width(&mut self, width: f32) {
        self.label_width = width.max(0.0);
    }

    pub fn config(&self) -> &ForwardConfig {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn layout(&self) -> &ArcLayout {
        &self.layout
    }

    pub fn label_width(&self) -> f32 {
        self.label_width
    }

    pub fn is_animating(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.layout = ArcLayout::new(
            Size::new(width as f32, height as f32),
            self.config.margins(),
        );
        debug!(width, height, bounds = ?self.layout.base_bounds(), "layout rebuilt");
    }

    /// Pointer or touch release; activates only inside the arc as drawn.
    ///
    /// Returns `None` when the release missed the arc.
    pub fn release_at(&mut self, x: f32, y: f32) -> Option<Activation> {
        if !self.layout.hit_test(x, y, &self.state) {
            return None;
        }
        Some(self.activate())
    }

    pub fn activate(&mut self) -> Activation {
        let choreography = Choreography::new(&self.timing());
        self.sequencer
            .trigger(choreography, &mut self.state, &mut self.listeners)
    }

    pub fn cancel(&mut self) -> bool {
        self.sequencer.cancel(&mut self.state)
    }

    /// Moves the choreography forward; returns whether a repaint is needed
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.sequencer
            .advance(dt, &mut self.state, &mut self.listeners)
    }

    pub fn geometry(&self) -> GeometrySnapshot {
        self.layout.snapshot(&self.state)
    }

    pub fn frame(&self, sink: &mut dyn FrameSink) {
        sink.render(&self.state, &self.geometry());
    }

    fn timing(&self) -> Timing {
        let margins = self.config.margins();
        Timing {
            base_ms: self.config.base_duration_ms(),
            end_scale: self.config.end_scale(),
            rotation_extent: self.config.arc_rotation_angle,
            shift_from: margins.arrow / 2.0,
            shift_to: self.layout.size().center_x() - self.label_width + margins.arc,
        }
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("layout", &self.layout)
            .field("state", &self.state)
            .field("sequencer", &self.sequencer)
            .field("label_width", &self.label_width)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::Callbacks;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Capture(Vec<(RenderState, GeometrySnapshot)>);

    impl FrameSink for Capture {
        fn render(&mut self, state: &RenderState, geometry: &GeometrySnapshot) {
            self.0.push((*state, *geometry));
        }
    }

    fn sized_widget() -> Widget {
        let mut widget = Widget::new(ForwardConfig::default());
        widget.resize(720, 360);
        widget
    }

    #[test]
    fn release_outside_arc_is_ignored() {
        let mut widget = sized_widget();
        assert_eq!(widget.release_at(600.0, 200.0), None);
        assert!(!widget.is_animating());
    }

    #[test]
    fn release_inside_arc_starts_chain_once() {
        let starts = Rc::new(Cell::new(0));
        let mut widget = sized_widget();
        widget.add_listener(Callbacks::new().on_start({
            let starts = starts.clone();
            move || starts.set(starts.get() + 1)
        }));

        assert_eq!(widget.release_at(160.0, 200.0), Some(Activation::Started));
        assert_eq!(widget.release_at(160.0, 200.0), Some(Activation::Ignored));
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn listener_and_callbacks_both_fire() {
        struct Counter(Rc<Cell<u32>>);

        impl AnimationListener for Counter {
            fn on_animation_end(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let object_ends = Rc::new(Cell::new(0));
        let closure_ends = Rc::new(Cell::new(0));
        let mut widget = sized_widget();
        widget.add_listener(Counter(object_ends.clone()));
        widget.add_listener(Callbacks::new().on_end({
            let closure_ends = closure_ends.clone();
            move || closure_ends.set(closure_ends.get() + 1)
        }));

        widget.activate();
        widget.advance(Duration::from_secs(2));
        assert_eq!(object_ends.get(), 1);
        assert_eq!(closure_ends.get(), 1);
    }

    #[test]
    fn shift_target_uses_current_size_and_label() {
        let mut widget = sized_widget();
        widget.set_label_width(120.0);
        let timing = widget.timing();
        assert_eq!(timing.base_ms, 370);
        assert_eq!(timing.shift_from, 25.0);
        assert_eq!(timing.shift_to, 360.0 - 120.0 + 65.0);
    }

    #[test]
    fn frame_reports_current_geometry() {
        let mut widget = sized_widget();
        widget.activate();
        widget.advance(Duration::from_millis(50));

        let mut capture = Capture(Vec::new());
        widget.frame(&mut capture);
        let (state, geometry) = capture.0[0];
        assert_eq!(state, *widget.state());
        assert_eq!(geometry, widget.geometry());
        assert!(geometry.arc_bounds.width() < widget.layout().base_bounds().width());
    }

    #[test]
    fn resize_from_zero_to_square() {
        let mut widget = Widget::new(ForwardConfig::default());
        assert_eq!(widget.geometry().arc_bounds.area(), 0.0);
        widget.resize(200, 200);
        assert!(widget.geometry().arc_bounds.area() > 0.0);
    }

    #[test]
    fn cancel_restores_idle_frame() {
        let mut widget = sized_widget();
        widget.activate();
        widget.advance(Duration::from_millis(400));
        assert!(widget.cancel());
        assert_eq!(*widget.state(), RenderState::default());
        assert!(!widget.is_animating());
    }
}
