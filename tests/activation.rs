use forward::geometry::{GeometrySnapshot, Rect};
use forward::{Activation, Callbacks, ForwardConfig, FrameSink, RenderState, Widget};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct Frames(Vec<(RenderState, GeometrySnapshot)>);

impl FrameSink for Frames {
    fn render(&mut self, state: &RenderState, geometry: &GeometrySnapshot) {
        self.0.push((*state, *geometry));
    }
}

fn counting_widget(starts: &Rc<Cell<u32>>, ends: &Rc<Cell<u32>>) -> Widget {
    let mut widget = Widget::new(ForwardConfig::default());
    widget.resize(720, 360);
    widget.add_listener(
        Callbacks::new()
            .on_start({
                let starts = starts.clone();
                move || starts.set(starts.get() + 1)
            })
            .on_end({
                let ends = ends.clone();
                move || ends.set(ends.get() + 1)
            }),
    );
    widget
}

#[test]
fn full_chain_runs_once_and_restores_idle_frame() {
    let starts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));
    let mut widget = counting_widget(&starts, &ends);
    let idle = widget.geometry();

    assert_eq!(widget.release_at(160.0, 200.0), Some(Activation::Started));

    let mut frames = Frames::default();
    let mut peak_rotation: f32 = 0.0;
    let mut smallest_arc = f32::MAX;
    for _ in 0..1100 {
        widget.advance(Duration::from_millis(1));
        widget.frame(&mut frames);
        let state = widget.state();
        assert!(state.labels_exclusive(), "both labels visible: {state:?}");
        peak_rotation = peak_rotation.max(state.rotation_angle);
        smallest_arc = smallest_arc.min(widget.geometry().arc_bounds.width());
    }

    assert_eq!(starts.get(), 1);
    assert_eq!(ends.get(), 1);
    assert!(!widget.is_animating());
    assert_eq!(*widget.state(), RenderState::default());
    assert_eq!(widget.geometry(), idle);

    assert!(peak_rotation > 69.0 && peak_rotation <= 70.0);
    assert!(smallest_arc < idle.arc_bounds.width());
    assert_eq!(frames.0.len(), 1100);
}

#[test]
fn taps_during_a_run_do_not_restart_it() {
    let starts = Rc::new(Cell::new(0));
    let ends = Rc::new(Cell::new(0));
    let mut widget = counting_widget(&starts, &ends);

    widget.activate();
    for step in 0..20 {
        widget.advance(Duration::from_millis(50));
        if step % 3 == 0 {
            assert_eq!(widget.activate(), Activation::Ignored);
        }
    }

    assert_eq!(starts.get(), 1);
    assert_eq!(ends.get(), 1);

    assert_eq!(widget.activate(), Activation::Started);
    assert_eq!(starts.get(), 2);
}

#[test]
fn arc_bounds_follow_resize() {
    let mut widget = Widget::new(ForwardConfig::default());
    assert!(widget.geometry().arc_bounds.is_empty());

    widget.resize(200, 200);
    let bounds = widget.geometry().arc_bounds;
    assert!(!bounds.is_empty());
    assert_eq!(bounds, widget.layout().base_bounds());

    widget.resize(720, 360);
    assert_eq!(
        widget.geometry().arc_bounds,
        Rect::new(25.0, 65.0, 295.0, 335.0)
    );
}

#[test]
fn release_misses_while_arc_is_small() {
    let mut widget = Widget::new(ForwardConfig::builder().scale_percent(100).build());
    widget.resize(720, 360);
    widget.activate();
    widget.advance(Duration::from_millis(92));

    // Arc has collapsed onto its center, so the old corner no longer hits
    assert_eq!(widget.release_at(30.0, 70.0), None);
}
