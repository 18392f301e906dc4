use crate::sequencer::StageId;

/// Lifecycle notifications delivered on the thread that drives the widget
pub trait AnimationListener {
    fn on_animation_start(&mut self) {}

    fn on_animation_end(&mut self) {}

    /// Called as each stage reaches its end value
    fn on_stage_complete(&mut self, _stage: StageId) {}
}

/// Listener that ignores everything
impl AnimationListener for () {}

/// Fans every notification out to each listener in registration order
impl AnimationListener for Vec<Box<dyn AnimationListener>> {
    fn on_animation_start(&mut self) {
        for listener in self.iter_mut() {
            listener.on_animation_start();
        }
    }

    fn on_animation_end(&mut self) {
        for listener in self.iter_mut() {
            listener.on_animation_end();
        }
    }

    fn on_stage_complete(&mut self, stage: StageId) {
        for listener in self.iter_mut() {
            listener.on_stage_complete(stage);
        }
    }
}

type Callback = Box<dyn FnMut()>;

/// Closure-based listener
#[derive(Default)]
pub struct Callbacks {
    on_start: Option<Callback>,
    on_end: Option<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_end(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }
}

impl AnimationListener for Callbacks {
    fn on_animation_start(&mut self) {
        if let Some(callback) = self.on_start.as_mut() {
            callback();
        }
    }

    fn on_animation_end(&mut self) {
        if let Some(callback) = self.on_end.as_mut() {
            callback();
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn callbacks_forward_to_closures() {
        let starts = Rc::new(Cell::new(0));
        let ends = Rc::new(Cell::new(0));
        let mut callbacks = Callbacks::new()
            .on_start({
                let starts = starts.clone();
                move || starts.set(starts.get() + 1)
            })
            .on_end({
                let ends = ends.clone();
                move || ends.set(ends.get() + 1)
            });

        callbacks.on_animation_start();
        callbacks.on_animation_end();
        callbacks.on_animation_end();
        assert_eq!(starts.get(), 1);
        assert_eq!(ends.get(), 2);
    }

    #[test]
    fn every_registered_listener_is_notified() {
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let recorder = |name: &'static str| {
            let starts = log.clone();
            let ends = log.clone();
            Box::new(
                Callbacks::new()
                    .on_start(move || starts.borrow_mut().push((name, "start")))
                    .on_end(move || ends.borrow_mut().push((name, "end"))),
            ) as Box<dyn AnimationListener>
        };
        let mut listeners = vec![recorder("object"), recorder("closures")];

        listeners.on_animation_start();
        listeners.on_stage_complete(StageId::ShrinkArc);
        listeners.on_animation_end();
        assert_eq!(
            *log.borrow(),
            vec![
                ("object", "start"),
                ("closures", "start"),
                ("object", "end"),
                ("closures", "end"),
            ]
        );
    }

    #[test]
    fn empty_callbacks_do_nothing() {
        let mut callbacks = Callbacks::new();
        callbacks.on_animation_start();
        callbacks.on_animation_end();
    }
}
