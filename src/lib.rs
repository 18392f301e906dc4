// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod config;
pub mod easing;
pub mod geometry;
pub mod listener;
pub mod render;
pub mod sequencer;
pub mod state;
pub mod widget;

// External crate imports
use pixels::{Pixels, SurfaceTexture};
use rusttype::Font;
use thiserror::Error;
use tracing::{debug, error, warn};

// Standard library imports
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use config::{Attributes, Color, ConfigError, ForwardConfig};
pub use listener::{AnimationListener, Callbacks};
pub use render::{Canvas, DrawCommand, Scene, SceneBuilder};
pub use sequencer::{Activation, StageId};
pub use state::RenderState;
pub use widget::{FrameSink, Widget};

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Errors raised while opening or driving the widget window
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("could not create pixel surface: {0}")]
    Surface(#[from] pixels::Error),

    #[error("font data could not be parsed")]
    Font,
}

/// Commands accepted from other threads while the window is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardCommand {
    Activate,
    Cancel,
    Close,
}

/// Windowed "skip forward" control - the primary public interface
#[derive(Debug)]
pub struct Forward {
    widget: Widget,
}

impl Forward {
    pub fn new(config: ForwardConfig) -> Self {
        Self {
            widget: Widget::new(config),
        }
    }

    pub fn with_listener(mut self, listener: impl AnimationListener + 'static) -> Self {
        self.widget.add_listener(listener);
        self
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    pub fn show(&mut self) -> Result<(), ForwardError> {
        self.run_window(None)
    }

    pub fn show_with_commands(
        &mut self,
        receiver: Receiver<ForwardCommand>,
    ) -> Result<(), ForwardError> {
        self.run_window(Some(receiver))
    }

    fn run_window(&mut self, receiver: Option<Receiver<ForwardCommand>>) -> Result<(), ForwardError> {
        let config = self.widget.config();
        let font = match config.font_data.clone() {
            Some(bytes) => Some(Font::try_from_vec(bytes).ok_or(ForwardError::Font)?),
            None => None,
        };
        let label_width =
            render::measure_label(&config.shifting_label(), font.as_ref(), config.text_size);
        let target_fps = config.max_framerate.max(1.0);

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();
        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let widget = &mut self.widget;
        widget.set_label_width(label_width);
        widget.resize(size.width, size.height);

        let frame_duration = Duration::from_secs_f64(1.0 / target_fps);
        let mut last_frame = Instant::now();
        let mut clock = FrameClock::new(Instant::now());
        let mut cursor: Option<(f32, f32)> = None;

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        widget.resize(new_size.width, new_size.height);
                        if fb_width > 0 && fb_height > 0 {
                            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                                warn!("buffer resize failed: {e}");
                            }
                            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                                warn!("surface resize failed: {e}");
                            }
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Some((position.x as f32, position.y as f32));
                    }
                    WindowEvent::CursorLeft { .. } => {
                        cursor = None;
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if let Some((x, y)) = cursor {
                            let outcome = widget.release_at(x, y);
                            clock.restart_if_started(outcome, Instant::now());
                            debug!(x, y, ?outcome, "pointer released");
                        }
                    }
                    WindowEvent::Touch(touch) if touch.phase == TouchPhase::Ended => {
                        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
                        let outcome = widget.release_at(x, y);
                        clock.restart_if_started(outcome, Instant::now());
                        debug!(x, y, ?outcome, "touch released");
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(ref receiver) = receiver {
                            while let Ok(command) = receiver.try_recv() {
                                match command {
                                    ForwardCommand::Activate => {
                                        let outcome = widget.activate();
                                        clock.restart_if_started(Some(outcome), Instant::now());
                                    }
                                    ForwardCommand::Cancel => {
                                        widget.cancel();
                                    }
                                    ForwardCommand::Close => window_target.exit(),
                                }
                            }
                        }

                        widget.advance(clock.tick(Instant::now()));

                        if fb_width == 0 || fb_height == 0 {
                            return;
                        }
                        let mut builder = SceneBuilder::new(widget.config(), widget.label_width());
                        widget.frame(&mut builder);
                        let scene = builder.finish();

                        let mut canvas = Canvas::new(pixels.frame_mut(), fb_width, fb_height);
                        scene.render(&mut canvas, font.as_ref());
                        if let Err(e) = pixels.render() {
                            error!("render failed: {e}");
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Measures the delta handed to `Widget::advance` between redraws
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    last_tick: Instant,
}

impl FrameClock {
    fn new(now: Instant) -> Self {
        Self { last_tick: now }
    }

    /// A chain that just started is timed from its activation, not the last frame
    fn restart_if_started(&mut self, outcome: Option<Activation>, now: Instant) {
        if outcome == Some(Activation::Started) {
            self.last_tick = now;
        }
    }

    fn tick(&mut self, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_after_activation_starts_at_activation() {
        let origin = Instant::now();
        let mut clock = FrameClock::new(origin);
        assert_eq!(clock.tick(origin + Duration::from_millis(16)), Duration::from_millis(16));

        clock.restart_if_started(Some(Activation::Started), origin + Duration::from_millis(30));
        assert_eq!(clock.tick(origin + Duration::from_millis(32)), Duration::from_millis(2));
    }

    #[test]
    fn ignored_or_missed_releases_keep_frame_timing() {
        let origin = Instant::now();
        let mut clock = FrameClock::new(origin);
        clock.restart_if_started(Some(Activation::Ignored), origin + Duration::from_millis(10));
        clock.restart_if_started(None, origin + Duration::from_millis(12));
        assert_eq!(clock.tick(origin + Duration::from_millis(16)), Duration::from_millis(16));
    }

    #[test]
    fn started_chain_sees_only_time_since_activation() {
        let origin = Instant::now();
        let mut clock = FrameClock::new(origin);
        let mut widget = Widget::new(ForwardConfig::default());
        widget.resize(720, 360);

        // Activation lands 15 ms into a 16 ms frame
        let outcome = widget.release_at(160.0, 200.0);
        clock.restart_if_started(outcome, origin + Duration::from_millis(15));
        widget.advance(clock.tick(origin + Duration::from_millis(16)));

        // One millisecond of a 92 ms linear shrink toward 0.16
        let expected = 0.16 / 92.0;
        assert!((widget.state().scale_percent - expected).abs() < 1e-6);
    }
}
