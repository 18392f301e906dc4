// ============================================================================
// ANIMATION SEQUENCER
// ============================================================================
//
// The choreography is a fixed table of stages. Each stage interpolates one
// Render State channel and, on reaching its end value, applies its effects
// and starts the stages listed in `next`. The sequencer advances every active
// stage by an explicit time delta, so a caller (or a test) fully controls the
// clock.

use std::time::Duration;

use tracing::{debug, trace};

use crate::easing::Easing;
use crate::listener::AnimationListener;
use crate::state::{Channel, RenderState, OPAQUE, TRANSPARENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    FadeOutCenterLabel,
    ShrinkArc,
    RotateArc,
    UnrotateArc,
    GrowArc,
    FadeInCircle,
    ShiftLabel,
    FadeInShiftedLabel,
    FadeOutShiftedLabel,
    FadeInCenterLabel,
}

impl StageId {
    /// Table order; `Choreography` indexes stages by discriminant
    pub const ALL: [StageId; 10] = [
        StageId::FadeOutCenterLabel,
        StageId::ShrinkArc,
        StageId::RotateArc,
        StageId::UnrotateArc,
        StageId::GrowArc,
        StageId::FadeInCircle,
        StageId::ShiftLabel,
        StageId::FadeInShiftedLabel,
        StageId::FadeOutShiftedLabel,
        StageId::FadeInCenterLabel,
    ];

    /// Stages started directly by an activation
    pub const ROOTS: [StageId; 2] = [StageId::FadeOutCenterLabel, StageId::ShrinkArc];
}

/// Side effects applied when a stage completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    RestoreCenterOpacity,
    HideCenterLabel,
    ClearCircle,
    ShowShiftingLabel,
    ShowCenterLabel,
    ResetShift,
}

impl Effect {
    fn apply(self, state: &mut RenderState) {
        match self {
            Effect::RestoreCenterOpacity => state.center_opacity = OPAQUE,
            Effect::HideCenterLabel => state.show_center_label = false,
            Effect::ClearCircle => state.circle_opacity = TRANSPARENT,
            Effect::ShowShiftingLabel => state.hand_off_to_shifting_label(),
            Effect::ShowCenterLabel => state.hand_off_to_center_label(),
            Effect::ResetShift => state.horizontal_shift = 0.0,
        }
    }
}

/// One interpolated value stream
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: StageId,
    pub channel: Channel,
    pub from: f32,
    pub to: f32,
    pub duration_ms: u64,
    pub easing: Easing,
    pub effects: Vec<Effect>,
    pub next: Vec<StageId>,
}

impl Stage {
    /// Channel value `elapsed_ms` into the stage
    pub fn value_at(&self, elapsed_ms: f64) -> f32 {
        if self.duration_ms == 0 {
            return self.to;
        }
        let t = (elapsed_ms / self.duration_ms as f64) as f32;
        self.from + (self.to - self.from) * self.easing.apply(t)
    }
}

/// Inputs that parameterize the stage table for one activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Base duration after load-time scaling
    pub base_ms: u64,
    pub end_scale: f32,
    /// Degrees the arc turns before springing back
    pub rotation_extent: f32,
    pub shift_from: f32,
    pub shift_to: f32,
}

/// The full stage graph for one activation
#[derive(Debug, Clone, PartialEq)]
pub struct Choreography {
    stages: Vec<Stage>,
}

impl Choreography {
    pub fn new(timing: &Timing) -> Self {
        let stages = StageId::ALL
            .iter()
            .map(|&id| build_stage(id, timing))
            .collect();
        Self { stages }
    }

    pub fn stage(&self, id: StageId) -> &Stage {
        &self.stages[id as usize]
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

fn build_stage(id: StageId, timing: &Timing) -> Stage {
    let d = timing.base_ms;
    let half = d / 2;
    let quarter = d / 4;
    let long = d * 17 / 10;
    let circle_peak = (OPAQUE as u32 * 6 / 10) as f32;
    let shifted_floor = (OPAQUE as u32 * 3 / 10) as f32;
    let opaque = OPAQUE as f32;
    let transparent = TRANSPARENT as f32;

    let stage = |channel, from, to, duration_ms, easing, effects: &[Effect], next: &[StageId]| Stage {
        id,
        channel,
        from,
        to,
        duration_ms,
        easing,
        effects: effects.to_vec(),
        next: next.to_vec(),
    };

    match id {
        StageId::FadeOutCenterLabel => stage(
            Channel::CenterOpacity,
            opaque,
            transparent,
            half,
            Easing::DECELERATE,
            &[Effect::RestoreCenterOpacity, Effect::HideCenterLabel],
            &[],
        ),
        StageId::ShrinkArc => stage(
            Channel::Scale,
            0.0,
            timing.end_scale,
            quarter,
            Easing::Linear,
            &[],
            &[StageId::RotateArc, StageId::FadeInCircle],
        ),
        StageId::RotateArc => stage(
            Channel::Rotation,
            0.0,
            timing.rotation_extent,
            half,
            Easing::Decelerate(4.0),
            &[],
            &[StageId::GrowArc, StageId::UnrotateArc],
        ),
        StageId::UnrotateArc => stage(
            Channel::Rotation,
            timing.rotation_extent,
            0.0,
            long,
            Easing::Decelerate(2.0),
            &[],
            &[],
        ),
        StageId::GrowArc => stage(
            Channel::Scale,
            timing.end_scale,
            0.0,
            long,
            Easing::Decelerate(2.0),
            &[],
            &[],
        ),
        StageId::FadeInCircle => stage(
            Channel::CircleOpacity,
            transparent,
            circle_peak,
            quarter,
            Easing::DECELERATE,
            &[Effect::ClearCircle, Effect::ShowShiftingLabel],
            &[StageId::ShiftLabel, StageId::FadeInShiftedLabel],
        ),
        StageId::ShiftLabel => stage(
            Channel::Shift,
            timing.shift_from,
            timing.shift_to,
            long,
            Easing::Decelerate(2.0),
            &[],
            &[],
        ),
        StageId::FadeInShiftedLabel => stage(
            Channel::ShiftingOpacity,
            shifted_floor,
            opaque,
            long,
            Easing::Decelerate(2.0),
            &[],
            &[StageId::FadeOutShiftedLabel],
        ),
        StageId::FadeOutShiftedLabel => stage(
            Channel::ShiftingOpacity,
            opaque,
            transparent,
            quarter,
            Easing::DECELERATE,
            &[Effect::ShowCenterLabel, Effect::ResetShift],
            &[StageId::FadeInCenterLabel],
        ),
        StageId::FadeInCenterLabel => stage(
            Channel::CenterOpacity,
            transparent,
            opaque,
            quarter,
            Easing::Linear,
            &[],
            &[],
        ),
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Outcome of an activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Started,
    /// A chain was already running; the request was dropped
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveStage {
    id: StageId,
    elapsed_ms: f64,
}

#[derive(Debug, Clone)]
struct Run {
    choreography: Choreography,
    active: Vec<ActiveStage>,
}

/// Drives at most one choreography at a time
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    current: Option<Run>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn active_stages(&self) -> Vec<StageId> {
        self.current
            .as_ref()
            .map(|run| run.active.iter().map(|stage| stage.id).collect())
            .unwrap_or_default()
    }

    /// Starts `choreography` unless one is already in flight.
    ///
    /// The start notification is delivered before any Render State write.
    pub fn trigger(
        &mut self,
        choreography: Choreography,
        state: &mut RenderState,
        listener: &mut dyn AnimationListener,
    ) -> Activation {
        if self.is_running() {
            debug!(active = ?self.active_stages(), "activation ignored, chain in flight");
            return Activation::Ignored;
        }

        listener.on_animation_start();
        debug!("animation started");

        state.rotation_angle = 0.0;
        let active = StageId::ROOTS
            .iter()
            .map(|&id| {
                let stage = choreography.stage(id);
                state.write(stage.channel, stage.from);
                ActiveStage { id, elapsed_ms: 0.0 }
            })
            .collect();

        self.current = Some(Run {
            choreography,
            active,
        });
        Activation::Started
    }

    /// Advances every active stage by `dt`.
    ///
    /// Stages that finish inside the delta start their successors with the
    /// leftover time, so one large delta can run the whole chain. Returns
    /// whether Render State changed.
    pub fn advance(
        &mut self,
        dt: Duration,
        state: &mut RenderState,
        listener: &mut dyn AnimationListener,
    ) -> bool {
        let Some(run) = self.current.as_mut() else {
            return false;
        };

        let delta_ms = dt.as_nanos() as f64 / 1_000_000.0;
        let mut pending: Vec<(StageId, f64)> = run
            .active
            .drain(..)
            .map(|stage| (stage.id, stage.elapsed_ms + delta_ms))
            .collect();
        let mut still_active = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let mut started = Vec::new();
            for (id, elapsed_ms) in pending.drain(..) {
                let stage = run.choreography.stage(id);
                let duration_ms = stage.duration_ms as f64;

                if elapsed_ms < duration_ms {
                    state.write(stage.channel, stage.value_at(elapsed_ms));
                    still_active.push(ActiveStage { id, elapsed_ms });
                    continue;
                }

                state.write(stage.channel, stage.to);
                for effect in &stage.effects {
                    effect.apply(state);
                }
                trace!(stage = ?id, "stage complete");
                listener.on_stage_complete(id);

                let leftover = elapsed_ms - duration_ms;
                for &next in &stage.next {
                    let next_stage = run.choreography.stage(next);
                    state.write(next_stage.channel, next_stage.from);
                    started.push((next, leftover));
                }
            }
            pending = started;
        }

        if still_active.is_empty() {
            self.current = None;
            state.rotation_angle = 0.0;
            debug!("animation finished");
            listener.on_animation_end();
        } else {
            run.active = still_active;
        }
        true
    }

    /// Drops a running chain and restores the default Render State.
    ///
    /// No end notification is delivered for a cancelled chain.
    pub fn cancel(&mut self, state: &mut RenderState) -> bool {
        if self.current.take().is_none() {
            return false;
        }
        *state = RenderState::default();
        debug!("animation cancelled");
        true
    }
}
