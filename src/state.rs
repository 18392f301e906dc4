// ============================================================================
// RENDER STATE
// ============================================================================

pub const OPAQUE: u8 = 255;
pub const TRANSPARENT: u8 = 0;

/// Everything that changes while the choreography runs.
///
/// Written only by the sequencer, read by the geometry engine and renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Arc rotation offset in degrees
    pub rotation_angle: f32,
    pub center_opacity: u8,
    pub circle_opacity: u8,
    pub shifting_opacity: u8,
    /// How far the arc and circle have shrunk toward their center
    pub scale_percent: f32,
    /// Pixel offset of the shifting label
    pub horizontal_shift: f32,
    pub show_center_label: bool,
    pub show_shifting_label: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            rotation_angle: 0.0,
            center_opacity: OPAQUE,
            circle_opacity: TRANSPARENT,
            shifting_opacity: TRANSPARENT,
            scale_percent: 0.0,
            horizontal_shift: 0.0,
            show_center_label: true,
            show_shifting_label: false,
        }
    }
}

/// The animated field a stage writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    CenterOpacity,
    ShiftingOpacity,
    CircleOpacity,
    Scale,
    Rotation,
    Shift,
}

impl RenderState {
    pub fn write(&mut self, channel: Channel, value: f32) {
        match channel {
            Channel::CenterOpacity => self.center_opacity = to_alpha(value),
            Channel::ShiftingOpacity => self.shifting_opacity = to_alpha(value),
            Channel::CircleOpacity => self.circle_opacity = to_alpha(value),
            Channel::Scale => self.scale_percent = value,
            Channel::Rotation => self.rotation_angle = value,
            Channel::Shift => self.horizontal_shift = value,
        }
    }

    /// Hides one label and shows the other in a single step
    pub fn hand_off_to_shifting_label(&mut self) {
        self.show_center_label = false;
        self.show_shifting_label = true;
    }

    pub fn hand_off_to_center_label(&mut self) {
        self.show_shifting_label = false;
        self.show_center_label = true;
    }

    pub fn labels_exclusive(&self) -> bool {
        !(self.show_center_label && self.show_shifting_label)
    }
}

/// Opacity channels hold integers; intermediate values truncate, then saturate
fn to_alpha(value: f32) -> u8 {
    value.clamp(TRANSPARENT as f32, OPAQUE as f32) as u8
}
