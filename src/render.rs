// ============================================================================
// RETAINED MODE SCENE
// ============================================================================

use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::{Color, ForwardConfig, FULL_TURN, START_ANGLE};
use crate::geometry::{GeometrySnapshot, Rect};
use crate::state::RenderState;
use crate::widget::FrameSink;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Arc {
        bounds: Rect,
        start_angle: f32,
        sweep_angle: f32,
        thickness: f32,
        color: Color,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
        alpha: u8,
    },
    Line {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        thickness: f32,
        color: Color,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        color: Color,
        alpha: u8,
    },
}

#[derive(Debug, Default, PartialEq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Lays out one frame of the widget in paint order
    pub fn compose(
        state: &RenderState,
        geometry: &GeometrySnapshot,
        config: &ForwardConfig,
        label_width: f32,
    ) -> Self {
        let mut scene = Scene::new();
        let color = config.color;
        scene.add_command(DrawCommand::Clear(config.background_color));

        scene.add_command(DrawCommand::Arc {
            bounds: geometry.arc_bounds,
            start_angle: START_ANGLE + state.rotation_angle,
            sweep_angle: config.sweep_angle,
            thickness: config.stroke_width,
            color,
        });

        scene.add_command(DrawCommand::Circle {
            cx: geometry.arc_center.x,
            cy: geometry.arc_center.y,
            radius: geometry.circle_radius,
            color,
            alpha: state.circle_opacity,
        });

        for head in &geometry.arrow_heads {
            for segment in [head.up, head.down] {
                scene.add_command(DrawCommand::Line {
                    x0: segment.start.x,
                    y0: segment.start.y,
                    x1: segment.end.x,
                    y1: segment.end.y,
                    thickness: config.stroke_width,
                    color,
                });
            }
        }

        if state.show_center_label {
            scene.add_command(DrawCommand::Text {
                x: geometry.arc_center.x,
                y: geometry.arc_center.y,
                text: config.center_label(),
                font_size: config.text_size,
                color,
                alpha: state.center_opacity,
            });
        }
        if state.show_shifting_label {
            scene.add_command(DrawCommand::Text {
                x: geometry.arc_bounds.right + label_width / 2.0 + state.horizontal_shift,
                y: geometry.arc_center.y,
                text: config.shifting_label(),
                font_size: config.text_size,
                color,
                alpha: state.shifting_opacity,
            });
        }

        scene
    }

    pub fn render(&self, canvas: &mut Canvas, font: Option<&Font>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => canvas.clear(*color),
                DrawCommand::Arc {
                    bounds,
                    start_angle,
                    sweep_angle,
                    thickness,
                    color,
                } => render_arc(canvas, bounds, *start_angle, *sweep_angle, *thickness, *color),
                DrawCommand::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                    alpha,
                } => draw_circle(canvas, *cx, *cy, *radius, *color, alpha_fraction(*alpha)),
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    color,
                } => draw_thick_line_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color, 1.0),
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    color,
                    alpha,
                } => {
                    if let Some(font) = font {
                        draw_text(
                            canvas,
                            *x,
                            *y,
                            text,
                            font,
                            Scale::uniform(*font_size),
                            *color,
                            alpha_fraction(*alpha),
                        );
                    }
                }
            }
        }
    }
}

/// Collects a `Scene` from the widget's frame output
pub struct SceneBuilder<'a> {
    config: &'a ForwardConfig,
    label_width: f32,
    scene: Scene,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a ForwardConfig, label_width: f32) -> Self {
        Self {
            config,
            label_width,
            scene: Scene::new(),
        }
    }

    pub fn finish(self) -> Scene {
        self.scene
    }
}

impl FrameSink for SceneBuilder<'_> {
    fn render(&mut self, state: &RenderState, geometry: &GeometrySnapshot) {
        self.scene = Scene::compose(state, geometry, self.config, self.label_width);
    }
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    /// Wraps an RGBA frame of `width * height` pixels
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        self.frame
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = alpha.clamp(0.0, 1.0);
        let src = [color.r as f32, color.g as f32, color.b as f32];
        for (channel, value) in dst.iter_mut().take(3).zip(src) {
            *channel = (value * a + *channel as f32 * (1.0 - a)).round() as u8;
        }
        dst[3] = 0xff;
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn alpha_fraction(alpha: u8) -> f32 {
    alpha as f32 / 255.0
}

fn glyph_bounds(glyphs: &[PositionedGlyph]) -> Option<(i32, i32, i32, i32)> {
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    (min_x < max_x && min_y < max_y).then_some((min_x, max_x, min_y, max_y))
}

/// Width of `text` at `font_size`; estimated from the glyph count without a font
pub fn measure_label(text: &str, font: Option<&Font>, font_size: f32) -> f32 {
    let Some(font) = font else {
        return text.chars().count() as f32 * font_size * 0.6;
    };
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, Scale::uniform(font_size), point(0.0, 0.0))
        .collect();
    glyph_bounds(&glyphs)
        .map(|(min_x, max_x, _, _)| (max_x - min_x) as f32)
        .unwrap_or(0.0)
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn draw_thick_line_aa(
    canvas: &mut Canvas,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    thickness: f32,
    color: Color,
    alpha: f32,
) {
    let reach = thickness.ceil() + 1.0;
    let min_x = (x0.min(x1) - reach).floor() as i32;
    let max_x = (x0.max(x1) + reach).ceil() as i32;
    let min_y = (y0.min(y1) - reach).floor() as i32;
    let max_y = (y0.max(y1) + reach).ceil() as i32;
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    for y in min_y.max(0)..=max_y.min(canvas.height as i32 - 1) {
        for x in min_x.max(0)..=max_x.min(canvas.width as i32 - 1) {
            let px = x as f32 - x0;
            let py = y as f32 - y0;
            // Degenerate segments render as a round dot
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = x0 + t * dx;
            let ly = y0 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.set_pixel(x, y, color, aa * alpha);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas, cx: f32, cy: f32, radius: f32, color: Color, alpha: f32) {
    if radius <= 0.0 || alpha <= 0.0 {
        return;
    }
    let min_x = ((cx - radius - 1.0).floor() as i32).max(0);
    let max_x = ((cx + radius + 1.0).ceil() as i32).min(canvas.width as i32 - 1);
    let min_y = ((cy - radius - 1.0).floor() as i32).max(0);
    let max_y = ((cy + radius + 1.0).ceil() as i32).min(canvas.height as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, aa * alpha);
            }
        }
    }
}

/// Strokes the part of the ellipse inscribed in `bounds` that starts at
/// `start_angle` degrees (clockwise from 3 o'clock) and spans `sweep_angle`
fn render_arc(
    canvas: &mut Canvas,
    bounds: &Rect,
    start_angle: f32,
    sweep_angle: f32,
    thickness: f32,
    color: Color,
) {
    if bounds.is_empty() || !start_angle.is_finite() || !sweep_angle.is_finite() {
        return;
    }
    let sweep_angle = sweep_angle.clamp(-FULL_TURN, FULL_TURN);
    let cx = (bounds.left + bounds.right) / 2.0;
    let cy = (bounds.top + bounds.bottom) / 2.0;
    let rx = bounds.width() / 2.0;
    let ry = bounds.height() / 2.0;

    let segments = ((sweep_angle.abs() / 4.0).ceil() as usize).max(8);
    let point_at = |i: usize| {
        let angle = (start_angle + sweep_angle * i as f32 / segments as f32).to_radians();
        (cx + rx * angle.cos(), cy + ry * angle.sin())
    };

    let mut previous = point_at(0);
    for i in 1..=segments {
        let next = point_at(i);
        draw_thick_line_aa(
            canvas, previous.0, previous.1, next.0, next.1, thickness, color, 1.0,
        );
        previous = next;
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    canvas: &mut Canvas,
    x: f32,
    y: f32,
    text: &str,
    font: &Font,
    scale: Scale,
    color: Color,
    alpha: f32,
) {
    if alpha <= 0.0 {
        return;
    }
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();
    let Some((min_x, max_x, min_y, max_y)) = glyph_bounds(&glyphs) else {
        return;
    };
    // Centered on (x, y) both ways
    let offset_x = x.round() as i32 - (max_x - min_x) / 2;
    let offset_y = y.round() as i32 - (max_y - min_y) / 2;
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + gx as i32 + bb.min.x - min_x;
                let py = offset_y + gy as i32 + bb.min.y - min_y;
                canvas.set_pixel(px, py, color, v * alpha);
            });
        }
    }
}
