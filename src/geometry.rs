// ============================================================================
// GEOMETRY ENGINE
// ============================================================================
//
// Pure functions from {size, margins, scale percent, rotation} to the shapes
// the renderer draws. Nothing here keeps state between frames except
// `ArcLayout`, which caches the size-dependent baseline until the next resize.

use crate::state::RenderState;

/// A point in frame pixel coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Moves `self` toward `target` by `fraction` of the distance between them
    fn toward(self, target: Point, fraction: f32) -> Point {
        Point::new(
            self.x + (target.x - self.x) * fraction,
            self.y + (target.y - self.y) * fraction,
        )
    }

    /// Rotates the point about `center` by `angle_degrees`
    pub fn rotated_about(self, center: Point, angle_degrees: f32) -> Point {
        let theta = angle_degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(
            dx * cos - dy * sin + center.x,
            dy * cos + dx * sin + center.y,
        )
    }
}

/// Axis-aligned rectangle stored by its edges
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Half-open containment test; an empty rectangle contains nothing
    pub fn contains(&self, x: f32, y: f32) -> bool {
        !self.is_empty() && x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Pushes every edge inward by `amount`, collapsing onto the center
    /// instead of inverting
    pub fn inset(&self, amount: f32) -> Rect {
        let cx = (self.left + self.right) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;
        Rect::new(
            (self.left + amount).min(cx),
            (self.top + amount).min(cy),
            (self.right - amount).max(cx),
            (self.bottom - amount).max(cy),
        )
    }
}

/// Widget size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal middle of the widget; the arc lives left of it
    pub fn center_x(&self) -> f32 {
        self.width.max(0.0) / 2.0
    }
}

/// Margins around the arc, derived from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub arc: f32,
    pub arrow: f32,
}

/// One line segment of an arrow head
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A chevron: two segments sharing their start point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub up: Segment,
    pub down: Segment,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySnapshot {
    pub arc_bounds: Rect,
    pub arc_center: Point,
    pub circle_radius: f32,
    pub radius_scale_size: f32,
    pub arrow_heads: [ArrowHead; 2],
}

// ============================================================================
// ENGINE FUNCTIONS
// ============================================================================

/// Unscaled arc box: the left half of the widget inset by the margins.
///
/// Sizes that cannot fit the margins collapse to a zero-area box anchored at
/// the top-left margin corner.
pub fn arc_base_bounds(size: Size, margins: Margins) -> Rect {
    let left = margins.arrow / 2.0;
    let top = margins.arc;
    let right = size.center_x() - margins.arc;
    let bottom = size.height.max(0.0) - margins.arrow / 2.0;
    Rect::new(left, top, right.max(left), bottom.max(top))
}

/// Fixed center of the arc for a given size, independent of scale
pub fn compute_arc_center(size: Size, margins: Margins) -> Point {
    let base = arc_base_bounds(size, margins);
    Point::new(
        base.width() / 2.0 + margins.arrow / 2.0,
        base.height() / 2.0 + margins.arc,
    )
}

/// Pixel offset applied to every bounding edge for `scale_percent`
pub fn radius_scale_size(center: Point, scale_percent: f32) -> f32 {
    center.x * scale_percent
}

pub fn compute_arc_bounds(size: Size, margins: Margins, scale_percent: f32) -> Rect {
    let center = compute_arc_center(size, margins);
    arc_base_bounds(size, margins).inset(radius_scale_size(center, scale_percent))
}

/// Radius of the inner circle; shrinks in lock-step with the arc box
pub fn compute_circle_radius(base_bounds: Rect, radius_scale_size: f32) -> f32 {
    (base_bounds.width() / 2.0 - radius_scale_size).max(0.0)
}

/// The two chevrons at the top of the arc, closed by `scale_percent` and
/// rotated about `center` by `rotation_angle` degrees
pub fn compute_arrow_heads(
    center: Point,
    margins: Margins,
    scale_percent: f32,
    rotation_angle: f32,
) -> [ArrowHead; 2] {
    let rss = radius_scale_size(center, scale_percent);
    let start_y = margins.arc + rss;

    let head = |start_x: f32, far_x: f32| {
        let start = Point::new(start_x, start_y);
        let up_end = Point::new(far_x, margins.arc - margins.arrow + rss);
        let down_end = Point::new(far_x, margins.arc + margins.arrow + rss);

        let start = start.rotated_about(center, rotation_angle);
        ArrowHead {
            up: Segment {
                start,
                end: up_end
                    .toward(Point::new(start_x, start_y), scale_percent)
                    .rotated_about(center, rotation_angle),
            },
            down: Segment {
                start,
                end: down_end
                    .toward(Point::new(start_x, start_y), scale_percent)
                    .rotated_about(center, rotation_angle),
            },
        }
    };

    [
        head(center.x, center.x - margins.arrow),
        head(center.x + margins.arrow, center.x),
    ]
}

// ============================================================================
// LAYOUT CACHE
// ============================================================================

/// Size-dependent baseline, rebuilt on every resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcLayout {
    size: Size,
    margins: Margins,
    base_bounds: Rect,
    center: Point,
}

impl ArcLayout {
    pub fn new(size: Size, margins: Margins) -> Self {
        Self {
            size,
            margins,
            base_bounds: arc_base_bounds(size, margins),
            center: compute_arc_center(size, margins),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn base_bounds(&self) -> Rect {
        self.base_bounds
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Current arc box for a given scale
    pub fn bounds_at(&self, scale_percent: f32) -> Rect {
        self.base_bounds
            .inset(radius_scale_size(self.center, scale_percent))
    }

    pub fn snapshot(&self, state: &RenderState) -> GeometrySnapshot {
        let rss = radius_scale_size(self.center, state.scale_percent);
        GeometrySnapshot {
            arc_bounds: self.base_bounds.inset(rss),
            arc_center: self.center,
            circle_radius: compute_circle_radius(self.base_bounds, rss),
            radius_scale_size: rss,
            arrow_heads: compute_arrow_heads(
                self.center,
                self.margins,
                state.scale_percent,
                state.rotation_angle,
            ),
        }
    }

    /// Whether a release at `(x, y)` lands inside the arc as currently drawn
    pub fn hit_test(&self, x: f32, y: f32, state: &RenderState) -> bool {
        self.bounds_at(state.scale_percent).contains(x, y)
    }
}
