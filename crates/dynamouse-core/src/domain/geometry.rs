//! Display geometry and the activation-point policy.
//!
//! All coordinates live in the OS "global" desktop space: the union of every
//! monitor, where the primary monitor usually starts at (0, 0) and the others
//! may sit at negative or positive offsets.

use serde::{Deserialize, Serialize};

/// A cursor position in global desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// A monitor rectangle in global desktop coordinates.
///
/// `x` and `y` are the top-left corner; `width` and `height` are in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayBounds {
    /// X coordinate of the top-left corner (may be negative).
    pub x: i32,
    /// Y coordinate of the top-left corner (may be negative).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DisplayBounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the rightmost X coordinate (exclusive).
    ///
    /// Computed in `i64`: a display near the edge of the coordinate space
    /// may extend past `i32::MAX`.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Returns the center point, `(x + width/2, y + height/2)`.
    ///
    /// Odd dimensions round toward the top-left corner.  A center beyond the
    /// `i32` range saturates at `i32::MAX`.
    pub fn center(&self) -> Point {
        Point {
            x: saturate(i64::from(self.x) + i64::from(self.width / 2)),
            y: saturate(i64::from(self.y) + i64::from(self.height / 2)),
        }
    }

    /// Returns `true` iff `point` lies strictly inside the rectangle.
    ///
    /// The test is exclusive on all four edges: a point whose X equals `x` or
    /// `x + width`, or whose Y equals `y` or `y + height`, is *outside*.
    pub fn contains(&self, point: Point) -> bool {
        let inside_horizontal = point.x > self.x && i64::from(point.x) < self.right();
        let inside_vertical = point.y > self.y && i64::from(point.y) < self.bottom();
        inside_horizontal && inside_vertical
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// A monitor as reported by the display registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    /// Human-readable monitor name; this is the key used in the device mapping.
    pub label: String,
    #[serde(flatten)]
    pub bounds: DisplayBounds,
}

impl Display {
    pub fn new(label: impl Into<String>, bounds: DisplayBounds) -> Self {
        Self {
            label: label.into(),
            bounds,
        }
    }
}

/// Decides where the cursor lands when an assignment takes ownership.
///
/// - `own` is the position recorded for the activating assignment the last
///   time it gave up ownership (`None` if it never did).
/// - `previous` is the position recorded for the assignment that just gave up
///   ownership, if there was one.
///
/// Precedence:
///
/// 1. `previous`, if it lies strictly inside `bounds`.  The cursor stays where
///    it was when two displays share the same coordinate space.
/// 2. `own`, if it lies strictly inside `bounds`.
/// 3. The center of `bounds`.
pub fn resolve_activation_point(
    bounds: &DisplayBounds,
    own: Option<Point>,
    previous: Option<Point>,
) -> Point {
    if let Some(point) = previous.filter(|p| bounds.contains(*p)) {
        return point;
    }
    match own {
        Some(point) if bounds.contains(point) => point,
        _ => bounds.center(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
