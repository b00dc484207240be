use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in stage coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_pos_dim(pos: Vec2, dim: Vec2) -> Self {
        Self {
            x0: pos.x,
            y0: pos.y,
            x1: pos.x + dim.x,
            y1: pos.y + dim.y,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn left(&self) -> f32 {
        self.x0
    }

    pub fn right(&self) -> f32 {
        self.x1
    }

    pub fn top(&self) -> f32 {
        self.y0
    }

    pub fn bottom(&self) -> f32 {
        self.y1
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Shift the rectangle so that `origin` becomes (0, 0).
    pub fn relative_to(&self, origin: Vec2) -> Self {
        Self {
            x0: self.x0 - origin.x,
            y0: self.y0 - origin.y,
            x1: self.x1 - origin.x,
            y1: self.y1 - origin.y,
        }
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x0, self.y0)
    }
}

/// Which character a value belongs to, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Opponent,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Opponent => write!(f, "opponent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}
