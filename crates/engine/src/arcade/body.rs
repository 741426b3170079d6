use crate::math::{Rect, Vec2};

pub const DEFAULT_MAX_VELOCITY: f32 = 10_000.0;

/// Which sides of a body were stopped by a tile or the world edge during the
/// last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blocked {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Blocked {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

/// Arcade-style AABB body. The owning sprite's position is the body centre.
#[derive(Debug, Clone)]
pub struct ArcadeBody {
    pub kind: BodyKind,
    pub size: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub drag: Vec2,
    pub max_velocity: Vec2,
    pub allow_gravity: bool,
    pub collide_world_bounds: bool,
    pub blocked: Blocked,
}

impl ArcadeBody {
    pub fn dynamic(size: Vec2) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            size,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            max_velocity: Vec2::new(DEFAULT_MAX_VELOCITY, DEFAULT_MAX_VELOCITY),
            allow_gravity: true,
            collide_world_bounds: false,
            blocked: Blocked::default(),
        }
    }

    pub fn fixed(size: Vec2) -> Self {
        Self {
            kind: BodyKind::Static,
            allow_gravity: false,
            ..Self::dynamic(size)
        }
    }

    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn bounds_at(&self, center: Vec2) -> Rect {
        Rect::from_center(center, self.size)
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }
}
