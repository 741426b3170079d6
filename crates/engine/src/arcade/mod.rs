mod body;
mod timer;
mod world;

pub use body::{ArcadeBody, Blocked, BodyKind, DEFAULT_MAX_VELOCITY};
pub use timer::{TimerId, TimerQueue};
pub use world::{PhysicsWorld, TileGrid};
