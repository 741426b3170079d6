mod anim;
mod camera;
mod input;
mod loop_runner;
mod rendering;
mod scene;

pub use anim::{AnimationDef, AnimationLibrary, AnimationState};
pub use camera::{Camera2D, CameraFollow, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN, DEFAULT_VIEWPORT};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, MAX_FPS_ENV_VAR};
pub use rendering::{world_to_screen_px, Renderer, Viewport};
pub use scene::{
    EmitterId, GroupId, InputSnapshot, OverlapEvent, OverlapId, Scene, SceneCommand, SceneError,
    SceneHost, SceneWorld, Sprite, SpriteDesc, SpriteId, SpriteIdAllocator, SpriteSheet,
    TextElement, TextId,
};
