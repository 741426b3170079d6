use std::path::Path;
use std::time::Duration;

use engine::app::{AnimationDef, EmitterId, GroupId, OverlapId, TextId};
use engine::arcade::{ArcadeBody, TimerId, TimerQueue};
use engine::content::{Tilemap, TilemapError};
use engine::vfx::{EmitterConfig, SpeedRange, Tween};
use engine::{
    InputAction, InputSnapshot, OverlapEvent, Rect, Scene, SceneCommand, SceneError, SceneWorld,
    SpriteDesc, SpriteId, Vec2,
};
use thiserror::Error;
use tracing::{debug, error, info};

use super::config::Tuning;

const GROUND_LAYER: &str = "Ground-n-Platforms";
const OBJECT_LAYER: &str = "Objects";
const TILESET_NAME: &str = "kenny_tilemap_packed";
const COLLIDES_PROPERTY: &str = "collides";

const PLAYER_SPAWN_OBJECT: &str = "playerSpawn";
const COIN_OBJECT: &str = "coin";
const POWER_UP_OBJECT: &str = "powerUp";
const WATER_OBJECT: &str = "waterLevel";

const TILE_SHEET: &str = "tilemap_sheet";
const TILE_SHEET_IMAGE: &str = "tilemap_packed.png";
const TILE_SIZE_PX: u32 = 18;
const CHARACTER_SHEET: &str = "platformer_characters";
const CHARACTER_SHEET_IMAGE: &str = "characters_packed.png";
const CHARACTER_SIZE_PX: u32 = 24;
const PARTICLE_SHEET: &str = "kenny-particles";
const PARTICLE_SHEET_IMAGE: &str = "kenny_particles.png";
const PARTICLE_SIZE_PX: u32 = 512;

const PLAYER_FRAME: u32 = 0;
const PLAYER_JUMP_FRAME: u32 = 1;
const COIN_FRAME: u32 = 151;
const COIN_SPIN_FRAME: u32 = 152;
const POWER_UP_FRAME: u32 = 128;
const CIRCLE_PARTICLE_FRAME: u32 = 0;
const SMOKE_PARTICLE_FRAMES: [u32; 2] = [1, 2];

const ANIM_WALK: &str = "walk";
const ANIM_IDLE: &str = "idle";
const ANIM_JUMP: &str = "jump";
const ANIM_COIN: &str = "coin";

const COIN_BURST_COUNT: u32 = 3;
const SINKING_BURST_COUNT: u32 = 30;

const CAMERA_LERP: f32 = 0.25;
const CAMERA_DEADZONE_PX: f32 = 50.0;

const HUD_POSITION: Vec2 = Vec2 { x: 12.0, y: 12.0 };
const HUD_SCALE: u32 = 4;

include!("state.rs");
include!("asset.rs");
include!("setup.rs");
include!("controls.rs");
include!("overlaps.rs");
include!("scene_impl.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
