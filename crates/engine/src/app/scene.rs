use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use super::anim::{AnimationDef, AnimationLibrary, AnimationState};
use super::camera::Camera2D;
use super::input::{ActionStates, InputAction};
use crate::arcade::{ArcadeBody, PhysicsWorld, TileGrid};
use crate::asset_keys::{validate_asset_path, validate_texture_key, AssetKeyError};
use crate::content::{TileLayer, Tilemap};
use crate::math::{Rect, Vec2};
use crate::vfx::{EmitterConfig, ParticleEmitter};

const EMITTER_SEED_BASE: u64 = 0x5eed_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Restart,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True only for the tick that observed the key going down.
    pub fn just_pressed(&self, action: InputAction) -> bool {
        self.actions.just_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self.actions.set_pressed(action, false);
        self
    }

    /// Holds `action` down and marks it as pressed this tick.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self.actions.set_pressed(action, true);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlapId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextId(usize);

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no tilemap is attached to the scene world")]
    NoTilemap,
    #[error("tilemap has no tile layer named '{0}'")]
    MissingTileLayer(String),
    #[error("sprite {0:?} does not exist")]
    UnknownSprite(SpriteId),
    #[error("invalid asset key '{key}': {source}")]
    InvalidAssetKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
}

#[derive(Debug, Default)]
pub struct SpriteIdAllocator {
    next: u64,
}

impl SpriteIdAllocator {
    pub fn allocate(&mut self) -> SpriteId {
        let id = SpriteId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// How a sprite is drawn. `frame` indexes into the `texture` spritesheet; the
/// renderer draws `fallback_color` when the sheet image is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    pub texture: Option<String>,
    pub frame: u32,
    pub size: Vec2,
    pub fallback_color: [u8; 4],
    pub debug_name: &'static str,
}

impl SpriteDesc {
    pub fn placeholder(debug_name: &'static str, size: Vec2) -> Self {
        Self {
            texture: None,
            frame: 0,
            size,
            fallback_color: [220, 220, 240, 255],
            debug_name,
        }
    }

    pub fn with_texture(mut self, texture: &str, frame: u32) -> Self {
        self.texture = Some(texture.to_string());
        self.frame = frame;
        self
    }

    pub fn with_fallback_color(mut self, color: [u8; 4]) -> Self {
        self.fallback_color = color;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: SpriteId,
    /// Centre of the sprite in world pixels.
    pub position: Vec2,
    pub desc: SpriteDesc,
    pub flip_x: bool,
    pub visible: bool,
    pub body: Option<ArcadeBody>,
    pub anim: AnimationState,
    tile_collider: Option<String>,
}

impl Sprite {
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.desc.size)
    }

    pub fn body_bounds(&self) -> Option<Rect> {
        self.body.as_ref().map(|body| body.bounds_at(self.position))
    }

    pub fn tile_collider(&self) -> Option<&str> {
        self.tile_collider.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapEvent {
    pub overlap: OverlapId,
    pub subject: SpriteId,
    pub other: SpriteId,
}

#[derive(Debug, Clone, Copy)]
struct OverlapWatch {
    subject: SpriteId,
    group: GroupId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    pub image_path: String,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// HUD text. With `scroll_factor` 0 the position is in screen pixels and the
/// text ignores the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub id: TextId,
    pub position: Vec2,
    pub content: String,
    pub scale: u32,
    pub color: [u8; 4],
    pub scroll_factor: f32,
}

struct LayerGrid<'a> {
    layer: &'a TileLayer,
    tile_size: Vec2,
}

impl TileGrid for LayerGrid<'_> {
    fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool {
        self.layer.is_solid(tile_x, tile_y)
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: SpriteIdAllocator,
    sprites: Vec<Sprite>,
    pending_spawns: Vec<Sprite>,
    pending_despawns: Vec<SpriteId>,
    groups: Vec<Vec<SpriteId>>,
    overlaps: Vec<OverlapWatch>,
    tilemap: Option<Tilemap>,
    visible_layers: Vec<String>,
    physics: PhysicsWorld,
    animations: AnimationLibrary,
    emitters: Vec<ParticleEmitter>,
    texts: Vec<TextElement>,
    spritesheets: HashMap<String, SpriteSheet>,
    tileset_textures: HashMap<String, String>,
    camera: Camera2D,
}

impl SceneWorld {
    pub fn spawn(&mut self, position: Vec2, desc: SpriteDesc) -> SpriteId {
        self.spawn_internal(position, desc, None)
    }

    pub fn spawn_with_body(&mut self, position: Vec2, desc: SpriteDesc, body: ArcadeBody) -> SpriteId {
        self.spawn_internal(position, desc, Some(body))
    }

    fn spawn_internal(&mut self, position: Vec2, desc: SpriteDesc, body: Option<ArcadeBody>) -> SpriteId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Sprite {
            id,
            position,
            desc,
            flip_x: false,
            visible: true,
            body,
            anim: AnimationState::default(),
            tile_collider: None,
        });
        id
    }

    /// Queues removal. The sprite stays in `sprites()` until `apply_pending`
    /// but is no longer alive for overlap dispatch.
    pub fn destroy(&mut self, id: SpriteId) -> bool {
        let exists_now = self.sprites.iter().any(|sprite| sprite.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|sprite| sprite.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            self.sprites.append(&mut self.pending_spawns);
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.sprites
                .retain(|sprite| pending.binary_search(&sprite.id).is_err());
            for members in &mut self.groups {
                members.retain(|id| pending.binary_search(id).is_err());
            }
            self.pending_despawns.clear();
        }
    }

    /// Drops everything the scene built. Sprite ids keep counting up and the
    /// camera keeps its viewport.
    pub fn clear(&mut self) {
        let viewport = self.camera.viewport();
        self.sprites.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.groups.clear();
        self.overlaps.clear();
        self.tilemap = None;
        self.visible_layers.clear();
        self.physics = PhysicsWorld::default();
        self.animations.clear();
        self.emitters.clear();
        self.texts.clear();
        self.spritesheets.clear();
        self.tileset_textures.clear();
        self.camera = Camera2D::default();
        self.camera
            .set_viewport(viewport.x as u32, viewport.y as u32);
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Also finds sprites spawned this tick that are not yet applied.
    pub fn find_sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites
            .iter()
            .chain(self.pending_spawns.iter())
            .find(|sprite| sprite.id == id)
    }

    pub fn find_sprite_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites
            .iter_mut()
            .chain(self.pending_spawns.iter_mut())
            .find(|sprite| sprite.id == id)
    }

    pub fn is_alive(&self, id: SpriteId) -> bool {
        self.sprites.iter().any(|sprite| sprite.id == id) && !self.pending_despawns.contains(&id)
    }

    pub fn create_group(&mut self, members: impl IntoIterator<Item = SpriteId>) -> GroupId {
        self.groups.push(members.into_iter().collect());
        GroupId(self.groups.len() - 1)
    }

    pub fn group_members(&self, group: GroupId) -> Vec<SpriteId> {
        self.groups
            .get(group.0)
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|id| self.is_alive(*id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reports every step in which `subject` intersects a live member of
    /// `group`. Overlaps never separate the bodies.
    pub fn add_overlap(&mut self, subject: SpriteId, group: GroupId) -> OverlapId {
        self.overlaps.push(OverlapWatch { subject, group });
        OverlapId(self.overlaps.len() - 1)
    }

    /// Resolves `sprite`'s body against the solid tiles of `layer` each step.
    pub fn add_tile_collider(&mut self, sprite: SpriteId, layer: &str) -> Result<(), SceneError> {
        let tilemap = self.tilemap.as_ref().ok_or(SceneError::NoTilemap)?;
        if tilemap.tile_layer(layer).is_none() {
            return Err(SceneError::MissingTileLayer(layer.to_string()));
        }
        let target = self
            .sprites
            .iter_mut()
            .chain(self.pending_spawns.iter_mut())
            .find(|candidate| candidate.id == sprite)
            .ok_or(SceneError::UnknownSprite(sprite))?;
        target.tile_collider = Some(layer.to_string());
        Ok(())
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn tilemap_mut(&mut self) -> Option<&mut Tilemap> {
        self.tilemap.as_mut()
    }

    /// Marks a tile layer for drawing.
    pub fn create_layer(&mut self, name: &str) -> Result<(), SceneError> {
        let tilemap = self.tilemap.as_ref().ok_or(SceneError::NoTilemap)?;
        if tilemap.tile_layer(name).is_none() {
            return Err(SceneError::MissingTileLayer(name.to_string()));
        }
        if !self.visible_layers.iter().any(|layer| layer == name) {
            self.visible_layers.push(name.to_string());
        }
        Ok(())
    }

    pub fn visible_layers(&self) -> &[String] {
        &self.visible_layers
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn add_spritesheet(
        &mut self,
        key: &str,
        image_path: &str,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<(), SceneError> {
        validate_texture_key(key).map_err(|source| SceneError::InvalidAssetKey {
            key: key.to_string(),
            source,
        })?;
        validate_asset_path(image_path).map_err(|source| SceneError::InvalidAssetKey {
            key: image_path.to_string(),
            source,
        })?;
        self.spritesheets.insert(
            key.to_string(),
            SpriteSheet {
                image_path: image_path.to_string(),
                frame_width: frame_width.max(1),
                frame_height: frame_height.max(1),
            },
        );
        Ok(())
    }

    pub fn spritesheet(&self, key: &str) -> Option<&SpriteSheet> {
        self.spritesheets.get(key)
    }

    /// Draws tiles of the named map tileset from the `texture` spritesheet.
    pub fn add_tileset_image(&mut self, tileset: &str, texture: &str) {
        self.tileset_textures
            .insert(tileset.to_string(), texture.to_string());
    }

    pub fn tileset_texture(&self, tileset: &str) -> Option<&str> {
        self.tileset_textures.get(tileset).map(String::as_str)
    }

    pub fn add_animation(&mut self, def: AnimationDef) {
        self.animations.insert(def);
    }

    pub fn animations(&self) -> &AnimationLibrary {
        &self.animations
    }

    /// Returns false when the sprite or animation key is unknown, or when
    /// `ignore_if_playing` kept the running playback.
    pub fn play_animation(&mut self, sprite: SpriteId, key: &str, ignore_if_playing: bool) -> bool {
        let Some(def) = self.animations.get(key) else {
            debug!(key, "animation_missing");
            return false;
        };
        let Some(target) = self
            .sprites
            .iter_mut()
            .chain(self.pending_spawns.iter_mut())
            .find(|candidate| candidate.id == sprite)
        else {
            return false;
        };
        let started = target.anim.play(def, ignore_if_playing);
        if let Some(frame) = target.anim.frame(def) {
            target.desc.frame = frame;
        }
        started
    }

    pub fn add_emitter(&mut self, config: EmitterConfig) -> EmitterId {
        let index = self.emitters.len();
        self.emitters
            .push(ParticleEmitter::new(config, EMITTER_SEED_BASE + index as u64));
        EmitterId(index)
    }

    pub fn emitter(&self, id: EmitterId) -> Option<&ParticleEmitter> {
        self.emitters.get(id.0)
    }

    pub fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(id.0)
    }

    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    pub fn add_text(&mut self, position: Vec2, content: impl Into<String>) -> TextId {
        let id = TextId(self.texts.len());
        self.texts.push(TextElement {
            id,
            position,
            content: content.into(),
            scale: 1,
            color: [255, 255, 255, 255],
            scroll_factor: 1.0,
        });
        id
    }

    pub fn set_text(&mut self, id: TextId, content: impl Into<String>) -> bool {
        match self.texts.get_mut(id.0) {
            Some(text) => {
                text.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn text(&self, id: TextId) -> Option<&TextElement> {
        self.texts.get(id.0)
    }

    pub fn text_mut(&mut self, id: TextId) -> Option<&mut TextElement> {
        self.texts.get_mut(id.0)
    }

    pub fn texts(&self) -> &[TextElement] {
        &self.texts
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    /// Integrates every dynamic body against its tile layer and the world
    /// bounds, then collects overlaps between live bodies.
    pub fn step_physics(&mut self, fixed_dt_seconds: f32) -> Vec<OverlapEvent> {
        let tilemap = self.tilemap.as_ref();
        let physics = &self.physics;
        for sprite in &mut self.sprites {
            let Sprite {
                position,
                body,
                tile_collider,
                ..
            } = sprite;
            let Some(body) = body.as_mut() else {
                continue;
            };
            let grid = match (tile_collider.as_deref(), tilemap) {
                (Some(layer), Some(map)) => map.tile_layer(layer).map(|layer| LayerGrid {
                    layer,
                    tile_size: map.tile_size(),
                }),
                _ => None,
            };
            physics.step_body(
                position,
                body,
                fixed_dt_seconds,
                grid.as_ref().map(|grid| grid as &dyn TileGrid),
            );
        }

        let mut events = Vec::new();
        for (index, watch) in self.overlaps.iter().enumerate() {
            if !self.is_alive(watch.subject) {
                continue;
            }
            let Some(subject_bounds) = self
                .find_sprite(watch.subject)
                .and_then(Sprite::body_bounds)
            else {
                continue;
            };
            let Some(members) = self.groups.get(watch.group.0) else {
                continue;
            };
            for other in members {
                if *other == watch.subject || !self.is_alive(*other) {
                    continue;
                }
                let hit = self
                    .find_sprite(*other)
                    .and_then(Sprite::body_bounds)
                    .is_some_and(|bounds| bounds.intersects(&subject_bounds));
                if hit {
                    events.push(OverlapEvent {
                        overlap: OverlapId(index),
                        subject: watch.subject,
                        other: *other,
                    });
                }
            }
        }
        events
    }

    /// Advances animations and emitters, then moves the camera.
    pub fn step_effects(&mut self, fixed_dt_seconds: f32) {
        let animations = &self.animations;
        for sprite in &mut self.sprites {
            let Some(def) = sprite.anim.current_key().and_then(|key| animations.get(key)) else {
                continue;
            };
            sprite.anim.advance(def, fixed_dt_seconds);
            if let Some(frame) = sprite.anim.frame(def) {
                sprite.desc.frame = frame;
            }
        }

        let sprites = &self.sprites;
        for emitter in &mut self.emitters {
            let follow_position = emitter
                .follow()
                .and_then(|follow| sprite_position(sprites, follow.target));
            emitter.step(fixed_dt_seconds, follow_position);
        }

        self.sync_camera();
    }

    pub(crate) fn sync_camera(&mut self) {
        let target = self
            .camera
            .follow()
            .and_then(|follow| sprite_position(&self.sprites, follow.target));
        self.camera.update(target);
    }
}

fn sprite_position(sprites: &[Sprite], id: SpriteId) -> Option<Vec2> {
    sprites
        .iter()
        .find(|sprite| sprite.id == id)
        .map(|sprite| sprite.position)
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    /// Called once per overlapping pair per step, only while both sprites
    /// are alive.
    fn handle_overlap(&mut self, _event: OverlapEvent, _world: &mut SceneWorld) {}
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

impl<S: Scene + ?Sized> Scene for Box<S> {
    fn load(&mut self, world: &mut SceneWorld) {
        (**self).load(world);
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        (**self).update(fixed_dt_seconds, input, world)
    }

    fn handle_overlap(&mut self, event: OverlapEvent, world: &mut SceneWorld) {
        (**self).handle_overlap(event, world);
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        (**self).unload(world);
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        (**self).debug_title(world)
    }
}

/// Owns one scene and its world and drives them one fixed tick at a time.
/// Usable without a window.
pub struct SceneHost<S: Scene> {
    scene: S,
    world: SceneWorld,
    is_loaded: bool,
}

impl<S: Scene> SceneHost<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.world.sync_camera();
        self.is_loaded = true;
    }

    /// One fixed step: scene input handling, physics, overlap dispatch,
    /// effects, then deferred spawns and destroys. A `Restart` command
    /// reloads the scene before returning.
    pub fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            self.load();
        }

        let command = self.scene.update(fixed_dt_seconds, input, &mut self.world);

        let events = self.world.step_physics(fixed_dt_seconds);
        for event in events {
            if self.world.is_alive(event.subject) && self.world.is_alive(event.other) {
                self.scene.handle_overlap(event, &mut self.world);
            }
        }

        self.world.step_effects(fixed_dt_seconds);
        self.world.apply_pending();

        if command == SceneCommand::Restart {
            self.restart();
        }
        command
    }

    pub fn restart(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.is_loaded = false;
        self.load();
        info!(sprite_count = self.world.sprite_count(), "scene_restarted");
    }

    pub fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }
}
