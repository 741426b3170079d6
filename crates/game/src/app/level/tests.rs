use super::*;
use engine::SceneHost;
use serde_json::{json, Value};

const DT: f32 = 1.0 / 60.0;
const SPAWN: Vec2 = Vec2 { x: 27.0, y: 100.0 };
const COIN_CENTER: Vec2 = Vec2 { x: 81.0, y: 45.0 };
const POWER_UP_CENTER: Vec2 = Vec2 { x: 117.0, y: 45.0 };
const WATER_CENTER: Vec2 = Vec2 { x: 162.0, y: 108.0 };
const GROUND_TOP: f32 = 126.0;

/// 10x8 tiles with a solid bottom row, one of each pickup and a water
/// region in the bottom-right corner.
fn test_map() -> Value {
    let mut data = vec![0u32; 70];
    data.extend(std::iter::repeat(1).take(10));
    json!({
        "width": 10,
        "height": 8,
        "tilewidth": 18,
        "tileheight": 18,
        "orientation": "orthogonal",
        "infinite": false,
        "layers": [
            {
                "type": "tilelayer",
                "name": GROUND_LAYER,
                "width": 10,
                "height": 8,
                "data": data
            },
            {
                "type": "objectgroup",
                "name": OBJECT_LAYER,
                "objects": [
                    { "id": 1, "name": "playerSpawn", "x": SPAWN.x, "y": SPAWN.y, "point": true },
                    { "id": 2, "name": "coin", "gid": 152, "x": 72, "y": 54, "width": 18, "height": 18 },
                    { "id": 3, "name": "powerUp", "gid": 129, "x": 108, "y": 54, "width": 18, "height": 18 },
                    { "id": 4, "name": "waterLevel", "x": 144, "y": 90, "width": 36, "height": 36, "visible": false }
                ]
            }
        ],
        "tilesets": [
            {
                "firstgid": 1,
                "name": TILESET_NAME,
                "image": "tilemap_packed.png",
                "tilecount": 180,
                "columns": 20,
                "tilewidth": 18,
                "tileheight": 18,
                "tiles": [
                    { "id": 0, "properties": [{ "name": "collides", "type": "bool", "value": true }] }
                ]
            }
        ]
    })
}

fn asset_from(map: &Value) -> Result<LevelAsset, LevelError> {
    let map = Tilemap::from_json_str(&map.to_string())?;
    LevelAsset::from_tilemap(map)
}

fn test_scene() -> PlatformerScene {
    PlatformerScene::new(asset_from(&test_map()).expect("asset"), Tuning::default())
}

fn loaded_host() -> SceneHost<PlatformerScene> {
    let mut host = SceneHost::new(test_scene());
    host.world_mut().camera_mut().set_viewport(1440, 900);
    host.load();
    host
}

fn handles(host: &SceneHost<PlatformerScene>) -> LevelHandles {
    host.scene().handles.clone().expect("level handles")
}

fn run_ticks(host: &mut SceneHost<PlatformerScene>, input: InputSnapshot, ticks: u32) {
    for _ in 0..ticks {
        host.tick(DT, &input);
    }
}

fn settle(host: &mut SceneHost<PlatformerScene>) {
    run_ticks(host, InputSnapshot::empty(), 90);
}

fn player_sprite(host: &SceneHost<PlatformerScene>) -> engine::app::Sprite {
    let player = handles(host).player;
    host.world().find_sprite(player).cloned().expect("player sprite")
}

fn player_body(host: &SceneHost<PlatformerScene>) -> ArcadeBody {
    player_sprite(host).body.expect("player body")
}

fn teleport_player(host: &mut SceneHost<PlatformerScene>, position: Vec2) {
    let player = handles(host).player;
    let sprite = host.world_mut().find_sprite_mut(player).expect("player sprite");
    sprite.position = position;
    if let Some(body) = sprite.body.as_mut() {
        body.velocity = Vec2::ZERO;
    }
}

fn alive_particles(host: &SceneHost<PlatformerScene>, emitter: EmitterId) -> usize {
    host.world()
        .emitter(emitter)
        .map(|emitter| emitter.alive_count())
        .unwrap_or_default()
}

fn hud_text(host: &SceneHost<PlatformerScene>) -> String {
    let text = handles(host).score_text;
    host.world()
        .text(text)
        .map(|text| text.content.clone())
        .expect("score text")
}

#[test]
fn load_builds_level_from_map_objects() {
    let host = loaded_host();
    let handles = handles(&host);
    let world = host.world();

    assert_eq!(world.group_members(handles.coins).len(), 1);
    assert_eq!(world.group_members(handles.power_ups).len(), 1);
    let water = world.group_members(handles.water);
    assert_eq!(water.len(), 1);
    assert!(!world.find_sprite(water[0]).expect("water").visible);

    let coin = world.group_members(handles.coins)[0];
    assert_eq!(world.find_sprite(coin).map(|sprite| sprite.position), Some(COIN_CENTER));
    assert_eq!(
        world.find_sprite(coin).and_then(|sprite| sprite.anim.current_key().map(str::to_string)),
        Some(ANIM_COIN.to_string())
    );

    let player = world.find_sprite(handles.player).expect("player");
    assert_eq!(player.position, SPAWN);
    assert_eq!(player.tile_collider(), Some(GROUND_LAYER));
    assert!(player.body.as_ref().is_some_and(|body| body.collide_world_bounds));

    assert_eq!(world.physics().gravity().y, 1500.0);
    assert_eq!(world.physics().bounds(), Rect::new(0.0, 0.0, 180.0, 144.0));
    assert_eq!(world.camera().zoom(), 2.0);
    assert_eq!(world.camera().bounds(), Some(Rect::new(0.0, 0.0, 180.0, 144.0)));
    assert_eq!(world.camera().follow().map(|follow| follow.target), Some(handles.player));
    assert_eq!(
        world.tilemap().and_then(|map| map.tile_layer(GROUND_LAYER)).map(|layer| layer.solid_count()),
        Some(10)
    );

    let score = world.text(handles.score_text).expect("score text");
    assert_eq!(score.content, "Score 0");
    assert_eq!(score.scroll_factor, 0.0);
    assert_eq!(host.scene().state(), &LevelState::from_tuning(&Tuning::default()));
}

#[test]
fn player_falls_and_lands_on_collidable_ground() {
    let mut host = loaded_host();
    settle(&mut host);

    let player = player_sprite(&host);
    let body = player.body.expect("body");
    assert!(body.blocked.down);
    assert_eq!(body.velocity.y, 0.0);
    assert!((player.position.y - (GROUND_TOP - 12.0)).abs() < 0.01);
}

#[test]
fn airborne_player_plays_jump_animation() {
    let mut host = loaded_host();
    host.tick(DT, &InputSnapshot::empty());

    assert_eq!(player_sprite(&host).anim.current_key(), Some(ANIM_JUMP));
}

#[test]
fn coin_pickup_scores_updates_hud_and_bursts_once() {
    let mut host = loaded_host();
    let handles = handles(&host);
    let coin = host.world().group_members(handles.coins)[0];

    teleport_player(&mut host, COIN_CENTER);
    host.tick(DT, &InputSnapshot::empty());

    assert_eq!(host.scene().state().score, 25);
    assert_eq!(hud_text(&host), "Score 25");
    assert!(!host.world().is_alive(coin));
    assert!(host.world().group_members(handles.coins).is_empty());
    assert_eq!(alive_particles(&host, handles.coin_burst), 3);

    host.tick(DT, &InputSnapshot::empty());
    assert_eq!(host.scene().state().score, 25);
    assert_eq!(alive_particles(&host, handles.coin_burst), 3);
}

#[test]
fn power_up_boosts_jump_for_ten_seconds() {
    let mut host = loaded_host();
    let handles = handles(&host);

    teleport_player(&mut host, POWER_UP_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    assert_eq!(host.scene().state().jump_velocity, -2000.0);
    assert!(host.world().group_members(handles.power_ups).is_empty());

    settle(&mut host);
    host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::MoveUp));
    assert!(player_body(&host).velocity.y < -1900.0);

    // 92 ticks so far; 9.5 s after pickup the boost still holds.
    run_ticks(&mut host, InputSnapshot::empty(), 570 - 92);
    assert_eq!(host.scene().state().jump_velocity, -2000.0);

    run_ticks(&mut host, InputSnapshot::empty(), 60);
    assert_eq!(host.scene().state().jump_velocity, -600.0);
    assert!(host.scene().power_up_timer.is_none());
}

#[test]
fn second_power_up_restarts_the_boost_window() {
    let mut world = SceneWorld::default();
    let mut scene = test_scene();
    scene.load(&mut world);
    world.apply_pending();
    let extra = world.spawn_with_body(
        POWER_UP_CENTER,
        SpriteDesc::placeholder("power_up", Vec2::new(18.0, 18.0)),
        ArcadeBody::fixed(Vec2::new(18.0, 18.0)),
    );
    world.apply_pending();
    let first = world.group_members(scene.handles.clone().expect("handles").power_ups)[0];

    scene.collect_power_up(&mut world, first);
    assert!(scene.timers.tick(Duration::from_secs(6)).is_empty());
    scene.collect_power_up(&mut world, extra);

    assert_eq!(scene.timers.len(), 1);
    let timer = scene.power_up_timer.expect("power-up timer");
    assert_eq!(scene.timers.remaining(timer), Some(Duration::from_secs(10)));
    assert!(scene.timers.tick(Duration::from_secs(5)).is_empty());
    assert_eq!(scene.state().jump_velocity, -2000.0);
    assert_eq!(
        scene.timers.tick(Duration::from_secs(5)),
        vec![LevelTimer::PowerUpExpired]
    );
}

#[test]
fn water_drowns_once_then_respawns_player() {
    let mut host = loaded_host();
    let handles = handles(&host);
    settle(&mut host);

    teleport_player(&mut host, WATER_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    {
        let state = host.scene().state();
        assert!(state.drowning);
        assert_eq!(state.jump_velocity, 0.0);
        assert_eq!(state.acceleration, 0.0);
    }
    assert_eq!(host.world().physics().gravity().y, 50.0);
    assert_eq!(alive_particles(&host, handles.sinking), 30);
    assert_eq!(host.scene().timers.len(), 1);
    assert!(player_body(&host).velocity.y.abs() < 1.0);

    // Still inside the water: no second burst and no second timer.
    run_ticks(&mut host, InputSnapshot::empty(), 10);
    assert_eq!(host.scene().timers.len(), 1);
    assert_eq!(alive_particles(&host, handles.sinking), 30);

    let mut ticks_until_recovered = 0;
    while host.scene().state().drowning && ticks_until_recovered < 300 {
        host.tick(DT, &InputSnapshot::empty());
        ticks_until_recovered += 1;
    }
    assert!((105..=115).contains(&ticks_until_recovered));

    let state = host.scene().state();
    assert!(!state.drowning);
    assert_eq!(state.jump_velocity, -600.0);
    assert_eq!(state.acceleration, 400.0);
    assert_eq!(host.world().physics().gravity().y, 1500.0);
    let position = player_sprite(&host).position;
    assert!((position.x - SPAWN.x).abs() < 0.01);
    assert!((position.y - SPAWN.y).abs() < 1.0);
    assert!(host.scene().timers.is_empty());
}

#[test]
fn every_isolated_water_entry_drowns_and_recovers_once() {
    let mut host = loaded_host();
    let handles = handles(&host);

    for cycle in 0..2 {
        settle(&mut host);
        assert_eq!(alive_particles(&host, handles.sinking), 0, "cycle {cycle}");

        teleport_player(&mut host, WATER_CENTER);
        host.tick(DT, &InputSnapshot::empty());
        assert!(host.scene().state().drowning, "cycle {cycle}");
        assert_eq!(host.world().physics().gravity().y, 50.0);
        assert_eq!(alive_particles(&host, handles.sinking), 30, "cycle {cycle}");
        assert_eq!(host.scene().timers.len(), 1, "cycle {cycle}");

        let mut ticks_until_recovered = 0;
        while host.scene().state().drowning && ticks_until_recovered < 300 {
            host.tick(DT, &InputSnapshot::empty());
            assert!(host.scene().timers.len() <= 1);
            ticks_until_recovered += 1;
        }
        assert!(
            (105..=115).contains(&ticks_until_recovered),
            "cycle {cycle} recovered after {ticks_until_recovered} ticks"
        );

        let state = host.scene().state();
        assert_eq!(state.jump_velocity, -600.0);
        assert_eq!(state.acceleration, 400.0);
        assert_eq!(host.world().physics().gravity().y, 1500.0);
        let position = player_sprite(&host).position;
        assert!((position.x - SPAWN.x).abs() < 0.01, "cycle {cycle}");
        assert!((position.y - SPAWN.y).abs() < 1.0, "cycle {cycle}");
        assert!(host.scene().timers.is_empty());
    }
}

#[test]
fn jump_is_edge_triggered_and_grounded_only() {
    let mut host = loaded_host();
    settle(&mut host);

    host.tick(DT, &InputSnapshot::empty().with_action_down(InputAction::MoveUp, true));
    assert_eq!(player_body(&host).velocity.y, 0.0);

    host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::MoveUp));
    let launch = player_body(&host).velocity.y;
    assert!((launch - (-600.0 + 1500.0 * DT)).abs() < 0.01);

    host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::MoveUp));
    assert!(player_body(&host).velocity.y > launch);
}

#[test]
fn steering_sets_acceleration_flip_and_smoke() {
    let mut host = loaded_host();
    let handles = handles(&host);
    settle(&mut host);

    let right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
    run_ticks(&mut host, right, 10);
    let player = player_sprite(&host);
    let body = player.body.clone().expect("body");
    assert_eq!(body.acceleration.x, 400.0);
    assert!(body.velocity.x > 0.0);
    assert!(player.flip_x);
    assert_eq!(player.anim.current_key(), Some(ANIM_WALK));
    let smoke = host.world().emitter(handles.walking_smoke).expect("smoke");
    assert!(smoke.is_emitting());
    assert_eq!(smoke.follow().map(|follow| follow.target), Some(handles.player));
    assert_eq!(smoke.follow().map(|follow| follow.offset), Some(Vec2::new(2.0, 7.0)));
    assert_eq!(smoke.particle_speed(), Some(Vec2::new(-50.0, 0.0)));
    assert!(smoke.alive_count() <= 8);

    let left = InputSnapshot::empty()
        .with_action_down(InputAction::MoveLeft, true)
        .with_action_down(InputAction::MoveRight, true);
    host.tick(DT, &left);
    assert_eq!(player_body(&host).acceleration.x, -400.0);
    assert!(!player_sprite(&host).flip_x);
    assert_eq!(
        host.world().emitter(handles.walking_smoke).and_then(|smoke| smoke.particle_speed()),
        Some(Vec2::new(50.0, 0.0))
    );

    run_ticks(&mut host, InputSnapshot::empty(), 120);
    let body = player_body(&host);
    assert_eq!(body.acceleration.x, 0.0);
    assert_eq!(body.drag.x, 500.0);
    assert_eq!(body.velocity.x, 0.0);
    assert_eq!(player_sprite(&host).anim.current_key(), Some(ANIM_IDLE));
    assert!(!host.world().emitter(handles.walking_smoke).expect("smoke").is_emitting());
}

#[test]
fn smoke_waits_for_ground_contact() {
    let mut host = loaded_host();
    let handles = handles(&host);

    host.tick(DT, &InputSnapshot::empty().with_action_down(InputAction::MoveLeft, true));
    let smoke = host.world().emitter(handles.walking_smoke).expect("smoke");
    assert!(!smoke.is_emitting());
    assert!(smoke.follow().is_some());
}

#[test]
fn debug_key_toggles_collision_drawing() {
    let mut host = loaded_host();
    assert!(!host.world().physics().debug_draw());

    host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::ToggleDebug));
    assert!(host.world().physics().debug_draw());

    host.tick(DT, &InputSnapshot::empty().with_action_down(InputAction::ToggleDebug, true));
    assert!(host.world().physics().debug_draw());

    host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::ToggleDebug));
    assert!(!host.world().physics().debug_draw());
}

#[test]
fn restart_resets_score_gravity_flags_and_timers() {
    let mut host = loaded_host();
    teleport_player(&mut host, COIN_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    teleport_player(&mut host, POWER_UP_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    settle(&mut host);
    teleport_player(&mut host, WATER_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    assert!(host.scene().state().drowning);
    assert_eq!(host.scene().timers.len(), 2);

    let command = host.tick(DT, &InputSnapshot::empty().with_action_pressed(InputAction::Restart));
    assert_eq!(command, SceneCommand::Restart);

    let handles = handles(&host);
    assert_eq!(host.scene().state(), &LevelState::from_tuning(&Tuning::default()));
    assert!(host.scene().timers.is_empty());
    assert!(host.scene().power_up_timer.is_none());
    assert_eq!(host.world().physics().gravity().y, 1500.0);
    assert_eq!(hud_text(&host), "Score 0");
    assert_eq!(host.world().group_members(handles.coins).len(), 1);
    assert_eq!(host.world().group_members(handles.power_ups).len(), 1);
    assert_eq!(player_sprite(&host).position, SPAWN);
}

#[test]
fn unload_drops_pending_reverts() {
    let mut world = SceneWorld::default();
    let mut scene = test_scene();
    scene.load(&mut world);
    world.apply_pending();
    let power_up = world.group_members(scene.handles.clone().expect("handles").power_ups)[0];
    scene.collect_power_up(&mut world, power_up);

    scene.unload(&mut world);
    assert!(scene.timers.is_empty());
    assert!(scene.handles.is_none());
}

#[test]
fn asset_requires_player_spawn() {
    let mut map = test_map();
    map["layers"][1]["objects"]
        .as_array_mut()
        .expect("objects")
        .retain(|object| object["name"] != "playerSpawn");

    let err = asset_from(&map).expect_err("missing spawn");
    assert!(matches!(err, LevelError::MissingPlayerSpawn(OBJECT_LAYER)));
}

#[test]
fn asset_requires_ground_layer() {
    let mut map = test_map();
    map["layers"][0]["name"] = json!("Background");

    let err = asset_from(&map).expect_err("missing ground");
    assert!(matches!(err, LevelError::MissingGroundLayer(GROUND_LAYER)));
}

#[test]
fn oversized_map_is_reported_as_map_error() {
    let mut map = test_map();
    map["width"] = json!(300_000_000u32);

    let err = asset_from(&map).expect_err("oversized map");
    assert!(matches!(err, LevelError::Map(TilemapError::MapTooLarge { .. })));

    map["layers"][0]["width"] = json!(300_000_000u32);
    let err = asset_from(&map).expect_err("oversized map and layer");
    assert!(matches!(err, LevelError::Map(TilemapError::MapTooLarge { .. })));
}

#[test]
fn ground_layer_narrower_than_map_is_rejected() {
    let mut map = test_map();
    map["width"] = json!(12);

    let err = asset_from(&map).expect_err("layer mismatch");
    assert!(matches!(
        err,
        LevelError::Map(TilemapError::LayerSizeMismatch { .. })
    ));
}

#[test]
fn failed_level_setup_leaves_an_empty_world() {
    let mut map = test_map();
    map["layers"][0]["name"] = json!("Background");
    let asset = LevelAsset {
        map: Tilemap::from_json_str(&map.to_string()).expect("map"),
        spawn: SPAWN,
    };

    let mut host = SceneHost::new(PlatformerScene::new(asset, Tuning::default()));
    host.world_mut().camera_mut().set_viewport(1440, 900);
    host.load();

    assert!(host.scene().handles.is_none());
    assert!(host.world().tilemap().is_none());
    assert_eq!(host.world().sprite_count(), 0);
    assert!(host.world().texts().is_empty());
    assert!(host.scene().timers.is_empty());

    run_ticks(&mut host, InputSnapshot::empty(), 5);
    assert_eq!(host.world().sprite_count(), 0);
}

#[test]
fn asset_loads_from_disk_and_reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("level.tmj");
    std::fs::write(&path, test_map().to_string()).expect("write map");

    let asset = LevelAsset::load(&path).expect("asset");
    assert_eq!(asset.spawn(), SPAWN);
    assert_eq!(asset.map().width(), 10);

    let err = LevelAsset::load(&dir.path().join("absent.tmj")).expect_err("missing file");
    assert!(matches!(err, LevelError::Map(_)));
}

#[test]
fn debug_title_reports_score_and_drowning() {
    let mut host = loaded_host();
    assert_eq!(
        host.debug_title().as_deref(),
        Some("Platformer | Score 0 | jump -600")
    );

    settle(&mut host);
    teleport_player(&mut host, WATER_CENTER);
    host.tick(DT, &InputSnapshot::empty());
    assert_eq!(
        host.debug_title().as_deref(),
        Some("Platformer | Score 0 | jump 0 | drowning")
    );
}

#[test]
fn shipped_level_validates_and_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../assets")
        .join("levels/platformer-level-1.tmj");
    let asset = LevelAsset::load(&path).expect("shipped level");
    assert_eq!((asset.map().width(), asset.map().height()), (45, 25));
    assert_eq!(asset.map().tile_size(), Vec2::new(18.0, 18.0));

    let mut host = SceneHost::new(PlatformerScene::new(asset, Tuning::default()));
    host.load();
    let handles = handles(&host);
    assert!(!host.world().group_members(handles.coins).is_empty());
    assert_eq!(host.world().group_members(handles.water).len(), 1);
    assert!(host
        .world()
        .tilemap()
        .and_then(|map| map.tile_layer(GROUND_LAYER))
        .is_some_and(|layer| layer.solid_count() > 0));
}
