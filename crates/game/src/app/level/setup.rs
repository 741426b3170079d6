fn coin_burst_config() -> EmitterConfig {
    EmitterConfig {
        texture: TILE_SHEET.to_string(),
        frames: vec![COIN_FRAME],
        lifespan_seconds: 1.5,
        speed: SpeedRange {
            min: 100.0,
            max: 200.0,
        },
        gravity_y: 800.0,
        scale: Tween::new(1.0, 0.0),
        alpha: Tween::new(1.0, 0.0),
        rotate_degrees: Tween::new(0.0, 360.0),
        quantity: COIN_BURST_COUNT,
        emitting: false,
        tint: [250, 204, 60, 255],
        ..EmitterConfig::default()
    }
}

fn sinking_config() -> EmitterConfig {
    EmitterConfig {
        texture: PARTICLE_SHEET.to_string(),
        frames: vec![CIRCLE_PARTICLE_FRAME],
        lifespan_seconds: 2.0,
        speed: SpeedRange {
            min: 10.0,
            max: 20.0,
        },
        gravity_y: -200.0,
        scale: Tween::constant(0.05),
        alpha: Tween::new(1.0, 0.1),
        quantity: SINKING_BURST_COUNT,
        emitting: false,
        tint: [200, 230, 255, 255],
        ..EmitterConfig::default()
    }
}

fn walking_smoke_config() -> EmitterConfig {
    EmitterConfig {
        texture: PARTICLE_SHEET.to_string(),
        frames: SMOKE_PARTICLE_FRAMES.to_vec(),
        random_frame: true,
        lifespan_seconds: 0.35,
        gravity_y: -400.0,
        scale: Tween::new(0.03, 0.1),
        alpha: Tween::new(1.0, 0.1),
        max_alive: Some(8),
        emitting: false,
        tint: [235, 235, 235, 255],
        ..EmitterConfig::default()
    }
}

fn level_animations() -> [AnimationDef; 4] {
    [
        AnimationDef {
            key: ANIM_WALK.to_string(),
            frames: vec![PLAYER_FRAME, PLAYER_JUMP_FRAME],
            frame_rate: 15.0,
            repeat: true,
        },
        AnimationDef {
            key: ANIM_IDLE.to_string(),
            frames: vec![PLAYER_FRAME],
            frame_rate: 15.0,
            repeat: true,
        },
        AnimationDef {
            key: ANIM_JUMP.to_string(),
            frames: vec![PLAYER_JUMP_FRAME],
            frame_rate: 15.0,
            repeat: true,
        },
        AnimationDef {
            key: ANIM_COIN.to_string(),
            frames: vec![COIN_FRAME, COIN_SPIN_FRAME],
            frame_rate: 4.0,
            repeat: true,
        },
    ]
}

impl PlatformerScene {
    /// Registers the map, sheets, pickups, player, emitters, camera and HUD.
    fn build_level(&self, world: &mut SceneWorld) -> Result<LevelHandles, LevelError> {
        world.set_tilemap(self.asset.map().clone());
        world.add_spritesheet(TILE_SHEET, TILE_SHEET_IMAGE, TILE_SIZE_PX, TILE_SIZE_PX)?;
        world.add_spritesheet(
            CHARACTER_SHEET,
            CHARACTER_SHEET_IMAGE,
            CHARACTER_SIZE_PX,
            CHARACTER_SIZE_PX,
        )?;
        world.add_spritesheet(
            PARTICLE_SHEET,
            PARTICLE_SHEET_IMAGE,
            PARTICLE_SIZE_PX,
            PARTICLE_SIZE_PX,
        )?;
        world.add_tileset_image(TILESET_NAME, TILE_SHEET);
        world.create_layer(GROUND_LAYER)?;

        let (map_width, map_height, solid_tiles) = match world.tilemap_mut() {
            Some(map) => {
                let solid = map.set_collision_by_property(GROUND_LAYER, COLLIDES_PROPERTY, true)?;
                (map.width_in_pixels(), map.height_in_pixels(), solid)
            }
            None => return Err(SceneError::NoTilemap.into()),
        };
        debug!(solid_tiles, layer = GROUND_LAYER, "ground_collision_set");

        let map_bounds = Rect::new(0.0, 0.0, map_width, map_height);
        world.physics_mut().set_bounds(map_bounds);
        world.physics_mut().set_gravity_y(self.state.gravity_y);

        for def in level_animations() {
            world.add_animation(def);
        }

        let power_ups = self.spawn_pickups(
            world,
            POWER_UP_OBJECT,
            SpriteDesc::placeholder("power_up", Vec2::ZERO)
                .with_texture(TILE_SHEET, POWER_UP_FRAME)
                .with_fallback_color([214, 92, 214, 255]),
        )?;
        let coins = self.spawn_pickups(
            world,
            COIN_OBJECT,
            SpriteDesc::placeholder("coin", Vec2::ZERO)
                .with_texture(TILE_SHEET, COIN_FRAME)
                .with_fallback_color([250, 204, 60, 255]),
        )?;
        for coin in &coins {
            world.play_animation(*coin, ANIM_COIN, false);
        }
        let water = self.spawn_pickups(
            world,
            WATER_OBJECT,
            SpriteDesc::placeholder("water_level", Vec2::ZERO)
                .with_fallback_color([40, 110, 220, 120]),
        )?;
        for marker in &water {
            if let Some(sprite) = world.find_sprite_mut(*marker) {
                sprite.visible = false;
            }
        }
        let coins = world.create_group(coins);
        let power_ups = world.create_group(power_ups);
        let water = world.create_group(water);

        let player_size = Vec2::new(CHARACTER_SIZE_PX as f32, CHARACTER_SIZE_PX as f32);
        let mut player_body = ArcadeBody::dynamic(player_size);
        player_body.collide_world_bounds = true;
        let player = world.spawn_with_body(
            self.asset.spawn(),
            SpriteDesc::placeholder("player", player_size)
                .with_texture(CHARACTER_SHEET, PLAYER_FRAME)
                .with_fallback_color([90, 200, 120, 255]),
            player_body,
        );
        world.add_tile_collider(player, GROUND_LAYER)?;

        let coin_overlap = world.add_overlap(player, coins);
        let power_up_overlap = world.add_overlap(player, power_ups);
        let water_overlap = world.add_overlap(player, water);

        let coin_burst = world.add_emitter(coin_burst_config());
        let sinking = world.add_emitter(sinking_config());
        let walking_smoke = world.add_emitter(walking_smoke_config());

        let camera = world.camera_mut();
        camera.set_bounds(map_bounds);
        camera.start_follow(player, Vec2::new(CAMERA_LERP, CAMERA_LERP));
        camera.set_round_pixels(true);
        camera.set_deadzone(CAMERA_DEADZONE_PX, CAMERA_DEADZONE_PX);
        camera.set_zoom(self.state.scale);

        let score_text = world.add_text(HUD_POSITION, score_label(self.state.score));
        if let Some(text) = world.text_mut(score_text) {
            text.scroll_factor = 0.0;
            text.scale = HUD_SCALE;
        }

        Ok(LevelHandles {
            player,
            coins,
            power_ups,
            water,
            coin_overlap,
            power_up_overlap,
            water_overlap,
            coin_burst,
            sinking,
            walking_smoke,
            score_text,
        })
    }

    /// One static-bodied sprite per map object named `object_name`, sized
    /// from the object.
    fn spawn_pickups(
        &self,
        world: &mut SceneWorld,
        object_name: &str,
        template: SpriteDesc,
    ) -> Result<Vec<SpriteId>, LevelError> {
        let placements = self.asset.map().create_from_objects(OBJECT_LAYER, object_name)?;
        let mut ids = Vec::with_capacity(placements.len());
        for placement in placements {
            let desc = SpriteDesc {
                size: placement.size,
                ..template.clone()
            };
            let id = world.spawn_with_body(placement.center, desc, ArcadeBody::fixed(placement.size));
            if !placement.visible {
                if let Some(sprite) = world.find_sprite_mut(id) {
                    sprite.visible = false;
                }
            }
            ids.push(id);
        }
        Ok(ids)
    }
}
