impl PlatformerScene {
    fn collect_coin(&mut self, world: &mut SceneWorld, handles: &LevelHandles, coin: SpriteId) {
        let Some(position) = world.find_sprite(coin).map(|sprite| sprite.position) else {
            return;
        };
        world.destroy(coin);
        self.state.score = self.state.score.saturating_add(self.tuning.coin_score);
        world.set_text(handles.score_text, score_label(self.state.score));
        if let Some(burst) = world.emitter_mut(handles.coin_burst) {
            burst.explode(COIN_BURST_COUNT, position.x, position.y);
        }
        info!(
            score = self.state.score,
            x = position.x,
            y = position.y,
            "coin_collected"
        );
    }

    /// A second pickup while boosted restarts the boost window.
    fn collect_power_up(&mut self, world: &mut SceneWorld, power_up: SpriteId) {
        world.destroy(power_up);
        self.state.jump_velocity = self.tuning.power_up_jump_velocity;
        if let Some(previous) = self.power_up_timer.take() {
            self.timers.cancel(previous);
        }
        let delay = Duration::from_secs_f32(self.tuning.power_up_seconds);
        self.power_up_timer = Some(self.timers.delayed_call(delay, LevelTimer::PowerUpExpired));
        info!(
            jump_velocity = self.state.jump_velocity,
            duration_ms = delay.as_millis() as u64,
            "power_up_collected"
        );
    }

    fn enter_water(&mut self, world: &mut SceneWorld, handles: &LevelHandles) {
        if self.state.drowning {
            return;
        }
        self.state.drowning = true;
        self.state.jump_velocity = 0.0;
        self.state.acceleration = 0.0;

        let mut position = Vec2::ZERO;
        if let Some(player) = world.find_sprite_mut(handles.player) {
            position = player.position;
            if let Some(body) = player.body.as_mut() {
                body.velocity.y = 0.0;
            }
        }
        if let Some(sinking) = world.emitter_mut(handles.sinking) {
            sinking.explode(SINKING_BURST_COUNT, position.x, position.y);
        }
        world.physics_mut().set_gravity_y(self.tuning.drown_gravity_y);
        self.state.gravity_y = self.tuning.drown_gravity_y;

        let delay = Duration::from_secs_f32(self.tuning.drown_recovery_seconds);
        self.timers.delayed_call(delay, LevelTimer::DrownRecovered);
        info!(x = position.x, y = position.y, "drowning_started");
    }

    fn handle_timer(&mut self, timer: LevelTimer, world: &mut SceneWorld) {
        match timer {
            LevelTimer::PowerUpExpired => {
                self.power_up_timer = None;
                self.state.jump_velocity = self.tuning.jump_velocity;
                info!(jump_velocity = self.state.jump_velocity, "power_up_expired");
            }
            LevelTimer::DrownRecovered => self.recover_from_drowning(world),
        }
    }

    /// Runs whether or not the player is still in the water.
    fn recover_from_drowning(&mut self, world: &mut SceneWorld) {
        let spawn = self.asset.spawn();
        if let Some(player) = self
            .handles
            .as_ref()
            .and_then(|handles| world.find_sprite_mut(handles.player))
        {
            player.position = spawn;
            if let Some(body) = player.body.as_mut() {
                body.velocity.y = 0.0;
            }
        }
        self.state.gravity_y = self.tuning.gravity_y;
        world.physics_mut().set_gravity_y(self.state.gravity_y);
        self.state.jump_velocity = self.tuning.jump_velocity;
        self.state.acceleration = self.tuning.acceleration;
        self.state.drowning = false;
        info!(x = spawn.x, y = spawn.y, "drowning_recovered");
    }
}
