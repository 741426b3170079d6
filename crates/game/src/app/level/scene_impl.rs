pub(crate) struct PlatformerScene {
    asset: LevelAsset,
    tuning: Tuning,
    state: LevelState,
    timers: TimerQueue<LevelTimer>,
    power_up_timer: Option<TimerId>,
    handles: Option<LevelHandles>,
}

impl PlatformerScene {
    pub(crate) fn new(asset: LevelAsset, tuning: Tuning) -> Self {
        Self {
            state: LevelState::from_tuning(&tuning),
            asset,
            tuning,
            timers: TimerQueue::new(),
            power_up_timer: None,
            handles: None,
        }
    }

    pub(crate) fn state(&self) -> &LevelState {
        &self.state
    }

    fn reset_run_state(&mut self) {
        self.state = LevelState::from_tuning(&self.tuning);
        self.timers.clear();
        self.power_up_timer = None;
        self.handles = None;
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.reset_run_state();
        match self.build_level(world) {
            Ok(handles) => {
                info!(
                    coins = world.group_members(handles.coins).len(),
                    power_ups = world.group_members(handles.power_ups).len(),
                    water_markers = world.group_members(handles.water).len(),
                    spawn_x = self.asset.spawn().x,
                    spawn_y = self.asset.spawn().y,
                    "scene_loaded"
                );
                self.handles = Some(handles);
            }
            Err(err) => {
                // Never keep a half-built level.
                world.clear();
                self.reset_run_state();
                error!(error = %err, "level_setup_failed");
            }
        }
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        for timer in self.timers.tick(Duration::from_secs_f32(fixed_dt_seconds)) {
            self.handle_timer(timer, world);
        }

        if let Some(handles) = self.handles.clone() {
            self.apply_controls(input, world, &handles);
        }

        if input.just_pressed(InputAction::ToggleDebug) {
            let enabled = world.physics_mut().toggle_debug_draw();
            info!(enabled, "debug_draw_toggled");
        }

        if input.just_pressed(InputAction::Restart) {
            info!(score = self.state.score, "scene_restart_requested");
            return SceneCommand::Restart;
        }

        SceneCommand::None
    }

    fn handle_overlap(&mut self, event: OverlapEvent, world: &mut SceneWorld) {
        let Some(handles) = self.handles.clone() else {
            return;
        };
        if event.overlap == handles.coin_overlap {
            self.collect_coin(world, &handles, event.other);
        } else if event.overlap == handles.power_up_overlap {
            self.collect_power_up(world, event.other);
        } else if event.overlap == handles.water_overlap {
            self.enter_water(world, &handles);
        }
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.timers.clear();
        self.power_up_timer = None;
        self.handles = None;
        debug!(score = self.state.score, "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let state = self.state();
        Some(format!(
            "Platformer | Score {} | jump {:.0}{}",
            state.score,
            state.jump_velocity,
            if state.drowning { " | drowning" } else { "" }
        ))
    }
}
