impl PlatformerScene {
    /// Level-triggered steering plus the edge-triggered jump. Reads the
    /// grounded flag left by the previous physics step.
    fn apply_controls(&self, input: &InputSnapshot, world: &mut SceneWorld, handles: &LevelHandles) {
        let Some(player) = world.find_sprite(handles.player) else {
            return;
        };
        let grounded = player.body.as_ref().is_some_and(ArcadeBody::on_floor);
        let smoke_offset = Vec2::new(
            player.desc.size.x * 0.5 - 10.0,
            player.desc.size.y * 0.5 - 5.0,
        );

        if input.is_down(InputAction::MoveLeft) {
            self.run(world, handles, Heading::Left, smoke_offset, grounded);
        } else if input.is_down(InputAction::MoveRight) {
            self.run(world, handles, Heading::Right, smoke_offset, grounded);
        } else {
            if let Some(body) = player_body_mut(world, handles.player) {
                body.acceleration.x = 0.0;
                body.drag.x = self.state.drag;
            }
            world.play_animation(handles.player, ANIM_IDLE, true);
            if let Some(smoke) = world.emitter_mut(handles.walking_smoke) {
                smoke.stop();
            }
        }

        if !grounded {
            world.play_animation(handles.player, ANIM_JUMP, true);
        }

        if grounded && input.just_pressed(InputAction::MoveUp) {
            if let Some(body) = player_body_mut(world, handles.player) {
                body.velocity.y = self.state.jump_velocity;
            }
            debug!(jump_velocity = self.state.jump_velocity, "player_jumped");
        }
    }

    fn run(
        &self,
        world: &mut SceneWorld,
        handles: &LevelHandles,
        heading: Heading,
        smoke_offset: Vec2,
        grounded: bool,
    ) {
        let sign = heading.sign();
        if let Some(player) = world.find_sprite_mut(handles.player) {
            player.flip_x = heading == Heading::Right;
            if let Some(body) = player.body.as_mut() {
                body.acceleration.x = sign * self.state.acceleration;
            }
        }
        world.play_animation(handles.player, ANIM_WALK, true);

        if let Some(smoke) = world.emitter_mut(handles.walking_smoke) {
            smoke.start_follow(handles.player, smoke_offset);
            // Smoke drifts away from the direction of travel.
            smoke.set_particle_speed(-sign * self.state.particle_velocity, 0.0);
            if grounded {
                smoke.start();
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    Left,
    Right,
}

impl Heading {
    fn sign(self) -> f32 {
        match self {
            Heading::Left => -1.0,
            Heading::Right => 1.0,
        }
    }
}

fn player_body_mut(world: &mut SceneWorld, player: SpriteId) -> Option<&mut ArcadeBody> {
    world
        .find_sprite_mut(player)
        .and_then(|sprite| sprite.body.as_mut())
}
