use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::app::SpriteId;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub start: f32,
    pub end: f32,
}

impl Tween {
    pub const fn constant(value: f32) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn at(&self, t: f32) -> f32 {
        self.start + (self.end - self.start) * t.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    pub min: f32,
    pub max: f32,
}

/// Declarative emitter description. Frames index into `texture`; the renderer
/// falls back to `tint` squares when the texture is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    pub texture: String,
    pub frames: Vec<u32>,
    pub random_frame: bool,
    pub lifespan_seconds: f32,
    pub speed: SpeedRange,
    pub gravity_y: f32,
    pub scale: Tween,
    pub alpha: Tween,
    pub rotate_degrees: Tween,
    pub quantity: u32,
    /// Seconds between continuous emissions; zero emits every step.
    pub frequency_seconds: f32,
    pub max_alive: Option<usize>,
    pub emitting: bool,
    pub tint: [u8; 4],
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            texture: String::new(),
            frames: Vec::new(),
            random_frame: false,
            lifespan_seconds: 1.0,
            speed: SpeedRange { min: 0.0, max: 0.0 },
            gravity_y: 0.0,
            scale: Tween::constant(1.0),
            alpha: Tween::constant(1.0),
            rotate_degrees: Tween::constant(0.0),
            quantity: 1,
            frequency_seconds: 0.0,
            max_alive: None,
            emitting: true,
            tint: [255, 255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub age_seconds: f32,
    pub frame: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterFollow {
    pub target: SpriteId,
    pub offset: Vec2,
}

#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    config: EmitterConfig,
    particles: Vec<Particle>,
    emitting: bool,
    position: Vec2,
    follow: Option<EmitterFollow>,
    particle_speed: Option<Vec2>,
    emit_cooldown: f32,
    next_frame_cursor: usize,
    rng: SmallRng,
}

impl ParticleEmitter {
    pub fn new(config: EmitterConfig, seed: u64) -> Self {
        Self {
            emitting: config.emitting,
            config,
            particles: Vec::new(),
            position: Vec2::ZERO,
            follow: None,
            particle_speed: None,
            emit_cooldown: 0.0,
            next_frame_cursor: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn alive_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn follow(&self) -> Option<EmitterFollow> {
        self.follow
    }

    pub fn start(&mut self) {
        self.emitting = true;
    }

    pub fn stop(&mut self) {
        self.emitting = false;
        self.emit_cooldown = 0.0;
    }

    pub fn start_follow(&mut self, target: SpriteId, offset: Vec2) {
        self.follow = Some(EmitterFollow { target, offset });
    }

    pub fn stop_follow(&mut self) {
        self.follow = None;
    }

    /// Replaces the radial speed range with a fixed velocity for new particles.
    pub fn set_particle_speed(&mut self, x: f32, y: f32) {
        self.particle_speed = Some(Vec2::new(x, y));
    }

    pub fn particle_speed(&self) -> Option<Vec2> {
        self.particle_speed
    }

    /// Emits `count` particles at once, independent of the emitting state.
    pub fn explode(&mut self, count: u32, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        for _ in 0..count {
            if !self.emit_one(Vec2::new(x, y)) {
                break;
            }
        }
    }

    /// Ages particles, then emits continuously if started. `follow_position`
    /// is the followed sprite's position when the emitter is following one.
    pub fn step(&mut self, dt: f32, follow_position: Option<Vec2>) {
        if let (Some(follow), Some(target)) = (self.follow, follow_position) {
            self.position = target + follow.offset;
        }

        let lifespan = self.config.lifespan_seconds;
        let gravity_y = self.config.gravity_y;
        self.particles.retain_mut(|particle| {
            particle.age_seconds += dt;
            if particle.age_seconds >= lifespan {
                return false;
            }
            particle.velocity.y += gravity_y * dt;
            particle.position += particle.velocity * dt;
            true
        });

        if !self.emitting {
            return;
        }
        self.emit_cooldown -= dt;
        if self.emit_cooldown > 0.0 {
            return;
        }
        self.emit_cooldown = self.config.frequency_seconds.max(0.0);
        let origin = self.position;
        for _ in 0..self.config.quantity {
            if !self.emit_one(origin) {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Normalized age in `[0, 1]` used for scale/alpha/rotation tweens.
    pub fn progress(&self, particle: &Particle) -> f32 {
        if self.config.lifespan_seconds <= 0.0 {
            return 1.0;
        }
        particle.age_seconds / self.config.lifespan_seconds
    }

    fn emit_one(&mut self, origin: Vec2) -> bool {
        if let Some(max_alive) = self.config.max_alive {
            if self.particles.len() >= max_alive {
                return false;
            }
        }

        let velocity = match self.particle_speed {
            Some(fixed) => fixed,
            None => {
                let SpeedRange { min, max } = self.config.speed;
                let speed = if max > min {
                    self.rng.gen_range(min..=max)
                } else {
                    min
                };
                let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                Vec2::new(angle.cos() * speed, angle.sin() * speed)
            }
        };
        let frame = self.pick_frame();
        self.particles.push(Particle {
            position: origin,
            velocity,
            age_seconds: 0.0,
            frame,
        });
        true
    }

    fn pick_frame(&mut self) -> u32 {
        match self.config.frames.len() {
            0 => 0,
            1 => self.config.frames[0],
            len if self.config.random_frame => self.config.frames[self.rng.gen_range(0..len)],
            len => {
                let frame = self.config.frames[self.next_frame_cursor % len];
                self.next_frame_cursor = self.next_frame_cursor.wrapping_add(1);
                frame
            }
        }
    }
}
