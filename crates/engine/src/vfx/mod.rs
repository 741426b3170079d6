mod particles;

pub use particles::{EmitterConfig, EmitterFollow, Particle, ParticleEmitter, SpeedRange, Tween};
