/// Mutable movement values and progress for one run of the level. Rebuilt
/// from `Tuning` on every load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelState {
    pub(crate) acceleration: f32,
    pub(crate) drag: f32,
    pub(crate) gravity_y: f32,
    pub(crate) jump_velocity: f32,
    pub(crate) particle_velocity: f32,
    pub(crate) scale: f32,
    pub(crate) drowning: bool,
    pub(crate) score: u32,
}

impl LevelState {
    fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            acceleration: tuning.acceleration,
            drag: tuning.drag,
            gravity_y: tuning.gravity_y,
            jump_velocity: tuning.jump_velocity,
            particle_velocity: tuning.particle_velocity,
            scale: tuning.scale,
            drowning: false,
            score: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelTimer {
    PowerUpExpired,
    DrownRecovered,
}

/// Everything `load` registered in the world that later ticks refer to.
#[derive(Debug, Clone)]
struct LevelHandles {
    player: SpriteId,
    coins: GroupId,
    power_ups: GroupId,
    water: GroupId,
    coin_overlap: OverlapId,
    power_up_overlap: OverlapId,
    water_overlap: OverlapId,
    coin_burst: EmitterId,
    sinking: EmitterId,
    walking_smoke: EmitterId,
    score_text: TextId,
}

fn score_label(score: u32) -> String {
    format!("Score {score}")
}
