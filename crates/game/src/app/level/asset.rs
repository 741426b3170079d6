#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to load level map: {0}")]
    Map(#[from] TilemapError),
    #[error("level map has no tile layer named `{0}`")]
    MissingGroundLayer(&'static str),
    #[error("level map has no object layer named `{0}`")]
    MissingObjectLayer(&'static str),
    #[error("level map has no `playerSpawn` object in layer `{0}`")]
    MissingPlayerSpawn(&'static str),
    #[error("failed to build level scene: {0}")]
    Scene(#[from] SceneError),
}

/// A parsed level map checked for the layers and objects the scene needs.
/// Each load starts from a fresh copy of `map`.
#[derive(Debug, Clone)]
pub(crate) struct LevelAsset {
    map: Tilemap,
    spawn: Vec2,
}

impl LevelAsset {
    pub(crate) fn load(path: &Path) -> Result<Self, LevelError> {
        Self::from_tilemap(Tilemap::load(path)?)
    }

    pub(crate) fn from_tilemap(map: Tilemap) -> Result<Self, LevelError> {
        if map.tile_layer(GROUND_LAYER).is_none() {
            return Err(LevelError::MissingGroundLayer(GROUND_LAYER));
        }
        if map.object_layer(OBJECT_LAYER).is_none() {
            return Err(LevelError::MissingObjectLayer(OBJECT_LAYER));
        }
        let spawn = map
            .find_object(OBJECT_LAYER, |object| object.name == PLAYER_SPAWN_OBJECT)
            .map(|object| Vec2::new(object.x, object.y))
            .ok_or(LevelError::MissingPlayerSpawn(OBJECT_LAYER))?;
        Ok(Self { map, spawn })
    }

    pub(crate) fn map(&self) -> &Tilemap {
        &self.map
    }

    pub(crate) fn spawn(&self) -> Vec2 {
        self.spawn
    }
}
