use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub key: String,
    pub frames: Vec<u32>,
    pub frame_rate: f32,
    pub repeat: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    defs: HashMap<String, AnimationDef>,
}

impl AnimationLibrary {
    pub fn insert(&mut self, def: AnimationDef) {
        self.defs.insert(def.key.clone(), def);
    }

    pub fn get(&self, key: &str) -> Option<&AnimationDef> {
        self.defs.get(key)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }
}

/// Per-sprite playback cursor into an `AnimationDef`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    current: Option<String>,
    frame_index: usize,
    elapsed_seconds: f32,
    finished: bool,
}

impl AnimationState {
    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_playing(&self, key: &str) -> bool {
        self.current.as_deref() == Some(key) && !self.finished
    }

    /// Starts `def` from its first frame. With `ignore_if_playing`, a running
    /// playback of the same key continues instead. Returns whether playback
    /// was (re)started.
    pub fn play(&mut self, def: &AnimationDef, ignore_if_playing: bool) -> bool {
        if ignore_if_playing && self.is_playing(&def.key) {
            return false;
        }
        self.current = Some(def.key.clone());
        self.frame_index = 0;
        self.elapsed_seconds = 0.0;
        self.finished = false;
        true
    }

    pub fn stop(&mut self) {
        self.current = None;
        self.frame_index = 0;
        self.elapsed_seconds = 0.0;
        self.finished = false;
    }

    pub fn advance(&mut self, def: &AnimationDef, dt: f32) {
        if self.finished || def.frames.len() <= 1 || def.frame_rate <= 0.0 {
            return;
        }
        let frame_duration = 1.0 / def.frame_rate;
        self.elapsed_seconds += dt;
        while self.elapsed_seconds >= frame_duration {
            self.elapsed_seconds -= frame_duration;
            if self.frame_index + 1 < def.frames.len() {
                self.frame_index += 1;
            } else if def.repeat {
                self.frame_index = 0;
            } else {
                self.finished = true;
                break;
            }
        }
    }

    pub fn frame(&self, def: &AnimationDef) -> Option<u32> {
        def.frames
            .get(self.frame_index.min(def.frames.len().saturating_sub(1)))
            .copied()
    }
}
