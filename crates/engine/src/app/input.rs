#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ToggleDebug,
    Restart,
    Quit,
}

const ACTION_COUNT: usize = 7;

/// Level state plus press edges. An edge is latched on a not-down to down
/// transition and survives until `clear_edges`, so a tap shorter than one
/// tick is still seen by the next tick.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn set_pressed(&mut self, action: InputAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn just_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::ToggleDebug => 4,
            InputAction::Restart => 5,
            InputAction::Quit => 6,
        }
    }
}
