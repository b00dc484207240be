//! Action space - maps predictor outputs onto the game's control keys

/// Default activation threshold for pressing a key
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Keyboard keys the game is bound to, in predictor output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    W,
    A,
    S,
    D,
    E,
    F,
    P,
    O,
    I,
    L,
    K,
}

impl ControlKey {
    pub const COUNT: usize = 11;

    pub const ALL: [ControlKey; ControlKey::COUNT] = [
        ControlKey::W,
        ControlKey::A,
        ControlKey::S,
        ControlKey::D,
        ControlKey::E,
        ControlKey::F,
        ControlKey::P,
        ControlKey::O,
        ControlKey::I,
        ControlKey::L,
        ControlKey::K,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        match self {
            ControlKey::W => 'w',
            ControlKey::A => 'a',
            ControlKey::S => 's',
            ControlKey::D => 'd',
            ControlKey::E => 'e',
            ControlKey::F => 'f',
            ControlKey::P => 'p',
            ControlKey::O => 'o',
            ControlKey::I => 'i',
            ControlKey::L => 'l',
            ControlKey::K => 'k',
        }
    }
}

/// Pressed/released state of every control key for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionState {
    pressed: [bool; ControlKey::COUNT],
}

impl ActionState {
    pub fn released() -> Self {
        Self::default()
    }

    pub fn from_pressed(keys: &[ControlKey]) -> Self {
        let mut state = Self::released();
        for key in keys {
            state.set(*key, true);
        }
        state
    }

    pub fn is_pressed(&self, key: ControlKey) -> bool {
        self.pressed[key.index()]
    }

    pub fn set(&mut self, key: ControlKey, pressed: bool) {
        self.pressed[key.index()] = pressed;
    }

    pub fn any_pressed(&self) -> bool {
        self.pressed.iter().any(|&p| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlKey, bool)> + '_ {
        ControlKey::ALL.iter().map(|&key| (key, self.is_pressed(key)))
    }

    pub fn pressed_keys(&self) -> Vec<ControlKey> {
        self.iter()
            .filter(|(_, pressed)| *pressed)
            .map(|(key, _)| key)
            .collect()
    }

    /// Compact form for logs, e.g. `"wd"` or `"-"`.
    pub fn describe(&self) -> String {
        let keys: String = self.pressed_keys().into_iter().map(ControlKey::as_char).collect();
        if keys.is_empty() {
            "-".to_string()
        } else {
            keys
        }
    }
}

/// Thresholds the predictor output into an `ActionState`.
#[derive(Debug, Clone, Copy)]
pub struct ActionMapper {
    threshold: f32,
}

impl Default for ActionMapper {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ActionMapper {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub const fn output_width() -> usize {
        ControlKey::COUNT
    }

    /// A key is pressed iff its output strictly exceeds the threshold.
    pub fn map(&self, output: &[f32]) -> ActionState {
        map_to_actions(output, self.threshold)
    }
}

pub fn map_to_actions(output: &[f32], threshold: f32) -> ActionState {
    let mut state = ActionState::released();
    for key in ControlKey::ALL {
        let value = output.get(key.index()).copied().unwrap_or(0.0);
        state.set(key, value > threshold);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let output = [0.6, 0.4, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let state = map_to_actions(&output, 0.5);
        assert!(state.is_pressed(ControlKey::W));
        assert!(!state.is_pressed(ControlKey::A));
        assert!(!state.is_pressed(ControlKey::S));
    }

    #[test]
    fn test_every_key_follows_its_output() {
        let mapper = ActionMapper::default();
        for key in ControlKey::ALL {
            let mut output = [0.2; ControlKey::COUNT];
            output[key.index()] = 0.9;
            let state = mapper.map(&output);
            assert_eq!(state.pressed_keys(), vec![key]);
        }
    }

    #[test]
    fn test_all_released_at_threshold() {
        let state = ActionMapper::new(0.5).map(&[0.5; ControlKey::COUNT]);
        assert_eq!(state, ActionState::released());
        assert!(!state.any_pressed());
    }

    #[test]
    fn test_custom_threshold() {
        let output = [0.75, 0.85, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.81];
        let state = ActionMapper::new(0.8).map(&output);
        assert_eq!(state.pressed_keys(), vec![ControlKey::A, ControlKey::K]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(ActionState::released().describe(), "-");
        let state = ActionState::from_pressed(&[ControlKey::D, ControlKey::W]);
        assert_eq!(state.describe(), "wd");
    }
}
