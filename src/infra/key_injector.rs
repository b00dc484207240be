use tracing::debug;

use crate::agent::{ActionState, ControlKey};

use super::game_api::KeyInjector;

/// Key injector that tracks press/release transitions and logs them.
///
/// Stands in for the platform keyboard driver, which lives outside this
/// crate.
#[derive(Debug, Default)]
pub struct LoggingKeyInjector {
    held: ActionState,
    transitions: u64,
}

impl LoggingKeyInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> &ActionState {
        &self.held
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    fn transition(&mut self, key: ControlKey, pressed: bool) {
        if self.held.is_pressed(key) == pressed {
            return;
        }
        self.held.set(key, pressed);
        self.transitions += 1;
        debug!(
            "key {} {}",
            key.as_char(),
            if pressed { "down" } else { "up" }
        );
    }
}

impl KeyInjector for LoggingKeyInjector {
    fn apply_key_state(&mut self, keys: &ActionState) {
        for (key, pressed) in keys.iter() {
            self.transition(key, pressed);
        }
    }

    fn reset_key_state(&mut self) {
        for key in ControlKey::ALL {
            self.transition(key, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_changes_count_as_transitions() {
        let mut injector = LoggingKeyInjector::new();
        let keys = ActionState::from_pressed(&[ControlKey::W, ControlKey::P]);

        injector.apply_key_state(&keys);
        assert_eq!(injector.transitions(), 2);
        injector.apply_key_state(&keys);
        assert_eq!(injector.transitions(), 2);
        assert_eq!(injector.held(), &keys);
    }

    #[test]
    fn test_reset_releases_everything() {
        let mut injector = LoggingKeyInjector::new();
        injector.apply_key_state(&ActionState::from_pressed(&[ControlKey::A, ControlKey::K]));
        injector.reset_key_state();
        assert!(!injector.held().any_pressed());
        assert_eq!(injector.transitions(), 4);
    }
}
