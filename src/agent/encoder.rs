//! Feature encoder - converts one character's state into a fixed-width vector

use crate::infra::{Axis, ConfigurationError, Rect, Side};
use crate::state::{Attack, CharacterState, StatusFlags};

/// Stock fraction, damage, shield, and four death-bound distances
pub const CONTINUOUS_FEATURES: usize = 7;
pub const BINARY_FEATURES: usize = StatusFlags::COUNT;
pub const ATTACK_FEATURES: usize = Attack::COUNT;
pub const CHARACTER_FEATURES: usize = CONTINUOUS_FEATURES + BINARY_FEATURES + ATTACK_FEATURES;

/// Largest f32 below 1; keeps the damage feature inside (-1, 1) where tanh
/// rounds to 1.0.
const DAMAGE_LIMIT: f32 = 1.0 - f32::EPSILON / 2.0;

/// Configuration for the feature encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Damage value that maps to tanh(1)
    pub damage_scale: f32,
    /// Shield power of a full shield
    pub shield_scale: f32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            damage_scale: 100.0,
            shield_scale: 100.0,
        }
    }
}

/// Encoded features of a single character.
///
/// Layout: `[continuous (7) | status flags (13) | attack one-hot (25)]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterFeatures {
    values: [f32; CHARACTER_FEATURES],
}

impl CharacterFeatures {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn continuous(&self) -> &[f32] {
        &self.values[..CONTINUOUS_FEATURES]
    }

    pub fn binary(&self) -> &[f32] {
        &self.values[CONTINUOUS_FEATURES..CONTINUOUS_FEATURES + BINARY_FEATURES]
    }

    pub fn attack_one_hot(&self) -> &[f32] {
        &self.values[CONTINUOUS_FEATURES + BINARY_FEATURES..]
    }

    pub fn stock_fraction(&self) -> f32 {
        self.values[0]
    }

    pub fn damage(&self) -> f32 {
        self.values[1]
    }
}

/// Feature encoder for a single character. Pure: no state between calls.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    config: EncoderConfig,
}

impl FeatureEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub const fn width() -> usize {
        CHARACTER_FEATURES
    }

    /// Encode `character`, normalizing stock by `max_stock` and distances by
    /// the death bounds.
    pub fn encode(
        &self,
        side: Side,
        character: &CharacterState,
        max_stock: u32,
        death_bounds: Rect,
    ) -> Result<CharacterFeatures, ConfigurationError> {
        if max_stock == 0 {
            return Err(ConfigurationError::UninitializedMaxStock(side));
        }
        let width = death_bounds.width();
        let height = death_bounds.height();
        if width == 0.0 {
            return Err(ConfigurationError::DegenerateBounds {
                bounds: "death",
                axis: Axis::Horizontal,
            });
        }
        if height == 0.0 {
            return Err(ConfigurationError::DegenerateBounds {
                bounds: "death",
                axis: Axis::Vertical,
            });
        }

        let mut values = [0.0; CHARACTER_FEATURES];

        // Continuous inputs
        let pos = character.pos;
        let continuous = [
            character.lives as f32 / max_stock as f32,
            Self::compress_damage(character.damage / self.config.damage_scale),
            character.shield_power / self.config.shield_scale,
            (pos.x - death_bounds.x0) / width,
            (death_bounds.x1 - pos.x) / width,
            (pos.y - death_bounds.y0) / height,
            (death_bounds.y1 - pos.y) / height,
        ];
        for (i, value) in continuous.into_iter().enumerate() {
            values[i] = if i == 1 {
                value
            } else {
                Self::clamp_unit(value)
            };
        }

        // Binary inputs
        for (i, flag) in character.status.as_array().into_iter().enumerate() {
            values[CONTINUOUS_FEATURES + i] = if flag { 1.0 } else { 0.0 };
        }

        // Attack one-hot
        if let Some(attack) = character.attack {
            values[CONTINUOUS_FEATURES + BINARY_FEATURES + attack.index()] = 1.0;
        }

        tracing::trace!(%side, ?continuous, "encoded character");

        Ok(CharacterFeatures { values })
    }

    fn compress_damage(value: f32) -> f32 {
        value.tanh().clamp(-DAMAGE_LIMIT, DAMAGE_LIMIT)
    }

    fn clamp_unit(value: f32) -> f32 {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Vec2;

    fn death_bounds() -> Rect {
        Rect::new(-100.0, -200.0, 900.0, 800.0)
    }

    fn character() -> CharacterState {
        CharacterState {
            lives: 3,
            damage: 0.0,
            shield_power: 100.0,
            pos: Vec2::new(400.0, 300.0),
            dim: Vec2::new(30.0, 50.0),
            ..Default::default()
        }
    }

    fn encode(character: &CharacterState, max_stock: u32) -> CharacterFeatures {
        FeatureEncoder::default()
            .encode(Side::Player, character, max_stock, death_bounds())
            .unwrap()
    }

    #[test]
    fn test_feature_width() {
        assert_eq!(FeatureEncoder::width(), 45);
        let features = encode(&character(), 3);
        assert_eq!(features.as_slice().len(), 45);
        assert_eq!(features.continuous().len(), 7);
        assert_eq!(features.binary().len(), 13);
        assert_eq!(features.attack_one_hot().len(), 25);
    }

    #[test]
    fn test_stock_fraction() {
        let mut character = character();
        character.lives = 2;
        let features = encode(&character, 4);
        assert!((features.stock_fraction() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_damage_is_tanh_compressed() {
        let mut character = character();
        character.damage = 100.0;
        let features = encode(&character, 3);
        assert!((features.damage() - 0.7616).abs() < 1e-4);

        for damage in [0.0, 35.0, 250.0, 900.0, 999.0, 1.0e6, -1.0e6] {
            character.damage = damage;
            let value = encode(&character, 3).damage();
            assert!(value > -1.0 && value < 1.0, "damage {damage} gave {value}");
        }
    }

    #[test]
    fn test_continuous_features_bounded() {
        let mut character = character();
        for (x, y, lives, shield) in [
            (-100.0, -200.0, 0, 0.0),
            (900.0, 800.0, 3, 100.0),
            (250.0, 10.0, 1, 42.0),
            (5000.0, -9000.0, 2, 140.0),
        ] {
            character.pos = Vec2::new(x, y);
            character.lives = lives;
            character.shield_power = shield;
            let features = encode(&character, 3);
            for (i, value) in features.continuous().iter().enumerate() {
                if i == 1 {
                    continue;
                }
                assert!((0.0..=1.0).contains(value), "feature {i} = {value}");
            }
        }
    }

    #[test]
    fn test_death_bound_distances() {
        let features = encode(&character(), 3);
        let continuous = features.continuous();
        // x = 400 inside [-100, 900], y = 300 inside [-200, 800]
        assert!((continuous[3] - 0.5).abs() < 1e-6);
        assert!((continuous[4] - 0.5).abs() < 1e-6);
        assert!((continuous[5] - 0.5).abs() < 1e-6);
        assert!((continuous[6] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_binary_features_follow_flag_order() {
        let mut character = character();
        character.status.on_ground = true;
        character.status.facing_right = true;
        let features = encode(&character, 3);
        let binary = features.binary();
        assert_eq!(binary[2], 1.0);
        assert_eq!(binary[12], 1.0);
        assert_eq!(binary.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_attack_one_hot_for_every_move() {
        let mut character = character();
        for attack in Attack::ALL {
            character.attack = Some(attack);
            let features = encode(&character, 3);
            let one_hot = features.attack_one_hot();
            assert_eq!(one_hot.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(one_hot.iter().filter(|&&v| v == 0.0).count(), Attack::COUNT - 1);
            assert_eq!(one_hot[attack.index()], 1.0);
        }
    }

    #[test]
    fn test_no_attack_is_all_zero() {
        let features = encode(&character(), 3);
        assert!(features.attack_one_hot().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_max_stock_is_configuration_error() {
        let result = FeatureEncoder::default().encode(
            Side::Opponent,
            &character(),
            0,
            death_bounds(),
        );
        assert_eq!(
            result,
            Err(ConfigurationError::UninitializedMaxStock(Side::Opponent))
        );
    }

    #[test]
    fn test_degenerate_death_bounds() {
        let encoder = FeatureEncoder::default();
        let flat = Rect::new(0.0, 10.0, 500.0, 10.0);
        assert_eq!(
            encoder.encode(Side::Player, &character(), 3, flat),
            Err(ConfigurationError::DegenerateBounds {
                bounds: "death",
                axis: Axis::Vertical
            })
        );
        let thin = Rect::new(5.0, 0.0, 5.0, 500.0);
        assert_eq!(
            encoder.encode(Side::Player, &character(), 3, thin),
            Err(ConfigurationError::DegenerateBounds {
                bounds: "death",
                axis: Axis::Horizontal
            })
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut character = character();
        character.attack = Some(Attack::ThrowUp);
        character.damage = 87.0;
        assert_eq!(encode(&character, 3), encode(&character, 3));
    }
}
