use serde::{Deserialize, Deserializer, Serialize};

use crate::infra::{Rect, Side, TransientStateError, Vec2};

/// Named moves a character can be performing.
///
/// The declaration order is the order of the one-hot slots in the feature
/// vector, so it must never be reshuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Attack {
    NeutralA,
    DownA,
    SideA,
    DashA,
    UpA,
    DownSmash,
    SideSmash,
    UpSmash,
    NeutralAir,
    ForwardAir,
    BackAir,
    UpAir,
    DownAir,
    NeutralB,
    DownB,
    SideB,
    UpB,
    NeutralBAir,
    UpBAir,
    SideBAir,
    DownBAir,
    ThrowDown,
    ThrowForward,
    ThrowBack,
    ThrowUp,
}

impl Attack {
    pub const COUNT: usize = 25;

    pub const ALL: [Attack; Attack::COUNT] = [
        Attack::NeutralA,
        Attack::DownA,
        Attack::SideA,
        Attack::DashA,
        Attack::UpA,
        Attack::DownSmash,
        Attack::SideSmash,
        Attack::UpSmash,
        Attack::NeutralAir,
        Attack::ForwardAir,
        Attack::BackAir,
        Attack::UpAir,
        Attack::DownAir,
        Attack::NeutralB,
        Attack::DownB,
        Attack::SideB,
        Attack::UpB,
        Attack::NeutralBAir,
        Attack::UpBAir,
        Attack::SideBAir,
        Attack::DownBAir,
        Attack::ThrowDown,
        Attack::ThrowForward,
        Attack::ThrowBack,
        Attack::ThrowUp,
    ];

    /// Slot of this move in the one-hot encoding.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name the game API reports for this move.
    pub fn game_name(self) -> &'static str {
        match self {
            Attack::NeutralA => "a",
            Attack::DownA => "crouch_attack",
            Attack::SideA => "a_forward_tilt",
            Attack::DashA => "a_forward",
            Attack::UpA => "a_up_tilt",
            Attack::DownSmash => "a_down",
            Attack::SideSmash => "a_forwardsmash",
            Attack::UpSmash => "a_up",
            Attack::NeutralAir => "a_air",
            Attack::ForwardAir => "a_air_forward",
            Attack::BackAir => "a_air_backward",
            Attack::UpAir => "a_air_up",
            Attack::DownAir => "a_air_down",
            Attack::NeutralB => "b",
            Attack::DownB => "b_down",
            Attack::SideB => "b_forward",
            Attack::UpB => "b_up",
            Attack::NeutralBAir => "b_air",
            Attack::UpBAir => "b_up_air",
            Attack::SideBAir => "b_forward_air",
            Attack::DownBAir => "b_down_air",
            Attack::ThrowDown => "throw_down",
            Attack::ThrowForward => "throw_forward",
            Attack::ThrowBack => "throw_back",
            Attack::ThrowUp => "throw_up",
        }
    }

    /// Unknown names are not an error, they simply mean "no attack".
    pub fn from_game_name(name: &str) -> Option<Attack> {
        Attack::ALL.into_iter().find(|attack| attack.game_name() == name)
    }
}

fn deserialize_attack<'de, D>(deserializer: D) -> Result<Option<Attack>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(Attack::from_game_name))
}

/// Boolean status flags, in feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusFlags {
    pub shielding: bool,
    pub attacking: bool,
    pub on_ground: bool,
    pub crouching: bool,
    pub on_ledge: bool,
    pub grabbing: bool,
    pub dodging: bool,
    pub dizzy: bool,
    pub knocked_down: bool,
    pub invincible: bool,
    pub knocked_out: bool,
    pub dashing: bool,
    pub facing_right: bool,
}

impl StatusFlags {
    pub const COUNT: usize = 13;

    pub fn as_array(&self) -> [bool; StatusFlags::COUNT] {
        [
            self.shielding,
            self.attacking,
            self.on_ground,
            self.crouching,
            self.on_ledge,
            self.grabbing,
            self.dodging,
            self.dizzy,
            self.knocked_down,
            self.invincible,
            self.knocked_out,
            self.dashing,
            self.facing_right,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterState {
    pub lives: u32,
    pub damage: f32,
    pub shield_power: f32,
    pub pos: Vec2,
    pub dim: Vec2,
    #[serde(default)]
    pub status: StatusFlags,
    #[serde(default, deserialize_with = "deserialize_attack")]
    pub attack: Option<Attack>,
}

impl CharacterState {
    pub fn bounding_rect(&self) -> Rect {
        Rect::from_pos_dim(self.pos, self.dim)
    }

    /// Reject snapshots caught mid-update (NaN/inf fields, inverted boxes).
    pub fn validate(&self, side: Side) -> Result<(), TransientStateError> {
        if !self.damage.is_finite() {
            return Err(TransientStateError::NonFinite {
                side,
                field: "damage",
            });
        }
        if !self.shield_power.is_finite() {
            return Err(TransientStateError::NonFinite {
                side,
                field: "shield power",
            });
        }
        if !self.pos.is_finite() {
            return Err(TransientStateError::NonFinite {
                side,
                field: "position",
            });
        }
        if !self.dim.is_finite() {
            return Err(TransientStateError::NonFinite {
                side,
                field: "dimensions",
            });
        }
        if self.dim.x < 0.0 || self.dim.y < 0.0 {
            return Err(TransientStateError::NegativeDimensions(side));
        }
        Ok(())
    }
}
