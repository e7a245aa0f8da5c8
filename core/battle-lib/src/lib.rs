use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

mod action;
mod ai;
mod battle;
mod board;
mod catalog;
mod config;
mod error;
mod outcome;
mod selection;
mod status;
mod unit;

pub use action::*;
pub use ai::*;
pub use battle::*;
pub use board::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use outcome::*;
pub use selection::*;
pub use status::*;
pub use unit::*;

pub type MapID = String;
pub type UnitID = u64;
pub type UnitTemplateType = String;
pub type MovementCost = usize;
pub type TurnNumber = u32;

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn manhattan(self, other: Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// 陣營，只支援雙方對戰
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Ally,
    Opponent,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Ally => Side::Opponent,
            Side::Opponent => Side::Ally,
        }
    }
}

/// 單位由誰操作
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Controller {
    #[default]
    Player,
    Ai,
}
