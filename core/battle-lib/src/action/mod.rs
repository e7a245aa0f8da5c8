//! action/mod.rs：
//! - 作為 action 子模組的入口，統一 re-export movement、skill、item、algo 等子模組。
//! - 不放具體邏輯或資料結構實作。
mod algo;
mod item;
mod movement;
mod skill;

pub use algo::*;
pub use movement::*;
pub use skill::*;
