//! outcome.rs：
//! - 陣亡處理與勝負判定，由任何使血量歸零的修改呼叫。
//! - 陣亡只處理一次；勝負只宣告一次。
use crate::*;
use serde::Serialize;
use strum_macros::Display;
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// 獲勝的陣營
    Victory(Side),
    /// 雙方同時全滅，或先攻表已空
    Stalemate,
}

impl Battle {
    /// 血量歸零時觸發陣亡處理，回傳是否為本次新陣亡
    pub(crate) fn check_death(&mut self, unit_id: UnitID) -> bool {
        let dying = self
            .board
            .units
            .get(&unit_id)
            .is_some_and(|unit| !unit.is_alive());
        if dying && !self.dead.contains(&unit_id) {
            self.on_unit_died(unit_id);
            true
        } else {
            false
        }
    }

    /// 陣亡處理：登記、清除佔位與選取、移出先攻表，最後檢查該陣營是否全滅
    pub fn on_unit_died(&mut self, unit_id: UnitID) {
        let Some(side) = self.board.units.get(&unit_id).map(|unit| unit.side) else {
            return;
        };
        if !self.dead.insert(unit_id) {
            return;
        }
        if let Some(unit) = self.board.units.get_mut(&unit_id) {
            unit.hp = 0;
            unit.action_points = ActionPoints::zero();
        }
        self.board.unit_map.remove(unit_id);
        self.selection.deselect(unit_id);
        self.remove_from_turn_order(unit_id);
        info!(unit_id, %side, "unit died");
        self.emit(BattleEvent::UnitDied { unit_id });

        if self.board.living_count(side) == 0 {
            let outcome = if self.board.living_count(side.opposite()) == 0 {
                Outcome::Stalemate
            } else {
                Outcome::Victory(side.opposite())
            };
            self.declare_outcome(outcome);
        }
    }

    pub(crate) fn declare_outcome(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            return;
        }
        info!(%outcome, turn = self.turn, "battle finished");
        self.outcome = Some(outcome);
        self.emit(BattleEvent::Outcome(outcome));
    }
}
