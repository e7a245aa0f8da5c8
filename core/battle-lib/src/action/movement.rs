//! movement.rs：
//! - 負責單位移動相關邏輯（可達範圍、移動點數消耗）。
//! - 僅處理移動本身，不負責戰鬥判定、AI 決策或棋盤初始化。
use crate::*;
use std::collections::BTreeSet;
use tracing::debug;

/// 提供移動邏輯用的棋盤視圖，實作 PathfindingBoard 供路徑搜尋演算法使用
struct MovableBoardView<'a> {
    board: &'a Board,
}

impl PathfindingBoard for MovableBoardView<'_> {
    fn is_valid(&self, pos: Pos) -> bool {
        self.board.get_tile(pos).is_some()
    }

    /// 地形可通行且沒有存活單位（友軍同樣阻擋）
    fn is_passable(&self, pos: Pos) -> bool {
        self.board.is_walkable(pos) && !self.board.is_occupied(pos)
    }

    fn get_neighbors(&self, pos: Pos) -> Vec<Pos> {
        orthogonal_neighbors(pos)
    }
}

/// 依發現順序回傳可達座標與步數，不含起點
pub fn reachable_in_order(
    board: &Board,
    origin: Pos,
    budget: MovementCost,
) -> Vec<(Pos, MovementCost)> {
    bfs(&MovableBoardView { board }, origin, budget)
}

/// 計算 budget 步內可到達的座標，不含起點
pub fn reachable(board: &Board, origin: Pos, budget: MovementCost) -> BTreeSet<Pos> {
    reachable_in_order(board, origin, budget)
        .into_iter()
        .map(|(pos, _)| pos)
        .collect()
}

impl Battle {
    /// 移動行動單位，依實際步數扣除移動點數
    pub fn move_unit(&mut self, unit_id: UnitID, to: Pos) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::move_unit";

        let unit = self.ensure_actor(func, unit_id)?;
        let from = unit.pos;
        let budget = unit.action_points.movement;
        if !unit.action_points.has(ActionKind::Movement) {
            return Err(Error::NotEnoughAP {
                func,
                kind: ActionKind::Movement,
            });
        }
        if self.board.get_tile(to).is_none() {
            return Err(Error::NoTileAtPos { func, pos: to });
        }
        if self.board.is_occupied(to) {
            return Err(Error::PosOccupied { func, pos: to });
        }
        let Some((_, steps)) = reachable_in_order(&self.board, from, budget)
            .into_iter()
            .find(|(pos, _)| *pos == to)
        else {
            return Err(Error::NotReachable { func, pos: to });
        };

        self.board.relocate(unit_id, to).map_err(|e| Error::Wrap {
            func,
            source: Box::new(e),
        })?;
        if let Some(unit) = self.board.units.get_mut(&unit_id) {
            unit.action_points.movement -= steps;
        }
        debug!(unit_id, ?from, ?to, steps, "unit moved");
        let start = self.events.len();
        self.emit(BattleEvent::Moved {
            unit_id,
            from,
            to,
            steps,
        });
        Ok(self.events[start..].to_vec())
    }
}
