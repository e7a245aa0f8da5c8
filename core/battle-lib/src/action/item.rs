//! item.rs：
//! - 消耗品使用，效果固定作用於使用者自己，消耗道具點數與一個道具。
use crate::*;
use tracing::debug;

impl Battle {
    pub fn apply_item(
        &mut self,
        unit_id: UnitID,
        item_id: &str,
    ) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::apply_item";

        let unit = self.ensure_actor(func, unit_id)?;
        let Some(stack) = unit
            .items
            .iter()
            .find(|stack| stack.id == item_id && stack.count > 0)
        else {
            return Err(Error::ItemNotFound {
                func,
                item_id: item_id.to_string(),
            });
        };
        if !unit.action_points.has(ActionKind::Item) {
            return Err(Error::NotEnoughAP {
                func,
                kind: ActionKind::Item,
            });
        }
        let effects = stack.item.effects.clone();

        debug!(unit_id, item_id, "use item");
        let start = self.events.len();
        self.emit(BattleEvent::ItemUsed {
            unit_id,
            item_id: item_id.to_string(),
        });
        let resolved = ResolvedTarget::Unit(unit_id);
        for effect in &effects {
            self.apply_effect(unit_id, effect, &resolved);
        }
        if let Some(unit) = self.board.units.get_mut(&unit_id) {
            if let Some(stack) = unit.items.iter_mut().find(|stack| stack.id == item_id) {
                stack.count -= 1;
            }
            unit.items.retain(|stack| stack.count > 0);
            unit.action_points.item = unit.action_points.item.saturating_sub(1);
        }
        Ok(self.events[start..].to_vec())
    }
}
