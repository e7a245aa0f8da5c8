//! selection.rs：
//! - 玩家操作介面的讀取模型（選取單位、選取技能、可移動格、可施放格）與對應操作。
//! - 每個操作成功後檢查行動單位是否該自動結束回合。
use crate::*;
use skills_lib::*;
use std::collections::BTreeSet;

/// 技能選擇資料結構
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_unit: Option<UnitID>,
    pub selected_skill: Option<SkillID>,
    /// 選取單位的可移動格
    pub highlighted: BTreeSet<Pos>,
    /// 選取技能的可指定格
    pub selectable: BTreeSet<Pos>,
}

impl Selection {
    pub fn clear(&mut self) {
        *self = Selection::default();
    }

    pub fn deselect(&mut self, unit_id: UnitID) {
        if self.selected_unit == Some(unit_id) {
            self.clear();
        }
    }
}

impl Battle {
    /// 選取行動中的玩家單位
    pub fn select_unit(&mut self, unit_id: UnitID) -> Result<(), Error> {
        let func = "Battle::select_unit";

        let unit = self.ensure_actor(func, unit_id)?;
        if unit.controller != Controller::Player {
            return Err(Error::NotPlayerControlled { func, unit_id });
        }
        let highlighted = reachable(&self.board, unit.pos, unit.action_points.movement);
        self.selection = Selection {
            selected_unit: Some(unit_id),
            selected_skill: None,
            highlighted,
            selectable: BTreeSet::new(),
        };
        Ok(())
    }

    /// 設定目前選擇的技能，None 代表取消
    pub fn select_skill(&mut self, skill_id: Option<SkillID>) -> Result<(), Error> {
        let func = "Battle::select_skill";

        let Some(skill_id) = skill_id else {
            self.selection.selected_skill = None;
            self.selection.selectable.clear();
            return Ok(());
        };
        let unit_id = self.selected_unit(func)?;
        let unit = self.ensure_actor(func, unit_id)?;
        let slot = unit
            .skill_slot(&skill_id)
            .ok_or_else(|| Error::SkillNotFound {
                func,
                skill_id: skill_id.clone(),
            })?;
        let selectable = skill_casting_area(&self.board, unit, &slot.skill)
            .into_iter()
            .collect();
        self.selection.selected_skill = Some(skill_id);
        self.selection.selectable = selectable;
        Ok(())
    }

    pub fn move_to(&mut self, pos: Pos) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::move_to";

        let unit_id = self.selected_unit(func)?;
        let events = self.move_unit(unit_id, pos).map_err(|e| Error::Wrap {
            func,
            source: Box::new(e),
        })?;
        self.refresh_selection(unit_id);
        self.settle();
        Ok(events)
    }

    /// 對選取的技能施放，成功後清除技能選取
    pub fn cast_at(&mut self, target: Option<Pos>) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::cast_at";

        let unit_id = self.selected_unit(func)?;
        let skill_id = self
            .selection
            .selected_skill
            .clone()
            .ok_or(Error::NoSkillSelected { func })?;
        let events = self
            .cast_skill(unit_id, &skill_id, target)
            .map_err(|e| Error::Wrap {
                func,
                source: Box::new(e),
            })?;
        self.selection.selected_skill = None;
        self.selection.selectable.clear();
        self.refresh_selection(unit_id);
        self.settle();
        Ok(events)
    }

    pub fn use_item(&mut self, item_id: &str) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::use_item";

        let unit_id = self.selected_unit(func)?;
        let events = self.apply_item(unit_id, item_id).map_err(|e| Error::Wrap {
            func,
            source: Box::new(e),
        })?;
        self.refresh_selection(unit_id);
        self.settle();
        Ok(events)
    }

    fn selected_unit(&self, func: &'static str) -> Result<UnitID, Error> {
        self.selection
            .selected_unit
            .ok_or(Error::NoUnitSelected { func })
    }

    /// 行動後重算可移動格，單位已陣亡則清除選取
    fn refresh_selection(&mut self, unit_id: UnitID) {
        match self.board.units.get(&unit_id).filter(|unit| unit.is_alive()) {
            Some(unit) => {
                self.selection.highlighted =
                    reachable(&self.board, unit.pos, unit.action_points.movement);
            }
            None => self.selection.deselect(unit_id),
        }
    }
}
