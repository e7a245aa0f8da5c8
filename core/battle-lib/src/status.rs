//! status.rs：
//! - 狀態效果實例（StatusEffect）的新增、倒數與屬性重算。
//! - 只修改單位本身；陣亡判定由 Battle 在每次狀態變動後呼叫 outcome 處理。
use crate::*;
use serde::{Deserialize, Serialize};
use skills_lib::*;
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

/// 單位身上的狀態實例，由模板複製而來，同 id 不合併
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusEffect {
    pub id: StatusID,
    pub name: String,
    pub polarity: Polarity,
    pub modifiers: Vec<StatModifier>,
    pub flags: BTreeSet<StatusFlag>,
    pub remaining: u32,
    pub source: Option<UnitID>,
}

impl StatusEffect {
    pub fn from_template(template: &StatusTemplate, source: Option<UnitID>) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            polarity: template.polarity,
            modifiers: template.modifiers.clone(),
            flags: template.flags.clone(),
            remaining: template.duration,
            source,
        }
    }
}

/// 由基礎屬性與狀態列表計算有效屬性
/// - 同一屬性的修正值先加總（buff 為正、debuff 為負），再乘上基礎值四捨五入
/// - 結果最低為 0；flags 不參與計算
pub fn effective_stats(base: &StatBlock, statuses: &[StatusEffect]) -> StatBlock {
    let mut result = *base;
    for stat in Stat::iter() {
        let total: f64 = statuses
            .iter()
            .flat_map(|status| {
                let sign = status.polarity.sign() as f64;
                status
                    .modifiers
                    .iter()
                    .filter(move |m| m.stat == stat)
                    .map(move |m| sign * m.value as f64)
            })
            .sum();
        let base_value = base.get(stat);
        let delta = (base_value as f64 * total).round() as i32;
        result.set(stat, (base_value + delta).max(0));
    }
    result
}

/// 重算有效屬性，hp / mp 夾到新的上限內
pub fn recompute_stats(unit: &mut Unit) {
    unit.stats = effective_stats(&unit.base, &unit.statuses);
    unit.hp = unit.hp.clamp(0, unit.stats.max_hp);
    unit.mp = unit.mp.clamp(0, unit.stats.max_mp);
}

pub fn add_status(unit: &mut Unit, template: &StatusTemplate, source: Option<UnitID>) {
    unit.statuses.push(StatusEffect::from_template(template, source));
    recompute_stats(unit);
}

/// 持有者回合結束時倒數，回傳到期移除的狀態 id
pub fn tick_statuses(unit: &mut Unit) -> Vec<StatusID> {
    let mut expired = Vec::new();
    unit.statuses.retain_mut(|status| {
        status.remaining = status.remaining.saturating_sub(1);
        if status.remaining == 0 {
            expired.push(status.id.clone());
            false
        } else {
            true
        }
    });
    recompute_stats(unit);
    expired
}

pub fn has_flag(unit: &Unit, flag: StatusFlag) -> bool {
    unit.statuses.iter().any(|status| status.flags.contains(&flag))
}

/// 消耗第一個帶有該旗標的狀態上的旗標，狀態本身保留到期滿
pub fn consume_flag(unit: &mut Unit, flag: StatusFlag) -> bool {
    match unit
        .statuses
        .iter_mut()
        .find(|status| status.flags.contains(&flag))
    {
        Some(status) => {
            status.flags.remove(&flag);
            true
        }
        None => false,
    }
}
