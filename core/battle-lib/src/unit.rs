//! unit.rs：
//! - 定義單位（Unit）、單位模板（UnitTemplate）、屬性（StatBlock）與行動點數（ActionPoints）。
//! - 只負責資料與單位本身的衍生值（先攻、剩餘行動），不含戰鬥流程與傷害判定。
use crate::*;
use serde::{Deserialize, Serialize};
use skills_lib::*;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter};

/// 數值屬性，damage_reduction 與 damage_received 為百分比整數
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StatBlock {
    pub max_hp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub stealth: i32,
    pub damage_reduction: i32,
    pub damage_received: i32,
}

impl StatBlock {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::MaxHp => self.max_hp,
            Stat::MaxMp => self.max_mp,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Speed => self.speed,
            Stat::Stealth => self.stealth,
            Stat::DamageReduction => self.damage_reduction,
            Stat::DamageReceived => self.damage_received,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        let field = match stat {
            Stat::MaxHp => &mut self.max_hp,
            Stat::MaxMp => &mut self.max_mp,
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
            Stat::Speed => &mut self.speed,
            Stat::Stealth => &mut self.stealth,
            Stat::DamageReduction => &mut self.damage_reduction,
            Stat::DamageReceived => &mut self.damage_received,
        };
        *field = value;
    }
}

#[derive(Debug, Clone, Copy, Display, EnumIter, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Movement,
    Skill,
    Item,
}

/// 每回合的行動點數，回合開始時重設為上限
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ActionPoints {
    pub movement: MovementCost,
    pub skill: u32,
    pub item: u32,
}

impl Default for ActionPoints {
    fn default() -> Self {
        Self {
            movement: 2,
            skill: 1,
            item: 1,
        }
    }
}

impl ActionPoints {
    pub fn zero() -> Self {
        Self {
            movement: 0,
            skill: 0,
            item: 0,
        }
    }

    pub fn has(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Movement => self.movement > 0,
            ActionKind::Skill => self.skill > 0,
            ActionKind::Item => self.item > 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UnitTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: StatBlock,
    /// 依施放優先順序排列，AI 取第一個可用技能
    #[serde(default)]
    pub skills: Vec<SkillID>,
    #[serde(default)]
    pub items: BTreeMap<ItemID, u32>,
    #[serde(default)]
    pub action_points: ActionPoints,
}

/// 地圖上的出生點
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UnitMarker {
    pub template: UnitTemplateType,
    pub pos: Pos,
}

/// 單位持有的技能與其剩餘冷卻
#[derive(Debug, Clone)]
pub struct SkillSlot {
    pub id: SkillID,
    pub skill: Skill,
    pub current_cooldown: u32,
}

impl SkillSlot {
    pub fn is_ready(&self) -> bool {
        self.current_cooldown == 0
    }
}

#[derive(Debug, Clone)]
pub struct ItemStack {
    pub id: ItemID,
    pub item: Item,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitID,
    pub name: String,
    pub unit_template_type: UnitTemplateType,
    pub side: Side,
    pub controller: Controller,
    pub pos: Pos,
    pub base: StatBlock,
    /// 套用狀態後的屬性，只由 status 模組重算
    pub stats: StatBlock,
    pub hp: i32,
    pub mp: i32,
    pub skills: Vec<SkillSlot>,
    pub statuses: Vec<StatusEffect>,
    pub items: Vec<ItemStack>,
    pub action_points: ActionPoints,
    pub max_action_points: ActionPoints,
}

impl Unit {
    #[allow(clippy::too_many_arguments)]
    pub fn from_template(
        id: UnitID,
        template_type: &UnitTemplateType,
        template: &UnitTemplate,
        side: Side,
        controller: Controller,
        pos: Pos,
        skills: &BTreeMap<SkillID, Skill>,
        items: &BTreeMap<ItemID, Item>,
    ) -> Result<Self, Error> {
        let func = "Unit::from_template";

        let slots = template
            .skills
            .iter()
            .map(|skill_id| {
                skills
                    .get(skill_id)
                    .map(|skill| SkillSlot {
                        id: skill_id.clone(),
                        skill: skill.clone(),
                        current_cooldown: 0,
                    })
                    .ok_or_else(|| Error::SkillNotFound {
                        func,
                        skill_id: skill_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let stacks = template
            .items
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(item_id, count)| {
                items
                    .get(item_id)
                    .map(|item| ItemStack {
                        id: item_id.clone(),
                        item: item.clone(),
                        count: *count,
                    })
                    .ok_or_else(|| Error::ItemNotFound {
                        func,
                        item_id: item_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = if template.name.is_empty() {
            template_type.clone()
        } else {
            template.name.clone()
        };
        Ok(Unit {
            id,
            name,
            unit_template_type: template_type.clone(),
            side,
            controller,
            pos,
            base: template.stats,
            stats: template.stats,
            hp: template.stats.max_hp,
            mp: template.stats.max_mp,
            skills: slots,
            statuses: Vec::new(),
            items: stacks,
            action_points: ActionPoints::zero(),
            max_action_points: template.action_points,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn skill_slot(&self, skill_id: &str) -> Option<&SkillSlot> {
        self.skills.iter().find(|slot| slot.id == skill_id)
    }

    pub fn skill_slot_mut(&mut self, skill_id: &str) -> Option<&mut SkillSlot> {
        self.skills.iter_mut().find(|slot| slot.id == skill_id)
    }

    pub fn has_items(&self) -> bool {
        self.items.iter().any(|stack| stack.count > 0)
    }

    /// 道具點數只在身上還有道具時才算剩餘行動
    pub fn has_remaining_actions(&self) -> bool {
        let ap = &self.action_points;
        ap.has(ActionKind::Movement)
            || ap.has(ActionKind::Skill)
            || (ap.has(ActionKind::Item) && self.has_items())
    }

    pub fn reset_action_points(&mut self) {
        self.action_points = self.max_action_points;
    }

    /// 每回合結束時冷卻減一，最低為 0
    pub fn tick_cooldowns(&mut self) {
        for slot in &mut self.skills {
            slot.current_cooldown = slot.current_cooldown.saturating_sub(1);
        }
    }
}

/// 計算單位的先攻值
/// - 有效速度加上 0..=jitter 的隨機值
pub fn calc_initiative(rng: &mut impl rand::Rng, speed: i32, jitter: u32) -> i32 {
    let roll = rng.random_range(0..=jitter);
    speed + roll as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use strum::IntoEnumIterator;

    fn strike() -> Skill {
        Skill {
            name: "strike".to_string(),
            range: 1,
            effects: vec![Effect::Damage {
                target_type: TargetType::Enemy,
                multiplier: 1.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_unit_template() {
        let data = include_str!("../tests/unit_template.toml");
        let template: UnitTemplate = toml::from_str(data).unwrap();
        assert_eq!(template.name, "暗影刺客");
        assert_eq!(template.stats.attack, 16);
        assert_eq!(template.stats.defense, 3);
        assert_eq!(template.stats.speed, 7);
        // 未填欄位使用預設
        assert_eq!(template.stats.damage_reduction, 0);
        assert_eq!(template.skills, vec!["strike".to_string()]);
        assert_eq!(template.items.get("potion"), Some(&2));
        assert_eq!(template.action_points, ActionPoints::default());
    }

    #[test]
    fn test_unit_from_template() {
        let template = UnitTemplate {
            name: String::new(),
            stats: StatBlock {
                max_hp: 80,
                max_mp: 40,
                attack: 12,
                ..Default::default()
            },
            skills: vec!["strike".to_string()],
            items: BTreeMap::from([("potion".to_string(), 1), ("empty".to_string(), 0)]),
            action_points: ActionPoints::default(),
        };
        let skills = BTreeMap::from([("strike".to_string(), strike())]);
        let items = BTreeMap::from([("potion".to_string(), Item::default())]);
        let unit = Unit::from_template(
            3,
            &"knight".to_string(),
            &template,
            Side::Ally,
            Controller::Ai,
            Pos { x: 1, y: 2 },
            &skills,
            &items,
        )
        .unwrap();
        assert_eq!(unit.id, 3);
        assert_eq!(unit.name, "knight");
        assert_eq!(unit.hp, 80);
        assert_eq!(unit.mp, 40);
        assert_eq!(unit.stats, unit.base);
        assert_eq!(unit.skills.len(), 1);
        assert!(unit.skills[0].is_ready());
        // 數量 0 的道具不放進背包
        assert_eq!(unit.items.len(), 1);
        assert_eq!(unit.action_points, ActionPoints::zero());
        assert!(unit.is_alive());
    }

    #[test]
    fn test_unit_from_template_not_found() {
        let template = UnitTemplate {
            skills: vec!["not_exist_skill".to_string()],
            ..Default::default()
        };
        let result = Unit::from_template(
            1,
            &"knight".to_string(),
            &template,
            Side::Ally,
            Controller::Player,
            Pos::default(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        match result {
            Err(Error::SkillNotFound { skill_id, .. }) => assert_eq!(skill_id, "not_exist_skill"),
            _ => panic!("Should return Error::SkillNotFound"),
        }

        let template = UnitTemplate {
            items: BTreeMap::from([("elixir".to_string(), 1)]),
            ..Default::default()
        };
        let result = Unit::from_template(
            1,
            &"knight".to_string(),
            &template,
            Side::Ally,
            Controller::Player,
            Pos::default(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        assert!(matches!(result, Err(Error::ItemNotFound { .. })));
    }

    #[test]
    fn test_stat_block_get_set() {
        let mut block = StatBlock::default();
        for (i, stat) in Stat::iter().enumerate() {
            block.set(stat, i as i32 + 1);
        }
        for (i, stat) in Stat::iter().enumerate() {
            assert_eq!(block.get(stat), i as i32 + 1, "{stat}");
        }
    }

    #[test]
    fn test_has_remaining_actions() {
        let template = UnitTemplate {
            stats: StatBlock {
                max_hp: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut unit = Unit::from_template(
            1,
            &"dummy".to_string(),
            &template,
            Side::Ally,
            Controller::Player,
            Pos::default(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        )
        .unwrap();
        assert!(!unit.has_remaining_actions());
        unit.reset_action_points();
        assert!(unit.has_remaining_actions());
        unit.action_points.movement = 0;
        unit.action_points.skill = 0;
        // 沒有道具時，道具點數不算
        assert!(!unit.has_remaining_actions());
        unit.items.push(ItemStack {
            id: "potion".to_string(),
            item: Item::default(),
            count: 1,
        });
        assert!(unit.has_remaining_actions());
    }

    #[test]
    fn test_tick_cooldowns() {
        let mut slot = SkillSlot {
            id: "strike".to_string(),
            skill: strike(),
            current_cooldown: 1,
        };
        let template = UnitTemplate::default();
        let mut unit = Unit::from_template(
            1,
            &"dummy".to_string(),
            &template,
            Side::Ally,
            Controller::Player,
            Pos::default(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        )
        .unwrap();
        slot.current_cooldown = 1;
        unit.skills.push(slot);
        unit.tick_cooldowns();
        assert_eq!(unit.skills[0].current_cooldown, 0);
        unit.tick_cooldowns();
        assert_eq!(unit.skills[0].current_cooldown, 0);
    }

    #[test]
    fn test_calc_initiative() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let result = calc_initiative(&mut rng, 10, 5);
            assert!((10..=15).contains(&result), "{result}");
        }
        assert_eq!(calc_initiative(&mut rng, 8, 0), 8);
    }
}
