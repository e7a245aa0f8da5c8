use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumIter, EnumString};

pub type SkillID = String;
pub type ItemID = String;
pub type StatusID = String;

/// 技能資料結構
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Skill {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: SkillKind,
    /// 魔力消耗
    #[serde(default)]
    pub cost: i32,
    /// 施放後的冷卻回合數
    #[serde(default)]
    pub cooldown: u32,
    /// 曼哈頓距離
    #[serde(default)]
    pub range: usize,
    #[serde(default)]
    pub shape: TargetShape,
    /// 僅 area 使用，以目標格為中心的曼哈頓半徑
    #[serde(default)]
    pub aoe_range: usize,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Default,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillKind {
    #[default]
    Active,
    Passive,
}

/// 技能瞄準形狀
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Default,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetShape {
    /// 目標格上的單一單位
    #[default]
    Single,
    /// 以目標格為中心、aoe_range 內的所有單位（不分敵我）
    Area,
    /// 施放者自己
    Caster,
    /// 純座標，不查詢單位
    Position,
}

/// 效果的套用對象，於效果內判斷，不在目標解析階段過濾
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Default,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetType {
    Caster,
    Ally,
    AllyExcludeCaster,
    Enemy,
    #[default]
    Any,
}

impl TargetType {
    /// 判斷此效果是否套用到目標單位
    pub fn admits(&self, is_caster: bool, same_side: bool) -> bool {
        match self {
            TargetType::Caster => is_caster,
            TargetType::Ally => same_side,
            TargetType::AllyExcludeCaster => same_side && !is_caster,
            TargetType::Enemy => !same_side,
            TargetType::Any => true,
        }
    }
}

/// 治療量的計算基準
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Default,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealBase {
    #[default]
    CasterAttack,
    TargetMaxHp,
}

#[derive(Debug, Deserialize, Serialize, Clone, Display, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
#[strum(serialize_all = "snake_case")]
pub enum Effect {
    Damage {
        #[serde(default)]
        target_type: TargetType,
        multiplier: f32,
    },
    Heal {
        #[serde(default)]
        target_type: TargetType,
        ratio: f32,
        #[serde(default)]
        base: HealBase,
    },
    Mana {
        #[serde(default)]
        target_type: TargetType,
        value: i32,
    },
    Status {
        #[serde(default)]
        target_type: TargetType,
        status: StatusTemplate,
    },
    /// 將施放者移動到目標格，僅用於 position 技能
    Teleport,
}

impl Effect {
    pub fn target_type(&self) -> &TargetType {
        match self {
            Effect::Damage { target_type, .. }
            | Effect::Heal { target_type, .. }
            | Effect::Mana { target_type, .. }
            | Effect::Status { target_type, .. } => target_type,
            Effect::Teleport => &TargetType::Caster,
        }
    }

    pub fn is_harmful(&self) -> bool {
        match self {
            Effect::Damage { .. } => true,
            Effect::Mana { value, .. } => *value < 0,
            Effect::Status { status, .. } => status.polarity == Polarity::Debuff,
            Effect::Heal { .. } | Effect::Teleport => false,
        }
    }
}

/// 可被狀態效果修正的數值屬性
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
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
pub enum Stat {
    MaxHp,
    MaxMp,
    Attack,
    Defense,
    Speed,
    Stealth,
    DamageReduction,
    DamageReceived,
}

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, EnumIter, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Polarity {
    Buff,
    Debuff,
}

impl Polarity {
    pub fn sign(&self) -> f32 {
        match self {
            Polarity::Buff => 1.0,
            Polarity::Debuff => -1.0,
        }
    }
}

/// 非數值效果，不參與屬性重算，由特定檢查點消耗
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusFlag {
    /// 抵擋下一次致命傷害，血量保留 1
    DeathPrevention,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct StatModifier {
    pub stat: Stat,
    /// 相對於基礎值的比例，例如 0.3 代表 30%
    pub value: f32,
}

/// 狀態效果模板，施放時複製成獨立實例
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusTemplate {
    pub id: StatusID,
    #[serde(default)]
    pub name: String,
    pub polarity: Polarity,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub flags: BTreeSet<StatusFlag>,
    /// 以持有者的回合數計
    pub duration: u32,
}

/// 消耗品，只能對使用者自己生效
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Item {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_admits() {
        // (target_type, is_caster, same_side, expected)
        let test_data = [
            (TargetType::Caster, true, true, true),
            (TargetType::Caster, false, true, false),
            (TargetType::Ally, true, true, true),
            (TargetType::Ally, false, false, false),
            (TargetType::AllyExcludeCaster, true, true, false),
            (TargetType::AllyExcludeCaster, false, true, true),
            (TargetType::Enemy, false, false, true),
            (TargetType::Enemy, false, true, false),
            (TargetType::Any, false, false, true),
            (TargetType::Any, true, true, true),
        ];
        for (t, is_caster, same_side, expected) in test_data {
            assert_eq!(
                t.admits(is_caster, same_side),
                expected,
                "{t} is_caster={is_caster} same_side={same_side}"
            );
        }
    }

    #[test]
    fn test_effect_target_type() {
        let e = Effect::Damage {
            target_type: TargetType::Enemy,
            multiplier: 1.0,
        };
        assert_eq!(e.target_type(), &TargetType::Enemy);
        assert_eq!(Effect::Teleport.target_type(), &TargetType::Caster);
    }

    #[test]
    fn test_effect_is_harmful() {
        let slow = StatusTemplate {
            id: "slow".to_string(),
            name: String::new(),
            polarity: Polarity::Debuff,
            modifiers: vec![StatModifier {
                stat: Stat::Speed,
                value: 0.3,
            }],
            flags: BTreeSet::new(),
            duration: 2,
        };
        assert!(
            Effect::Damage {
                target_type: TargetType::Any,
                multiplier: 1.0
            }
            .is_harmful()
        );
        assert!(
            Effect::Status {
                target_type: TargetType::Any,
                status: slow
            }
            .is_harmful()
        );
        assert!(
            !Effect::Heal {
                target_type: TargetType::Ally,
                ratio: 0.5,
                base: HealBase::CasterAttack
            }
            .is_harmful()
        );
        assert!(
            Effect::Mana {
                target_type: TargetType::Enemy,
                value: -5
            }
            .is_harmful()
        );
    }

    #[test]
    fn test_deserialize_skill_toml() {
        let data = r#"
            name = "霜華綻放"
            cost = 35
            cooldown = 3
            range = 2
            shape = "area"
            aoe_range = 1

            [[effects]]
            type = "damage"
            target_type = "enemy"
            multiplier = 1.2

            [[effects]]
            type = "status"
            target_type = "enemy"
            [effects.status]
            id = "frost"
            polarity = "debuff"
            duration = 2
            modifiers = [{ stat = "speed", value = 0.3 }]
        "#;
        let skill: Skill = toml::from_str(data).unwrap();
        assert_eq!(skill.kind, SkillKind::Active);
        assert_eq!(skill.cost, 35);
        assert_eq!(skill.cooldown, 3);
        assert_eq!(skill.shape, TargetShape::Area);
        assert_eq!(skill.aoe_range, 1);
        assert_eq!(skill.effects.len(), 2);
        match &skill.effects[1] {
            Effect::Status { status, .. } => {
                assert_eq!(status.polarity, Polarity::Debuff);
                assert_eq!(status.modifiers[0].stat, Stat::Speed);
                assert!(status.flags.is_empty());
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_skill_default() {
        let skill = Skill::default();
        assert_eq!(skill.shape, TargetShape::Single);
        assert_eq!(skill.kind, SkillKind::Active);
        assert_eq!(skill.cooldown, 0);
        assert!(skill.effects.is_empty());
    }
}
