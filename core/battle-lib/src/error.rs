// 戰鬥邏輯錯誤型別，攜帶 function name 與 context，支援來源錯誤巢狀
use crate::*;
use skills_lib::*;
use thiserror::Error;

/// 戰鬥核心錯誤型別
/// 驗證類錯誤一律在修改狀態前回傳
#[derive(Debug, Error)]
pub enum Error {
    #[error("`{func}`: 參數錯誤: {detail}")]
    InvalidParameter { func: &'static str, detail: String },

    #[error("`{func}`: 缺少單位模板 {template_type}")]
    MissingUnitTemplate {
        func: &'static str,
        template_type: UnitTemplateType,
    },

    #[error("`{func}`: 技能 {skill_id} 不存在")]
    SkillNotFound {
        func: &'static str,
        skill_id: SkillID,
    },

    #[error("`{func}`: 道具 {item_id} 不存在或已用完")]
    ItemNotFound { func: &'static str, item_id: ItemID },

    #[error("`{func}`: 找不到單位 {unit_id}")]
    NoActingUnit { func: &'static str, unit_id: UnitID },

    #[error("`{func}`: 單位 {unit_id} 已陣亡")]
    UnitDead { func: &'static str, unit_id: UnitID },

    #[error("`{func}`: 現在不是單位 {unit_id} 的回合")]
    NotActiveUnit { func: &'static str, unit_id: UnitID },

    #[error("`{func}`: 單位 {unit_id} 不是由玩家操作")]
    NotPlayerControlled { func: &'static str, unit_id: UnitID },

    #[error("`{func}`: 未選擇單位")]
    NoUnitSelected { func: &'static str },

    #[error("`{func}`: 未選擇技能")]
    NoSkillSelected { func: &'static str },

    #[error("`{func}`: 戰鬥已結束")]
    GameOver { func: &'static str },

    #[error("`{func}`: 位置 {pos:?} 已被佔用")]
    PosOccupied { func: &'static str, pos: Pos },

    #[error("`{func}`: 位置 {pos:?} 不存在")]
    NoTileAtPos { func: &'static str, pos: Pos },

    #[error("`{func}`: 位置 {pos:?} 不可通行")]
    NotWalkable { func: &'static str, pos: Pos },

    #[error("`{func}`: 目標 {pos:?} 不可到達")]
    NotReachable { func: &'static str, pos: Pos },

    #[error("`{func}`: {kind} 行動點數不足")]
    NotEnoughAP { func: &'static str, kind: ActionKind },

    #[error("`{func}`: 技能 {skill_id} 冷卻中，剩餘 {remaining} 回合")]
    SkillOnCooldown {
        func: &'static str,
        skill_id: SkillID,
        remaining: u32,
    },

    #[error("`{func}`: 技能 {skill_id} 魔力不足 (mp={mp}, cost={cost})")]
    NotEnoughMp {
        func: &'static str,
        skill_id: SkillID,
        mp: i32,
        cost: i32,
    },

    #[error("`{func}`: 技能 {skill_id} 為被動技能，無法施放")]
    PassiveSkill {
        func: &'static str,
        skill_id: SkillID,
    },

    #[error("`{func}`: 技能 {skill_id} 超出距離 (distance={distance}, range={range})")]
    OutOfRange {
        func: &'static str,
        skill_id: SkillID,
        distance: usize,
        range: usize,
    },

    #[error("`{func}`: 技能 {skill_id} 無法作用於 {pos:?}，目標格必須有單位")]
    SkillTargetNoUnit {
        func: &'static str,
        skill_id: SkillID,
        pos: Pos,
    },

    #[error("`{func}`: 技能 {skill_id} 無法作用於 {pos:?}")]
    SkillAffectEmpty {
        func: &'static str,
        skill_id: SkillID,
        pos: Pos,
    },

    #[error("`{func}`: 技能 {skill_id} 目標錯誤: {detail}")]
    InvalidTarget {
        func: &'static str,
        skill_id: SkillID,
        detail: String,
    },

    #[error("`{func}`: {format} 解析失敗: {reason}")]
    Parse {
        func: &'static str,
        format: &'static str,
        reason: String,
    },

    #[error("`{func}`: 地圖 {map_id} 設定錯誤: {detail}")]
    InvalidMap {
        func: &'static str,
        map_id: MapID,
        detail: String,
    },

    #[error("`{func}`: {side} 人數 {count} 超過上限 {max}")]
    TooManyUnits {
        func: &'static str,
        side: Side,
        count: usize,
        max: usize,
    },

    #[error("`{func}`: 讀取 {path} 失敗: {source}")]
    Io {
        func: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{func}`: 包裝: {source}")]
    Wrap {
        func: &'static str,
        #[source]
        source: Box<Error>,
    },
}

pub fn root_error(err: &Error) -> &Error {
    let mut err = err;
    while let Error::Wrap { source, .. } = err {
        err = source.as_ref();
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_error() {
        let inner = Error::NotEnoughAP {
            func: "inner",
            kind: ActionKind::Skill,
        };
        let err = Error::Wrap {
            func: "middle",
            source: Box::new(Error::Wrap {
                func: "outer",
                source: Box::new(inner),
            }),
        };
        assert!(matches!(
            root_error(&err),
            Error::NotEnoughAP {
                func: "inner",
                kind: ActionKind::Skill
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("`middle`"), "{msg}");
    }

    #[test]
    fn test_error_messages() {
        let err = Error::SkillOnCooldown {
            func: "cast_skill",
            skill_id: "slash".to_string(),
            remaining: 2,
        };
        assert_eq!(err.to_string(), "`cast_skill`: 技能 slash 冷卻中，剩餘 2 回合");
        let err = Error::NotEnoughAP {
            func: "move_unit",
            kind: ActionKind::Movement,
        };
        assert_eq!(err.to_string(), "`move_unit`: movement 行動點數不足");
    }
}
