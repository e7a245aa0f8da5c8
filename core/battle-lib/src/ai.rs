//! ai.rs：
//! - 非玩家單位的決策：鎖定最近的敵人，必要時先靠近，再施放第一個可用技能。
//! - 決策（decide_action）不修改狀態，執行（take_turn）透過與玩家相同的行動介面。
use crate::*;
use skills_lib::*;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 沒有可做的事
    Idle,
    Move {
        to: Pos,
    },
    MoveAndUseSkill {
        to: Option<Pos>,
        skill_id: SkillID,
        target: Pos,
    },
}

/// 最近的存活敵人，距離相同取 id 較小者
pub fn nearest_enemy(board: &Board, unit: &Unit) -> Option<(UnitID, Pos)> {
    board
        .living_units()
        .filter(|other| other.side != unit.side)
        .min_by_key(|other| (unit.pos.manhattan(other.pos), other.id))
        .map(|other| (other.id, other.pos))
}

/// 依技能列表順序，取第一個主動、冷卻完畢、魔力足夠且不是純座標的技能
/// - 瞄準敵人的技能至少要有一個有害效果；自身技能不受此限
pub fn pick_skill(unit: &Unit) -> Option<&SkillSlot> {
    unit.skills.iter().find(|slot| {
        let skill = &slot.skill;
        skill.kind == SkillKind::Active
            && slot.is_ready()
            && unit.mp >= skill.cost
            && match skill.shape {
                TargetShape::Position => false,
                TargetShape::Caster => true,
                TargetShape::Single | TargetShape::Area => {
                    skill.effects.iter().any(Effect::is_harmful)
                }
            }
    })
}

/// 在可達格中找最接近 target 的位置，距離相同取 BFS 先發現者；不比原地近則不移動
pub fn best_step(board: &Board, unit: &Unit, target: Pos) -> Option<Pos> {
    let mut best: Option<(Pos, usize)> = None;
    for (pos, _) in reachable_in_order(board, unit.pos, unit.action_points.movement) {
        let distance = pos.manhattan(target);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((pos, distance));
        }
    }
    best.filter(|(_, d)| *d < unit.pos.manhattan(target))
        .map(|(pos, _)| pos)
}

fn in_range(slot: &SkillSlot, from: Pos, target: Pos) -> bool {
    slot.skill.shape == TargetShape::Caster || from.manhattan(target) <= slot.skill.range
}

pub fn decide_action(board: &Board, unit_id: UnitID) -> Result<Action, Error> {
    let func = "decide_action";

    let unit = board
        .units
        .get(&unit_id)
        .ok_or(Error::NoActingUnit { func, unit_id })?;
    if !unit.is_alive() {
        return Err(Error::UnitDead { func, unit_id });
    }
    let Some((_, target_pos)) = nearest_enemy(board, unit) else {
        return Ok(Action::Idle);
    };

    let slot = pick_skill(unit).filter(|_| unit.action_points.has(ActionKind::Skill));
    let Some(slot) = slot else {
        let step = best_step(board, unit, target_pos);
        return Ok(step.map_or(Action::Idle, |to| Action::Move { to }));
    };

    let mut from = unit.pos;
    let mut to = None;
    if !in_range(slot, from, target_pos) && unit.action_points.has(ActionKind::Movement) {
        to = best_step(board, unit, target_pos);
        from = to.unwrap_or(from);
    }
    if !in_range(slot, from, target_pos) {
        return Ok(to.map_or(Action::Idle, |to| Action::Move { to }));
    }
    let target = if slot.skill.shape == TargetShape::Caster {
        from
    } else {
        target_pos
    };
    Ok(Action::MoveAndUseSkill {
        to,
        skill_id: slot.id.clone(),
        target,
    })
}

/// 執行一個 AI 單位的回合，最多移動一次、施放一次，最後清空行動點數
pub fn take_turn(battle: &mut Battle, unit_id: UnitID) -> Result<(), Error> {
    let func = "ai::take_turn";

    let action = decide_action(&battle.board, unit_id).map_err(|e| Error::Wrap {
        func,
        source: Box::new(e),
    })?;
    debug!(unit_id, ?action, "AI decided");
    let result = execute(battle, unit_id, &action);
    if let Some(unit) = battle.board.units.get_mut(&unit_id) {
        unit.action_points = ActionPoints::zero();
    }
    result.map_err(|e| Error::Wrap {
        func,
        source: Box::new(e),
    })
}

fn execute(battle: &mut Battle, unit_id: UnitID, action: &Action) -> Result<(), Error> {
    match action {
        Action::Idle => Ok(()),
        Action::Move { to } => battle.move_unit(unit_id, *to).map(|_| ()),
        Action::MoveAndUseSkill {
            to,
            skill_id,
            target,
        } => {
            if let Some(to) = to {
                battle.move_unit(unit_id, *to)?;
            }
            battle.cast_skill(unit_id, skill_id, Some(*target)).map(|_| ())
        }
    }
}

/// AI 單位的回合驅動
#[derive(Debug, Default)]
pub struct ScriptedDriver;

impl TurnDriver for ScriptedDriver {
    fn drive(&mut self, battle: &mut Battle, unit_id: UnitID) -> Result<bool, Error> {
        take_turn(battle, unit_id)?;
        Ok(true)
    }
}
