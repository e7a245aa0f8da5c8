//! skill.rs：
//! - 負責技能施放、目標解析與效果套用（傷害、治療、魔力、狀態、瞬移）。
//! - 僅處理技能本身，不負責回合流程與 AI 決策。
use crate::*;
use skills_lib::*;
use tracing::debug;

/// 目標解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Unit(UnitID),
    Units(Vec<UnitID>),
    Position(Pos),
}

impl ResolvedTarget {
    pub fn unit_ids(&self) -> Vec<UnitID> {
        match self {
            ResolvedTarget::Unit(id) => vec![*id],
            ResolvedTarget::Units(ids) => ids.clone(),
            ResolvedTarget::Position(_) => vec![],
        }
    }
}

/// 傷害公式
/// - 基礎傷害 = max(1, floor(攻擊 × 倍率) − 防禦)
/// - 再乘上 (100 + 受傷加成 − 減傷)%，最低 1
pub fn calc_damage(attacker: &StatBlock, multiplier: f32, defender: &StatBlock) -> i32 {
    let raw = (attacker.attack as f32 * multiplier).floor() as i32 - defender.defense;
    let raw = raw.max(1);
    let percent = (100 + defender.damage_received - defender.damage_reduction).max(0);
    (raw * percent / 100).max(1)
}

/// 治療量 = floor(基準值 × 比例)
pub fn calc_heal(base: HealBase, ratio: f32, caster: &StatBlock, target: &StatBlock) -> i32 {
    let base_value = match base {
        HealBase::CasterAttack => caster.attack,
        HealBase::TargetMaxHp => target.max_hp,
    };
    ((base_value as f32 * ratio).floor() as i32).max(0)
}

/// 解析技能目標，不修改任何狀態
pub fn resolve_target(
    board: &Board,
    caster: &Unit,
    skill_id: &str,
    skill: &Skill,
    target: Option<Pos>,
) -> Result<ResolvedTarget, Error> {
    let func = "resolve_target";

    if skill.shape == TargetShape::Caster {
        return match target {
            Some(pos) if pos != caster.pos => Err(Error::InvalidTarget {
                func,
                skill_id: skill_id.to_string(),
                detail: format!("自身技能只能指定自己 {:?}", caster.pos),
            }),
            _ => Ok(ResolvedTarget::Unit(caster.id)),
        };
    }

    let Some(pos) = target else {
        return Err(Error::InvalidTarget {
            func,
            skill_id: skill_id.to_string(),
            detail: "需要目標座標".to_string(),
        });
    };
    let distance = caster.pos.manhattan(pos);
    if distance > skill.range {
        return Err(Error::OutOfRange {
            func,
            skill_id: skill_id.to_string(),
            distance,
            range: skill.range,
        });
    }

    match skill.shape {
        TargetShape::Single => board
            .pos_to_unit(pos)
            .map(ResolvedTarget::Unit)
            .ok_or_else(|| Error::SkillTargetNoUnit {
                func,
                skill_id: skill_id.to_string(),
                pos,
            }),
        TargetShape::Area => {
            if board.get_tile(pos).is_none() {
                return Err(Error::InvalidTarget {
                    func,
                    skill_id: skill_id.to_string(),
                    detail: format!("{pos:?} 不在棋盤內"),
                });
            }
            let mut ids: Vec<UnitID> =
                manhattan_area(pos, skill.aoe_range, |p| board.get_tile(p).is_some())
                    .into_iter()
                    .filter_map(|p| board.pos_to_unit(p))
                    .collect();
            if ids.is_empty() {
                return Err(Error::SkillAffectEmpty {
                    func,
                    skill_id: skill_id.to_string(),
                    pos,
                });
            }
            ids.sort_unstable();
            Ok(ResolvedTarget::Units(ids))
        }
        TargetShape::Position => {
            if !board.is_walkable(pos) || board.is_occupied(pos) {
                return Err(Error::InvalidTarget {
                    func,
                    skill_id: skill_id.to_string(),
                    detail: format!("{pos:?} 必須是可通行的空格"),
                });
            }
            Ok(ResolvedTarget::Position(pos))
        }
        TargetShape::Caster => Ok(ResolvedTarget::Unit(caster.id)),
    }
}

/// 技能可指定的座標：射程內、棋盤內的格子
pub fn skill_casting_area(board: &Board, caster: &Unit, skill: &Skill) -> Vec<Pos> {
    if skill.shape == TargetShape::Caster {
        return vec![caster.pos];
    }
    manhattan_area(caster.pos, skill.range, |pos| board.get_tile(pos).is_some())
}

impl Battle {
    /// 施放技能主流程
    /// 檢查順序：冷卻、魔力、行動點數、目標；全部通過後依序套用效果再扣除消耗
    pub fn cast_skill(
        &mut self,
        caster_id: UnitID,
        skill_id: &str,
        target: Option<Pos>,
    ) -> Result<Vec<BattleEvent>, Error> {
        let func = "Battle::cast_skill";

        let caster = self.ensure_actor(func, caster_id)?;
        let slot = caster
            .skill_slot(skill_id)
            .ok_or_else(|| Error::SkillNotFound {
                func,
                skill_id: skill_id.to_string(),
            })?;
        if slot.skill.kind == SkillKind::Passive {
            return Err(Error::PassiveSkill {
                func,
                skill_id: skill_id.to_string(),
            });
        }
        if !slot.is_ready() {
            return Err(Error::SkillOnCooldown {
                func,
                skill_id: skill_id.to_string(),
                remaining: slot.current_cooldown,
            });
        }
        if caster.mp < slot.skill.cost {
            return Err(Error::NotEnoughMp {
                func,
                skill_id: skill_id.to_string(),
                mp: caster.mp,
                cost: slot.skill.cost,
            });
        }
        if !caster.action_points.has(ActionKind::Skill) {
            return Err(Error::NotEnoughAP {
                func,
                kind: ActionKind::Skill,
            });
        }
        let resolved = resolve_target(&self.board, caster, skill_id, &slot.skill, target)
            .map_err(|e| Error::Wrap {
                func,
                source: Box::new(e),
            })?;
        let skill = slot.skill.clone();

        debug!(caster_id, skill_id, ?target, ?resolved, "cast skill");
        let start = self.events.len();
        self.emit(BattleEvent::SkillCast {
            caster: caster_id,
            skill_id: skill_id.to_string(),
            target,
        });
        for effect in &skill.effects {
            self.apply_effect(caster_id, effect, &resolved);
        }
        if let Some(caster) = self.board.units.get_mut(&caster_id) {
            if let Some(slot) = caster.skill_slot_mut(skill_id) {
                slot.current_cooldown = skill.cooldown;
            }
            caster.mp = (caster.mp - skill.cost).max(0);
            caster.action_points.skill = caster.action_points.skill.saturating_sub(1);
        }
        Ok(self.events[start..].to_vec())
    }

    /// 對解析後的目標套用單一效果，已陣亡或不符合 target_type 的單位略過
    pub(crate) fn apply_effect(
        &mut self,
        source: UnitID,
        effect: &Effect,
        resolved: &ResolvedTarget,
    ) {
        let Some(caster) = self.board.units.get(&source) else {
            return;
        };
        let caster_side = caster.side;
        let caster_stats = caster.stats;

        if let Effect::Teleport = effect {
            if let ResolvedTarget::Position(to) = resolved {
                self.teleport(source, *to);
            }
            return;
        }

        for target_id in resolved.unit_ids() {
            let Some(target) = self.board.units.get(&target_id) else {
                continue;
            };
            if !target.is_alive() {
                continue;
            }
            let is_caster = target_id == source;
            let same_side = target.side == caster_side;
            if !effect.target_type().admits(is_caster, same_side) {
                continue;
            }
            match effect {
                Effect::Damage { multiplier, .. } => {
                    let amount = calc_damage(&caster_stats, *multiplier, &target.stats);
                    self.apply_damage(target_id, amount);
                }
                Effect::Heal { ratio, base, .. } => {
                    let amount = calc_heal(*base, *ratio, &caster_stats, &target.stats);
                    self.apply_heal(target_id, amount);
                }
                Effect::Mana { value, .. } => self.apply_mana(target_id, *value),
                Effect::Status { status, .. } => {
                    if let Some(target) = self.board.units.get_mut(&target_id) {
                        add_status(target, status, Some(source));
                    }
                    self.emit(BattleEvent::StatusApplied {
                        target: target_id,
                        status_id: status.id.clone(),
                    });
                    self.check_death(target_id);
                }
                Effect::Teleport => {}
            }
        }
    }

    /// 致命傷害時先消耗免死旗標，血量保留 1
    pub(crate) fn apply_damage(&mut self, target_id: UnitID, amount: i32) {
        let Some(target) = self.board.units.get_mut(&target_id) else {
            return;
        };
        if !target.is_alive() {
            return;
        }
        let before = target.hp;
        let mut prevented = false;
        if before - amount <= 0 && consume_flag(target, StatusFlag::DeathPrevention) {
            target.hp = 1;
            prevented = true;
        } else {
            target.hp = (before - amount).max(0);
        }
        let hp = target.hp;
        debug!(target_id, amount, hp, "damage");
        self.emit(BattleEvent::Damaged {
            target: target_id,
            amount: before - hp,
            hp,
        });
        if prevented {
            self.emit(BattleEvent::DeathPrevented { target: target_id });
        }
        self.check_death(target_id);
    }

    pub(crate) fn apply_heal(&mut self, target_id: UnitID, amount: i32) {
        let Some(target) = self.board.units.get_mut(&target_id) else {
            return;
        };
        if !target.is_alive() {
            return;
        }
        let before = target.hp;
        target.hp = (before + amount).min(target.stats.max_hp);
        let hp = target.hp;
        self.emit(BattleEvent::Healed {
            target: target_id,
            amount: hp - before,
            hp,
        });
    }

    pub(crate) fn apply_mana(&mut self, target_id: UnitID, value: i32) {
        let Some(target) = self.board.units.get_mut(&target_id) else {
            return;
        };
        if !target.is_alive() {
            return;
        }
        let before = target.mp;
        target.mp = (before + value).clamp(0, target.stats.max_mp);
        let mp = target.mp;
        self.emit(BattleEvent::ManaChanged {
            target: target_id,
            delta: mp - before,
            mp,
        });
    }

    fn teleport(&mut self, unit_id: UnitID, to: Pos) {
        let Some(from) = self.board.unit_to_pos(unit_id) else {
            return;
        };
        match self.board.relocate(unit_id, to) {
            Ok(()) => self.emit(BattleEvent::Teleported { unit_id, from, to }),
            Err(e) => debug!(unit_id, ?to, "teleport skipped: {e}"),
        }
    }
}
