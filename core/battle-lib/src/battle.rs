//! battle.rs：
//! - 負責戰鬥流程與回合管理：先攻排序、回合階段（Prepare → Action → End）、回合推進與增援。
//! - 技能與移動規則位於 action 模組，勝負判定位於 outcome.rs。
use crate::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use skills_lib::*;
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::Display;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Prepare,
    Action,
    End,
}

/// step() 的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 戰鬥已結束
    Finished,
    /// 等待玩家輸入
    AwaitingInput(UnitID),
    /// 推進了一個階段或一個回合
    Advanced,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum BattleEvent {
    TurnStarted {
        turn: TurnNumber,
        unit_id: UnitID,
    },
    Moved {
        unit_id: UnitID,
        from: Pos,
        to: Pos,
        steps: MovementCost,
    },
    SkillCast {
        caster: UnitID,
        skill_id: SkillID,
        target: Option<Pos>,
    },
    ItemUsed {
        unit_id: UnitID,
        item_id: ItemID,
    },
    Damaged {
        target: UnitID,
        amount: i32,
        hp: i32,
    },
    Healed {
        target: UnitID,
        amount: i32,
        hp: i32,
    },
    ManaChanged {
        target: UnitID,
        delta: i32,
        mp: i32,
    },
    StatusApplied {
        target: UnitID,
        status_id: StatusID,
    },
    StatusExpired {
        target: UnitID,
        status_id: StatusID,
    },
    DeathPrevented {
        target: UnitID,
    },
    Teleported {
        unit_id: UnitID,
        from: Pos,
        to: Pos,
    },
    UnitDied {
        unit_id: UnitID,
    },
    WaveSpawned {
        turn: TurnNumber,
        units: Vec<UnitID>,
    },
    TurnEnded {
        unit_id: UnitID,
    },
    Outcome(Outcome),
}

/// 行動單位的回合驅動方式
pub trait TurnDriver {
    /// 回傳 true 表示這個行動單位的回合已可結束
    fn drive(&mut self, battle: &mut Battle, unit_id: UnitID) -> Result<bool, Error>;
}

/// 玩家操作：不主動行動，行動點數用完才結束
#[derive(Debug, Default)]
pub struct ExternalDriver;

impl TurnDriver for ExternalDriver {
    fn drive(&mut self, battle: &mut Battle, unit_id: UnitID) -> Result<bool, Error> {
        Ok(battle
            .board
            .units
            .get(&unit_id)
            .is_none_or(|unit| !unit.is_alive() || !unit.has_remaining_actions()))
    }
}

/// 戰鬥狀態，所有修改都經由 &mut Battle
#[derive(Debug)]
pub struct Battle {
    pub board: Board,
    pub config: BattleConfig,
    pub selection: Selection,
    pub(crate) turn_order: Vec<(UnitID, i32)>,
    pub(crate) current_turn_index: usize,
    pub(crate) turn: TurnNumber,
    pub(crate) active_unit: Option<UnitID>,
    pub(crate) phase: TurnPhase,
    /// 結束回合處理中，避免重入
    pub(crate) processing: bool,
    /// 每次行動單位開始回合時遞增，用來辨識過期的結束回合請求
    pub(crate) activation: u64,
    /// 行動單位在回合中被移出先攻表，指標已指向下一位
    pub(crate) active_removed: bool,
    pub(crate) dead: BTreeSet<UnitID>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) events: Vec<BattleEvent>,
    pub(crate) rng: StdRng,
    pub(crate) waves: BTreeMap<TurnNumber, Vec<UnitMarker>>,
    pub(crate) skills: BTreeMap<SkillID, Skill>,
    pub(crate) items: BTreeMap<ItemID, Item>,
    pub(crate) templates: BTreeMap<UnitTemplateType, UnitTemplate>,
}

impl Battle {
    /// 以已放置好單位的棋盤建立戰鬥，並排出第一輪先攻
    pub fn new(board: Board, config: BattleConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let mut battle = Self {
            board,
            config,
            selection: Selection::default(),
            turn_order: Vec::new(),
            current_turn_index: 0,
            turn: 1,
            active_unit: None,
            phase: TurnPhase::Prepare,
            processing: false,
            activation: 0,
            active_removed: false,
            dead: BTreeSet::new(),
            outcome: None,
            events: Vec::new(),
            rng,
            waves: BTreeMap::new(),
            skills: BTreeMap::new(),
            items: BTreeMap::new(),
            templates: BTreeMap::new(),
        };
        battle.seed_turn_order();
        battle
    }

    pub fn turn(&self) -> TurnNumber {
        self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn active_unit(&self) -> Option<UnitID> {
        self.active_unit
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn turn_order(&self) -> Vec<UnitID> {
        self.turn_order.iter().map(|(id, _)| *id).collect()
    }

    pub fn is_dead(&self, unit_id: UnitID) -> bool {
        self.dead.contains(&unit_id)
    }

    pub fn dead_units(&self) -> &BTreeSet<UnitID> {
        &self.dead
    }

    /// 取出並清空事件紀錄
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// 依有效速度加隨機值排序，同分依 id；指標歸零
    pub(crate) fn seed_turn_order(&mut self) {
        let jitter = self.config.initiative_jitter;
        let mut order: Vec<(UnitID, i32)> = Vec::new();
        for unit in self.board.units.values() {
            if !unit.is_alive() || self.dead.contains(&unit.id) {
                continue;
            }
            let initiative = calc_initiative(&mut self.rng, unit.stats.speed, jitter);
            order.push((unit.id, initiative));
        }
        order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        debug!(?order, "turn order seeded");
        self.turn_order = order;
        self.current_turn_index = 0;
    }

    /// 將單位移出先攻表並修正指標
    pub(crate) fn remove_from_turn_order(&mut self, unit_id: UnitID) {
        let Some(index) = self.turn_order.iter().position(|(id, _)| *id == unit_id) else {
            return;
        };
        self.turn_order.remove(index);
        if index < self.current_turn_index {
            self.current_turn_index -= 1;
        } else if index == self.current_turn_index
            && self.active_unit == Some(unit_id)
            && self.phase != TurnPhase::Prepare
        {
            self.active_removed = true;
        }
    }

    /// 檢查單位是否為目前可行動的單位
    pub(crate) fn ensure_actor(&self, func: &'static str, unit_id: UnitID) -> Result<&Unit, Error> {
        if self.is_over() {
            return Err(Error::GameOver { func });
        }
        let unit = self
            .board
            .units
            .get(&unit_id)
            .ok_or(Error::NoActingUnit { func, unit_id })?;
        if !unit.is_alive() {
            return Err(Error::UnitDead { func, unit_id });
        }
        if self.active_unit != Some(unit_id) || self.phase != TurnPhase::Action {
            return Err(Error::NotActiveUnit { func, unit_id });
        }
        Ok(unit)
    }

    /// Prepare 階段：取出指標上的單位，重設行動點數
    fn prepare_turn(&mut self) {
        loop {
            let Some(&(unit_id, _)) = self.turn_order.get(self.current_turn_index) else {
                if self.turn_order.is_empty() {
                    self.declare_outcome(Outcome::Stalemate);
                    return;
                }
                self.wrap_round();
                if self.is_over() {
                    return;
                }
                continue;
            };
            let alive = self
                .board
                .units
                .get(&unit_id)
                .is_some_and(|unit| unit.is_alive());
            if !alive {
                self.turn_order.remove(self.current_turn_index);
                continue;
            }

            if let Some(unit) = self.board.units.get_mut(&unit_id) {
                unit.reset_action_points();
            }
            self.active_unit = Some(unit_id);
            self.active_removed = false;
            self.activation += 1;
            self.selection.clear();
            self.phase = TurnPhase::Action;
            debug!(turn = self.turn, unit_id, "turn started");
            self.emit(BattleEvent::TurnStarted {
                turn: self.turn,
                unit_id,
            });
            return;
        }
    }

    /// 推進戰鬥一步
    /// - AI 單位：交給 ScriptedDriver 跑完，錯誤只記錄，之後強制結束回合
    /// - 玩家單位：行動點數未用完時回傳 AwaitingInput
    pub fn step(&mut self) -> StepOutcome {
        if self.is_over() {
            return StepOutcome::Finished;
        }
        if self.phase == TurnPhase::Prepare {
            self.prepare_turn();
            if self.is_over() {
                return StepOutcome::Finished;
            }
        }
        let Some(unit_id) = self.active_unit else {
            return StepOutcome::Finished;
        };
        let controller = self
            .board
            .units
            .get(&unit_id)
            .map_or(Controller::Ai, |unit| unit.controller);
        let token = self.activation;

        match controller {
            Controller::Ai => {
                if self.active_removed {
                    self.end_turn(token);
                    return self.finished_or(StepOutcome::Advanced);
                }
                if let Err(e) = ScriptedDriver.drive(self, unit_id) {
                    warn!(unit_id, "AI 行動失敗: {e}");
                }
                if let Some(unit) = self.board.units.get_mut(&unit_id) {
                    unit.action_points = ActionPoints::zero();
                }
                self.end_turn(token);
                self.finished_or(StepOutcome::Advanced)
            }
            Controller::Player => match ExternalDriver.drive(self, unit_id) {
                Ok(false) if !self.active_removed => StepOutcome::AwaitingInput(unit_id),
                _ => {
                    self.end_turn(token);
                    self.finished_or(StepOutcome::Advanced)
                }
            },
        }
    }

    fn finished_or(&self, outcome: StepOutcome) -> StepOutcome {
        if self.is_over() {
            StepOutcome::Finished
        } else {
            outcome
        }
    }

    /// 連續推進直到戰鬥結束、需要玩家輸入或達到步數上限
    pub fn run(&mut self, max_steps: usize) -> StepOutcome {
        let mut last = StepOutcome::Advanced;
        for _ in 0..max_steps {
            last = self.step();
            if last != StepOutcome::Advanced {
                break;
            }
        }
        last
    }

    /// 結束目前單位的回合
    /// - activation 不符（已過期）或正在處理中時不做事並回傳 false
    /// - End 階段：狀態倒數、技能冷卻減一，然後推進指標
    pub fn end_turn(&mut self, activation: u64) -> bool {
        if self.processing
            || activation != self.activation
            || self.phase != TurnPhase::Action
            || self.is_over()
        {
            return false;
        }
        self.processing = true;
        self.phase = TurnPhase::End;
        self.selection.clear();

        if let Some(unit_id) = self.active_unit {
            self.end_phase(unit_id);
            self.emit(BattleEvent::TurnEnded { unit_id });
        }
        self.advance();

        if !self.is_over() {
            self.phase = TurnPhase::Prepare;
        }
        self.active_unit = None;
        self.processing = false;
        true
    }

    fn end_phase(&mut self, unit_id: UnitID) {
        let Some(unit) = self.board.units.get_mut(&unit_id) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        let expired = tick_statuses(unit);
        unit.tick_cooldowns();
        for status_id in expired {
            self.emit(BattleEvent::StatusExpired {
                target: unit_id,
                status_id,
            });
        }
        self.check_death(unit_id);
    }

    /// 玩家單位行動後，若已陣亡或沒有剩餘行動則自動結束回合
    pub(crate) fn settle(&mut self) {
        if self.phase != TurnPhase::Action || self.is_over() {
            return;
        }
        let Some(unit_id) = self.active_unit else {
            return;
        };
        let done = self.active_removed
            || self
                .board
                .units
                .get(&unit_id)
                .is_none_or(|unit| !unit.is_alive() || !unit.has_remaining_actions());
        if done {
            self.end_turn(self.activation);
        }
    }

    fn advance(&mut self) {
        if self.active_removed {
            self.active_removed = false;
        } else {
            self.current_turn_index += 1;
        }
        if self.is_over() {
            return;
        }
        if self.turn_order.is_empty() {
            self.declare_outcome(Outcome::Stalemate);
            return;
        }
        if self.current_turn_index >= self.turn_order.len() {
            self.wrap_round();
        }
    }

    /// 一輪結束：回合數加一、出現增援
    /// - 先攻表沿用上一輪，只有增援確實出現時才重新排序
    fn wrap_round(&mut self) {
        self.turn += 1;
        debug!(turn = self.turn, "new round");
        if self.spawn_waves(self.turn) {
            self.seed_turn_order();
        } else {
            self.current_turn_index = 0;
        }
        if self.turn_order.is_empty() && !self.is_over() {
            self.declare_outcome(Outcome::Stalemate);
        }
    }

    /// 回傳是否有單位出現
    fn spawn_waves(&mut self, turn: TurnNumber) -> bool {
        let Some(markers) = self.waves.remove(&turn) else {
            return false;
        };
        let mut spawned = Vec::new();
        for marker in markers {
            match self.spawn_unit(&marker, Side::Opponent, Controller::Ai) {
                Ok(unit_id) => spawned.push(unit_id),
                Err(e) => warn!(turn, template = %marker.template, "增援略過: {e}"),
            }
        }
        if spawned.is_empty() {
            return false;
        }
        info!(turn, units = ?spawned, "wave spawned");
        self.emit(BattleEvent::WaveSpawned {
            turn,
            units: spawned,
        });
        true
    }

    /// 依模板產生單位並放到棋盤上，id 依出現順序遞增
    pub(crate) fn spawn_unit(
        &mut self,
        marker: &UnitMarker,
        side: Side,
        controller: Controller,
    ) -> Result<UnitID, Error> {
        let func = "Battle::spawn_unit";

        let template = self
            .templates
            .get(&marker.template)
            .ok_or_else(|| Error::MissingUnitTemplate {
                func,
                template_type: marker.template.clone(),
            })?;
        let unit_id = self.board.next_unit_id();
        let unit = Unit::from_template(
            unit_id,
            &marker.template,
            template,
            side,
            controller,
            marker.pos,
            &self.skills,
            &self.items,
        )?;
        self.board.place_unit(unit).map_err(|e| Error::Wrap {
            func,
            source: Box::new(e),
        })?;
        Ok(unit_id)
    }
}
