//! 測試輔助：用 ASCII 地形與技能 id 快速組出戰鬥

#![allow(dead_code)]

use battle_lib::*;
use skills_lib::*;
use std::collections::BTreeMap;

pub fn catalog() -> Catalog {
    Catalog::from_toml_str(include_str!("../catalog.toml")).unwrap()
}

pub fn rows(rows: &[&str]) -> Vec<String> {
    rows.iter().map(|s| s.to_string()).collect()
}

pub fn stats(max_hp: i32, attack: i32, defense: i32, speed: i32) -> StatBlock {
    StatBlock {
        max_hp,
        max_mp: 50,
        attack,
        defense,
        speed,
        ..Default::default()
    }
}

/// 以測試目錄的 catalog.toml 技能建立單位
pub fn unit(
    id: UnitID,
    side: Side,
    controller: Controller,
    pos: Pos,
    stats: StatBlock,
    skills: &[&str],
) -> Unit {
    let catalog = catalog();
    let template = UnitTemplate {
        name: format!("unit-{id}"),
        stats,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        items: BTreeMap::from([("potion".to_string(), 1)]),
        ..Default::default()
    };
    Unit::from_template(
        id,
        &"dummy".to_string(),
        &template,
        side,
        controller,
        pos,
        &catalog.skills,
        &catalog.items,
    )
    .unwrap()
}

/// 先攻沒有隨機值，順序只看速度與 id
pub fn battle(terrain: &[&str], units: Vec<Unit>) -> Battle {
    let mut board = Board::new(parse_terrain(&rows(terrain)).unwrap());
    for unit in units {
        board.place_unit(unit).unwrap();
    }
    let config = BattleConfig {
        initiative_jitter: 0,
        ..Default::default()
    };
    Battle::new(board, config)
}

pub fn count_events(events: &[BattleEvent], f: impl Fn(&BattleEvent) -> bool) -> usize {
    events.iter().filter(|e| f(e)).count()
}

pub fn status(id: &str, polarity: Polarity, modifiers: Vec<StatModifier>) -> StatusTemplate {
    StatusTemplate {
        id: id.to_string(),
        name: id.to_string(),
        polarity,
        modifiers,
        flags: Default::default(),
        duration: 2,
    }
}
