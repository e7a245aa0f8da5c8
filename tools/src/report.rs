//! report.rs：戰鬥結果的文字輸出（ASCII 棋盤、單位列表、結果）。
use battle_lib::*;
use std::fmt::Write;

/// 地形符號；存活單位以陣營字母表示，我方 `A`、敵方 `E`
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    for (y, row) in board.tiles.iter().enumerate() {
        for (x, terrain) in row.iter().enumerate() {
            let pos = Pos { x, y };
            let symbol = match board.pos_to_unit(pos).and_then(|id| board.units.get(&id)) {
                Some(unit) if unit.side == Side::Ally => 'A',
                Some(_) => 'E',
                None => match terrain {
                    Terrain::Normal => '.',
                    Terrain::Obstacle => '#',
                    Terrain::Void => '~',
                },
            };
            out.push(symbol);
        }
        out.push('\n');
    }
    out
}

pub fn render_units(battle: &Battle) -> String {
    let mut out = String::new();
    for unit in battle.board.units.values() {
        let state = if battle.is_dead(unit.id) {
            "陣亡".to_string()
        } else {
            format!("HP {}/{} MP {}/{}", unit.hp, unit.stats.max_hp, unit.mp, unit.stats.max_mp)
        };
        let _ = writeln!(
            out,
            "#{:<3} {:<8} {:<18} ({}, {}) {}",
            unit.id, unit.side, unit.unit_template_type, unit.pos.x, unit.pos.y, state
        );
    }
    out
}

pub fn describe_outcome(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(Outcome::Victory(Side::Ally)) => "我方勝利".to_string(),
        Some(Outcome::Victory(Side::Opponent)) => "敵方勝利".to_string(),
        Some(Outcome::Stalemate) => "平手".to_string(),
        None => "未分勝負（達到步數上限）".to_string(),
    }
}
