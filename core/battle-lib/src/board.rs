use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, Display, EnumIter, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Terrain {
    #[default]
    Normal,
    Obstacle,
    Void,
}

impl Terrain {
    pub fn is_walkable(self) -> bool {
        matches!(self, Terrain::Normal)
    }

    /// 地圖 ASCII 符號：`.` 平地、`#` 障礙、`~` 虛空
    pub fn from_symbol(c: char) -> Option<Terrain> {
        match c {
            '.' => Some(Terrain::Normal),
            '#' => Some(Terrain::Obstacle),
            '~' => Some(Terrain::Void),
            _ => None,
        }
    }
}

/// 戰場：地形在戰鬥中不變，單位集合永不刪除（陣亡只從佔位表移除）
#[derive(Debug, Default)]
pub struct Board {
    pub tiles: Vec<Vec<Terrain>>,
    pub units: BTreeMap<UnitID, Unit>,
    pub unit_map: UnitMap,
}

impl Board {
    pub fn new(tiles: Vec<Vec<Terrain>>) -> Self {
        Self {
            tiles,
            ..Default::default()
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.first().map_or(0, |row| row.len())
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn get_tile(&self, pos: Pos) -> Option<Terrain> {
        let Pos { x, y } = pos;
        self.tiles.get(y)?.get(x).copied()
    }

    /// 格子在棋盤內且地形可通行（不處理單位阻擋）
    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.get_tile(pos).is_some_and(Terrain::is_walkable)
    }

    pub fn pos_to_unit(&self, pos: Pos) -> Option<UnitID> {
        self.unit_map.get_unit(pos)
    }

    pub fn unit_to_pos(&self, unit_id: UnitID) -> Option<Pos> {
        self.unit_map.get_pos(unit_id)
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        self.unit_map.get_unit(pos).is_some()
    }

    /// 放置新單位，位置必須可通行且無人
    pub fn place_unit(&mut self, unit: Unit) -> Result<(), Error> {
        let func = "Board::place_unit";

        let pos = unit.pos;
        if self.get_tile(pos).is_none() {
            return Err(Error::NoTileAtPos { func, pos });
        }
        if !self.is_walkable(pos) {
            return Err(Error::NotWalkable { func, pos });
        }
        if self.is_occupied(pos) {
            return Err(Error::PosOccupied { func, pos });
        }
        self.unit_map.insert(unit.id, pos);
        self.units.insert(unit.id, unit);
        Ok(())
    }

    /// 移動單位，同步佔位表與單位座標
    pub fn relocate(&mut self, unit_id: UnitID, to: Pos) -> Result<(), Error> {
        let func = "Board::relocate";

        let Some(from) = self.unit_map.get_pos(unit_id) else {
            return Err(Error::NoActingUnit { func, unit_id });
        };
        if !self.is_walkable(to) {
            return Err(Error::NotWalkable { func, pos: to });
        }
        self.unit_map
            .move_unit(unit_id, from, to)
            .map_err(|e| Error::Wrap {
                func,
                source: Box::new(e),
            })?;
        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.pos = to;
        }
        Ok(())
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(|unit| unit.is_alive())
    }

    pub fn living_count(&self, side: Side) -> usize {
        self.living_units().filter(|unit| unit.side == side).count()
    }

    pub fn next_unit_id(&self) -> UnitID {
        self.units.keys().next_back().map_or(1, |id| id + 1)
    }
}

/// 存活單位的雙向位置表
#[derive(Debug, Default)]
pub struct UnitMap {
    pos_to_unit: HashMap<Pos, UnitID>,
    unit_to_pos: HashMap<UnitID, Pos>,
}

impl UnitMap {
    pub fn insert(&mut self, unit_id: UnitID, pos: Pos) {
        self.pos_to_unit.insert(pos, unit_id);
        self.unit_to_pos.insert(unit_id, pos);
    }

    pub fn move_unit(&mut self, unit_id: UnitID, from: Pos, to: Pos) -> Result<(), Error> {
        let func = "UnitMap::move_unit";

        if self.unit_to_pos.get(&unit_id) != Some(&from) {
            return Err(Error::NoActingUnit { func, unit_id });
        }
        if self.pos_to_unit.contains_key(&to) {
            return Err(Error::PosOccupied { func, pos: to });
        }
        self.pos_to_unit.remove(&from);
        self.pos_to_unit.insert(to, unit_id);
        self.unit_to_pos.insert(unit_id, to);
        Ok(())
    }

    /// 不存在時不做事
    pub fn remove(&mut self, unit_id: UnitID) -> Option<Pos> {
        let pos = self.unit_to_pos.remove(&unit_id)?;
        self.pos_to_unit.remove(&pos);
        Some(pos)
    }

    pub fn get_unit(&self, pos: Pos) -> Option<UnitID> {
        self.pos_to_unit.get(&pos).copied()
    }

    pub fn get_pos(&self, unit_id: UnitID) -> Option<Pos> {
        self.unit_to_pos.get(&unit_id).copied()
    }
}

/// 將 ASCII 地形轉為格子陣列，每列長度必須相同
pub fn parse_terrain(rows: &[String]) -> Result<Vec<Vec<Terrain>>, Error> {
    let func = "parse_terrain";

    let mut tiles = Vec::with_capacity(rows.len());
    for (y, row) in rows.iter().enumerate() {
        let parsed: Option<Vec<Terrain>> = row
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(Terrain::from_symbol)
            .collect();
        let parsed = parsed.ok_or_else(|| Error::InvalidParameter {
            func,
            detail: format!("第 {y} 列含有未知符號: {row:?}"),
        })?;
        if let Some(first) = tiles.first() {
            let first: &Vec<Terrain> = first;
            if first.len() != parsed.len() {
                return Err(Error::InvalidParameter {
                    func,
                    detail: format!(
                        "第 {y} 列長度 {} 與第 0 列 {} 不同",
                        parsed.len(),
                        first.len()
                    ),
                });
            }
        }
        tiles.push(parsed);
    }
    if tiles.is_empty() || tiles[0].is_empty() {
        return Err(Error::InvalidParameter {
            func,
            detail: "地圖不可為空".to_string(),
        });
    }
    Ok(tiles)
}
