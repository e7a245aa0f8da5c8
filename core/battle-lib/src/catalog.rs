//! catalog.rs：
//! - 靜態資料（技能、道具、單位模板、地圖）的 TOML 載入。
//! - 只做結構檢查（地圖形狀、出生點、引用的 id 是否存在），不做平衡性檢查。
use crate::*;
use serde::Deserialize;
use skills_lib::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub trait UnitTemplateGetter {
    fn get(&self, typ: &str) -> Option<&UnitTemplate>;
}

/// 增援：到達指定回合時出現的敵方單位
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Wave {
    pub turn: TurnNumber,
    pub units: Vec<UnitMarker>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapConfig {
    #[serde(default)]
    pub name: String,
    /// ASCII 地形，`.` 平地、`#` 障礙、`~` 虛空
    pub terrain: Vec<String>,
    pub ally_spawns: Vec<Pos>,
    #[serde(default)]
    pub opponents: Vec<UnitMarker>,
    #[serde(default)]
    pub waves: Vec<Wave>,
    #[serde(default = "default_team_size")]
    pub max_team_size: usize,
}

fn default_team_size() -> usize {
    4
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Catalog {
    #[serde(default)]
    pub skills: BTreeMap<SkillID, Skill>,
    #[serde(default)]
    pub items: BTreeMap<ItemID, Item>,
    #[serde(default)]
    pub units: BTreeMap<UnitTemplateType, UnitTemplate>,
    #[serde(default)]
    pub maps: BTreeMap<MapID, MapConfig>,
}

impl UnitTemplateGetter for Catalog {
    fn get(&self, typ: &str) -> Option<&UnitTemplate> {
        self.units.get(typ)
    }
}

impl Catalog {
    pub fn from_toml_str(data: &str) -> Result<Self, Error> {
        let func = "Catalog::from_toml_str";

        let catalog: Catalog = toml::from_str(data).map_err(|e| Error::Parse {
            func,
            format: "toml",
            reason: e.to_string(),
        })?;
        catalog.validate().map_err(|e| Error::Wrap {
            func,
            source: Box::new(e),
        })?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let func = "Catalog::from_path";

        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
            func,
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&data)
    }

    /// 單位模板的最大生命必須大於 0，引用的技能與道具都必須存在
    pub fn validate(&self) -> Result<(), Error> {
        let func = "Catalog::validate";

        for (template_type, template) in &self.units {
            if template.stats.max_hp <= 0 {
                return Err(Error::InvalidParameter {
                    func,
                    detail: format!(
                        "單位模板 {template_type} 的 max_hp={} 必須大於 0",
                        template.stats.max_hp
                    ),
                });
            }
            if let Some(skill_id) = template
                .skills
                .iter()
                .find(|id| !self.skills.contains_key(*id))
            {
                return Err(Error::SkillNotFound {
                    func,
                    skill_id: skill_id.clone(),
                });
            }
            if let Some(item_id) = template.items.keys().find(|id| !self.items.contains_key(*id)) {
                return Err(Error::ItemNotFound {
                    func,
                    item_id: item_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn map(&self, map_id: &str) -> Result<&MapConfig, Error> {
        let func = "Catalog::map";

        self.maps.get(map_id).ok_or_else(|| Error::InvalidMap {
            func,
            map_id: map_id.to_string(),
            detail: "地圖不存在".to_string(),
        })
    }
}

impl Battle {
    /// 依地圖與我方編成建立戰鬥
    /// - 雙方開場都至少要有一名單位，否則永遠不會分出勝負
    /// - 我方依序放在 ally_spawns，敵方依 opponents 順序放置，id 依放置順序從 1 遞增
    /// - 增援的回合必須大於 1，位置必須在棋盤內且可通行
    pub fn from_map(
        map_id: &str,
        catalog: &Catalog,
        allies: &[UnitTemplateType],
        config: BattleConfig,
    ) -> Result<Battle, Error> {
        let func = "Battle::from_map";

        let map = catalog.map(map_id)?;
        let invalid = |detail: String| Error::InvalidMap {
            func,
            map_id: map_id.to_string(),
            detail,
        };

        let tiles = parse_terrain(&map.terrain).map_err(|e| invalid(e.to_string()))?;
        if allies.is_empty() {
            return Err(Error::InvalidParameter {
                func,
                detail: "我方至少需要一名單位".to_string(),
            });
        }
        if map.opponents.is_empty() {
            return Err(invalid("敵方至少需要一名單位".to_string()));
        }
        if allies.len() > map.max_team_size {
            return Err(Error::TooManyUnits {
                func,
                side: Side::Ally,
                count: allies.len(),
                max: map.max_team_size,
            });
        }
        if allies.len() > map.ally_spawns.len() {
            return Err(invalid(format!(
                "出生點 {} 個，不足以放置 {} 名我方單位",
                map.ally_spawns.len(),
                allies.len()
            )));
        }
        let mut board = Board::new(tiles);
        for wave in &map.waves {
            if wave.turn <= 1 {
                return Err(invalid(format!("增援回合 {} 必須大於 1", wave.turn)));
            }
            for marker in &wave.units {
                if catalog.get(&marker.template).is_none() {
                    return Err(Error::MissingUnitTemplate {
                        func,
                        template_type: marker.template.clone(),
                    });
                }
                if !board.is_walkable(marker.pos) {
                    return Err(invalid(format!("增援位置 {:?} 不可通行", marker.pos)));
                }
            }
        }

        let placements = allies
            .iter()
            .zip(&map.ally_spawns)
            .map(|(template, pos)| (template, *pos, Side::Ally, config.ally_controller))
            .chain(
                map.opponents
                    .iter()
                    .map(|marker| (&marker.template, marker.pos, Side::Opponent, Controller::Ai)),
            );
        for (template_type, pos, side, controller) in placements {
            let template = catalog
                .get(template_type)
                .ok_or_else(|| Error::MissingUnitTemplate {
                    func,
                    template_type: template_type.clone(),
                })?;
            let unit = Unit::from_template(
                board.next_unit_id(),
                template_type,
                template,
                side,
                controller,
                pos,
                &catalog.skills,
                &catalog.items,
            )?;
            board.place_unit(unit).map_err(|e| invalid(e.to_string()))?;
        }

        let mut waves: BTreeMap<TurnNumber, Vec<UnitMarker>> = BTreeMap::new();
        for wave in &map.waves {
            waves
                .entry(wave.turn)
                .or_default()
                .extend(wave.units.iter().cloned());
        }

        info!(
            map_id,
            allies = board.living_count(Side::Ally),
            opponents = board.living_count(Side::Opponent),
            waves = waves.len(),
            "battle created"
        );
        let mut battle = Battle::new(board, config);
        battle.waves = waves;
        battle.skills = catalog.skills.clone();
        battle.items = catalog.items.clone();
        battle.templates = catalog.units.clone();
        Ok(battle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(include_str!("../tests/catalog.toml")).unwrap()
    }

    #[test]
    fn test_load_catalog() {
        let catalog = catalog();
        assert!(catalog.skills.contains_key("strike"));
        assert!(catalog.items.contains_key("potion"));
        let knight = catalog.get("knight").unwrap();
        assert_eq!(knight.stats.max_hp, 100);
        assert_eq!(knight.skills, vec!["strike".to_string()]);
        let map = catalog.map("duel").unwrap();
        assert_eq!(map.max_team_size, 2);
        assert_eq!(map.waves.len(), 1);
    }

    #[test]
    fn test_catalog_validate() {
        let result = Catalog::from_toml_str(
            r#"
            [units.knight]
            skills = ["missing"]

            [units.knight.stats]
            max_hp = 10
            "#,
        );
        let err = result.unwrap_err();
        assert!(matches!(root_error(&err), Error::SkillNotFound { .. }));

        let result = Catalog::from_toml_str("[units.knight\n");
        assert!(matches!(result, Err(Error::Parse { .. })));

        let result = Catalog::from_path("/not/exist/catalog.toml");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_from_map() {
        let catalog = catalog();
        let allies = vec!["knight".to_string(), "archer".to_string()];
        let battle = Battle::from_map("duel", &catalog, &allies, BattleConfig::default()).unwrap();
        assert_eq!(battle.board.units.len(), 3);
        let ids: Vec<_> = battle.board.units.keys().copied().collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(battle.board.units[&1].unit_template_type, "knight");
        assert_eq!(battle.board.units[&1].side, Side::Ally);
        assert_eq!(battle.board.units[&3].side, Side::Opponent);
        assert_eq!(battle.board.units[&3].controller, Controller::Ai);
        assert_eq!(battle.turn_order().len(), 3);
        assert_eq!(battle.waves.len(), 1);
    }

    #[test]
    fn test_from_map_errors() {
        let catalog = catalog();
        let config = BattleConfig::default();

        let too_many = vec!["knight".to_string(); 3];
        assert!(matches!(
            Battle::from_map("duel", &catalog, &too_many, config.clone()),
            Err(Error::TooManyUnits { count: 3, max: 2, .. })
        ));
        let unknown = vec!["dragon".to_string()];
        assert!(matches!(
            Battle::from_map("duel", &catalog, &unknown, config.clone()),
            Err(Error::MissingUnitTemplate { .. })
        ));
        let knight = vec!["knight".to_string()];
        assert!(matches!(
            Battle::from_map("nowhere", &catalog, &knight, config.clone()),
            Err(Error::InvalidMap { .. })
        ));
        // 出生點在障礙物上
        assert!(matches!(
            Battle::from_map("blocked", &catalog, &knight, config.clone()),
            Err(Error::InvalidMap { .. })
        ));
        // 任一方沒有單位
        assert!(matches!(
            Battle::from_map("duel", &catalog, &[], config.clone()),
            Err(Error::InvalidParameter { .. })
        ));
        let mut no_opponents = catalog.clone();
        if let Some(map) = no_opponents.maps.get_mut("duel") {
            map.opponents.clear();
        }
        assert!(matches!(
            Battle::from_map("duel", &no_opponents, &knight, config),
            Err(Error::InvalidMap { .. })
        ));
    }

    #[test]
    fn test_catalog_rejects_zero_max_hp() {
        let result = Catalog::from_toml_str(
            r#"
            [units.ghost]
            name = "幽靈"

            [units.ghost.stats]
            max_hp = 0
            "#,
        );
        let err = result.unwrap_err();
        assert!(matches!(root_error(&err), Error::InvalidParameter { .. }));
    }
}
