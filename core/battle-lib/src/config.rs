use crate::*;
use serde::{Deserialize, Serialize};

/// 戰鬥設定，未填欄位使用預設值
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BattleConfig {
    /// 先攻隨機值的種子，相同種子得到相同戰鬥
    pub seed: u64,
    /// 先攻 = 有效速度 + 0..=initiative_jitter
    pub initiative_jitter: u32,
    /// 我方單位的操作方式，設為 ai 可進行雙方自動對戰
    pub ally_controller: Controller,
    /// run() 的步數上限
    pub max_steps: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            initiative_jitter: 3,
            ally_controller: Controller::Player,
            max_steps: 10_000,
        }
    }
}

impl BattleConfig {
    pub fn from_toml_str(data: &str) -> Result<Self, Error> {
        let func = "BattleConfig::from_toml_str";

        toml::from_str(data).map_err(|e| Error::Parse {
            func,
            format: "toml",
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_config_from_toml() {
        let config = BattleConfig::from_toml_str(
            r#"
            seed = 42
            ally_controller = "ai"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.ally_controller, Controller::Ai);
        assert_eq!(config.initiative_jitter, BattleConfig::default().initiative_jitter);
        assert_eq!(config.max_steps, 10_000);

        assert_eq!(BattleConfig::from_toml_str("").unwrap(), BattleConfig::default());
        assert!(matches!(
            BattleConfig::from_toml_str("seed = \"abc\""),
            Err(Error::Parse { format: "toml", .. })
        ));
    }
}
