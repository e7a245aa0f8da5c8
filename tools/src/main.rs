mod common;
mod report;

use anyhow::{Context, Result};
use battle_lib::*;
use clap::Parser;
use common::*;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 無畫面戰鬥模擬：雙方皆由 AI 操作，跑到分出勝負或達到步數上限
#[derive(Parser, Debug)]
#[command(name = "battle-sim", about = "Headless grid tactics battle simulator", version)]
struct Cli {
    /// 技能、道具、單位與地圖資料
    #[arg(long, default_value = CATALOG_FILE)]
    catalog: PathBuf,

    /// 戰鬥設定 TOML，未指定時使用預設值
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MAP)]
    map: String,

    /// 我方編成，依序放在地圖出生點
    #[arg(long, value_delimiter = ',')]
    allies: Vec<String>,

    /// 覆寫設定檔的種子
    #[arg(long)]
    seed: Option<u64>,

    /// 覆寫設定檔的步數上限
    #[arg(long)]
    max_steps: Option<usize>,

    /// 每個事件輸出一行 JSON
    #[arg(long)]
    events: bool,

    /// 顯示除錯紀錄
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "battle_lib=debug" } else { "battle_lib=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<BattleConfig> {
    let mut config: BattleConfig = match &cli.config {
        Some(path) => from_file(path)?,
        None => BattleConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }
    // 沒有操作介面，我方也交給 AI
    config.ally_controller = Controller::Ai;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let catalog = Catalog::from_path(&cli.catalog)
        .with_context(|| format!("無法載入 {}", cli.catalog.display()))?;
    let config = load_config(&cli)?;
    let allies: Vec<UnitTemplateType> = if cli.allies.is_empty() {
        DEFAULT_ALLIES.iter().map(|s| s.to_string()).collect()
    } else {
        cli.allies.clone()
    };

    let mut battle = Battle::from_map(&cli.map, &catalog, &allies, config.clone())
        .with_context(|| format!("無法建立地圖 {} 的戰鬥", cli.map))?;
    println!("{}", report::render_board(&battle.board));

    let last = battle.run(config.max_steps);
    info!(?last, turn = battle.turn(), "simulation stopped");

    if cli.events {
        for event in battle.take_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    println!("{}", report::render_board(&battle.board));
    print!("{}", report::render_units(&battle));
    println!(
        "結果：{}，共 {} 回合",
        report::describe_outcome(battle.outcome()),
        battle.turn()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutorial_runs_to_outcome() {
        let catalog = Catalog::from_toml_str(include_str!("../../data/catalog.toml")).unwrap();
        let allies: Vec<UnitTemplateType> = DEFAULT_ALLIES.iter().map(|s| s.to_string()).collect();
        let config = BattleConfig {
            ally_controller: Controller::Ai,
            ..Default::default()
        };
        let mut battle = Battle::from_map(DEFAULT_MAP, &catalog, &allies, config).unwrap();
        assert_eq!(battle.board.units.len(), 8);
        assert_eq!(battle.run(10_000), StepOutcome::Finished);
        assert!(battle.outcome().is_some());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["battle-sim", "--seed", "7", "--allies", "luna,gaia"]);
        assert_eq!(cli.allies, vec!["luna".to_string(), "gaia".to_string()]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.ally_controller, Controller::Ai);
        assert_eq!(config.max_steps, BattleConfig::default().max_steps);
    }
}
