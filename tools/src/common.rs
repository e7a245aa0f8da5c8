use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const CATALOG_FILE: &str = "data/catalog.toml";
pub const DEFAULT_MAP: &str = "tutorial";
pub const DEFAULT_ALLIES: [&str; 4] = ["aurora", "blade_master", "luna", "gaia"];

pub fn from_toml<T>(content: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    toml::from_str::<T>(content).context("解析 TOML 失敗")
}

pub fn from_file<P: AsRef<Path>, T>(path: P) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("讀取 {} 失敗", path.display()))?;
    from_toml(&content).with_context(|| format!("檔案 {}", path.display()))
}
