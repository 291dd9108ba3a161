use crate::application::layout_manager::{LayoutOptions, DEFAULT_VIEWPORT_WIDTH};
use crate::domain::position_finder::DEFAULT_SEARCH_DEPTH;
use serde::Deserialize;

const CONFIG_FILE: &str = "config/dashgrid";
const ENV_PREFIX: &str = "DASHGRID";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub layout: LayoutSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutSettings {
    pub viewport_width: f64,
    pub compact_after_resize: bool,
    pub search_depth: u32,
}

impl LayoutSettings {
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            search_depth: self.search_depth,
            compact_after_resize: self.compact_after_resize,
        }
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("storage.kind", "file")?
        .set_default("storage.dir", "data/dashboards")?
        .set_default("layout.viewport_width", DEFAULT_VIEWPORT_WIDTH)?
        .set_default("layout.compact_after_resize", true)?
        .set_default("layout.search_depth", i64::from(DEFAULT_SEARCH_DEPTH))?)
}

/// Defaults, then `config/dashgrid.toml` if present, then `DASHGRID__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = builder().unwrap().build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.storage.kind, StorageKind::File);
        assert_eq!(config.storage.dir, "data/dashboards");
        assert_eq!(config.layout.viewport_width, 1280.0);
        assert_eq!(config.layout.options(), LayoutOptions::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashgrid.toml");
        std::fs::write(
            &path,
            "[storage]\nkind = \"memory\"\n\n[layout]\ncompact_after_resize = false\n",
        )
        .unwrap();

        let config: AppConfig = builder()
            .unwrap()
            .add_source(config::File::from(path))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.kind, StorageKind::Memory);
        assert!(!config.layout.compact_after_resize);
        assert_eq!(config.layout.search_depth, 100);
    }
}
