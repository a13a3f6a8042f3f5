//! App configuration: `docchat.ron` in the working directory plus an
//! environment override for the API base.

use std::path::Path;

use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "docchat.ron";
const API_BASE_ENV: &str = "DOCCHAT_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub user_id: String,
    /// Answer without document grounding.
    pub baseline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            user_id: "demo".to_string(),
            baseline: false,
        }
    }
}

impl AppConfig {
    /// The conversation mode is fixed once at launch.
    pub fn mode(&self) -> docchat_core::Mode {
        if self.baseline {
            docchat_core::Mode::Baseline
        } else {
            docchat_core::Mode::Retrieval
        }
    }
}

/// Loads `docchat.ron` from `dir`, falling back to defaults on a missing or
/// unreadable file. `DOCCHAT_API_BASE` overrides the file's base url.
pub fn load(dir: &Path) -> AppConfig {
    load_with_override(dir, std::env::var(API_BASE_ENV).ok())
}

fn load_with_override(dir: &Path, base_url_override: Option<String>) -> AppConfig {
    let path = dir.join(CONFIG_FILENAME);
    let mut config = match std::fs::read_to_string(&path) {
        Ok(text) => match ron::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                engine_warn!("Failed to parse config {:?}: {}", path, err);
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(err) => {
            engine_warn!("Failed to read config {:?}: {}", path, err);
            AppConfig::default()
        }
    };

    if let Some(base_url) = base_url_override.filter(|value| !value.is_empty()) {
        config.base_url = base_url;
    }
    config
}
