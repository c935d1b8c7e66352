use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pipecost_app::AppConfig;

const CONFIG_ENV: &str = "PIPECOST_CONFIG";
const CONFIG_DIR_NAME: &str = "pipecost";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: AppConfig,
    /// File the config came from; `None` means built-in defaults.
    pub path: Option<PathBuf>,
}

/// Loads the config named on the command line or in `PIPECOST_CONFIG`, else
/// the per-user file when present, else defaults. A file that was asked for
/// explicitly must exist.
pub fn load(explicit: Option<&Path>) -> Result<ConfigLoad, String> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    if let Some(path) = requested {
        return load_file(path);
    }
    match user_config_file() {
        Some(path) if path.exists() => load_file(path),
        _ => Ok(ConfigLoad {
            config: AppConfig::default(),
            path: None,
        }),
    }
}

fn load_file(path: PathBuf) -> Result<ConfigLoad, String> {
    let contents = fs::read_to_string(&path)
        .map_err(|err| format!("read config {}: {}", path.display(), err))?;
    let config = parse(&contents).map_err(|err| format!("parse config {}: {}", path.display(), err))?;
    Ok(ConfigLoad {
        config,
        path: Some(path),
    })
}

fn parse(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn user_config_file() -> Option<PathBuf> {
    let home = env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}
