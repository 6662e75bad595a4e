use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "ROOMPLAN_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `ROOMPLAN_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendMode {
    /// 运行脚本化演示后退出。
    #[default]
    Demo,
    /// 从标准输入逐行读取命令。
    Interactive,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_mode: FrontendMode,
}

/// 画布尺寸即房间尺寸的上限。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "CanvasConfig::default_max_width")]
    pub max_width: f64,
    #[serde(default = "CanvasConfig::default_max_height")]
    pub max_height: f64,
}

impl CanvasConfig {
    fn default_max_width() -> f64 {
        800.0
    }

    fn default_max_height() -> f64 {
        600.0
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_width: Self::default_max_width(),
            max_height: Self::default_max_height(),
        }
    }
}

/// 新建对象的默认落点。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "PlacementConfig::default_spawn")]
    pub spawn_x: f64,
    #[serde(default = "PlacementConfig::default_spawn")]
    pub spawn_y: f64,
    #[serde(default = "PlacementConfig::default_opening_offset")]
    pub opening_offset: f64,
    #[serde(default = "PlacementConfig::default_scan_step")]
    pub scan_step: f64,
}

impl PlacementConfig {
    fn default_spawn() -> f64 {
        10.0
    }

    fn default_opening_offset() -> f64 {
        50.0
    }

    fn default_scan_step() -> f64 {
        10.0
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            spawn_x: Self::default_spawn(),
            spawn_y: Self::default_spawn(),
            opening_offset: Self::default_opening_offset(),
            scan_step: Self::default_scan_step(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// 启动时加载的平面图文件，缺省时使用演示数据。
    #[serde(default)]
    pub plan_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_canvas_and_spawn() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.frontend.default_mode, FrontendMode::Demo);
        assert_eq!((cfg.canvas.max_width, cfg.canvas.max_height), (800.0, 600.0));
        assert_eq!((cfg.placement.spawn_x, cfg.placement.spawn_y), (10.0, 10.0));
        assert_eq!(cfg.placement.opening_offset, 50.0);
        assert!(cfg.storage.plan_path.is_none());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [frontend]
            default_mode = "interactive"

            [canvas]
            max_width = 1024.0

            [placement]
            scan_step = 5.0

            [storage]
            plan_path = "plans/home.json"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.frontend.default_mode, FrontendMode::Interactive);
        assert_eq!(cfg.canvas.max_width, 1024.0);
        assert_eq!(cfg.canvas.max_height, 600.0);
        assert_eq!(cfg.placement.scan_step, 5.0);
        assert_eq!(cfg.placement.spawn_x, 10.0);
        assert_eq!(
            cfg.storage.plan_path.as_deref(),
            Some(Path::new("plans/home.json"))
        );
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[canvas]\nmax_width = \"wide\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = AppConfig::from_file("/nonexistent/roomplan.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
