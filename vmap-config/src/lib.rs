use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub demo: DemoConfig,
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

    /// 自动发现配置文件：优先读取环境变量 `VMAP_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("VMAP_CONFIG") {
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

/// 视口初始参数。
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_zoom")]
    pub default_zoom: f64,
    #[serde(default = "ViewportConfig::default_client_width")]
    pub client_width: f64,
    #[serde(default = "ViewportConfig::default_client_height")]
    pub client_height: f64,
}

impl ViewportConfig {
    fn default_zoom() -> f64 {
        1.0
    }

    fn default_client_width() -> f64 {
        256.0
    }

    fn default_client_height() -> f64 {
        256.0
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_zoom: Self::default_zoom(),
            client_width: Self::default_client_width(),
            client_height: Self::default_client_height(),
        }
    }
}

/// CLI 演示场景的可调参数。
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// 环形图各扇区的原始值，角宽按绝对值占比推导。
    #[serde(default = "DemoConfig::default_pie_values")]
    pub pie_values: Vec<f64>,
    /// 演示路径是否带箭头。
    #[serde(default = "DemoConfig::default_with_arrows")]
    pub with_arrows: bool,
}

impl DemoConfig {
    fn default_pie_values() -> Vec<f64> {
        vec![2.0, 2.0, 2.0, 2.0]
    }

    fn default_with_arrows() -> bool {
        true
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            pie_values: Self::default_pie_values(),
            with_arrows: Self::default_with_arrows(),
        }
    }
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
