//! # Config 模块
//!
//! 播放器配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use story_runtime::{ConfigError, NarrationConfig, Storybook};

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 旁白配置
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 故事文件路径，未配置时使用内置故事
    #[serde(default)]
    pub story_path: Option<PathBuf>,

    /// 自动翻页模式下每页停留时间（秒）
    #[serde(default = "default_page_dwell_seconds")]
    pub page_dwell_seconds: f64,

    /// 覆盖倒计时页面的目标时间
    #[serde(default)]
    pub countdown_target: Option<DateTime<Utc>>,

    /// 日志过滤器（`RUST_LOG` 优先）
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// 起始页
    #[serde(default)]
    pub start_page: usize,
}

fn default_page_dwell_seconds() -> f64 {
    12.0
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            narration: NarrationConfig::default(),
            story_path: None,
            page_dwell_seconds: default_page_dwell_seconds(),
            countdown_target: None,
            log_filter: default_log_filter(),
            start_page: 0,
        }
    }
}

impl AppConfig {
    /// 读取配置文件
    ///
    /// 日志系统依赖配置中的过滤器，因此这里不打印日志，由调用方决定如何回退。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{:?}: {}", path, e)))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.narration.validate()?;

        if !self.page_dwell_seconds.is_finite() || self.page_dwell_seconds <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "每页停留时间必须大于 0，实际为 {}",
                self.page_dwell_seconds
            )));
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "日志过滤器不能为空".to_string(),
            ));
        }

        Ok(())
    }

    /// 每页停留时间
    pub fn page_dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.page_dwell_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_page_dwell_seconds()))
    }

    /// 把倒计时目标覆盖到故事中所有带倒计时的页面
    pub fn apply_countdown_override(&self, book: &mut Storybook) -> usize {
        let Some(target) = self.countdown_target else {
            return 0;
        };

        let mut applied = 0;
        for page in &mut book.pages {
            if page.countdown_target.is_some() {
                page.countdown_target = Some(target);
                applied += 1;
            }
        }
        applied
    }
}
