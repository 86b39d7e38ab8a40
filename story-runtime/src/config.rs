//! # Config 模块
//!
//! 核心层配置项。宿主层的应用配置嵌入这些结构体。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 旁白配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// 默认语言标签
    #[serde(default = "default_language_tag")]
    pub language_tag: String,

    /// 默认语速（平台默认语速为 0.5）
    #[serde(default = "default_rate")]
    pub rate: f32,

    /// 估算朗读时长用的每秒字数
    ///
    /// 语音驱动没有可靠的结束回调，朗读时长按 `字数 / chars_per_second` 估算。
    /// 这只是近似值，不是计时契约。
    #[serde(default = "default_chars_per_second")]
    pub chars_per_second: f64,
}

fn default_language_tag() -> String {
    "en-US".to_string()
}

fn default_rate() -> f32 {
    0.5
}

fn default_chars_per_second() -> f64 {
    10.0
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            language_tag: default_language_tag(),
            rate: default_rate(),
            chars_per_second: default_chars_per_second(),
        }
    }
}

impl NarrationConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "语速必须大于 0，实际为 {}",
                self.rate
            )));
        }

        if !self.chars_per_second.is_finite() || self.chars_per_second <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "每秒字数必须大于 0，实际为 {}",
                self.chars_per_second
            )));
        }

        if self.language_tag.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "语言标签不能为空".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NarrationConfig::default();
        assert_eq!(config.language_tag, "en-US");
        assert_eq!(config.chars_per_second, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NarrationConfig = serde_json::from_str(r#"{"chars_per_second": 14.0}"#).unwrap();
        assert_eq!(config.chars_per_second, 14.0);
        assert_eq!(config.rate, 0.5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = NarrationConfig::default();

        config.chars_per_second = 0.0;
        assert!(config.validate().is_err());

        config.chars_per_second = 10.0;
        config.rate = -1.0;
        assert!(config.validate().is_err());

        config.rate = 0.5;
        config.language_tag = " ".to_string();
        assert!(config.validate().is_err());
    }
}
