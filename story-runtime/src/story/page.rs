//! # Page 模块
//!
//! 页面的静态定义：旁白、初始状态、动画步骤、可选倒计时目标。
//! 页面容器只需要这些数据，其余由生命周期协调器处理。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::NarrationConfig;
use crate::error::{NarrationError, StoryDataError};
use crate::narration::Utterance;
use crate::timeline::{AnimationStep, PageState, is_valid_delay, validate_steps};

/// 页面标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 动画步骤标识
///
/// 步骤按语义名称区分，而不是按数组位置。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 页面旁白
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationCue {
    pub text: String,

    /// 页面出现后多久开始朗读（秒）
    #[serde(default)]
    pub delay_seconds: f64,

    /// 覆盖默认语言
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_tag: Option<String>,

    /// 覆盖默认语速
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
}

impl NarrationCue {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delay_seconds: 0.0,
            language_tag: None,
            rate: None,
        }
    }

    pub fn delayed(mut self, delay_seconds: f64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds).unwrap_or_default()
    }

    /// 结合默认配置生成朗读内容
    pub fn utterance(&self, defaults: &NarrationConfig) -> Result<Utterance, NarrationError> {
        let language = self
            .language_tag
            .as_deref()
            .unwrap_or(&defaults.language_tag);
        Utterance::new(
            self.text.clone(),
            language,
            self.rate.unwrap_or(defaults.rate),
        )
    }

    pub fn validate(&self) -> Result<(), NarrationError> {
        if self.text.trim().is_empty() {
            return Err(NarrationError::EmptyText);
        }
        if !is_valid_delay(self.delay_seconds) {
            return Err(NarrationError::InvalidDelay(self.delay_seconds));
        }
        if let Some(rate) = self.rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(NarrationError::InvalidRate(rate));
            }
        }
        Ok(())
    }
}

/// 页面定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub id: PageId,

    #[serde(default)]
    pub title: String,

    pub narration: NarrationCue,

    /// 页面激活时的初始属性
    #[serde(default)]
    pub initial: PageState,

    #[serde(default)]
    pub steps: Vec<AnimationStep>,

    /// 倒计时目标，只有倒计时页面设置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_target: Option<DateTime<Utc>>,
}

impl PageSpec {
    pub fn new(id: impl Into<String>, narration: NarrationCue) -> Self {
        Self {
            id: PageId::new(id),
            title: String::new(),
            narration,
            initial: PageState::default(),
            steps: Vec::new(),
            countdown_target: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_initial(mut self, initial: PageState) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_steps(mut self, steps: Vec<AnimationStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_countdown(mut self, target: DateTime<Utc>) -> Self {
        self.countdown_target = Some(target);
        self
    }

    /// 验证页面定义
    pub fn validate(&self) -> Result<(), StoryDataError> {
        self.narration
            .validate()
            .map_err(|source| StoryDataError::Narration {
                page: self.id.clone(),
                source,
            })?;
        validate_steps(&self.steps).map_err(|source| StoryDataError::Step {
            page: self.id.clone(),
            source,
        })
    }
}
