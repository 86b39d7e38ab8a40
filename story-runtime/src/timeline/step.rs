//! # Step 模块
//!
//! 动画步骤定义：相对时间轴起点的延迟 + 重复方式 + 效果。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::effect::Effect;
use crate::error::StepError;
use crate::story::StepId;

/// 延迟与重复周期的上限（秒）
///
/// 超过上限的时间无法安全地加到时间轴起点上。
pub const MAX_STEP_SECONDS: f64 = 86_400.0;

/// 秒数是否可以作为延迟：有限、非负且不超过上限
pub(crate) fn is_valid_delay(seconds: f64) -> bool {
    seconds.is_finite() && (0.0..=MAX_STEP_SECONDS).contains(&seconds)
}

/// 步骤重复方式
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Repeat {
    /// 只触发一次
    #[default]
    Once,
    /// 首次在 `delay` 触发，之后每隔 `period_seconds` 再触发
    Forever { period_seconds: f64 },
}

/// 动画步骤
///
/// `delay_seconds` 相对于时间轴起点，而不是上一个步骤。
/// 各步骤相互独立，触发时间可以重叠。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationStep {
    pub id: StepId,
    #[serde(default)]
    pub delay_seconds: f64,
    #[serde(default)]
    pub repeat: Repeat,
    pub effect: Effect,
}

impl AnimationStep {
    /// 单次步骤
    pub fn once(id: impl Into<StepId>, delay_seconds: f64, effect: Effect) -> Self {
        Self {
            id: id.into(),
            delay_seconds,
            repeat: Repeat::Once,
            effect,
        }
    }

    /// 无限重复步骤
    pub fn forever(
        id: impl Into<StepId>,
        delay_seconds: f64,
        period_seconds: f64,
        effect: Effect,
    ) -> Self {
        Self {
            id: id.into(),
            delay_seconds,
            repeat: Repeat::Forever { period_seconds },
            effect,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds).unwrap_or_default()
    }

    /// 重复周期，单次步骤返回 `None`
    pub fn period(&self) -> Option<Duration> {
        match self.repeat {
            Repeat::Once => None,
            Repeat::Forever { period_seconds } => Duration::try_from_secs_f64(period_seconds).ok(),
        }
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self.repeat, Repeat::Forever { .. })
    }

    /// 验证步骤定义
    ///
    /// 延迟在 `0..=MAX_STEP_SECONDS` 内，周期在 `(0, MAX_STEP_SECONDS]` 内。
    pub fn validate(&self) -> Result<(), StepError> {
        if self.id.as_str().is_empty() {
            return Err(StepError::EmptyId);
        }
        if !is_valid_delay(self.delay_seconds) {
            return Err(StepError::InvalidDelay {
                step: self.id.clone(),
                delay: self.delay_seconds,
            });
        }
        if let Repeat::Forever { period_seconds } = self.repeat {
            if !is_valid_delay(period_seconds) || period_seconds <= 0.0 {
                return Err(StepError::InvalidPeriod {
                    step: self.id.clone(),
                    period: period_seconds,
                });
            }
        }
        Ok(())
    }
}

/// 验证一组步骤：逐个验证并检查 ID 唯一
pub fn validate_steps(steps: &[AnimationStep]) -> Result<(), StepError> {
    let mut seen = std::collections::HashSet::new();
    for step in steps {
        step.validate()?;
        if !seen.insert(step.id.as_str()) {
            return Err(StepError::DuplicateId {
                step: step.id.clone(),
            });
        }
    }
    Ok(())
}
