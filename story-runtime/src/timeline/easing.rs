//! # Easing 模块
//!
//! 缓动函数，作为效果的渲染提示随页面状态一起交给渲染层。
//! 核心本身不做插值，只负责在正确的时间点写入目标值，曲线由渲染层解释。

use serde::{Deserialize, Serialize};

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    Linear,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    #[default]
    EaseInOut,
    /// 弹簧（带轻微回弹）
    Spring,
}
