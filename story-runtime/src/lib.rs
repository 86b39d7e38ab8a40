//! # Story Runtime
//!
//! 分页旁白动画故事的核心时序引擎。
//!
//! ## 架构概述
//!
//! `story-runtime` 不负责渲染，也不直接访问音频设备。
//! 它通过页面激活 / 停用事件与页面容器（Host）通信：
//!
//! ```text
//! Host                                Runtime
//!   │                                    │
//!   │──── PageEvent::BecameInactive ───►│ 停止旁白、取消时间轴、断开倒计时
//!   │──── PageEvent::BecameActive ─────►│ 朗读旁白、启动时间轴、连接倒计时
//!   │                                    │
//!   │◄─── PageState / NarrationStatus ───│ （watch 通道 / 快照）
//!   │◄─── CountdownState ────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`NarrationEngine`]：旁白引擎，按字数估算朗读结束
//! - [`AnimationTimeline`]：页面动画时间轴，支持同步取消
//! - [`PageLifecycleCoordinator`]：页面激活 / 停用状态机
//! - [`CountdownClock`]：每秒重新计算的倒计时
//! - [`Storybook`]：页面定义集合
//!
//! ## 使用示例
//!
//! ```ignore
//! use story_runtime::*;
//!
//! let coordinator = PageLifecycleCoordinator::new(
//!     Arc::new(LogDriver),
//!     Arc::new(SystemClock),
//!     NarrationConfig::default(),
//!     Handle::current(),
//! );
//! let mut player = StoryPlayer::new(Storybook::hackathon(), coordinator);
//!
//! player.go_to(0)?;
//! // ...
//! player.next()?;
//! player.shutdown()?;
//! ```
//!
//! ## 模块结构
//!
//! - [`narration`]：旁白引擎与语音驱动
//! - [`timeline`]：动画步骤、效果与时间轴
//! - [`lifecycle`]：页面生命周期协调器
//! - [`countdown`]：倒计时
//! - [`story`]：页面与故事书定义
//! - [`player`]：页面容器适配层
//! - [`config`]：核心配置
//! - [`error`]：错误类型定义

pub mod config;
pub mod countdown;
pub mod error;
pub mod lifecycle;
pub mod narration;
pub mod player;
pub mod story;
pub mod timeline;

// 重导出核心类型
pub use config::NarrationConfig;
pub use countdown::{Clock, CountdownClock, CountdownState, ManualClock, SystemClock};
pub use error::{
    ConfigError, DriverError, LifecycleError, NarrationError, StepError, StoryDataError,
    StoryError, StoryResult,
};
pub use lifecycle::{LifecycleState, PageLifecycleCoordinator, PageSession};
pub use narration::{
    DriverCall, LogDriver, NarrationEngine, NarrationStatus, RecordingDriver, SilentDriver,
    SpeechDriver, Utterance, Voice,
};
pub use player::{PageEvent, StoryPlayer};
pub use story::{NarrationCue, PageId, PageSpec, StepId, Storybook};
pub use timeline::{
    AnimationStep, AnimationTimeline, EasingFunction, Effect, PageState, Repeat, Transition,
};
