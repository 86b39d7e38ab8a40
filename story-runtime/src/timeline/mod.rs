//! # Timeline 模块
//!
//! 页面动画时间轴。
//!
//! ## 核心概念
//!
//! - `AnimationStep`：相对时间轴起点延迟触发的一个效果，单次或无限重复
//! - `Effect`：写入页面本地状态的变更（设置 / 累加 / 翻转）
//! - `PageState`：页面本地属性集合，效果不回滚
//! - `AnimationTimeline`：把步骤挂到 tokio 定时器上，支持同步取消
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let mut timeline = AnimationTimeline::new(Handle::current());
//! timeline.schedule(vec![
//!     AnimationStep::once("show_a", 0.0, Effect::set("a", 1.0)),
//!     AnimationStep::forever("pulse", 1.0, 1.0, Effect::toggle("b")),
//! ]);
//! timeline.start(Instant::now());
//! // ...
//! timeline.cancel();
//! ```

mod easing;
mod effect;
mod scheduler;
mod step;

pub use easing::EasingFunction;
pub use effect::{Effect, PageState, Transition};
pub use scheduler::AnimationTimeline;
pub use step::{AnimationStep, MAX_STEP_SECONDS, Repeat, validate_steps};
pub(crate) use step::is_valid_delay;
