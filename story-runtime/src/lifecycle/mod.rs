//! # Lifecycle 模块
//!
//! 页面生命周期：把页面容器的激活 / 停用事件转换为旁白、时间轴、倒计时的启停。
//!
//! ## 状态机
//!
//! ```text
//! NoPageActive ── activate(p) ──► PageActive(p)
//! PageActive(p) ── deactivate(p) ──► NoPageActive
//! ```
//!
//! 协调器不会隐式停用上一个页面，调用方必须先停用再激活。

mod coordinator;
mod session;

pub use coordinator::PageLifecycleCoordinator;
pub use session::{LifecycleState, PageSession};
