//! 页面会话与生命周期状态

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

use crate::story::PageId;

/// 协调器状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 没有激活的页面
    #[default]
    NoPageActive,
    /// 某个页面处于激活状态
    PageActive(PageId),
}

impl LifecycleState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::PageActive(_))
    }

    pub fn active_page(&self) -> Option<&PageId> {
        match self {
            Self::PageActive(id) => Some(id),
            Self::NoPageActive => None,
        }
    }
}

/// 页面会话
///
/// 一个页面与旁白、时间轴、倒计时的绑定，同一时间最多存在一个。
#[derive(Debug, Clone, PartialEq)]
pub struct PageSession {
    pub page_id: PageId,
    /// 时间轴起点
    pub activated_at: Instant,
    pub countdown_target: Option<DateTime<Utc>>,
}

impl PageSession {
    pub fn new(page_id: PageId, activated_at: Instant) -> Self {
        Self {
            page_id,
            activated_at,
            countdown_target: None,
        }
    }

    /// 页面已激活的时长
    pub fn elapsed(&self) -> Duration {
        self.activated_at.elapsed()
    }

    pub fn has_countdown(&self) -> bool {
        self.countdown_target.is_some()
    }
}
