//! # Player 模块
//!
//! 页面容器适配层：把"第 N 页变为激活 / 非激活"事件映射到生命周期协调器。
//!
//! 翻页时总是先报告旧页面非激活，再报告新页面激活。

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LifecycleError, StoryResult};
use crate::lifecycle::PageLifecycleCoordinator;
use crate::story::{PageSpec, Storybook};

/// 页面容器事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageEvent {
    BecameActive(usize),
    BecameInactive(usize),
}

/// 故事播放器
#[derive(Debug)]
pub struct StoryPlayer {
    book: Storybook,
    coordinator: PageLifecycleCoordinator,
    current: Option<usize>,
}

impl StoryPlayer {
    pub fn new(book: Storybook, coordinator: PageLifecycleCoordinator) -> Self {
        Self {
            book,
            coordinator,
            current: None,
        }
    }

    /// 处理一个页面容器事件
    pub fn handle(&mut self, event: PageEvent) -> StoryResult<()> {
        debug!(?event, "页面事件");
        match event {
            PageEvent::BecameActive(index) => {
                let page = page_at(&self.book, index)?;
                self.coordinator.activate(page)?;
                self.current = Some(index);
            }
            PageEvent::BecameInactive(index) => {
                let page = page_at(&self.book, index)?;
                self.coordinator.deactivate(&page.id)?;
                self.current = None;
            }
        }
        Ok(())
    }

    /// 翻到第 `index` 页
    ///
    /// 已经在该页时不做任何事。返回按顺序发出的事件。
    pub fn go_to(&mut self, index: usize) -> StoryResult<Vec<PageEvent>> {
        page_at(&self.book, index)?;
        if self.current == Some(index) {
            return Ok(Vec::new());
        }

        let mut events = Vec::with_capacity(2);
        if let Some(old) = self.current {
            events.push(PageEvent::BecameInactive(old));
        }
        events.push(PageEvent::BecameActive(index));

        for event in &events {
            self.handle(*event)?;
        }
        info!(
            page = index,
            title = %self.book.pages[index].title,
            "翻页"
        );
        Ok(events)
    }

    /// 下一页，已在最后一页时返回 `None`
    pub fn next(&mut self) -> StoryResult<Option<usize>> {
        let target = match self.current {
            Some(index) if index + 1 >= self.book.len() => return Ok(None),
            Some(index) => index + 1,
            None => 0,
        };
        self.go_to(target)?;
        Ok(Some(target))
    }

    /// 上一页，已在第一页时返回 `None`
    pub fn previous(&mut self) -> StoryResult<Option<usize>> {
        let target = match self.current {
            Some(0) | None => return Ok(None),
            Some(index) => index - 1,
        };
        self.go_to(target)?;
        Ok(Some(target))
    }

    /// 停用当前页面
    pub fn shutdown(&mut self) -> StoryResult<()> {
        if let Some(index) = self.current {
            self.handle(PageEvent::BecameInactive(index))?;
        }
        Ok(())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_page(&self) -> Option<&PageSpec> {
        self.current.and_then(|index| self.book.page(index))
    }

    pub fn has_next(&self) -> bool {
        self.current.is_none_or(|index| index + 1 < self.book.len())
    }

    pub fn has_previous(&self) -> bool {
        self.current.is_some_and(|index| index > 0)
    }

    pub fn book(&self) -> &Storybook {
        &self.book
    }

    pub fn coordinator(&self) -> &PageLifecycleCoordinator {
        &self.coordinator
    }
}

fn page_at(book: &Storybook, index: usize) -> Result<&PageSpec, LifecycleError> {
    book.page(index).ok_or(LifecycleError::PageOutOfRange {
        index,
        len: book.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NarrationConfig;
    use crate::countdown::SystemClock;
    use crate::error::StoryError;
    use crate::narration::RecordingDriver;
    use crate::story::PageId;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn player() -> (StoryPlayer, Arc<RecordingDriver>) {
        let driver = Arc::new(RecordingDriver::new());
        let coordinator = PageLifecycleCoordinator::new(
            driver.clone(),
            Arc::new(SystemClock),
            NarrationConfig::default(),
            Handle::current(),
        );
        (StoryPlayer::new(Storybook::hackathon(), coordinator), driver)
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_emits_inactive_before_active() {
        let (mut player, _) = player();

        assert_eq!(player.go_to(0).unwrap(), vec![PageEvent::BecameActive(0)]);
        assert_eq!(
            player.go_to(2).unwrap(),
            vec![PageEvent::BecameInactive(0), PageEvent::BecameActive(2)]
        );
        assert_eq!(
            player.coordinator().active_page(),
            Some(&PageId::new("second_day"))
        );
        assert!(player.go_to(2).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_and_previous_clamp_at_edges() {
        let (mut player, driver) = player();

        assert_eq!(player.previous().unwrap(), None);
        assert!(!player.has_previous());
        for expected in 0..5 {
            assert_eq!(player.next().unwrap(), Some(expected));
        }
        assert!(!player.has_next());
        assert_eq!(player.next().unwrap(), None);
        assert_eq!(player.current_index(), Some(4));

        assert_eq!(player.previous().unwrap(), Some(3));
        assert!(player.coordinator().countdown().is_connected());

        // 五次离开页面，五次立即朗读前各停止一次驱动
        // （最后一页的延迟朗读尚未开始）
        assert_eq!(driver.stop_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_and_shutdown() {
        let (mut player, _) = player();

        assert_eq!(
            player.go_to(9),
            Err(StoryError::Lifecycle(LifecycleError::PageOutOfRange {
                index: 9,
                len: 5
            }))
        );

        player.go_to(1).unwrap();
        player.shutdown().unwrap();
        assert_eq!(player.current_index(), None);
        assert!(!player.coordinator().state().is_active());
        player.shutdown().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_events_are_reported() {
        let (mut player, _) = player();
        player.handle(PageEvent::BecameActive(0)).unwrap();

        assert!(matches!(
            player.handle(PageEvent::BecameActive(1)),
            Err(StoryError::Lifecycle(LifecycleError::AlreadyActive { .. }))
        ));
        assert!(matches!(
            player.handle(PageEvent::BecameInactive(1)),
            Err(StoryError::Lifecycle(LifecycleError::PageMismatch { .. }))
        ));
        assert_eq!(player.current_index(), Some(0));
    }
}
