//! 页面生命周期协调器

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::session::{LifecycleState, PageSession};
use crate::config::NarrationConfig;
use crate::countdown::{Clock, CountdownClock};
use crate::error::{LifecycleError, StoryResult};
use crate::narration::{NarrationEngine, SpeechDriver};
use crate::story::{PageId, PageSpec};
use crate::timeline::{AnimationTimeline, PageState};

/// 页面生命周期协调器
///
/// 持有唯一的旁白引擎、时间轴和倒计时时钟，在页面之间顺序复用。
#[derive(Debug)]
pub struct PageLifecycleCoordinator {
    narration: NarrationEngine,
    timeline: AnimationTimeline,
    countdown: CountdownClock,
    session: Option<PageSession>,
}

impl PageLifecycleCoordinator {
    pub fn new(
        driver: Arc<dyn SpeechDriver>,
        clock: Arc<dyn Clock>,
        config: NarrationConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            narration: NarrationEngine::new(driver, config, runtime.clone()),
            timeline: AnimationTimeline::new(runtime.clone()),
            countdown: CountdownClock::new(clock, runtime),
            session: None,
        }
    }

    /// 激活页面
    ///
    /// 必须处于 `NoPageActive`。开始朗读旁白、以当前时刻为起点启动时间轴，
    /// 页面带倒计时目标时连接倒计时时钟。页面数据无效时不改变任何状态。
    pub fn activate(&mut self, page: &PageSpec) -> StoryResult<()> {
        if let Some(session) = &self.session {
            let err = LifecycleError::AlreadyActive {
                active: session.page_id.clone(),
                requested: page.id.clone(),
            };
            error!(error = %err, "页面激活时序错误");
            return Err(err.into());
        }
        page.validate()?;

        let now = Instant::now();
        let utterance = page.narration.utterance(self.narration.config())?;
        if page.narration.delay_seconds > 0.0 {
            self.narration.speak_after(page.narration.delay(), utterance);
        } else {
            self.narration.speak_utterance(utterance);
        }

        self.timeline.set_state(page.initial.clone());
        self.timeline.schedule(page.steps.clone());
        self.timeline.start(now);

        let mut session = PageSession::new(page.id.clone(), now);
        if let Some(target) = page.countdown_target {
            self.countdown.connect(target);
            session.countdown_target = Some(target);
        }

        info!(
            page = %page.id,
            steps = page.steps.len(),
            countdown = session.has_countdown(),
            "页面已激活"
        );
        self.session = Some(session);
        Ok(())
    }

    /// 停用页面
    ///
    /// `page_id` 必须是当前激活的页面。停止旁白、取消时间轴、断开倒计时，
    /// 已经应用的效果保留在页面状态中。
    pub fn deactivate(&mut self, page_id: &PageId) -> Result<(), LifecycleError> {
        let session = match &self.session {
            None => {
                let err = LifecycleError::NotActive {
                    requested: page_id.clone(),
                };
                error!(error = %err, "页面停用时序错误");
                return Err(err);
            }
            Some(session) if &session.page_id != page_id => {
                let err = LifecycleError::PageMismatch {
                    active: session.page_id.clone(),
                    requested: page_id.clone(),
                };
                error!(error = %err, "页面停用时序错误");
                return Err(err);
            }
            Some(session) => session,
        };

        self.narration.stop();
        self.timeline.cancel();
        if session.has_countdown() {
            self.countdown.disconnect();
        }

        info!(
            page = %page_id,
            elapsed_ms = session.elapsed().as_millis() as u64,
            "页面已停用"
        );
        self.session = None;
        Ok(())
    }

    /// 停用当前页面（如果有）
    pub fn deactivate_current(&mut self) -> Result<Option<PageId>, LifecycleError> {
        match self.active_page().cloned() {
            Some(id) => {
                self.deactivate(&id)?;
                Ok(Some(id))
            }
            None => {
                debug!("没有激活的页面");
                Ok(None)
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &self.session {
            Some(session) => LifecycleState::PageActive(session.page_id.clone()),
            None => LifecycleState::NoPageActive,
        }
    }

    pub fn active_page(&self) -> Option<&PageId> {
        self.session.as_ref().map(|session| &session.page_id)
    }

    pub fn session(&self) -> Option<&PageSession> {
        self.session.as_ref()
    }

    pub fn narration(&self) -> &NarrationEngine {
        &self.narration
    }

    pub fn timeline(&self) -> &AnimationTimeline {
        &self.timeline
    }

    pub fn countdown(&self) -> &CountdownClock {
        &self.countdown
    }

    /// 当前（或最近一个）页面的状态快照
    pub fn page_state(&self) -> PageState {
        self.timeline.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::ManualClock;
    use crate::error::{StoryDataError, StoryError};
    use crate::narration::{NarrationStatus, RecordingDriver};
    use crate::story::{NarrationCue, StepId, Storybook};
    use crate::timeline::{AnimationStep, Effect};
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::time::Duration;
    use tokio::time;

    fn coordinator() -> (PageLifecycleCoordinator, Arc<RecordingDriver>, Arc<ManualClock>) {
        let driver = Arc::new(RecordingDriver::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 4, 13, 8, 0, 0).unwrap(),
        ));
        let coordinator = PageLifecycleCoordinator::new(
            driver.clone(),
            clock.clone(),
            NarrationConfig::default(),
            Handle::current(),
        );
        (coordinator, driver, clock)
    }

    fn page(id: &str) -> PageSpec {
        PageSpec::new(id, NarrationCue::new("abcdefghijklmnopqrstuvwxyz")).with_steps(vec![
            AnimationStep::once("show", 0.5, Effect::set("visible", 1.0)),
            AnimationStep::forever("pulse", 0.0, 1.0, Effect::toggle("pulse")),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_is_inverse_of_activate() {
        let (mut coordinator, driver, _) = coordinator();
        let intro = page("intro");

        coordinator.activate(&intro).unwrap();
        assert_eq!(
            coordinator.state(),
            LifecycleState::PageActive(PageId::new("intro"))
        );
        assert!(coordinator.narration().is_speaking());
        assert_eq!(coordinator.timeline().pending_count(), 2);

        coordinator.deactivate(&intro.id).unwrap();
        assert_eq!(coordinator.state(), LifecycleState::NoPageActive);
        assert_eq!(coordinator.narration().status(), NarrationStatus::Idle);
        assert_eq!(coordinator.timeline().pending_count(), 0);
        // 开始朗读前一次，停用时一次
        assert_eq!(driver.stop_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_activate_is_flagged() {
        let (mut coordinator, driver, _) = coordinator();
        coordinator.activate(&page("a")).unwrap();

        let result = coordinator.activate(&page("b"));
        assert_eq!(
            result,
            Err(StoryError::Lifecycle(LifecycleError::AlreadyActive {
                active: PageId::new("a"),
                requested: PageId::new("b"),
            }))
        );
        // 原页面不受影响
        assert_eq!(coordinator.active_page(), Some(&PageId::new("a")));
        assert_eq!(driver.spoken().len(), 1);
        assert!(coordinator.timeline().is_running());

        // 激活同一页面也是违例
        assert!(coordinator.activate(&page("a")).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_deactivate_is_reported() {
        let (mut coordinator, _, _) = coordinator();

        assert_eq!(
            coordinator.deactivate(&PageId::new("a")),
            Err(LifecycleError::NotActive {
                requested: PageId::new("a")
            })
        );

        coordinator.activate(&page("a")).unwrap();
        assert_eq!(
            coordinator.deactivate(&PageId::new("b")),
            Err(LifecycleError::PageMismatch {
                active: PageId::new("a"),
                requested: PageId::new("b"),
            })
        );
        assert!(coordinator.state().is_active());
        assert!(coordinator.narration().is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_effects_survive_deactivate_and_reset_on_activate() {
        let (mut coordinator, _, _) = coordinator();
        let spec = page("a").with_initial(PageState::with_properties([("visible", 0.0)]));

        coordinator.activate(&spec).unwrap();
        time::sleep(Duration::from_millis(600)).await;
        coordinator.deactivate(&spec.id).unwrap();
        assert!(coordinator.page_state().flag("visible"));

        time::sleep(Duration::from_secs(3)).await;
        let show = StepId::new("show");
        assert_eq!(coordinator.page_state().fire_count(&show), 1);

        coordinator.activate(&spec).unwrap();
        assert!(!coordinator.page_state().flag("visible"));
        assert_eq!(coordinator.page_state().fire_count(&show), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_page_connects_and_disconnects() {
        let (mut coordinator, _, clock) = coordinator();
        let target = clock.now() + TimeDelta::seconds(90_061);
        let spec = page("final_day").with_countdown(target);

        coordinator.activate(&spec).unwrap();
        assert!(coordinator.countdown().is_connected());
        assert_eq!(coordinator.countdown().state().days, 1);

        clock.advance(TimeDelta::seconds(61));
        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(coordinator.countdown().state().minutes, 0);

        coordinator.deactivate(&spec.id).unwrap();
        assert!(!coordinator.countdown().is_connected());

        // 普通页面不连接倒计时
        coordinator.activate(&page("plain")).unwrap();
        assert!(!coordinator.countdown().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_narration_is_cancelled_by_deactivate() {
        let (mut coordinator, driver, _) = coordinator();
        let book = Storybook::hackathon();
        let last = book.page(book.len() - 1).unwrap();

        coordinator.activate(last).unwrap();
        assert!(!coordinator.narration().is_speaking());
        assert!(coordinator.narration().has_pending_start());

        time::sleep(Duration::from_millis(1000)).await;
        coordinator.deactivate(&last.id).unwrap();
        time::sleep(Duration::from_secs(2)).await;
        assert!(driver.spoken().is_empty());

        coordinator.activate(last).unwrap();
        time::sleep(Duration::from_millis(1600)).await;
        assert!(coordinator.narration().is_speaking());
        assert_eq!(driver.spoken().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_page_is_rejected_before_activation() {
        let (mut coordinator, driver, _) = coordinator();
        let broken = PageSpec::new("broken", NarrationCue::new("text"))
            .with_steps(vec![AnimationStep::once("x", -2.0, Effect::set("x", 1.0))]);

        assert!(matches!(
            coordinator.activate(&broken),
            Err(StoryError::Data(StoryDataError::Step { .. }))
        ));
        assert_eq!(coordinator.state(), LifecycleState::NoPageActive);
        assert!(driver.calls().is_empty());
    }
}
