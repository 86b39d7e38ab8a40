//! # Scheduler 模块
//!
//! 页面动画时间轴：为每个步骤挂一个 tokio 定时任务，到点后把效果写入页面状态。
//!
//! ## 取消模型
//!
//! ```text
//! start(base)  ──► 每个步骤 spawn 一个任务，任务句柄登记在 pending 集合
//! 任务到点     ──► 加锁 → 仍在 pending 中才应用效果（单次步骤同时出列）
//! cancel()     ──► 加锁 → abort 全部句柄 → 清空 pending
//! ```
//!
//! 应用效果与清空 pending 在同一把锁下进行，因此 `cancel()` 返回之后，
//! 即使某个任务已经被唤醒、正在排队等待执行，也不会再写入页面状态。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::effect::PageState;
use super::step::AnimationStep;
use crate::story::StepId;

/// 已挂起的步骤
struct Armed {
    step: StepId,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TimelineInner {
    /// 尚未触发的单次步骤与所有重复步骤
    pending: HashMap<u64, Armed>,
    next_slot: u64,
    state: PageState,
}

/// 动画时间轴
///
/// 同一实例在页面之间顺序复用：`schedule` → `start` → `cancel` → 下一页。
pub struct AnimationTimeline {
    runtime: Handle,
    steps: Vec<AnimationStep>,
    inner: Arc<Mutex<TimelineInner>>,
}

impl std::fmt::Debug for AnimationTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationTimeline")
            .field("steps", &self.steps.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl AnimationTimeline {
    /// 创建时间轴，定时任务在 `runtime` 上执行
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            steps: Vec::new(),
            inner: Arc::new(Mutex::new(TimelineInner::default())),
        }
    }

    /// 记录步骤列表，调用 `start` 之前不会触发
    ///
    /// 不影响已经挂起的步骤。
    pub fn schedule(&mut self, steps: Vec<AnimationStep>) {
        self.steps = steps;
    }

    /// 当前记录的步骤
    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    /// 替换页面状态（页面激活时装入初始值）
    pub fn set_state(&self, state: PageState) {
        self.lock().state = state;
    }

    /// 页面状态快照
    pub fn state(&self) -> PageState {
        self.lock().state.clone()
    }

    /// 以 `base` 为起点挂起所有步骤
    ///
    /// 每个步骤在 `base + delay` 触发。延迟为 0 的步骤同样异步触发，
    /// 本方法返回前不会修改页面状态。若上一轮仍有挂起步骤，先全部取消。
    /// 无效的步骤被跳过。
    pub fn start(&self, base: Instant) {
        let mut inner = self.lock();
        if !inner.pending.is_empty() {
            debug!(pending = inner.pending.len(), "重新启动时间轴，取消上一轮步骤");
            disarm_all(&mut inner);
        }

        for step in &self.steps {
            if let Err(e) = step.validate() {
                warn!(step = %step.id, error = %e, "跳过无效的动画步骤");
                continue;
            }
            let Some(at) = base.checked_add(step.delay()) else {
                warn!(step = %step.id, "触发时间溢出，跳过动画步骤");
                continue;
            };
            let slot = inner.next_slot;
            inner.next_slot += 1;

            let shared = Arc::clone(&self.inner);
            let task_step = step.clone();

            let handle = match step.period() {
                None => self.runtime.spawn(async move {
                    time::sleep_until(at).await;
                    fire(&shared, slot, &task_step);
                }),
                Some(period) => self.runtime.spawn(async move {
                    let mut ticker = time::interval_at(at, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        if !fire(&shared, slot, &task_step) {
                            break;
                        }
                    }
                }),
            };

            debug!(
                step = %step.id,
                delay_ms = step.delay().as_millis() as u64,
                repeating = step.is_repeating(),
                "挂起动画步骤"
            );
            inner.pending.insert(
                slot,
                Armed {
                    step: step.id.clone(),
                    handle,
                },
            );
        }
    }

    /// 取消所有挂起与重复中的步骤
    ///
    /// 已经应用的效果保持原样。可重复调用。
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if inner.pending.is_empty() {
            return;
        }
        debug!(pending = inner.pending.len(), "取消时间轴");
        disarm_all(&mut inner);
    }

    /// 挂起中的步骤数量
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// 指定步骤是否仍处于挂起状态
    pub fn is_pending(&self, step: &StepId) -> bool {
        self.lock().pending.values().any(|armed| &armed.step == step)
    }

    /// 是否仍有步骤会触发
    pub fn is_running(&self) -> bool {
        self.pending_count() > 0
    }

    fn lock(&self) -> MutexGuard<'_, TimelineInner> {
        lock(&self.inner)
    }
}

impl Drop for AnimationTimeline {
    fn drop(&mut self) {
        disarm_all(&mut self.lock());
    }
}

fn lock(inner: &Mutex<TimelineInner>) -> MutexGuard<'_, TimelineInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn disarm_all(inner: &mut TimelineInner) {
    for (_, armed) in inner.pending.drain() {
        armed.handle.abort();
    }
}

/// 触发一次步骤，返回该步骤之后是否还会继续触发
fn fire(shared: &Mutex<TimelineInner>, slot: u64, step: &AnimationStep) -> bool {
    let mut inner = lock(shared);

    let armed = if step.is_repeating() {
        inner.pending.contains_key(&slot)
    } else {
        inner.pending.remove(&slot).is_some()
    };
    if !armed {
        return false;
    }

    inner.state.apply(&step.id, &step.effect);
    debug!(
        step = %step.id,
        count = inner.state.fire_count(&step.id),
        "动画步骤触发"
    );
    step.is_repeating()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Effect;
    use std::time::Duration;

    fn counter(id: &str, delay: f64) -> AnimationStep {
        AnimationStep::once(id, delay, Effect::add(id, 1.0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_deferred() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![counter("a", 0.0)]);

        timeline.start(Instant::now());
        assert_eq!(timeline.state().fire_count(&StepId::new("a")), 0);
        assert_eq!(timeline.pending_count(), 1);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(timeline.state().fire_count(&StepId::new("a")), 1);
        assert_eq!(timeline.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_and_forever_scenario() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![
            AnimationStep::once("show_a", 0.0, Effect::add("a", 1.0)),
            AnimationStep::forever("show_b", 1.0, 1.0, Effect::add("b", 1.0)),
        ]);
        timeline.start(Instant::now());

        time::sleep(Duration::from_millis(100)).await;
        let state = timeline.state();
        assert_eq!(state.value("a"), Some(1.0));
        assert_eq!(state.value("b"), None);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(timeline.state().value("b"), Some(1.0));

        time::sleep(Duration::from_millis(1000)).await;
        let state = timeline.state();
        assert_eq!(state.value("b"), Some(2.0));
        assert_eq!(state.value("a"), Some(1.0));

        // 单次步骤已出列，重复步骤仍挂起
        assert_eq!(timeline.pending_count(), 1);
        assert!(timeline.is_pending(&StepId::new("show_b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_repeating_step() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![AnimationStep::forever(
            "show_b",
            1.0,
            1.0,
            Effect::add("b", 1.0),
        )]);
        timeline.start(Instant::now());

        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(timeline.state().value("b"), Some(1.0));

        timeline.cancel();
        assert_eq!(timeline.pending_count(), 0);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timeline.state().value("b"), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_keeps_effects() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.set_state(PageState::with_properties([("a", 10.0)]));
        timeline.schedule(vec![counter("a", 0.0), counter("late", 3.0)]);
        timeline.start(Instant::now());

        time::sleep(Duration::from_millis(10)).await;
        timeline.cancel();
        timeline.cancel();
        assert!(!timeline.is_running());

        time::sleep(Duration::from_secs(10)).await;
        let state = timeline.state();
        // 已应用的效果不回滚
        assert_eq!(state.value("a"), Some(11.0));
        assert_eq!(state.value("late"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_effect_after_cancel_for_any_prefix() {
        for len in 1..=10usize {
            for cut in 0..=10u64 {
                let mut timeline = AnimationTimeline::new(Handle::current());
                let steps: Vec<_> = (0..len)
                    .map(|i| counter(&format!("s{i}"), (i as f64 * 1.1) % 10.0))
                    .collect();
                timeline.schedule(steps);
                timeline.start(Instant::now());

                time::sleep(Duration::from_millis(cut * 1000 + 50)).await;
                timeline.cancel();
                let fired_at_cancel = timeline.state().total_fired();

                time::sleep(Duration::from_secs(11)).await;
                assert_eq!(
                    timeline.state().total_fired(),
                    fired_at_cancel,
                    "len={len} cut={cut}"
                );
                assert_eq!(timeline.pending_count(), 0);
            }
        }
    }

    /// 定时器已到期、任务尚未被调度时取消：效果不得落地
    #[tokio::test]
    async fn test_cancel_closes_elapsed_but_undelivered_race() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule((0..10).map(|i| counter(&format!("s{i}"), i as f64 / 1000.0)).collect());
        timeline.start(Instant::now());

        // 阻塞唯一的工作线程，让所有延迟都过期但任务无法运行
        std::thread::sleep(Duration::from_millis(30));
        timeline.cancel();

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(timeline.state().total_fired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_step_is_skipped() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![
            counter("bad", -1.0),
            counter("far", 1e20),
            AnimationStep::forever("zero", 0.0, 0.0, Effect::add("zero", 1.0)),
            AnimationStep::forever("slow", 0.0, 1e20, Effect::add("slow", 1.0)),
            counter("good", 0.5),
        ]);
        timeline.start(Instant::now());
        assert_eq!(timeline.pending_count(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(timeline.state().value("good"), Some(1.0));
        assert_eq!(timeline.state().total_fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_cancel() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![counter("a", 1.0)]);

        timeline.start(Instant::now());
        timeline.cancel();

        timeline.start(Instant::now());
        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(timeline.state().value("a"), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_replaces_pending() {
        let mut timeline = AnimationTimeline::new(Handle::current());
        timeline.schedule(vec![counter("a", 1.0)]);

        timeline.start(Instant::now());
        timeline.start(Instant::now());
        assert_eq!(timeline.pending_count(), 1);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(timeline.state().value("a"), Some(1.0));
    }
}
