//! # Countdown 模块
//!
//! 倒计时时钟：每秒按固定目标时间重新计算剩余的天 / 时 / 分 / 秒。
//!
//! 只有带倒计时的页面使用，激活时 `connect`，停用时 `disconnect`。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// 时间来源
pub trait Clock: Send + Sync {
    /// 当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手动时钟
///
/// 时间只在调用 `set` / `advance` 时变化，用于测试与离线演示。
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 剩余时间（各分量非负）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownState {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownState {
    /// 计算 `now` 到 `target` 的剩余时间
    ///
    /// 目标时间已过时各分量为 0，不会出现负数或回绕。
    pub fn until(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let remaining = (target - now).num_seconds().max(0).unsigned_abs();
        Self {
            days: remaining / 86_400,
            hours: remaining % 86_400 / 3_600,
            minutes: remaining % 3_600 / 60,
            seconds: remaining % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for CountdownState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

const TICK: Duration = Duration::from_secs(1);

struct ClockInner {
    /// 每次 connect / disconnect 递增
    session: u64,
    target: Option<DateTime<Utc>>,
    ticker: Option<JoinHandle<()>>,
    state: watch::Sender<CountdownState>,
}

/// 倒计时时钟
pub struct CountdownClock {
    runtime: Handle,
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<ClockInner>>,
}

impl std::fmt::Debug for CountdownClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CountdownClock")
            .field("target", &inner.target)
            .field("state", &*inner.state.borrow())
            .finish()
    }
}

impl CountdownClock {
    pub fn new(clock: Arc<dyn Clock>, runtime: Handle) -> Self {
        let (state, _) = watch::channel(CountdownState::default());
        Self {
            runtime,
            clock,
            inner: Arc::new(Mutex::new(ClockInner {
                session: 0,
                target: None,
                ticker: None,
                state,
            })),
        }
    }

    /// 开始每秒计算到 `target` 的剩余时间
    ///
    /// 连接时立即计算一次。已连接时先断开旧的连接。
    pub fn connect(&self, target: DateTime<Utc>) {
        let mut inner = self.lock();
        if let Some(handle) = inner.ticker.take() {
            handle.abort();
        }
        inner.session += 1;
        inner.target = Some(target);

        let state = CountdownState::until(self.clock.now(), target);
        inner.state.send_replace(state);
        debug!(%target, remaining = %state, "倒计时已连接");

        let session = inner.session;
        let shared = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);
        inner.ticker = Some(self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let inner = lock(&shared);
                if inner.session != session {
                    break;
                }
                let state = CountdownState::until(clock.now(), target);
                inner.state.send_replace(state);
            }
        }));
    }

    /// 停止计时，可重复调用
    ///
    /// 返回后不会再重新计算。
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.session += 1;
        inner.target = None;
        if let Some(handle) = inner.ticker.take() {
            handle.abort();
            debug!("倒计时已断开");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().target.is_some()
    }

    /// 最近一次计算的剩余时间
    pub fn state(&self) -> CountdownState {
        *self.lock().state.borrow()
    }

    /// 订阅剩余时间变化
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.lock().state.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, ClockInner> {
        lock(&self.inner)
    }
}

impl Drop for CountdownClock {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn lock(inner: &Mutex<ClockInner>) -> MutexGuard<'_, ClockInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
