//! # Engine 模块
//!
//! 旁白引擎：把文本交给语音驱动，维护 Speaking / Idle 状态。
//!
//! ## 状态转换
//!
//! ```text
//! Idle     ── speak ──► Speaking
//! Speaking ── speak ──► Speaking   （先停掉旧朗读，不经过 Idle）
//! Speaking ── stop  ──► Idle
//! Speaking ── 估算时长到期 ──► Idle
//! ```
//!
//! 驱动没有结束回调，结束时间按 `字数 / chars_per_second` 估算。
//! 这是已知的近似，不是精确的结束信号。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::driver::SpeechDriver;
use super::utterance::{Utterance, Voice, estimate_duration};
use crate::config::NarrationConfig;

/// 旁白状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NarrationStatus {
    #[default]
    Idle,
    Speaking,
}

struct NarrationInner {
    /// 每次 speak / stop 递增，过期的定时任务据此失效
    generation: u64,
    current: Option<Utterance>,
    /// 估算结束任务
    completion: Option<JoinHandle<()>>,
    /// 延迟开始任务
    pending_start: Option<JoinHandle<()>>,
    status: watch::Sender<NarrationStatus>,
}

struct Shared {
    driver: Arc<dyn SpeechDriver>,
    runtime: Handle,
    chars_per_second: f64,
    inner: Mutex<NarrationInner>,
}

/// 旁白引擎
///
/// 同一时间最多只有一段朗读；新的 `speak` 会立即打断旧的。
pub struct NarrationEngine {
    config: NarrationConfig,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for NarrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationEngine")
            .field("status", &self.status())
            .field("config", &self.config)
            .finish()
    }
}

impl NarrationEngine {
    /// 创建旁白引擎
    ///
    /// 估算结束等定时任务在 `runtime` 上执行。
    pub fn new(driver: Arc<dyn SpeechDriver>, config: NarrationConfig, runtime: Handle) -> Self {
        let (status, _) = watch::channel(NarrationStatus::Idle);
        let shared = Arc::new(Shared {
            driver,
            runtime,
            chars_per_second: config.chars_per_second,
            inner: Mutex::new(NarrationInner {
                generation: 0,
                current: None,
                completion: None,
                pending_start: None,
                status,
            }),
        });
        Self { config, shared }
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.config
    }

    /// 以默认语言和语速朗读
    pub fn speak(&self, text: &str) {
        self.speak_with(text, &self.config.language_tag, self.config.rate);
    }

    /// 以指定语言和语速朗读
    ///
    /// 文本为空属于调用方违例，记录警告后不做任何事。
    pub fn speak_with(&self, text: &str, language_tag: &str, rate: f32) {
        match Utterance::new(text, language_tag, rate) {
            Ok(utterance) => self.speak_utterance(utterance),
            Err(e) => warn!(error = %e, "忽略无效的旁白"),
        }
    }

    /// 立即朗读
    ///
    /// 先停止并丢弃旧朗读，不排队、不重叠。
    pub fn speak_utterance(&self, utterance: Utterance) {
        let mut inner = self.shared.lock();
        self.shared.interrupt(&mut inner);
        self.shared.begin(&mut inner, utterance);
    }

    /// 延迟 `delay` 后朗读
    ///
    /// 等待期间状态为 Idle；`stop` 或新的 `speak` 会取消这次延迟朗读。
    pub fn speak_after(&self, delay: Duration, utterance: Utterance) {
        let mut inner = self.shared.lock();
        if self.shared.interrupt(&mut inner) {
            self.shared.driver.stop();
            inner.current = None;
            set_status(&inner, NarrationStatus::Idle);
        }

        let generation = inner.generation;
        let shared = Arc::clone(&self.shared);
        debug!(delay_ms = delay.as_millis() as u64, "旁白延迟开始");
        inner.pending_start = Some(self.shared.runtime.spawn(async move {
            time::sleep(delay).await;
            let mut inner = shared.lock();
            if inner.generation != generation {
                return;
            }
            inner.pending_start = None;
            shared.begin(&mut inner, utterance);
        }));
    }

    /// 立即停止
    ///
    /// 无条件停止驱动输出并同步转为 Idle，可重复调用。
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        self.shared.interrupt(&mut inner);
        self.shared.driver.stop();
        if inner.current.take().is_some() {
            debug!("旁白已停止");
        }
        set_status(&inner, NarrationStatus::Idle);
    }

    /// 当前状态
    pub fn status(&self) -> NarrationStatus {
        *self.shared.lock().status.borrow()
    }

    pub fn is_speaking(&self) -> bool {
        self.status() == NarrationStatus::Speaking
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<NarrationStatus> {
        self.shared.lock().status.subscribe()
    }

    /// 正在朗读的内容
    pub fn current(&self) -> Option<Utterance> {
        self.shared.lock().current.clone()
    }

    /// 是否有尚未开始的延迟朗读
    pub fn has_pending_start(&self) -> bool {
        self.shared.lock().pending_start.is_some()
    }

    /// 按当前配置估算 `text` 的朗读时长
    pub fn estimated_duration(&self, text: &str) -> Duration {
        estimate_duration(text, self.config.chars_per_second)
    }
}

impl Drop for NarrationEngine {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if self.shared.interrupt(&mut inner) {
            self.shared.driver.stop();
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, NarrationInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 作废所有定时任务，返回之前是否在朗读
    fn interrupt(&self, inner: &mut NarrationInner) -> bool {
        inner.generation += 1;
        if let Some(handle) = inner.completion.take() {
            handle.abort();
        }
        if let Some(handle) = inner.pending_start.take() {
            handle.abort();
        }

        *inner.status.borrow() == NarrationStatus::Speaking
    }

    /// 开始朗读
    ///
    /// 估算状态可能早于真实音频结束转为 Idle，因此提交前总是先停止驱动。
    fn begin(self: &Arc<Self>, inner: &mut NarrationInner, mut utterance: Utterance) {
        self.driver.stop();
        if !self.driver.supports_language(&utterance.language_tag) {
            debug!(language = %utterance.language_tag, "语言不受支持，使用驱动默认声音");
            utterance.voice = Voice::DriverDefault;
        }

        let estimate = estimate_duration(&utterance.text, self.chars_per_second);
        if let Err(e) = self.driver.speak(&utterance) {
            warn!(error = %e, "语音驱动不可用，旁白静默降级");
        }
        info!(
            chars = utterance.char_count(),
            language = %utterance.language_tag,
            estimate_ms = estimate.as_millis() as u64,
            "开始朗读旁白"
        );

        inner.current = Some(utterance);
        set_status(inner, NarrationStatus::Speaking);

        let generation = inner.generation;
        let shared = Arc::clone(self);
        inner.completion = Some(self.runtime.spawn(async move {
            time::sleep(estimate).await;
            let mut inner = shared.lock();
            if inner.generation != generation {
                return;
            }
            inner.completion = None;
            inner.current = None;
            set_status(&inner, NarrationStatus::Idle);
            debug!("旁白估计时长已到，转为空闲");
        }));
    }
}

fn set_status(inner: &NarrationInner, next: NarrationStatus) {
    inner.status.send_if_modified(|status| {
        if *status == next {
            false
        } else {
            *status = next;
            true
        }
    });
}
