//! # Driver 模块
//!
//! 语音驱动接口与内置实现。
//!
//! 真实的 TTS 后端由宿主层实现 [`SpeechDriver`]；核心只依赖这个 trait。

use std::sync::{Mutex, PoisonError};

use tracing::info;

use super::utterance::{Utterance, Voice};
use crate::error::DriverError;

/// 语音驱动
///
/// 驱动不提供朗读结束回调，引擎按字数估算结束时间。
pub trait SpeechDriver: Send + Sync {
    /// 提交一次朗读，立即返回
    fn speak(&self, utterance: &Utterance) -> Result<(), DriverError>;

    /// 立即停止所有输出
    fn stop(&self);

    /// 是否有该语言的声音
    fn supports_language(&self, _language_tag: &str) -> bool {
        true
    }
}

/// 静默驱动
///
/// 代表语音设备缺失或被拒绝的情况：每次朗读都返回 `Unavailable`。
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDriver;

impl SpeechDriver for SilentDriver {
    fn speak(&self, _utterance: &Utterance) -> Result<(), DriverError> {
        Err(DriverError::Unavailable("未配置语音输出".to_string()))
    }

    fn stop(&self) {}
}

/// 日志驱动
///
/// 把旁白文本写入日志，用于无音频环境下的演示。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDriver;

impl SpeechDriver for LogDriver {
    fn speak(&self, utterance: &Utterance) -> Result<(), DriverError> {
        let voice = match &utterance.voice {
            Voice::Language(tag) => tag.as_str(),
            Voice::DriverDefault => "default",
        };
        info!(voice = voice, rate = utterance.rate, "🔊 {}", utterance.text);
        Ok(())
    }

    fn stop(&self) {
        info!("🔇 旁白停止");
    }
}

/// 驱动调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Speak(Utterance),
    Stop,
}

/// 记录型驱动
///
/// 记录所有调用，不产生声音。可限制支持的语言以模拟声音缺失。
#[derive(Debug, Default)]
pub struct RecordingDriver {
    calls: Mutex<Vec<DriverCall>>,
    languages: Option<Vec<String>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只支持给定语言
    pub fn with_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            languages: Some(languages.into_iter().map(Into::into).collect()),
        }
    }

    /// 所有调用记录
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 已提交的朗读
    pub fn spoken(&self) -> Vec<Utterance> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::Speak(utterance) => Some(utterance),
                DriverCall::Stop => None,
            })
            .collect()
    }

    /// `stop` 被调用的次数
    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, DriverCall::Stop))
            .count()
    }

    fn record(&self, call: DriverCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl SpeechDriver for RecordingDriver {
    fn speak(&self, utterance: &Utterance) -> Result<(), DriverError> {
        self.record(DriverCall::Speak(utterance.clone()));
        Ok(())
    }

    fn stop(&self) {
        self.record(DriverCall::Stop);
    }

    fn supports_language(&self, language_tag: &str) -> bool {
        match &self.languages {
            Some(languages) => languages.iter().any(|l| l == language_tag),
            None => true,
        }
    }
}
