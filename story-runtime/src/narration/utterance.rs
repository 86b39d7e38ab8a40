//! # Utterance 模块
//!
//! 一次提交给语音驱动的朗读内容。朗读开始时创建，结束或取消时丢弃。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NarrationError;

/// 朗读使用的声音
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voice {
    /// 指定语言的声音
    Language(String),
    /// 语言不受支持时回退到驱动默认声音
    DriverDefault,
}

/// 朗读内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub language_tag: String,
    pub rate: f32,
    pub voice: Voice,
}

impl Utterance {
    /// 创建朗读内容
    ///
    /// 文本必须非空，语速必须为正数。
    pub fn new(
        text: impl Into<String>,
        language_tag: impl Into<String>,
        rate: f32,
    ) -> Result<Self, NarrationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(NarrationError::EmptyText);
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(NarrationError::InvalidRate(rate));
        }

        let language_tag = language_tag.into();
        Ok(Self {
            text,
            voice: Voice::Language(language_tag.clone()),
            language_tag,
            rate,
        })
    }

    /// 字符数（按 Unicode 标量计）
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 按字数估算朗读时长
///
/// 按 Unicode 标量值（`char`）计数而不是按字素簇：带组合符号的字母或由多个
/// 标量组成的 emoji 会算作多个字符，估算略长。估算本身只是近似值。
///
/// `chars_per_second` 无效时估算为 0，朗读会立即转为空闲。
pub fn estimate_duration(text: &str, chars_per_second: f64) -> Duration {
    let chars = text.chars().count() as f64;
    Duration::try_from_secs_f64(chars / chars_per_second).unwrap_or(Duration::ZERO)
}
