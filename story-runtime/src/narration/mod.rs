//! # Narration 模块
//!
//! 旁白：文本转语音输出与朗读状态跟踪。
//!
//! - [`engine`]：旁白引擎（打断、停止、估算结束）
//! - [`driver`]：语音驱动接口与内置驱动
//! - [`utterance`]：单次朗读内容

pub mod driver;
pub mod engine;
pub mod utterance;

pub use driver::{DriverCall, LogDriver, RecordingDriver, SilentDriver, SpeechDriver};
pub use engine::{NarrationEngine, NarrationStatus};
pub use utterance::{Utterance, Voice, estimate_duration};
