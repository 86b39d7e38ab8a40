//! # Error 模块
//!
//! 定义 story-runtime 中使用的错误类型。
//!
//! 页面边界之外不抛出任何错误：驱动错误在引擎内部吸收，
//! 生命周期前置条件错误以 `Err` 返回给调用方（调用方的时序 bug）。

use thiserror::Error;

use crate::story::{PageId, StepId};

/// 页面生命周期错误（前置条件违例）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// 已有页面处于激活状态
    #[error("页面 '{active}' 仍处于激活状态，无法激活 '{requested}'")]
    AlreadyActive { active: PageId, requested: PageId },

    /// 当前没有激活的页面
    #[error("当前没有激活的页面，无法停用 '{requested}'")]
    NotActive { requested: PageId },

    /// 停用的页面与当前激活页面不一致
    #[error("停用页面不匹配：当前激活 '{active}'，请求停用 '{requested}'")]
    PageMismatch { active: PageId, requested: PageId },

    /// 页面索引越界
    #[error("页面索引 {index} 越界，有效范围是 0..{len}")]
    PageOutOfRange { index: usize, len: usize },
}

/// 动画步骤定义错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// 步骤 ID 为空
    #[error("步骤 ID 不能为空")]
    EmptyId,

    /// 延迟无效（负数或非有限值）
    #[error("步骤 '{step}' 的延迟无效: {delay}")]
    InvalidDelay { step: StepId, delay: f64 },

    /// 重复周期无效
    #[error("步骤 '{step}' 的重复周期无效: {period}")]
    InvalidPeriod { step: StepId, period: f64 },

    /// 同一页面内步骤 ID 重复
    #[error("步骤 ID '{step}' 重复")]
    DuplicateId { step: StepId },
}

/// 旁白参数错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NarrationError {
    /// 旁白文本为空
    #[error("旁白文本不能为空")]
    EmptyText,

    /// 语速无效
    #[error("语速必须大于 0，实际为 {0}")]
    InvalidRate(f32),

    /// 每秒字数无效
    #[error("每秒字数必须大于 0，实际为 {0}")]
    InvalidCharsPerSecond(f64),

    /// 旁白延迟无效
    #[error("旁白延迟无效: {0}")]
    InvalidDelay(f64),
}

/// 语音驱动错误
///
/// 由 [`SpeechDriver`](crate::narration::SpeechDriver) 返回，
/// 引擎只记录日志，不向外传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 驱动不可用（设备缺失或权限被拒绝）
    #[error("语音驱动不可用: {0}")]
    Unavailable(String),

    /// 驱动拒绝了本次朗读
    #[error("语音驱动拒绝朗读: {0}")]
    Rejected(String),
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// 故事数据错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryDataError {
    /// JSON 解析失败
    #[error("故事文件解析失败: {0}")]
    Parse(String),

    /// 文件读取失败
    #[error("故事文件读取失败: {0}")]
    Io(String),

    /// 故事没有任何页面
    #[error("故事至少需要一个页面")]
    NoPages,

    /// 页面 ID 重复
    #[error("页面 ID '{0}' 重复")]
    DuplicatePage(PageId),

    /// 页面内的步骤定义无效
    #[error("页面 '{page}': {source}")]
    Step {
        page: PageId,
        #[source]
        source: StepError,
    },

    /// 页面内的旁白定义无效
    #[error("页面 '{page}': {source}")]
    Narration {
        page: PageId,
        #[source]
        source: NarrationError,
    },
}

/// story-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryError {
    /// 生命周期错误
    #[error("生命周期错误: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// 步骤错误
    #[error("步骤错误: {0}")]
    Step(#[from] StepError),

    /// 旁白错误
    #[error("旁白错误: {0}")]
    Narration(#[from] NarrationError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 故事数据错误
    #[error("故事数据错误: {0}")]
    Data(#[from] StoryDataError),
}

/// Result 类型别名
pub type StoryResult<T> = Result<T, StoryError>;
