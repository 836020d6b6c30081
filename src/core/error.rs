//! 任务错误类型
//!
//! 实时规划中 Validation / Execution / ActionTimeout 会序列化进工具结果回传给模型（可恢复）；
//! Config / UnknownAction / NoResult / Cache* 直接向调用方传播，不重试。

use thiserror::Error;

/// 任务执行过程中可能出现的错误（配置、参数校验、页面操作、缓存完整性等）
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Config error: {0}")]
    Config(String),

    /// 任务文本超过长度上限（属配置类错误，进入规划前检查）
    #[error("Task too long: {length} chars, max {max}")]
    TaskTooLong { length: usize, max: usize },

    /// 工具调用参数未通过 schema 校验
    #[error("Invalid arguments for {action}: {message}")]
    Validation { action: String, message: String },

    /// 调用名不在动作注册表中：实时规划与回放均视为致命
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// 动作执行器底层操作失败（元素不存在、导航超时等）
    #[error("Action {action} failed: {message}")]
    Execution { action: String, message: String },

    #[error("Action timeout: {0}")]
    ActionTimeout(String),

    #[error("Planner error: {0}")]
    Planner(String),

    /// 实时循环结束但模型始终未发出 result* 终结信号
    #[error("Task finished without a result signal")]
    NoResult,

    /// 缓存文件存在但不是合法 JSON，或缺少按指纹键控的结构；宁可失败也不静默重建
    #[error("Cache corrupted at {path}: {message}")]
    CacheCorruption { path: String, message: String },

    #[error("Cache io failed at {path}: {message}")]
    CacheIo { path: String, message: String },
}
