//! WebPilot - Rust 网页自动化智能体
//!
//! 自然语言任务 -> 工具调用规划 -> 页面动作执行，全程录制调用轨迹并按任务指纹
//! 缓存；再次执行同一任务直接回放轨迹，不再请求模型，运行时参数以 `@{key}`
//! 占位符代回。
//!
//! 模块划分：
//! - **agent**: 任务入口（指纹 -> 缓存查找 -> 回放 / 实时规划 -> 落盘）
//! - **actions**: 页面动作表与执行器（注册、schema、调度、超时、审计日志）
//! - **cache**: 任务指纹、轨迹数据模型、文件缓存（读-合并-写）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类
//! - **llm**: 规划器客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **page**: 页面抽象与实现（Mock / Headless Chrome）
//! - **task**: 规划会话、轨迹录制、回放、结果分类、提示词

pub mod actions;
pub mod agent;
pub mod cache;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod page;
pub mod task;

pub use crate::agent::{AutoAgent, RunOptions};
pub use crate::cache::{fingerprint, CacheEntry, CacheStore, ParameterMap, ToolInvocation, Trace};
pub use crate::core::TaskError;
pub use crate::task::TaskOutcome;
