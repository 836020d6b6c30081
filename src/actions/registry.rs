//! 动作注册表
//!
//! 所有页面动作实现 Action trait（name / description / parameters_schema / execute），
//! 由 ActionRegistry 按名注册与查找；注册顺序即暴露给规划器的工具定义顺序。
//! 参数校验即 serde 反序列化：schema 由 schemars 从参数结构体派生，下发给规划器，
//! 执行时再以同一结构体解析原始 JSON，类型不符即校验失败。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::ToolSpec;
use crate::page::{Page, PageError};

/// 动作执行失败：参数不合法，或页面操作出错
///
/// 两类失败在实时规划中都会序列化进工具结果回传给模型，区别只在错误归类。
#[derive(Error, Debug)]
pub enum ActionFailure {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// 页面动作 trait：名称与描述进入工具定义，execute 收到已解析的 JSON 参数
#[async_trait]
pub trait Action: Send + Sync {
    /// 动作名称（工具调用协议中的函数名，录制轨迹按此键控）
    fn name(&self) -> &str;

    /// 动作描述（供规划器理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供规划器生成正确的参数格式）
    fn parameters_schema(&self) -> Value;

    /// 执行动作；返回 JSON 值或结构化失败
    async fn execute(&self, args: Value) -> Result<Value, ActionFailure>;
}

/// 解析并校验动作参数（zod.parse 的 serde 等价物）
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ActionFailure> {
    serde_json::from_value(args).map_err(|e| ActionFailure::InvalidArgs(e.to_string()))
}

/// 从参数结构体派生 JSON Schema
pub(crate) fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({ "type": "object" }))
}

/// 动作注册表：按名称存储 Arc<dyn Action>，保留注册顺序
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
    order: Vec<String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: impl Action + 'static) {
        let name = action.name().to_string();
        if !self.actions.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.actions.insert(name, Arc::new(action));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// 注册顺序下的全部动作名
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 暴露给规划器的工具定义（与注册顺序一致）
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.actions.get(name))
            .map(|action| ToolSpec {
                name: action.name().to_string(),
                description: action.description().to_string(),
                parameters: action.parameters_schema(),
            })
            .collect()
    }
}

/// 构建整张动作表：一个 Page 会话一张表，任务结束即丢弃
pub fn build_registry(page: Arc<dyn Page>) -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    // 元素发现
    crate::actions::locate::register(&mut registry, &page);
    // 元素操作
    crate::actions::locator::register(&mut registry, &page);
    // 页面级操作
    crate::actions::pageops::register(&mut registry, &page);
    // 比较与终结伪动作
    crate::actions::result::register(&mut registry);

    registry
}
