//! 动作执行器
//!
//! 持有 ActionRegistry 与全局超时，dispatch(name, arguments_json) 解析参数并在超时内执行，
//! 把结构化失败映射为 TaskError（Validation / Execution / ActionTimeout / UnknownAction）；
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::time::timeout;

use crate::actions::{ActionFailure, ActionRegistry};
use crate::core::TaskError;
use crate::llm::ToolSpec;

/// 动作执行器：对每次调度施加超时，并统一错误归类
pub struct ActionExecutor {
    registry: ActionRegistry,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(registry: ActionRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// 暴露给规划器的工具定义
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }

    /// 调度一次工具调用
    ///
    /// 参数为原始 JSON 文本（空文本按空对象处理）。名称不在表中返回 UnknownAction；
    /// 参数解析或 schema 不符返回 Validation；执行器抛错返回 Execution；超时返回 ActionTimeout。
    pub async fn dispatch(&self, name: &str, arguments_json: &str) -> Result<Value, TaskError> {
        let action = self
            .registry
            .get(name)
            .ok_or_else(|| TaskError::UnknownAction(name.to_string()))?;

        let trimmed = arguments_json.trim();
        let args: Value = if trimmed.is_empty() {
            json!({})
        } else {
            serde_json::from_str(trimmed).map_err(|e| TaskError::Validation {
                action: name.to_string(),
                message: e.to_string(),
            })?
        };

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, action.execute(args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(ActionFailure::InvalidArgs(_))) => (false, "invalid_args"),
            Ok(Err(ActionFailure::Page(_))) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = json!({
            "event": "action_audit",
            "action": name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "action");

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ActionFailure::InvalidArgs(message))) => Err(TaskError::Validation {
                action: name.to_string(),
                message,
            }),
            Ok(Err(ActionFailure::Page(e))) => Err(TaskError::Execution {
                action: name.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(TaskError::ActionTimeout(name.to_string())),
        }
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::build_registry;
    use crate::page::{MockElement, MockPage};
    use std::sync::Arc;

    fn executor(page: Arc<MockPage>) -> ActionExecutor {
        ActionExecutor::new(build_registry(page), 5)
    }

    #[tokio::test]
    async fn test_dispatch_unknown_action() {
        let exec = executor(Arc::new(MockPage::new("")));
        let err = exec.dispatch("no_such_action", "{}").await.unwrap_err();
        assert!(matches!(err, TaskError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments() {
        let exec = executor(Arc::new(MockPage::new("")));
        // elementId 应为字符串
        let err = exec
            .dispatch("locator_click", r#"{"elementId": 42}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_malformed_json() {
        let exec = executor(Arc::new(MockPage::new("")));
        let err = exec.dispatch("locator_click", "not json").await.unwrap_err();
        assert!(matches!(err, TaskError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_execution_failure() {
        let exec = executor(Arc::new(MockPage::new("")));
        let err = exec
            .dispatch("locateElement", r##"{"cssSelector": "#missing"}"##)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_click_through_registry() {
        let page = Arc::new(MockPage::new("").with_element(MockElement::new("#btn")));
        let exec = executor(page.clone());

        let located = exec
            .dispatch("locateElement", r##"{"cssSelector": "#btn"}"##)
            .await
            .unwrap();
        let id = located["elementId"].as_str().unwrap().to_string();
        let clicked = exec
            .dispatch("locator_click", &format!(r#"{{"elementId": "{}"}}"#, id))
            .await
            .unwrap();
        assert_eq!(clicked, serde_json::json!({ "success": true }));
        assert_eq!(page.clicks("#btn"), 1);
    }

    #[tokio::test]
    async fn test_dispatch_empty_arguments() {
        let exec = executor(Arc::new(MockPage::new("")));
        let value = exec.dispatch("resultAction", "").await.unwrap();
        assert_eq!(value, serde_json::json!({ "success": true }));
    }
}
