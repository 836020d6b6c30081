//! 任务结果分类
//!
//! result* 系列调用既是终结信号也是结果载体：按调用名与参数把任务结果
//! 归类为动作完成 / 数据提取 / 断言判定 / 任务失败。

use serde::Deserialize;

use crate::core::TaskError;

/// 任务最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// 执行了请求的动作
    Action,
    /// 提取到的数据
    Query(String),
    /// 断言判定结果
    Assertion(bool),
    /// 模型声明任务无法完成
    Failed(String),
}

impl TaskOutcome {
    /// 取数类结果的文本值
    pub fn query(&self) -> Option<&str> {
        match self {
            TaskOutcome::Query(q) => Some(q),
            _ => None,
        }
    }

    /// 断言类结果的布尔值
    pub fn assertion(&self) -> Option<bool> {
        match self {
            TaskOutcome::Assertion(a) => Some(*a),
            _ => None,
        }
    }
}

/// 调用名是否属于终结信号
pub fn is_result_action(name: &str) -> bool {
    matches!(
        name,
        "resultAction" | "resultQuery" | "resultAssertion" | "resultError"
    )
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

#[derive(Deserialize)]
struct AssertionArgs {
    assertion: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorArgs {
    error_message: String,
}

/// 从已成功调度的调用解析结果分类；非终结调用返回 None
pub fn outcome_from_invocation(
    name: &str,
    arguments_json: &str,
) -> Result<Option<TaskOutcome>, TaskError> {
    let parse_failure = |e: serde_json::Error| TaskError::Validation {
        action: name.to_string(),
        message: e.to_string(),
    };
    match name {
        "resultAction" => Ok(Some(TaskOutcome::Action)),
        "resultQuery" => {
            let args: QueryArgs = serde_json::from_str(arguments_json).map_err(parse_failure)?;
            Ok(Some(TaskOutcome::Query(args.query)))
        }
        "resultAssertion" => {
            let args: AssertionArgs =
                serde_json::from_str(arguments_json).map_err(parse_failure)?;
            Ok(Some(TaskOutcome::Assertion(args.assertion)))
        }
        "resultError" => {
            let args: ErrorArgs = serde_json::from_str(arguments_json).map_err(parse_failure)?;
            Ok(Some(TaskOutcome::Failed(args.error_message)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_each_result_kind() {
        assert_eq!(
            outcome_from_invocation("resultAction", "{}").unwrap(),
            Some(TaskOutcome::Action)
        );
        assert_eq!(
            outcome_from_invocation("resultQuery", r#"{"query":"42"}"#).unwrap(),
            Some(TaskOutcome::Query("42".to_string()))
        );
        assert_eq!(
            outcome_from_invocation("resultAssertion", r#"{"assertion":false}"#).unwrap(),
            Some(TaskOutcome::Assertion(false))
        );
        assert_eq!(
            outcome_from_invocation("resultError", r#"{"errorMessage":"nope"}"#).unwrap(),
            Some(TaskOutcome::Failed("nope".to_string()))
        );
    }

    #[test]
    fn test_non_result_invocation_is_none() {
        assert_eq!(
            outcome_from_invocation("locator_click", r#"{"elementId":"el-1"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_is_result_action() {
        assert!(is_result_action("resultQuery"));
        assert!(!is_result_action("locateElement"));
    }
}
