//! 比较与终结伪动作
//!
//! expect_* 做纯比较，不触页面。result* 无副作用，只用于让规划器发出终结信号
//! 并给任务结果分类（动作完成 / 数据提取 / 断言判定 / 任务失败）；
//! 执行时原样返回参数，结果分类在会话层按调用名与参数解析。

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::actions::registry::{parse_args, schema_of, Action, ActionFailure, ActionRegistry};

pub(crate) fn register(registry: &mut ActionRegistry) {
    registry.register(ExpectToBe);
    registry.register(ExpectNotToBe);
    registry.register(ResultAssertion);
    registry.register(ResultQuery);
    registry.register(ResultAction);
    registry.register(ResultError);
}

#[derive(Deserialize, JsonSchema)]
struct ExpectArgs {
    actual: String,
    expected: String,
}

/// expect_toBe：相等比较
pub struct ExpectToBe;

#[async_trait]
impl Action for ExpectToBe {
    fn name(&self) -> &str {
        "expect_toBe"
    }

    fn description(&self) -> &str {
        "Asserts that the actual value is equal to the expected value."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ExpectArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ExpectArgs = parse_args(args)?;
        Ok(json!({ "success": args.actual == args.expected }))
    }
}

/// expect_notToBe：不等比较
pub struct ExpectNotToBe;

#[async_trait]
impl Action for ExpectNotToBe {
    fn name(&self) -> &str {
        "expect_notToBe"
    }

    fn description(&self) -> &str {
        "Asserts that the actual value is not equal to the expected value."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ExpectArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ExpectArgs = parse_args(args)?;
        Ok(json!({ "success": args.actual != args.expected }))
    }
}

#[derive(Deserialize, JsonSchema)]
struct ResultAssertionArgs {
    assertion: bool,
}

/// resultAssertion：断言类任务的终结信号
pub struct ResultAssertion;

#[async_trait]
impl Action for ResultAssertion {
    fn name(&self) -> &str {
        "resultAssertion"
    }

    fn description(&self) -> &str {
        "This function is called when the initial instructions asked to assert something; then 'assertion' is either true or false (boolean) depending on whether the assertion succeeded."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ResultAssertionArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ResultAssertionArgs = parse_args(args)?;
        Ok(json!({ "assertion": args.assertion }))
    }
}

#[derive(Deserialize, JsonSchema)]
struct ResultQueryArgs {
    query: String,
}

/// resultQuery：取数类任务的终结信号
pub struct ResultQuery;

#[async_trait]
impl Action for ResultQuery {
    fn name(&self) -> &str {
        "resultQuery"
    }

    fn description(&self) -> &str {
        "This function is called at the end when the initial instructions asked to extract data; then 'query' property is set to a text value of the extracted data."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ResultQueryArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ResultQueryArgs = parse_args(args)?;
        Ok(json!({ "query": args.query }))
    }
}

#[derive(Deserialize, JsonSchema)]
struct NoArgs {}

/// resultAction：动作类任务的终结信号
pub struct ResultAction;

#[async_trait]
impl Action for ResultAction {
    fn name(&self) -> &str {
        "resultAction"
    }

    fn description(&self) -> &str {
        "This function is called at the end when the initial instructions asked to perform an action."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<NoArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let _args: NoArgs = parse_args(args)?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ResultErrorArgs {
    error_message: String,
}

/// resultError：任务无法完成时的终结信号
pub struct ResultError;

#[async_trait]
impl Action for ResultError {
    fn name(&self) -> &str {
        "resultError"
    }

    fn description(&self) -> &str {
        "If user instructions cannot be completed, then this function is used to produce the final response."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ResultErrorArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ResultErrorArgs = parse_args(args)?;
        Ok(json!({ "errorMessage": args.error_message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expect_to_be() {
        let result = ExpectToBe
            .execute(json!({ "actual": "a", "expected": "a" }))
            .await
            .unwrap();
        assert_eq!(result, json!({ "success": true }));

        let result = ExpectToBe
            .execute(json!({ "actual": "a", "expected": "b" }))
            .await
            .unwrap();
        assert_eq!(result, json!({ "success": false }));
    }

    #[tokio::test]
    async fn test_result_query_echoes_arguments() {
        let result = ResultQuery
            .execute(json!({ "query": "Hello, Rayrun!" }))
            .await
            .unwrap();
        assert_eq!(result, json!({ "query": "Hello, Rayrun!" }));
    }

    #[tokio::test]
    async fn test_result_assertion_requires_bool() {
        let err = ResultAssertion
            .execute(json!({ "assertion": "yes" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionFailure::InvalidArgs(_)));
    }
}
