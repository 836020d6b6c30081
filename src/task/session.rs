//! 规划会话主循环
//!
//! 等待模型 -> 调度本轮全部工具调用 -> 逐一回填结果 -> 下一轮，
//! 直到某轮没有工具调用，或成功调度了 result* 终结信号。
//! 一轮可以批量请求多个调用（省往返），但执行严格串行：同一页面上
//! 任意时刻只有一个调用在跑。
//!
//! 参数校验失败与页面操作失败序列化进对应工具结果回传，让模型自行纠正；
//! 未知动作名说明工具定义与注册表不一致，直接中止。

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::actions::ActionExecutor;
use crate::cache::{ParameterMap, ToolInvocation, Trace};
use crate::core::TaskError;
use crate::llm::{ChatMessage, PlannerClient};
use crate::task::outcome::{is_result_action, outcome_from_invocation, TaskOutcome};
use crate::task::prompt::SYSTEM_PROMPT;
use crate::task::recorder::TraceRecorder;

/// 一次工具调用与其结果；失败结果已序列化为文本（回传给模型的形式）
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub invocation: ToolInvocation,
    pub value: Result<Value, String>,
}

/// 会话配置
///
/// debug 为显式配置值（默认 false），不读进程级环境变量；
/// 开启后每轮规划输出与工具结果以 info 级别记录。
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 单次任务内最大模型轮数，防止死循环
    pub max_turns: usize,
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            debug: false,
        }
    }
}

/// 会话产出：可回放轨迹 + 结果分类 + 调用/结果转写
#[derive(Debug)]
pub struct SessionRun {
    pub trace: Trace,
    pub outcome: TaskOutcome,
    pub transcript: Vec<InvocationResult>,
}

/// 规划会话：驱动实时规划循环
pub struct PlannerSession<'a> {
    planner: &'a dyn PlannerClient,
    executor: &'a ActionExecutor,
    config: SessionConfig,
}

impl<'a> PlannerSession<'a> {
    pub fn new(
        planner: &'a dyn PlannerClient,
        executor: &'a ActionExecutor,
        config: SessionConfig,
    ) -> Self {
        Self {
            planner,
            executor,
            config,
        }
    }

    /// 执行实时规划循环
    ///
    /// params 仅用于录制期模板化；任务文本中的占位符替换由调用方在拼提示词前完成。
    pub async fn run(
        &self,
        task_prompt: &str,
        params: &ParameterMap,
    ) -> Result<SessionRun, TaskError> {
        let tools = self.executor.specs();
        let mut messages = vec![
            ChatMessage::System(SYSTEM_PROMPT.to_string()),
            ChatMessage::User(task_prompt.to_string()),
        ];
        let mut recorder = TraceRecorder::new();
        let mut transcript: Vec<InvocationResult> = Vec::new();
        let mut outcome: Option<TaskOutcome> = None;

        for turn_index in 0..self.config.max_turns {
            let turn = self
                .planner
                .next_turn(&messages, &tools)
                .await
                .map_err(TaskError::Planner)?;

            if self.config.debug {
                info!(turn = turn_index, calls = turn.calls.len(), content = ?turn.content, "planner turn");
            } else {
                debug!(turn = turn_index, calls = turn.calls.len(), "planner turn");
            }

            if turn.calls.is_empty() {
                // 无调用即规划结束；是否拿到结果由循环后统一判定
                break;
            }

            let invocations: Vec<ToolInvocation> = turn
                .calls
                .iter()
                .map(|c| ToolInvocation {
                    name: c.name.clone(),
                    arguments: c.arguments.clone(),
                })
                .collect();
            recorder.record_turn(&invocations, params);
            messages.push(ChatMessage::Assistant {
                content: turn.content.clone(),
                calls: turn.calls.clone(),
            });

            for (call, invocation) in turn.calls.iter().zip(invocations) {
                let dispatched = self.executor.dispatch(&call.name, &call.arguments).await;
                let (feedback, value) = match dispatched {
                    Ok(value) => (value.to_string(), Ok(value)),
                    Err(e @ TaskError::Validation { .. })
                    | Err(e @ TaskError::Execution { .. })
                    | Err(e @ TaskError::ActionTimeout(_)) => {
                        let message = e.to_string();
                        (json!({ "error": message }).to_string(), Err(message))
                    }
                    // 未知动作等契约违例不回传，直接中止
                    Err(e) => return Err(e),
                };

                if self.config.debug {
                    info!(action = %call.name, result = %feedback, "tool result");
                }

                if value.is_ok() && outcome.is_none() && is_result_action(&call.name) {
                    outcome = outcome_from_invocation(&call.name, &call.arguments)?;
                }

                transcript.push(InvocationResult { invocation, value });
                // 每个调用恰好收到一条对应结果，失败也不例外
                messages.push(ChatMessage::ToolResult {
                    call_id: call.id.clone(),
                    content: feedback,
                });
            }

            if outcome.is_some() {
                break;
            }
        }

        let outcome = outcome.ok_or(TaskError::NoResult)?;
        Ok(SessionRun {
            trace: recorder.finish(),
            outcome,
            transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::build_registry;
    use crate::llm::MockPlanner;
    use crate::page::{MockElement, MockPage};
    use serde_json::json;
    use std::sync::Arc;

    fn executor(page: Arc<MockPage>) -> ActionExecutor {
        ActionExecutor::new(build_registry(page), 5)
    }

    fn session_config() -> SessionConfig {
        SessionConfig::default()
    }

    #[tokio::test]
    async fn test_single_turn_query() {
        let page = Arc::new(
            MockPage::new("<h1>Hello, Rayrun!</h1>")
                .with_element(MockElement::new("h1").tag("h1").text("Hello, Rayrun!")),
        );
        let exec = executor(page);
        let planner = MockPlanner::new(vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "h1" })),
            ("locator_innerText", json!({ "elementId": "el-1" })),
            ("resultQuery", json!({ "query": "Hello, Rayrun!" })),
        ])]);

        let run = PlannerSession::new(&planner, &exec, session_config())
            .run("get the header text", &ParameterMap::new())
            .await
            .unwrap();

        assert_eq!(run.outcome, TaskOutcome::Query("Hello, Rayrun!".to_string()));
        assert_eq!(run.trace.len(), 1);
        assert_eq!(run.trace[0].len(), 3);
        assert_eq!(run.transcript.len(), 3);
        // 终结信号出现后不再请求模型
        assert_eq!(planner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_result_signal_is_error() {
        let exec = executor(Arc::new(MockPage::new("")));
        let planner = MockPlanner::new(vec![MockPlanner::text_turn("nothing to do")]);

        let err = PlannerSession::new(&planner, &exec, session_config())
            .run("do nothing", &ParameterMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NoResult));
    }

    #[tokio::test]
    async fn test_validation_failure_fed_back_and_recovered() {
        let page = Arc::new(MockPage::new("").with_element(MockElement::new("#btn")));
        let exec = executor(page.clone());
        let planner = MockPlanner::new(vec![
            // elementId 类型错误，校验失败回传后模型纠正
            MockPlanner::turn(vec![("locator_click", json!({ "elementId": 1 }))]),
            MockPlanner::turn(vec![
                ("locateElement", json!({ "cssSelector": "#btn" })),
                ("locator_click", json!({ "elementId": "el-1" })),
                ("resultAction", json!({})),
            ]),
        ]);

        let run = PlannerSession::new(&planner, &exec, session_config())
            .run("click the button", &ParameterMap::new())
            .await
            .unwrap();

        assert_eq!(run.outcome, TaskOutcome::Action);
        assert_eq!(planner.call_count(), 2);
        assert_eq!(page.clicks("#btn"), 1);
        // 失败的调用也收到了对应结果
        assert!(run.transcript[0].value.is_err());
        assert_eq!(run.trace.len(), 2);
    }

    #[tokio::test]
    async fn test_execution_failure_fed_back() {
        let exec = executor(Arc::new(MockPage::new("")));
        let planner = MockPlanner::new(vec![
            MockPlanner::turn(vec![("locateElement", json!({ "cssSelector": "#gone" }))]),
            MockPlanner::turn(vec![(
                "resultError",
                json!({ "errorMessage": "element is missing" }),
            )]),
        ]);

        let run = PlannerSession::new(&planner, &exec, session_config())
            .run("click the missing thing", &ParameterMap::new())
            .await
            .unwrap();

        assert_eq!(
            run.outcome,
            TaskOutcome::Failed("element is missing".to_string())
        );
        assert!(run.transcript[0].value.is_err());
    }

    #[tokio::test]
    async fn test_unknown_action_is_fatal() {
        let exec = executor(Arc::new(MockPage::new("")));
        let planner = MockPlanner::new(vec![MockPlanner::turn(vec![(
            "definitely_not_registered",
            json!({}),
        )])]);

        let err = PlannerSession::new(&planner, &exec, session_config())
            .run("try something odd", &ParameterMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_turn_cap_yields_no_result() {
        let exec = executor(Arc::new(MockPage::new("").with_element(MockElement::new("#b"))));
        let mut turns = Vec::new();
        for _ in 0..30 {
            turns.push(MockPlanner::turn(vec![(
                "locateElement",
                json!({ "cssSelector": "#b" }),
            )]));
        }
        let planner = MockPlanner::new(turns);

        let config = SessionConfig {
            max_turns: 3,
            debug: false,
        };
        let exec_session = PlannerSession::new(&planner, &exec, config);
        let err = exec_session
            .run("loop forever", &ParameterMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NoResult));
        assert_eq!(planner.call_count(), 3);
    }
}
