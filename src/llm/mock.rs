//! Mock 规划器（用于测试，无需 API）
//!
//! 按预设脚本逐轮返回工具调用；带调用计数器，测试可断言「缓存命中时模型零调用」。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ChatMessage, PlannedCall, PlannerClient, PlannerTurn, ToolSpec};

/// Mock 客户端：逐轮弹出脚本；脚本耗尽仍被调用则报错
#[derive(Debug, Default)]
pub struct MockPlanner {
    turns: Mutex<VecDeque<PlannerTurn>>,
    calls: AtomicUsize,
}

impl MockPlanner {
    pub fn new(turns: Vec<PlannerTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 已被请求的轮数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 便捷构造：一轮工具调用，call id 按 call-1、call-2 顺序分配
    pub fn turn(calls: Vec<(&str, Value)>) -> PlannerTurn {
        PlannerTurn {
            content: None,
            calls: calls
                .into_iter()
                .enumerate()
                .map(|(i, (name, args))| PlannedCall {
                    id: format!("call-{}", i + 1),
                    name: name.to_string(),
                    arguments: args.to_string(),
                })
                .collect(),
        }
    }

    /// 便捷构造：纯文本轮（无工具调用，循环据此终止）
    pub fn text_turn(content: &str) -> PlannerTurn {
        PlannerTurn {
            content: Some(content.to_string()),
            calls: Vec::new(),
        }
    }
}

#[async_trait]
impl PlannerClient for MockPlanner {
    async fn next_turn(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<PlannerTurn, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "mock planner script exhausted".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_turns() {
        let planner = MockPlanner::new(vec![
            MockPlanner::turn(vec![("locator_click", json!({"elementId": "el-1"}))]),
            MockPlanner::text_turn("done"),
        ]);

        let turn = planner.next_turn(&[], &[]).await.unwrap();
        assert_eq!(turn.calls[0].name, "locator_click");
        let turn = planner.next_turn(&[], &[]).await.unwrap();
        assert!(turn.calls.is_empty());
        assert_eq!(planner.call_count(), 2);
        assert!(planner.next_turn(&[], &[]).await.is_err());
    }
}
