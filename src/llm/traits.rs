//! 规划器客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 PlannerClient：给定会话消息与工具定义，
//! 产出一轮决策（可选文本 + 零或多个工具调用）。工具调用为空即表示规划结束。

use async_trait::async_trait;
use serde_json::Value;

/// 会话消息（按角色标注，记录与回放代码可穷尽匹配）
#[derive(Debug, Clone)]
pub enum ChatMessage {
    System(String),
    User(String),
    /// 助手一轮输出：可附带文本与若干工具调用
    Assistant {
        content: Option<String>,
        calls: Vec<PlannedCall>,
    },
    /// 工具结果：凭 call_id 与对应调用关联
    ToolResult { call_id: String, content: String },
}

/// 规划器请求的单个工具调用（arguments 为 JSON 字符串）
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// 暴露给规划器的工具定义
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 规划器单轮输出
#[derive(Debug, Clone, Default)]
pub struct PlannerTurn {
    pub content: Option<String>,
    pub calls: Vec<PlannedCall>,
}

/// 规划器客户端 trait
#[async_trait]
pub trait PlannerClient: Send + Sync {
    /// 发送会话与工具定义，取回下一轮决策
    async fn next_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<PlannerTurn, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
