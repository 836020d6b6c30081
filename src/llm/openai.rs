//! OpenAI 兼容 API 规划器
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url），走原生 tools 协议：
//! 工具定义随请求下发，模型以 tool_calls 形式返回本轮选择的调用。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionTools,
    CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::LlmSection;
use crate::llm::{ChatMessage, PlannedCall, PlannerClient, PlannerTurn, ToolSpec};

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容规划器：持有 Client 与 model 名
pub struct OpenAiPlanner {
    client: Client<OpenAIConfig>,
    model: String,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiPlanner {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            usage: TokenUsage::new(),
        }
    }

    /// 按 [llm] 配置段构造（API Key 从配置指定的环境变量读取）
    pub fn from_config(section: &LlmSection) -> Self {
        let api_key = std::env::var(&section.api_key_env).ok();
        Self::new(section.base_url.as_deref(), &section.model, api_key.as_deref())
    }

    fn to_openai_messages(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>, String> {
        messages
            .iter()
            .map(|m| match m {
                ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::System)
                    .map_err(|e| e.to_string()),
                ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::User)
                    .map_err(|e| e.to_string()),
                ChatMessage::Assistant { content, calls } => {
                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(text) = content {
                        builder.content(text.clone());
                    }
                    if !calls.is_empty() {
                        let tool_calls: Vec<ChatCompletionMessageToolCalls> = calls
                            .iter()
                            .map(|c| {
                                ChatCompletionMessageToolCalls::Function(
                                    ChatCompletionMessageToolCall {
                                        id: c.id.clone(),
                                        function: FunctionCall {
                                            name: c.name.clone(),
                                            arguments: c.arguments.clone(),
                                        },
                                    },
                                )
                            })
                            .collect();
                        builder.tool_calls(tool_calls);
                    }
                    builder
                        .build()
                        .map(ChatCompletionRequestMessage::Assistant)
                        .map_err(|e| e.to_string())
                }
                ChatMessage::ToolResult { call_id, content } => {
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.clone())
                        .content(content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::Tool)
                        .map_err(|e| e.to_string())
                }
            })
            .collect()
    }

    fn to_openai_tools(&self, tools: &[ToolSpec]) -> Result<Vec<ChatCompletionTools>, String> {
        tools
            .iter()
            .map(|t| {
                let function = FunctionObjectArgs::default()
                    .name(t.name.clone())
                    .description(t.description.clone())
                    .parameters(t.parameters.clone())
                    .build()
                    .map_err(|e| e.to_string())?;
                Ok(ChatCompletionTools::Function(ChatCompletionTool {
                    function,
                }))
            })
            .collect()
    }
}

#[async_trait]
impl PlannerClient for OpenAiPlanner {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn next_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<PlannerTurn, String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages)?)
            .tools(self.to_openai_tools(tools)?)
            .build()
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "empty choices in completion response".to_string())?;

        let calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(call) => PlannedCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                },
                ChatCompletionMessageToolCalls::Custom(call) => PlannedCall {
                    id: call.id,
                    name: call.custom_tool.name,
                    arguments: call.custom_tool.input,
                },
            })
            .collect();

        Ok(PlannerTurn {
            content: choice.message.content,
            calls,
        })
    }
}
