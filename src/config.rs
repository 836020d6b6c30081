//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WEBPILOT__*` 覆盖（双下划线表示嵌套，
//! 如 `WEBPILOT__LLM__MODEL=gpt-4o-mini`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub task: TaskSection,
}

/// [llm] 段：规划器后端与模型选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI 兼容端点；未设置时用官方默认
    pub base_url: Option<String>,
    /// API Key 环境变量名（不把密钥写进配置文件）
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// [task] 段：任务长度上限、单次动作超时、最大规划轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskSection {
    #[serde(default = "default_max_task_chars")]
    pub max_task_chars: usize,
    /// 单次动作调用超时（秒）
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    /// 单次任务内最大模型轮数，防止死循环
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for TaskSection {
    fn default() -> Self {
        Self {
            max_task_chars: default_max_task_chars(),
            action_timeout_secs: default_action_timeout_secs(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_task_chars() -> usize {
    2000
}

fn default_action_timeout_secs() -> u64 {
    30
}

fn default_max_turns() -> usize {
    20
}

/// 从 config 目录加载配置，环境变量 WEBPILOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WEBPILOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WEBPILOT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
