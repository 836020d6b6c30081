//! 任务入口
//!
//! run_task 串起完整链路：指纹 -> 缓存查找 ->（命中）预检并回放 /（未命中）
//! 实时规划并录制 -> 落盘。动作注册表按任务构建、跟随页面会话，任务返回即丢弃；
//! 缓存条目只在实时规划完整结束后写入一次。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::actions::{build_registry, ActionExecutor};
use crate::cache::{fingerprint, substitute_parameters, CacheStore, ParameterMap};
use crate::config::{AppConfig, TaskSection};
use crate::core::TaskError;
use crate::llm::{OpenAiPlanner, PlannerClient};
use crate::page::Page;
use crate::task::{
    build_task_prompt, replay_trace, validate_trace, PlannerSession, SessionConfig, TaskOutcome,
};

/// 单次任务执行选项
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 缓存目录；设置后启用查找与写入。目录必须已存在，不会自动创建
    pub cache_path: Option<PathBuf>,
    /// 人类可读的缓存文件名（文件内部仍按指纹键控）
    pub cache_name: Option<String>,
    /// 调试开关：以 info 级别记录每轮规划输出与工具结果，默认 false
    pub debug: bool,
}

/// 网页自动化智能体：持有规划器与任务限额，跨任务复用
pub struct AutoAgent {
    planner: Arc<dyn PlannerClient>,
    task_config: TaskSection,
}

impl AutoAgent {
    pub fn new(planner: Arc<dyn PlannerClient>) -> Self {
        Self {
            planner,
            task_config: TaskSection::default(),
        }
    }

    /// 覆盖任务限额（长度上限、动作超时、轮数上限）
    pub fn with_task_config(mut self, task_config: TaskSection) -> Self {
        self.task_config = task_config;
        self
    }

    /// 按应用配置构造（规划器走 OpenAI 兼容端点）
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            planner: Arc::new(OpenAiPlanner::from_config(&config.llm)),
            task_config: config.task.clone(),
        }
    }

    /// 规划器累计 token 统计 (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.planner.token_usage()
    }

    /// 执行任务（无运行时参数的便捷入口）
    pub async fn run(
        &self,
        task: &str,
        page: Arc<dyn Page>,
        options: &RunOptions,
    ) -> Result<TaskOutcome, TaskError> {
        self.run_task(task, page, options, &ParameterMap::new()).await
    }

    /// 执行任务
    ///
    /// 指纹基于原始任务文本（含占位符）计算；params 在提示词拼装前代入任务文本，
    /// 在缓存读取时代入轨迹，在录制时反向模板化 locator_fill 的参数。
    pub async fn run_task(
        &self,
        task: &str,
        page: Arc<dyn Page>,
        options: &RunOptions,
        params: &ParameterMap,
    ) -> Result<TaskOutcome, TaskError> {
        let length = task.chars().count();
        if length > self.task_config.max_task_chars {
            return Err(TaskError::TaskTooLong {
                length,
                max: self.task_config.max_task_chars,
            });
        }

        let run_id = uuid::Uuid::new_v4();
        let task_fingerprint = fingerprint(task, options.cache_name.as_deref());
        info!(%run_id, fingerprint = %task_fingerprint, "task started");
        let executor = ActionExecutor::new(
            build_registry(page.clone()),
            self.task_config.action_timeout_secs,
        );

        let store = match &options.cache_path {
            Some(root) => Some(CacheStore::open(root)?),
            None => None,
        };

        if let Some(store) = &store {
            if let Some(entry) =
                store.lookup(&task_fingerprint, options.cache_name.as_deref(), params)?
            {
                match validate_trace(&entry.trace, executor.registry()) {
                    Ok(()) => {
                        info!(fingerprint = %task_fingerprint, "replaying cached trace");
                        let run = replay_trace(&entry.trace, &executor).await?;
                        return Ok(run.outcome);
                    }
                    Err(e) => {
                        // 过期轨迹引用了现已不存在的动作：回落到实时规划，完成后覆盖
                        warn!(fingerprint = %task_fingerprint, error = %e, "cached trace is stale, planning live");
                    }
                }
            }
        }

        let live_task = substitute_parameters(task, params);
        let snapshot = page.snapshot().await.map_err(|e| TaskError::Execution {
            action: "snapshot".to_string(),
            message: e.to_string(),
        })?;
        let prompt = build_task_prompt(&live_task, &snapshot);

        let session = PlannerSession::new(
            self.planner.as_ref(),
            &executor,
            SessionConfig {
                max_turns: self.task_config.max_turns,
                debug: options.debug,
            },
        );
        let run = session.run(&prompt, params).await?;

        if let Some(store) = &store {
            store.save(&task_fingerprint, options.cache_name.as_deref(), &run.trace)?;
        }

        Ok(run.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockPlanner;
    use crate::page::MockPage;
    use serde_json::json;

    #[tokio::test]
    async fn test_task_length_ceiling() {
        let agent = AutoAgent::new(Arc::new(MockPlanner::new(vec![]))).with_task_config(
            TaskSection {
                max_task_chars: 10,
                ..TaskSection::default()
            },
        );
        let err = agent
            .run(
                "this task is far longer than ten characters",
                Arc::new(MockPage::new("")),
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::TaskTooLong { .. }));
    }

    #[tokio::test]
    async fn test_missing_cache_path_fails_before_planning() {
        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![(
            "resultAction",
            json!({}),
        )])]));
        let agent = AutoAgent::new(planner.clone());
        let options = RunOptions {
            cache_path: Some(PathBuf::from("/tmp/webpilot-missing-cache-dir")),
            ..RunOptions::default()
        };

        let err = agent
            .run("click the button", Arc::new(MockPage::new("")), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Config(_)));
        assert_eq!(planner.call_count(), 0);
    }
}
