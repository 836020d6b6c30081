//! 回放引擎
//!
//! 不触网、不调规划器：按记录顺序（轮序、轮内序）逐一调度缓存轨迹中的调用，
//! 重建与实时运行同构的调用/结果转写。回放是 (轨迹, 注册表) 加页面当前状态的
//! 纯函数，但页面自身的状态累积会影响后续结果：对同一页面重复回放点击轨迹，
//! 计数器会继续增长，回放不保证幂等。
//!
//! 回放没有规划器兜底，任何调度失败都终结本次运行。

use tracing::debug;

use crate::actions::{ActionExecutor, ActionRegistry};
use crate::cache::Trace;
use crate::core::TaskError;
use crate::task::outcome::{outcome_from_invocation, TaskOutcome};
use crate::task::session::InvocationResult;

/// 回放产出
#[derive(Debug)]
pub struct ReplayRun {
    pub outcome: TaskOutcome,
    pub transcript: Vec<InvocationResult>,
}

/// 预检轨迹：所有调用名必须在当前注册表中
///
/// 接受缓存命中前调用；不通过则把该条目当作未命中、回落到实时规划。
pub fn validate_trace(trace: &Trace, registry: &ActionRegistry) -> Result<(), TaskError> {
    for turn in trace {
        for invocation in turn {
            if !registry.contains(&invocation.name) {
                return Err(TaskError::UnknownAction(invocation.name.clone()));
            }
        }
    }
    Ok(())
}

/// 回放一条轨迹（参数替换已在缓存读取时完成）
pub async fn replay_trace(
    trace: &Trace,
    executor: &ActionExecutor,
) -> Result<ReplayRun, TaskError> {
    let mut transcript = Vec::new();
    let mut outcome: Option<TaskOutcome> = None;

    for turn in trace {
        for invocation in turn {
            debug!(action = %invocation.name, "replaying invocation");
            let value = executor
                .dispatch(&invocation.name, &invocation.arguments)
                .await?;
            if outcome.is_none() {
                outcome = outcome_from_invocation(&invocation.name, &invocation.arguments)?;
            }
            transcript.push(InvocationResult {
                invocation: invocation.clone(),
                value: Ok(value),
            });
        }
    }

    let outcome = outcome.ok_or(TaskError::NoResult)?;
    Ok(ReplayRun {
        outcome,
        transcript,
    })
}
