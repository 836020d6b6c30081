//! 轨迹记录器
//!
//! 实时规划过程中逐轮捕获工具调用，产出可回放轨迹。locator_fill 的参数内嵌
//! 调用方字面量：记录前把参数值的每处出现替换为 `@{key}` 占位符，使同一录制
//! 在回放时可代入不同参数值。其余调用原样记录。
//!
//! 文本替换的已知局限：若某参数值恰好也是 fill 参数中无关内容的子串，
//! 会被一并模板化。

use crate::actions::LOCATOR_FILL;
use crate::cache::{ParameterMap, ToolInvocation, Trace};

/// 轨迹记录器：一次实时规划一个实例
#[derive(Debug, Default)]
pub struct TraceRecorder {
    turns: Trace,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一轮调用（空轮不记录；轮内顺序与规划器给出的顺序一致）
    pub fn record_turn(&mut self, invocations: &[ToolInvocation], params: &ParameterMap) {
        if invocations.is_empty() {
            return;
        }
        let turn = invocations
            .iter()
            .map(|inv| {
                let arguments = if inv.name == LOCATOR_FILL {
                    template_fill_arguments(&inv.arguments, params)
                } else {
                    inv.arguments.clone()
                };
                ToolInvocation {
                    name: inv.name.clone(),
                    arguments,
                }
            })
            .collect();
        self.turns.push(turn);
    }

    /// 已记录的轮数
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn finish(self) -> Trace {
        self.turns
    }
}

/// 把参数值的每处出现替换为 `@{key}`；空值跳过（空串替换会撕碎参数文本）
fn template_fill_arguments(arguments: &str, params: &ParameterMap) -> String {
    let mut out = arguments.to_string();
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        out = out.replace(value.as_str(), &format!("@{{{}}}", key));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(name: &str, arguments: &str) -> ToolInvocation {
        ToolInvocation {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_fill_arguments_templated() {
        let mut recorder = TraceRecorder::new();
        let params = ParameterMap::from([("username".to_string(), "Alice".to_string())]);
        recorder.record_turn(
            &[invocation(
                "locator_fill",
                r#"{"elementId":"el-1","value":"Alice"}"#,
            )],
            &params,
        );

        let trace = recorder.finish();
        assert_eq!(
            trace[0][0].arguments,
            r#"{"elementId":"el-1","value":"@{username}"}"#
        );
    }

    #[test]
    fn test_other_invocations_recorded_verbatim() {
        let mut recorder = TraceRecorder::new();
        let params = ParameterMap::from([("q".to_string(), "Alice".to_string())]);
        recorder.record_turn(
            &[invocation("resultQuery", r#"{"query":"Alice"}"#)],
            &params,
        );

        let trace = recorder.finish();
        assert_eq!(trace[0][0].arguments, r#"{"query":"Alice"}"#);
    }

    #[test]
    fn test_every_occurrence_templated() {
        let mut recorder = TraceRecorder::new();
        let params = ParameterMap::from([("v".to_string(), "abc".to_string())]);
        recorder.record_turn(
            &[invocation(
                "locator_fill",
                r#"{"elementId":"abc","value":"abc"}"#,
            )],
            &params,
        );

        let trace = recorder.finish();
        assert_eq!(
            trace[0][0].arguments,
            r#"{"elementId":"@{v}","value":"@{v}"}"#
        );
    }

    #[test]
    fn test_empty_parameter_value_skipped() {
        let mut recorder = TraceRecorder::new();
        let params = ParameterMap::from([("v".to_string(), String::new())]);
        let raw = r#"{"elementId":"el-1","value":"x"}"#;
        recorder.record_turn(&[invocation("locator_fill", raw)], &params);

        let trace = recorder.finish();
        assert_eq!(trace[0][0].arguments, raw);
    }

    #[test]
    fn test_empty_turn_not_recorded() {
        let mut recorder = TraceRecorder::new();
        recorder.record_turn(&[], &ParameterMap::new());
        assert_eq!(recorder.turn_count(), 0);
    }

    #[test]
    fn test_turn_grouping_preserved() {
        let mut recorder = TraceRecorder::new();
        let params = ParameterMap::new();
        recorder.record_turn(
            &[
                invocation("locateElement", r#"{"cssSelector":"h1"}"#),
                invocation("locator_innerText", r#"{"elementId":"el-1"}"#),
            ],
            &params,
        );
        recorder.record_turn(&[invocation("resultAction", "{}")], &params);

        let trace = recorder.finish();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].len(), 2);
        assert_eq!(trace[1].len(), 1);
    }
}
