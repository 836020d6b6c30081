//! 缓存数据模型与参数替换
//!
//! 缓存文件为 UTF-8 JSON：指纹 → { fingerprint, trace }。trace 按轮分组、轮内有序，
//! 每项为 { name, arguments }，arguments 是调用参数的 JSON 字符串
//! （调用方字面量处可含 `@{key}` 占位符）。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 规划器选择的一次工具调用（名称 + JSON 字符串参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

/// 一次任务的可回放调用轨迹：外层按助手轮分组，每轮至少一次调用
pub type Trace = Vec<Vec<ToolInvocation>>;

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub trace: Trace,
}

/// 缓存文件：一个文件可容纳多个任务的条目
pub type CacheFile = BTreeMap<String, CacheEntry>;

/// 参数表：占位符键 → 本次运行的具体值（BTreeMap 保证替换顺序稳定）
pub type ParameterMap = BTreeMap<String, String>;

/// 文本级参数替换：把每个 `@{key}` 的所有出现替换为对应值
///
/// 在解析缓存 JSON 之前执行，因此对任意字段生效。若某个值恰好与无关字段
/// 的内容相同则会被一并替换，这是文本替换的已知代价。
pub fn substitute_parameters(raw: &str, params: &ParameterMap) -> String {
    let mut text = raw.to_string();
    for (key, value) in params {
        text = text.replace(&format!("@{{{}}}", key), value);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_every_occurrence() {
        let params = ParameterMap::from([("name".to_string(), "Alice".to_string())]);
        let raw = r#"{"value":"@{name}","note":"hi @{name}"}"#;
        assert_eq!(
            substitute_parameters(raw, &params),
            r#"{"value":"Alice","note":"hi Alice"}"#
        );
    }

    #[test]
    fn test_substitute_unknown_placeholder_untouched() {
        let params = ParameterMap::from([("name".to_string(), "Alice".to_string())]);
        let raw = r#"{"value":"@{other}"}"#;
        assert_eq!(substitute_parameters(raw, &params), raw);
    }

    #[test]
    fn test_cache_file_round_trip() {
        let mut file = CacheFile::new();
        file.insert(
            "fp".to_string(),
            CacheEntry {
                fingerprint: "fp".to_string(),
                trace: vec![vec![ToolInvocation {
                    name: "locator_click".to_string(),
                    arguments: r#"{"elementId":"el-1"}"#.to_string(),
                }]],
            },
        );
        let body = serde_json::to_string_pretty(&file).unwrap();
        let parsed: CacheFile = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, file);
    }
}
