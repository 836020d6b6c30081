//! 提示词拼装
//!
//! 大部分行为约束由工具定义里的参数描述承载，提示词本身保持简短：
//! system 固定约束，user 携带任务文本与页面快照。

/// 固定 system 提示词
pub const SYSTEM_PROMPT: &str = "\
You are operating a web page through the provided functions.

* When creating CSS selectors, ensure they are unique and specific enough to select only one element, even if there are multiple elements of the same type (like multiple h1 elements).
* Avoid using generic tags like 'h1' alone. Instead, combine them with other attributes or structural relationships to form a unique selector.
* You must not derive data from the page if you are able to do so by using one of the provided functions, e.g. locator_evaluate.
* After you complete the task, you MUST call one of the result functions:
  - Call resultAction() if you were asked to perform an action (like clicking or selecting an option)
  - Call resultQuery() with the extracted data if you were asked to extract information
  - Call resultAssertion() if you were asked to check or verify something";

/// 拼装任务提示词：任务文本 + 围栏内的页面快照
pub fn build_task_prompt(task: &str, snapshot: &str) -> String {
    format!(
        "This is your task: {}\n\nWebpage snapshot:\n\n```\n{}\n```\n",
        task, snapshot
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_task_and_snapshot() {
        let prompt = build_task_prompt("get the header text", "<h1>Hello</h1>");
        assert!(prompt.contains("get the header text"));
        assert!(prompt.contains("<h1>Hello</h1>"));
    }
}
