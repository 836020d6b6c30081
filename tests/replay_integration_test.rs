//! 录制 / 缓存 / 回放集成测试

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use anyhow::Result;
    use serde_json::json;

    use webpilot::cache::fingerprint;
    use webpilot::llm::MockPlanner;
    use webpilot::page::{MockElement, MockPage};
    use webpilot::{AutoAgent, ParameterMap, RunOptions, TaskError, TaskOutcome};

    fn header_page() -> Arc<MockPage> {
        Arc::new(
            MockPage::new("<h1>Hello, Rayrun!</h1>")
                .with_element(MockElement::new("h1").tag("h1").text("Hello, Rayrun!")),
        )
    }

    /// 取头部文本的脚本：单轮三连调用，以 resultQuery 终结
    fn header_query_turns() -> Vec<webpilot::llm::PlannerTurn> {
        vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "h1" })),
            ("locator_innerText", json!({ "elementId": "el-1" })),
            ("resultQuery", json!({ "query": "Hello, Rayrun!" })),
        ])]
    }

    #[tokio::test]
    async fn test_query_task_records_then_replays_without_planner() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let task = "get the header text";

        // 实时规划：记录单轮轨迹并落盘
        let planner = Arc::new(MockPlanner::new(header_query_turns()));
        let agent = AutoAgent::new(planner.clone());
        let outcome = agent.run(task, header_page(), &options).await?;
        assert_eq!(outcome, TaskOutcome::Query("Hello, Rayrun!".to_string()));
        assert_eq!(planner.call_count(), 1);

        let cache_file = cache_dir
            .path()
            .join(format!("{}.json", fingerprint(task, None)));
        assert!(cache_file.exists());

        // 同一任务再次执行：命中缓存，规划器零调用
        let idle_planner = Arc::new(MockPlanner::new(vec![]));
        let cached_agent = AutoAgent::new(idle_planner.clone());
        let outcome = cached_agent.run(task, header_page(), &options).await?;
        assert_eq!(outcome, TaskOutcome::Query("Hello, Rayrun!".to_string()));
        assert_eq!(idle_planner.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_parameter_substitution_reversible() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let task = "type the username into the search box";

        let record_page = Arc::new(
            MockPage::new("<input data-testid=\"search-input\">")
                .with_element(MockElement::new("#search").tag("input")),
        );
        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "#search" })),
            ("locator_fill", json!({ "elementId": "el-1", "value": "Alice" })),
            ("resultAction", json!({})),
        ])]));
        let params = ParameterMap::from([("username".to_string(), "Alice".to_string())]);

        let agent = AutoAgent::new(planner);
        let outcome = agent
            .run_task(task, record_page.clone(), &options, &params)
            .await?;
        assert_eq!(outcome, TaskOutcome::Action);
        assert_eq!(record_page.element("#search").unwrap().value, "Alice");

        // 落盘的轨迹存的是占位符，不是字面量
        let cache_file = cache_dir
            .path()
            .join(format!("{}.json", fingerprint(task, None)));
        let body = fs::read_to_string(&cache_file)?;
        assert!(body.contains("@{username}"));
        assert!(!body.contains("Alice"));

        // 换参数回放：同一录制代入 Bob
        let replay_page = Arc::new(
            MockPage::new("<input data-testid=\"search-input\">")
                .with_element(MockElement::new("#search").tag("input")),
        );
        let idle_planner = Arc::new(MockPlanner::new(vec![]));
        let replay_agent = AutoAgent::new(idle_planner.clone());
        let bob = ParameterMap::from([("username".to_string(), "Bob".to_string())]);
        let outcome = replay_agent
            .run_task(task, replay_page.clone(), &options, &bob)
            .await?;
        assert_eq!(outcome, TaskOutcome::Action);
        assert_eq!(replay_page.element("#search").unwrap().value, "Bob");
        assert_eq!(idle_planner.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_named_cache_file_holds_multiple_tasks() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            cache_name: Some("smoke flows".to_string()),
            ..RunOptions::default()
        };

        let first_task = "get the header text";
        let agent = AutoAgent::new(Arc::new(MockPlanner::new(header_query_turns())));
        agent.run(first_task, header_page(), &options).await?;

        let second_task = "click the increment button";
        let click_page = Arc::new(MockPage::new("").with_element(MockElement::new("#inc")));
        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "#inc" })),
            ("locator_click", json!({ "elementId": "el-1" })),
            ("resultAction", json!({})),
        ])]));
        AutoAgent::new(planner)
            .run(second_task, click_page, &options)
            .await?;

        // 空白转下划线的共享文件里两个条目并存
        let cache_file = cache_dir.path().join("smoke_flows.json");
        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&cache_file)?)?;
        let entries = parsed.as_object().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains_key(&fingerprint(first_task, Some("smoke flows"))));
        assert!(entries.contains_key(&fingerprint(second_task, Some("smoke flows"))));

        // 首个任务仍可无规划器回放
        let idle_planner = Arc::new(MockPlanner::new(vec![]));
        let outcome = AutoAgent::new(idle_planner.clone())
            .run(first_task, header_page(), &options)
            .await?;
        assert_eq!(outcome, TaskOutcome::Query("Hello, Rayrun!".to_string()));
        assert_eq!(idle_planner.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_replay_accumulates_page_state() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let task = "click the increment button";
        let page = Arc::new(MockPage::new("").with_element(MockElement::new("#inc")));

        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "#inc" })),
            ("locator_click", json!({ "elementId": "el-1" })),
            ("resultAction", json!({})),
        ])]));
        let agent = AutoAgent::new(planner.clone());

        agent.run(task, page.clone(), &options).await?;
        assert_eq!(page.clicks("#inc"), 1);
        // 两次缓存命中回放：计数继续累积，规划器只被实时那次用过
        agent.run(task, page.clone(), &options).await?;
        agent.run(task, page.clone(), &options).await?;
        assert_eq!(page.clicks("#inc"), 3);
        assert_eq!(planner.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_assertion_task_outcome() -> Result<()> {
        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![
            ("locateElement", json!({ "cssSelector": "h1" })),
            ("locator_innerText", json!({ "elementId": "el-1" })),
            (
                "expect_toBe",
                json!({ "actual": "Hello, Rayrun!", "expected": "Hello, Rayrun!" }),
            ),
            ("resultAssertion", json!({ "assertion": true })),
        ])]));

        let outcome = AutoAgent::new(planner)
            .run(
                "is the header equal to \"Hello, Rayrun!\"?",
                header_page(),
                &RunOptions::default(),
            )
            .await?;
        assert_eq!(outcome.assertion(), Some(true));
        Ok(())
    }

    #[tokio::test]
    async fn test_result_error_classified_as_failure() -> Result<()> {
        let planner = Arc::new(MockPlanner::new(vec![MockPlanner::turn(vec![(
            "resultError",
            json!({ "errorMessage": "no such control on this page" }),
        )])]));

        let outcome = AutoAgent::new(planner)
            .run(
                "press the nonexistent button",
                Arc::new(MockPage::new("")),
                &RunOptions::default(),
            )
            .await?;
        assert_eq!(
            outcome,
            TaskOutcome::Failed("no such control on this page".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_cache_file_fails_loudly() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let task = "get the header text";
        fs::write(
            cache_dir
                .path()
                .join(format!("{}.json", fingerprint(task, None))),
            "{ this is not json",
        )?;

        let planner = Arc::new(MockPlanner::new(header_query_turns()));
        let err = AutoAgent::new(planner.clone())
            .run(task, header_page(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::CacheCorruption { .. }));
        // 损坏的缓存不允许静默重建
        assert_eq!(planner.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_trace_falls_back_to_live_plan() -> Result<()> {
        let cache_dir = tempfile::tempdir()?;
        let options = RunOptions {
            cache_path: Some(cache_dir.path().to_path_buf()),
            ..RunOptions::default()
        };
        let task = "get the header text";
        let fp = fingerprint(task, None);

        // 手写一条引用未知动作的过期轨迹
        let mut stale = serde_json::Map::new();
        stale.insert(
            fp.clone(),
            json!({
                "fingerprint": fp,
                "trace": [[ { "name": "locator_hover", "arguments": "{}" } ]],
            }),
        );
        fs::write(
            cache_dir.path().join(format!("{}.json", fp)),
            serde_json::to_string_pretty(&stale)?,
        )?;

        let planner = Arc::new(MockPlanner::new(header_query_turns()));
        let outcome = AutoAgent::new(planner.clone())
            .run(task, header_page(), &options)
            .await?;
        assert_eq!(outcome, TaskOutcome::Query("Hello, Rayrun!".to_string()));
        assert_eq!(planner.call_count(), 1);

        // 实时规划完成后旧条目被新轨迹覆盖
        let body = fs::read_to_string(cache_dir.path().join(format!("{}.json", fp)))?;
        assert!(!body.contains("locator_hover"));
        assert!(body.contains("locator_innerText"));
        Ok(())
    }
}
