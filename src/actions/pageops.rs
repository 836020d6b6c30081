//! 页面级动作
//!
//! 导航、全局按键、等待与滚动。等待类动作超时返回 { success: false, error }，
//! 不让失败在等待层变成致命错误（规划器可据此改变策略）。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::actions::registry::{parse_args, schema_of, Action, ActionFailure, ActionRegistry};
use crate::page::{Page, PageError};

const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

pub(crate) fn register(registry: &mut ActionRegistry, page: &Arc<dyn Page>) {
    registry.register(GotoAction { page: page.clone() });
    registry.register(GlobalPressKeyAction { page: page.clone() });
    registry.register(WaitForContentAction { page: page.clone() });
    registry.register(WaitForNetworkIdleAction { page: page.clone() });
    registry.register(ScrollIntoViewAction { page: page.clone() });
    registry.register(ExtractVisibleTextAction { page: page.clone() });
}

#[derive(Deserialize, JsonSchema)]
struct GotoArgs {
    /// The URL to navigate to
    url: String,
}

/// page_goto：导航到指定 URL
pub struct GotoAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for GotoAction {
    fn name(&self) -> &str {
        "page_goto"
    }

    fn description(&self) -> &str {
        "Navigate to the specified URL."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<GotoArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: GotoArgs = parse_args(args)?;
        self.page.goto(&args.url).await?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
struct GlobalPressKeyArgs {
    /// The name of the key to press, e.g., 'Enter', 'ArrowUp', 'a'.
    key: String,
}

/// page_pressKey：页面级全局按键
pub struct GlobalPressKeyAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for GlobalPressKeyAction {
    fn name(&self) -> &str {
        "page_pressKey"
    }

    fn description(&self) -> &str {
        "Presses a key globally on the page."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<GlobalPressKeyArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: GlobalPressKeyArgs = parse_args(args)?;
        self.page.press_global(&args.key).await?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WaitForContentArgs {
    /// CSS selector to wait for.
    selector: String,
    /// Optional text content to wait for within the selector.
    text_marker: Option<String>,
    /// Maximum time to wait in milliseconds. Default is 30000 (30 seconds).
    timeout: Option<u64>,
}

/// waitForContentToLoad：等待动态内容出现
pub struct WaitForContentAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for WaitForContentAction {
    fn name(&self) -> &str {
        "waitForContentToLoad"
    }

    fn description(&self) -> &str {
        "Waits for dynamic content to load based on selector and optional text marker."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<WaitForContentArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: WaitForContentArgs = parse_args(args)?;
        let timeout_ms = args.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS);
        match self
            .page
            .wait_for_selector(&args.selector, args.text_marker.as_deref(), timeout_ms)
            .await
        {
            Ok(()) => Ok(json!({ "success": true })),
            Err(PageError::Timeout(message)) => Ok(json!({
                "success": false,
                "error": format!("Timeout waiting for content to load: {}", message),
            })),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct WaitForNetworkIdleArgs {
    /// Maximum time to wait in milliseconds. Default is 30000 (30 seconds).
    timeout: Option<u64>,
    /// Additional wait time after network becomes idle, in milliseconds.
    idle_time: Option<u64>,
}

/// waitForNetworkIdle：等待网络空闲（SPA 页面）
pub struct WaitForNetworkIdleAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for WaitForNetworkIdleAction {
    fn name(&self) -> &str {
        "waitForNetworkIdle"
    }

    fn description(&self) -> &str {
        "Waits for network activity to be minimal or stopped, useful for SPA applications."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<WaitForNetworkIdleArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: WaitForNetworkIdleArgs = parse_args(args)?;
        let timeout_ms = args.timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS);
        match self
            .page
            .wait_for_network_idle(timeout_ms, args.idle_time.unwrap_or(0))
            .await
        {
            Ok(()) => Ok(json!({ "success": true })),
            Err(PageError::Timeout(message)) => Ok(json!({
                "success": false,
                "error": format!("Timeout waiting for network idle: {}", message),
            })),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum ScrollBehavior {
    Auto,
    Smooth,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ScrollIntoViewArgs {
    /// ID of the element to scroll into view.
    element_id: String,
    /// Scrolling behavior: 'auto' for instant scrolling or 'smooth' for animated scrolling.
    behavior: Option<ScrollBehavior>,
}

/// scrollIntoElementView：滚动元素进入视口
pub struct ScrollIntoViewAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for ScrollIntoViewAction {
    fn name(&self) -> &str {
        "scrollIntoElementView"
    }

    fn description(&self) -> &str {
        "Scrolls to bring an element into view, useful for loading content dynamically as user scrolls."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ScrollIntoViewArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ScrollIntoViewArgs = parse_args(args)?;
        let behavior = match args.behavior {
            Some(ScrollBehavior::Auto) => "auto",
            _ => "smooth",
        };
        self.page.scroll_into_view(&args.element_id, behavior).await?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ExtractVisibleTextArgs {
    /// ID of the element to extract text from.
    element_id: Option<String>,
    /// CSS selector to locate elements for text extraction.
    selector: Option<String>,
}

/// extractVisibleText：提取可见文本（按元素 ID 或按选择器，二选一）
pub struct ExtractVisibleTextAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for ExtractVisibleTextAction {
    fn name(&self) -> &str {
        "extractVisibleText"
    }

    fn description(&self) -> &str {
        "Extracts only visible text from elements, ignoring hidden content."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ExtractVisibleTextArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ExtractVisibleTextArgs = parse_args(args)?;
        let text = match (&args.element_id, &args.selector) {
            (Some(id), _) => self.page.visible_text_by_id(id).await?,
            (None, Some(selector)) => self.page.visible_text_by_selector(selector).await?,
            (None, None) => {
                return Err(ActionFailure::InvalidArgs(
                    "Either elementId or selector must be provided".to_string(),
                ))
            }
        };
        Ok(json!({ "text": text }))
    }
}
