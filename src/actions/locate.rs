//! 元素发现动作
//!
//! 定位类动作给命中的元素打标并返回元素 ID，供 locator_* 动作后续引用。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::actions::registry::{parse_args, schema_of, Action, ActionFailure, ActionRegistry};
use crate::page::Page;

pub(crate) fn register(registry: &mut ActionRegistry, page: &Arc<dyn Page>) {
    registry.register(LocateElementAction { page: page.clone() });
    registry.register(LocateByRoleAction { page: page.clone() });
    registry.register(LocateWithTextAction { page: page.clone() });
    registry.register(VisibleStructureAction { page: page.clone() });
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct LocateElementArgs {
    css_selector: String,
}

/// locateElement：按 CSS 选择器打标首个元素
pub struct LocateElementAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for LocateElementAction {
    fn name(&self) -> &str {
        "locateElement"
    }

    fn description(&self) -> &str {
        "Locates element using a CSS selector and returns elementId. This element ID can be used with other functions to perform actions on the element."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<LocateElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: LocateElementArgs = parse_args(args)?;
        let element_id = self.page.locate_first(&args.css_selector).await?;
        Ok(json!({ "elementId": element_id }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct LocateByRoleArgs {
    /// ARIA role to search for, e.g. 'button', 'grid', 'row', etc.
    role: String,
    /// Whether to match the role exactly or allow partial matches.
    exact: Option<bool>,
}

/// locateElementsByRole：按 ARIA 角色打标所有元素
pub struct LocateByRoleAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for LocateByRoleAction {
    fn name(&self) -> &str {
        "locateElementsByRole"
    }

    fn description(&self) -> &str {
        "Finds elements by their ARIA role attribute and returns array of element IDs."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<LocateByRoleArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: LocateByRoleArgs = parse_args(args)?;
        let ids = self
            .page
            .locate_by_role(&args.role, args.exact.unwrap_or(false))
            .await?;
        Ok(json!({ "count": ids.len(), "elementIds": ids }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct LocateWithTextArgs {
    /// Text to search for within elements.
    text: String,
    /// Whether to match the text exactly or allow partial matches.
    exact: Option<bool>,
}

/// locateElementsWithText：按可见文本打标所有元素
pub struct LocateWithTextAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for LocateWithTextAction {
    fn name(&self) -> &str {
        "locateElementsWithText"
    }

    fn description(&self) -> &str {
        "Finds visible elements containing specified text and returns array of element IDs. Hidden elements are excluded."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<LocateWithTextArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: LocateWithTextArgs = parse_args(args)?;
        let ids = self
            .page
            .locate_by_text(&args.text, args.exact.unwrap_or(false))
            .await?;
        Ok(json!({ "count": ids.len(), "elementIds": ids }))
    }
}

#[derive(Deserialize, JsonSchema)]
struct NoArgs {}

/// getVisibleStructure：可见 DOM 的简化层级结构
pub struct VisibleStructureAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for VisibleStructureAction {
    fn name(&self) -> &str {
        "getVisibleStructure"
    }

    fn description(&self) -> &str {
        "Returns a simplified hierarchical structure of visible DOM elements, focusing on roles, attributes, and basic content."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<NoArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let _args: NoArgs = parse_args(args)?;
        let structure = self.page.visible_structure().await?;
        Ok(json!({ "structure": structure }))
    }
}
