//! 元素操作动作
//!
//! 全部以 elementId 引用此前打标的元素；只读动作以查询名作为结果键
//! （innerText / attributeValue 等），交互动作统一返回 { success: true }。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::actions::registry::{parse_args, schema_of, Action, ActionFailure, ActionRegistry};
use crate::page::Page;

/// locator_fill 的动作名：轨迹录制时只有该动作的参数做占位符模板化
pub const LOCATOR_FILL: &str = "locator_fill";

pub(crate) fn register(registry: &mut ActionRegistry, page: &Arc<dyn Page>) {
    registry.register(PressKeyAction { page: page.clone() });
    registry.register(EvaluateAction { page: page.clone() });
    registry.register(GetAttributeAction { page: page.clone() });
    registry.register(InnerHtmlAction { page: page.clone() });
    registry.register(InnerTextAction { page: page.clone() });
    registry.register(TextContentAction { page: page.clone() });
    registry.register(InputValueAction { page: page.clone() });
    registry.register(BlurAction { page: page.clone() });
    registry.register(BoundingBoxAction { page: page.clone() });
    registry.register(CheckAction { page: page.clone() });
    registry.register(UncheckAction { page: page.clone() });
    registry.register(IsCheckedAction { page: page.clone() });
    registry.register(IsEditableAction { page: page.clone() });
    registry.register(IsEnabledAction { page: page.clone() });
    registry.register(IsVisibleAction { page: page.clone() });
    registry.register(ClearAction { page: page.clone() });
    registry.register(ClickAction { page: page.clone() });
    registry.register(CountAction { page: page.clone() });
    registry.register(FillAction { page: page.clone() });
    registry.register(SelectOptionAction { page: page.clone() });
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ElementArgs {
    element_id: String,
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PressKeyArgs {
    element_id: String,
    /// The name of the key to press, e.g., 'Enter', 'ArrowUp', 'a'.
    key: String,
}

/// locator_pressKey：在元素聚焦状态下按键
pub struct PressKeyAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for PressKeyAction {
    fn name(&self) -> &str {
        "locator_pressKey"
    }

    fn description(&self) -> &str {
        "Presses a key while focused on the specified element."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<PressKeyArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: PressKeyArgs = parse_args(args)?;
        self.page.press(&args.element_id, &args.key).await?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct EvaluateArgs {
    element_id: String,
    /// Function to be evaluated in the page context, e.g. node => node.innerText
    page_function: String,
}

/// locator_evaluate：对元素执行页面脚本
pub struct EvaluateAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for EvaluateAction {
    fn name(&self) -> &str {
        "locator_evaluate"
    }

    fn description(&self) -> &str {
        "Execute JavaScript code in the page, taking the matching element as an argument."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<EvaluateArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: EvaluateArgs = parse_args(args)?;
        let result = self
            .page
            .evaluate(&args.element_id, &args.page_function)
            .await?;
        Ok(json!({ "result": result }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GetAttributeArgs {
    element_id: String,
    attribute_name: String,
}

/// locator_getAttribute：读取元素属性
pub struct GetAttributeAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for GetAttributeAction {
    fn name(&self) -> &str {
        "locator_getAttribute"
    }

    fn description(&self) -> &str {
        "Returns the matching element's attribute value."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<GetAttributeArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: GetAttributeArgs = parse_args(args)?;
        let value = self
            .page
            .get_attribute(&args.element_id, &args.attribute_name)
            .await?;
        Ok(json!({ "attributeValue": value }))
    }
}

/// locator_innerHTML
pub struct InnerHtmlAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for InnerHtmlAction {
    fn name(&self) -> &str {
        "locator_innerHTML"
    }

    fn description(&self) -> &str {
        "Returns the element.innerHTML."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let html = self.page.inner_html(&args.element_id).await?;
        Ok(json!({ "innerHTML": html }))
    }
}

/// locator_innerText
pub struct InnerTextAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for InnerTextAction {
    fn name(&self) -> &str {
        "locator_innerText"
    }

    fn description(&self) -> &str {
        "Returns the element.innerText."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let text = self.page.inner_text(&args.element_id).await?;
        Ok(json!({ "innerText": text }))
    }
}

/// locator_textContent
pub struct TextContentAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for TextContentAction {
    fn name(&self) -> &str {
        "locator_textContent"
    }

    fn description(&self) -> &str {
        "Returns the node.textContent."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let text = self.page.text_content(&args.element_id).await?;
        Ok(json!({ "textContent": text }))
    }
}

/// locator_inputValue
pub struct InputValueAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for InputValueAction {
    fn name(&self) -> &str {
        "locator_inputValue"
    }

    fn description(&self) -> &str {
        "Returns input.value for the selected <input> or <textarea> or <select> element."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let value = self.page.input_value(&args.element_id).await?;
        Ok(json!({ "inputValue": value }))
    }
}

/// locator_blur：移除键盘焦点
pub struct BlurAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for BlurAction {
    fn name(&self) -> &str {
        "locator_blur"
    }

    fn description(&self) -> &str {
        "Removes keyboard focus from the current element."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        self.page.blur(&args.element_id).await?;
        Ok(json!({ "success": true }))
    }
}

/// locator_boundingBox：元素包围盒（不可见时为 null）
pub struct BoundingBoxAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for BoundingBoxAction {
    fn name(&self) -> &str {
        "locator_boundingBox"
    }

    fn description(&self) -> &str {
        "Returns the bounding box of the element, or null if the element is not visible."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let bounding_box = self.page.bounding_box(&args.element_id).await?;
        Ok(serde_json::to_value(bounding_box).unwrap_or(Value::Null))
    }
}

/// locator_check：确保 checkbox / radio 为勾选状态
pub struct CheckAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for CheckAction {
    fn name(&self) -> &str {
        "locator_check"
    }

    fn description(&self) -> &str {
        "Ensure that checkbox or radio element is checked."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        self.page.set_checked(&args.element_id, true).await?;
        Ok(json!({ "success": true }))
    }
}

/// locator_uncheck
pub struct UncheckAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for UncheckAction {
    fn name(&self) -> &str {
        "locator_uncheck"
    }

    fn description(&self) -> &str {
        "Ensure that checkbox or radio element is unchecked."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        self.page.set_checked(&args.element_id, false).await?;
        Ok(json!({ "success": true }))
    }
}

/// locator_isChecked
pub struct IsCheckedAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for IsCheckedAction {
    fn name(&self) -> &str {
        "locator_isChecked"
    }

    fn description(&self) -> &str {
        "Returns whether the element is checked."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let is_checked = self.page.is_checked(&args.element_id).await?;
        Ok(json!({ "isChecked": is_checked }))
    }
}

/// locator_isEditable
pub struct IsEditableAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for IsEditableAction {
    fn name(&self) -> &str {
        "locator_isEditable"
    }

    fn description(&self) -> &str {
        "Returns whether the element is editable."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let is_editable = self.page.is_editable(&args.element_id).await?;
        Ok(json!({ "isEditable": is_editable }))
    }
}

/// locator_isEnabled
pub struct IsEnabledAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for IsEnabledAction {
    fn name(&self) -> &str {
        "locator_isEnabled"
    }

    fn description(&self) -> &str {
        "Returns whether the element is enabled."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let is_enabled = self.page.is_enabled(&args.element_id).await?;
        Ok(json!({ "isEnabled": is_enabled }))
    }
}

/// locator_isVisible
pub struct IsVisibleAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for IsVisibleAction {
    fn name(&self) -> &str {
        "locator_isVisible"
    }

    fn description(&self) -> &str {
        "Returns whether the element is visible."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let is_visible = self.page.is_visible(&args.element_id).await?;
        Ok(json!({ "isVisible": is_visible }))
    }
}

/// locator_clear：清空输入框
pub struct ClearAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for ClearAction {
    fn name(&self) -> &str {
        "locator_clear"
    }

    fn description(&self) -> &str {
        "Clear the input field."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        self.page.clear(&args.element_id).await?;
        Ok(json!({ "success": true }))
    }
}

/// locator_click
pub struct ClickAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for ClickAction {
    fn name(&self) -> &str {
        "locator_click"
    }

    fn description(&self) -> &str {
        "Click an element."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        self.page.click(&args.element_id).await?;
        Ok(json!({ "success": true }))
    }
}

/// locator_count：打标选择器命中的元素个数
pub struct CountAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for CountAction {
    fn name(&self) -> &str {
        "locator_count"
    }

    fn description(&self) -> &str {
        "Returns the number of elements matching the locator."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ElementArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: ElementArgs = parse_args(args)?;
        let element_count = self.page.count(&args.element_id).await?;
        Ok(json!({ "elementCount": element_count }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct FillArgs {
    element_id: String,
    value: String,
}

/// locator_fill：向输入框写值
///
/// 参数会内嵌调用方字面量，是唯一做录制期占位符模板化的动作。
pub struct FillAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for FillAction {
    fn name(&self) -> &str {
        LOCATOR_FILL
    }

    fn description(&self) -> &str {
        "Set a value to the input field."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<FillArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: FillArgs = parse_args(args)?;
        self.page.fill(&args.element_id, &args.value).await?;
        Ok(json!({ "success": true }))
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct SelectOptionArgs {
    element_id: String,
    /// Option value to select.
    value: Option<String>,
    /// Option label (visible text) to select.
    label: Option<String>,
}

/// locator_selectOption：按 value 或 label 选中下拉选项
pub struct SelectOptionAction {
    pub(crate) page: Arc<dyn Page>,
}

#[async_trait]
impl Action for SelectOptionAction {
    fn name(&self) -> &str {
        "locator_selectOption"
    }

    fn description(&self) -> &str {
        "Selects an option from a <select> element by value or label."
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<SelectOptionArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, ActionFailure> {
        let args: SelectOptionArgs = parse_args(args)?;
        if args.value.is_none() && args.label.is_none() {
            return Err(ActionFailure::InvalidArgs(
                "Either value or label must be provided".to_string(),
            ));
        }
        self.page
            .select_option(&args.element_id, args.value.as_deref(), args.label.as_deref())
            .await?;
        Ok(json!({ "success": true }))
    }
}
