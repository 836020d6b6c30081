//! 页面抽象
//!
//! Page trait 覆盖动作注册表需要的全部页面原语：导航、定位打标、交互、读取、等待。
//! 定位类方法给命中的元素打上标记并返回元素 ID，后续 locator_* 动作凭 ID 操作；
//! 一个 Page 实例同一时刻只服务一个任务，页面状态变更不可并行。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 打标后元素的引用 ID
pub type ElementId = String;

/// 页面操作错误：动作执行器将其包装为执行失败回报给调用方
#[derive(Error, Debug)]
pub enum PageError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("script failed: {0}")]
    Script(String),

    #[error("{0}")]
    Other(String),
}

/// 元素包围盒（视口坐标）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 页面操作接口
///
/// 滚动、等待类方法内部须自行超时并返回结构化失败，不允许无限挂起。
#[async_trait]
pub trait Page: Send + Sync {
    /// 返回页面 DOM 快照文本（供规划器理解页面）
    async fn snapshot(&self) -> Result<String, PageError>;

    async fn goto(&self, url: &str) -> Result<(), PageError>;

    /// 用 CSS 选择器定位首个元素并打标
    async fn locate_first(&self, css_selector: &str) -> Result<ElementId, PageError>;

    /// 按 ARIA 角色定位所有元素并打标
    async fn locate_by_role(&self, role: &str, exact: bool) -> Result<Vec<ElementId>, PageError>;

    /// 按可见文本定位所有元素并打标（隐藏元素不计）
    async fn locate_by_text(&self, text: &str, exact: bool) -> Result<Vec<ElementId>, PageError>;

    async fn click(&self, id: &str) -> Result<(), PageError>;

    async fn fill(&self, id: &str, value: &str) -> Result<(), PageError>;

    async fn clear(&self, id: &str) -> Result<(), PageError>;

    async fn press(&self, id: &str, key: &str) -> Result<(), PageError>;

    /// 全局按键（不聚焦特定元素）
    async fn press_global(&self, key: &str) -> Result<(), PageError>;

    async fn blur(&self, id: &str) -> Result<(), PageError>;

    /// 下拉选择：按 value 或按可见文本 label，返回选中的 value 列表
    async fn select_option(
        &self,
        id: &str,
        value: Option<&str>,
        label: Option<&str>,
    ) -> Result<Vec<String>, PageError>;

    /// 设置 checkbox / radio 的勾选状态
    async fn set_checked(&self, id: &str, checked: bool) -> Result<(), PageError>;

    /// 在页面上下文内对元素执行脚本，返回序列化结果
    async fn evaluate(&self, id: &str, page_function: &str) -> Result<Value, PageError>;

    async fn get_attribute(&self, id: &str, name: &str) -> Result<Option<String>, PageError>;

    async fn inner_html(&self, id: &str) -> Result<String, PageError>;

    async fn inner_text(&self, id: &str) -> Result<String, PageError>;

    async fn text_content(&self, id: &str) -> Result<Option<String>, PageError>;

    async fn input_value(&self, id: &str) -> Result<String, PageError>;

    async fn bounding_box(&self, id: &str) -> Result<Option<BoundingBox>, PageError>;

    async fn is_checked(&self, id: &str) -> Result<bool, PageError>;

    async fn is_editable(&self, id: &str) -> Result<bool, PageError>;

    async fn is_enabled(&self, id: &str) -> Result<bool, PageError>;

    async fn is_visible(&self, id: &str) -> Result<bool, PageError>;

    /// 与标记同源的元素个数（打标选择器命中的数量）
    async fn count(&self, id: &str) -> Result<usize, PageError>;

    /// 可见 DOM 的简化层级结构
    async fn visible_structure(&self) -> Result<Value, PageError>;

    /// 提取元素内可见文本（忽略隐藏节点）
    async fn visible_text_by_id(&self, id: &str) -> Result<String, PageError>;

    /// 按选择器提取所有命中元素的可见文本
    async fn visible_text_by_selector(&self, selector: &str) -> Result<String, PageError>;

    /// 等待选择器（可选文本标记）出现并可见；超时返回 Timeout
    async fn wait_for_selector(
        &self,
        selector: &str,
        text_marker: Option<&str>,
        timeout_ms: u64,
    ) -> Result<(), PageError>;

    async fn scroll_into_view(&self, id: &str, behavior: &str) -> Result<(), PageError>;

    /// 等待网络空闲；超时返回 Timeout
    async fn wait_for_network_idle(&self, timeout_ms: u64, idle_ms: u64) -> Result<(), PageError>;
}
