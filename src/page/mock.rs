//! Mock 页面（用于测试，无需浏览器）
//!
//! 元素在构造时声明，打标 ID 按 `el-1`、`el-2` 顺序分配（脚本化测试可预知 ID）；
//! 所有交互写入日志，点击计数保留在元素上，便于断言回放顺序与次数。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::page::{BoundingBox, ElementId, Page, PageError};

/// Mock 元素：选择器即定位键，其余字段模拟 DOM 状态
#[derive(Debug, Clone)]
pub struct MockElement {
    pub selector: String,
    pub tag: String,
    pub text: String,
    pub value: String,
    pub attrs: HashMap<String, String>,
    pub role: Option<String>,
    /// 下拉选项 (value, label)
    pub options: Vec<(String, String)>,
    pub visible: bool,
    pub enabled: bool,
    pub editable: bool,
    pub checked: bool,
    pub click_count: u32,
}

impl MockElement {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag: "div".to_string(),
            text: String::new(),
            value: String::new(),
            attrs: HashMap::new(),
            role: None,
            options: Vec::new(),
            visible: true,
            enabled: true,
            editable: true,
            checked: false,
            click_count: 0,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push((value.into(), label.into()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

#[derive(Debug, Default)]
struct MockPageState {
    html: String,
    elements: Vec<MockElement>,
    /// 元素 ID → elements 下标
    marks: HashMap<ElementId, usize>,
    next_id: usize,
    log: Vec<String>,
}

/// Mock 页面：内存元素表 + 交互日志
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<MockPageState>,
}

impl MockPage {
    pub fn new(html: impl Into<String>) -> Self {
        let page = Self::default();
        page.state.lock().unwrap().html = html.into();
        page
    }

    pub fn with_element(self, element: MockElement) -> Self {
        self.state.lock().unwrap().elements.push(element);
        self
    }

    /// 读取元素当前状态（测试断言用）
    pub fn element(&self, selector: &str) -> Option<MockElement> {
        let state = self.state.lock().unwrap();
        state.elements.iter().find(|e| e.selector == selector).cloned()
    }

    /// 元素累计点击次数
    pub fn clicks(&self, selector: &str) -> u32 {
        self.element(selector).map(|e| e.click_count).unwrap_or(0)
    }

    /// 交互日志（按发生顺序）
    pub fn interactions(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn with_marked<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut MockPageState, usize) -> R,
    ) -> Result<R, PageError> {
        let mut state = self.state.lock().unwrap();
        let index = *state
            .marks
            .get(id)
            .ok_or_else(|| PageError::NotFound(format!("element id {}", id)))?;
        Ok(f(&mut state, index))
    }

    fn mark(state: &mut MockPageState, index: usize) -> ElementId {
        state.next_id += 1;
        let id = format!("el-{}", state.next_id);
        state.marks.insert(id.clone(), index);
        id
    }
}

#[async_trait]
impl Page for MockPage {
    async fn snapshot(&self) -> Result<String, PageError> {
        Ok(self.state.lock().unwrap().html.clone())
    }

    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.state.lock().unwrap().log.push(format!("goto {}", url));
        Ok(())
    }

    async fn locate_first(&self, css_selector: &str) -> Result<ElementId, PageError> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .elements
            .iter()
            .position(|e| e.selector == css_selector)
            .ok_or_else(|| PageError::NotFound(css_selector.to_string()))?;
        Ok(Self::mark(&mut state, index))
    }

    async fn locate_by_role(&self, role: &str, exact: bool) -> Result<Vec<ElementId>, PageError> {
        let mut state = self.state.lock().unwrap();
        let matches: Vec<usize> = state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| match &e.role {
                Some(r) if exact => r == role,
                Some(r) => r.contains(role),
                None => false,
            })
            .map(|(i, _)| i)
            .collect();
        Ok(matches
            .into_iter()
            .map(|i| Self::mark(&mut state, i))
            .collect())
    }

    async fn locate_by_text(&self, text: &str, exact: bool) -> Result<Vec<ElementId>, PageError> {
        let mut state = self.state.lock().unwrap();
        let matches: Vec<usize> = state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.visible && if exact { e.text == text } else { e.text.contains(text) }
            })
            .map(|(i, _)| i)
            .collect();
        Ok(matches
            .into_iter()
            .map(|i| Self::mark(&mut state, i))
            .collect())
    }

    async fn click(&self, id: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            state.elements[i].click_count += 1;
            let entry = format!("click {}", state.elements[i].selector);
            state.log.push(entry);
        })
    }

    async fn fill(&self, id: &str, value: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            state.elements[i].value = value.to_string();
            let entry = format!("fill {} = {}", state.elements[i].selector, value);
            state.log.push(entry);
        })
    }

    async fn clear(&self, id: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            state.elements[i].value.clear();
            let entry = format!("clear {}", state.elements[i].selector);
            state.log.push(entry);
        })
    }

    async fn press(&self, id: &str, key: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            let entry = format!("press {} {}", state.elements[i].selector, key);
            state.log.push(entry);
        })
    }

    async fn press_global(&self, key: &str) -> Result<(), PageError> {
        self.state.lock().unwrap().log.push(format!("press {}", key));
        Ok(())
    }

    async fn blur(&self, id: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            let entry = format!("blur {}", state.elements[i].selector);
            state.log.push(entry);
        })
    }

    async fn select_option(
        &self,
        id: &str,
        value: Option<&str>,
        label: Option<&str>,
    ) -> Result<Vec<String>, PageError> {
        self.with_marked(id, |state, i| {
            let selected = state.elements[i]
                .options
                .iter()
                .find(|(v, l)| {
                    value.is_some_and(|x| x == v.as_str()) || label.is_some_and(|x| x == l.as_str())
                })
                .map(|(v, _)| v.clone());
            match selected {
                Some(v) => {
                    state.elements[i].value = v.clone();
                    let entry = format!("select {} = {}", state.elements[i].selector, v);
                    state.log.push(entry);
                    Ok(vec![v])
                }
                None => Err(PageError::NotFound("option".to_string())),
            }
        })?
    }

    async fn set_checked(&self, id: &str, checked: bool) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            state.elements[i].checked = checked;
            let entry = format!("check {} = {}", state.elements[i].selector, checked);
            state.log.push(entry);
        })
    }

    async fn evaluate(&self, id: &str, page_function: &str) -> Result<Value, PageError> {
        // Mock 不执行脚本，返回元素文本以便断言链路贯通
        self.with_marked(id, |state, i| {
            let entry = format!("evaluate {} {}", state.elements[i].selector, page_function);
            state.log.push(entry);
            Value::String(state.elements[i].text.clone())
        })
    }

    async fn get_attribute(&self, id: &str, name: &str) -> Result<Option<String>, PageError> {
        self.with_marked(id, |state, i| state.elements[i].attrs.get(name).cloned())
    }

    async fn inner_html(&self, id: &str) -> Result<String, PageError> {
        self.with_marked(id, |state, i| state.elements[i].text.clone())
    }

    async fn inner_text(&self, id: &str) -> Result<String, PageError> {
        self.with_marked(id, |state, i| state.elements[i].text.clone())
    }

    async fn text_content(&self, id: &str) -> Result<Option<String>, PageError> {
        self.with_marked(id, |state, i| Some(state.elements[i].text.clone()))
    }

    async fn input_value(&self, id: &str) -> Result<String, PageError> {
        self.with_marked(id, |state, i| state.elements[i].value.clone())
    }

    async fn bounding_box(&self, id: &str) -> Result<Option<BoundingBox>, PageError> {
        self.with_marked(id, |state, i| {
            if state.elements[i].visible {
                Some(BoundingBox { x: 0.0, y: 0.0, width: 100.0, height: 20.0 })
            } else {
                None
            }
        })
    }

    async fn is_checked(&self, id: &str) -> Result<bool, PageError> {
        self.with_marked(id, |state, i| state.elements[i].checked)
    }

    async fn is_editable(&self, id: &str) -> Result<bool, PageError> {
        self.with_marked(id, |state, i| state.elements[i].editable)
    }

    async fn is_enabled(&self, id: &str) -> Result<bool, PageError> {
        self.with_marked(id, |state, i| state.elements[i].enabled)
    }

    async fn is_visible(&self, id: &str) -> Result<bool, PageError> {
        self.with_marked(id, |state, i| state.elements[i].visible)
    }

    async fn count(&self, id: &str) -> Result<usize, PageError> {
        self.with_marked(id, |state, i| {
            let selector = state.elements[i].selector.clone();
            state.elements.iter().filter(|e| e.selector == selector).count()
        })
    }

    async fn visible_structure(&self) -> Result<Value, PageError> {
        let state = self.state.lock().unwrap();
        let nodes: Vec<Value> = state
            .elements
            .iter()
            .filter(|e| e.visible)
            .map(|e| {
                json!({
                    "tag": e.tag,
                    "text": e.text,
                    "role": e.role,
                })
            })
            .collect();
        Ok(Value::Array(nodes))
    }

    async fn visible_text_by_id(&self, id: &str) -> Result<String, PageError> {
        self.with_marked(id, |state, i| {
            if state.elements[i].visible {
                state.elements[i].text.clone()
            } else {
                String::new()
            }
        })
    }

    async fn visible_text_by_selector(&self, selector: &str) -> Result<String, PageError> {
        let state = self.state.lock().unwrap();
        let text: Vec<String> = state
            .elements
            .iter()
            .filter(|e| e.selector == selector && e.visible)
            .map(|e| e.text.clone())
            .collect();
        Ok(text.join(" "))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        text_marker: Option<&str>,
        _timeout_ms: u64,
    ) -> Result<(), PageError> {
        let state = self.state.lock().unwrap();
        let found = state.elements.iter().any(|e| {
            e.selector == selector
                && e.visible
                && text_marker.map(|t| e.text.contains(t)).unwrap_or(true)
        });
        if found {
            Ok(())
        } else {
            Err(PageError::Timeout(format!("waiting for {}", selector)))
        }
    }

    async fn scroll_into_view(&self, id: &str, behavior: &str) -> Result<(), PageError> {
        self.with_marked(id, |state, i| {
            let entry = format!("scroll {} {}", state.elements[i].selector, behavior);
            state.log.push(entry);
        })
    }

    async fn wait_for_network_idle(&self, _timeout_ms: u64, _idle_ms: u64) -> Result<(), PageError> {
        self.state.lock().unwrap().log.push("network idle".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locate_and_fill() {
        let page = MockPage::new("<input>")
            .with_element(MockElement::new("#name").tag("input"));

        let id = page.locate_first("#name").await.unwrap();
        assert_eq!(id, "el-1");
        page.fill(&id, "Alice").await.unwrap();
        assert_eq!(page.element("#name").unwrap().value, "Alice");
    }

    #[tokio::test]
    async fn test_locate_missing_selector() {
        let page = MockPage::new("");
        let err = page.locate_first("#missing").await.unwrap_err();
        assert!(matches!(err, PageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let page = MockPage::new("")
            .with_element(MockElement::new("a").text("x"))
            .with_element(MockElement::new("b").text("x"));

        assert_eq!(page.locate_first("a").await.unwrap(), "el-1");
        assert_eq!(page.locate_first("b").await.unwrap(), "el-2");
        let ids = page.locate_by_text("x", true).await.unwrap();
        assert_eq!(ids, vec!["el-3".to_string(), "el-4".to_string()]);
    }
}
