//! Headless Chrome 页面实现
//!
//! 需启用 feature "browser" 且系统已安装 Chrome/Chromium。
//! 打标协议：定位动作给命中的 DOM 节点设置 data-element-id 属性，后续操作
//! 一律通过 `[data-element-id="…"]` 选择器在页面脚本中定位。元素 ID 按
//! el-1、el-2 顺序分配，同一轨迹在新页面会话中回放时产生相同的 ID 序列。
//!
//! headless_chrome 为同步 API，所有页面交互放进 spawn_blocking。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};
use serde_json::Value;

use crate::page::{BoundingBox, ElementId, Page, PageError};

/// Headless Chrome 页面
pub struct ChromePage {
    /// 持有进程句柄，掉落即关闭浏览器
    _browser: Browser,
    tab: Arc<Tab>,
    next_element_id: AtomicUsize,
    /// 元素 ID -> 打标时使用的 CSS 选择器（locator_count 用）
    marks: Mutex<HashMap<ElementId, Option<String>>>,
}

/// 转义为 JS 双引号字符串字面量
fn js_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"", escaped)
}

/// 去掉 script / style 块，剩余文本即发给规划器的快照
fn strip_inert_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        let lower = rest.to_ascii_lowercase();
        let next = ["<script", "<style"]
            .iter()
            .filter_map(|tag| lower.find(tag).map(|i| (i, *tag)))
            .min_by_key(|(i, _)| *i);
        let Some((start, tag)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        let close = if tag == "<script" { "</script>" } else { "</style>" };
        match lower[start..].find(close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => return out,
        }
    }
}

impl ChromePage {
    /// 启动本地 Chrome 并打开空白页
    pub fn launch() -> Result<Self, PageError> {
        let browser = Browser::default()
            .map_err(|e| PageError::Other(format!("Chrome launch failed: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| PageError::Other(format!("Browser tab failed: {}", e)))?;
        Ok(Self {
            _browser: browser,
            tab,
            next_element_id: AtomicUsize::new(0),
            marks: Mutex::new(HashMap::new()),
        })
    }

    fn fresh_id(&self) -> ElementId {
        let n = self.next_element_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("el-{}", n)
    }

    /// 在页面上下文执行脚本并取回序列化结果
    async fn eval(&self, js: String) -> Result<Value, PageError> {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || {
            let object = tab
                .evaluate(&js, true)
                .map_err(|e| PageError::Script(e.to_string()))?;
            Ok(object.value.unwrap_or(Value::Null))
        })
        .await
        .map_err(|e| PageError::Other(format!("task join: {}", e)))?
    }

    /// 对打标元素执行脚本；body 须返回 { ok: true, value: … }
    async fn eval_on_element(&self, id: &str, body: &str) -> Result<Value, PageError> {
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector('[data-element-id=' + JSON.stringify({id}) + ']');
                if (!el) {{ return {{ ok: false }}; }}
                {body}
            }})()
            "#,
            id = js_string(id),
            body = body,
        );
        let result = self.eval(js).await?;
        if result.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(result.get("value").cloned().unwrap_or(Value::Null))
        } else {
            Err(PageError::NotFound(format!("element id {}", id)))
        }
    }

    fn remember_mark(&self, id: &ElementId, selector: Option<String>) {
        self.marks.lock().unwrap().insert(id.clone(), selector);
    }
}

/// 页面内可见性判定（与可见文本提取共用）
const IS_VISIBLE_JS: &str = r#"
function isVisible(el) {
    const style = window.getComputedStyle(el);
    return style.display !== 'none' && style.visibility !== 'hidden' && style.opacity !== '0';
}
"#;

#[async_trait]
impl Page for ChromePage {
    async fn snapshot(&self) -> Result<String, PageError> {
        let html = self
            .eval("document.documentElement.outerHTML".to_string())
            .await?;
        match html {
            Value::String(html) => Ok(strip_inert_tags(&html)),
            other => Err(PageError::Script(format!("unexpected snapshot value: {}", other))),
        }
    }

    async fn goto(&self, url: &str) -> Result<(), PageError> {
        let tab = self.tab.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            tab.navigate_to(&url)
                .map_err(|e| PageError::Other(format!("Navigate failed: {}", e)))?;
            tab.wait_for_element("body")
                .map_err(|e| PageError::Timeout(format!("Page load failed: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| PageError::Other(format!("task join: {}", e)))?
    }

    async fn locate_first(&self, css_selector: &str) -> Result<ElementId, PageError> {
        let id = self.fresh_id();
        let js = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector});
                if (!el) {{ return false; }}
                el.setAttribute('data-element-id', {id});
                return true;
            }})()
            "#,
            selector = js_string(css_selector),
            id = js_string(&id),
        );
        match self.eval(js).await? {
            Value::Bool(true) => {
                self.remember_mark(&id, Some(css_selector.to_string()));
                Ok(id)
            }
            _ => Err(PageError::NotFound(css_selector.to_string())),
        }
    }

    async fn locate_by_role(&self, role: &str, exact: bool) -> Result<Vec<ElementId>, PageError> {
        // 先数出命中个数，再为每个命中分配顺序 ID 并打标
        let js = format!(
            r#"
            (function() {{
                const role = {role};
                const exact = {exact};
                const implicit = {{ button: 'button', a: 'link', input: 'textbox', select: 'combobox', textarea: 'textbox' }};
                const matches = [];
                for (const el of document.querySelectorAll('*')) {{
                    const r = el.getAttribute('role') || implicit[el.tagName.toLowerCase()] || '';
                    if (exact ? r === role : r.includes(role)) {{ matches.push(el); }}
                }}
                window.__webpilotRoleMatches = matches;
                return matches.length;
            }})()
            "#,
            role = js_string(role),
            exact = exact,
        );
        let count = self.eval(js).await?.as_u64().unwrap_or(0) as usize;
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = self.fresh_id();
            let js = format!(
                "window.__webpilotRoleMatches[{}].setAttribute('data-element-id', {}); true",
                index,
                js_string(&id),
            );
            self.eval(js).await?;
            self.remember_mark(&id, None);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn locate_by_text(&self, text: &str, exact: bool) -> Result<Vec<ElementId>, PageError> {
        let js = format!(
            r#"
            (function() {{
                {visible}
                const text = {text};
                const exact = {exact};
                const matches = [];
                for (const el of document.querySelectorAll('*')) {{
                    if (!isVisible(el)) {{ continue; }}
                    const own = Array.from(el.childNodes)
                        .filter(n => n.nodeType === 3)
                        .map(n => n.textContent.trim())
                        .join(' ')
                        .trim();
                    if (exact ? own === text : (own && own.includes(text))) {{ matches.push(el); }}
                }}
                window.__webpilotTextMatches = matches;
                return matches.length;
            }})()
            "#,
            visible = IS_VISIBLE_JS,
            text = js_string(text),
            exact = exact,
        );
        let count = self.eval(js).await?.as_u64().unwrap_or(0) as usize;
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let id = self.fresh_id();
            let js = format!(
                "window.__webpilotTextMatches[{}].setAttribute('data-element-id', {}); true",
                index,
                js_string(&id),
            );
            self.eval(js).await?;
            self.remember_mark(&id, None);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn click(&self, id: &str) -> Result<(), PageError> {
        self.eval_on_element(
            id,
            r#"
            el.scrollIntoView({ behavior: 'instant', block: 'center' });
            el.click();
            return { ok: true };
            "#,
        )
        .await?;
        Ok(())
    }

    async fn fill(&self, id: &str, value: &str) -> Result<(), PageError> {
        let body = format!(
            r#"
            el.focus();
            if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {{
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }} else {{
                el.textContent = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            }}
            return {{ ok: true }};
            "#,
            value = js_string(value),
        );
        self.eval_on_element(id, &body).await?;
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<(), PageError> {
        self.fill(id, "").await
    }

    async fn press(&self, id: &str, key: &str) -> Result<(), PageError> {
        let body = format!(
            r#"
            el.focus();
            const opts = {{ key: {key}, bubbles: true }};
            el.dispatchEvent(new KeyboardEvent('keydown', opts));
            el.dispatchEvent(new KeyboardEvent('keyup', opts));
            return {{ ok: true }};
            "#,
            key = js_string(key),
        );
        self.eval_on_element(id, &body).await?;
        Ok(())
    }

    async fn press_global(&self, key: &str) -> Result<(), PageError> {
        let js = format!(
            r#"
            (function() {{
                const target = document.activeElement || document.body;
                const opts = {{ key: {key}, bubbles: true }};
                target.dispatchEvent(new KeyboardEvent('keydown', opts));
                target.dispatchEvent(new KeyboardEvent('keyup', opts));
                return true;
            }})()
            "#,
            key = js_string(key),
        );
        self.eval(js).await?;
        Ok(())
    }

    async fn blur(&self, id: &str) -> Result<(), PageError> {
        self.eval_on_element(id, "el.blur(); return { ok: true };").await?;
        Ok(())
    }

    async fn select_option(
        &self,
        id: &str,
        value: Option<&str>,
        label: Option<&str>,
    ) -> Result<Vec<String>, PageError> {
        let body = format!(
            r#"
            const wantValue = {value};
            const wantLabel = {label};
            const option = Array.from(el.options || []).find(o =>
                (wantValue !== null && o.value === wantValue) ||
                (wantLabel !== null && o.label.trim() === wantLabel));
            if (!option) {{ return {{ ok: true, value: null }}; }}
            el.value = option.value;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return {{ ok: true, value: option.value }};
            "#,
            value = value.map(js_string).unwrap_or_else(|| "null".to_string()),
            label = label.map(js_string).unwrap_or_else(|| "null".to_string()),
        );
        match self.eval_on_element(id, &body).await? {
            Value::String(selected) => Ok(vec![selected]),
            _ => Err(PageError::NotFound("option".to_string())),
        }
    }

    async fn set_checked(&self, id: &str, checked: bool) -> Result<(), PageError> {
        let body = format!(
            r#"
            el.checked = {checked};
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return {{ ok: true }};
            "#,
            checked = checked,
        );
        self.eval_on_element(id, &body).await?;
        Ok(())
    }

    async fn evaluate(&self, id: &str, page_function: &str) -> Result<Value, PageError> {
        // page_function 形如 node => node.innerText，在页面上下文对元素求值
        let body = format!(
            "return {{ ok: true, value: ({})(el) }};",
            page_function
        );
        self.eval_on_element(id, &body).await
    }

    async fn get_attribute(&self, id: &str, name: &str) -> Result<Option<String>, PageError> {
        let body = format!(
            "return {{ ok: true, value: el.getAttribute({}) }};",
            js_string(name),
        );
        match self.eval_on_element(id, &body).await? {
            Value::String(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    async fn inner_html(&self, id: &str) -> Result<String, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: el.innerHTML };")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn inner_text(&self, id: &str) -> Result<String, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: el.innerText };")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn text_content(&self, id: &str) -> Result<Option<String>, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: el.textContent };")
            .await?;
        Ok(value.as_str().map(String::from))
    }

    async fn input_value(&self, id: &str) -> Result<String, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: el.value ?? '' };")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn bounding_box(&self, id: &str) -> Result<Option<BoundingBox>, PageError> {
        let body = format!(
            r#"
            {visible}
            if (!isVisible(el)) {{ return {{ ok: true, value: null }}; }}
            const rect = el.getBoundingClientRect();
            return {{ ok: true, value: {{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }} }};
            "#,
            visible = IS_VISIBLE_JS,
        );
        let value = self.eval_on_element(id, &body).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| PageError::Script(e.to_string()))
    }

    async fn is_checked(&self, id: &str) -> Result<bool, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: !!el.checked };")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_editable(&self, id: &str) -> Result<bool, PageError> {
        let value = self
            .eval_on_element(
                id,
                r#"
                const tag = el.tagName.toLowerCase();
                const editable = (tag === 'input' || tag === 'textarea' || tag === 'select' || el.isContentEditable)
                    && !el.disabled && !el.readOnly;
                return { ok: true, value: !!editable };
                "#,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, id: &str) -> Result<bool, PageError> {
        let value = self
            .eval_on_element(id, "return { ok: true, value: !el.disabled };")
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_visible(&self, id: &str) -> Result<bool, PageError> {
        let body = format!(
            "{visible}\nreturn {{ ok: true, value: isVisible(el) }};",
            visible = IS_VISIBLE_JS,
        );
        let value = self.eval_on_element(id, &body).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn count(&self, id: &str) -> Result<usize, PageError> {
        let selector = self.marks.lock().unwrap().get(id).cloned();
        match selector {
            Some(Some(selector)) => {
                let js = format!(
                    "document.querySelectorAll({}).length",
                    js_string(&selector),
                );
                Ok(self.eval(js).await?.as_u64().unwrap_or(0) as usize)
            }
            // 非选择器打标（按角色 / 文本定位）：计已打标的这一个
            Some(None) => Ok(1),
            None => Err(PageError::NotFound(format!("element id {}", id))),
        }
    }

    async fn visible_structure(&self) -> Result<Value, PageError> {
        let js = format!(
            r#"
            (function() {{
                {visible}
                const maxDepth = 30;
                const extract = (el, depth) => {{
                    if (!el || depth > maxDepth || !isVisible(el)) {{ return null; }}
                    const node = {{ tag: el.tagName.toLowerCase(), attributes: {{}}, children: [] }};
                    for (const attr of el.attributes) {{ node.attributes[attr.name] = attr.value; }}
                    if (el.childNodes.length === 1 && el.childNodes[0].nodeType === 3) {{
                        const text = (el.textContent || '').trim();
                        if (text) {{ node.text = text.length > 50 ? text.slice(0, 50) + '...' : text; }}
                    }}
                    for (const child of el.children) {{
                        const sub = extract(child, depth + 1);
                        if (sub) {{ node.children.push(sub); }}
                    }}
                    return node;
                }};
                return extract(document.body, 0);
            }})()
            "#,
            visible = IS_VISIBLE_JS,
        );
        self.eval(js).await
    }

    async fn visible_text_by_id(&self, id: &str) -> Result<String, PageError> {
        let body = format!(
            r#"
            {visible}
            const collect = (node) => {{
                if (node.nodeType === 3) {{ return (node.textContent || '').trim(); }}
                if (!(node instanceof Element) || !isVisible(node)) {{ return ''; }}
                return Array.from(node.childNodes).map(collect).join('');
            }};
            return {{ ok: true, value: collect(el) }};
            "#,
            visible = IS_VISIBLE_JS,
        );
        let value = self.eval_on_element(id, &body).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn visible_text_by_selector(&self, selector: &str) -> Result<String, PageError> {
        let js = format!(
            r#"
            (function() {{
                {visible}
                let all = '';
                for (const el of document.querySelectorAll({selector})) {{
                    if (isVisible(el)) {{ all += (el.textContent || '').trim() + ' '; }}
                }}
                return all.trim();
            }})()
            "#,
            visible = IS_VISIBLE_JS,
            selector = js_string(selector),
        );
        let value = self.eval(js).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        text_marker: Option<&str>,
        timeout_ms: u64,
    ) -> Result<(), PageError> {
        let check = format!(
            r#"
            (function() {{
                {visible}
                const marker = {marker};
                for (const el of document.querySelectorAll({selector})) {{
                    if (!isVisible(el)) {{ continue; }}
                    if (marker === null || (el.textContent || '').includes(marker)) {{ return true; }}
                }}
                return false;
            }})()
            "#,
            visible = IS_VISIBLE_JS,
            marker = text_marker.map(js_string).unwrap_or_else(|| "null".to_string()),
            selector = js_string(selector),
        );
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.eval(check.clone()).await? == Value::Bool(true) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::Timeout(selector.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn scroll_into_view(&self, id: &str, behavior: &str) -> Result<(), PageError> {
        let body = format!(
            "el.scrollIntoView({{ behavior: {}, block: 'center' }}); return {{ ok: true }};",
            js_string(behavior),
        );
        self.eval_on_element(id, &body).await?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout_ms: u64, idle_ms: u64) -> Result<(), PageError> {
        // 以 readyState 近似：complete 视作网络空闲，再附加 idle 等待
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let ready = self
                .eval("document.readyState".to_string())
                .await?
                .as_str()
                .map(|s| s == "complete")
                .unwrap_or(false);
            if ready {
                break;
            }
            if Instant::now() >= deadline {
                return Err(PageError::Timeout("network idle".to_string()));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if idle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(idle_ms)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escaping() {
        assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
        assert_eq!(js_string("a\nb"), r#""a\nb""#);
    }

    #[test]
    fn test_strip_inert_tags() {
        let html = "<body><script>var x = 1;</script><h1>Hi</h1><style>.a{}</style></body>";
        assert_eq!(strip_inert_tags(html), "<body><h1>Hi</h1></body>");
    }
}
