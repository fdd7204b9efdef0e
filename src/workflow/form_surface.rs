//! 表单操作表面 - 流程层
//!
//! 把"在页面上找控件 / 点控件 / 填字段"抽象成能力接口：
//! 匹配策略（按文本、按角色、按结构）可替换，也可在测试中整体模拟。
//! 真实实现走 CDP，控件定位靠扫描可见文本并打标记属性。

use crate::infrastructure::{Clock, JsExecutor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// 控件定位条件
#[derive(Debug, Clone)]
pub enum Criteria {
    /// 可见且可用的控件，文本同时包含所有短语（大小写不敏感）
    VisibleText(Vec<String>),
    /// 兜底：提交角色控件（button[type=submit] 等）
    SubmitRole,
    /// 按可见标签 / 占位符文本找输入字段
    Field(String),
}

impl Criteria {
    pub fn text(phrases: &[&str]) -> Self {
        Criteria::VisibleText(phrases.iter().map(|p| p.to_lowercase()).collect())
    }
}

/// 已定位控件的句柄（页面内打了标记属性，后续操作按标记寻址）
#[derive(Debug, Clone, Deserialize)]
pub struct ControlHandle {
    pub token: String,
    #[serde(default)]
    pub text: String,
}

/// 日期字段的形态
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DateInputs {
    /// 月/日/年三个分离输入（优先）
    Split {
        month: ControlHandle,
        day: ControlHandle,
        year: ControlHandle,
    },
    /// 单个合并日期输入（退路）
    Combined { input: ControlHandle },
    /// 两者皆无（步骤失败）
    Missing,
}

/// 表单操作能力
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// 导航到指定地址
    async fn goto(&self, url: &str) -> Result<()>;

    /// 页面全文（用于加载指示与"无结果"短语检测）
    async fn body_text(&self) -> Result<String>;

    /// 按条件定位控件
    async fn locate(&self, criteria: &Criteria) -> Result<Option<ControlHandle>>;

    /// 点击控件
    async fn click(&self, control: &ControlHandle) -> Result<()>;

    /// 清空并输入：全选 + 显式 Delete 键 + 逐字符键入，
    /// 绝不程序化赋值（会被表单校验框架忽略）
    async fn clear_and_type(&self, control: &ControlHandle, text: &str) -> Result<()>;

    /// 探测日期字段形态
    async fn date_inputs(&self) -> Result<DateInputs>;

    /// 等待导航事件或超时（返回是否发生了导航）
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<bool>;

    /// DOM 变动计数（静默等待用）
    async fn mutation_tick(&self) -> Result<u64>;
}

/// CDP 真实实现
pub struct CdpFormSurface {
    executor: JsExecutor,
    clock: Arc<dyn Clock>,
    type_delay: Duration,
}

impl CdpFormSurface {
    pub fn new(executor: JsExecutor, clock: Arc<dyn Clock>, type_delay_ms: u64) -> Self {
        Self {
            executor,
            clock,
            type_delay: Duration::from_millis(type_delay_ms),
        }
    }

    fn selector_for(handle: &ControlHandle) -> String {
        format!("[data-cob-id=\"{}\"]", handle.token)
    }
}

/// 扫描脚本：按条件找到首个命中的元素，打上标记属性并返回句柄
fn locate_js(criteria: &Criteria) -> String {
    let (candidates, matcher) = match criteria {
        Criteria::VisibleText(phrases) => (
            "button, [role=\"button\"], a, input[type=\"submit\"], input[type=\"button\"]",
            format!(
                "const phrases = {}; const t = text.toLowerCase(); \
                 if (!phrases.every(p => t.includes(p))) continue;",
                serde_json::to_string(phrases).unwrap_or_else(|_| "[]".to_string())
            ),
        ),
        Criteria::SubmitRole => (
            "button[type=\"submit\"], input[type=\"submit\"]",
            String::new(),
        ),
        Criteria::Field(label) => (
            "input:not([type=hidden]), textarea",
            format!(
                "const wanted = {}.toLowerCase(); \
                 const labelText = (el.labels && el.labels.length ? el.labels[0].innerText : '') \
                     + ' ' + (el.placeholder || '') + ' ' + (el.getAttribute('aria-label') || ''); \
                 if (!labelText.toLowerCase().includes(wanted)) continue;",
                serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string())
            ),
        ),
    };

    format!(
        r#"
        (() => {{
            const visible = el => {{
                const r = el.getBoundingClientRect();
                const s = getComputedStyle(el);
                return r.width > 0 && r.height > 0
                    && s.visibility !== 'hidden' && s.display !== 'none';
            }};
            for (const el of document.querySelectorAll('{candidates}')) {{
                if (!visible(el) || el.disabled) continue;
                const text = el.innerText || el.value || '';
                {matcher}
                window.__cob_seq = (window.__cob_seq || 0) + 1;
                const token = String(window.__cob_seq);
                el.setAttribute('data-cob-id', token);
                return {{ token: token, text: text }};
            }}
            return null;
        }})()
        "#,
        candidates = candidates,
        matcher = matcher,
    )
}

/// 日期字段探测脚本：优先找月/日/年三分输入，退而找合并输入
const DATE_INPUTS_JS: &str = r#"
    (() => {
        const stamp = el => {
            window.__cob_seq = (window.__cob_seq || 0) + 1;
            const token = String(window.__cob_seq);
            el.setAttribute('data-cob-id', token);
            return { token: token, text: el.placeholder || '' };
        };
        const hint = el => ((el.name || '') + ' ' + (el.placeholder || '')
            + ' ' + (el.getAttribute('aria-label') || '')).toLowerCase();
        const inputs = [...document.querySelectorAll('input:not([type=hidden])')];
        const month = inputs.find(el => /month|\bmm\b/.test(hint(el)));
        const day = inputs.find(el => /day|\bdd\b/.test(hint(el)));
        const year = inputs.find(el => /year|yyyy/.test(hint(el)));
        if (month && day && year) {
            return { kind: 'split',
                     month: stamp(month), day: stamp(day), year: stamp(year) };
        }
        const combined = inputs.find(el =>
            el.type === 'date' || /date|mm\/dd\/yyyy/.test(hint(el)));
        if (combined) {
            return { kind: 'combined', input: stamp(combined) };
        }
        return { kind: 'missing' };
    })()
"#;

#[async_trait]
impl FormSurface for CdpFormSurface {
    async fn goto(&self, url: &str) -> Result<()> {
        self.executor
            .page()
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        self.executor
            .eval_string("document.body ? document.body.innerText : ''")
            .await
    }

    async fn locate(&self, criteria: &Criteria) -> Result<Option<ControlHandle>> {
        self.executor.eval_as(locate_js(criteria)).await
    }

    async fn click(&self, control: &ControlHandle) -> Result<()> {
        self.executor.click(&Self::selector_for(control)).await
    }

    async fn clear_and_type(&self, control: &ControlHandle, text: &str) -> Result<()> {
        let selector = Self::selector_for(control);
        let element = self.executor.find(&selector).await?;

        // 全选已有内容并显式删除，再逐字符键入
        element.click().await?;
        self.executor
            .eval(format!(
                "document.querySelector('{}')?.select?.()",
                selector
            ))
            .await?;
        element.press_key("Delete").await?;
        for ch in text.chars() {
            element.press_key(&ch.to_string()).await?;
            self.clock.sleep(self.type_delay).await;
        }
        Ok(())
    }

    async fn date_inputs(&self) -> Result<DateInputs> {
        self.executor.eval_as(DATE_INPUTS_JS).await
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<bool> {
        // 导航与固定超时并发等待，先到者为准
        let wait = self.executor.page().wait_for_navigation();
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(_)) | Err(_) => Ok(false),
        }
    }

    async fn mutation_tick(&self) -> Result<u64> {
        self.executor.mutation_tick().await
    }
}
