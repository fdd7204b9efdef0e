//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 操作元素"的能力

use anyhow::{Context, Result};
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 和基础元素操作能力
/// - 不认识 Contractor / Row
/// - 不处理业务流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、等待等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行返回字符串的 JS 代码（null 视为空串）
    pub async fn eval_string(&self, js_code: impl Into<String>) -> Result<String> {
        let value = self.eval(js_code).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// 按 CSS 选择器查找元素
    pub async fn find(&self, selector: &str) -> Result<Element> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到元素: {}", selector))
    }

    /// 点击指定选择器的元素
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.find(selector).await?.click().await?;
        Ok(())
    }

    /// 向指定选择器的元素输入文本（先聚焦，逐键输入）
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.find(selector).await?.type_str(text).await?;
        Ok(())
    }

    /// 向指定选择器的元素发送按键（Enter / Escape / Delete 等）
    pub async fn press(&self, selector: &str, key: &str) -> Result<()> {
        self.find(selector).await?.press_key(key).await?;
        Ok(())
    }

    /// 读取页面的 DOM 变动计数（首次调用时安装观察器）
    pub async fn mutation_tick(&self) -> Result<u64> {
        let value = self.eval(crate::infrastructure::settle::MUTATION_TICK_JS).await?;
        Ok(value.as_u64().unwrap_or(0))
    }
}
