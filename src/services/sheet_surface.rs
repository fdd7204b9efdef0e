//! 表格编辑表面（CDP 真实实现）- 业务能力层
//!
//! 针对 Google Sheets 风格的编辑器：
//! - 地址导航走名称框（"go to cell"）
//! - 内容回读走公式栏（编辑用的权威显示元素）
//! - 输入用真实按键，不做程序化赋值

use crate::error::CellError;
use crate::infrastructure::{Clock, JsExecutor};
use crate::services::cell_io::CellSurface;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// 名称框（地址输入）
const NAME_BOX: &str = "#t-name-box";
/// 公式栏内容元素
const FORMULA_BAR: &str = "#t-formula-bar-input .cell-input";
/// 表格网格容器（导航后按键的落点）
const GRID: &str = "#waffle-grid-container";

/// 真实表格编辑表面
pub struct SheetSurface {
    executor: JsExecutor,
    clock: Arc<dyn Clock>,
    /// 逐字符输入间隔
    type_delay: Duration,
    /// 名称框导航后的短暂稳定等待
    nav_settle: Duration,
}

impl SheetSurface {
    pub fn new(executor: JsExecutor, clock: Arc<dyn Clock>, type_delay_ms: u64) -> Self {
        Self {
            executor,
            clock,
            type_delay: Duration::from_millis(type_delay_ms),
            nav_settle: Duration::from_millis(200),
        }
    }
}

#[async_trait]
impl CellSurface for SheetSurface {
    /// 连按两次 Escape：无论当前处于编辑态还是导航态，都回到已知状态
    async fn cancel_edit(&self) -> Result<()> {
        let body = self.executor.find("body").await?;
        body.press_key("Escape").await?;
        body.press_key("Escape").await?;
        Ok(())
    }

    async fn goto_cell(&self, address: &str) -> Result<()> {
        // 点击名称框 → 全选已有内容 → 输入地址 → 回车
        let name_box = self
            .executor
            .find(NAME_BOX)
            .await
            .map_err(|e| CellError::NavigationFailed {
                address: address.to_string(),
                source: e.into(),
            })?;
        name_box.click().await?;
        self.executor
            .eval(format!(
                "document.querySelector('{}').select()",
                NAME_BOX
            ))
            .await?;
        name_box.type_str(address).await?;
        name_box.press_key("Enter").await?;

        // 给编辑器一点时间移动焦点
        self.clock.sleep(self.nav_settle).await;
        Ok(())
    }

    async fn focused_address(&self) -> Result<String> {
        self.executor
            .eval_string(format!(
                "document.querySelector('{}')?.value ?? ''",
                NAME_BOX
            ))
            .await
    }

    async fn focused_content(&self) -> Result<String> {
        self.executor
            .eval_string(format!(
                "document.querySelector('{}')?.textContent ?? ''",
                FORMULA_BAR
            ))
            .await
    }

    /// 聚焦网格后直接输入即整体替换当前单元格，回车提交
    async fn type_replacement(&self, text: &str) -> Result<()> {
        let grid = self
            .executor
            .find(GRID)
            .await
            .map_err(|_| CellError::SurfaceElementMissing {
                what: format!("网格容器 {}", GRID),
            })?;

        // 逐字符输入，带节奏间隔，模拟真实键入
        for ch in text.chars() {
            grid.press_key(&ch.to_string()).await?;
            self.clock.sleep(self.type_delay).await;
        }
        grid.press_key("Enter").await?;
        Ok(())
    }
}
