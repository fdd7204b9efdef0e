//! 单元格读写 - 业务能力层
//!
//! 对外只有 read / write / write_fast 三个动作；
//! 写入走"导航 → 整体替换 → 提交 → 回读比对"的校验协议

use crate::error::CellError;
use crate::infrastructure::{retry_until, Clock, RetryPolicy};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// 编辑表面能力
///
/// 表格编辑器有两种状态（地址导航态 / 单元格编辑态），按键在两种状态下
/// 行为不同，所以每个操作都必须先把表面逼回已知状态。
/// 真实实现是 SheetSurface（CDP），测试用内存模拟替换。
#[async_trait]
pub trait CellSurface: Send + Sync {
    /// 退出任何进行中的编辑态（通常是连按 Escape）
    async fn cancel_edit(&self) -> Result<()>;

    /// 通过地址框跳到目标单元格
    async fn goto_cell(&self, address: &str) -> Result<()>;

    /// 当前聚焦单元格的地址（读自地址框）
    async fn focused_address(&self) -> Result<String>;

    /// 当前聚焦单元格的内容（读自公式栏，即编辑用的权威显示元素）
    async fn focused_content(&self) -> Result<String>;

    /// 输入整体替换文本并提交（Enter）
    async fn type_replacement(&self, text: &str) -> Result<()>;
}

/// 校验写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 回读值与写入值一致
    Verified,
    /// 重试耗尽仍不一致：上报但不抛错，该行结果留空待后续重跑
    Unverified,
}

/// 单元格读写服务
pub struct CellIo {
    surface: Arc<dyn CellSurface>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl CellIo {
    pub fn new(surface: Arc<dyn CellSurface>, clock: Arc<dyn Clock>) -> Self {
        Self {
            surface,
            clock,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 读取单元格内容
    ///
    /// 地址框可能静默导航失败（焦点过期、与上一操作竞争），
    /// 所以导航后回验焦点地址，不符则再导航一次，仍不符才放弃。
    /// 内容只信公式栏 —— 地址框的回显"长得像地址"，绝不能当内容用。
    pub async fn read(&self, column: &str, row: u32) -> Result<String> {
        let address = cell_address(column, row);

        self.surface.cancel_edit().await?;
        self.surface.goto_cell(&address).await?;

        let mut actual = self.surface.focused_address().await?;
        if !same_address(&actual, &address) {
            debug!("寻址不符 (请求 {} 实际 {})，重试导航一次", address, actual);
            self.surface.goto_cell(&address).await?;
            actual = self.surface.focused_address().await?;
            if !same_address(&actual, &address) {
                return Err(CellError::AddressMismatch {
                    requested: address,
                    actual,
                }
                .into());
            }
        }

        self.surface.focused_content().await
    }

    /// 校验写入：清编辑态 → 导航 → 整体替换 → 提交 → 回读比对
    ///
    /// 不一致时按策略退避重试；耗尽后返回 Unverified（不抛错），
    /// 留给后续运行重试
    pub async fn write(&self, column: &str, row: u32, text: &str) -> Result<WriteOutcome> {
        let address = cell_address(column, row);

        let verified = retry_until(&self.policy, &*self.clock, |attempt| {
            let address = address.clone();
            async move {
                debug!("写入 {} (尝试 {}/{})", address, attempt, self.policy.max_attempts);

                self.surface.cancel_edit().await?;
                self.surface.goto_cell(&address).await?;
                self.surface.type_replacement(text).await?;

                let read_back = self.read(column, row).await?;
                if read_back.trim().eq_ignore_ascii_case(text.trim()) {
                    Ok(Some(()))
                } else {
                    warn!(
                        "写入校验不符 {}: 期望 {:?}，回读 {:?}",
                        address, text, read_back
                    );
                    Ok(None)
                }
            }
        })
        .await?;

        match verified {
            Some(()) => Ok(WriteOutcome::Verified),
            None => {
                warn!(
                    "⚠️ 写入校验失败 {}: 已重试 {} 次，该行结果留空",
                    address, self.policy.max_attempts
                );
                Ok(WriteOutcome::Unverified)
            }
        }
    }

    /// 无校验快速写入
    ///
    /// 只用于低风险状态列（核验结果列），调用方不得依赖其成功
    pub async fn write_fast(&self, column: &str, row: u32, text: &str) -> Result<()> {
        let address = cell_address(column, row);
        self.surface.cancel_edit().await?;
        self.surface.goto_cell(&address).await?;
        self.surface.type_replacement(text).await?;
        Ok(())
    }
}

fn cell_address(column: &str, row: u32) -> String {
    format!("{}{}", column.trim().to_uppercase(), row)
}

fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ManualClock;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 内存模拟的编辑表面：提交什么，回读什么
    struct FakeSurface {
        cells: Mutex<HashMap<String, String>>,
        focused: Mutex<String>,
        /// 前 N 次提交丢失（模拟未收敛）
        drop_first_commits: Mutex<usize>,
        /// 导航前 N 次静默失败（焦点停在原地）
        drop_first_gotos: Mutex<usize>,
    }

    impl FakeSurface {
        fn new() -> Self {
            Self {
                cells: Mutex::new(HashMap::new()),
                focused: Mutex::new("A1".to_string()),
                drop_first_commits: Mutex::new(0),
                drop_first_gotos: Mutex::new(0),
            }
        }

        fn cell(&self, address: &str) -> Option<String> {
            self.cells.lock().unwrap().get(address).cloned()
        }
    }

    #[async_trait]
    impl CellSurface for FakeSurface {
        async fn cancel_edit(&self) -> Result<()> {
            Ok(())
        }

        async fn goto_cell(&self, address: &str) -> Result<()> {
            let mut dropped = self.drop_first_gotos.lock().unwrap();
            if *dropped > 0 {
                *dropped -= 1;
                return Ok(()); // 静默失败：焦点不动
            }
            *self.focused.lock().unwrap() = address.to_string();
            Ok(())
        }

        async fn focused_address(&self) -> Result<String> {
            Ok(self.focused.lock().unwrap().clone())
        }

        async fn focused_content(&self) -> Result<String> {
            let focused = self.focused.lock().unwrap().clone();
            Ok(self.cell(&focused).unwrap_or_default())
        }

        async fn type_replacement(&self, text: &str) -> Result<()> {
            let mut dropped = self.drop_first_commits.lock().unwrap();
            if *dropped > 0 {
                *dropped -= 1;
                return Ok(());
            }
            let focused = self.focused.lock().unwrap().clone();
            self.cells
                .lock()
                .unwrap()
                .insert(focused, text.to_string());
            Ok(())
        }
    }

    fn cell_io(surface: Arc<FakeSurface>) -> CellIo {
        CellIo::new(surface, Arc::new(ManualClock::new()))
            .with_policy(RetryPolicy::new(3, Duration::from_millis(100)))
    }

    #[tokio::test]
    async fn write_verifies_round_trip() {
        let surface = Arc::new(FakeSurface::new());
        let io = cell_io(surface.clone());

        let outcome = io.write("c", 5, "Sent").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Verified);
        assert_eq!(surface.cell("C5").as_deref(), Some("Sent"));
        assert_eq!(io.read("C", 5).await.unwrap(), "Sent");
    }

    #[tokio::test]
    async fn write_converges_within_retries() {
        let surface = Arc::new(FakeSurface::new());
        *surface.drop_first_commits.lock().unwrap() = 2;
        let io = cell_io(surface.clone());

        let outcome = io.write("B", 3, "done").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Verified);
    }

    #[tokio::test]
    async fn write_reports_unverified_without_error() {
        let surface = Arc::new(FakeSurface::new());
        *surface.drop_first_commits.lock().unwrap() = usize::MAX; // 永不收敛
        surface
            .cells
            .lock()
            .unwrap()
            .insert("A2".to_string(), "old".to_string());
        let io = cell_io(surface.clone());

        let outcome = io.write("B", 3, "new").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Unverified);
        // 无关单元格未被破坏
        assert_eq!(surface.cell("A2").as_deref(), Some("old"));
        assert_eq!(surface.cell("B3"), None);
    }

    #[tokio::test]
    async fn read_retries_stale_navigation_once() {
        let surface = Arc::new(FakeSurface::new());
        surface
            .cells
            .lock()
            .unwrap()
            .insert("D7".to_string(), "hello".to_string());
        *surface.drop_first_gotos.lock().unwrap() = 1;
        let io = cell_io(surface.clone());

        assert_eq!(io.read("D", 7).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn read_fails_after_second_mismatch() {
        let surface = Arc::new(FakeSurface::new());
        *surface.drop_first_gotos.lock().unwrap() = usize::MAX;
        let io = cell_io(surface.clone());

        assert!(io.read("D", 7).await.is_err());
    }

    #[tokio::test]
    async fn comparison_is_case_insensitive() {
        let surface = Arc::new(FakeSurface::new());
        // 提交全部丢失，但单元格里已有大小写不同的同值
        *surface.drop_first_commits.lock().unwrap() = usize::MAX;
        surface
            .cells
            .lock()
            .unwrap()
            .insert("C2".to_string(), "SENT".to_string());
        let io = cell_io(surface.clone());

        // 回读 "SENT" vs 写入 "sent"：大小写不敏感比较，算校验通过
        let outcome = io.write("C", 2, "sent").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Verified);
    }
}
