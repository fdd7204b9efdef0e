//! 单行处理器 - 编排层
//!
//! 一行的完整决策：缓存快速跳过 → 读表格 → 已完成则核验 / 未完成则提交 →
//! 写回结果 → 持久化缓存。行级失败在这里汇报，绝不中断批次。

use crate::config::{Config, ProfileSettings};
use crate::models::{CacheUpdate, Completed, Contractor, RowRecord, Verdict, WorkflowRun};
use crate::services::{CellIo, RowCache, VerificationReconciler, WriteOutcome};
use crate::workflow::{SubmissionCtx, SubmissionFlow};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// 视图置前能力
///
/// 表格与门户共享一个浏览器窗口，是串行资源：
/// 每次读写前必须先把正确的视图带到前台
#[async_trait]
pub trait ViewFocus: Send + Sync {
    async fn focus_sheet(&self) -> Result<()>;
    async fn focus_portal(&self) -> Result<()>;
}

/// 单行处理结果
#[derive(Debug)]
pub enum RowResult {
    /// 缓存命中，跳过
    SkippedCached,
    /// 空行（计入连续空行停止条件）
    Empty,
    /// 已标记完成；附带本次核验的裁定（未核验则为 None）
    AlreadyDone { verdict: Option<Verdict> },
    /// 提交成功且完成标记已校验写入
    Submitted,
    /// 提交成功但完成标记写入未能校验（留待后续重跑）
    SubmittedUnverified,
    /// 提交流程失败（附运行结果，含已完成步骤列表）
    SubmitFailed { run: WorkflowRun },
    /// 演练模式 / 仅核验模式下跳过提交
    SkippedNotSubmitted,
}

/// 单行处理器
pub struct RowProcessor<'a> {
    pub cells: &'a CellIo,
    pub cache: &'a mut RowCache,
    pub flow: &'a SubmissionFlow,
    pub reconciler: &'a VerificationReconciler,
    pub focus: &'a dyn ViewFocus,
    pub settings: &'a ProfileSettings,
    pub config: &'a Config,
}

impl<'a> RowProcessor<'a> {
    /// 处理一行
    ///
    /// 返回 Err 的情况只有底层交互失败；业务性失败（提交失败、写入未校验）
    /// 都是结构化的 RowResult，由批处理器计入统计
    pub async fn process(&mut self, row: u32) -> Result<RowResult> {
        // ---------- 缓存快速跳过 ----------
        if let Some(entry) = self.cache.get(row) {
            if entry.empty == Some(true) {
                return Ok(RowResult::Empty);
            }
            if entry.completed == Some(Completed::Yes) {
                info!(
                    "[行 {}] ⏩ 缓存命中（已完成: {}），跳过",
                    row,
                    entry.name.as_deref().unwrap_or("?")
                );
                return Ok(RowResult::SkippedCached);
            }
            if entry.sent == Some(false) {
                info!("[行 {}] ⏩ 缓存标记为不发送，跳过", row);
                return Ok(RowResult::SkippedCached);
            }
        }

        // ---------- 读行数据 ----------
        self.focus.focus_sheet().await?;
        let record = self.read_record(row).await?;

        if record.is_empty() {
            if !self.config.dry_run {
                self.cache.set(row, CacheUpdate::default().empty(true))?;
            }
            return Ok(RowResult::Empty);
        }

        // ---------- 已完成：终态单调，只可能补做核验 ----------
        if record.is_done(&self.settings.done_marker) {
            return self.verify_done_row(&record).await;
        }

        // ---------- 缓存已提交但表格标记缺失（上次写入未校验）----------
        // 绝不二次提交，只补写完成标记，然后按已完成行对待
        if self.cache.get(row).and_then(|e| e.sent) == Some(true) {
            warn!(
                "[行 {}] 缓存显示已提交但表格未标记，补写完成标记: {}",
                row, record.full_name
            );
            if !self.config.dry_run {
                self.cells
                    .write(&self.settings.status_col, row, &self.settings.done_marker)
                    .await?;
            }
            return self.verify_done_row(&record).await;
        }

        // ---------- 未完成：提交 ----------
        if self.config.verify_only {
            info!("[行 {}] 仅核验模式，未完成行不提交: {}", row, record.full_name);
            return Ok(RowResult::SkippedNotSubmitted);
        }
        if self.config.dry_run {
            info!("[行 {}] 🧪 演练模式，跳过提交: {}", row, record.full_name);
            return Ok(RowResult::SkippedNotSubmitted);
        }

        self.submit_row(&record).await
    }

    async fn read_record(&self, row: u32) -> Result<RowRecord> {
        let full_name = self.cells.read(&self.settings.name_col, row).await?;
        if full_name.trim().is_empty() {
            return Ok(RowRecord {
                row,
                ..Default::default()
            });
        }
        Ok(RowRecord {
            row,
            full_name,
            email: self.cells.read(&self.settings.email_col, row).await?,
            status_flag: self.cells.read(&self.settings.status_col, row).await?,
            verification_flag: String::new(),
        })
    }

    /// 已完成行的核验：双视图裁定，YES/NO 走快速写入，unresolved 什么都不写
    async fn verify_done_row(&mut self, record: &RowRecord) -> Result<RowResult> {
        let row = record.row;

        if !self.config.dry_run {
            self.cache.set(
                row,
                CacheUpdate::default().sent(true).name(record.full_name.trim()),
            )?;
        }

        if !(self.config.verify_completed || self.config.verify_only) {
            return Ok(RowResult::AlreadyDone { verdict: None });
        }

        let contractor = Contractor::from_record(record);
        self.focus.focus_portal().await?;
        let verdict = self
            .reconciler
            .resolve(&contractor.first_name, &contractor.last_name)
            .await?;

        match verdict {
            Verdict::Yes | Verdict::No => {
                let text = verdict.to_string();
                info!("[行 {}] 核验裁定 {}: {}", row, text, record.full_name);
                if !self.config.dry_run {
                    self.focus.focus_sheet().await?;
                    self.cells
                        .write_fast(&self.settings.verify_col, row, &text)
                        .await?;
                    let completed = if verdict == Verdict::Yes {
                        Completed::Yes
                    } else {
                        Completed::No
                    };
                    self.cache.set(
                        row,
                        CacheUpdate::default()
                            .completed(completed)
                            .completed_raw(text),
                    )?;
                }
            }
            Verdict::Unresolved => {
                // 两边都没有 ≠ 否定；不写，留给下一次运行
                warn!("[行 {}] 核验无法裁定，不写任何结果: {}", row, record.full_name);
            }
        }

        Ok(RowResult::AlreadyDone {
            verdict: Some(verdict),
        })
    }

    /// 提交一行：8 步流程成功后才写完成标记
    async fn submit_row(&mut self, record: &RowRecord) -> Result<RowResult> {
        let row = record.row;
        let contractor = Contractor::from_record(record);
        let ctx = SubmissionCtx::new(contractor);

        info!("[行 {}] 📤 开始提交 {}", row, ctx);

        self.focus.focus_portal().await?;
        let run = self.flow.run(&ctx).await;

        if !run.success {
            let done: Vec<&str> = run.steps_completed.iter().map(|s| s.label()).collect();
            warn!(
                "[行 {}] ❌ 提交失败于第 {} 步，已完成: [{}]，该行留空",
                row,
                run.steps_completed.len() + 1,
                done.join(", ")
            );
            return Ok(RowResult::SubmitFailed { run });
        }

        // 提交动作已经发生，先把这一事实记入缓存，再写表格
        self.cache.set(
            row,
            CacheUpdate::default().sent(true).name(record.full_name.trim()),
        )?;

        self.focus.focus_sheet().await?;
        let outcome = self
            .cells
            .write(&self.settings.status_col, row, &self.settings.done_marker)
            .await?;

        match outcome {
            WriteOutcome::Verified => {
                info!("[行 {}] ✅ 提交完成，状态已写入", row);
                Ok(RowResult::Submitted)
            }
            WriteOutcome::Unverified => {
                // 表格里标记没写上，但表单确已提交：缓存里的 sent=true
                // 保证重跑不会二次提交
                Ok(RowResult::SubmittedUnverified)
            }
        }
    }
}
