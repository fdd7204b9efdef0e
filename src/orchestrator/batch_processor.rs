//! 批量处理器 - 编排层
//!
//! App 负责装配所有稀缺资源（浏览器连接、两个标签页）和各层服务；
//! run_batch 只做行序遍历、连续空行停止、节奏控制和统计汇总，
//! 单行的全部决策都在 RowProcessor 里

use crate::browser::{bring_to_front, connect_to_browser, find_page_by_url};
use crate::config::{load_profile_settings, Config, ProfileSettings};
use crate::infrastructure::{Clock, JsExecutor, TokioClock};
use crate::orchestrator::row_processor::{RowProcessor, RowResult, ViewFocus};
use crate::services::{
    CellIo, FileStore, PortalStatusView, RowCache, SheetSurface, VerificationReconciler, ViewKind,
};
use crate::workflow::{CdpFormSurface, FlowTiming, SubmissionFlow};
use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 真实的视图置前实现：两个标签页共用一个浏览器窗口
pub struct TabFocus {
    sheet: Page,
    portal: Page,
}

#[async_trait]
impl ViewFocus for TabFocus {
    async fn focus_sheet(&self) -> Result<()> {
        bring_to_front(&self.sheet).await
    }

    async fn focus_portal(&self) -> Result<()> {
        bring_to_front(&self.portal).await
    }
}

/// 一轮批次的统计汇总
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// 成功提交数
    pub submitted: usize,
    /// 提交后完成标记写入未校验数（已计入 submitted）
    pub write_unverified: usize,
    /// 提交失败数
    pub failed: usize,
    /// 缓存命中跳过数
    pub skipped_cached: usize,
    /// 已标记完成的行数
    pub already_done: usize,
    /// 核验裁定为 YES 的行数
    pub verified_yes: usize,
    /// 核验裁定为 NO 的行数
    pub verified_no: usize,
    /// 核验无法裁定的行数
    pub unresolved: usize,
    /// 空行数
    pub empty: usize,
    /// 演练 / 仅核验模式下跳过的未完成行数
    pub skipped_not_submitted: usize,
    /// 行级错误数（底层交互失败，不中断批次）
    pub errors: usize,
}

impl RunStats {
    fn record(&mut self, result: &RowResult) {
        match result {
            RowResult::SkippedCached => self.skipped_cached += 1,
            RowResult::Empty => self.empty += 1,
            RowResult::AlreadyDone { verdict } => {
                self.already_done += 1;
                match verdict {
                    Some(crate::models::Verdict::Yes) => self.verified_yes += 1,
                    Some(crate::models::Verdict::No) => self.verified_no += 1,
                    Some(crate::models::Verdict::Unresolved) => self.unresolved += 1,
                    None => {}
                }
            }
            RowResult::Submitted => self.submitted += 1,
            RowResult::SubmittedUnverified => {
                self.submitted += 1;
                self.write_unverified += 1;
            }
            RowResult::SubmitFailed { .. } => self.failed += 1,
            RowResult::SkippedNotSubmitted => self.skipped_not_submitted += 1,
        }
    }

    pub fn log_summary(&self) {
        info!("{}", "=".repeat(60));
        info!("📊 批次统计");
        info!("   提交成功: {} (其中标记写入未校验: {})", self.submitted, self.write_unverified);
        info!("   提交失败: {}", self.failed);
        info!("   缓存跳过: {}", self.skipped_cached);
        info!("   已完成行: {} (YES: {}, NO: {}, 未裁定: {})",
            self.already_done, self.verified_yes, self.verified_no, self.unresolved);
        info!("   空行: {}  模式跳过: {}  行级错误: {}",
            self.empty, self.skipped_not_submitted, self.errors);
        info!("{}", "=".repeat(60));
        if self.unresolved > 0 {
            warn!("⚠️ 有 {} 行核验未能裁定，下次运行会再次尝试", self.unresolved);
        }
    }
}

/// 按行序遍历并驱动单行处理器
///
/// - 从起始行升序推进，遇到连续空行达到阈值或超出结束行即停止
/// - 行级 Err 只计数不外抛，批次永远跑到停止条件
/// - 两次成功提交之间按配置休眠，每 N 次提交插入长暂停
pub async fn run_batch(
    processor: &mut RowProcessor<'_>,
    clock: &dyn Clock,
) -> RunStats {
    let config = processor.config;
    let start = config.start_row.unwrap_or(processor.settings.first_data_row);
    let submit_delay = Duration::from_secs(config.submit_delay_secs);
    let long_pause = Duration::from_secs(config.long_pause_secs);

    let mut stats = RunStats::default();
    let mut consecutive_empty = 0usize;
    let mut row = start;

    loop {
        if let Some(end) = config.end_row {
            if row > end {
                info!("已到达结束行 {}，停止", end);
                break;
            }
        }

        match processor.process(row).await {
            Ok(result) => {
                if matches!(result, RowResult::Empty) {
                    consecutive_empty += 1;
                    if consecutive_empty >= config.empty_row_stop {
                        info!("连续 {} 个空行，数据到此为止，停止", consecutive_empty);
                        stats.record(&result);
                        break;
                    }
                } else {
                    consecutive_empty = 0;
                }

                let submitted_now = matches!(
                    result,
                    RowResult::Submitted | RowResult::SubmittedUnverified
                );
                stats.record(&result);

                if submitted_now {
                    if config.long_pause_every > 0
                        && stats.submitted % config.long_pause_every == 0
                    {
                        info!("😴 已提交 {} 份，长暂停 {} 秒", stats.submitted, config.long_pause_secs);
                        clock.sleep(long_pause).await;
                    } else {
                        clock.sleep(submit_delay).await;
                    }
                }
            }
            Err(e) => {
                error!("[行 {}] ❌ 行处理出错: {:#}", row, e);
                stats.errors += 1;
            }
        }

        row += 1;
    }

    stats
}

/// 批量入职提交应用
///
/// 持有浏览器连接和两个标签页（稀缺资源），以及装配好的各层服务
pub struct App {
    config: Config,
    settings: ProfileSettings,
    // 连接一旦 drop，事件循环随之结束，必须与 App 同寿命
    _browser: Browser,
    clock: Arc<dyn Clock>,
    cells: CellIo,
    cache: RowCache,
    flow: SubmissionFlow,
    reconciler: VerificationReconciler,
    focus: TabFocus,
}

impl App {
    /// 初始化：连接浏览器、定位表格与门户标签页、装配服务
    ///
    /// 任一标签页缺失都是致命错误（需要使用者先手动打开并登录）
    pub async fn initialize(config: Config) -> Result<Self> {
        let settings = load_profile_settings(config.profile, &config.profiles_file)?;

        let browser = connect_to_browser(config.browser_debug_port).await?;
        let sheet_page = find_page_by_url(&browser, &settings.sheet_url_fragment).await?;
        let portal_page = find_page_by_url(&browser, &settings.portal_url_fragment).await?;
        info!("✓ 表格与门户标签页均已定位");

        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());

        let sheet_surface = SheetSurface::new(
            JsExecutor::new(sheet_page.clone()),
            clock.clone(),
            config.type_delay_ms,
        );
        let cells = CellIo::new(Arc::new(sheet_surface), clock.clone());

        let timing = FlowTiming {
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            settle: Duration::from_millis(config.settle_ms),
            idle_cap: Duration::from_secs(config.dom_idle_cap_secs),
            ..FlowTiming::default()
        };
        let form_surface = CdpFormSurface::new(
            JsExecutor::new(portal_page.clone()),
            clock.clone(),
            config.type_delay_ms,
        );
        let flow = SubmissionFlow::new(
            Arc::new(form_surface),
            clock.clone(),
            timing,
            settings.form_url.clone(),
        );

        let onboarding = PortalStatusView::new(
            JsExecutor::new(portal_page.clone()),
            clock.clone(),
            ViewKind::Onboarding,
            settings.onboarding_view_url.clone(),
            config.settle_ms,
            config.dom_idle_cap_secs,
        );
        let roster = PortalStatusView::new(
            JsExecutor::new(portal_page.clone()),
            clock.clone(),
            ViewKind::Roster,
            settings.roster_view_url.clone(),
            config.settle_ms,
            config.dom_idle_cap_secs,
        );
        let reconciler = VerificationReconciler::new(Arc::new(onboarding), Arc::new(roster));

        let mut cache = RowCache::open(
            config.profile,
            Box::new(FileStore::new(&config.cache_file)),
            config.cache_enabled,
        );
        if config.reset_cache {
            warn!("🗑️ 清空档案 '{}' 的缓存", config.profile);
            cache.reset()?;
        }

        let focus = TabFocus {
            sheet: sheet_page,
            portal: portal_page,
        };

        Ok(Self {
            config,
            settings,
            _browser: browser,
            clock,
            cells,
            cache,
            flow,
            reconciler,
            focus,
        })
    }

    /// 跑完整个批次
    pub async fn run(mut self) -> Result<RunStats> {
        info!("{}", "=".repeat(60));
        info!("🚀 承包商入职批量提交");
        info!("   档案: {}  起始行: {}  结束行: {}",
            self.config.profile,
            self.config.start_row.unwrap_or(self.settings.first_data_row),
            self.config.end_row.map(|r| r.to_string()).unwrap_or_else(|| "自动".to_string()),
        );
        if self.config.dry_run {
            info!("   🧪 演练模式：只读不写");
        }
        if self.config.verify_only {
            info!("   🔍 仅核验模式：不提交");
        }
        info!("{}", "=".repeat(60));

        let mut processor = RowProcessor {
            cells: &self.cells,
            cache: &mut self.cache,
            flow: &self.flow,
            reconciler: &self.reconciler,
            focus: &self.focus,
            settings: &self.settings,
            config: &self.config,
        };

        let stats = run_batch(&mut processor, self.clock.as_ref()).await;
        stats.log_summary();
        Ok(stats)
    }
}
