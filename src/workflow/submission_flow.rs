//! 提交流程状态机 - 流程层
//!
//! 核心职责：驱动一位承包商走完 8 步入职向导
//!
//! 每一步的骨架相同：
//! 1. 等页面就绪（无加载指示 + 至少一个可见动作控件，轮询限时）
//! 2. 执行该步的字段交互
//! 3. 按可见文本找提交控件（找不到退回提交角色兜底），点击
//! 4. 并发等待导航或固定超时，再等 DOM 静默
//!
//! 任一步骤失败即中止该行剩余步骤，不在本次运行内重试 ——
//! 表单在服务端有持久状态，重试半完成的提交并不安全

use crate::error::StepError;
use crate::infrastructure::{wait_dom_idle, Clock};
use crate::models::{Step, WorkflowRun};
use crate::workflow::form_surface::{ControlHandle, Criteria, DateInputs, FormSurface};
use crate::workflow::submission_ctx::SubmissionCtx;
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 页面加载指示短语：出现任何一个即视为未就绪
const LOADING_PHRASES: [&str; 3] = ["loading", "please wait", "one moment"];

/// 动作控件的可识别短语（就绪条件的另一半）
const ACTION_PHRASES: [&str; 7] = [
    "save", "continue", "submit", "send", "next", "start", "complete",
];

/// 流程节奏参数
#[derive(Debug, Clone, Copy)]
pub struct FlowTiming {
    /// 每步就绪等待超时
    pub ready_timeout: Duration,
    /// 就绪轮询间隔
    pub poll_interval: Duration,
    /// DOM 静默窗口
    pub settle: Duration,
    /// DOM 静默等待总上限
    pub idle_cap: Duration,
    /// 点击后等待导航的固定超时
    pub nav_timeout: Duration,
}

impl Default for FlowTiming {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_millis(300),
            idle_cap: Duration::from_secs(8),
            nav_timeout: Duration::from_secs(5),
        }
    }
}

/// 提交流程状态机
///
/// - 不持有任何稀缺资源（浏览器在表面实现里）
/// - 只依赖 FormSurface 能力和注入时钟，可整体模拟
pub struct SubmissionFlow {
    surface: Arc<dyn FormSurface>,
    clock: Arc<dyn Clock>,
    timing: FlowTiming,
    form_url: String,
}

impl SubmissionFlow {
    pub fn new(
        surface: Arc<dyn FormSurface>,
        clock: Arc<dyn Clock>,
        timing: FlowTiming,
        form_url: impl Into<String>,
    ) -> Self {
        Self {
            surface,
            clock,
            timing,
            form_url: form_url.into(),
        }
    }

    /// 跑完 8 步，返回运行结果（步骤异常不外抛，汇总在 WorkflowRun 里）
    pub async fn run(&self, ctx: &SubmissionCtx) -> WorkflowRun {
        let start = self.clock.now();
        let mut run = WorkflowRun::default();

        for step in Step::ALL {
            info!("[行 {}] ▶ 步骤 {}", ctx.row, step);

            match self.execute_step(step, ctx).await {
                Ok(()) => {
                    info!("[行 {}] ✓ 步骤 {} 完成", ctx.row, step);
                    run.steps_completed.push(step);
                }
                Err(e) => {
                    error!(
                        "[行 {}] ❌ 步骤 {} 失败: {} (已完成 {}/{} 步)",
                        ctx.row,
                        step,
                        e,
                        run.steps_completed.len(),
                        Step::ALL.len()
                    );
                    run.errors.push(e.to_string());
                    run.success = false;
                    run.elapsed = self.clock.now() - start;
                    return run;
                }
            }
        }

        run.success = true;
        run.elapsed = self.clock.now() - start;
        run
    }

    async fn execute_step(&self, step: Step, ctx: &SubmissionCtx) -> Result<(), StepError> {
        self.wait_until_ready(step).await?;
        self.perform(step, ctx).await?;
        self.commit(step).await?;
        Ok(())
    }

    /// 就绪条件：无加载指示文本 且 至少一个可识别的动作控件可见
    async fn wait_until_ready(&self, step: Step) -> Result<(), StepError> {
        let start = self.clock.now();

        loop {
            let body = self
                .surface
                .body_text()
                .await
                .map_err(|e| interaction(step, e))?;
            let lower = body.to_lowercase();
            let loading = LOADING_PHRASES.iter().any(|p| lower.contains(p));

            if !loading && self.any_action_control().await.map_err(|e| interaction(step, e))? {
                return Ok(());
            }

            if self.clock.now() - start >= self.timing.ready_timeout {
                return Err(StepError::NotReady {
                    step: step.label(),
                    waited_secs: self.timing.ready_timeout.as_secs(),
                });
            }
            self.clock.sleep(self.timing.poll_interval).await;
        }
    }

    async fn any_action_control(&self) -> Result<bool> {
        for phrase in ACTION_PHRASES {
            if self
                .surface
                .locate(&Criteria::text(&[phrase]))
                .await?
                .is_some()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 该步的字段交互
    async fn perform(&self, step: Step, ctx: &SubmissionCtx) -> Result<(), StepError> {
        match step {
            Step::NavigateToForm => self
                .surface
                .goto(&self.form_url)
                .await
                .map_err(|e| interaction(step, e)),
            Step::FillBasics => {
                self.fill_field(step, "first name", &ctx.contractor.first_name)
                    .await?;
                self.fill_field(step, "last name", &ctx.contractor.last_name)
                    .await?;
                self.fill_field(step, "email", &ctx.contractor.email).await
            }
            Step::SetStartDate => self.fill_start_date(step).await,
            Step::SelectCompensation => {
                // 固定选"按项目"报酬形式，金额留待后台补录
                let option = self
                    .surface
                    .locate(&Criteria::text(&["by project"]))
                    .await
                    .map_err(|e| interaction(step, e))?;
                match option {
                    Some(handle) => self
                        .surface
                        .click(&handle)
                        .await
                        .map_err(|e| interaction(step, e)),
                    None => Err(StepError::FieldMissing {
                        step: step.label(),
                        field: "报酬形式选项".to_string(),
                    }),
                }
            }
            // 纯确认页：没有字段交互，只有提交控件
            Step::SubmitReview
            | Step::CompleteOnboarding
            | Step::SubmitContactDetails
            | Step::SendInvitation => Ok(()),
        }
    }

    async fn fill_field(&self, step: Step, label: &str, value: &str) -> Result<(), StepError> {
        let handle = self
            .surface
            .locate(&Criteria::Field(label.to_string()))
            .await
            .map_err(|e| interaction(step, e))?
            .ok_or_else(|| StepError::FieldMissing {
                step: step.label(),
                field: label.to_string(),
            })?;
        self.surface
            .clear_and_type(&handle, value)
            .await
            .map_err(|e| interaction(step, e))
    }

    /// 开始日期：优先月/日/年三分输入，退而合并输入，两者皆无即失败
    async fn fill_start_date(&self, step: Step) -> Result<(), StepError> {
        let date = next_monday(chrono::Local::now().date_naive());

        match self
            .surface
            .date_inputs()
            .await
            .map_err(|e| interaction(step, e))?
        {
            DateInputs::Split { month, day, year } => {
                self.type_into(step, &month, &format!("{:02}", date.month()))
                    .await?;
                self.type_into(step, &day, &format!("{:02}", date.day()))
                    .await?;
                self.type_into(step, &year, &date.year().to_string()).await
            }
            DateInputs::Combined { input } => {
                let text = format!("{:02}/{:02}/{}", date.month(), date.day(), date.year());
                self.type_into(step, &input, &text).await
            }
            DateInputs::Missing => Err(StepError::DateInputsMissing { step: step.label() }),
        }
    }

    async fn type_into(
        &self,
        step: Step,
        handle: &ControlHandle,
        text: &str,
    ) -> Result<(), StepError> {
        self.surface
            .clear_and_type(handle, text)
            .await
            .map_err(|e| interaction(step, e))
    }

    /// 找提交控件并点击，然后等导航/超时 + DOM 静默
    async fn commit(&self, step: Step) -> Result<(), StepError> {
        let phrases = commit_phrases(step);

        let control = self
            .surface
            .locate(&Criteria::text(phrases))
            .await
            .map_err(|e| interaction(step, e))?;

        // 文本未命中时退回提交角色兜底
        let control = match control {
            Some(c) => c,
            None => {
                warn!("步骤 {} 文本匹配未命中，尝试提交角色兜底", step);
                self.surface
                    .locate(&Criteria::SubmitRole)
                    .await
                    .map_err(|e| interaction(step, e))?
                    .ok_or_else(|| StepError::ControlNotFound {
                        step: step.label(),
                        wanted: phrases.join("+"),
                    })?
            }
        };

        self.surface
            .click(&control)
            .await
            .map_err(|e| interaction(step, e))?;

        self.surface
            .wait_for_navigation(self.timing.nav_timeout)
            .await
            .map_err(|e| interaction(step, e))?;

        wait_dom_idle(
            &*self.clock,
            self.timing.settle,
            self.timing.idle_cap,
            || self.surface.mutation_tick(),
        )
        .await
        .map_err(|e| interaction(step, e))?;

        Ok(())
    }
}

/// 每步提交控件的期望文本短语（全部需命中，大小写不敏感）
fn commit_phrases(step: Step) -> &'static [&'static str] {
    match step {
        Step::NavigateToForm => &["start"],
        Step::FillBasics => &["save", "continue"],
        Step::SetStartDate => &["save", "continue"],
        Step::SelectCompensation => &["save", "continue"],
        Step::SubmitReview => &["submit"],
        Step::CompleteOnboarding => &["complete"],
        Step::SubmitContactDetails => &["save", "continue"],
        Step::SendInvitation => &["send"],
    }
}

fn interaction(step: Step, e: anyhow::Error) -> StepError {
    StepError::Interaction {
        step: step.label(),
        source: e.into(),
    }
}

/// 下一个周一（开始日期必须在未来，入职默认排到下周一）
fn next_monday(today: NaiveDate) -> NaiveDate {
    let days_ahead = 7 - today.weekday().num_days_from_monday() as i64;
    today + ChronoDuration::days(days_ahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ManualClock;
    use crate::models::Contractor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 脚本化的模拟表单：每次点击提交控件推进一个阶段
    struct FakeForm {
        /// 已提交的阶段数（即已点击次数）
        stage: AtomicUsize,
        /// 这些阶段（0 起）永远停在加载中
        stuck_stages: Vec<usize>,
        clicks: AtomicUsize,
        typed: Mutex<Vec<String>>,
        ticks: AtomicU64,
    }

    impl FakeForm {
        fn new(stuck_stages: Vec<usize>) -> Self {
            Self {
                stage: AtomicUsize::new(0),
                stuck_stages,
                clicks: AtomicUsize::new(0),
                typed: Mutex::new(Vec::new()),
                ticks: AtomicU64::new(0),
            }
        }

        fn stuck(&self) -> bool {
            self.stuck_stages
                .contains(&self.stage.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl FormSurface for FakeForm {
        async fn goto(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn body_text(&self) -> Result<String> {
            Ok(if self.stuck() {
                "Loading…".to_string()
            } else {
                "form ready".to_string()
            })
        }

        async fn locate(&self, criteria: &Criteria) -> Result<Option<ControlHandle>> {
            if self.stuck() {
                return Ok(None);
            }
            // 报酬形式选项是页内控件，点击不推进阶段
            let token = match criteria {
                Criteria::VisibleText(phrases)
                    if phrases.iter().any(|p| p.contains("project")) =>
                {
                    "option"
                }
                _ => "commit",
            };
            Ok(Some(ControlHandle {
                token: token.to_string(),
                text: "Save & Continue".to_string(),
            }))
        }

        async fn click(&self, control: &ControlHandle) -> Result<()> {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            if control.token == "commit" {
                self.stage.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        async fn clear_and_type(&self, _control: &ControlHandle, text: &str) -> Result<()> {
            self.typed.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn date_inputs(&self) -> Result<DateInputs> {
            let h = |t: &str| ControlHandle {
                token: t.to_string(),
                text: String::new(),
            };
            Ok(DateInputs::Split {
                month: h("m"),
                day: h("d"),
                year: h("y"),
            })
        }

        async fn wait_for_navigation(&self, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        async fn mutation_tick(&self) -> Result<u64> {
            Ok(self.ticks.load(Ordering::SeqCst))
        }
    }

    fn ctx() -> SubmissionCtx {
        SubmissionCtx::new(Contractor {
            first_name: "Caden".to_string(),
            last_name: "Lepple".to_string(),
            email: "caden@example.com".to_string(),
            full_name: "Caden Lepple".to_string(),
            row: 3,
        })
    }

    fn flow(surface: Arc<FakeForm>) -> SubmissionFlow {
        SubmissionFlow::new(
            surface,
            Arc::new(ManualClock::new()),
            FlowTiming::default(),
            "https://portal.example/contractors/new",
        )
    }

    #[tokio::test]
    async fn full_run_completes_all_eight_steps() {
        let surface = Arc::new(FakeForm::new(vec![]));
        let run = flow(surface.clone()).run(&ctx()).await;

        assert!(run.success, "errors: {:?}", run.errors);
        assert_eq!(run.steps_completed.len(), 8);
        assert_eq!(run.steps_completed.as_slice(), Step::ALL.as_slice());
        // 每步恰好一次提交点击（阶段推进 8 次），外加一次报酬选项点击
        assert_eq!(surface.stage.load(Ordering::SeqCst), 8);
        assert_eq!(surface.clicks.load(Ordering::SeqCst), 9);
        // 基本信息 3 个字段 + 日期 3 段
        assert_eq!(surface.typed.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn stuck_step_four_fails_with_three_completed() {
        // 阶段 3（0 起）= 第 4 步永不就绪
        let surface = Arc::new(FakeForm::new(vec![3]));
        let run = flow(surface).run(&ctx()).await;

        assert!(!run.success);
        assert_eq!(run.steps_completed.len(), 3);
        assert_eq!(
            run.steps_completed.as_slice(),
            &[Step::NavigateToForm, Step::FillBasics, Step::SetStartDate]
        );
        // 失败信息里带正确的步骤名
        assert!(run.errors[0].contains(Step::SelectCompensation.label()));
    }

    #[test]
    fn next_monday_is_strictly_in_the_future() {
        // 2026-08-24 是周一 → 下一个周一是 08-31
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(
            next_monday(monday),
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );
        // 周日 → 次日
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(
            next_monday(sunday),
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );
    }
}
