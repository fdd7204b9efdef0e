//! 提交流程的步骤与运行结果

use std::time::Duration;

/// 提交向导的 8 个步骤，严格有序，不可跳步、不可回退
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NavigateToForm,
    FillBasics,
    SetStartDate,
    SelectCompensation,
    SubmitReview,
    CompleteOnboarding,
    SubmitContactDetails,
    SendInvitation,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::NavigateToForm,
        Step::FillBasics,
        Step::SetStartDate,
        Step::SelectCompensation,
        Step::SubmitReview,
        Step::CompleteOnboarding,
        Step::SubmitContactDetails,
        Step::SendInvitation,
    ];

    /// 步骤名（用于日志和失败报告）
    pub fn label(&self) -> &'static str {
        match self {
            Step::NavigateToForm => "navigate_to_form",
            Step::FillBasics => "fill_basics",
            Step::SetStartDate => "set_start_date",
            Step::SelectCompensation => "select_compensation",
            Step::SubmitReview => "submit_review",
            Step::CompleteOnboarding => "complete_onboarding",
            Step::SubmitContactDetails => "submit_contact_details",
            Step::SendInvitation => "send_invitation",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 一次提交尝试的运行结果（临时对象，只存活到编排层汇总为止）
#[derive(Debug, Clone, Default)]
pub struct WorkflowRun {
    /// 已完成的步骤（有序）
    pub steps_completed: Vec<Step>,
    /// 是否全部步骤成功
    pub success: bool,
    /// 失败信息列表
    pub errors: Vec<String>,
    /// 本次尝试耗时
    pub elapsed: Duration,
}

/// 双视图核验的最终裁定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 确认完成
    Yes,
    /// 确认未完成
    No,
    /// 两个视图都找不到此人，不写任何结果
    Unresolved,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Yes => f.write_str("YES"),
            Verdict::No => f.write_str("NO"),
            Verdict::Unresolved => f.write_str("unresolved"),
        }
    }
}
