//! 提交上下文
//!
//! 封装"我正在为第几行的哪位承包商提交"这一信息

use crate::models::Contractor;
use std::fmt::Display;

/// 单次提交的上下文
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 承包商数据（已拆分姓名）
    pub contractor: Contractor,

    /// 行号（仅用于日志显示）
    pub row: u32,
}

impl SubmissionCtx {
    pub fn new(contractor: Contractor) -> Self {
        let row = contractor.row;
        Self { contractor, row }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[行#{} {} <{}>]",
            self.row, self.contractor.full_name, self.contractor.email
        )
    }
}
