//! 承包商数据模型
//!
//! `RowRecord` 是表格中一行的原始读取结果；
//! `Contractor` 是经过姓名拆分后、提交流程真正消费的结构

use serde::{Deserialize, Serialize};

/// 表格中一行的原始数据
///
/// 空姓名不是错误，而是"数据到此为止"的信号（由编排层计数处理）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowRecord {
    /// 行号（表格中的绝对行号，从 1 开始）
    pub row: u32,

    /// 姓名原文（未拆分）
    pub full_name: String,

    /// 邮箱
    pub email: String,

    /// 提交状态标记（自由文本，与配置的完成标记做大小写不敏感比较）
    pub status_flag: String,

    /// 核验结果标记（YES / NO / 空）
    pub verification_flag: String,
}

impl RowRecord {
    /// 姓名为空 → 逻辑上的数据结束信号
    pub fn is_empty(&self) -> bool {
        self.full_name.trim().is_empty()
    }

    /// 状态标记是否等于完成标记（大小写不敏感）
    pub fn is_done(&self, done_marker: &str) -> bool {
        self.status_flag.trim().eq_ignore_ascii_case(done_marker)
    }
}

/// 承包商（一行数据拆分姓名后的结果）
///
/// 创建后不可变，只属于该行的本次处理
#[derive(Debug, Clone)]
pub struct Contractor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub full_name: String,
    pub row: u32,
}

impl Contractor {
    /// 由一行原始数据构建承包商
    pub fn from_record(record: &RowRecord) -> Self {
        let split = crate::services::name_parser::parse(&record.full_name);
        Self {
            first_name: split.first_name,
            last_name: split.last_name,
            email: record.email.trim().to_string(),
            full_name: record.full_name.trim().to_string(),
            row: record.row,
        }
    }
}
