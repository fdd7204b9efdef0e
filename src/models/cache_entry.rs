//! 行缓存条目
//!
//! 以 (profile, row) 为键，字段级合并更新，只增不删

use serde::{Deserialize, Serialize};

/// 完成状态（已知时）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completed {
    Yes,
    No,
}

/// 缓存条目
///
/// 所有字段都是 Option：None 表示"尚未观察到"，
/// 合并写入时 None 不会覆盖已有的值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 是否已提交过表单
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<bool>,

    /// 行内姓名（用于快速跳过时的日志显示）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 核验后的完成状态
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<Completed>,

    /// 核验视图中读到的原始文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_raw: Option<String>,

    /// 该行是否为空行
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
}

impl CacheEntry {
    /// 字段级合并：update 中的 Some 覆盖，None 保留原值
    pub fn merge(&mut self, update: CacheUpdate) {
        if update.sent.is_some() {
            self.sent = update.sent;
        }
        if update.name.is_some() {
            self.name = update.name;
        }
        if update.completed.is_some() {
            self.completed = update.completed;
        }
        if update.completed_raw.is_some() {
            self.completed_raw = update.completed_raw;
        }
        if update.empty.is_some() {
            self.empty = update.empty;
        }
    }
}

/// 缓存部分更新（与 CacheEntry 同构，语义是 patch 而非整体替换）
#[derive(Debug, Clone, Default)]
pub struct CacheUpdate {
    pub sent: Option<bool>,
    pub name: Option<String>,
    pub completed: Option<Completed>,
    pub completed_raw: Option<String>,
    pub empty: Option<bool>,
}

impl CacheUpdate {
    pub fn sent(mut self, sent: bool) -> Self {
        self.sent = Some(sent);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn completed(mut self, completed: Completed) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn completed_raw(mut self, raw: impl Into<String>) -> Self {
        self.completed_raw = Some(raw.into());
        self
    }

    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = Some(empty);
        self
    }
}
