//! 双视图核验 - 业务能力层
//!
//! 两个异步更新、相互独立的视图可能不一致，
//! 这里把它们合成一个裁定：yes / no / unresolved

use crate::models::Verdict;
use crate::services::status_views::{StatusView, ViewHit};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// 双视图核验器
///
/// 先查信号更丰富的"入职进行中"视图（带百分比），
/// 查不到再查"花名册"（在即为完成）；
/// 两边都没有 → unresolved，调用方什么都不写 ——
/// "没找到"有信息量，但不等于任何一个终态，
/// 写下错误的 NO 会压掉之后才出现的正确值
pub struct VerificationReconciler {
    onboarding: Arc<dyn StatusView>,
    roster: Arc<dyn StatusView>,
}

impl VerificationReconciler {
    pub fn new(onboarding: Arc<dyn StatusView>, roster: Arc<dyn StatusView>) -> Self {
        Self { onboarding, roster }
    }

    /// 按姓名核验完成状态
    pub async fn resolve(&self, first_name: &str, last_name: &str) -> Result<Verdict> {
        let full_name = format!("{} {}", first_name, last_name);
        let full_name = full_name.trim();

        match self.onboarding.search(full_name).await? {
            ViewHit::Found { progress } => {
                debug!("入职视图命中: {} (进度 {:?})", full_name, progress);
                if progress == Some(100) {
                    Ok(Verdict::Yes)
                } else {
                    Ok(Verdict::No)
                }
            }
            ViewHit::NotFound => match self.roster.search(full_name).await? {
                ViewHit::Found { .. } => {
                    debug!("花名册命中: {}", full_name);
                    Ok(Verdict::Yes)
                }
                ViewHit::NotFound => {
                    info!("两个视图都找不到 {}，裁定 unresolved", full_name);
                    Ok(Verdict::Unresolved)
                }
            },
        }
    }
}
