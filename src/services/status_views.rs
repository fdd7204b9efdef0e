//! 门户状态视图 - 业务能力层
//!
//! 两个只读视图各自独立刷新："入职进行中"列表带完成百分比，
//! "花名册"列表只有在/不在。搜索机制：找到可见搜索框 → 清空 →
//! 输入全名 → 固定稳定间隔 + DOM 静默 → 扫描渲染出的行

use crate::infrastructure::{wait_dom_idle, Clock, JsExecutor};
use crate::utils::truncate_text;
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 视图搜索结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewHit {
    /// 没有匹配行（或页面直接显示"无结果"）
    NotFound,
    /// 找到匹配行；入职视图附带完成百分比，花名册没有
    Found { progress: Option<u8> },
}

/// 状态视图能力（真实实现走 CDP，测试用固定结果替换）
#[async_trait]
pub trait StatusView: Send + Sync {
    async fn search(&self, full_name: &str) -> Result<ViewHit>;
}

/// 视图种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// 入职进行中（行内有百分比）
    Onboarding,
    /// 花名册（在即为完成）
    Roster,
}

/// 页面级"无结果"短语：出现即短路为未找到，不再扫描
const NO_RESULTS_PHRASES: [&str; 3] = ["no results", "no people found", "nothing matched"];

/// 可见搜索框的候选选择器
const SEARCH_INPUT: &str = "input[type=search], input[placeholder*='earch']";

/// 门户状态视图的 CDP 实现
pub struct PortalStatusView {
    executor: JsExecutor,
    clock: Arc<dyn Clock>,
    kind: ViewKind,
    url: String,
    settle: Duration,
    idle_cap: Duration,
}

impl PortalStatusView {
    pub fn new(
        executor: JsExecutor,
        clock: Arc<dyn Clock>,
        kind: ViewKind,
        url: impl Into<String>,
        settle_ms: u64,
        idle_cap_secs: u64,
    ) -> Self {
        Self {
            executor,
            clock,
            kind,
            url: url.into(),
            settle: Duration::from_millis(settle_ms),
            idle_cap: Duration::from_secs(idle_cap_secs),
        }
    }

    /// 返回页面上渲染出的候选行文本
    async fn rendered_rows(&self) -> Result<Vec<String>> {
        self.executor
            .eval_as(
                r#"
                (() => {
                    const nodes = document.querySelectorAll(
                        'tbody tr, [role="row"], li[role="listitem"]'
                    );
                    return [...nodes].map(n => n.innerText || '');
                })()
                "#,
            )
            .await
    }

    async fn body_text(&self) -> Result<String> {
        self.executor
            .eval_string("document.body ? document.body.innerText : ''")
            .await
    }
}

#[async_trait]
impl StatusView for PortalStatusView {
    async fn search(&self, full_name: &str) -> Result<ViewHit> {
        debug!("{:?} 视图搜索: {}", self.kind, full_name);

        self.executor.page().goto(self.url.as_str()).await?;
        self.clock.sleep(self.settle).await;

        // 找到可见搜索框，清空后输入全名
        let input = self.executor.find(SEARCH_INPUT).await?;
        input.click().await?;
        self.executor
            .eval(format!(
                "document.querySelector(\"{}\")?.select()",
                SEARCH_INPUT
            ))
            .await?;
        input.press_key("Delete").await?;
        input.type_str(full_name).await?;

        // 固定稳定间隔 + DOM 静默，等搜索结果渲染完
        self.clock.sleep(self.settle).await;
        wait_dom_idle(&*self.clock, self.settle, self.idle_cap, || {
            self.executor.mutation_tick()
        })
        .await?;

        // 页面级"无结果"短语直接短路
        let body = self.body_text().await?.to_lowercase();
        if NO_RESULTS_PHRASES.iter().any(|p| body.contains(p)) {
            return Ok(ViewHit::NotFound);
        }

        // 扫描行文本，大小写不敏感子串匹配
        let needle = full_name.to_lowercase();
        for row_text in self.rendered_rows().await? {
            if !row_text.to_lowercase().contains(&needle) {
                continue;
            }
            debug!("{:?} 视图命中行: {}", self.kind, truncate_text(&row_text, 80));
            return Ok(match self.kind {
                ViewKind::Onboarding => ViewHit::Found {
                    progress: extract_progress(&row_text),
                },
                ViewKind::Roster => ViewHit::Found { progress: None },
            });
        }

        Ok(ViewHit::NotFound)
    }
}

/// 从行文本里抠出 "NN%" 形式的完成百分比
fn extract_progress(row_text: &str) -> Option<u8> {
    let re = Regex::new(r"(\d{1,3})\s*%").ok()?;
    let captures = re.captures(row_text)?;
    captures.get(1)?.as_str().parse().ok()
}
