//! DOM 静默等待 - 基础设施层
//!
//! 页面点击后往往还有一波异步渲染在路上，
//! 等到"一个静默窗口内没有任何 DOM 变动"再继续，避免与在途更新赛跑

use crate::infrastructure::Clock;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// 注入到页面的变动计数器
///
/// 惰性安装一个 MutationObserver，每次 DOM 变动计数 +1
pub const MUTATION_TICK_JS: &str = r#"
    (() => {
        if (window.__onb_mut_count === undefined) {
            window.__onb_mut_count = 0;
            new MutationObserver(() => { window.__onb_mut_count += 1; })
                .observe(document.documentElement, {
                    childList: true,
                    subtree: true,
                    attributes: true,
                    characterData: true,
                });
        }
        return window.__onb_mut_count;
    })()
"#;

/// 等待 DOM 静默：连续 settle 窗口内计数不变即为静默
///
/// 返回是否在 cap 上限内达到静默（超限返回 false，不视为错误）
pub async fn wait_dom_idle<F, Fut>(
    clock: &dyn Clock,
    settle: Duration,
    cap: Duration,
    mut tick: F,
) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let start = clock.now();
    let mut last = tick().await?;

    loop {
        clock.sleep(settle).await;
        let current = tick().await?;
        if current == last {
            return Ok(true);
        }
        last = current;
        if clock.now() - start >= cap {
            return Ok(false);
        }
    }
}
