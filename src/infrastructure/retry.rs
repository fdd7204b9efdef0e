//! 有界重试策略 - 基础设施层
//!
//! 把"最多 N 次 + 递增退避"表达成可复用的组合子，
//! 避免每个调用点各写一套递归重试

use crate::infrastructure::Clock;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// 重试策略：最大尝试次数 + 线性递增退避
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// 第 attempt 次失败后的退避时长（attempt 从 1 开始）
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay * attempt as u32
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// 反复执行 op，直到它产出 Some 或次数耗尽
///
/// - `Ok(Some(v))`：本次尝试成功
/// - `Ok(None)`：本次尝试未达成，退避后重试
/// - `Err(_)`：硬错误，立即向上传播
///
/// 次数耗尽返回 `Ok(None)`，由调用方决定如何上报
pub async fn retry_until<T, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    mut op: F,
) -> Result<Option<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = op(attempt).await? {
            return Ok(Some(value));
        }
        if attempt < policy.max_attempts {
            clock.sleep(policy.delay_for(attempt)).await;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ManualClock;

    #[tokio::test]
    async fn succeeds_on_later_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let clock = ManualClock::new();

        let result = retry_until(&policy, &clock, |attempt| async move {
            if attempt >= 2 {
                Ok(Some(attempt))
            } else {
                Ok(None)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, Some(2));
        // 第一次失败后退避了一次
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn exhausts_without_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let clock = ManualClock::new();

        let result: Option<()> = retry_until(&policy, &clock, |_| async { Ok(None) })
            .await
            .unwrap();

        assert_eq!(result, None);
        // 退避递增：100ms + 200ms（最后一次失败不再退避）
        assert_eq!(clock.now(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn hard_error_propagates() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let clock = ManualClock::new();

        let result: Result<Option<()>> = retry_until(&policy, &clock, |_| async {
            anyhow::bail!("连接中断")
        })
        .await;

        assert!(result.is_err());
    }
}
