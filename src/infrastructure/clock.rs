//! 可注入的时钟 - 基础设施层
//!
//! 所有轮询/退避/节奏控制都通过 Clock 进行，
//! 测试中用 ManualClock 替换，彻底消除真实休眠

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 时钟能力
///
/// - `now()` 返回自时钟创建以来的单调时长
/// - `sleep()` 挂起当前任务
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
    async fn sleep(&self, dur: Duration);
}

/// 真实时钟（tokio）
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// 手动时钟：sleep 不等待，立即推进虚拟时间
///
/// 只用于测试，让超时路径可以瞬间走完
pub struct ManualClock {
    elapsed_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            elapsed_ms: AtomicU64::new(0),
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }

    async fn sleep(&self, dur: Duration) {
        self.elapsed_ms
            .fetch_add(dur.as_millis() as u64, Ordering::SeqCst);
    }
}
