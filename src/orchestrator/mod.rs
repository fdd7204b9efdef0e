//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按行批处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量行处理器
//! - 管理应用生命周期（接入浏览器、定位表格/门户标签页、运行、收尾）
//! - 严格升序逐行处理，行间绝不并发（所有行共享同一个交互会话）
//! - 提交节奏控制（行间延迟 + 每 N 次长暂停）
//! - 连续空行停止条件
//! - 输出全局统计信息
//!
//! ### `row_processor` - 单行处理器
//! - 缓存快速跳过 → 读行数据 → 拆姓名 → 提交或核验 → 写结果 → 持久化缓存
//! - 行级错误边界：单行失败只记录，不中断批次
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (行循环 + 节奏 + 统计)
//!     ↓
//! row_processor (单行决策)
//!     ↓
//! workflow::SubmissionFlow (8 步提交) / services::VerificationReconciler (双视图核验)
//!     ↓
//! services (能力层：CellIo / RowCache / name_parser)
//!     ↓
//! infrastructure (基础设施：JsExecutor / Clock / Retry)
//! ```

pub mod batch_processor;
pub mod row_processor;

pub use batch_processor::{run_batch, App, RunStats};
pub use row_processor::{RowProcessor, RowResult, ViewFocus};
