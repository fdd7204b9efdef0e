//! # Contractor Onboard Submit
//!
//! 一个用于承包商入职批量提交的 Rust 应用程序：
//! 从表格逐行读取承包商数据，驱动门户的 8 步入职向导提交，
//! 把结果写回表格，并对已完成行做双视图核验。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() / 元素操作能力
//! - `Clock` / `RetryPolicy` / `wait_dom_idle` - 注入式时钟、重试与 DOM 静默
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单行 / 单人
//! - `CellIo` - 带校验的单元格读写能力
//! - `name_parser` - 姓名拆分能力
//! - `RowCache` - 按档案命名空间的行缓存能力
//! - `VerificationReconciler` - 双视图核验裁定能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的完整提交流程
//! - `SubmissionCtx` - 上下文封装（行号 + 承包商）
//! - `SubmissionFlow` - 8 步向导状态机（就绪 → 操作 → 提交推进）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量行处理器，管理资源和节奏
//! - `orchestrator/row_processor` - 单行处理器，缓存/跳过/提交/核验决策
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser;
pub use cli::Cli;
pub use config::{Config, Profile, ProfileSettings};
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{CacheEntry, Contractor, RowRecord, Step, Verdict, WorkflowRun};
pub use orchestrator::{run_batch, App, RowProcessor, RowResult, RunStats};
pub use workflow::{SubmissionCtx, SubmissionFlow};
