//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量组卷处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 批量加载题库（Vec<Question>）
//! - 控制并发数量（Semaphore + spawn_blocking）
//! - 输出全局统计信息
//!
//! ### `grouping` - 单元划分
//! - 按话题标签或主题编号拆分题库
//! - 每个单元拿到自己的题目副本
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<AssemblyUnit>)
//!     ↓
//! workflow::AssemblyFlow (处理单个单元)
//!     ↓
//! services (能力层：estimator / tiers / dedup / partition / packer)
//!     ↓
//! infrastructure (基础设施：MockRenderer)
//! ```

pub mod batch_processor;
pub mod grouping;

// 重新导出主要类型
pub use batch_processor::{App, BatchStats};
pub use grouping::{build_units, group_by_theme, group_by_topic};
