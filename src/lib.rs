//! # Mock Exam Builder
//!
//! 把已切好、打好标签的历年真题组合成按时长匹配的模拟卷
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源（输出目录、文档），只暴露能力
//! - `MockRenderer` - 渲染一份模拟卷；`DirectoryRenderer` 落盘实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，纯函数为主
//! - `Estimator` - 按分值和题型估算作答时间
//! - `TierSet` - 时间档位离散化
//! - `dedupe` - 按内容指纹去重
//! - `partition` / `group_by_section` - 题池划分与主题适用性过滤
//! - `Packer` - 贪心装箱选题
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个单元"的完整组卷流程
//! - `AssemblyUnit` - 单元上下文（话题或主题 + 独占的题目）
//! - `AssemblyFlow` - 流程编排（去重 → 划分 → 打包 → 渲染）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理并发和统计
//! - `orchestrator/grouping` - 把题库拆成组卷单元
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{AssemblyMode, Config};
pub use error::{AppError, AppResult};
pub use infrastructure::{DirectoryRenderer, MockRenderer};
pub use models::{MockExam, MockKind, Question};
pub use orchestrator::{App, BatchStats};
pub use workflow::{AssemblyFlow, AssemblyUnit, UnitReport};
