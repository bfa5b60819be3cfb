//! 基础设施层（Infrastructure Layer）
//!
//! 持有外部资源（输出目录、文档文件），只暴露"渲染一份模拟卷"的能力

pub mod renderer;

pub use renderer::{safe_file_name, DirectoryRenderer, MockRenderer};
