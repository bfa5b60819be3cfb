//! 日志工具模块
//!
//! 提供日志初始化、运行日志文件和横幅输出的辅助函数

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::workflow::UnitReport;

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。
/// 重复初始化（例如测试中）会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n组卷日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 把单元报告追加到日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `report`: 单元报告
pub fn append_unit_report(log_file_path: &Path, report: &UnitReport) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    let mut line = format!(
        "{} | 模拟卷 {} | 渲染失败 {} | 已用 {} 道 | 剩余 {} 道",
        report.label,
        report.mocks.len(),
        report.render_failures,
        report.used_keys.len(),
        report.leftover
    );
    if let Some(reason) = &report.skipped {
        line.push_str(&format!(" | 跳过: {}", reason));
    }
    line.push('\n');
    for mock in &report.mocks {
        line.push_str(&format!(
            "    {} [{}] {} 道题, {} 分, {} 分钟, 档位 {}{}\n",
            mock.name,
            mock.kind,
            mock.question_count,
            mock.total_marks,
            mock.total_minutes,
            mock.tier,
            if mock.output.is_some() { "" } else { " (渲染失败)" }
        ));
    }

    file.write_all(line.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发数
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟卷组卷");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录单元加载信息
///
/// # 参数
/// - `questions`: 题目总数
/// - `units`: 单元总数
pub fn log_units_loaded(questions: usize, units: usize) {
    info!("✓ 共加载 {} 道题目", questions);
    info!("📋 划分为 {} 个组卷单元\n", units);
}

/// 记录单元完成信息
///
/// # 参数
/// - `report`: 单元报告
pub fn log_unit_complete(report: &UnitReport) {
    info!("\n{}", "─".repeat(60));
    match &report.skipped {
        Some(reason) => info!("⏭️ [单元 {}] 已跳过: {}", report.label, reason),
        None => info!(
            "✓ [单元 {}] 完成: 渲染 {}/{} 份, 剩余 {} 道题",
            report.label,
            report.rendered(),
            report.mocks.len(),
            report.leftover
        ),
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `mocks`: 成功渲染的模拟卷数量
/// - `failed`: 渲染失败的模拟卷数量
/// - `skipped`: 跳过的单元数量
/// - `total`: 单元总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    mocks: usize,
    failed: usize,
    skipped: usize,
    total: usize,
    log_file_path: &Path,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部组卷完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 生成模拟卷: {}", mocks);
    info!("❌ 渲染失败: {}", failed);
    info!("⏭️ 跳过单元: {}/{}", skipped, total);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}
