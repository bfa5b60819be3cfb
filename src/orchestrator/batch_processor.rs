//! 批量组卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责题库加载、单元划分和并发调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、构建组卷流程
//! 2. **批量加载**：扫描并加载所有题库文件（`Vec<Question>`）
//! 3. **单元划分**：按话题/主题拆成互不共享题池的组卷单元
//! 4. **并发控制**：使用 Semaphore 限制同时运行的单元数量；单元较少时顺序执行
//! 5. **故障隔离**：单个单元失败（包括 panic）只记录日志，不影响其它单元
//! 6. **全局统计**：汇总所有单元的组卷结果

use crate::config::Config;
use crate::error::{AppError, AssemblyError};
use crate::infrastructure::MockRenderer;
use crate::models::question::Question;
use crate::orchestrator::grouping;
use crate::utils::logging;
use crate::workflow::{AssemblyFlow, AssemblyUnit, UnitReport};
use anyhow::{Context, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<AssemblyFlow>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, renderer: Arc<dyn MockRenderer>) -> Result<Self> {
        config.validate().map_err(AppError::from)?;

        // 初始化日志文件
        logging::init_log_file(&config.output_log_file).with_context(|| {
            format!("无法写入日志文件: {}", config.output_log_file.display())
        })?;

        logging::log_startup(config.max_concurrent_units);

        let flow = AssemblyFlow::new(&config, renderer).map_err(AppError::from)?;

        Ok(Self {
            config,
            flow: Arc::new(flow),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchStats> {
        let questions = self.load_questions().await?;

        if questions.is_empty() {
            warn!("⚠️ 没有找到任何题目，程序结束");
            return Ok(BatchStats::default());
        }

        let units = grouping::build_units(&questions, &self.config);
        logging::log_units_loaded(questions.len(), units.len());

        if units.is_empty() {
            warn!("⚠️ 没有可组卷的单元，程序结束");
            return Ok(BatchStats::default());
        }

        let reports = self.process_units(units).await?;
        let stats = self.summarize(&reports);

        logging::print_final_stats(
            stats.mocks_rendered,
            stats.render_failures,
            stats.skipped,
            stats.units,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 加载题库
    async fn load_questions(&self) -> Result<Vec<Question>> {
        info!("\n📁 正在扫描题库...");
        crate::models::load_all_question_banks(&self.config.question_folder).await
    }

    /// 处理所有单元
    ///
    /// 返回的报告与输入单元顺序一致
    pub async fn process_units(&self, units: Vec<AssemblyUnit>) -> Result<Vec<UnitReport>> {
        if units.len() <= self.config.sequential_threshold {
            info!("📋 单元数量 {} 较少，顺序执行", units.len());
            return Ok(units
                .into_iter()
                .map(|unit| run_isolated(&self.flow, unit))
                .collect());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_units.max(1)));
        let mut handles = Vec::with_capacity(units.len());

        // 每个单元独占自己的题池，直接移交给工作线程
        for unit in units {
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = Arc::clone(&self.flow);
            let label = unit.label.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                flow.run(unit)
            });
            handles.push((label, handle));
        }

        let results = futures::future::join_all(
            handles
                .into_iter()
                .map(|(label, handle)| async move { (label, handle.await) }),
        )
        .await;

        let reports = results
            .into_iter()
            .map(|(label, result)| match result {
                Ok(report) => report,
                Err(e) => failed_report(&label, e.to_string()),
            })
            .collect();

        Ok(reports)
    }

    fn summarize(&self, reports: &[UnitReport]) -> BatchStats {
        let mut stats = BatchStats {
            units: reports.len(),
            ..Default::default()
        };

        for report in reports {
            logging::log_unit_complete(report);
            if let Err(e) = logging::append_unit_report(&self.config.output_log_file, report) {
                warn!("⚠️ 写入日志文件失败: {}", e);
            }

            if report.skipped.is_some() {
                stats.skipped += 1;
            }
            stats.mocks_rendered += report.rendered();
            stats.render_failures += report.render_failures;
        }

        stats
    }
}

/// 批量处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub units: usize,
    pub skipped: usize,
    pub mocks_rendered: usize,
    pub render_failures: usize,
}

/// 在当前线程运行单元，panic 时转换为失败报告
fn run_isolated(flow: &AssemblyFlow, unit: AssemblyUnit) -> UnitReport {
    let label = unit.label.clone();
    match catch_unwind(AssertUnwindSafe(|| flow.run(unit))) {
        Ok(report) => report,
        Err(_) => failed_report(&label, "panic".to_string()),
    }
}

fn failed_report(label: &str, message: String) -> UnitReport {
    let err = AssemblyError::TaskFailed {
        unit: label.to_string(),
        message,
    };
    error!("❌ {}", err);
    UnitReport {
        label: label.to_string(),
        skipped: Some(err.to_string()),
        ..Default::default()
    }
}
