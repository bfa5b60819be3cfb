//! 单元组卷流程 - 流程层
//!
//! 核心职责：定义"一个话题/主题"的完整组卷流程
//!
//! ```text
//! 去重 → 划分题池 → 打乱 → 计算总用时
//!   ├─ 总用时 < 最小档位：直接用剩余全部题目组成一份短卷
//!   └─ 否则：循环 { 打包 → 渲染 }，直到题池用尽或达到份数上限
//! ```
//!
//! 话题单元先出混合卷，再用剩余短题出短题卷；两者共用同一份题池，
//! 因此同一次运行中同一道题不会出现在两份模拟卷里。
//!
//! 单份模拟卷渲染失败只记录日志，流程继续。

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AssemblyError, ConfigError};
use crate::infrastructure::MockRenderer;
use crate::models::mock::{MockExam, MockKind};
use crate::services::dedup::dedupe;
use crate::services::estimator::Estimator;
use crate::services::packer::{PackParams, Packer, QuestionPool, Selection};
use crate::services::partition::{group_by_section, interleave_sections, partition, theme_section};
use crate::utils::hash::stable_hash;
use crate::workflow::unit_ctx::{AssemblyUnit, UnitKind};

/// 单份模拟卷的结果摘要
#[derive(Debug, Clone, Serialize)]
pub struct MockSummary {
    pub name: String,
    pub kind: MockKind,
    pub tier: u32,
    pub total_minutes: u32,
    pub total_marks: u32,
    pub question_count: usize,
    pub essay_count: usize,
    /// 是否命中档位窗口
    pub hit: bool,
    /// 渲染输出目录，渲染失败时为 None
    pub output: Option<PathBuf>,
}

/// 单元组卷报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnitReport {
    pub label: String,
    pub mocks: Vec<MockSummary>,
    pub render_failures: usize,
    /// 被选入模拟卷的题目身份键，按选入顺序
    pub used_keys: Vec<String>,
    /// 组卷结束后题池中剩余的题目数
    pub leftover: usize,
    pub duplicates_removed: usize,
    pub rejected: usize,
    /// 单元被跳过的原因
    pub skipped: Option<String>,
}

impl UnitReport {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn rendered(&self) -> usize {
        self.mocks.iter().filter(|m| m.output.is_some()).count()
    }
}

/// 一个阶段（某一类模拟卷）的组卷参数
struct Phase<'a> {
    kind: MockKind,
    params: &'a PackParams,
    max_mocks: usize,
    numbered: bool,
}

/// 单元组卷流程
///
/// - 编排去重、划分、打包、渲染
/// - 不持有任何题池，题池在每次 `run` 内部创建
/// - 可在多个线程间共享
pub struct AssemblyFlow {
    estimator: Estimator,
    mixed: PackParams,
    short: PackParams,
    unit: PackParams,
    max_mocks: usize,
    min_short_mocks: usize,
    shuffle_seed: Option<u64>,
    output_root: PathBuf,
    renderer: Arc<dyn MockRenderer>,
}

impl AssemblyFlow {
    pub fn new(config: &Config, renderer: Arc<dyn MockRenderer>) -> Result<Self, ConfigError> {
        Ok(Self {
            estimator: config.estimator()?,
            mixed: config.pack_params(MockKind::Mixed)?,
            short: config.pack_params(MockKind::ShortOnly)?,
            unit: config.pack_params(MockKind::Unit)?,
            max_mocks: config.max_mocks_per_topic,
            min_short_mocks: config.min_short_mocks,
            shuffle_seed: config.shuffle_seed,
            output_root: config.output_folder.clone(),
            renderer,
        })
    }

    /// 为一个单元组卷
    pub fn run(&self, unit: AssemblyUnit) -> UnitReport {
        let mut report = UnitReport::new(&unit.label);
        let mut rng = unit_rng(self.shuffle_seed, &unit.label);
        let unit_dir = self.output_root.join(&unit.dir_name);

        let total = unit.questions.len();
        let questions = dedupe(unit.questions);
        report.duplicates_removed = total - questions.len();

        if questions.is_empty() {
            let err = AssemblyError::EmptyPool {
                unit: unit.label.clone(),
            };
            warn!("⚠️ {}, 跳过", err);
            report.skipped = Some(err.to_string());
            return report;
        }

        let ctx = FlowCtx {
            label: &unit.label,
            unit_dir: &unit_dir,
            theme: match &unit.kind {
                UnitKind::Theme(eligibility) => Some(eligibility.theme),
                UnitKind::Topic => None,
            },
        };

        match &unit.kind {
            UnitKind::Topic => {
                let (standalone, essays) = partition(questions, &self.estimator);
                let mut standalone = QuestionPool::new(standalone);
                let mut essays = QuestionPool::new(essays);
                standalone.shuffle(&mut rng);
                essays.shuffle(&mut rng);

                info!(
                    "[单元 {}] 短题 {} 道, 论述题 {} 道",
                    unit.label,
                    standalone.len(),
                    essays.len()
                );

                let mixed = Phase {
                    kind: MockKind::Mixed,
                    params: &self.mixed,
                    max_mocks: self.max_mocks,
                    numbered: true,
                };
                self.run_phase(&ctx, &mixed, &mut standalone, &mut essays, &mut report);

                if self.min_short_mocks > 0 {
                    let short = Phase {
                        kind: MockKind::ShortOnly,
                        params: &self.short,
                        max_mocks: self.min_short_mocks,
                        numbered: self.min_short_mocks > 1,
                    };
                    let mut no_essays = QuestionPool::default();
                    self.run_phase(&ctx, &short, &mut standalone, &mut no_essays, &mut report);
                }

                report.leftover = standalone.len() + essays.len();
            }
            UnitKind::Theme(eligibility) => {
                let grouping = group_by_section(questions, eligibility);
                report.rejected = grouping.rejected.len();
                if grouping.eligible_count() == 0 {
                    let err = AssemblyError::EmptyPool {
                        unit: unit.label.clone(),
                    };
                    warn!("⚠️ {} (排除 {} 道), 跳过", err, report.rejected);
                    report.skipped = Some(err.to_string());
                    return report;
                }

                info!(
                    "[单元 {}] {} 个小节, 可用 {} 道, 排除 {} 道",
                    unit.label,
                    grouping.sections.len(),
                    grouping.eligible_count(),
                    report.rejected
                );

                let mut sections = grouping.sections;
                for bucket in sections.values_mut() {
                    bucket.shuffle(&mut rng);
                }
                let (standalone, essays) =
                    partition(interleave_sections(sections), &self.estimator);
                let mut standalone = QuestionPool::new(standalone);
                let mut essays = QuestionPool::new(essays);

                let phase = Phase {
                    kind: MockKind::Unit,
                    params: &self.unit,
                    max_mocks: self.max_mocks,
                    numbered: self.max_mocks > 1,
                };
                self.run_phase(&ctx, &phase, &mut standalone, &mut essays, &mut report);

                report.leftover = standalone.len() + essays.len();
            }
        }

        report
    }

    fn run_phase(
        &self,
        ctx: &FlowCtx<'_>,
        phase: &Phase<'_>,
        standalone: &mut QuestionPool,
        essays: &mut QuestionPool,
        report: &mut UnitReport,
    ) {
        let packer = Packer::new(&self.estimator, phase.params);
        let mut total_time = standalone.total_minutes(&self.estimator);
        if phase.kind.allows_essays() {
            total_time = total_time.saturating_add(essays.total_minutes(&self.estimator));
        }

        if total_time == 0 {
            info!("[单元 {}] 没有可用于{}的题目", ctx.label, phase.kind);
            return;
        }

        let min_tier = phase.params.tiers.min();
        if total_time < min_tier {
            info!(
                "[单元 {}] 总用时 {} 分钟不足最小档位 {} 分钟, 用全部剩余题目组成一份{}",
                ctx.label, total_time, min_tier, phase.kind
            );
            let selection = packer.take_all(standalone, essays);
            if !essays.is_empty() && phase.kind.allows_essays() {
                info!(
                    "[单元 {}] 论述题上限 {} 道, 另有 {} 道论述题未使用",
                    ctx.label,
                    phase.params.essay_cap,
                    essays.len()
                );
            }
            self.emit(ctx, phase, 1, selection, report);
            return;
        }

        let by_time = (total_time / min_tier) as usize;
        let possible = phase.max_mocks.min(by_time).max(1);
        info!(
            "[单元 {}] 总用时 {} 分钟, 计划生成 {} 份{}",
            ctx.label, total_time, possible, phase.kind
        );

        for index in 1..=possible {
            let essays_left = phase.kind.allows_essays() && !essays.is_empty();
            if standalone.is_empty() && !essays_left {
                info!("[单元 {}] 题池已用尽", ctx.label);
                break;
            }

            let selection = packer.pack(standalone, essays);
            if selection.is_empty() {
                let err = AssemblyError::ConstraintUnsatisfiable {
                    unit: ctx.label.to_string(),
                    index,
                    minutes: 0,
                };
                warn!("⚠️ {}, 停止生成{}", err, phase.kind);
                break;
            }
            if !selection.hit {
                let err = AssemblyError::ConstraintUnsatisfiable {
                    unit: ctx.label.to_string(),
                    index,
                    minutes: selection.total_minutes,
                };
                warn!("⚠️ {}, 使用部分结果", err);
            }

            self.emit(ctx, phase, index, selection, report);
        }
    }

    /// 构造模拟卷并交给渲染器
    fn emit(
        &self,
        ctx: &FlowCtx<'_>,
        phase: &Phase<'_>,
        index: usize,
        selection: Selection,
        report: &mut UnitReport,
    ) {
        if selection.is_empty() {
            return;
        }

        let sections = match ctx.theme {
            Some(theme) => covered_sections(&selection, theme),
            None => Vec::new(),
        };
        let name = phase.kind.dir_name(index, phase.numbered);
        report
            .used_keys
            .extend(selection.questions.iter().map(|q| q.identity_key()));

        let mock = MockExam {
            label: ctx.label.to_string(),
            kind: phase.kind,
            index,
            name: name.clone(),
            tier: selection.tier,
            total_minutes: selection.total_minutes,
            total_marks: selection.total_marks,
            questions: selection.questions,
            sections,
        };

        let dir = ctx.unit_dir.join(&name);
        let rendered = catch_unwind(AssertUnwindSafe(|| self.renderer.render(&mock, &dir)));
        let output = match rendered {
            Ok(Ok(path)) => {
                info!(
                    "[单元 {}] ✓ {} 完成: {} 道题, {} 分, {} 分钟 (档位 {})",
                    ctx.label,
                    name,
                    mock.question_count(),
                    mock.total_marks,
                    mock.total_minutes,
                    mock.tier
                );
                Some(path)
            }
            Ok(Err(e)) => {
                error!("[单元 {}] ❌ {} 渲染失败: {}", ctx.label, name, e);
                report.render_failures += 1;
                None
            }
            Err(_) => {
                error!("[单元 {}] ❌ {} 渲染时发生 panic", ctx.label, name);
                report.render_failures += 1;
                None
            }
        };

        report.mocks.push(MockSummary {
            name,
            kind: phase.kind,
            tier: mock.tier,
            total_minutes: mock.total_minutes,
            total_marks: mock.total_marks,
            question_count: mock.question_count(),
            essay_count: selection.essay_count,
            hit: selection.hit,
            output,
        });
    }
}

struct FlowCtx<'a> {
    label: &'a str,
    unit_dir: &'a Path,
    theme: Option<u32>,
}

/// 单元卷覆盖的课程小节
fn covered_sections(selection: &Selection, theme: u32) -> Vec<String> {
    let sections: BTreeSet<String> = selection
        .questions
        .iter()
        .filter_map(|q| theme_section(q, theme))
        .collect();
    sections.into_iter().collect()
}

/// 单元的随机源
///
/// 配置了种子时，由种子和单元标签派生，结果与调度顺序无关
pub fn unit_rng(seed: Option<u64>, label: &str) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed ^ stable_hash(label)),
        None => SmallRng::from_entropy(),
    }
}
