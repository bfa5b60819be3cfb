//! 时间估算服务 - 业务能力层
//!
//! 根据分值和题型估算作答时间：
//! - 普通短题：每分 2 分钟
//! - 论述/材料题：每分 2.5 分钟，四舍六入五成双

use regex::Regex;

use crate::error::ConfigError;
use crate::models::question::Question;

/// 分值达到此值即视为论述题
pub const ESSAY_MARK_THRESHOLD: u32 = 10;

/// 默认的论述题题号规则
pub const DEFAULT_ESSAY_NUMBER_PATTERN: &str = "(?i)(essay|context|extract)";

/// 题目权重类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightClass {
    /// 普通短题
    Standalone,
    /// 论述题 / 材料题
    Essay,
}

/// 时间估算器
///
/// 持有编译好的题号正则，可在线程间共享
#[derive(Debug, Clone)]
pub struct Estimator {
    essay_number: Regex,
}

impl Estimator {
    pub fn new(essay_number_pattern: &str) -> Result<Self, ConfigError> {
        let essay_number =
            Regex::new(essay_number_pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: essay_number_pattern.to_string(),
                source,
            })?;
        Ok(Self { essay_number })
    }

    /// 是否为论述/材料题
    ///
    /// 满足任一条件即是：题号符合论述题规则、附带材料文档、分值 ≥ 10
    pub fn is_context_based(&self, question: &Question) -> bool {
        self.essay_number.is_match(&question.question_number)
            || question.extract_doc.is_some()
            || question.marks >= ESSAY_MARK_THRESHOLD
    }

    pub fn weight_class(&self, question: &Question) -> WeightClass {
        if self.is_context_based(question) {
            WeightClass::Essay
        } else {
            WeightClass::Standalone
        }
    }

    /// 估算单题作答分钟数
    pub fn estimate_minutes(&self, question: &Question) -> u32 {
        match self.weight_class(question) {
            WeightClass::Essay => essay_minutes(question.marks),
            WeightClass::Standalone => question.marks.saturating_mul(2),
        }
    }

    /// 题目序列的总分钟数
    pub fn total_minutes<'a, I>(&self, questions: I) -> u32
    where
        I: IntoIterator<Item = &'a Question>,
    {
        questions
            .into_iter()
            .map(|q| self.estimate_minutes(q))
            .fold(0, u32::saturating_add)
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            essay_number: Regex::new(DEFAULT_ESSAY_NUMBER_PATTERN)
                .expect("default essay pattern is valid"),
        }
    }
}

/// round(marks * 2.5)，.5 时取偶数；超出 u32 时取上限
fn essay_minutes(marks: u32) -> u32 {
    let tenths = u64::from(marks) * 5;
    let half = tenths / 2;
    let rounded = if tenths % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    };
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
