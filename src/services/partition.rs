//! 候选池划分 - 业务能力层
//!
//! - 按题型拆分为短题池和论述题池
//! - 主题单元卷：按课程小节分桶，并按试卷适用范围过滤

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::models::question::Question;
use crate::services::estimator::{Estimator, ESSAY_MARK_THRESHOLD};

/// 拆分为 (短题, 论述题)，各自保持原有顺序
pub fn partition(questions: Vec<Question>, estimator: &Estimator) -> (Vec<Question>, Vec<Question>) {
    questions
        .into_iter()
        .partition(|q| !estimator.is_context_based(q))
}

/// 标签开头的主题编号，如 "3.2.1 Name" → 3
pub fn theme_prefix(tag: &str) -> Option<u32> {
    let digits: String = tag
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// 标签所属的课程小节，取编号前两级，如 "3.2.1 Name" → "3.2"
///
/// 只有一级编号时返回主题编号本身
pub fn section_code(tag: &str) -> Option<String> {
    let code = tag.split_whitespace().next()?;
    let levels: Vec<&str> = code
        .split('.')
        .take_while(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .take(2)
        .collect();
    if levels.is_empty() {
        None
    } else {
        Some(levels.join("."))
    }
}

/// 题目在某主题下所属的小节
///
/// 没有任何标签属于该主题时返回 None；标签编号拆不出小节时（如 "3) Markets"）归入主题本身
pub fn theme_section(question: &Question, theme: u32) -> Option<String> {
    let mut matching = question
        .topics
        .iter()
        .filter(|tag| theme_prefix(tag) == Some(theme))
        .peekable();
    matching.peek()?;
    Some(
        matching
            .find_map(|tag| section_code(tag))
            .unwrap_or_else(|| theme.to_string()),
    )
}

/// 试卷标识中的第一段数字，如 "Paper 3" → "3"
pub fn paper_number(paper: &str) -> Option<&str> {
    let start = paper.find(|c: char| c.is_ascii_digit())?;
    let rest = &paper[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// 单元卷题目被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// 没有任何标签属于该主题
    NoMatchingTopic { theme: u32 },
    /// 分值过高（单元卷只收 10 分以下）
    TooManyMarks { marks: u32 },
    /// 试卷不在该主题的适用范围内
    PaperNotAllowed { paper: String, allowed: Vec<String> },
    /// 该主题没有配置适用试卷
    ThemeNotConfigured { theme: u32 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoMatchingTopic { theme } => write!(f, "没有属于主题 {} 的标签", theme),
            Rejection::TooManyMarks { marks } => {
                write!(f, "分值 {} 不小于 {}", marks, ESSAY_MARK_THRESHOLD)
            }
            Rejection::PaperNotAllowed { paper, allowed } => {
                write!(f, "试卷 '{}' 不在允许范围 {:?} 内", paper, allowed)
            }
            Rejection::ThemeNotConfigured { theme } => {
                write!(f, "主题 {} 未配置适用试卷", theme)
            }
        }
    }
}

/// 主题单元卷的适用规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEligibility {
    pub theme: u32,
    /// None 表示该主题未配置
    pub allowed_papers: Option<Vec<String>>,
}

impl ThemeEligibility {
    /// 检查单题，返回第一条不满足的规则
    pub fn check(&self, question: &Question) -> Result<String, Rejection> {
        let section = theme_section(question, self.theme)
            .ok_or(Rejection::NoMatchingTopic { theme: self.theme })?;

        if question.marks >= ESSAY_MARK_THRESHOLD {
            return Err(Rejection::TooManyMarks {
                marks: question.marks,
            });
        }

        let allowed = self
            .allowed_papers
            .as_ref()
            .ok_or(Rejection::ThemeNotConfigured { theme: self.theme })?;
        let paper = paper_number(&question.paper).unwrap_or(question.paper.trim());
        if !allowed.iter().any(|p| p == paper) {
            return Err(Rejection::PaperNotAllowed {
                paper: question.paper.clone(),
                allowed: allowed.clone(),
            });
        }

        Ok(section)
    }
}

/// 分桶结果
#[derive(Debug, Default)]
pub struct SectionGrouping {
    pub sections: BTreeMap<String, Vec<Question>>,
    pub rejected: Vec<(Question, Rejection)>,
}

impl SectionGrouping {
    pub fn eligible_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}

/// 按课程小节分桶，只保留符合主题规则的题目
///
/// 每道被拒绝的题目都会记录具体原因
pub fn group_by_section(questions: Vec<Question>, eligibility: &ThemeEligibility) -> SectionGrouping {
    let mut grouping = SectionGrouping::default();

    for question in questions {
        match eligibility.check(&question) {
            Ok(section) => {
                debug!("[主题 {}] 收录 {} → {}", eligibility.theme, question.label(), section);
                grouping.sections.entry(section).or_default().push(question);
            }
            Err(reason) => {
                info!(
                    "[主题 {}] 排除 {}: {}",
                    eligibility.theme,
                    question.label(),
                    reason
                );
                grouping.rejected.push((question, reason));
            }
        }
    }

    grouping
}

/// 轮流从各小节取题合并为一个列表，使单元卷覆盖更多小节
pub fn interleave_sections(sections: BTreeMap<String, Vec<Question>>) -> Vec<Question> {
    let total: usize = sections.values().map(Vec::len).sum();
    let mut iters: Vec<_> = sections.into_values().map(Vec::into_iter).collect();
    let mut merged = Vec::with_capacity(total);

    while merged.len() < total {
        for iter in iters.iter_mut() {
            if let Some(q) = iter.next() {
                merged.push(q);
            }
        }
    }

    merged
}
