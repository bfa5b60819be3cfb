//! 单元划分
//!
//! 把整个题库按话题标签或主题编号拆成互不共享的组卷单元。
//! 一道题带多个标签时会进入多个话题单元，每个单元拿到的是自己的副本。

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::question::Question;
use crate::services::partition::theme_prefix;
use crate::workflow::AssemblyUnit;

/// 按话题标签分组，单元按标签排序
pub fn group_by_topic(questions: &[Question]) -> Vec<AssemblyUnit> {
    let mut topics: BTreeMap<&str, Vec<Question>> = BTreeMap::new();
    let mut untagged = 0;

    for question in questions {
        if question.topics.is_empty() {
            untagged += 1;
            continue;
        }
        for topic in &question.topics {
            topics.entry(topic.as_str()).or_default().push(question.clone());
        }
    }

    if untagged > 0 {
        info!("⚠️ {} 道题目没有话题标签，不参与话题组卷", untagged);
    }

    topics
        .into_iter()
        .map(|(topic, questions)| {
            debug!("话题 {}: {} 道题", topic, questions.len());
            AssemblyUnit::topic(topic, questions)
        })
        .collect()
}

/// 按主题编号分组：带有该主题标签的题目进入该主题单元
///
/// 分值和试卷范围的过滤在组卷流程中完成，并逐题记录排除原因
pub fn group_by_theme(questions: &[Question], config: &Config) -> Vec<AssemblyUnit> {
    config
        .themes
        .iter()
        .map(|&theme| {
            let members: Vec<Question> = questions
                .iter()
                .filter(|q| q.topics.iter().any(|t| theme_prefix(t) == Some(theme)))
                .cloned()
                .collect();
            debug!("主题 {}: {} 道候选题", theme, members.len());
            AssemblyUnit::theme(config.theme_eligibility(theme), members)
        })
        .collect()
}

/// 按配置的组卷模式生成全部单元
pub fn build_units(questions: &[Question], config: &Config) -> Vec<AssemblyUnit> {
    let mut units = Vec::new();
    if config.mode.includes_topics() {
        units.extend(group_by_topic(questions));
    }
    if config.mode.includes_units() {
        units.extend(group_by_theme(questions, config));
    }
    assign_unique_dirs(&mut units);
    units
}

/// 不同标签清洗后可能得到同一目录名（如 "A/B" 与 "A_B"），后出现的单元加 " (n)" 后缀
///
/// 比较时忽略大小写，避免在大小写不敏感的文件系统上互相覆盖
fn assign_unique_dirs(units: &mut [AssemblyUnit]) {
    let mut used = HashSet::new();
    for unit in units.iter_mut() {
        if used.insert(unit.dir_name.to_lowercase()) {
            continue;
        }
        let base = unit.dir_name.clone();
        let mut n = 2;
        let candidate = loop {
            let candidate = format!("{} ({})", base, n);
            if used.insert(candidate.to_lowercase()) {
                break candidate;
            }
            n += 1;
        };
        warn!(
            "⚠️ [单元 {}] 输出目录 {} 已被其它单元占用, 改用 {}",
            unit.label, base, candidate
        );
        unit.dir_name = candidate;
    }
}
