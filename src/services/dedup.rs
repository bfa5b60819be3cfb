//! 去重服务 - 业务能力层
//!
//! 按内容指纹去重，先出现者保留，后续重复项记录日志后丢弃

use std::collections::HashSet;

use tracing::info;

use crate::models::question::Question;

/// 按身份键去重，保持原有顺序
pub fn dedupe(questions: Vec<Question>) -> Vec<Question> {
    let mut seen: HashSet<String> = HashSet::with_capacity(questions.len());
    let mut unique = Vec::with_capacity(questions.len());

    for question in questions {
        let key = question.identity_key();
        if seen.insert(key) {
            unique.push(question);
        } else {
            info!("🔁 跳过重复题目: {}", question.label());
        }
    }

    unique
}
