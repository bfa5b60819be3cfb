use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::board::Board;

/// 题目记录
///
/// 由上游切题、打标签流程产出，本系统只读使用。
/// 文档只检查是否存在以及内容指纹，从不解析内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_number: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: String,
    pub board: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub paper: String,
    pub marks: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_doc: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markscheme_doc: Option<PathBuf>,
    /// 论述题附带的材料文档
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_doc: Option<PathBuf>,
    /// 题目文档内容的 SHA-256 指纹，加载时计算
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Question {
    /// 题目身份键：优先使用内容指纹，否则退化为 年份|考试局|题号
    pub fn identity_key(&self) -> String {
        match &self.fingerprint {
            Some(fp) => fp.clone(),
            None => format!(
                "{}|{}|{}",
                self.year.trim(),
                Board::canonical(&self.board),
                self.question_number.trim()
            ),
        }
    }

    /// 用于日志和出处标注的简短描述
    pub fn label(&self) -> String {
        if self.paper.is_empty() {
            format!("{} {} Q{}", self.year, self.board, self.question_number)
        } else {
            format!(
                "{} {} Paper {} Q{}",
                self.year, self.board, self.paper, self.question_number
            )
        }
    }

    /// 去掉重复的标签，保留首次出现的顺序
    pub fn normalize_topics(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.topics.retain(|t| {
            let trimmed = t.trim();
            !trimmed.is_empty() && seen.insert(trimmed.to_string())
        });
        for topic in self.topics.iter_mut() {
            *topic = topic.trim().to_string();
        }
    }
}

// Helper function to deserialize year as either string or integer
fn deserialize_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a year")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(YearVisitor)
}

/// 题库文件结构：一个 TOML 文件包含若干 `[[questions]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Question;

    /// 测试用题目构造器
    pub fn question(number: &str, marks: u32) -> Question {
        Question {
            question_number: number.to_string(),
            year: "2019".to_string(),
            board: "AQA".to_string(),
            qualification: "A-level".to_string(),
            paper: "1".to_string(),
            marks,
            topics: Vec::new(),
            question_doc: None,
            markscheme_doc: None,
            extract_doc: None,
            fingerprint: Some(format!("fp-{}", number)),
        }
    }
}
