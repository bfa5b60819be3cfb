//! 模拟卷渲染 - 基础设施层
//!
//! 封面排版和 PDF 合并由外部工具完成，这里只负责把选题结果落成目录：
//!
//! ```text
//! <模拟卷目录>/
//!   cover.toml          封面数据（标签、档位、总分、题目清单）
//!   manifest.json       选题清单
//!   questions/          按选题顺序编号的题目文档 + index.txt 出处说明
//!   markschemes/        去重后编号的评分标准
//! ```
//!
//! 每份模拟卷的文件互相独立，中途失败不会影响已经写好的其它目录。

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::models::mock::{MockExam, MockKind};
use crate::models::question::Question;

/// 渲染器接口
///
/// 同步调用；实现可以阻塞在磁盘或网络上
pub trait MockRenderer: Send + Sync {
    /// 把一份模拟卷渲染到 `dir`，返回实际写入的目录
    fn render(&self, mock: &MockExam, dir: &Path) -> Result<PathBuf, RenderError>;
}

/// 封面数据
#[derive(Debug, Serialize)]
struct CoverPage<'a> {
    title: String,
    label: &'a str,
    kind: MockKind,
    tier_minutes: u32,
    total_minutes: u32,
    total_marks: u32,
    generated_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sections: Vec<String>,
    questions: Vec<CoverLine>,
}

#[derive(Debug, Serialize)]
struct CoverLine {
    index: usize,
    source: String,
    marks: u32,
}

/// 落盘渲染器
#[derive(Debug, Clone, Default)]
pub struct DirectoryRenderer {
    /// 缺少题目文档时是否视为失败
    require_documents: bool,
}

impl DirectoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缺少题目文档时让这份模拟卷渲染失败
    pub fn strict() -> Self {
        Self {
            require_documents: true,
        }
    }

    fn write_cover(&self, mock: &MockExam, dir: &Path) -> Result<(), RenderError> {
        let cover = CoverPage {
            title: format!("{} - {} ({} 分钟)", mock.label, mock.name, mock.tier),
            label: &mock.label,
            kind: mock.kind,
            tier_minutes: mock.tier,
            total_minutes: mock.total_minutes,
            total_marks: mock.total_marks,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sections: mock.sections.clone(),
            questions: mock
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| CoverLine {
                    index: i + 1,
                    source: q.label(),
                    marks: q.marks,
                })
                .collect(),
        };
        let path = dir.join("cover.toml");
        let content = toml::to_string_pretty(&cover)?;
        fs::write(&path, content).map_err(|source| RenderError::WriteFailed { path, source })
    }

    fn write_manifest(&self, mock: &MockExam, dir: &Path) -> Result<(), RenderError> {
        let path = dir.join("manifest.json");
        let content = serde_json::to_string_pretty(mock)?;
        fs::write(&path, content).map_err(|source| RenderError::WriteFailed { path, source })
    }

    fn copy_questions(&self, mock: &MockExam, dir: &Path) -> Result<(), RenderError> {
        let questions_dir = create_dir(&dir.join("questions"))?;
        let mut index = String::new();

        for (i, question) in mock.questions.iter().enumerate() {
            let position = i + 1;
            index.push_str(&provenance_header(position, question));

            match &question.question_doc {
                Some(doc) => {
                    let target = questions_dir.join(indexed_name(position, question, "", doc));
                    copy_document(doc, &target)?;
                }
                None if self.require_documents => {
                    return Err(RenderError::MissingDocument {
                        question: question.label(),
                        kind: "题目".to_string(),
                    });
                }
                None => warn!("⚠️ {} 没有题目文档，仅写入出处说明", question.label()),
            }

            if let Some(extract) = &question.extract_doc {
                let target =
                    questions_dir.join(indexed_name(position, question, " extract", extract));
                copy_document(extract, &target)?;
            }
        }

        let path = questions_dir.join("index.txt");
        fs::write(&path, index).map_err(|source| RenderError::WriteFailed { path, source })
    }

    /// 评分标准按路径去重，编号连续
    fn copy_markschemes(&self, mock: &MockExam, dir: &Path) -> Result<usize, RenderError> {
        let markscheme_dir = create_dir(&dir.join("markschemes"))?;
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut position = 0;

        for question in &mock.questions {
            let Some(doc) = question.markscheme_doc.as_deref() else {
                warn!("⚠️ {} 没有评分标准", question.label());
                continue;
            };
            if !seen.insert(doc) {
                debug!("评分标准已存在，跳过: {}", doc.display());
                continue;
            }
            position += 1;
            let target = markscheme_dir.join(indexed_name(position, question, " ms", doc));
            copy_document(doc, &target)?;
        }

        Ok(position)
    }
}

impl MockRenderer for DirectoryRenderer {
    fn render(&self, mock: &MockExam, dir: &Path) -> Result<PathBuf, RenderError> {
        create_dir(dir)?;
        self.copy_questions(mock, dir)?;
        let markschemes = self.copy_markschemes(mock, dir)?;
        self.write_cover(mock, dir)?;
        self.write_manifest(mock, dir)?;
        debug!(
            "已渲染 {}: {} 道题, {} 份评分标准",
            dir.display(),
            mock.question_count(),
            markschemes
        );
        Ok(dir.to_path_buf())
    }
}

fn create_dir(dir: &Path) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(dir).map_err(|source| RenderError::CreateDirFailed {
        dir: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.to_path_buf())
}

fn copy_document(from: &Path, to: &Path) -> Result<(), RenderError> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| RenderError::CopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

fn provenance_header(position: usize, question: &Question) -> String {
    format!(
        "[{:02}] {} | {} | {} 分\n",
        position,
        question.label(),
        question.qualification,
        question.marks
    )
}

/// 形如 "03 - 2019 AQA Q4 ms.pdf" 的文件名
fn indexed_name(position: usize, question: &Question, suffix: &str, source: &Path) -> String {
    let stem = safe_file_name(&format!(
        "{:02} - {} {} Q{}{}",
        position, question.year, question.board, question.question_number, suffix
    ));
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// 把路径分隔符等不安全字符替换为下划线
pub fn safe_file_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
