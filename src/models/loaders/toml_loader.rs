use crate::error::FileError;
use crate::models::question::{Question, QuestionBank};
use crate::utils::hash::sha256_hex;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载题库
///
/// 相对文档路径以 TOML 文件所在目录为基准解析；
/// 题目文档存在时计算内容指纹，不存在时记录警告并退化为 年份|考试局|题号 身份键。
pub async fn load_question_bank(toml_file_path: &Path) -> Result<QuestionBank> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: toml_file_path.to_path_buf(),
            source,
        })?;

    let mut bank: QuestionBank =
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: toml_file_path.to_path_buf(),
            source,
        })?;

    let base_dir = toml_file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    for question in bank.questions.iter_mut() {
        question.normalize_topics();
        resolve_documents(question, &base_dir);
        if question.fingerprint.is_none() {
            question.fingerprint = fingerprint_document(question).await;
        }
    }

    Ok(bank)
}

/// 从文件夹中加载所有 TOML 题库并合并为题目列表
///
/// 文件按文件名排序后加载，保证题目顺序（以及去重时"先到先得"）稳定。
/// 单个文件加载失败只记录警告，不影响其它文件。
pub async fn load_all_question_banks(folder_path: &Path) -> Result<Vec<Question>> {
    if !folder_path.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_path_buf(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut questions = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_question_bank(&path).await {
            Ok(bank) => {
                tracing::info!("成功加载 {} 道题目", bank.questions.len());
                questions.extend(bank.questions);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(questions)
}

fn resolve_documents(question: &mut Question, base_dir: &Path) {
    for doc in [
        &mut question.question_doc,
        &mut question.markscheme_doc,
        &mut question.extract_doc,
    ] {
        if let Some(path) = doc.as_mut() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

async fn fingerprint_document(question: &Question) -> Option<String> {
    let path: &PathBuf = question.question_doc.as_ref()?;
    match fs::read(path).await {
        Ok(bytes) => Some(sha256_hex(&bytes)),
        Err(e) => {
            tracing::warn!(
                "⚠️ 无法读取题目文档 {} ({}), 使用年份/考试局/题号作为身份键: {}",
                path.display(),
                question.label(),
                e
            );
            None
        }
    }
}
