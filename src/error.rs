use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 组卷错误
    #[error("组卷错误: {0}")]
    Assembly(#[from] AssemblyError),
    /// 渲染错误
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 时间档位为空
    #[error("时间档位 {name} 不能为空")]
    EmptyTiers { name: String },
    /// 时间档位未严格递增或包含 0
    #[error("时间档位 {name} 必须严格递增且大于 0: {tiers:?}")]
    InvalidTiers { name: String, tiers: Vec<u32> },
    /// 论述题上限为 0
    #[error("混合模拟卷的论述题上限必须至少为 1")]
    ZeroEssayCap,
    /// 正则表达式无效
    #[error("题号正则表达式无效 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// 配置文件读取失败
    #[error("配置文件读取失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {}", path.display())]
    DirectoryNotFound { path: PathBuf },
}

/// 组卷错误
///
/// 这些错误都只影响单个单元或单份模拟卷，不会中止整个批次
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// 单元没有任何题目
    #[error("单元 {unit} 没有可用题目")]
    EmptyPool { unit: String },
    /// 打包器无法命中任何时间档位
    #[error("单元 {unit} 第 {index} 份模拟卷无法命中任何时间档位 (已选 {minutes} 分钟)")]
    ConstraintUnsatisfiable {
        unit: String,
        index: usize,
        minutes: u32,
    },
    /// 组卷任务异常退出
    #[error("单元 {unit} 组卷任务异常退出: {message}")]
    TaskFailed { unit: String, message: String },
}

/// 渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 创建输出目录失败
    #[error("创建输出目录失败 ({}): {source}", dir.display())]
    CreateDirFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 复制文档失败
    #[error("复制文档失败 ({} -> {}): {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 题目缺少文档
    #[error("题目 {question} 缺少{kind}文档")]
    MissingDocument { question: String, kind: String },
    /// 写入封面或清单失败
    #[error("写入 {} 失败: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(String),
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: PathBuf::new(),
            source: err,
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: PathBuf::new(), // TOML错误通常不包含路径信息
            source: err,
        })
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialize(err.to_string())
    }
}

impl From<toml::ser::Error> for RenderError {
    fn from(err: toml::ser::Error) -> Self {
        RenderError::Serialize(err.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_message() {
        let err: AppError = AssemblyError::EmptyPool {
            unit: "3.2 Market failure".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "组卷错误: 单元 3.2 Market failure 没有可用题目");
    }

    #[test]
    fn test_io_error_maps_to_file_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::File(FileError::ReadFailed { .. })));
    }
}
