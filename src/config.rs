use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::mock::MockKind;
use crate::services::estimator::{Estimator, DEFAULT_ESSAY_NUMBER_PATTERN};
use crate::services::packer::PackParams;
use crate::services::partition::ThemeEligibility;
use crate::services::tiers::TierSet;

/// 组卷模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyMode {
    /// 按话题标签组卷（混合卷 + 短题卷）
    Topic,
    /// 按主题编号组单元卷
    Unit,
    /// 两者都做
    Both,
}

impl AssemblyMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topic" | "topics" => Some(AssemblyMode::Topic),
            "unit" | "units" | "theme" => Some(AssemblyMode::Unit),
            "both" | "all" => Some(AssemblyMode::Both),
            _ => None,
        }
    }

    pub fn includes_topics(self) -> bool {
        matches!(self, AssemblyMode::Topic | AssemblyMode::Both)
    }

    pub fn includes_units(self) -> bool {
        matches!(self, AssemblyMode::Unit | AssemblyMode::Both)
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 题库 TOML 文件存放目录
    pub question_folder: PathBuf,
    /// 模拟卷输出目录
    pub output_folder: PathBuf,
    /// 组卷模式
    pub mode: AssemblyMode,
    // --- 时间档位 ---
    /// 话题卷时间档位（分钟，升序）
    pub topic_tiers: Vec<u32>,
    /// 单元卷时间档位（分钟，升序）
    pub unit_tiers: Vec<u32>,
    /// 低于档位的容差
    pub tolerance_minutes: u32,
    /// 超出档位的余量
    pub overage_minutes: u32,
    // --- 数量限制 ---
    /// 每个话题至少生成的短题卷数量
    pub min_short_mocks: usize,
    /// 每个话题/主题最多生成的模拟卷数量
    pub max_mocks_per_topic: usize,
    /// 每份混合卷最多论述题数量
    pub max_essays_per_mock: usize,
    // --- 主题单元卷 ---
    /// 需要组单元卷的主题编号
    pub themes: Vec<u32>,
    /// 主题编号 → 适用试卷
    pub theme_papers: BTreeMap<String, Vec<String>>,
    /// 论述题题号规则
    pub essay_number_pattern: String,
    /// 打乱题目的随机种子，不设置时每次运行结果不同
    pub shuffle_seed: Option<u64>,
    // --- 并发 ---
    /// 同时组卷的单元数量
    pub max_concurrent_units: usize,
    /// 单元数不超过此值时顺序执行
    pub sequential_threshold: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let theme_papers = BTreeMap::from([
            ("1".to_string(), vec!["1".to_string()]),
            ("2".to_string(), vec!["2".to_string()]),
            ("3".to_string(), vec!["1".to_string(), "3".to_string()]),
            ("4".to_string(), vec!["2".to_string(), "3".to_string()]),
        ]);
        Self {
            question_folder: PathBuf::from("question_bank"),
            output_folder: PathBuf::from("mocks"),
            mode: AssemblyMode::Topic,
            topic_tiers: vec![25, 30, 35],
            unit_tiers: vec![25, 30, 35, 40],
            tolerance_minutes: 2,
            overage_minutes: 5,
            min_short_mocks: 1,
            max_mocks_per_topic: 1,
            max_essays_per_mock: 1,
            themes: vec![1, 2, 3, 4],
            theme_papers,
            essay_number_pattern: DEFAULT_ESSAY_NUMBER_PATTERN.to_string(),
            shuffle_seed: None,
            max_concurrent_units: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            sequential_threshold: 2,
            verbose_logging: false,
            output_log_file: PathBuf::from("assembly_log.txt"),
        }
    }
}

impl Config {
    /// 从 TOML 配置文件加载，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 完整加载流程：配置文件（`CONFIG_FILE`）→ 环境变量覆盖 → 校验
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 用查找函数提供的值覆盖配置，无法解析的值保持原样
    pub fn with_overrides<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u32 = |key: &str, default: u32| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let parse_usize = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let parse_list = |key: &str, default: Vec<u32>| {
            lookup(key)
                .and_then(|v| parse_u32_list(&v))
                .unwrap_or(default)
        };

        Self {
            question_folder: lookup("QUESTION_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(self.question_folder),
            output_folder: lookup("OUTPUT_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(self.output_folder),
            mode: lookup("ASSEMBLY_MODE")
                .and_then(|v| AssemblyMode::from_str(&v))
                .unwrap_or(self.mode),
            topic_tiers: parse_list("TOPIC_TIERS", self.topic_tiers),
            unit_tiers: parse_list("UNIT_TIERS", self.unit_tiers),
            tolerance_minutes: parse_u32("TIME_TOLERANCE", self.tolerance_minutes),
            overage_minutes: parse_u32("OVERAGE_ALLOWANCE", self.overage_minutes),
            min_short_mocks: parse_usize("MIN_SHORT_MOCKS", self.min_short_mocks),
            max_mocks_per_topic: parse_usize("MAX_MOCKS_PER_TOPIC", self.max_mocks_per_topic),
            max_essays_per_mock: parse_usize("MAX_ESSAYS_PER_MOCK", self.max_essays_per_mock),
            themes: parse_list("THEMES", self.themes),
            theme_papers: self.theme_papers,
            essay_number_pattern: lookup("ESSAY_NUMBER_PATTERN")
                .unwrap_or(self.essay_number_pattern),
            shuffle_seed: lookup("SHUFFLE_SEED")
                .and_then(|v| v.trim().parse().ok())
                .or(self.shuffle_seed),
            max_concurrent_units: parse_usize("MAX_CONCURRENT_UNITS", self.max_concurrent_units),
            sequential_threshold: parse_usize("SEQUENTIAL_THRESHOLD", self.sequential_threshold),
            verbose_logging: lookup("VERBOSE_LOGGING")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(self.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(self.output_log_file),
        }
    }

    /// 校验档位、论述题上限和题号规则
    pub fn validate(&self) -> Result<(), ConfigError> {
        TierSet::new("topic_tiers", self.topic_tiers.clone())?;
        TierSet::new("unit_tiers", self.unit_tiers.clone())?;
        if self.max_essays_per_mock == 0 {
            return Err(ConfigError::ZeroEssayCap);
        }
        Estimator::new(&self.essay_number_pattern)?;
        Ok(())
    }

    pub fn estimator(&self) -> Result<Estimator, ConfigError> {
        Estimator::new(&self.essay_number_pattern)
    }

    /// 某类模拟卷使用的打包参数
    pub fn pack_params(&self, kind: MockKind) -> Result<PackParams, ConfigError> {
        let tiers = match kind {
            MockKind::Mixed | MockKind::ShortOnly => {
                TierSet::new("topic_tiers", self.topic_tiers.clone())?
            }
            MockKind::Unit => TierSet::new("unit_tiers", self.unit_tiers.clone())?,
        };
        let essay_cap = if kind.allows_essays() {
            self.max_essays_per_mock
        } else {
            0
        };
        Ok(PackParams {
            tiers,
            tolerance: self.tolerance_minutes,
            overage: self.overage_minutes,
            essay_cap,
        })
    }

    /// 某主题的单元卷适用规则
    pub fn theme_eligibility(&self, theme: u32) -> ThemeEligibility {
        ThemeEligibility {
            theme,
            allowed_papers: self.theme_papers.get(&theme.to_string()).cloned(),
        }
    }
}

/// 解析 "25,30,35" 形式的列表，任一项无效时返回 None
fn parse_u32_list(raw: &str) -> Option<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}
