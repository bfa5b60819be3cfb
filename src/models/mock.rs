use serde::Serialize;

use crate::models::question::Question;

/// 模拟卷类型，决定输出目录命名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MockKind {
    /// 混合卷（最多一道论述题）
    Mixed,
    /// 仅短题
    ShortOnly,
    /// 主题单元卷
    Unit,
}

impl MockKind {
    /// 输出目录名
    ///
    /// `numbered` 为 false 时省略序号（该类型只生成一份时）。
    /// 混合卷总是带序号。
    pub fn dir_name(self, index: usize, numbered: bool) -> String {
        match self {
            MockKind::Mixed => format!("mock{}", index),
            MockKind::ShortOnly if numbered => format!("short questions mock {}", index),
            MockKind::ShortOnly => "short questions mock".to_string(),
            MockKind::Unit if numbered => format!("topic mock {}", index),
            MockKind::Unit => "topic mock".to_string(),
        }
    }

    /// 是否允许论述题
    pub fn allows_essays(self) -> bool {
        !matches!(self, MockKind::ShortOnly)
    }
}

impl std::fmt::Display for MockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MockKind::Mixed => "混合卷",
            MockKind::ShortOnly => "短题卷",
            MockKind::Unit => "单元卷",
        };
        write!(f, "{}", name)
    }
}

/// 一份组好的模拟卷
///
/// 只在内存中短暂存在，交给渲染器后即被丢弃
#[derive(Debug, Clone, Serialize)]
pub struct MockExam {
    /// 话题或主题标签
    pub label: String,
    pub kind: MockKind,
    /// 从 1 开始的序号
    pub index: usize,
    /// 输出目录名
    pub name: String,
    /// 目标时间档位（分钟）
    pub tier: u32,
    pub total_minutes: u32,
    pub total_marks: u32,
    /// 按选题顺序排列
    pub questions: Vec<Question>,
    /// 单元卷覆盖的课程小节
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<String>,
}

impl MockExam {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
