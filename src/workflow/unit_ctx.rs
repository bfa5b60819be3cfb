//! 组卷单元上下文
//!
//! 封装"我正在为哪个话题/主题组卷"这一信息

use std::fmt::Display;

use crate::infrastructure::safe_file_name;
use crate::models::question::Question;
use crate::services::partition::ThemeEligibility;

/// 单元类型
#[derive(Debug, Clone)]
pub enum UnitKind {
    /// 按话题标签分组
    Topic,
    /// 按主题编号分组，附带适用规则
    Theme(ThemeEligibility),
}

/// 一个组卷单元
///
/// 单元在运行期间独占自己的题目，组卷任务之间不共享任何可变状态
#[derive(Debug, Clone)]
pub struct AssemblyUnit {
    /// 话题标签或主题名称
    pub label: String,
    pub kind: UnitKind,
    pub questions: Vec<Question>,
    /// 单元在输出目录下的子目录名
    pub dir_name: String,
}

impl AssemblyUnit {
    pub fn topic(label: impl Into<String>, questions: Vec<Question>) -> Self {
        let label = label.into();
        Self {
            dir_name: safe_file_name(&label),
            label,
            kind: UnitKind::Topic,
            questions,
        }
    }

    pub fn theme(eligibility: ThemeEligibility, questions: Vec<Question>) -> Self {
        let label = format!("Theme {}", eligibility.theme);
        Self {
            dir_name: safe_file_name(&label),
            label,
            kind: UnitKind::Theme(eligibility),
            questions,
        }
    }
}

impl Display for AssemblyUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[单元 {}]", self.label)
    }
}
