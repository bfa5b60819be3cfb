/// 考试局枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Board {
    /// AQA
    Aqa,
    /// Pearson Edexcel
    Edexcel,
    /// OCR
    Ocr,
    /// WJEC / Eduqas
    Eduqas,
    /// Cambridge International
    Cambridge,
}

impl Board {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Board::Aqa => "AQA",
            Board::Edexcel => "Edexcel",
            Board::Ocr => "OCR",
            Board::Eduqas => "Eduqas",
            Board::Cambridge => "CIE",
        }
    }

    /// 尝试从字符串解析考试局（精确匹配，忽略大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aqa" => Some(Board::Aqa),
            "edexcel" | "pearson" | "pearson edexcel" => Some(Board::Edexcel),
            "ocr" => Some(Board::Ocr),
            "eduqas" | "wjec" | "wjec eduqas" => Some(Board::Eduqas),
            "cie" | "caie" | "cambridge" => Some(Board::Cambridge),
            _ => None,
        }
    }

    /// 智能查找考试局（支持模糊匹配）
    pub fn find(s: &str) -> Option<Self> {
        if let Some(board) = Self::from_str(s) {
            return Some(board);
        }

        let s_lower = s.to_ascii_lowercase();
        if s_lower.contains("aqa") {
            return Some(Board::Aqa);
        }
        if s_lower.contains("edexcel") || s_lower.contains("pearson") {
            return Some(Board::Edexcel);
        }
        if s_lower.contains("ocr") {
            return Some(Board::Ocr);
        }
        if s_lower.contains("eduqas") || s_lower.contains("wjec") {
            return Some(Board::Eduqas);
        }
        if s_lower.contains("cambridge") || s_lower.contains("cie") {
            return Some(Board::Cambridge);
        }

        None
    }

    /// 规范化考试局名称，用于构造题目身份键
    ///
    /// 无法识别的名称保留原文（去空白、转小写）
    pub fn canonical(raw: &str) -> String {
        match Self::find(raw) {
            Some(board) => board.name().to_string(),
            None => raw.trim().to_lowercase(),
        }
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
