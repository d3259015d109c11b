//! arXiv 分类目录与分类组合查询

use crate::error::{AppError, AppResult};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// arXiv 分类代码 → 描述
pub static ARXIV_CATEGORIES: phf::Map<&'static str, &'static str> = phf_map! {
    "cs.AI" => "Artificial Intelligence",
    "cs.AR" => "Hardware Architecture",
    "cs.CC" => "Computational Complexity",
    "cs.CE" => "Computational Engineering, Finance, and Science",
    "cs.CG" => "Computational Geometry",
    "cs.CL" => "Computation and Language",
    "cs.CR" => "Cryptography and Security",
    "cs.CV" => "Computer Vision and Pattern Recognition",
    "cs.CY" => "Computers and Society",
    "cs.DB" => "Databases",
    "cs.DC" => "Distributed, Parallel, and Cluster Computing",
    "cs.DL" => "Digital Libraries",
    "cs.DM" => "Discrete Mathematics",
    "cs.DS" => "Data Structures and Algorithms",
    "cs.ET" => "Emerging Technologies",
    "cs.FL" => "Formal Languages and Automata Theory",
    "cs.GL" => "General Literature",
    "cs.GR" => "Graphics",
    "cs.GT" => "Computer Science and Game Theory",
    "cs.HC" => "Human-Computer Interaction",
    "cs.IR" => "Information Retrieval",
    "cs.IT" => "Information Theory",
    "cs.LG" => "Machine Learning",
    "cs.LO" => "Logic in Computer Science",
    "cs.MA" => "Multiagent Systems",
    "cs.MM" => "Multimedia",
    "cs.MS" => "Mathematical Software",
    "cs.NA" => "Numerical Analysis",
    "cs.NE" => "Neural and Evolutionary Computing",
    "cs.NI" => "Networking and Internet Architecture",
    "cs.OH" => "Other Computer Science",
    "cs.OS" => "Operating Systems",
    "cs.PF" => "Performance",
    "cs.PL" => "Programming Languages",
    "cs.RO" => "Robotics",
    "cs.SC" => "Symbolic Computation",
    "cs.SD" => "Sound",
    "cs.SE" => "Software Engineering",
    "cs.SI" => "Social and Information Networks",
    "cs.SY" => "Systems and Control",
    "econ.EM" => "Econometrics",
    "econ.GN" => "General Economics",
    "eess.AS" => "Audio and Speech Processing",
    "eess.IV" => "Image and Video Processing",
    "eess.SP" => "Signal Processing",
    "eess.SY" => "Systems and Control",
    "math.NA" => "Numerical Analysis",
    "math.OC" => "Optimization and Control",
    "math.PR" => "Probability",
    "math.ST" => "Statistics Theory",
    "physics.soc-ph" => "Physics and Society",
    "q-bio.NC" => "Neurons and Cognition",
    "q-bio.QM" => "Quantitative Methods",
    "q-fin.CP" => "Computational Finance",
    "q-fin.GN" => "General Finance",
    "stat.AP" => "Applications",
    "stat.CO" => "Computation",
    "stat.ME" => "Methodology",
    "stat.ML" => "Machine Learning",
    "stat.TH" => "Statistics Theory",
};

/// 获取分类描述
pub fn describe(code: &str) -> Option<&'static str> {
    ARXIV_CATEGORIES.get(code).copied()
}

/// 按代码排序的完整目录
pub fn sorted_catalog() -> Vec<(&'static str, &'static str)> {
    let mut entries: Vec<_> = ARXIV_CATEGORIES.entries().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// 两个分类之间的布尔运算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// 分类组合：一次独立查询的范围
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryFilter {
    pub primary: String,
    pub secondary: Option<String>,
    pub operator: BoolOp,
}

impl CategoryFilter {
    /// 单分类查询
    pub fn single(category: impl Into<String>) -> Self {
        Self {
            primary: category.into(),
            secondary: None,
            operator: BoolOp::And,
        }
    }

    /// 双分类组合查询
    pub fn pair(primary: impl Into<String>, secondary: impl Into<String>, operator: BoolOp) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
            operator,
        }
    }

    /// 生成 `search_query` 参数
    pub fn search_query(&self) -> String {
        match &self.secondary {
            Some(second) => format!(
                "cat:{} {} cat:{}",
                self.primary,
                self.operator.as_str(),
                second
            ),
            None => format!("cat:{}", self.primary),
        }
    }

    /// 不在目录中的分类代码
    pub fn unknown_codes(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.secondary.as_deref())
            .filter(|code| describe(code).is_none())
            .collect()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(second) => write!(f, "{} {} {}", self.primary, self.operator.as_str(), second),
            None => write!(f, "{}", self.primary),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = AppError;

    /// 语法：`CAT` 或 `CAT AND CAT` / `CAT OR CAT`
    fn from_str(s: &str) -> AppResult<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [single] => Ok(Self::single(*single)),
            [first, op, second] => {
                let operator = match op.to_ascii_uppercase().as_str() {
                    "AND" => BoolOp::And,
                    "OR" => BoolOp::Or,
                    other => {
                        return Err(AppError::InvalidArgument(format!(
                            "分类组合运算符必须是 AND 或 OR: {}",
                            other
                        )))
                    }
                };
                Ok(Self::pair(*first, *second, operator))
            }
            _ => Err(AppError::InvalidArgument(format!(
                "无法解析分类组合: '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_single_and_pair() {
        assert_eq!(CategoryFilter::single("cs.AI").search_query(), "cat:cs.AI");
        assert_eq!(
            CategoryFilter::pair("cs.CY", "cs.HC", BoolOp::Or).search_query(),
            "cat:cs.CY OR cat:cs.HC"
        );
    }

    #[test]
    fn test_parse_combo() {
        let combo: CategoryFilter = "cs.CY and cs.HC".parse().unwrap();
        assert_eq!(combo.primary, "cs.CY");
        assert_eq!(combo.secondary.as_deref(), Some("cs.HC"));
        assert_eq!(combo.operator, BoolOp::And);
        assert_eq!(combo.to_string(), "cs.CY AND cs.HC");

        assert!("cs.CY XOR cs.HC".parse::<CategoryFilter>().is_err());
        assert!("".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(describe("cs.HC"), Some("Human-Computer Interaction"));
        assert_eq!(describe("cs.XX"), None);
        let catalog = sorted_catalog();
        assert!(catalog.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(
            CategoryFilter::pair("cs.AI", "zz.QQ", BoolOp::And).unknown_codes(),
            vec!["zz.QQ"]
        );
    }
}
