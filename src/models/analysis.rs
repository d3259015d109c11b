use serde::{Deserialize, Serialize};

use super::paper::PaperRecord;

/// 相关性评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub is_relevant: bool,
    /// 取值范围 [0, 1]
    pub relevance_score: f64,
    #[serde(default)]
    pub practical_applications: String,
    #[serde(default)]
    pub thought_leadership_value: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
}

impl Analysis {
    /// 把分数限制在 [0, 1]，NaN 视为 0
    pub fn normalized(mut self) -> Self {
        self.relevance_score = if self.relevance_score.is_nan() {
            0.0
        } else {
            self.relevance_score.clamp(0.0, 1.0)
        };
        self
    }

    pub fn passes(&self, min_relevance: f64) -> bool {
        self.is_relevant && self.relevance_score >= min_relevance
    }
}

/// 论文字段 + `analysis` 字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedPaper {
    #[serde(flatten)]
    pub paper: PaperRecord,
    pub analysis: Analysis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::fixtures;

    #[test]
    fn test_normalized_clamps_score() {
        let analysis = Analysis {
            is_relevant: true,
            relevance_score: 1.7,
            practical_applications: String::new(),
            thought_leadership_value: String::new(),
            key_insights: vec![],
        }
        .normalized();
        assert_eq!(analysis.relevance_score, 1.0);
        assert!(analysis.passes(0.7));
    }

    #[test]
    fn test_analyzed_paper_is_flat() {
        let analyzed = AnalyzedPaper {
            paper: fixtures::sample(),
            analysis: Analysis {
                is_relevant: false,
                relevance_score: 0.2,
                practical_applications: "none".to_string(),
                thought_leadership_value: "low".to_string(),
                key_insights: vec!["x".to_string()],
            },
        };
        let json = serde_json::to_value(&analyzed).unwrap();
        assert_eq!(json["title"], "Agents in the Loop");
        assert_eq!(json["analysis"]["relevance_score"], 0.2);

        let back: AnalyzedPaper = serde_json::from_value(json).unwrap();
        assert_eq!(back, analyzed);
    }
}
