//! 相关性分析 - 业务能力层
//!
//! 只负责"判断一篇论文是否值得继续处理"，评分能力通过
//! [`RelevanceScorer`] 注入，流水线逻辑可以用确定性的桩实现测试。

use async_trait::async_trait;
use tracing::{error, info};

use crate::clients::{ChatOptions, LlmClient};
use crate::error::{AppError, AppResult};
use crate::models::{Analysis, AnalyzedPaper, PaperRecord};
use crate::utils::logging::truncate_text;

/// 默认最低相关性
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.7;

/// 相关性评分能力
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, paper: &PaperRecord) -> AppResult<Analysis>;
}

/// 基于 LLM 的评分实现
pub struct LlmRelevanceScorer {
    llm: LlmClient,
}

impl LlmRelevanceScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    fn build_prompt(paper: &PaperRecord) -> String {
        format!(
            r#"Analyze this research paper summary and determine its relevance for practical AI applications and thought leadership.
Focus on papers that:
1. Discuss practical applications of AI
2. Present insights valuable for thought leadership
3. Offer implementable methodologies or frameworks

Paper Title: {}
Summary: {}

Respond with a single JSON object and nothing else, in this format:
{{
    "is_relevant": boolean,
    "relevance_score": float (0-1),
    "practical_applications": string,
    "thought_leadership_value": string,
    "key_insights": list of strings
}}"#,
            paper.title, paper.summary
        )
    }
}

#[async_trait]
impl RelevanceScorer for LlmRelevanceScorer {
    async fn score(&self, paper: &PaperRecord) -> AppResult<Analysis> {
        let reply = self
            .llm
            .send_to_llm(
                &Self::build_prompt(paper),
                Some("You are a research analyst. You always answer with valid JSON."),
                ChatOptions::default(),
            )
            .await?;
        parse_analysis(&reply, self.llm.model_name())
    }
}

/// 取出回复中的第一个 JSON 对象（容忍 ```json 代码块和前后说明文字）
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// 解析评分回复
pub fn parse_analysis(reply: &str, model: &str) -> AppResult<Analysis> {
    let json = extract_json_object(reply).ok_or_else(|| {
        AppError::llm(
            model,
            format!("回复中没有 JSON 对象: {}", truncate_text(reply, 80)),
        )
    })?;
    let analysis: Analysis = serde_json::from_str(json)
        .map_err(|e| AppError::llm(model, format!("分析结果格式错误: {}", e)))?;
    Ok(analysis.normalized())
}

/// 分析阶段统计
#[derive(Debug, Default)]
pub struct AnalysisOutcome {
    /// 通过阈值的论文
    pub relevant: Vec<AnalyzedPaper>,
    /// 拿到评分结果的论文数
    pub analyzed: usize,
    /// 评分失败被丢弃的论文数
    pub failed: usize,
}

/// 逐篇评分并按阈值过滤
///
/// # 参数
/// - `scorer`: 评分能力
/// - `papers`: 待分析论文
/// - `min_relevance`: 最低相关性（含）
///
/// # 返回
/// 单篇失败只记录日志，不会中止整批
pub async fn analyze_papers(
    scorer: &dyn RelevanceScorer,
    papers: &[PaperRecord],
    min_relevance: f64,
) -> AnalysisOutcome {
    let total = papers.len();
    let mut analyzed = Vec::with_capacity(total);
    let mut failed = 0;

    for (index, paper) in papers.iter().enumerate() {
        info!(
            "[{}/{}] 🤖 分析: {}",
            index + 1,
            total,
            truncate_text(&paper.title, 80)
        );
        match scorer.score(paper).await {
            Ok(analysis) => {
                info!(
                    "[{}/{}] ✓ 相关: {} 分数: {:.2}",
                    index + 1,
                    total,
                    analysis.is_relevant,
                    analysis.relevance_score
                );
                analyzed.push(AnalyzedPaper {
                    paper: paper.clone(),
                    analysis,
                });
            }
            Err(e) => {
                error!("[{}/{}] ❌ 分析失败 '{}': {}", index + 1, total, paper.title, e);
                failed += 1;
            }
        }
    }

    let analyzed_count = analyzed.len();
    AnalysisOutcome {
        relevant: filter_papers(analyzed, min_relevance),
        analyzed: analyzed_count,
        failed,
    }
}

/// 只保留 `is_relevant` 且分数不低于阈值的论文
pub fn filter_papers(papers: Vec<AnalyzedPaper>, min_relevance: f64) -> Vec<AnalyzedPaper> {
    papers
        .into_iter()
        .filter(|p| p.analysis.passes(min_relevance))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::fixtures;

    struct TitleScorer;

    #[async_trait]
    impl RelevanceScorer for TitleScorer {
        async fn score(&self, paper: &PaperRecord) -> AppResult<Analysis> {
            if paper.title.contains("broken") {
                return Err(AppError::llm("stub", "boom"));
            }
            let score = if paper.title.contains("good") { 0.9 } else { 0.4 };
            Ok(Analysis {
                is_relevant: score > 0.5,
                relevance_score: score,
                practical_applications: String::new(),
                thought_leadership_value: String::new(),
                key_insights: vec![],
            })
        }
    }

    #[test]
    fn test_parse_analysis_from_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"is_relevant\": true, \"relevance_score\": 0.85, \"practical_applications\": \"x\", \"thought_leadership_value\": \"y\", \"key_insights\": [\"a\", \"b\"]}\n```";
        let analysis = parse_analysis(reply, "gpt-4o").unwrap();
        assert!(analysis.is_relevant);
        assert_eq!(analysis.relevance_score, 0.85);
        assert_eq!(analysis.key_insights.len(), 2);
    }

    #[test]
    fn test_parse_analysis_rejects_prose() {
        assert!(parse_analysis("I think it is relevant.", "gpt-4o").is_err());
        assert!(parse_analysis("{\"relevance_score\": 0.5}", "gpt-4o").is_err());
    }

    #[test]
    fn test_parse_analysis_clamps_score() {
        let analysis =
            parse_analysis(r#"{"is_relevant": true, "relevance_score": 7}"#, "m").unwrap();
        assert_eq!(analysis.relevance_score, 1.0);
    }

    #[tokio::test]
    async fn test_analyze_drops_failures_and_filters() {
        let now = chrono::Utc::now();
        let papers = vec![
            fixtures::paper("good paper", "2401.00001", now),
            fixtures::paper("meh paper", "2401.00002", now),
            fixtures::paper("broken paper", "2401.00003", now),
        ];

        let outcome = analyze_papers(&TitleScorer, &papers, DEFAULT_MIN_RELEVANCE).await;
        assert_eq!(outcome.analyzed, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.relevant.len(), 1);
        assert_eq!(outcome.relevant[0].paper.title, "good paper");
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let papers = vec![fixtures::paper("good", "2401.00001", chrono::Utc::now())];
        let outcome = analyze_papers(&TitleScorer, &papers, 0.9).await;
        assert_eq!(outcome.relevant.len(), 1);
    }
}
