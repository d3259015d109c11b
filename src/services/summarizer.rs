//! 论文摘要 - 业务能力层

use async_trait::async_trait;

use crate::clients::{ChatOptions, LlmClient};
use crate::error::{AppError, AppResult};

/// 摘要生成能力
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// 根据论文全文（markdown）生成摘要
    async fn summarize(&self, content: &str) -> AppResult<String>;
}

/// 基于 LLM 的摘要实现
pub struct LlmSummarizer {
    llm: LlmClient,
    max_tokens: u32,
}

impl LlmSummarizer {
    pub fn new(llm: LlmClient, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    fn build_prompt(content: &str) -> String {
        format!(
            r#"You are an expert in academic research communication. Summarize the following paper for a knowledgeable but non-specialist audience.
Focus on clarity and precision while maintaining technical depth. The summary should:
1. Be no longer than 1000 words.
2. Use plain, yet technically accurate, language.

Structure the summary as follows:
1. **Main Objectives:** What was the primary aim of the study? Include background context if necessary.
2. **Key Methodologies:** Briefly describe the most important methods used (e.g., experiments, data analysis techniques, models).
3. **Principal Findings:** Summarize the most critical discoveries or results.
4. **Significant Implications:** Explain the broader importance of these findings and their potential impact on the field or real-world applications.

Paper content:
{}"#,
            content
        )
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, content: &str) -> AppResult<String> {
        let summary = self
            .llm
            .send_to_llm(
                &Self::build_prompt(content),
                None,
                ChatOptions {
                    temperature: 0.3,
                    max_tokens: self.max_tokens,
                },
            )
            .await?;

        if summary.is_empty() {
            return Err(AppError::llm(self.llm.model_name(), "摘要为空"));
        }
        Ok(summary)
    }
}

/// 按字符截断送入模型的正文
pub fn limit_content(content: &str, limit: usize) -> &str {
    match content.char_indices().nth(limit) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_content_counts_chars() {
        assert_eq!(limit_content("abcdef", 3), "abc");
        assert_eq!(limit_content("abc", 10), "abc");
        assert_eq!(limit_content("论文摘要生成", 2), "论文");
    }

    #[test]
    fn test_prompt_carries_content() {
        let prompt = LlmSummarizer::build_prompt("BODY TEXT");
        assert!(prompt.ends_with("BODY TEXT"));
        assert!(prompt.contains("1000 words"));
    }
}
