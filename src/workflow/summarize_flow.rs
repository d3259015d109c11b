//! 论文摘要流程 - 流程层
//!
//! parsed_paper.md → 截断 → 摘要模型 → 摘要记录（按目录名索引）

use std::path::PathBuf;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::job_log::timestamp_now;
use crate::infrastructure::{JobLog, SummaryEntry};
use crate::services::summarizer::limit_content;
use crate::services::Summarizer;
use crate::workflow::extract_flow::PARSED_FILE_NAME;
use crate::workflow::paper_ctx::PaperCtx;
use crate::workflow::{ItemState, ProcessResult};

/// 论文摘要流程
pub struct SummarizeFlow<'a> {
    summarizer: &'a dyn Summarizer,
    papers_dir: PathBuf,
    content_limit: usize,
}

impl<'a> SummarizeFlow<'a> {
    /// 创建新的摘要流程
    ///
    /// # 参数
    /// - `summarizer`: 摘要能力
    /// - `papers_dir`: 论文根目录
    /// - `content_limit`: 送入模型的最大字符数
    pub fn new(summarizer: &'a dyn Summarizer, papers_dir: impl Into<PathBuf>, content_limit: usize) -> Self {
        Self {
            summarizer,
            papers_dir: papers_dir.into(),
            content_limit,
        }
    }

    /// `ctx.key` 为论文目录名
    pub async fn run(&self, ctx: &PaperCtx, log: &mut JobLog<SummaryEntry>) -> AppResult<ProcessResult> {
        if log.is_complete(&ctx.key) {
            info!("{} ⏭️ 摘要已存在: {}", ctx, ctx.key);
            return Ok(ProcessResult::AlreadyDone);
        }

        let markdown_path = self.papers_dir.join(&ctx.key).join(PARSED_FILE_NAME);
        let content = match std::fs::read_to_string(&markdown_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::FileNotFound {
                    path: markdown_path,
                })
            }
            Err(e) => return Err(AppError::io(&markdown_path, e)),
        };
        if content.trim().is_empty() {
            return Err(AppError::extraction(&markdown_path, "解析结果为空"));
        }

        info!("{} ✍️ {}: {}", ctx, ItemState::Summarizing, ctx.key);

        let summary = self
            .summarizer
            .summarize(limit_content(&content, self.content_limit))
            .await?;
        if summary.trim().is_empty() {
            return Err(AppError::llm("summarizer", "摘要为空"));
        }

        log.record_completion(
            ctx.key.clone(),
            SummaryEntry {
                summary,
                generated_at: timestamp_now(),
            },
        )?;

        info!("{} ✓ {}: {}", ctx, ItemState::Summarized, ctx.key);
        Ok(ProcessResult::Completed)
    }
}
