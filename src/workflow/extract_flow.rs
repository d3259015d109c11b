//! 论文解析流程 - 流程层
//!
//! paper.pdf → 文本 → parsed_paper.md，完成后写入解析记录。

use std::path::Path;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::job_log::timestamp_now;
use crate::infrastructure::{json_store, DownloadEntry, JobLog, ParseEntry};
use crate::services::DocumentExtractor;
use crate::workflow::download_flow::PDF_FILE_NAME;
use crate::workflow::paper_ctx::PaperCtx;
use crate::workflow::{ItemState, ProcessResult};

/// 解析结果文件名
pub const PARSED_FILE_NAME: &str = "parsed_paper.md";

/// 论文解析流程
pub struct ExtractFlow<'a> {
    extractor: &'a dyn DocumentExtractor,
    force: bool,
}

impl<'a> ExtractFlow<'a> {
    /// 创建新的解析流程
    ///
    /// # 参数
    /// - `extractor`: 解析后端
    /// - `force`: 为 true 时忽略解析记录重新解析
    pub fn new(extractor: &'a dyn DocumentExtractor, force: bool) -> Self {
        Self { extractor, force }
    }

    pub async fn run(
        &self,
        download: &DownloadEntry,
        ctx: &PaperCtx,
        log: &mut JobLog<ParseEntry>,
    ) -> AppResult<ProcessResult> {
        if !self.force && log.is_complete(&ctx.key) {
            info!("{} ⏭️ 已解析: {}", ctx, ctx.title);
            return Ok(ProcessResult::AlreadyDone);
        }

        let paper_dir = Path::new(&download.directory);
        let pdf_path = paper_dir.join(PDF_FILE_NAME);
        if !pdf_path.exists() {
            return Err(AppError::FileNotFound { path: pdf_path });
        }

        info!(
            "{} 📄 {} ({}): {}",
            ctx,
            ItemState::Extracting,
            self.extractor.name(),
            ctx.title
        );

        let text = self.extractor.extract(&pdf_path).await?;
        let output_path = paper_dir.join(PARSED_FILE_NAME);
        json_store::write_bytes_atomic(&output_path, format!("{}\n\n", text).as_bytes())?;

        log.record_verified(
            ctx.key.clone(),
            ParseEntry {
                parsed_at: timestamp_now(),
                title: ctx.title.clone(),
                output: output_path.to_string_lossy().into_owned(),
            },
            &output_path,
        )?;

        info!("{} ✓ {}: {}", ctx, ItemState::Extracted, output_path.display());
        Ok(ProcessResult::Completed)
    }
}
