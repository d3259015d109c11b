//! 论文下载流程 - 流程层
//!
//! 流程顺序：
//! 1. 查下载记录，已完成则跳过
//! 2. 创建论文目录，写入 metadata.json
//! 3. 下载 PDF，原子写入 paper.pdf
//! 4. 校验 PDF 后登记完成

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::clients::PdfClient;
use crate::error::{AppError, AppResult};
use crate::infrastructure::job_log::timestamp_now;
use crate::infrastructure::{json_store, DownloadEntry, JobLog};
use crate::workflow::paper_ctx::PaperCtx;
use crate::workflow::{ItemState, ProcessResult};

/// 目录名最大长度（字符）
pub const MAX_DIR_NAME_LEN: usize = 100;

/// PDF 文件名
pub const PDF_FILE_NAME: &str = "paper.pdf";

/// 元数据文件名
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// 由标题生成目录名
///
/// 保留字母数字、空格和连字符，其余字符替换为 `_`，截断到 100 个字符后去掉首尾空白。
/// 不同标题可能得到相同的目录名，这种冲突不做区分。
pub fn sanitize_dir_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_DIR_NAME_LEN)
        .collect();
    sanitized.trim().to_string()
}

/// 论文目录名：标题清洗后为空时改用 arXiv ID
pub fn paper_dir_name(title: &str, arxiv_id: &str) -> AppResult<String> {
    let name = sanitize_dir_name(title);
    if !name.is_empty() {
        return Ok(name);
    }
    let fallback = sanitize_dir_name(arxiv_id);
    if fallback.is_empty() {
        return Err(AppError::InvalidArgument(format!(
            "无法为论文生成目录名: 标题 '{}'，ID '{}'",
            title, arxiv_id
        )));
    }
    Ok(fallback)
}

/// 论文下载流程
///
/// - 不持有作业记录，由编排层传入
/// - 只依赖 PDF 下载能力
pub struct DownloadFlow<'a> {
    pdf_client: &'a PdfClient,
    output_dir: PathBuf,
}

impl<'a> DownloadFlow<'a> {
    /// 创建新的下载流程
    pub fn new(pdf_client: &'a PdfClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf_client,
            output_dir: output_dir.into(),
        }
    }

    /// 论文的产物目录（总在 `output_dir` 之下）
    pub fn paper_dir(&self, title: &str, arxiv_id: &str) -> AppResult<PathBuf> {
        Ok(self.output_dir.join(paper_dir_name(title, arxiv_id)?))
    }

    pub async fn run(
        &self,
        paper: &JsonValue,
        ctx: &PaperCtx,
        log: &mut JobLog<DownloadEntry>,
    ) -> AppResult<ProcessResult> {
        if log.is_complete(&ctx.key) {
            info!("{} ⏭️ 已下载: {}", ctx, ctx.title);
            return Ok(ProcessResult::AlreadyDone);
        }

        info!("{} ⬇️ {}: {} ({})", ctx, ItemState::Downloading, ctx.title, ctx.key);

        let paper_dir = self.paper_dir(&ctx.title, &ctx.key)?;
        json_store::write_json_atomic(&paper_dir.join(METADATA_FILE_NAME), paper, true)?;

        let bytes = self.pdf_client.download(&ctx.key).await?;
        let pdf_path = paper_dir.join(PDF_FILE_NAME);
        json_store::write_bytes_atomic(&pdf_path, &bytes)?;

        log.record_verified(
            ctx.key.clone(),
            DownloadEntry {
                downloaded_at: timestamp_now(),
                title: ctx.title.clone(),
                directory: path_string(&paper_dir),
            },
            &pdf_path,
        )?;

        info!("{} ✓ {}: {}", ctx, ItemState::Downloaded, pdf_path.display());
        Ok(ProcessResult::Completed)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
