use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::identifier;

/// 导出文件格式版本
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// 从 arXiv 抓取的单篇论文元数据
///
/// 抓取后不再修改；arXiv ID 在需要时才从 `link` 推导。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    pub summary: String,
    pub link: String,
    pub categories: Vec<String>,
    /// 产生该结果的分类组合（用于分组展示）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination: Option<String>,
}

impl PaperRecord {
    /// 发布日期（UTC）
    pub fn published_date(&self) -> NaiveDate {
        self.published.date_naive()
    }

    /// 规范化的 arXiv ID
    pub fn canonical_id(&self) -> AppResult<String> {
        identifier::resolve_record(self)
    }
}

/// 导出文件的元数据头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub exported_at: String,
    pub paper_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevance_score: Option<f64>,
    pub export_format_version: String,
}

impl ExportMetadata {
    pub fn now(paper_count: usize) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            paper_count,
            min_relevance_score: None,
            export_format_version: EXPORT_FORMAT_VERSION.to_string(),
        }
    }
}

/// `{"metadata": {...}, "papers": [...]}` 包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSet<T> {
    pub metadata: ExportMetadata,
    pub papers: Vec<T>,
}

impl<T> PaperSet<T> {
    pub fn new(papers: Vec<T>) -> Self {
        Self {
            metadata: ExportMetadata::now(papers.len()),
            papers,
        }
    }
}
