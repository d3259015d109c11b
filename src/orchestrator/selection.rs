//! 从下载记录中挑选待处理论文
//!
//! parse / summarize 都支持两种选择方式：按标题（目录名）或按下载日期。

use chrono::{Local, NaiveDate};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{DownloadEntry, JobLog};

/// 选择条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 目录名（parse 按不区分大小写的子串匹配，summarize 按目录名精确匹配）
    Titles(Vec<String>),
    /// 下载日期
    Date(NaiveDate),
}

impl Selection {
    /// 由命令行参数构造；两者都未给出时取今天
    pub fn from_args(titles: Option<Vec<String>>, date: Option<&str>) -> AppResult<Self> {
        if let Some(titles) = titles.filter(|t| !t.is_empty()) {
            return Ok(Selection::Titles(titles));
        }
        match date {
            Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(Selection::Date)
                .map_err(|_| {
                    AppError::InvalidArgument(format!("日期格式应为 YYYY-MM-DD: {}", text))
                }),
            None => Ok(Selection::Date(Local::now().date_naive())),
        }
    }

    fn matches_date(entry: &DownloadEntry, date: NaiveDate) -> bool {
        entry
            .downloaded_at
            .starts_with(&date.format("%Y-%m-%d").to_string())
    }
}

/// 挑选待解析的论文：返回 (arXiv ID, 下载记录)
pub fn select_downloads(
    log: &JobLog<DownloadEntry>,
    selection: &Selection,
) -> Vec<(String, DownloadEntry)> {
    log.entries()
        .iter()
        .filter(|(_, entry)| match selection {
            Selection::Titles(titles) => {
                let directory = entry.directory.to_lowercase();
                titles
                    .iter()
                    .any(|t| directory.contains(&t.to_lowercase()))
            }
            Selection::Date(date) => Selection::matches_date(entry, *date),
        })
        .map(|(id, entry)| (id.clone(), entry.clone()))
        .collect()
}

/// 挑选待摘要的论文目录名
///
/// 按日期选择时需要下载记录，记录文件不存在返回 `FileNotFound`。
pub fn select_summary_folders(log_path: &Path, selection: &Selection) -> AppResult<Vec<String>> {
    match selection {
        Selection::Titles(titles) => Ok(titles.clone()),
        Selection::Date(date) => {
            if !log_path.exists() {
                return Err(AppError::FileNotFound {
                    path: log_path.to_path_buf(),
                });
            }
            let log: JobLog<DownloadEntry> = JobLog::open(log_path, "papers")?;
            Ok(log
                .entries()
                .values()
                .filter(|entry| Selection::matches_date(entry, *date))
                .filter_map(|entry| {
                    Path::new(&entry.directory)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                })
                .collect())
        }
    }
}
