//! 流程层（Workflow）
//!
//! 定义"一篇论文"在各阶段的完整处理流程。每个流程先查作业记录，
//! 已完成的直接返回 [`ProcessResult::AlreadyDone`]，不再触发任何副作用。
//!
//! 单篇论文的状态流转：
//!
//! ```text
//! Pending → Fetching → Fetched | FetchFailed
//! Fetched → Analyzing → Relevant | Rejected
//! Relevant → Downloading → Downloaded | DownloadFailed
//! Downloaded → Extracting → Extracted | ExtractFailed
//! Extracted → Summarizing → Summarized | SummarizeFailed
//! ```

pub mod download_flow;
pub mod extract_flow;
pub mod paper_ctx;
pub mod summarize_flow;

use std::fmt;

pub use download_flow::{paper_dir_name, sanitize_dir_name, DownloadFlow};
pub use extract_flow::ExtractFlow;
pub use paper_ctx::PaperCtx;
pub use summarize_flow::SummarizeFlow;

/// 单个流程的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 本次执行完成
    Completed,
    /// 作业记录显示已完成，直接跳过
    AlreadyDone,
}

/// 单篇论文的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Fetching,
    Fetched,
    FetchFailed,
    Analyzing,
    Relevant,
    Rejected,
    Downloading,
    Downloaded,
    DownloadFailed,
    Extracting,
    Extracted,
    ExtractFailed,
    Summarizing,
    Summarized,
    SummarizeFailed,
}

impl ItemState {
    /// 进行中的状态结束后的去向
    ///
    /// 对 `Analyzing` 而言 `ok` 表示"相关"。
    pub fn finish(self, ok: bool) -> Option<ItemState> {
        let next = match (self, ok) {
            (ItemState::Fetching, true) => ItemState::Fetched,
            (ItemState::Fetching, false) => ItemState::FetchFailed,
            (ItemState::Analyzing, true) => ItemState::Relevant,
            (ItemState::Analyzing, false) => ItemState::Rejected,
            (ItemState::Downloading, true) => ItemState::Downloaded,
            (ItemState::Downloading, false) => ItemState::DownloadFailed,
            (ItemState::Extracting, true) => ItemState::Extracted,
            (ItemState::Extracting, false) => ItemState::ExtractFailed,
            (ItemState::Summarizing, true) => ItemState::Summarized,
            (ItemState::Summarizing, false) => ItemState::SummarizeFailed,
            _ => return None,
        };
        Some(next)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemState::Pending => "待处理",
            ItemState::Fetching => "抓取中",
            ItemState::Fetched => "已抓取",
            ItemState::FetchFailed => "抓取失败",
            ItemState::Analyzing => "分析中",
            ItemState::Relevant => "相关",
            ItemState::Rejected => "不相关",
            ItemState::Downloading => "下载中",
            ItemState::Downloaded => "已下载",
            ItemState::DownloadFailed => "下载失败",
            ItemState::Extracting => "解析中",
            ItemState::Extracted => "已解析",
            ItemState::ExtractFailed => "解析失败",
            ItemState::Summarizing => "摘要中",
            ItemState::Summarized => "已摘要",
            ItemState::SummarizeFailed => "摘要失败",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_states_succeed_forward() {
        let reached: Vec<ItemState> = [
            ItemState::Fetching,
            ItemState::Analyzing,
            ItemState::Downloading,
            ItemState::Extracting,
            ItemState::Summarizing,
        ]
        .iter()
        .filter_map(|s| s.finish(true))
        .collect();
        assert_eq!(
            reached,
            vec![
                ItemState::Fetched,
                ItemState::Relevant,
                ItemState::Downloaded,
                ItemState::Extracted,
                ItemState::Summarized,
            ]
        );
    }

    #[test]
    fn test_failed_outcomes() {
        assert_eq!(
            ItemState::Downloading.finish(false),
            Some(ItemState::DownloadFailed)
        );
        assert_eq!(
            ItemState::Extracting.finish(false).unwrap().to_string(),
            "解析失败"
        );
        assert_eq!(ItemState::Analyzing.finish(false), Some(ItemState::Rejected));
    }

    #[test]
    fn test_finish_only_from_running_states() {
        assert_eq!(ItemState::Downloaded.finish(true), None);
    }
}
