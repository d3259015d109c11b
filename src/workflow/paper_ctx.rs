//! 论文处理上下文
//!
//! 封装"我正在处理这一批中的第几篇、它是谁"这一信息

use std::fmt::Display;

/// 论文处理上下文
#[derive(Debug, Clone)]
pub struct PaperCtx {
    /// 在本批中的序号（从1开始）
    pub index: usize,

    /// 本批总数
    pub total: usize,

    /// 作业记录中的键（arXiv ID 或目录名）
    pub key: String,

    /// 论文标题（仅用于日志显示）
    pub title: String,
}

impl PaperCtx {
    /// 创建新的论文上下文
    pub fn new(index: usize, total: usize, key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            index,
            total,
            key: key.into(),
            title: title.into(),
        }
    }
}

impl Display for PaperCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.index, self.total)
    }
}
