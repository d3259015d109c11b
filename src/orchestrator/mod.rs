//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `pipeline` - 流水线编排器
//! - 持有配置和共享节流器
//! - 逐阶段加载输入、打开作业记录、遍历论文
//! - 输出阶段统计信息
//!
//! ### `selection` - 待处理论文的挑选
//! - 按标题或下载日期从下载记录中选择
//!
//! ## 层次关系
//!
//! ```text
//! pipeline (处理 Vec<Paper>)
//!     ↓
//! workflow::*Flow (处理单篇论文)
//!     ↓
//! services / clients (能力层：评分 / 摘要 / 解析 / 下载)
//!     ↓
//! infrastructure (缓存、作业记录、节流)
//! ```

pub mod pipeline;
pub mod selection;

pub use pipeline::{FetchOutcome, FetchRequest, PipelineOrchestrator, StageStats};
pub use selection::Selection;
