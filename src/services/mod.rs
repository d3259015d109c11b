//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，一次只处理一篇论文或一份文件，
//! 不关心批量顺序和断点续跑。

pub mod analyzer;
pub mod exporter;
pub mod extractor;
pub mod formatter;
pub mod identifier;
pub mod summarizer;

pub use analyzer::{LlmRelevanceScorer, RelevanceScorer};
pub use extractor::{DocumentExtractor, LlamaParseExtractor, LocalPdfExtractor};
pub use summarizer::{LlmSummarizer, Summarizer};
