pub mod analysis;
pub mod category;
pub mod paper;

pub use analysis::{Analysis, AnalyzedPaper};
pub use category::{BoolOp, CategoryFilter, ARXIV_CATEGORIES};
pub use paper::{ExportMetadata, PaperRecord, PaperSet};
