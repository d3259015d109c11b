pub mod arxiv_client;
pub mod llama_parse_client;
pub mod llm_client;
pub mod pdf_client;

pub use arxiv_client::ArxivClient;
pub use llama_parse_client::LlamaParseClient;
pub use llm_client::{ChatOptions, LlmClient};
pub use pdf_client::PdfClient;
