use std::path::{Path, PathBuf};
use thiserror::Error;

/// 应用程序错误类型
///
/// 批处理中的单项失败（下载、解析、摘要）由编排层捕获并记录后继续；
/// 只有整阶段失败才会一路传播到 `main`。
#[derive(Debug, Error)]
pub enum AppError {
    /// 网络请求失败（连接、超时、非 2xx 状态码）
    #[error("网络请求失败 ({endpoint}): {source}")]
    Network {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 响应内容无法解析
    #[error("响应格式错误 ({endpoint}): {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// 无法从论文数据中推导出 arXiv ID
    #[error("无法找到论文的 arXiv ID: {title}\n可用字段: {fields}")]
    IdentifierNotFound { title: String, fields: String },

    /// 缺少必需的凭据（环境变量）
    #[error("环境变量 {var_name} 未设置")]
    MissingCredential { var_name: String },

    /// 预期存在的输入文件不存在
    #[error("文件不存在: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// 文件读写失败
    #[error("文件操作失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化失败
    #[error("JSON 处理失败 ({}): {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// LLM 调用失败或返回内容不可用
    #[error("LLM 错误 (模型: {model}): {message}")]
    Llm { model: String, message: String },

    /// 文档转文本失败
    #[error("文档解析失败 ({}): {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// 参数不合法
    #[error("参数错误: {0}")]
    InvalidArgument(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络请求错误
    pub fn network(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Network {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建响应格式错误
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建文件操作错误
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 创建 JSON 错误
    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        AppError::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 创建 LLM 错误
    pub fn llm(model: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Llm {
            model: model.into(),
            message: message.into(),
        }
    }

    /// 创建文档解析错误
    pub fn extraction(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        AppError::Extraction {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_not_found_names_fields() {
        let err = AppError::IdentifierNotFound {
            title: "Some Paper".to_string(),
            fields: "title, summary".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Some Paper"));
        assert!(msg.contains("title, summary"));
    }
}
