//! 日志工具模块
//!
//! 提供日志初始化以及阶段横幅、统计信息的输出函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 输出到 stdout
///
/// # 参数
/// - `verbose`: 为 true 时默认级别为 debug，否则为 info；
///   设置了 `RUST_LOG` 时以环境变量为准
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}

/// 记录阶段开始信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `total`: 待处理条目数
pub fn log_stage_start(stage: &str, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 {} - 共 {} 项", stage, total);
    info!("{}", "=".repeat(60));
}

/// 打印阶段统计信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `success`: 本次完成数量
/// - `skipped`: 已完成而跳过的数量
/// - `failed`: 失败数量
/// - `total`: 总数
pub fn print_stage_stats(stage: &str, success: usize, skipped: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {} 完成统计", stage);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成: {}/{}", success, total);
    info!("⏭️ 跳过: {}", skipped);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符，含末尾的 `...`）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    kept + "..."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_text("abcdefgh", 5), "ab...");
        assert_eq!(truncate_text("中文标题很长", 5), "中文...");
        assert_eq!(truncate_text("abcdefgh", 7).chars().count(), 7);
    }
}
