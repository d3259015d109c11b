use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use arxiv_fetcher::clients::LlmClient;
use arxiv_fetcher::config::Config;
use arxiv_fetcher::models::CategoryFilter;
use arxiv_fetcher::orchestrator::{FetchRequest, PipelineOrchestrator, Selection};
use arxiv_fetcher::services::analyzer::DEFAULT_MIN_RELEVANCE;
use arxiv_fetcher::services::extractor::build_extractor;
use arxiv_fetcher::services::{LlmRelevanceScorer, LlmSummarizer};
use arxiv_fetcher::utils::logging;

/// arXiv 论文抓取与分析
#[derive(Debug, Parser)]
#[command(name = "arxiv-fetch", version, about = "ArXiv paper fetcher and analyzer")]
struct Cli {
    /// 输出 debug 级别日志
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 抓取最近的论文
    Fetch(FetchArgs),

    /// 用 LLM 分析论文的相关性
    Analyze {
        /// fetch 导出的 JSON
        #[arg(long)]
        input: PathBuf,
        /// 相关论文输出文件
        #[arg(long)]
        output: PathBuf,
        /// 最低相关性 (0-1)
        #[arg(long, default_value_t = DEFAULT_MIN_RELEVANCE)]
        min_relevance: f64,
    },

    /// 下载分析结果中论文的 PDF
    Download {
        /// analyze 输出的 JSON
        #[arg(long)]
        input: PathBuf,
        /// 论文保存目录（默认取配置）
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// 把已下载的 PDF 转成 markdown
    Parse {
        #[command(flatten)]
        select: SelectArgs,
        /// 忽略解析记录，重新解析
        #[arg(long)]
        force: bool,
    },

    /// 为已解析的论文生成摘要
    Summarize {
        #[command(flatten)]
        select: SelectArgs,
    },

    /// 列出 arXiv 分类
    Categories,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// 回溯天数 (1-30)
    #[arg(long, default_value_t = 7)]
    days: u32,
    /// 导出 JSON
    #[arg(long, value_name = "FILENAME")]
    export_json: Option<PathBuf>,
    /// 导出 CSV
    #[arg(long, value_name = "FILENAME")]
    export_csv: Option<PathBuf>,
    /// 分类组合，如 "cs.CY AND cs.HC"（可重复）
    #[arg(long = "combo", value_name = "COMBO")]
    combos: Vec<CategoryFilter>,
    /// 每个分类组合最多取回的条数
    #[arg(long)]
    max_results: Option<usize>,
    /// 跳过缓存
    #[arg(long)]
    no_cache: bool,
}

#[derive(Debug, Args)]
#[group(multiple = false)]
struct SelectArgs {
    /// 论文标题（目录名）
    #[arg(long, num_args = 1..)]
    titles: Option<Vec<String>>,
    /// 下载日期 (YYYY-MM-DD)，默认今天
    #[arg(long)]
    date: Option<String>,
}

impl SelectArgs {
    fn selection(self) -> Result<Selection> {
        Ok(Selection::from_args(self.titles, self.date.as_deref())?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    logging::init(cli.verbose);

    // 加载配置
    let config = Config::load()?;
    let orchestrator = PipelineOrchestrator::new(config)?;

    match cli.command {
        Command::Fetch(args) => {
            orchestrator
                .run_fetch(FetchRequest {
                    days: args.days,
                    max_results: args.max_results,
                    filters: args.combos,
                    use_cache: !args.no_cache,
                    export_json: args.export_json,
                    export_csv: args.export_csv,
                })
                .await?;
        }
        Command::Analyze {
            input,
            output,
            min_relevance,
        } => {
            let scorer = LlmRelevanceScorer::new(LlmClient::new(orchestrator.config())?);
            orchestrator
                .run_analyze(&scorer, &input, &output, min_relevance)
                .await?;
        }
        Command::Download { input, output_dir } => {
            orchestrator
                .run_download(&input, output_dir.as_deref())
                .await?;
        }
        Command::Parse { select, force } => {
            let selection = select.selection()?;
            let extractor = build_extractor(orchestrator.config())?;
            orchestrator
                .run_parse(extractor.as_ref(), &selection, force)
                .await?;
        }
        Command::Summarize { select } => {
            let selection = select.selection()?;
            let config = orchestrator.config();
            let summarizer =
                LlmSummarizer::new(LlmClient::new(config)?, config.summary_max_tokens);
            orchestrator.run_summarize(&summarizer, &selection).await?;
        }
        Command::Categories => {
            println!("{}", orchestrator.show_categories());
        }
    }

    Ok(())
}
