use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use statement_analyzer::utils::render_report;
use statement_analyzer::{logger, App, Config};

/// 上传银行账单 PDF 并获取信用评估
#[derive(Parser, Debug)]
#[command(name = "statement-analyzer", version)]
struct Cli {
    /// 要分析的账单文件（一次只能一个 PDF）
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// TOML 配置文件，环境变量会覆盖其中的值
    #[arg(long)]
    config: Option<PathBuf>,

    /// 以 JSON 输出分析结果
    #[arg(long)]
    json: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?.with_env_overrides()?,
        None => Config::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let config = load_config(&cli)?;

    // 初始化日志
    logger::init(cli.verbose || config.verbose_logging);

    let mut app = App::initialize(config)?;

    match app.run(&cli.files).await {
        Ok(analysis) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", render_report(&analysis));
            }
            app.dismiss();
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 可以重新运行以重试，或更换文件");
            app.dismiss();
            Ok(ExitCode::FAILURE)
        }
    }
}
