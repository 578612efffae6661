// ==========================================
// 产品数据导入 - 命令行入口
// ==========================================
// 用法: product-import <file> [mode] [options]
// mode 取值 "test" 时为预览模式（不写库）
// ==========================================

use anyhow::Context;
use clap::Parser;
use product_import::config::{ConfigManager, ImportConfigReader};
use product_import::domain::{ReconcilePolicy, RunMode};
use product_import::importer::{ImportRunner, ProductImporter};
use product_import::repository::ProductRepositoryImpl;
use product_import::{get_default_db_path, logging};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process;

/// Import product data from a CSV file into the product store
#[derive(Debug, Parser)]
#[command(
    name = "product-import",
    version,
    about = "Import product data from a CSV file and save it to the database"
)]
struct Args {
    /// The CSV file which has the product details (resolved against the file root)
    #[arg(value_name = "FILE")]
    product_file: String,

    /// Run mode: "test" previews the file without writing to the database
    #[arg(value_name = "MODE")]
    mode: Option<String>,

    /// How rows whose code already exists are handled
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Directory the file name is resolved against
    #[arg(long = "root", value_name = "DIR")]
    file_root: Option<PathBuf>,

    /// SQLite database path
    #[arg(long = "db", value_name = "PATH")]
    db_path: Option<String>,

    /// Minimum accepted stock (inclusive)
    #[arg(long = "stock-min", value_name = "N")]
    stock_min: Option<i64>,

    /// Price must be greater than this value
    #[arg(long = "price-min", value_name = "AMOUNT")]
    price_min: Option<Decimal>,

    /// Price must be less than or equal to this value
    #[arg(long = "price-max", value_name = "AMOUNT")]
    price_max: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    /// Update existing records by code, insert new ones
    Upsert,
    /// Insert new codes only, skip any code already known
    RejectDuplicates,
}

impl From<PolicyArg> for ReconcilePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Upsert => ReconcilePolicy::Upsert,
            PolicyArg::RejectDuplicates => ReconcilePolicy::RejectDuplicates,
        }
    }
}

fn main() {
    logging::init();

    let args = Args::parse();
    if let Err(error) = run(args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let db_path = args.db_path.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(
        app = product_import::APP_NAME,
        version = product_import::VERSION,
        db_path = %db_path,
        "使用数据库"
    );

    let config = ConfigManager::new(&db_path).context("无法初始化配置管理器")?;
    let mut settings = config
        .load_import_settings()
        .context("导入配置读取失败")?;
    tracing::debug!(snapshot = %config.get_config_snapshot()?, "导入配置快照");

    // 命令行覆写 config_kv
    if let Some(policy) = args.policy {
        settings.policy = policy.into();
    }
    if let Some(root) = args.file_root {
        settings.file_root = root;
    }
    if let Some(stock_min) = args.stock_min {
        settings.stock_lower_limit = stock_min;
    }
    if let Some(price_min) = args.price_min {
        settings.price_lower_limit = price_min;
    }
    if let Some(price_max) = args.price_max {
        settings.price_upper_limit = price_max;
    }
    anyhow::ensure!(
        settings.price_lower_limit < settings.price_upper_limit,
        "价格下限 {} 必须小于上限 {}",
        settings.price_lower_limit,
        settings.price_upper_limit
    );

    let repo = ProductRepositoryImpl::new(&db_path).context("无法打开产品数据库")?;
    let mode = RunMode::from_mode_arg(args.mode.as_deref());

    let runner = ImportRunner::new(&repo, settings, mode);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = runner.import_file(&args.product_file, &mut out)?;

    // 行级失败不影响退出码，只体现在输出文本中
    tracing::debug!(summary = %serde_json::to_string(&summary)?, "运行汇总");
    Ok(())
}
