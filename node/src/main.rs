mod config;

use clap::{Parser, Subcommand};
use config::NodeConfig;
use meta_chain::{reconcile, Block, Database, ReconcileJob};
use meta_core::AccountId;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "metad")]
#[command(about = "META1 asset-backing node")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a JSON block log on top of the stored chain
    Replay {
        #[arg(value_name = "BLOCKS")]
        blocks: PathBuf,
    },
    /// Show a property with its allocation progress
    Property { claim_id: u32 },
    /// List the properties backing a symbol
    Properties { symbol: String },
    /// Show the asset limitation of a symbol
    Limitation { symbol: String },
    /// Show the external USD price of a symbol
    Price { symbol: String },
    /// List the limit orders of an account (by instance number)
    Orders { account: u64 },
    /// Check stored counters and valuations against a recomputation
    Reconcile,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    let genesis = config.load_genesis()?;
    std::fs::create_dir_all(&config.data_dir)?;
    let mut db = Database::open(&genesis, config.chain_db_path())?;
    if let Some(age) = config.chain.max_feed_age_secs {
        db.set_max_feed_age(age)?;
    }
    log::info!(
        "Chain at block {} ({})",
        db.head_block_num(),
        db.head_block_time()
    );

    match cli.command {
        Command::Replay { blocks } => {
            let contents = std::fs::read_to_string(&blocks)?;
            let blocks: Vec<Block> = serde_json::from_str(&contents)?;
            let pending: Vec<Block> = blocks
                .into_iter()
                .filter(|b| b.block_num > db.head_block_num())
                .collect();

            // the job only ever sees fully applied blocks
            let snapshot = Arc::new(RwLock::new(db.head_state().clone()));
            let job = config.reconcile.enabled.then(|| {
                let job = ReconcileJob::new(
                    snapshot.clone(),
                    Duration::from_secs(config.reconcile.interval_secs),
                );
                tokio::spawn(job.run())
            });

            for block in pending {
                let report = db.apply_block(&block)?;
                *snapshot.write().await = db.head_state().clone();
                println!(
                    "block {} {} txs={} matured={:?} expired={:?}",
                    report.block_num,
                    report.block_id,
                    report.transactions,
                    report.matured,
                    report.expired
                );
            }

            if let Some(handle) = job {
                handle.abort();
                let findings = reconcile(db.head_state())?;
                println!("{} divergences at head", findings.len());
            }
            println!("head: {} at {}", db.head_block_num(), db.head_block_time());
        }
        Command::Property { claim_id } => match db.api().get_property(claim_id) {
            Some(view) => print_json(&view)?,
            None => println!("property {} not found", claim_id),
        },
        Command::Properties { symbol } => {
            print_json(&db.api().list_properties_by_symbol(&symbol))?;
        }
        Command::Limitation { symbol } => match db.api().get_asset_limitation(&symbol) {
            Some(limitation) => print_json(limitation)?,
            None => println!("no asset limitation for {}", symbol),
        },
        Command::Price { symbol } => match db.api().get_external_price(&symbol) {
            Some(price) => print_json(price)?,
            None => println!("no external price for {}", symbol),
        },
        Command::Orders { account } => {
            print_json(&db.api().get_limit_orders(AccountId(account)))?;
        }
        Command::Reconcile => {
            let findings = reconcile(db.head_state())?;
            for finding in &findings {
                println!("{}", finding);
            }
            println!("{} divergences", findings.len());
        }
    }

    Ok(())
}
