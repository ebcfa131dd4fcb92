use clap::Parser;
use smartcash::args::{
    Args, BackupSubcommand, CategorySubcommand, Command, ProductSubcommand, TransactionSubcommand,
};
use smartcash::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().smartcash_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Category(category_args) => {
            let config = Config::load(home).await?;
            match category_args.action() {
                CategorySubcommand::Add(args) => {
                    commands::category_add(config, args.clone()).await?.print()
                }
                CategorySubcommand::List => commands::category_list(config).await?.print(),
                CategorySubcommand::Update(args) => {
                    commands::category_update(config, args.clone())
                        .await?
                        .print()
                }
                CategorySubcommand::Delete(args) => {
                    commands::category_delete(config, *args).await?.print()
                }
            }
        }

        Command::Product(product_args) => {
            let config = Config::load(home).await?;
            match product_args.action() {
                ProductSubcommand::Add(args) => {
                    commands::product_add(config, args.clone()).await?.print()
                }
                ProductSubcommand::List(args) => {
                    commands::product_list(config, *args).await?.print()
                }
                ProductSubcommand::Update(args) => {
                    commands::product_update(config, args.clone())
                        .await?
                        .print()
                }
                ProductSubcommand::Delete(args) => {
                    commands::product_delete(config, *args).await?.print()
                }
            }
        }

        Command::Transaction(transaction_args) => {
            let config = Config::load(home).await?;
            match transaction_args.action() {
                TransactionSubcommand::Add(args) => {
                    commands::transaction_add(config, args.clone())
                        .await?
                        .print()
                }
                TransactionSubcommand::List(args) => {
                    commands::transaction_list(config, *args).await?.print()
                }
                TransactionSubcommand::Show(args) => {
                    commands::transaction_show(config, *args).await?.print()
                }
                TransactionSubcommand::Delete(args) => {
                    commands::transaction_delete(config, *args).await?.print()
                }
            }
        }

        Command::History => commands::history(Config::load(home).await?)
            .await?
            .print(),

        Command::Breakdown(breakdown_args) => {
            commands::breakdown(Config::load(home).await?, *breakdown_args)
                .await?
                .print()
        }

        Command::Backup(backup_args) => {
            let config = Config::load(home).await?;
            match backup_args.action() {
                BackupSubcommand::Create => commands::backup_create(config).await?.print(),
                BackupSubcommand::List => commands::backup_list(config).await?.print(),
                BackupSubcommand::Restore(args) => {
                    commands::backup_restore(config, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Config(config_args) => {
            commands::configure(Config::load(home).await?, config_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
