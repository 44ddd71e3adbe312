// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BlackLab - a WhatsApp ordering bot for data, minutes and SMS bundles.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod serve;
mod shutdown;

use std::path::PathBuf;

use blacklab_config::{BlacklabConfig, ConfigError};
use blacklab_core::{BlacklabError, Category, OrderId, OrderStatus, Package, PackageId, StorageAdapter};
use blacklab_storage::SqliteStorage;
use blacklab_whatsapp::WhatsAppChannel;
use clap::{Parser, Subcommand};

/// BlackLab - WhatsApp ordering bot for data, minutes and SMS bundles.
#[derive(Parser, Debug)]
#[command(name = "blacklab", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the standard search path.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the WhatsApp webhook and admin API.
    Serve,
    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the package catalog.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Inspect and settle orders.
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Inspect the user directory.
    #[command(subcommand)]
    Users(UsersCommand),
    /// Send a plain-text message to every known user.
    Broadcast {
        /// Message body.
        text: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, then print a summary.
    Check,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List every package.
    List,
    /// Add a package.
    Add {
        #[arg(long)]
        id: String,
        /// data, minutes or sms.
        #[arg(long)]
        category: Category,
        #[arg(long)]
        title: String,
        /// Price in whole currency units.
        #[arg(long)]
        price: u32,
    },
    /// Remove a package by id.
    Remove { id: String },
    /// Add the default bundles that are missing.
    Seed,
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    /// List orders, newest first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Record the payment outcome of a pending order.
    SetStatus {
        id: String,
        /// confirmed or failed.
        status: OrderStatus,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// List every phone number that has messaged the bot.
    List,
}

fn load_config(path: Option<&PathBuf>) -> Result<BlacklabConfig, Vec<ConfigError>> {
    match path {
        Some(path) => blacklab_config::load_and_validate_path(path),
        None => blacklab_config::load_and_validate(),
    }
}

async fn open_storage(config: &BlacklabConfig) -> Result<SqliteStorage, BlacklabError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

async fn run(command: Commands, config: BlacklabConfig) -> Result<(), BlacklabError> {
    let mut out = std::io::stdout();
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config(ConfigCommand::Check) => {
            let summary = serde_json::json!({
                "bot": config.bot.name,
                "session_backend": config.session.backend.to_string(),
                "database_path": config.storage.database_path,
                "listen": format!("{}:{}", config.server.host, config.server.port),
                "whatsapp_configured": config.whatsapp.access_token.is_some()
                    && config.whatsapp.phone_number_id.is_some(),
                "signature_verification": config.whatsapp.app_secret.is_some(),
                "admin_api": config.server.admin_token.is_some(),
            });
            println!("config ok");
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .map_err(|e| BlacklabError::Internal(e.to_string()))?
            );
            Ok(())
        }
        Commands::Catalog(cmd) => {
            let storage = open_storage(&config).await?;
            let result = match cmd {
                CatalogCommand::List => admin::list_packages(&storage, &mut out).await,
                CatalogCommand::Add {
                    id,
                    category,
                    title,
                    price,
                } => {
                    let package = Package::new(id, category, title, price)?;
                    admin::add_package(&storage, package, &mut out).await
                }
                CatalogCommand::Remove { id } => {
                    admin::remove_package(&storage, &PackageId(id), &mut out).await
                }
                CatalogCommand::Seed => admin::seed_catalog(&storage, &mut out).await,
            };
            storage.close().await?;
            result
        }
        Commands::Orders(cmd) => {
            let storage = open_storage(&config).await?;
            let result = match cmd {
                OrdersCommand::List { limit } => admin::list_orders(&storage, limit, &mut out).await,
                OrdersCommand::SetStatus { id, status } => {
                    admin::set_order_status(&storage, &OrderId(id), status, &mut out).await
                }
            };
            storage.close().await?;
            result
        }
        Commands::Users(UsersCommand::List) => {
            let storage = open_storage(&config).await?;
            let result = admin::list_users(&storage, &mut out).await;
            storage.close().await?;
            result
        }
        Commands::Broadcast { text } => {
            let channel = WhatsAppChannel::new(&config.whatsapp, config.business.clone())?;
            let storage = open_storage(&config).await?;
            let report = admin::broadcast(&storage, &channel, &text).await;
            storage.close().await?;
            let report = report?;
            println!("broadcast sent to {} user(s), {} failed", report.sent, report.failed);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("blacklab: use --help for available commands");
        return;
    };

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            blacklab_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.bot.log_level);

    if let Err(e) = run(command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn catalog_add_parses_category_and_price() {
        let cli = Cli::try_parse_from([
            "blacklab", "catalog", "add", "--id", "7", "--category", "minutes", "--title",
            "250 Minutes", "--price", "99",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Catalog(CatalogCommand::Add {
                id,
                category,
                title,
                price,
            })) => {
                assert_eq!(id, "7");
                assert_eq!(category, Category::Minutes);
                assert_eq!(title, "250 Minutes");
                assert_eq!(price, 99);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = Cli::try_parse_from([
            "blacklab", "catalog", "add", "--id", "7", "--category", "airtime", "--title", "x",
            "--price", "1",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn orders_set_status_parses_status() {
        let cli = Cli::try_parse_from([
            "blacklab", "--config", "/tmp/b.toml", "orders", "set-status", "abc", "confirmed",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Orders(OrdersCommand::SetStatus {
                status: OrderStatus::Confirmed,
                ..
            }))
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = blacklab_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.bot.name, "blacklab");
    }
}
