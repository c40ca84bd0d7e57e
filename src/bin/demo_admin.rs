//! Admin tool for demo sandboxes.
//!
//! Runs the same operations as the HTTP API directly against the configured
//! database:
//!
//! ```text
//! scm-demo-admin seed
//! scm-demo-admin reset
//! scm-demo-admin create "Acme Trial"
//! scm-demo-admin delete <guid>
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use scm_demo::{
    config,
    db,
    handlers::demos::DemoView,
    logging::{setup_logger, LoggerConfig},
    AppState,
};

#[derive(Parser)]
#[command(name = "scm-demo-admin", about = "Seed, reset, create and delete demo sandboxes", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[arg(long, global = true, help = "Override the configured seed directory")]
    seed_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load reference data into empty tables
    Seed,
    /// Delete every demo, user and reference row
    Reset,
    /// Create a demo and print its guid and manager
    Create { name: String },
    /// Delete a demo and its users
    Delete { guid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    if let Some(dir) = cli.seed_dir {
        cfg.seed_dir = dir;
    }
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;
    if cfg.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("failed running migrations")?;
    }

    let logger = setup_logger(LoggerConfig {
        use_color: false,
        ..LoggerConfig::default()
    });
    let state = AppState::new(Arc::new(pool), cfg, logger);
    let demos = state.demo_service();

    match cli.command {
        Commands::Seed => {
            let report = demos.seed_all().await?;
            if cli.json {
                print_json(&report)?;
            } else {
                for table in &report.tables {
                    println!(
                        "{:<20} existing {:>6}  inserted {:>6}",
                        table.table, table.existing, table.inserted
                    );
                }
            }
        }
        Commands::Reset => {
            let report = demos.reset_all().await?;
            if cli.json {
                print_json(&report)?;
            } else {
                for table in &report.tables {
                    println!("{:<20} deleted {:>6}", table.table, table.deleted);
                }
            }
        }
        Commands::Create { name } => {
            let demo = DemoView::from(demos.create_demo(&name).await?);
            if cli.json {
                print_json(&demo)?;
            } else {
                println!(
                    "Demo {} ({}) guid {}",
                    demo.id,
                    demo.name,
                    demo.guid.as_deref().unwrap_or("-")
                );
                for user in &demo.users {
                    println!("  user {} {} <{}>", user.id, user.username, user.email);
                }
            }
        }
        Commands::Delete { guid } => {
            demos.delete_by_guid(&guid).await?;
            if cli.json {
                print_json(&serde_json::json!({ "deleted": guid }))?;
            } else {
                println!("Demo {} deleted", guid);
            }
        }
    }

    db::close_pool(state.db.as_ref().clone()).await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
