//! Command line front-end for the customer store.
//!
//! Settings come from `DEBT_*` environment variables, overridden by flags.
//! Without either, the database lives at `<temp dir>/debt.db` so data
//! survives between invocations. Results are printed as JSON on stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use debt_core::{CoreConfig, Customer, CustomerService, SqliteCustomerRepository};
use log::info;

const DEFAULT_DB_FILE_NAME: &str = "debt.db";

#[derive(Parser)]
#[command(
    name = "debt",
    about = "Manage customers of the debt management store",
    version,
    arg_required_else_help = true
)]
struct Cli {
    /// SQLite database file [default: DEBT_DB_PATH, else <temp dir>/debt.db].
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,
    /// Log level: trace, debug, info, warn, error.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files.
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all customers.
    List,
    /// Show one customer by business key.
    Get { customer_id: String },
    /// Register a new customer.
    Add {
        customer_id: String,
        #[command(flatten)]
        fields: CustomerFields,
    },
    /// Change a customer's fields, including its business key.
    Update {
        customer_id: String,
        /// New business key.
        #[arg(long)]
        new_id: Option<String>,
        #[command(flatten)]
        fields: OptionalCustomerFields,
    },
    /// Delete a customer by business key (no-op when absent).
    Delete { customer_id: String },
    /// Print CLI and core versions.
    Version,
}

#[derive(Args)]
struct CustomerFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    telephone: String,
    #[arg(long)]
    province: String,
}

#[derive(Args)]
struct OptionalCustomerFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    telephone: Option<String>,
    #[arg(long)]
    province: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("debt_cli version={}", env!("CARGO_PKG_VERSION"));
        println!("debt_core version={}", debt_core::core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    config
        .init_logging()
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let conn = config.open_db().context("failed to open database")?;
    let repo = SqliteCustomerRepository::try_new(&conn)?;
    let service = CustomerService::new(repo);

    match cli.command {
        Commands::List => print_json(&service.list_customers()?),
        Commands::Get { customer_id } => match service.get_customer(&customer_id)? {
            Some(customer) => print_json(&customer),
            None => bail!("customer `{customer_id}` not found"),
        },
        Commands::Add {
            customer_id,
            fields,
        } => {
            let customer = Customer::new(
                customer_id,
                fields.name,
                fields.telephone,
                fields.province,
            );
            print_json(&service.create_customer(&customer)?)
        }
        Commands::Update {
            customer_id,
            new_id,
            fields,
        } => {
            let Some(mut customer) = service.get_customer(&customer_id)? else {
                bail!("customer `{customer_id}` not found");
            };
            if let Some(new_id) = new_id {
                customer.customer_id = new_id;
            }
            if let Some(name) = fields.name {
                customer.name = name;
            }
            if let Some(telephone) = fields.telephone {
                customer.telephone = telephone;
            }
            if let Some(province) = fields.province {
                customer.province = province;
            }
            print_json(&service.update_customer(&customer_id, &customer)?)
        }
        Commands::Delete { customer_id } => {
            let removed = service.delete_customer(&customer_id)?;
            info!("event=cli_delete module=cli status=ok removed={removed}");
            print_json(&serde_json::json!({ "deleted": removed }))
        }
        Commands::Version => Ok(()),
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig> {
    let config = CoreConfig::from_env().context("invalid DEBT_* environment")?;
    apply_flags(cli, config)
}

fn apply_flags(cli: &Cli, mut config: CoreConfig) -> Result<CoreConfig> {
    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }
    if config.db_path.is_none() {
        config = config.with_db_path(default_db_path());
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir)?;
    }
    Ok(config)
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
