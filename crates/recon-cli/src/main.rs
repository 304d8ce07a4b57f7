//! Recon CLI
//!
//! - `provision`: ensure the application's entities and attributes exist
//! - `resolve`: show which collection a role maps to
//! - `fields`: list an entity's attributes and how field roles resolve
//! - `create`: write one record by field role

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use recon_client::{CancelHandle, StaticToken, StoreConfig};
use recon_core::{app::FieldRole, Engine, EngineConfig, WriteRecord};
use recon_resolve::FieldQuery;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recon", version, about = "Schema reconciliation and adaptive writes")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Bearer token for the store
    #[arg(long, global = true, env = "RECON_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure every entity and attribute of the application catalog
    Provision,

    /// Resolve a role to this deployment's collection
    Resolve {
        /// Application role, e.g. `documents`
        role: String,
    },

    /// List attributes of a role's entity and resolve the field roles
    Fields {
        /// Application role
        role: String,
    },

    /// Create one record
    Create(CreateArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Application role of the record
    role: String,

    /// Field value as `field=json`; `field` is a field role or an attribute name
    #[arg(long = "set", value_name = "FIELD=JSON")]
    values: Vec<String>,

    /// Lookup as `field=role:id`
    #[arg(long = "lookup", value_name = "FIELD=ROLE:ID")]
    lookups: Vec<String>,

    /// Resolve and print the payload without writing
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::new(StoreConfig::default()),
    };
    config.apply_env()?;
    Ok(config)
}

fn query_for(field: &str, prefix: &str) -> FieldQuery {
    match FieldRole::parse(field) {
        Some(role) => role.query(prefix),
        None => FieldQuery::exact(field),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn build_record(args: &CreateArgs, prefix: &str) -> Result<WriteRecord> {
    let mut record = WriteRecord::new();
    for entry in &args.values {
        let (field, raw) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FIELD=JSON, got '{entry}'"))?;
        record = record.with(query_for(field, prefix), parse_value(raw));
    }
    for entry in &args.lookups {
        let (field, target) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FIELD=ROLE:ID, got '{entry}'"))?;
        let (role, id) = target
            .split_once(':')
            .ok_or_else(|| anyhow!("expected ROLE:ID, got '{target}'"))?;
        record = record.with_lookup(query_for(field, prefix), role, id);
    }
    Ok(record)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let token = cli
        .token
        .ok_or_else(|| anyhow!("no bearer token: set RECON_TOKEN or pass --token"))?;
    let engine = Engine::connect(config, Arc::new(StaticToken::new(token)))
        .context("connecting to store")?;

    let (cancel, signal) = CancelHandle::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing current step");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Provision => {
            let log = engine.provision_catalog(&signal).await;
            for step in &log {
                println!("{step}");
            }
            if !log.is_success() {
                bail!("{} provisioning step(s) failed", log.failures().count());
            }
        }
        Commands::Resolve { role } => {
            let resolved = engine.resolve_collection(&role).await?;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Fields { role } => {
            let resolved = engine.resolve_collection(&role).await?;
            let entity = resolved
                .logical_name
                .ok_or_else(|| anyhow!("no entity known for role '{role}'"))?;
            let known = engine.known_attributes(&entity).await?;
            println!("{entity} ({} attributes)", known.len());
            for name in known.iter() {
                println!("  {name}");
            }
            for field in FieldRole::ALL {
                let picked = engine.field(field).pick(&known);
                println!("{field:>14} -> {}", picked.as_deref().unwrap_or("-"));
            }
        }
        Commands::Create(args) => {
            let record = build_record(&args, &engine.config().publisher_prefix)?;
            let job = engine.prepare(&args.role, &record).await?;
            if args.dry_run {
                println!("POST {}", job.collection);
                println!("{}", serde_json::to_string_pretty(&job.payload.to_json())?);
                return Ok(());
            }
            match engine
                .adaptive_create_with_cancel(&job.collection, job.payload, &signal)
                .await
            {
                Ok(ok) => println!("{}", serde_json::to_string_pretty(&ok)?),
                Err(failure) => bail!(failure),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
