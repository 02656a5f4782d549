// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! rtcontrol-ctl
//!
//! Reconcile a single Control API resource from the command line.
//!
//! Desired state is read from a JSON file; observed state is written to a
//! state file after every successful operation and removed when the resource
//! is found gone or deleted.
//!
//! Usage:
//!   rtcontrol-ctl create --kind rule --desired rule.json --state rule.state.json
//!   rtcontrol-ctl read   --kind rule --state rule.state.json
//!   rtcontrol-ctl update --kind rule --desired rule.json --state rule.state.json
//!   rtcontrol-ctl delete --kind rule --state rule.state.json
//!   rtcontrol-ctl import --kind rule --id app1,rule1 --state rule.state.json

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rtcontrol_api::{ControlApi, HttpControlApi};
use rtcontrol_reconcile::resources::{AppKind, KeyKind, NamespaceKind, QueueKind, RuleKind};
use rtcontrol_reconcile::retry::DEFAULT_MAX_RETRIES;
use rtcontrol_reconcile::{
    Deletion, Engine, Observation, ResourceKind, RetryContext, RetryPolicy, StateFile,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reconcile Control API resources
#[derive(Parser)]
#[command(name = "rtcontrol-ctl")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Give up after this many seconds
    #[arg(long, global = true, env = "RTCONTROL_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Retries after the first attempt for transient failures
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    App,
    Namespace,
    Key,
    Queue,
    Rule,
}

#[derive(Subcommand)]
enum Command {
    /// Create a resource from its desired state
    Create(DesiredArgs),
    /// Refresh recorded state from the server
    Read(StateArgs),
    /// Apply desired state to a recorded resource
    Update(DesiredArgs),
    /// Delete a recorded resource
    Delete(StateArgs),
    /// Attach to an existing resource by its composite id
    Import(ImportArgs),
}

#[derive(Args)]
struct DesiredArgs {
    #[arg(long, value_enum)]
    kind: Kind,
    /// JSON file with the desired state
    #[arg(long)]
    desired: PathBuf,
    /// JSON file holding the observed state
    #[arg(long)]
    state: PathBuf,
}

#[derive(Args)]
struct StateArgs {
    #[arg(long, value_enum)]
    kind: Kind,
    /// JSON file holding the observed state
    #[arg(long)]
    state: PathBuf,
}

#[derive(Args)]
struct ImportArgs {
    #[arg(long, value_enum)]
    kind: Kind,
    /// `<id>` for apps, `<app_id>,<id>` for everything else
    #[arg(long)]
    id: String,
    /// Where to write the observed state
    #[arg(long)]
    state: PathBuf,
}

impl Command {
    fn kind(&self) -> Kind {
        match self {
            Command::Create(args) | Command::Update(args) => args.kind,
            Command::Read(args) | Command::Delete(args) => args.kind,
            Command::Import(args) => args.kind,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rtcontrol_ctl=info,rtcontrol_reconcile=info,rtcontrol_api=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();

    let token = CancellationToken::new();
    let mut ctx = RetryContext::new().with_cancellation(token.clone());
    if let Some(secs) = cli.timeout {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });

    let policy = RetryPolicy::default().with_max_retries(cli.max_retries);
    let engine = build_engine(cli.command.kind(), policy, &ctx).await?;

    match cli.command.kind() {
        Kind::App => run::<AppKind>(&engine, &ctx, &cli.command).await,
        Kind::Namespace => run::<NamespaceKind>(&engine, &ctx, &cli.command).await,
        Kind::Key => run::<KeyKind>(&engine, &ctx, &cli.command).await,
        Kind::Queue => run::<QueueKind>(&engine, &ctx, &cli.command).await,
        Kind::Rule => run::<RuleKind>(&engine, &ctx, &cli.command).await,
    }
}

/// Apps live under the account, so resolve it when it was not configured.
async fn build_engine(
    kind: Kind,
    policy: RetryPolicy,
    ctx: &RetryContext,
) -> anyhow::Result<Engine> {
    let api = HttpControlApi::from_env().context("failed to configure Control API client")?;
    let account_id = api.config().account_id.clone();
    let api: Arc<dyn ControlApi> = Arc::new(api);

    if kind == Kind::App && account_id.is_none() {
        return Ok(Engine::connect(api, policy, ctx).await?);
    }
    Ok(Engine::new(api, account_id, policy))
}

async fn run<K: ResourceKind>(
    engine: &Engine,
    ctx: &RetryContext,
    command: &Command,
) -> anyhow::Result<()> {
    match command {
        Command::Create(args) => {
            let desired: K::State = read_json(&args.desired)?;
            let observed = engine.create::<K>(ctx, &desired).await?;
            StateFile::new(&args.state).save(&observed)?;
            print_state(&observed)
        }
        Command::Read(args) => {
            let file = StateFile::new(&args.state);
            let prior = load_prior::<K>(&file)?;
            match engine.read::<K>(ctx, &prior).await? {
                Observation::Present(observed) => {
                    file.save(&observed)?;
                    print_state(&observed)
                }
                Observation::Absent => {
                    file.remove()?;
                    info!("{} no longer exists; state removed", K::KIND);
                    Ok(())
                }
            }
        }
        Command::Update(args) => {
            let file = StateFile::new(&args.state);
            let prior = load_prior::<K>(&file)?;
            let desired: K::State = read_json(&args.desired)?;
            let observed = engine.update::<K>(ctx, &prior, &desired).await?;
            file.save(&observed)?;
            print_state(&observed)
        }
        Command::Delete(args) => {
            let file = StateFile::new(&args.state);
            let prior = load_prior::<K>(&file)?;
            match engine.delete::<K>(ctx, &prior).await? {
                Deletion::Deleted => info!("{} deleted", K::KIND),
                Deletion::AlreadyAbsent => info!("{} was already gone", K::KIND),
            }
            file.remove()?;
            Ok(())
        }
        Command::Import(args) => match engine.import::<K>(ctx, &args.id).await? {
            Observation::Present(observed) => {
                StateFile::new(&args.state).save(&observed)?;
                print_state(&observed)
            }
            Observation::Absent => bail!("{} '{}' does not exist", K::KIND, args.id),
        },
    }
}

fn load_prior<K: ResourceKind>(file: &StateFile) -> anyhow::Result<K::State> {
    file.load()?
        .with_context(|| format!("no {} state recorded at {}", K::KIND, file.path().display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_state<S: Serialize>(state: &S) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
