//! stkbond - resolve bond and unbond actions into unsigned staking payloads.

mod config;
mod report;
mod snapshot_file;
mod worker;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail, eyre};
use report::{PayloadReport, ResolveReport};
use rust_decimal::Decimal;
use serde::Serialize;
use snapshot_file::SnapshotFile;
use stkbond_chain::{ChainClient, fetch_bond_snapshot, parse_account};
use stkbond_core::config::{AppConfig, save_config, save_config_to};
use stkbond_core::{
    ActionKind, BondSession, BondSnapshot, ConnectionStatus, Network, SessionEvent, StakingMode,
    parse_amount,
};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use worker::{ChainRequest, ChainUpdate, ChannelSubmitter, chain_task};

/// Bond/unbond resolver for Polkadot staking.
#[derive(Parser, Debug)]
#[command(name = "stkbond")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an action against a snapshot file, without touching the chain
    Resolve {
        #[arg(long, value_enum)]
        mode: ModeArg,

        #[arg(long, value_enum)]
        action: ActionArg,

        /// Amount in whole tokens (editable actions only)
        #[arg(long, value_parser = parse_amount)]
        amount: Option<Decimal>,

        /// JSON snapshot of the account's bond state
        #[arg(long)]
        snapshot: PathBuf,

        /// Treat the chain client as connected
        #[arg(long)]
        client: bool,
    },

    /// Fetch an account's bond state and print it as a snapshot file
    Snapshot {
        #[command(flatten)]
        chain: ChainArgs,
    },

    /// Resolve an action on chain and print the unsigned payload
    Payload {
        #[command(flatten)]
        chain: ChainArgs,

        /// Staking mode (defaults to the configured one)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        #[arg(long, value_enum)]
        action: ActionArg,

        /// Amount in whole tokens (editable actions only)
        #[arg(long, value_parser = parse_amount)]
        amount: Option<Decimal>,

        /// Build an immortal transaction
        #[arg(long)]
        immortal: bool,
    },

    /// Manage accounts the external signer holds keys for
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
}

#[derive(clap::Args, Debug)]
struct ChainArgs {
    /// Network to connect to (defaults to the configured one)
    #[arg(short, long)]
    network: Option<NetworkArg>,

    /// Account address (SS58)
    #[arg(short, long)]
    address: String,

    /// Custom Asset Hub RPC endpoint URL
    #[arg(long)]
    rpc: Option<String>,
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    /// List imported accounts
    List,
    /// Mark an account as imported
    Add {
        address: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Forget an imported account
    Remove { address: String },
}

/// Network argument that can be parsed from string.
#[derive(Debug, Clone)]
struct NetworkArg(Network);

impl std::str::FromStr for NetworkArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polkadot" | "dot" => Ok(NetworkArg(Network::Polkadot)),
            "kusama" | "ksm" => Ok(NetworkArg(Network::Kusama)),
            "westend" | "wnd" => Ok(NetworkArg(Network::Westend)),
            "paseo" | "pas" => Ok(NetworkArg(Network::Paseo)),
            _ => Err(format!(
                "Unknown network '{}'. Valid options: polkadot, kusama, westend, paseo",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Direct,
    Pooled,
}

impl From<ModeArg> for StakingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Direct => StakingMode::Direct,
            ModeArg::Pooled => StakingMode::Pooled,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    BondSome,
    BondAll,
    UnbondSome,
    UnbondAll,
}

impl From<ActionArg> for ActionKind {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::BondSome => ActionKind::BondSome,
            ActionArg::BondAll => ActionKind::BondAll,
            ActionArg::UnbondSome => ActionKind::UnbondSome,
            ActionArg::UnbondAll => ActionKind::UnbondAll,
        }
    }
}

#[derive(Debug, Serialize)]
struct PayloadOutput {
    resolution: ResolveReport,
    payload: PayloadReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("stkbond={level}").parse()?)
        .add_directive(format!("stkbond_chain={level}").parse()?)
        .add_directive(format!("stkbond_core={level}").parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app_config = config::load(args.config.as_deref())
        .wrap_err("Failed to load configuration")?;

    match args.command {
        Command::Resolve {
            mode,
            action,
            amount,
            snapshot,
            client,
        } => {
            let file = SnapshotFile::load(&snapshot)?;
            let network = file.network;
            let mut session =
                BondSession::new(mode.into(), action.into(), file.into_snapshot()?, client);
            if let Some(amount) = amount {
                session.transition(SessionEvent::EditAmount(amount));
            }
            print_json(&ResolveReport::from_session(&session, network))
        }
        Command::Snapshot { chain } => {
            let (client, snapshot) = connect_and_fetch(&chain, &app_config).await?;
            print_json(&SnapshotFile::from_snapshot(client.network(), &snapshot))
        }
        Command::Payload {
            chain,
            mode,
            action,
            amount,
            immortal,
        } => {
            let mode = mode
                .map(StakingMode::from)
                .unwrap_or(app_config.default_mode);
            let use_mortal_era = app_config.use_mortal_era && !immortal;
            run_payload(
                &chain,
                &app_config,
                mode,
                action.into(),
                amount,
                use_mortal_era,
            )
            .await
        }
        Command::Accounts { command } => {
            run_accounts(command, app_config, args.config.as_deref())
        }
    }
}

async fn connect_and_fetch(
    chain: &ChainArgs,
    app_config: &AppConfig,
) -> Result<(ChainClient, BondSnapshot)> {
    let network = chain.network.as_ref().map_or(app_config.network, |n| n.0);
    let account = parse_account(&chain.address)?;
    let imported = config::imported_accounts(app_config);
    let endpoint = chain.rpc.as_deref().or(app_config.rpc_endpoint.as_deref());

    let (status_tx, mut status_rx) = mpsc::channel::<ConnectionStatus>(8);
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            tracing::debug!("Connection status: {:?}", status);
        }
    });

    let client = ChainClient::connect_rpc(network, endpoint, status_tx).await?;
    let snapshot = fetch_bond_snapshot(&client, network, &account, &imported)
        .await
        .wrap_err("Failed to fetch bond state")?;
    Ok((client, snapshot))
}

async fn run_payload(
    chain: &ChainArgs,
    app_config: &AppConfig,
    mode: StakingMode,
    action: ActionKind,
    amount: Option<Decimal>,
    use_mortal_era: bool,
) -> Result<()> {
    let (client, snapshot) = connect_and_fetch(chain, app_config).await?;
    let network = client.network();

    let mut session = BondSession::new(mode, action, snapshot, true);
    if let Some(amount) = amount {
        session.transition(SessionEvent::EditAmount(amount));
    }

    let (request_tx, request_rx) = mpsc::channel(4);
    let (update_tx, mut update_rx) = mpsc::channel(4);
    let worker = tokio::spawn(chain_task(client, request_rx, update_tx));

    if let Ok(tx) = session.preview() {
        request_tx
            .send(ChainRequest::EstimateFee(tx.call))
            .await
            .map_err(|_| eyre!("Chain worker stopped"))?;
        if let Some(update) = update_rx.recv().await
            && let Some(event) = update.session_event()
        {
            session.transition(event);
        }
    }

    let mut submitter = ChannelSubmitter::new(request_tx, use_mortal_era);
    if let Err(e) = session.submit(&mut submitter) {
        print_json(&ResolveReport::from_session(&session, network))?;
        bail!("Nothing to submit: {}", e);
    }
    let resolution = ResolveReport::from_session(&session, network);

    let payload = loop {
        let Some(update) = update_rx.recv().await else {
            bail!("Chain worker stopped before the payload was ready");
        };
        if let Some(event) = update.session_event() {
            session.transition(event);
        }
        match update {
            ChainUpdate::PayloadReady(payload) => break payload,
            ChainUpdate::Failed(reason) => bail!("Failed to build payload: {}", reason),
            ChainUpdate::Fee(_) => continue,
        }
    };

    drop(submitter);
    worker.await?;

    print_json(&PayloadOutput {
        resolution,
        payload: PayloadReport::new(&payload, network),
    })
}

fn run_accounts(
    command: AccountsCommand,
    mut app_config: AppConfig,
    path: Option<&Path>,
) -> Result<()> {
    match command {
        AccountsCommand::List => {
            for account in &app_config.imported_accounts {
                match &account.label {
                    Some(label) => println!("{}  {}", account.address, label),
                    None => println!("{}", account.address),
                }
            }
            return Ok(());
        }
        AccountsCommand::Add { address, label } => {
            parse_account(&address)?;
            app_config.import_account(address, label);
        }
        AccountsCommand::Remove { address } => {
            if !app_config.forget_account(&address) {
                bail!("Account {} is not imported", address);
            }
        }
    }

    match path {
        Some(path) => save_config_to(&app_config, path)?,
        None => save_config(&app_config)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
