//! fiber-cli: command-line front end for the fiber wallet engine.
//!
//! Settings are layered: `fiber.toml` (or `--config`), then `FIBER_*`
//! environment variables, then command-line flags.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use fiber_core::traits::Gateway;
use fiber_gateway::{GatewayConfig, HttpGateway};
use fiber_wallet::{RegistryConfig, Sender, WalletRegistry, new_seed};

/// Node used when neither settings nor flags name one.
const DEFAULT_NODE: &str = "127.0.0.1:6420";

/// Multi-coin wallet for the fiber family of networks.
#[derive(Parser)]
#[command(name = "fiber-cli")]
#[command(version, about = "Deterministic wallets for fiber-family coins")]
struct Cli {
    /// Settings file (default: fiber.toml in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Wallet directory (default: ~/.wallet-family).
    #[arg(long, global = true)]
    wallet_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported coin types.
    Coins,
    /// Print a fresh 12-word seed.
    Seed,
    /// Create a wallet.
    Create(CreateArgs),
    /// List wallets.
    List,
    /// Show a wallet's addresses.
    Addresses {
        /// Wallet id.
        id: String,
    },
    /// Derive new addresses.
    NewAddress {
        /// Wallet id.
        id: String,
        /// How many addresses to derive.
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Change a wallet's label.
    Label {
        /// Wallet id.
        id: String,
        /// New label.
        label: String,
    },
    /// Delete a wallet file.
    Remove {
        /// Wallet id.
        id: String,
    },
    /// Query a wallet's balance from its node.
    Balance(NodeArgs),
    /// Sign and broadcast a spend.
    Send(SendArgs),
    /// Sign a spend and print the raw transaction without broadcasting.
    RawTx(SendArgs),
    /// Check whether a transaction is confirmed.
    Status {
        /// Coin type.
        #[arg(long)]
        coin: String,
        /// Transaction id.
        txid: String,
        /// Node address (host:port).
        #[arg(long)]
        node: Option<String>,
    },
}

#[derive(Args)]
struct CreateArgs {
    /// Coin type, e.g. skycoin.
    #[arg(long)]
    coin: String,
    /// Wallet label.
    #[arg(long, default_value = "")]
    label: String,
    /// Restore from this seed instead of generating one.
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Args)]
struct NodeArgs {
    /// Wallet id.
    id: String,
    /// Node address (host:port).
    #[arg(long)]
    node: Option<String>,
}

#[derive(Args)]
struct SendArgs {
    /// Wallet id.
    id: String,
    /// Destination address.
    to: String,
    /// Amount in coins, e.g. 1.5.
    amount: String,
    /// Node address (host:port).
    #[arg(long)]
    node: Option<String>,
}

/// Values read from the settings file and environment.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    wallet_dir: Option<PathBuf>,
    /// Node address per coin type.
    #[serde(default)]
    nodes: HashMap<String, String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref())?;
    let mut registry_config = RegistryConfig::default();
    if let Some(dir) = cli.wallet_dir.clone().or_else(|| settings.wallet_dir.clone()) {
        registry_config.wallet_dir = dir;
    }
    tracing::debug!(wallet_dir = %registry_config.wallet_dir.display(), nodes = settings.nodes.len(), "settings loaded");

    match cli.command {
        Commands::Coins => {
            for coin in &registry_config.coins {
                println!("{:<12} {}", coin.name, coin.symbol);
            }
            Ok(())
        }
        Commands::Seed => {
            println!("{}", new_seed()?.as_str());
            Ok(())
        }
        Commands::Create(args) => create(registry_config, args),
        Commands::List => {
            let registry = open_registry(registry_config)?;
            for id in registry.wallet_ids() {
                let wallet = registry.wallet(&id)?;
                println!("{id}  {}  {}", wallet.coin_type(), wallet.label());
            }
            Ok(())
        }
        Commands::Addresses { id } => {
            let registry = open_registry(registry_config)?;
            for address in registry.get_addresses(&id)? {
                println!("{address}");
            }
            Ok(())
        }
        Commands::NewAddress { id, count } => {
            let password = prompt_password("Wallet password")?;
            let registry = WalletRegistry::init(registry_config, &password)?;
            for address in registry.new_addresses(&id, count, &password)? {
                println!("{address}");
            }
            Ok(())
        }
        Commands::Label { id, label } => {
            open_registry(registry_config)?.update_label(&id, &label)?;
            Ok(())
        }
        Commands::Remove { id } => {
            open_registry(registry_config)?.remove(&id)?;
            println!("Removed {id}");
            Ok(())
        }
        Commands::Balance(args) => {
            let registry = open_registry(registry_config)?;
            let coin = registry.wallet(&args.id)?.coin_type().to_string();
            let node = node_for(&settings, &coin, args.node);
            registry.register_coin(&coin, &node)?;
            let registry = Arc::new(registry);
            let balance = Sender::new(Arc::clone(&registry)).wallet_balance(&coin, &args.id)?;
            let gateway = registry.gateway(&coin)?;
            let cfg = gateway.coin();
            println!(
                "confirmed: {} {} ({} hours)",
                cfg.format_amount(balance.confirmed.coins),
                cfg.symbol,
                balance.confirmed.hours
            );
            println!(
                "predicted: {} {} ({} hours)",
                cfg.format_amount(balance.predicted.coins),
                cfg.symbol,
                balance.predicted.hours
            );
            Ok(())
        }
        Commands::Send(args) => spend(registry_config, &settings, args, true),
        Commands::RawTx(args) => spend(registry_config, &settings, args, false),
        Commands::Status { coin, txid, node } => {
            let coin_config = registry_config
                .coin(&coin)
                .cloned()
                .with_context(|| format!("Unsupported coin type: {coin}"))?;
            let gateway = HttpGateway::new(GatewayConfig::new(&node_for(&settings, &coin, node), coin_config))?;
            let info = gateway.get_transaction(&txid)?;
            match (info.confirmed, info.height) {
                (true, Some(height)) => println!("{txid}: confirmed at height {height}"),
                (true, None) => println!("{txid}: confirmed"),
                (false, _) => println!("{txid}: unconfirmed"),
            }
            Ok(())
        }
    }
}

/// Create a wallet, printing the generated seed once.
fn create(config: RegistryConfig, args: CreateArgs) -> Result<()> {
    let password = prompt_password("Wallet password")?;
    let confirm = prompt_password("Confirm password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let registry = WalletRegistry::init(config, &password)?;
    let id = registry.create_wallet(&args.coin, &args.label, args.seed.as_deref(), &password)?;

    println!("\n=== WALLET CREATED ===");
    println!("Id: {id}");
    if args.seed.is_none() {
        let seed = registry.get_seed(&id, &password)?;
        println!("\nSEED PHRASE (BACKUP THIS, 12 WORDS):");
        println!("  {}", seed.as_str());
        println!("\nWARNING: This seed phrase will NOT be shown again.");
    }
    for address in registry.get_addresses(&id)? {
        println!("Address: {address}");
    }
    Ok(())
}

/// Sign a spend and either broadcast it or print the raw hex.
fn spend(config: RegistryConfig, settings: &Settings, args: SendArgs, broadcast: bool) -> Result<()> {
    let password = prompt_password("Wallet password")?;
    let registry = WalletRegistry::init(config, &password)?;
    let coin = registry.wallet(&args.id)?.coin_type().to_string();
    registry.register_coin(&coin, &node_for(settings, &coin, args.node))?;
    let sender = Sender::new(Arc::new(registry));

    if broadcast {
        let txid = sender.send(&coin, &args.id, &args.to, &args.amount, &password)?;
        println!("Transaction sent: {txid}");
    } else {
        let raw = sender.create_raw_transaction(&coin, &args.id, &args.to, &args.amount, &password)?;
        println!("txid: {}", raw.txid);
        println!("{}", raw.hex);
    }
    Ok(())
}

/// Open the registry after prompting for the store password.
fn open_registry(config: RegistryConfig) -> Result<WalletRegistry> {
    let password = prompt_password("Wallet password")?;
    WalletRegistry::init(config, &password).context("Failed to open wallets (check password)")
}

/// Read `fiber.toml` (or the given file) and `FIBER_*` variables.
fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let file = match path {
        Some(p) => config::File::from(p.as_path()).required(true),
        None => config::File::with_name("fiber").required(false),
    };
    config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix("FIBER").separator("__"))
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")
}

/// Node for `coin`: the flag, then settings, then the default.
fn node_for(settings: &Settings, coin: &str, flag: Option<String>) -> String {
    flag.or_else(|| settings.nodes.get(coin).cloned())
        .unwrap_or_else(|| DEFAULT_NODE.to_string())
}

/// Prompt for a password securely (no echo).
fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{prompt}: ")).context("Failed to read password")
}
