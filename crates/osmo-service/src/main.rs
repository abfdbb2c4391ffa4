//! Command-line entry point for the Osmosis wallet client.
//!
//! Each subcommand maps onto one [`WalletClient`] operation and prints its
//! result as pretty JSON on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use osmo_config::Config;
use osmo_core::{SendRequest, WalletClient};
use osmo_types::SecretString;
use serde_json::json;
use std::path::PathBuf;

/// Command-line arguments for the wallet client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file; the built-in Osmosis network is used when omitted
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
	/// Native-denomination balance of an address
	Balance {
		address: String,
		#[arg(short, long)]
		network: Option<String>,
	},
	/// Receipt of a transaction by hash
	Tx {
		hash: String,
		#[arg(short, long)]
		network: Option<String>,
	},
	/// Send tokens; the sender's mnemonic is read from MNEMONIC
	Send {
		to: String,
		amount: u128,
		#[arg(short, long)]
		network: Option<String>,
		/// Denomination, defaults to the network's native denomination
		#[arg(short, long)]
		denom: Option<String>,
		#[arg(long, env = "MNEMONIC", hide_env_values = true, value_parser = parse_secret)]
		mnemonic: SecretString,
	},
	/// Check an address against the default network's address format
	Validate { address: String },
	/// Explorer links
	Link {
		#[command(subcommand)]
		target: LinkTarget,
	},
	/// Default fee and gas price of a network
	Fee {
		#[arg(short, long)]
		network: Option<String>,
	},
}

#[derive(Subcommand, Debug, PartialEq)]
enum LinkTarget {
	/// Link to a transaction
	Tx {
		hash: String,
		#[arg(short, long)]
		network: Option<String>,
	},
	/// Link to a wallet
	Wallet {
		address: String,
		#[arg(short, long)]
		network: Option<String>,
	},
}

fn parse_secret(value: &str) -> Result<SecretString, String> {
	Ok(SecretString::from(value))
}

/// Main entry point for the wallet client.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file, or uses the built-in networks
/// 4. Runs the requested command and prints its result
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = load_config(args.config.as_ref()).await?;
	let client = WalletClient::from_config(&config)?;

	let output = run(&client, args.command).await?;
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
	match path {
		Some(path) => {
			let config = Config::from_file(path).await?;
			tracing::info!(path = %path.display(), "Loaded configuration");
			Ok(config)
		},
		None => Ok(Config::default()),
	}
}

/// Runs one command against the client.
async fn run(
	client: &WalletClient,
	command: Command,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
	let network_or_default =
		|network: Option<String>| network.unwrap_or_else(|| client.default_network().to_string());

	let output = match command {
		Command::Balance { address, network } => {
			let network = network_or_default(network);
			let balance = client.get_balance(&address, &network).await?;
			let denom = &client.registry().lookup(&network)?.native_denom;
			json!({
				"address": address,
				"network": network,
				"denom": denom,
				"balance": balance.to_string(),
			})
		},
		Command::Tx { hash, network } => {
			let network = network_or_default(network);
			match client.get_transaction(&hash, &network).await? {
				Some(result) => serde_json::to_value(result)?,
				None => {
					tracing::warn!(network = %network, "No transfer found for {}", hash);
					serde_json::Value::Null
				},
			}
		},
		Command::Send {
			to,
			amount,
			network,
			denom,
			mnemonic,
		} => {
			let request = SendRequest {
				to,
				amount,
				network: network_or_default(network),
				mnemonic,
				denom,
			};
			serde_json::to_value(client.send_transaction(request).await?)?
		},
		Command::Validate { address } => json!({
			"address": address,
			"valid": client.is_valid_wallet_address(&address),
		}),
		Command::Link { target } => match target {
			LinkTarget::Tx { hash, network } => {
				let network = network_or_default(network);
				json!({ "link": client.get_transaction_link(&hash, &network)? })
			},
			LinkTarget::Wallet { address, network } => {
				let network = network_or_default(network);
				json!({ "link": client.get_wallet_link(&address, &network)? })
			},
		},
		Command::Fee { network } => {
			let network = network_or_default(network);
			json!({
				"network": network,
				"fee": client.get_default_fee(&network)?,
				"gasPrice": client.get_default_gas_price(&network)?,
			})
		},
	};

	Ok(output)
}
