//! Command line entry point for nft-minter.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nft_minter::minter::{Cluster, KeypairFile, MintConfig, Minter, MinterBuilder, ProgramIdl, SignerProvider};
use nft_minter::MintRequest;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nft-minter", version, about = "Mint NFTs through the nft_mint program")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mint one NFT to a recipient wallet
    Mint {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        signer: SignerArgs,
        /// Recipient wallet address
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        /// Metadata JSON uri
        #[arg(long)]
        uri: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the program configuration account
    Init {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        signer: SignerArgs,
        /// Update authority recorded in the configuration, defaults to the signer
        #[arg(long)]
        update_authority: Option<String>,
    },
    /// Replace owner and update authority of the configuration account
    UpdateConfig {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        signer: SignerArgs,
        #[arg(long)]
        update_authority: Option<String>,
    },
    /// Show how many tokens of a mint an owner holds
    Balance {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        mint: String,
        #[arg(long)]
        owner: String,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Target cluster
    #[arg(long = "env", value_enum, default_value_t = Cluster::MainnetBeta)]
    cluster: Cluster,
    /// RPC endpoint overriding the cluster default
    #[arg(long)]
    rpc_url: Option<String>,
    /// Id of the deployed nft_mint program
    #[arg(long, env = "NFT_MINT_PROGRAM_ID")]
    program_id: Option<String>,
    /// Anchor IDL overriding the bundled one
    #[arg(long)]
    idl: Option<PathBuf>,
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SignerArgs {
    /// Path to the service keypair file
    #[arg(long)]
    keypair: PathBuf,
}

impl SignerArgs {
    fn load(&self) -> Result<Keypair> {
        Ok(KeypairFile::new(&self.keypair).load()?)
    }
}

impl CommonArgs {
    fn connect(&self) -> Result<Minter> {
        let config = match &self.config {
            Some(path) => MintConfig::from_json_file(path)?,
            None => MintConfig::default(),
        };
        // --env always picks the cluster; an rpc_url still overrides its endpoint.
        let mut builder = MinterBuilder::new().with_config(config).with_cluster(self.cluster);
        if let Some(url) = &self.rpc_url {
            builder = builder.with_rpc_url(url.clone());
        }
        if let Some(program_id) = &self.program_id {
            builder = builder.with_program_id(program_id.clone());
        }
        if let Some(path) = &self.idl {
            builder = builder.with_idl(ProgramIdl::from_file(path)?);
        }

        Ok(builder.connect()?)
    }
}

fn parse_authority(value: Option<&str>, signer: &Keypair) -> Result<Pubkey> {
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid update authority `{}`", raw)),
        None => Ok(signer.pubkey()),
    }
}

async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Mint {
            common,
            signer,
            recipient,
            name,
            symbol,
            uri,
            json,
        } => {
            // The key file is read before any network use.
            let signer = signer.load()?;
            let minter = common.connect()?;
            let request = MintRequest::new(recipient, name, symbol, uri, &signer);
            let result = minter.mint_nft(request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result.summary())?);
            } else if let Some(address) = result.nft_address() {
                println!("{}", address);
            }
            if let Some(cause) = result.cause() {
                error!("Mint failed ({}): {}", cause.kind(), cause);
            }
            Ok(result.success())
        }
        Command::Init {
            common,
            signer,
            update_authority,
        } => {
            let signer = signer.load()?;
            let minter = common.connect()?;
            let update_authority = parse_authority(update_authority.as_deref(), &signer)?;
            let signature = minter.initialize(&signer, update_authority).await?;
            println!("{}", signature);
            Ok(true)
        }
        Command::UpdateConfig {
            common,
            signer,
            update_authority,
        } => {
            let signer = signer.load()?;
            let minter = common.connect()?;
            let update_authority = parse_authority(update_authority.as_deref(), &signer)?;
            let signature = minter.update_config(&signer, update_authority).await?;
            println!("{}", signature);
            Ok(true)
        }
        Command::Balance { common, mint, owner } => {
            let minter = common.connect()?;
            let balance = minter.token_balance(&mint, &owner).await?;
            println!("{}", balance);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting nft-minter");

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
