// src/main.rs
//! `ballot` command line entry point.
//! Reads go straight to the network's RPC endpoint; writes are signed by the
//! connected wallet or, with `--private-key-env`, by a local key.
use anyhow::{anyhow, bail, Context, Result};
use ballot_wallet::ballot::{publish, ElectionDraft, ElectionResults};
use ballot_wallet::blockchain::{ElectionClient, LogRange, WalletSession};
use ballot_wallet::cli::{Cli, Commands};
use ballot_wallet::core::config::ClientConfig;
use ballot_wallet::core::validation::{parse_address, parse_uint};
use clap::Parser;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{TransactionReceipt, U256};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let config = match &cli.config {
        Some(path) => ClientConfig::from_path_with_env(path),
        None => ClientConfig::from_env(),
    }
    .context("Failed to load configuration")?;

    if is_write(&cli.command) {
        match cli.private_key_env.as_deref() {
            Some(var) => {
                let key = read_private_key(var)?;
                let client = ElectionClient::for_local_key(&config, &key).await?;
                run_write(&client, cli.command).await
            }
            None => {
                let mut session = WalletSession::from_config(&config)?;
                let account = session.connect().await?;
                let client = ElectionClient::for_wallet(&config, account)?;
                run_write(&client, cli.command).await
            }
        }
    } else {
        run_read(&config, cli.command).await
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn is_write(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Create { .. }
            | Commands::AddCandidate { .. }
            | Commands::Vote { .. }
            | Commands::Finalize { .. }
            | Commands::RegisterVoter { .. }
            | Commands::TransferAdmin { .. }
    )
}

/// Hex private key (with or without `0x`) from an environment variable.
fn read_private_key(var: &str) -> Result<Zeroizing<Vec<u8>>> {
    let raw = Zeroizing::new(
        std::env::var(var).with_context(|| format!("environment variable {var} is not set"))?,
    );
    let hex_str = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(hex_str).map_err(|_| anyhow!("{var} does not hold a hex private key"))?;
    Ok(Zeroizing::new(bytes))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_receipt(receipt: &TransactionReceipt) -> Result<()> {
    print_json(&json!({
        "transactionHash": receipt.transaction_hash,
        "blockNumber": receipt.block_number,
        "status": receipt.status,
    }))
}

async fn run_write<S>(client: &ElectionClient<S>, command: Commands) -> Result<()>
where
    S: Middleware + 'static,
{
    info!(sender = ?client.sender(), "Submitting transaction");
    match command {
        Commands::Create { draft } => {
            let draft = ElectionDraft::load(&draft)?;
            let published = publish(client, &draft, chrono::Utc::now()).await?;
            print_json(&published)
        }
        Commands::AddCandidate { election, name } => {
            let receipt = client.add_candidate(parse_uint(&election)?, &name).await?;
            print_receipt(&receipt)
        }
        Commands::Vote { election, candidate } => {
            let receipt = client.cast_vote(parse_uint(&election)?, parse_uint(&candidate)?).await?;
            print_receipt(&receipt)
        }
        Commands::Finalize { election } => {
            let receipt = client.finalize_election(parse_uint(&election)?).await?;
            print_receipt(&receipt)
        }
        Commands::RegisterVoter { voter } => {
            let receipt = client.register_voter(parse_address(&voter)?).await?;
            print_receipt(&receipt)
        }
        Commands::TransferAdmin { to } => {
            let receipt = client.transfer_admin(parse_address(&to)?).await?;
            print_receipt(&receipt)
        }
        other => bail!("{other:?} does not submit a transaction"),
    }
}

async fn run_read(config: &ClientConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Connect => {
            let mut session = WalletSession::from_config(config)?;
            let account = session.connect().await?;
            print_json(&json!({
                "account": account,
                "network": session.network().chain_name,
                "state": session.state(),
            }))
        }
        Commands::Account => {
            let session = WalletSession::from_config(config)?;
            print_json(&json!({ "account": session.current_account().await }))
        }
        Commands::Info => print_json(&json!({
            "network": config.network,
            "contract": config.contract.address,
            "contractExplorer": config.contract.explorer_url(&config.network),
            "walletUrl": config.wallet_url,
        })),
        command => {
            let client = ElectionClient::read_only(config)?;
            run_query(&client, command).await
        }
    }
}

async fn run_query(client: &ElectionClient<Provider<Http>>, command: Commands) -> Result<()> {
    match command {
        Commands::Status { election } => {
            let id = parse_uint(&election)?;
            let status = client.election_status(id).await?;
            print_json(&json!({ "electionId": id, "status": status }))
        }
        Commands::Details { election } => {
            let id = parse_uint(&election)?;
            let details = client.election_details(id).await?;
            let candidates = client.candidate_count(id).await?;
            print_json(&json!({ "electionId": id, "details": details, "candidateCount": candidates }))
        }
        Commands::Tally { election } => {
            let tally = client.vote_tally(parse_uint(&election)?).await?;
            let tally: serde_json::Map<String, serde_json::Value> =
                tally.into_iter().map(|(id, n)| (id.to_string(), json!(n))).collect();
            print_json(&tally)
        }
        Commands::Results { election, range } => {
            let id = parse_uint(&election)?;
            let range = LogRange::from(range);
            let candidates = client.election_candidates(id, range).await?;
            let votes = client.election_votes(id, range).await?;
            print_json(&ElectionResults::build(&candidates, &votes))
        }
        Commands::Candidates { election, range } => {
            print_json(&client.election_candidates(parse_uint(&election)?, range.into()).await?)
        }
        Commands::Votes { election, range } => {
            print_json(&client.election_votes(parse_uint(&election)?, range.into()).await?)
        }
        Commands::ElectionsBy { creator, range } => {
            print_json(&client.elections_by_creator(parse_address(&creator)?, range.into()).await?)
        }
        Commands::Admin { account, election } => {
            let admin = client.admin().await?;
            let account = account.as_deref().map(parse_address).transpose()?;
            let election = election.as_deref().map(parse_uint).transpose()?;
            let is_admin = account.map(|a| a == admin);
            let is_creator = match (account, election) {
                (Some(a), Some(id)) => Some(client.is_creator(id, a).await?),
                _ => None,
            };
            print_json(&json!({ "admin": admin, "isAdmin": is_admin, "isCreator": is_creator }))
        }
        Commands::Watch { election } => {
            let election = election.as_deref().map(parse_uint).transpose()?;
            tokio::select! {
                res = watch(client, election) => res?,
                _ = tokio::signal::ctrl_c() => info!("Stopped watching"),
            }
            Ok(())
        }
        other => bail!("{other:?} is not a read command"),
    }
}

async fn watch(client: &ElectionClient<Provider<Http>>, election: Option<U256>) -> Result<()> {
    match election {
        Some(id) => {
            client
                .follow_votes(id, |vote| {
                    if let Err(e) = print_json(&vote) {
                        warn!(error = %e, "Failed to print vote");
                    }
                })
                .await?
        }
        None => {
            client
                .follow_events(|ev| {
                    let line = json!({
                        "event": ev.name(),
                        "fields": format!("{:?}", ev.event),
                        "blockNumber": ev.block_number,
                        "transactionHash": ev.transaction_hash,
                    });
                    if let Err(e) = print_json(&line) {
                        warn!(error = %e, "Failed to print event");
                    }
                })
                .await?
        }
    }
    Ok(())
}
