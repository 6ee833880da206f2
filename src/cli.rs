use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::blockchain::events::LogRange;

/// Election contract client (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "ballot", about = "Wallet client for the election voting contract", version)]
pub struct Cli {
    /// Config file (defaults to $BALLOT_CONFIG, then ./ballot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sign with the hex private key held in this environment variable
    /// instead of the wallet endpoint
    #[arg(long, global = true, value_name = "VAR")]
    pub private_key_env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Block range for event queries.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct RangeArgs {
    #[arg(long)]
    pub from_block: Option<u64>,
    #[arg(long)]
    pub to_block: Option<u64>,
}

impl From<RangeArgs> for LogRange {
    fn from(args: RangeArgs) -> Self {
        LogRange::new(args.from_block, args.to_block)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Connect the wallet, switching or adding the network if needed
    Connect,
    /// Show the wallet's already-authorized account, without prompting
    Account,
    /// Publish an election from a TOML draft file
    Create {
        #[arg(long)]
        draft: PathBuf,
    },
    AddCandidate {
        #[arg(long)]
        election: String,
        #[arg(long)]
        name: String,
    },
    Vote {
        #[arg(long)]
        election: String,
        #[arg(long)]
        candidate: String,
    },
    Finalize {
        #[arg(long)]
        election: String,
    },
    /// Admin only
    RegisterVoter {
        #[arg(long)]
        voter: String,
    },
    /// Admin only
    TransferAdmin {
        #[arg(long)]
        to: String,
    },
    Status {
        #[arg(long)]
        election: String,
    },
    Details {
        #[arg(long)]
        election: String,
    },
    /// Votes per candidate id, replayed from VoteCast events
    Tally {
        #[arg(long)]
        election: String,
    },
    /// Per-position results with percentages and winners
    Results {
        #[arg(long)]
        election: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    Candidates {
        #[arg(long)]
        election: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    Votes {
        #[arg(long)]
        election: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Elections created by an address
    ElectionsBy {
        #[arg(long)]
        creator: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Contract admin, and whether an account is admin or creator of an election
    Admin {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        election: Option<String>,
    },
    /// Network, contract and explorer links
    Info,
    /// Print events as they are emitted, until interrupted. With `--election`,
    /// only that election's votes
    Watch {
        #[arg(long)]
        election: Option<String>,
    },
}
