use clap::{Args, Parser, Subcommand, ValueEnum};

use bitoku_client::RequestType;

#[derive(Parser, Debug, Clone)]
#[command(name = "bitoku", version, about = "Bitoku storage program CLI")]
pub struct Cli {
    /// Emit JSON output on stdout (and JSON logs on stderr).
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON config file; individual flags override its values.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// RPC endpoint.
    #[arg(long, global = true, env = "BITOKU_RPC_URL")]
    pub url: Option<String>,

    /// Keypair file of the caller (default: ~/.config/solana/id.json).
    #[arg(long, global = true, env = "BITOKU_KEYPAIR")]
    pub keypair: Option<String>,

    /// Bitoku program id (base58).
    #[arg(long, global = true, env = "BITOKU_PROGRAM_ID")]
    pub program_id: Option<String>,

    /// processed | confirmed | finalized
    #[arg(long, global = true)]
    pub commitment: Option<String>,

    #[arg(long, global = true)]
    pub compute_unit_limit: Option<u32>,

    /// Confirmation timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(flatten)]
    Op(Operation),

    /// Print the instruction payload and account list without sending.
    Encode {
        /// Caller address (default: the keypair's address).
        #[arg(long)]
        caller: Option<String>,

        #[command(subcommand)]
        op: Operation,
    },

    /// Print the bookkeeper and request account addresses.
    Pda {
        /// Caller address (default: the keypair's address).
        #[arg(long)]
        caller: Option<String>,
    },

    /// Show the bookkeeper state and a caller's request record.
    Inspect {
        /// Request account owner (default: the keypair's address).
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum Operation {
    /// Create the global bookkeeper account (once per program).
    Init,

    /// Register the caller and create its request account.
    Register,

    /// Remove the caller's registration and close its request account.
    Remove {
        #[arg(long, default_value_t = 0)]
        client_id: u8,
    },

    /// Send a storage request.
    Request(RequestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    pub kind: RequestKind,

    /// Bucket/file name, at most 128 bytes.
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value_t = 0)]
    pub client_id: u8,

    #[arg(long, default_value_t = 0)]
    pub file_id: u8,

    #[arg(long, default_value_t = 0)]
    pub position: u64,

    /// Inline payload, at most 512 bytes.
    #[arg(long, conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Read the payload from a file, at most 512 bytes.
    #[arg(long)]
    pub data_file: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    CreateBucket,
    CreateFile,
    WriteFile,
    CloseFile,
    DeleteFile,
    SetPosition,
    OpenFile,
    ReadFile,
}

impl From<RequestKind> for RequestType {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::CreateBucket => RequestType::CreateBucket,
            RequestKind::CreateFile => RequestType::CreateFile,
            RequestKind::WriteFile => RequestType::WriteFile,
            RequestKind::CloseFile => RequestType::CloseFile,
            RequestKind::DeleteFile => RequestType::DeleteFile,
            RequestKind::SetPosition => RequestType::SetPosition,
            RequestKind::OpenFile => RequestType::OpenFile,
            RequestKind::ReadFile => RequestType::ReadFile,
        }
    }
}
