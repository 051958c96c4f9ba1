//! solvault CLI: `solvault` command.
//!
//! Hosts the solvault backend over a file-backed store: keypair custody,
//! message signing and verification, and challenge-response login.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use serde::Serialize;

use solvault::backend::{
    ChallengeRequest, GenerateKeypairRequest, ImportKeypairRequest, SignMessageRequest,
    VerifyMessageRequest, WriteConfigRequest,
};
use solvault::crypto::random::random_salt_16;
use solvault::crypto::seal::SealKey;
use solvault::crypto::signing::{sign_message, signature_to_base58};
use solvault::time::secs_to_rfc3339;
use solvault::{
    Backend, FileStorage, LoginRequest, OsRandom, SealedStorage, SigningMode, Storage, VaultError,
    WalletKeypair,
};

/// Environment variable that enables sealing of wallet and config records.
const PASSPHRASE_ENV: &str = "SOLVAULT_PASSPHRASE";

/// Salt file for the sealing key, relative to the data directory.
const SALT_FILE: &str = "seal.salt";

static SALT_TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --dir")?;
    Ok(PathBuf::from(home).join(".solvault"))
}

/// Read the sealing salt, creating it on first use.
///
/// The salt is written in full to a private temporary file and then
/// hard-linked into place, so a concurrent reader never sees a partial
/// salt file and only the first of several racing creators wins.
fn load_or_create_salt(dir: &Path) -> Result<[u8; 16]> {
    let path = dir.join(SALT_FILE);
    if !path.exists() {
        let salt = random_salt_16(&OsRandom)?;
        let n = SALT_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!("{SALT_FILE}.{}.{n}.tmp", std::process::id()));
        std::fs::write(&tmp, STANDARD.encode(salt))
            .with_context(|| format!("writing {}", tmp.display()))?;
        let linked = std::fs::hard_link(&tmp, &path);
        std::fs::remove_file(&tmp).with_context(|| format!("removing {}", tmp.display()))?;
        match linked {
            Ok(()) => log::info!("created sealing salt at {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
        }
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let bytes = STANDARD
        .decode(text.trim())
        .with_context(|| format!("decoding {}", path.display()))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("{} must hold 16 bytes", path.display()))
}

fn open_backend(dir: Option<PathBuf>) -> Result<Backend> {
    let dir = match dir {
        Some(dir) => dir,
        None => default_dir()?,
    };
    let files = FileStorage::new(&dir)
        .with_context(|| format!("opening data directory {}", dir.display()))?;

    let storage: Arc<dyn Storage> = match std::env::var(PASSPHRASE_ENV) {
        Ok(passphrase) if !passphrase.is_empty() => {
            let salt = load_or_create_salt(&dir)?;
            let key = SealKey::derive(passphrase.as_bytes(), &salt)?;
            log::debug!("sealing wallet and config records in {}", dir.display());
            Arc::new(SealedStorage::new(files, key, Arc::new(OsRandom)))
        }
        _ => Arc::new(files),
    };
    Ok(Backend::new(storage))
}

/// Accept message text as-is, or already base64-encoded.
fn message_b64(message: &str, is_base64: bool) -> String {
    if is_base64 {
        message.to_string()
    } else {
        STANDARD.encode(message)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// solvault: custodial Solana keypairs, message signing, and
/// challenge-response login.
#[derive(Parser, Debug)]
#[command(name = "solvault", about = "solvault CLI", version)]
struct Cli {
    /// Data directory (default: ~/.solvault)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage custodied wallets
    Wallet {
        #[command(subcommand)]
        subcommand: WalletCommands,
    },

    /// Challenge-response login
    Auth {
        #[command(subcommand)]
        subcommand: AuthCommands,
    },

    /// Sign a message locally with a private key that is not in custody
    SignOffline {
        /// Base-58 private key
        #[arg(long)]
        private_key: String,

        /// Message to sign
        #[arg(long)]
        message: String,

        /// Treat --message as base64
        #[arg(long)]
        base64: bool,

        /// raw or offchain
        #[arg(long, default_value = "offchain")]
        mode: SigningMode,
    },
}

#[derive(Subcommand, Debug)]
enum WalletCommands {
    /// Generate a new keypair
    Create { id: String },

    /// Import an existing base-58 private key
    Import {
        id: String,
        #[arg(long)]
        private_key: String,
    },

    /// Show a wallet (private key included unless --public-only)
    Show {
        id: String,
        #[arg(long)]
        public_only: bool,
    },

    /// Delete a wallet
    Delete { id: String },

    /// List wallet identifiers
    List,

    /// Sign a message with a custodied wallet
    Sign {
        id: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        base64: bool,
        #[arg(long, default_value = "offchain")]
        mode: SigningMode,
    },

    /// Verify a signature against a custodied wallet
    Verify {
        id: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        base64: bool,
        #[arg(long, default_value = "offchain")]
        mode: SigningMode,
        #[arg(long)]
        signature: String,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommands {
    /// Issue a challenge nonce for a public key
    Nonce { public_key: String },

    /// Present a signed nonce
    Login {
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        nonce: String,
        #[arg(long)]
        signature: String,
    },

    /// Show the auth configuration
    ShowConfig,

    /// Replace the auth configuration
    SetConfig {
        /// Policy to bind to logins (repeatable)
        #[arg(long = "policy")]
        policies: Vec<String>,

        /// Default token TTL in seconds
        #[arg(long)]
        ttl: Option<u64>,

        /// Maximum token TTL in seconds
        #[arg(long)]
        max_ttl: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        let client_error = err
            .downcast_ref::<VaultError>()
            .map_or(false, VaultError::is_client_error);
        std::process::exit(if client_error { 1 } else { 2 });
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::SignOffline {
            private_key,
            message,
            base64,
            mode,
        } => cmd_sign_offline(&private_key, &message, base64, mode),
        Commands::Wallet { subcommand } => {
            let backend = open_backend(cli.dir)?;
            cmd_wallet(&backend, subcommand)
        }
        Commands::Auth { subcommand } => {
            let backend = open_backend(cli.dir)?;
            cmd_auth(&backend, subcommand)
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

fn cmd_wallet(backend: &Backend, command: WalletCommands) -> Result<()> {
    match command {
        WalletCommands::Create { id } => {
            print_json(&backend.generate_keypair(&GenerateKeypairRequest { id })?)
        }
        WalletCommands::Import { id, private_key } => {
            print_json(&backend.import_keypair(&ImportKeypairRequest { id, private_key })?)
        }
        WalletCommands::Show { id, public_only } => {
            if public_only {
                print_json(&backend.read_public_key(&id)?)
            } else {
                print_json(&backend.read_keypair(&id)?)
            }
        }
        WalletCommands::Delete { id } => {
            backend.delete_keypair(&id)?;
            eprintln!("Deleted wallet {id}");
            Ok(())
        }
        WalletCommands::List => print_json(&backend.list_keypairs()?),
        WalletCommands::Sign {
            id,
            message,
            base64,
            mode,
        } => print_json(&backend.sign_message(&SignMessageRequest {
            id,
            message: message_b64(&message, base64),
            mode,
        })?),
        WalletCommands::Verify {
            id,
            message,
            base64,
            mode,
            signature,
        } => print_json(&backend.verify_message(&VerifyMessageRequest {
            id,
            message: message_b64(&message, base64),
            mode,
            signature,
        })?),
    }
}

#[derive(Serialize)]
struct NonceOutput {
    nonce: String,
    expires_at: i64,
    expires: String,
}

fn cmd_auth(backend: &Backend, command: AuthCommands) -> Result<()> {
    match command {
        AuthCommands::Nonce { public_key } => {
            let challenge = backend.issue_challenge(&ChallengeRequest { public_key })?;
            print_json(&NonceOutput {
                expires: secs_to_rfc3339(challenge.expires_at),
                nonce: challenge.nonce,
                expires_at: challenge.expires_at,
            })
        }
        AuthCommands::Login {
            public_key,
            nonce,
            signature,
        } => print_json(&backend.authenticate(&LoginRequest {
            public_key,
            nonce,
            signature,
        })?),
        AuthCommands::ShowConfig => print_json(&backend.read_config()?),
        AuthCommands::SetConfig {
            policies,
            ttl,
            max_ttl,
        } => print_json(&backend.write_config(&WriteConfigRequest {
            token_policies: policies,
            token_ttl: ttl,
            token_max_ttl: max_ttl,
        })?),
    }
}

#[derive(Serialize)]
struct OfflineSignature {
    public_key: String,
    signature: String,
}

fn cmd_sign_offline(private_key: &str, message: &str, is_base64: bool, mode: SigningMode) -> Result<()> {
    let keypair = WalletKeypair::from_base58(private_key)?;
    let bytes = if is_base64 {
        STANDARD.decode(message).context("--message is not valid base64")?
    } else {
        message.as_bytes().to_vec()
    };
    let signature = sign_message(&keypair, &bytes, mode)?;
    print_json(&OfflineSignature {
        public_key: keypair.public_key().to_base58(),
        signature: signature_to_base58(&signature),
    })
}
