//! Chameleon command-line binary.
//!
//! # Usage
//!
//! ```bash
//! export CHAMELEON_MNEMONIC="abandon abandon ... about"
//!
//! # Encrypt (message from argument or stdin)
//! chameleon encrypt "meet at noon" --index 0
//!
//! # Decrypt within the next two minutes
//! chameleon decrypt "😀一∑..."
//!
//! # Inspect the clock and the rollback marker
//! chameleon slot
//!
//! # Clear the marker after a detected rollback
//! chameleon unlock
//! ```

use std::{
    error::Error,
    io::{self, Read, Write},
    path::PathBuf,
};

use chameleon_core::{
    Chameleon, ChameleonConfig, Environment, LockStore, RedbLockStore, SlotClock, SlotSource,
    SystemEnv,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Hide short messages in streams of time-limited symbols
#[derive(Parser, Debug)]
#[command(name = "chameleon")]
#[command(about = "Time-slot ratcheted symbol encryption")]
#[command(version)]
struct Args {
    /// Path to the state file holding the rollback marker
    #[arg(long, env = "CHAMELEON_STATE", default_value = "chameleon.redb")]
    state: PathBuf,

    /// Device profile inside the state file
    #[arg(long, env = "CHAMELEON_DEVICE", default_value = "default")]
    device: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a message under the current slot
    Encrypt {
        #[command(flatten)]
        credentials: Credentials,

        /// Message index within the slot (the recipient searches 0..=10)
        #[arg(short, long, default_value_t = 0)]
        index: u64,

        /// Plaintext; read from stdin when omitted
        message: Option<String>,
    },

    /// Decrypt symbol text from the current or previous slot
    Decrypt {
        #[command(flatten)]
        credentials: Credentials,

        /// Symbol text; read from stdin when omitted
        text: Option<String>,
    },

    /// Show the current slot and lock state
    Slot,

    /// Clear a rollback marker for this device
    Unlock,
}

#[derive(ClapArgs, Debug)]
struct Credentials {
    /// Mnemonic phrase shared by both parties
    #[arg(long, env = "CHAMELEON_MNEMONIC", hide_env_values = true)]
    mnemonic: String,

    /// Optional passphrase
    #[arg(long, env = "CHAMELEON_PASSPHRASE", hide_env_values = true, default_value = "")]
    passphrase: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let store = RedbLockStore::open(&args.state, &args.device)?;
    let config = ChameleonConfig::default();
    let mut out = io::stdout().lock();

    match args.command {
        Command::Encrypt { credentials, index, message } => {
            let message = message.map_or_else(read_stdin, Ok)?;
            let chameleon = open_session(store, config, &credentials)?;

            let sealed = chameleon.encrypt_with_info(&message, index)?;
            tracing::info!(slot = sealed.slot, msg_index = sealed.msg_index, "Encrypted");

            writeln!(out, "{}", sealed.text)?;
        },
        Command::Decrypt { credentials, text } => {
            let text = text.map_or_else(read_stdin, Ok)?;
            let chameleon = open_session(store, config, &credentials)?;

            let opened = chameleon.decrypt_with_info(&text)?;
            tracing::info!(slot = opened.slot, msg_index = opened.msg_index, "Decrypted");

            writeln!(out, "{}", String::from_utf8_lossy(&opened.plaintext))?;
        },
        Command::Slot => {
            if let Some(lock) = store.load_lock()? {
                writeln!(
                    out,
                    "locked: rollback from slot {} to slot {} (run `chameleon unlock`)",
                    lock.highest_slot, lock.observed_slot
                )?;
                return Ok(());
            }

            let clock = SlotClock::new(SystemEnv::new(), store, config.slot_duration_ms)?;
            let slot = clock.current_slot()?;
            let now = clock.env().unix_millis();

            writeln!(out, "slot: {slot}")?;
            writeln!(out, "slot started: {} ms", config.slot_start_millis(slot))?;
            writeln!(
                out,
                "messages sealed now expire in: {} s",
                config.remaining_millis(slot, now) / 1_000
            )?;
        },
        Command::Unlock => {
            match store.load_lock()? {
                Some(lock) => {
                    store.clear_lock()?;
                    tracing::warn!(
                        highest_slot = lock.highest_slot,
                        observed_slot = lock.observed_slot,
                        "Rollback lock cleared"
                    );
                    writeln!(out, "unlocked device {}", store.device_id())?;
                },
                None => writeln!(out, "device {} is not locked", store.device_id())?,
            }
        },
    }

    Ok(())
}

fn open_session(
    store: RedbLockStore,
    config: ChameleonConfig,
    credentials: &Credentials,
) -> Result<Chameleon<SystemEnv, RedbLockStore>, Box<dyn Error>> {
    let chameleon = Chameleon::new(SystemEnv::new(), store, config)?;
    chameleon.init(&credentials.mnemonic, &credentials.passphrase)?;
    Ok(chameleon)
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
