//! Lockbox CLI - Password-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-GCM with scrypt key derivation.

use clap::{Parser, Subcommand};
use std::error::Error as _;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lockbox::CryptoParams;
use lockbox::file_ops::{self, FileOptions};
use lockbox::passphrase::{
    ConstantPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true, conflicts_with = "passphrase")]
    passphrase_stdin: bool,

    /// Passphrase on the command line. Visible to other local users and
    /// kept in shell history; prefer the interactive prompt.
    #[arg(long, global = true, value_name = "PASSPHRASE")]
    passphrase: Option<String>,

    /// Log progress to stderr (RUST_LOG overrides the default filter otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the container to [default: <input>.lockbox]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write base64url text instead of raw bytes
        #[arg(long)]
        armor: bool,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the container to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the plaintext to [default: <input> without .lockbox]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Input is base64url text as written by `encrypt --armor`
        #[arg(long)]
        armor: bool,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Update an encrypted file with new content, while validating
    /// that the passphrase is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing container to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// The container is base64url text
        #[arg(long)]
        armor: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        let mut line = format!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            line.push_str(&format!(": {}", cause));
            source = cause.source();
        }
        eprintln!("{}", line);
        process::exit(1);
    }
}

fn run(cli: Cli) -> lockbox::Result<()> {
    let params = CryptoParams::default();

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            armor,
            force,
        } => {
            let output = output.unwrap_or_else(|| file_ops::default_encrypt_output(&input));
            let mut reader = passphrase_reader(cli.passphrase_stdin, cli.passphrase, true);
            let opts = FileOptions {
                params,
                armor,
                force,
            };
            file_ops::encrypt_file(&input, &output, &mut *reader, &opts)
        }
        Commands::Decrypt {
            input,
            output,
            armor,
            force,
        } => {
            let output = match output {
                Some(path) => path,
                None => file_ops::default_decrypt_output(&input)?,
            };
            let mut reader = passphrase_reader(cli.passphrase_stdin, cli.passphrase, false);
            let opts = FileOptions {
                params,
                armor,
                force,
            };
            file_ops::decrypt_file(&input, &output, &mut *reader, &opts)
        }
        Commands::Update {
            input,
            output,
            armor,
        } => {
            let mut reader = passphrase_reader(cli.passphrase_stdin, cli.passphrase, false);
            let opts = FileOptions {
                params,
                armor,
                force: true,
            };
            file_ops::update_file(&input, &output, &mut *reader, &opts)
        }
    }
}

fn passphrase_reader(
    use_stdin: bool,
    inline: Option<String>,
    confirm: bool,
) -> Box<dyn PassphraseReader> {
    if let Some(passphrase) = inline {
        tracing::warn!("passphrase given on the command line; prefer the interactive prompt");
        Box::new(ConstantPassphraseReader::new(passphrase.into_bytes()))
    } else if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else if confirm {
        Box::new(TerminalPassphraseReader::confirming())
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("lockbox=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}
