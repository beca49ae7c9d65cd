use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::consts::{
    DEFAULT_BIN, DEFAULT_TIMEOUT_SECS, KEY_DATABASE_URL, KEY_KEYFILE, KEY_PASSWORD,
    KEY_S3_ACCESS_KEY, KEY_S3_SECRET_KEY, VERSION,
};
use crate::provider::{KeyBinary, ProviderEnv};
use crate::subcmds::*;
use crate::util;

#[derive(Parser)]
#[command(
    name = "keyview",
    version = VERSION,
    about = "Browse, search and copy secrets from the `key` password manager"
)]
struct Keyview {
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(subcommand)]
    command: Option<Cmd>,
}

/// How to reach the `key` binary and what to hand it. Every value can also
/// come from the environment.
// no Debug: this holds the database password
#[derive(Args)]
struct ProviderArgs {
    /// The `key` executable to run
    #[arg(long, env = "KEY_BIN", default_value = DEFAULT_BIN, global = true)]
    bin: String,
    /// Database location (file:// or s3://)
    #[arg(long, env = KEY_DATABASE_URL, hide_env_values = true, global = true)]
    database_url: Option<String>,
    /// Path to the key file
    #[arg(long, env = KEY_KEYFILE, hide_env_values = true, global = true)]
    keyfile: Option<String>,
    /// Database password; the browser asks for it when unset
    #[arg(long, env = KEY_PASSWORD, hide_env_values = true, global = true)]
    password: Option<String>,
    #[arg(long, env = KEY_S3_ACCESS_KEY, hide_env_values = true, global = true)]
    s3_access_key: Option<String>,
    #[arg(long, env = KEY_S3_SECRET_KEY, hide_env_values = true, global = true)]
    s3_secret_key: Option<String>,
    /// Seconds to wait for each `key` invocation
    #[arg(long, env = "KEY_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,
}

impl ProviderArgs {
    fn provider(self) -> KeyBinary {
        let env = ProviderEnv {
            database_url: self.database_url,
            keyfile: self.keyfile,
            password: self.password,
            s3_access_key: self.s3_access_key,
            s3_secret_key: self.s3_secret_key,
        };

        KeyBinary::new(self.bin, env).with_timeout(Duration::from_secs(self.timeout))
    }
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Browse the vault interactively (the default)
    Browse,
    /// Print the vault as a tree
    Ls {
        /// Only show top-level items whose title matches
        #[arg(long, short)]
        filter: Option<String>,
        /// Match the filter as plain text instead of a regular expression
        #[arg(long, short)]
        literal: bool,
    },
    /// List entries whose title matches pattern
    Find {
        pattern: String,
        #[arg(long, short)]
        literal: bool,
    },
    /// Show an entry's password and optionally put it on the clipboard
    /// If put on the clipboard, the password will be cleared in 45 seconds
    Show {
        #[arg(long, short)]
        clip: bool,
        /// Entry uuid or exact title
        name: String,
    },
    /// Show an entry's current one-time password
    Otp {
        #[arg(long, short)]
        clip: bool,
        /// Entry uuid or exact title
        name: String,
    },
    /// Answer a Flow Launcher JSON-RPC request
    Flow { request: String },
    #[command(hide = true)]
    Unclip {
        timeout: u64,
        #[arg(long, short)]
        force: bool,
    },
}

pub fn opt() -> Result<()> {
    let matches = Keyview::parse();
    let command = matches.command.unwrap_or(Cmd::Browse);

    // log lines would tear the alternate screen
    util::init_logging(match command {
        Cmd::Browse => "off",
        _ => "warn",
    });

    if let Cmd::Unclip { timeout, force } = command {
        return unclip::unclip(timeout, force);
    }

    let provider = matches.provider.provider();
    match command {
        Cmd::Browse => browse::browse(Arc::new(provider)),
        Cmd::Ls { filter, literal } => ls::ls(&provider, filter, literal),
        Cmd::Find { pattern, literal } => find::find(&provider, pattern, literal),
        Cmd::Show { clip, name } => show::show(&provider, name, clip),
        Cmd::Otp { clip, name } => otp::otp(&provider, name, clip),
        Cmd::Flow { request } => flow::flow(&provider, request),
        Cmd::Unclip { .. } => Ok(()),
    }
}
