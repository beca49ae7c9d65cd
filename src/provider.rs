//! The external credential provider
//!
//! # provider
//!
//! keyview never touches the database itself. Everything goes through a
//! [`CredentialProvider`], which in production is [`KeyBinary`]: a thin
//! wrapper that runs the `key` executable, forwards the configured
//! environment and parses what it prints.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::consts::{
    DEFAULT_BIN, DEFAULT_TIMEOUT_SECS, KEY_DATABASE_URL, KEY_KEYFILE, KEY_PASSWORD,
    KEY_S3_ACCESS_KEY, KEY_S3_SECRET_KEY,
};
use crate::error::{Result, VaultError};
use crate::node::{self, Entry, Node};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The list/get/otp/unlock capability surface of a password manager.
///
/// Entries are addressed by uuid. Implementations must be shareable across
/// threads because the browser resolves detail fetches on worker threads.
pub trait CredentialProvider: Send + Sync {
    /// A fresh snapshot of the whole hierarchy.
    fn list(&self) -> Result<Vec<Node>>;

    /// The full entry, password included.
    fn get(&self, uuid: &str) -> Result<Entry>;

    /// The current one-time password of an entry with `has_otp` set.
    fn otp(&self, uuid: &str) -> Result<String>;

    /// Checks `password` against the database and, on success, uses it for
    /// every later call.
    fn unlock(&self, password: &str) -> Result<()>;
}

/// Credentials and locations handed to the provider through its
/// environment. None of these are ever logged.
#[derive(Clone, Default)]
pub struct ProviderEnv {
    pub database_url: Option<String>,
    pub keyfile: Option<String>,
    pub password: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
}

impl ProviderEnv {
    pub fn has_password(&self) -> bool {
        self.password.as_deref().map_or(false, |pw| !pw.is_empty())
    }

    /// Every forwarded variable paired with its value, `None` when unset.
    pub fn vars(&self) -> [(&'static str, Option<&str>); 5] {
        [
            (KEY_DATABASE_URL, self.database_url.as_deref()),
            (KEY_KEYFILE, self.keyfile.as_deref()),
            (KEY_PASSWORD, self.password.as_deref()),
            (KEY_S3_ACCESS_KEY, self.s3_access_key.as_deref()),
            (KEY_S3_SECRET_KEY, self.s3_secret_key.as_deref()),
        ]
    }
}

impl fmt::Debug for ProviderEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("ProviderEnv");
        for (name, value) in self.vars().iter() {
            s.field(name, &value.map(|_| "<set>"));
        }
        s.finish()
    }
}

/// Runs the `key` binary once per operation.
pub struct KeyBinary {
    bin: PathBuf,
    timeout: Duration,
    env: RwLock<ProviderEnv>,
    // uuid -> metadata from the last successful `list`
    index: RwLock<HashMap<String, Entry>>,
}

impl KeyBinary {
    pub fn new<P>(bin: P, env: ProviderEnv) -> Self
    where
        P: Into<PathBuf>,
    {
        KeyBinary {
            bin: bin.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: RwLock::new(env),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;

        self
    }

    pub fn has_password(&self) -> bool {
        self.env
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_password()
    }

    fn env(&self) -> ProviderEnv {
        self.env
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn command_line<S>(&self, args: &[S]) -> String
    where
        S: AsRef<OsStr>,
    {
        let mut line = self.bin.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.as_ref().to_string_lossy());
        }

        line
    }

    /// Runs the binary with `args` and returns its stdout. A non-zero exit
    /// becomes [`VaultError::Provider`] carrying stderr; a run that outlives
    /// the timeout is killed.
    fn run<S>(&self, args: &[S], env: &ProviderEnv) -> Result<Vec<u8>>
    where
        S: AsRef<OsStr>,
    {
        let command = self.command_line(args);
        let failed = |reason: String| VaultError::Provider {
            command: command.clone(),
            reason,
        };

        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (name, value) in env.vars().iter() {
            match value {
                Some(value) => cmd.env(name, value),
                None => cmd.env_remove(name),
            };
        }

        debug!(command = %command, "running provider");
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| failed(e.to_string()))?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(command = %command, "provider timed out");

                    return Err(VaultError::ProviderTimeout {
                        command: command.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(failed(e.to_string())),
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        debug!(
            command = %command,
            status = %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "provider finished"
        );

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let reason = match stderr.trim() {
                "" => format!("exited with {}", status),
                msg => msg.to_owned(),
            };

            return Err(failed(reason));
        }

        Ok(stdout)
    }

    fn list_with(&self, env: &ProviderEnv) -> Result<Vec<Node>> {
        let out = self.run(&["list", "--output", "json"], env)?;
        let nodes = node::decode_snapshot(&out)?;

        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        index.clear();
        for entry in node::entries(&nodes) {
            index.insert(entry.uuid.clone(), entry.clone());
        }
        debug!(nodes = nodes.len(), entries = index.len(), "indexed snapshot");

        Ok(nodes)
    }

    fn indexed(&self, uuid: &str) -> Option<Entry> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uuid)
            .cloned()
    }

    /// Metadata of entry `uuid`, listing the vault first when the index
    /// does not know it (a fresh process, or an entry added since).
    fn lookup(&self, uuid: &str, env: &ProviderEnv) -> Result<Entry> {
        if let Some(entry) = self.indexed(uuid) {
            return Ok(entry);
        }

        debug!(uuid, "not indexed, listing");
        self.list_with(env)?;
        self.indexed(uuid)
            .ok_or_else(|| VaultError::NoMatchesFound(uuid.to_owned()))
    }

    // the binary addresses entries by title
    fn title_of(entry: &Entry) -> Result<&str> {
        entry
            .title
            .as_deref()
            .ok_or_else(|| VaultError::Untitled(entry.uuid.clone()))
    }
}

impl Default for KeyBinary {
    fn default() -> Self {
        KeyBinary::new(DEFAULT_BIN, ProviderEnv::default())
    }
}

impl fmt::Debug for KeyBinary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyBinary")
            .field("bin", &self.bin)
            .field("timeout", &self.timeout)
            .field("env", &self.env())
            .finish()
    }
}

impl CredentialProvider for KeyBinary {
    fn list(&self) -> Result<Vec<Node>> {
        self.list_with(&self.env())
    }

    fn get(&self, uuid: &str) -> Result<Entry> {
        let env = self.env();
        let mut entry = self.lookup(uuid, &env)?;
        let out = self.run(&["get", Self::title_of(&entry)?], &env)?;
        entry.password = Some(first_line(&out));

        Ok(entry)
    }

    fn otp(&self, uuid: &str) -> Result<String> {
        let env = self.env();
        let entry = self.lookup(uuid, &env)?;
        if !entry.has_otp {
            return Err(VaultError::NoOtp(entry.display_title().to_owned()));
        }
        let out = self.run(&["otp", Self::title_of(&entry)?], &env)?;

        Ok(first_line(&out))
    }

    fn unlock(&self, password: &str) -> Result<()> {
        let mut env = self.env();
        env.password = Some(password.to_owned());

        match self.list_with(&env) {
            Ok(_) => {
                *self.env.write().unwrap_or_else(PoisonError::into_inner) = env;
                info!("database unlocked");

                Ok(())
            }
            Err(VaultError::Provider { reason, .. }) => Err(VaultError::UnlockFailure(reason)),
            Err(e) => Err(e),
        }
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }

        buf
    })
}

fn first_line(out: &[u8]) -> String {
    String::from_utf8_lossy(out)
        .lines()
        .next()
        .unwrap_or_default()
        .to_owned()
}
