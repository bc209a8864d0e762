//! Remote session gateway backed by the system `ssh` client.
//!
//! A gateway opens a session for a named cluster node. Each session executes
//! one script per call through the configured [`CommandRunner`] and returns
//! the captured output. Sessions hold a [`SessionLease`] that is released when
//! the session is dropped, so every exit path of an operation gives the
//! session back, including early returns through `?`.

use std::ffi::OsString;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, ProviderConfig};
use crate::script::CommandScript;

mod types;

pub use types::{CommandOutput, CommandRunner, ProcessCommandRunner};

/// Line echoed on the node before each script runs. Its absence from stdout
/// means the session never reached the remote shell. Exit statuses cannot
/// tell the two apart: OpenSSH and `pvesm` both exit 255 on failure.
pub const SESSION_MARKER: &str = "__pvedisk_session_ready__";

/// Placeholder substituted with the node name in `ssh_host_template`.
pub const NODE_PLACEHOLDER: &str = "{node}";

/// Errors raised while opening or using a remote session.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GatewayError {
    /// Raised when a node name cannot be used to address a host.
    #[error("invalid node name '{node}': {reason}")]
    InvalidNode {
        /// Node name supplied by the caller.
        node: String,
        /// Why the name was rejected.
        reason: String,
    },
    /// Raised when the SSH client cannot be started.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the SSH client reports a connection-level failure.
    #[error("failed to reach {host}: {output}")]
    Connection {
        /// Host the client attempted to reach.
        host: String,
        /// Diagnostics emitted by the client.
        output: String,
    },
}

/// Opens command channels to named hosts.
pub trait SessionGateway {
    /// Session type yielded by this gateway.
    type Session<'a>: Session
    where
        Self: 'a;

    /// Opens a session for `node`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the node cannot be addressed.
    fn open_session(&self, node: &str) -> Result<Self::Session<'_>, GatewayError>;
}

/// A command channel able to execute scripts on one host.
pub trait Session {
    /// Node this session is connected to.
    fn node(&self) -> &str;

    /// Executes `script` and returns the captured output, whatever its exit
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the transport fails; a script that runs
    /// and exits non-zero is not a transport failure.
    fn execute(&self, script: &CommandScript) -> Result<CommandOutput, GatewayError>;
}

/// Counts sessions that are currently open.
#[derive(Clone, Debug, Default)]
pub struct SessionTracker {
    live: Arc<AtomicUsize>,
}

impl SessionTracker {
    /// Creates a tracker with no open sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session for `node` and returns its lease.
    #[must_use]
    pub fn acquire(&self, node: &str) -> SessionLease {
        let open = self.live.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        debug!(node, open, "session acquired");
        SessionLease {
            node: node.to_owned(),
            live: Arc::clone(&self.live),
        }
    }

    /// Number of leases not yet released.
    #[must_use]
    pub fn open(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Scoped registration of an open session; released on drop.
#[derive(Debug)]
pub struct SessionLease {
    node: String,
    live: Arc<AtomicUsize>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let open = self.live.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(node = %self.node, open, "session released");
    }
}

/// Gateway that reaches cluster nodes with the system `ssh` client.
#[derive(Clone, Debug)]
pub struct SshGateway<R: CommandRunner> {
    config: ProviderConfig,
    runner: R,
    sessions: SessionTracker,
}

impl SshGateway<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn with_process_runner(config: ProviderConfig) -> Result<Self, ConfigError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> SshGateway<R> {
    /// Creates a gateway using the provided runner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration validation fails.
    pub fn new(config: ProviderConfig, runner: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            runner,
            sessions: SessionTracker::new(),
        })
    }

    /// Returns a reference to the underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Number of sessions opened through this gateway and not yet dropped.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.sessions.open()
    }

    fn resolve_host(&self, node: &str) -> Result<String, GatewayError> {
        let invalid = |reason: &str| GatewayError::InvalidNode {
            node: node.to_owned(),
            reason: reason.to_owned(),
        };
        if node.trim().is_empty() {
            return Err(invalid("must not be empty"));
        }
        if node.starts_with('-') {
            return Err(invalid("must not start with '-'"));
        }
        if node
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(invalid("must not contain whitespace or control characters"));
        }
        Ok(self.config.ssh_host_template.replace(NODE_PLACEHOLDER, node))
    }

    fn build_ssh_args(&self, host: &str, remote_command: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-p"),
            OsString::from(self.config.ssh_port.to_string()),
        ];

        if let Some(ref identity_file) = self.config.ssh_identity_file {
            args.push(OsString::from("-i"));
            args.push(OsString::from(expand_tilde(identity_file)));
        }

        if self.config.ssh_batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        if !self.config.ssh_strict_host_key_checking {
            args.push(OsString::from("-o"));
            args.push(OsString::from("StrictHostKeyChecking=no"));
        }

        if let Some(ref known_hosts) = self.config.ssh_known_hosts_file {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!(
                "UserKnownHostsFile={}",
                expand_tilde(known_hosts)
            )));
        }

        args.push(OsString::from(format!("{}@{host}", self.config.ssh_user)));
        args.push(OsString::from(remote_command));
        args
    }
}

impl<R: CommandRunner> SessionGateway for SshGateway<R> {
    type Session<'a>
        = SshSession<'a, R>
    where
        Self: 'a;

    fn open_session(&self, node: &str) -> Result<SshSession<'_, R>, GatewayError> {
        let host = self.resolve_host(node)?;
        Ok(SshSession {
            gateway: self,
            node: node.to_owned(),
            host,
            _lease: self.sessions.acquire(node),
        })
    }
}

/// Session bound to one node through an [`SshGateway`].
#[derive(Debug)]
pub struct SshSession<'a, R: CommandRunner> {
    gateway: &'a SshGateway<R>,
    node: String,
    host: String,
    _lease: SessionLease,
}

impl<R: CommandRunner> SshSession<'_, R> {
    /// Host name the session connects to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl<R: CommandRunner> Session for SshSession<'_, R> {
    fn node(&self) -> &str {
        &self.node
    }

    fn execute(&self, script: &CommandScript) -> Result<CommandOutput, GatewayError> {
        let config = &self.gateway.config;
        let remote_command = format!(
            "echo {SESSION_MARKER} && {}",
            script.remote_command(&config.remote_shell)
        );
        debug!(node = %self.node, host = %self.host, script = %script.render(), "executing remote script");

        let args = self.gateway.build_ssh_args(&self.host, &remote_command);
        let output = self.gateway.runner.run(&config.ssh_bin, &args)?;
        let Some(script_stdout) = strip_marker(&output.stdout) else {
            return Err(GatewayError::Connection {
                host: self.host.clone(),
                output: output.combined(),
            });
        };
        Ok(CommandOutput {
            code: output.code,
            stdout: script_stdout.to_owned(),
            stderr: output.stderr,
        })
    }
}

/// Returns the stdout that follows the session marker line, if present.
///
/// The marker only counts when it fills a whole line, so banner text that
/// merely mentions it is not mistaken for the start of script output.
fn strip_marker(stdout: &str) -> Option<&str> {
    let mut rest = stdout;
    loop {
        let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        if line.trim_end() == SESSION_MARKER {
            return Some(tail);
        }
        if tail.is_empty() {
            return None;
        }
        rest = tail;
    }
}

/// Expands a leading `~/` prefix to the user's home directory.
///
/// The input is returned unchanged when `HOME` is unset.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}
