//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use crate::config::{DEFAULT_REMOTE_SHELL, DEFAULT_STORAGE_TOOL, ProviderConfig};
use crate::session::{CommandOutput, CommandRunner, GatewayError, SESSION_MARKER};

/// Header printed by `pvesm list`.
pub const LISTING_HEADER: &str = "Volid                      Format  Type             Size VMID";

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Returns the final argument, which carries the remote command for SSH
    /// invocations.
    #[must_use]
    pub fn remote_command(&self) -> Option<String> {
        self.args
            .last()
            .map(|arg| arg.to_string_lossy().into_owned())
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status with empty script output.
    pub fn push_success(&self) {
        self.push_remote(Some(0), "", "");
    }

    /// Pushes a successful exit status with script `stdout`.
    pub fn push_stdout(&self, stdout: impl Into<String>) {
        self.push_remote(Some(0), stdout, "");
    }

    /// Pushes a failing exit code with script output, as a remote script that
    /// merges its stderr would produce.
    pub fn push_failure(&self, code: i32, stdout: impl Into<String>) {
        self.push_remote(Some(code), stdout, "");
    }

    /// Pushes a response with no exit code to simulate abnormal termination
    /// after the script started.
    pub fn push_missing_exit_code(&self) {
        self.push_remote(None, "", "");
    }

    /// Pushes the response of an SSH client that never reached the node.
    pub fn push_unreachable(&self, stderr: impl Into<String>) {
        self.push_output(Some(255), "", stderr);
    }

    /// Pushes a response from a session that reached the node: the session
    /// marker line precedes the script's `stdout`.
    pub fn push_remote(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.push_output(code, format!("{SESSION_MARKER}\n{}", stdout.into()), stderr);
    }

    /// Pushes an explicit command output response, verbatim.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, GatewayError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| GatewayError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Provider configuration with deterministic values for tests.
#[must_use]
pub fn provider_config() -> ProviderConfig {
    ProviderConfig {
        ssh_bin: String::from("ssh"),
        ssh_user: String::from("root"),
        ssh_port: 22,
        ssh_host_template: String::from("{node}.pve.test"),
        ssh_batch_mode: true,
        ssh_strict_host_key_checking: false,
        ssh_known_hosts_file: None,
        ssh_identity_file: None,
        remote_shell: String::from(DEFAULT_REMOTE_SHELL),
        storage_tool: String::from(DEFAULT_STORAGE_TOOL),
    }
}

/// Renders `pvesm list` output for `(storage, volume, format, size_bytes)`
/// rows owned by `owner_id`.
#[must_use]
pub fn pvesm_listing(owner_id: u32, rows: &[(&str, &str, &str, u64)]) -> String {
    let mut output = String::from(LISTING_HEADER);
    output.push('\n');
    for (storage, volume, format, size) in rows {
        output.push_str(&format!(
            "{:<26} {format:<7} {:<8} {size:>12} {owner_id}\n",
            format!("{storage}:{volume}"),
            "images",
        ));
    }
    output
}
