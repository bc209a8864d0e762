//! Runs scripts through a session and classifies the outcome.

use thiserror::Error;
use tracing::debug;

use crate::script::CommandScript;
use crate::session::{GatewayError, Session};

/// Errors surfaced while executing a script.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ExecutionError {
    /// Raised when the session could not be opened or used.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// Raised when the script exits non-zero or is terminated. The output is
    /// the remote side's combined stdout and stderr, untouched.
    #[error("remote command on {node} exited with status {status_text}: {output}")]
    CommandFailure {
        /// Node the script ran on.
        node: String,
        /// Exit status as reported by the SSH client.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Combined output captured from the script.
        output: String,
    },
}

/// Executes `script` on `session`, returning the combined output on success.
///
/// # Errors
///
/// Returns [`ExecutionError::Gateway`] when the transport fails and
/// [`ExecutionError::CommandFailure`] when the script does not exit cleanly.
pub fn execute<S: Session + ?Sized>(
    session: &S,
    script: &CommandScript,
) -> Result<String, ExecutionError> {
    let output = session.execute(script)?;
    debug!(node = session.node(), status = %output.status_text(), "remote script finished");
    if output.is_success() {
        return Ok(output.combined());
    }

    Err(ExecutionError::CommandFailure {
        node: session.node().to_owned(),
        status: output.code,
        status_text: output.status_text(),
        output: output.combined(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionGateway, SshGateway};
    use crate::test_support::{ScriptedRunner, provider_config};

    fn script() -> CommandScript {
        CommandScript::builder().invoke("pvesm status")
    }

    #[test]
    fn success_returns_combined_output() {
        let runner = ScriptedRunner::new();
        runner.push_remote(Some(0), "out\n", "warning from ssh\n");
        let gateway = SshGateway::new(provider_config(), runner).expect("config");
        let session = gateway.open_session("pve1").expect("session");

        let output = execute(&session, &script()).expect("execute should succeed");
        assert_eq!(output, "out\nwarning from ssh\n");
    }

    #[test]
    fn failure_carries_raw_output_verbatim() {
        let runner = ScriptedRunner::new();
        runner.push_failure(1, "volume 'vm-100-a' already exists\n");
        let gateway = SshGateway::new(provider_config(), runner).expect("config");
        let session = gateway.open_session("pve1").expect("session");

        let err = execute(&session, &script()).expect_err("execute should fail");
        assert_eq!(
            err,
            ExecutionError::CommandFailure {
                node: String::from("pve1"),
                status: Some(1),
                status_text: String::from("1"),
                output: String::from("volume 'vm-100-a' already exists\n"),
            }
        );
    }

    #[test]
    fn missing_exit_status_is_a_failure() {
        let runner = ScriptedRunner::new();
        runner.push_missing_exit_code();
        let gateway = SshGateway::new(provider_config(), runner).expect("config");
        let session = gateway.open_session("pve1").expect("session");

        let err = execute(&session, &script()).expect_err("execute should fail");
        assert!(
            matches!(err, ExecutionError::CommandFailure { status: None, ref status_text, .. } if status_text == "unknown"),
            "{err:?}"
        );
    }

    #[test]
    fn transport_errors_pass_through() {
        let gateway = SshGateway::new(provider_config(), ScriptedRunner::new()).expect("config");
        let session = gateway.open_session("pve1").expect("session");

        let err = execute(&session, &script()).expect_err("execute should fail");
        assert!(matches!(err, ExecutionError::Gateway(GatewayError::Spawn { .. })), "{err:?}");
    }
}
