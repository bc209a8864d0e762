//! Fail-fast shell scripts assembled from typed parameters.
//!
//! Every script starts with a strict-mode prologue, assigns each parameter to
//! a shell variable using POSIX quoting, and ends with a single invocation that
//! refers back to those variables. Statements are chained with `&&` so the
//! first failing statement aborts the remainder.

use std::borrow::Cow;
use std::fmt::Display;

use shell_escape::unix::escape;

/// Strict-mode prologue placed at the start of every script.
pub const STRICT_MODE: &str = "set -e";

const STATEMENT_SEPARATOR: &str = " && \\\n";

/// Ordered sequence of shell statements built fresh for each operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandScript {
    statements: Vec<String>,
}

impl CommandScript {
    /// Starts a script with the strict-mode prologue already in place.
    #[must_use]
    pub fn builder() -> CommandScriptBuilder {
        CommandScriptBuilder::new()
    }

    /// Returns the statements in execution order.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Joins the statements into a single conjunction-chained script.
    #[must_use]
    pub fn render(&self) -> String {
        self.statements.join(STATEMENT_SEPARATOR)
    }

    /// Wraps the rendered script for execution by `shell` on the remote host.
    ///
    /// The script is passed as one quoted argument to `<shell> -c`, and the
    /// shell's stderr is folded into stdout so callers observe the combined
    /// output in emission order.
    #[must_use]
    pub fn remote_command(&self, shell: &str) -> String {
        let script = self.render();
        format!(
            "{} -c {} 2>&1",
            escape(Cow::Borrowed(shell)),
            escape(Cow::Owned(script))
        )
    }
}

/// Builder collecting variable assignments ahead of the final invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandScriptBuilder {
    statements: Vec<String>,
}

impl Default for CommandScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandScriptBuilder {
    /// Creates a builder seeded with [`STRICT_MODE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            statements: vec![STRICT_MODE.to_owned()],
        }
    }

    /// Appends `name=<value>` with the value shell-escaped.
    ///
    /// `name` must be a valid shell identifier; it is emitted verbatim.
    #[must_use]
    pub fn assign(mut self, name: &str, value: impl Display) -> Self {
        let rendered = value.to_string();
        let quoted = escape(Cow::Owned(rendered));
        self.statements.push(format!("{name}={quoted}"));
        self
    }

    /// Appends the invocation statement and finishes the script.
    #[must_use]
    pub fn invoke(mut self, invocation: impl Into<String>) -> CommandScript {
        self.statements.push(invocation.into());
        CommandScript {
            statements: self.statements,
        }
    }
}

/// Renders a double-quoted reference to a script variable (`"${name}"`).
#[must_use]
pub fn var(name: &str) -> String {
    format!("\"${{{name}}}\"")
}
