//! Shared fixtures and helpers for persistent disk BDD scenarios.

use pvedisk::test_support::{ScriptedRunner, provider_config};
use pvedisk::{DiskSize, DiskState, PersistentDisk, Resource, SshGateway, VolumeSpec};
use rstest::fixture;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Create,
    Read,
    Delete,
}

#[derive(Clone, Debug)]
pub enum DiskOutcome {
    Success,
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct DiskContext {
    pub runner: ScriptedRunner,
    pub state: Option<DiskState>,
    pub outcome: Option<DiskOutcome>,
}

#[fixture]
pub fn disk_context() -> DiskContext {
    DiskContext {
        runner: ScriptedRunner::new(),
        state: None,
        outcome: None,
    }
}

pub fn build_spec(size: &str, name: &str, owner_id: u32, pool: &str, node: &str) -> VolumeSpec {
    let size: DiskSize = size
        .parse()
        .unwrap_or_else(|err| panic!("disk size should parse: {err}"));
    VolumeSpec::builder()
        .node(node)
        .storage_pool(pool)
        .owner_id(owner_id)
        .name(name)
        .size(size)
        .build()
        .unwrap_or_else(|err| panic!("volume spec should be valid: {err}"))
}

impl DiskContext {
    pub fn state(&self) -> &DiskState {
        self.state
            .as_ref()
            .unwrap_or_else(|| panic!("test setup requires a configured disk"))
    }

    pub fn run(mut self, operation: Operation) -> Self {
        let gateway = SshGateway::new(provider_config(), self.runner.clone())
            .unwrap_or_else(|err| panic!("gateway config should be valid: {err}"));
        let disk = PersistentDisk::default();
        let mut state = self.state().clone();
        let result = match operation {
            Operation::Create => disk.create(&gateway, &mut state),
            Operation::Read => disk.read(&gateway, &mut state),
            Operation::Delete => disk.delete(&gateway, &mut state),
        };
        assert_eq!(gateway.open_sessions(), 0, "sessions must be released");
        self.outcome = Some(match result {
            Ok(()) => DiskOutcome::Success,
            Err(err) => DiskOutcome::Failure(err.to_string()),
        });
        self.state = Some(state);
        self
    }
}
