//! Binary entry point for the `pvedisk` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use pvedisk::logging::{self, LoggingError};
use pvedisk::{
    ConfigError, DiskError, DiskSize, DiskState, PersistentDisk, ProviderConfig, Resource,
    SpecError, SshGateway, VolumeIdentity, VolumeSpec,
};

mod cli;

use cli::{Cli, DiskArgs, ReadCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Logging(#[from] LoggingError),
    #[error("invalid volume parameters: {0}")]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Disk(#[from] DiskError),
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// JSON document printed by `pvedisk read`.
#[derive(Debug, Serialize)]
struct DiskReport<'a> {
    id: Option<&'a str>,
    exists: bool,
    node: &'a str,
    storage: &'a str,
    vm_id: u32,
    name: &'a str,
    volume: String,
    size_gb: u64,
    format: &'a str,
}

impl<'a> DiskReport<'a> {
    fn from_state(state: &'a DiskState) -> Self {
        let spec = &state.spec;
        Self {
            id: state.identity.as_ref().map(VolumeIdentity::as_str),
            exists: state.is_present(),
            node: &spec.node,
            storage: &spec.storage_pool,
            vm_id: spec.owner_id,
            name: &spec.name,
            volume: spec.volume_name(),
            size_gb: spec.size.gigabytes(),
            format: &spec.format,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    logging::init()?;
    let config = ProviderConfig::load_without_cli_args()?;
    let disk = PersistentDisk::from_config(&config);
    let gateway = SshGateway::with_process_runner(config)?;

    match cli {
        Cli::Create(args) => {
            let mut state = DiskState::new(build_spec(&args)?);
            disk.create(&gateway, &mut state)?;
            write_identity(io::stdout(), &state)?;
        }
        Cli::Read(command) => {
            let mut state = recorded_state(&command)?;
            disk.read(&gateway, &mut state)?;
            write_report(io::stdout(), &state)?;
        }
        Cli::Delete(args) => {
            let mut state = recorded_state_for(build_spec(&args)?, None);
            disk.delete(&gateway, &mut state)?;
        }
    }
    Ok(())
}

fn build_spec(args: &DiskArgs) -> Result<VolumeSpec, SpecError> {
    let size: DiskSize = args.size.parse()?;
    VolumeSpec::builder()
        .node(args.node.as_str())
        .storage_pool(args.storage.as_str())
        .owner_id(args.vm_id)
        .name(args.name.as_str())
        .size(size)
        .format(args.format.as_str())
        .build()
}

fn recorded_state(command: &ReadCommand) -> Result<DiskState, SpecError> {
    let spec = build_spec(&command.disk)?;
    Ok(recorded_state_for(spec, command.id.as_deref()))
}

fn recorded_state_for(spec: VolumeSpec, id: Option<&str>) -> DiskState {
    let identity = id.map_or_else(
        || VolumeIdentity::compose(&spec),
        VolumeIdentity::from_recorded,
    );
    DiskState::new(spec).with_identity(identity)
}

fn write_identity(mut target: impl Write, state: &DiskState) -> Result<(), CliError> {
    if let Some(ref identity) = state.identity {
        writeln!(target, "{identity}")?;
    }
    Ok(())
}

fn write_report(mut target: impl Write, state: &DiskState) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut target, &DiskReport::from_state(state))?;
    writeln!(target)?;
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
