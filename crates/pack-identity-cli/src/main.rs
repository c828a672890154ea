// crates/pack-identity-cli/src/main.rs
// ============================================================================
// Module: Pack Identity CLI Entry Point
// Description: Command dispatcher for identifier, allocation, and pack checks.
// Purpose: Run the validation engine against exported packs from a shell.
// Dependencies: clap, pack-identity-engine, serde, serde_jcs, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `pack-identity` CLI classifies single identifiers, verifies declared
//! allocations against the pinned authority key, checks exported pack
//! snapshots, and validates config files. Structured results are written to
//! stdout as canonical JSON; errors go to stderr with a failure exit code.
//! Security posture: snapshot and config inputs are untrusted and read with
//! hard size limits.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use pack_identity_config::PackIdentityConfig;
use pack_identity_core::HashDigest;
use pack_identity_core::IdentifierInput;
use pack_identity_core::IdentifierStatus;
use pack_identity_core::MAX_SNAPSHOT_BYTES;
use pack_identity_core::NamespaceTier;
use pack_identity_core::PackAllocation;
use pack_identity_core::PackSnapshot;
use pack_identity_core::VerificationState;
use pack_identity_core::allocation_fingerprint;
use pack_identity_engine::PackValidation;
use pack_identity_engine::ValidationFacade;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pack-identity", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to pack-identity.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one identifier against an optional allocation.
    Classify(ClassifyCommand),
    /// Verify an allocation against the pinned authority key.
    Verify(VerifyCommand),
    /// Check every collection of an exported pack snapshot.
    Check(CheckCommand),
    /// Config utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Validate,
}

/// Optional allocation supplied alongside an identifier.
#[derive(Args, Debug, Default)]
struct OptionalAllocationArgs {
    /// Pack label the allocation is issued to.
    #[arg(long, value_name = "LABEL", requires_all = ["range_start", "range_end", "signature"])]
    label: Option<String>,
    /// First identifier of the allocation.
    #[arg(long, value_name = "ID", requires = "label", allow_hyphen_values = true)]
    range_start: Option<i64>,
    /// Last identifier of the allocation.
    #[arg(long, value_name = "ID", requires = "label", allow_hyphen_values = true)]
    range_end: Option<i64>,
    /// Base64-encoded allocation signature.
    #[arg(long, value_name = "BASE64", requires = "label")]
    signature: Option<String>,
}

/// Arguments for `classify`.
#[derive(Args, Debug)]
struct ClassifyCommand {
    /// Raw identifier text.
    #[arg(value_name = "ID", allow_hyphen_values = true)]
    id: String,
    /// Declared allocation, if any.
    #[command(flatten)]
    allocation: OptionalAllocationArgs,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Pack label the allocation is issued to.
    #[arg(long, value_name = "LABEL")]
    label: String,
    /// First identifier of the allocation.
    #[arg(long, value_name = "ID", allow_hyphen_values = true)]
    range_start: i64,
    /// Last identifier of the allocation.
    #[arg(long, value_name = "ID", allow_hyphen_values = true)]
    range_end: i64,
    /// Base64-encoded allocation signature.
    #[arg(long, value_name = "BASE64")]
    signature: String,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Pack snapshot JSON file.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

/// Output formats for structured CLI commands.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Canonical JSON output.
    Json,
    /// Human-readable text output.
    Text,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Result of `classify`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ClassifyOutput {
    /// Raw identifier text as given.
    input: String,
    /// Namespace tier, when the input is numeric.
    tier: Option<NamespaceTier>,
    /// Identifier status; `null` when the engine has no opinion.
    status: Option<IdentifierStatus>,
}

/// Result of `verify`.
#[derive(Debug, Serialize)]
struct VerifyOutput {
    /// Pack label.
    label: String,
    /// First identifier of the allocation.
    range_start: i64,
    /// Last identifier of the allocation.
    range_end: i64,
    /// Fingerprint of the allocation tuple.
    fingerprint: HashDigest,
    /// Verification outcome.
    state: VerificationState,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("pack-identity {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = cli.config.as_deref();
    match command {
        Commands::Classify(command) => command_classify(&command, config).await,
        Commands::Verify(command) => command_verify(command, config).await,
        Commands::Check(command) => command_check(&command, config).await,
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `classify` command.
async fn command_classify(command: &ClassifyCommand, config: Option<&Path>) -> CliResult<ExitCode> {
    let facade = load_facade(config)?;
    let allocation = command.allocation.to_allocation();
    let status = facade.identifier_input_status(&command.id, allocation.as_ref()).await;
    write_json(&classify_output(&command.id, status))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `verify` command; fails unless the allocation is valid.
async fn command_verify(command: VerifyCommand, config: Option<&Path>) -> CliResult<ExitCode> {
    let facade = load_facade(config)?;
    let allocation = PackAllocation::from_encoded(
        command.label,
        command.range_start,
        command.range_end,
        &command.signature,
    );
    let state = facade.cache().resolve(&allocation).await;
    let output = VerifyOutput {
        fingerprint: allocation_fingerprint(&allocation),
        label: allocation.label,
        range_start: allocation.range_start,
        range_end: allocation.range_end,
        state,
    };
    write_json(&output)?;
    Ok(if state == VerificationState::Valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes the `check` command; fails when the pack has blocking findings.
async fn command_check(command: &CheckCommand, config: Option<&Path>) -> CliResult<ExitCode> {
    let facade = load_facade(config)?;
    let snapshot = read_snapshot(&command.snapshot)?;
    let report = facade.validate_document(&snapshot).await;
    match command.format {
        OutputFormat::Json => write_json(&report)?,
        OutputFormat::Text => write_stdout_line(&render_check_text(&report))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
    }
    Ok(if report.summary.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Executes the config validation command.
fn command_config_validate(config: Option<&Path>) -> CliResult<ExitCode> {
    let _config = load_config(config)?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Command Helpers
// ============================================================================

impl OptionalAllocationArgs {
    /// Returns the allocation when every field was supplied.
    fn to_allocation(&self) -> Option<PackAllocation> {
        match (&self.label, self.range_start, self.range_end, &self.signature) {
            (Some(label), Some(start), Some(end), Some(signature)) => {
                Some(PackAllocation::from_encoded(label.as_str(), start, end, signature))
            }
            _ => None,
        }
    }
}

/// Loads config from the resolved path.
fn load_config(path: Option<&Path>) -> CliResult<PackIdentityConfig> {
    PackIdentityConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds a validation facade from config.
fn load_facade(path: Option<&Path>) -> CliResult<ValidationFacade> {
    let config = load_config(path)?;
    ValidationFacade::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to initialize engine: {err}")))
}

/// Builds the `classify` output for raw input and its status.
fn classify_output(raw: &str, status: Option<IdentifierStatus>) -> ClassifyOutput {
    let tier = match IdentifierInput::parse(raw) {
        IdentifierInput::NotANumber => None,
        IdentifierInput::Overflow => Some(NamespaceTier::OutOfBounds),
        IdentifierInput::Value(id) => Some(NamespaceTier::of(id)),
    };
    ClassifyOutput {
        input: raw.to_string(),
        tier,
        status,
    }
}

/// Renders a pack validation as human-readable findings.
fn render_check_text(report: &PackValidation) -> String {
    let mut lines = Vec::new();
    if let Some(label) = &report.pack_label {
        lines.push(format!("pack: {label}"));
    }
    if let Some(state) = report.verification {
        lines.push(format!("allocation: {}", state.as_str()));
    }
    for collection in &report.collections {
        for key in &collection.duplicate_keys {
            lines.push(format!("duplicate key: {key}"));
        }
        for entity in &collection.entities {
            let location = format!("{}[{}]", collection.kind, entity.position);
            if let Some(status) = entity.id_status.filter(|status| status.is_violation()) {
                lines.push(format!("{location}: identifier {status}"));
            }
            if let Some(prefix) = entity.prefix.as_ref().filter(|prefix| prefix.is_warning()) {
                lines.push(format!(
                    "{location}: label should start with {}",
                    prefix.expected_prefix
                ));
            }
        }
    }
    let summary = report.summary;
    lines.push(format!(
        "entities: {}, id violations: {}, duplicates: {}, prefix warnings: {}",
        summary.entities, summary.id_violations, summary.duplicates, summary.prefix_warnings
    ));
    lines.join("\n")
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads and parses a pack snapshot file.
fn read_snapshot(path: &Path) -> CliResult<PackSnapshot> {
    let bytes = read_bytes_with_limit(path, MAX_SNAPSHOT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read snapshot {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "snapshot {} is too large: {size} bytes (limit {limit})",
            path.display()
        )),
    })?;
    PackSnapshot::from_json_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid snapshot {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a value to stdout as canonical JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
