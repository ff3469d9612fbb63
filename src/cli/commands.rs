//! CLI command implementations
//!
//! Boot follows a strict sequence: load config, load descriptors,
//! replay the journal, attach the journal writer, then serve. Any
//! failure before SERVING halts the command; there is no partial boot.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::{ApiHandler, Response};
use crate::config::Config;
use crate::journal::{replay_journal, JournalWriter};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::processor::ChangeProcessor;
use crate::registry::{builtin, AspectRegistry, DescriptorLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, read_requests, write_error, write_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
        Command::Apply { config } => apply(&config),
        Command::Describe { config, aspect } => describe(&config, &aspect),
        Command::Query {
            config,
            entity,
            aspect,
            start_millis,
            end_millis,
            latest_only,
        } => query(&config, &entity, &aspect, start_millis, end_millis, latest_only),
    }
}

/// Initialize a data directory
///
/// Creates the directory layout and writes the built-in descriptors.
/// Does not start serving and writes no journal records.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let dirs = [config.descriptor_dir(), config.journal_dir()];
    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    let loader = DescriptorLoader::new(config.data_path());
    let mut names = Vec::new();
    for descriptor in builtin::all() {
        loader.save_descriptor(&descriptor).map_err(|e| {
            CliError::io_error(format!("Failed to write descriptor: {}", e.message()))
        })?;
        names.push(descriptor.name);
    }

    write_response(json!({"initialized": true, "descriptors": names}))?;

    Ok(())
}

/// Boot and serve requests from stdin
///
/// Startup sequence:
/// 1. Configuration load
/// 2. Descriptor load
/// 3. Journal replay
/// 4. Journal writer attach
/// 5. Serving loop
///
/// The loop reads one JSON request per line and writes one response
/// line per request.
pub fn start(config_path: &Path) -> CliResult<()> {
    log_event(Event::BootStart);
    let config = load_config(config_path)?;

    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let handler = boot_system(&config)?;
    log_event(Event::Serving);

    for request_result in read_requests() {
        match request_result {
            Ok(request) => {
                let response = handler.handle(&request.to_string());
                write_json(&response.to_json())?;
            }
            Err(e) => {
                // I/O error reading - stop serving
                write_error(e.code_str(), e.message())?;
                break;
            }
        }
    }

    log_event(Event::ShutdownStart);
    log_event(Event::ShutdownComplete);

    Ok(())
}

/// Apply a single change event from stdin and exit
///
/// Full boot, one request, one response. A rejected change exits
/// non-zero after the error envelope is printed.
pub fn apply(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let handler = boot_system(&config)?;

    let mut request = read_request()?;
    if let Some(obj) = request.as_object_mut() {
        if !obj.contains_key("op") {
            obj.insert("op".to_string(), json!("apply"));
        }
    }

    let response = handler.handle(&request.to_string());
    write_json(&response.to_json())?;

    if let Response::Error { code, .. } = &response {
        return Err(CliError::change_rejected(code));
    }

    Ok(())
}

/// Print a registered aspect descriptor and exit
///
/// Loads the registry only; no replay, no journal.
pub fn describe(config_path: &Path, aspect: &str) -> CliResult<()> {
    let config = load_config(config_path)?;

    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let registry = load_registry(&config)?;
    match registry.describe(aspect) {
        Ok(descriptor) => {
            let rendered = serde_json::to_value(descriptor)?;
            write_response(rendered)?;
        }
        Err(e) => {
            write_error(e.code().code(), e.message())?;
        }
    }

    Ok(())
}

/// Query a time-series aspect and exit
///
/// Full boot so the queried state reflects the whole journal.
pub fn query(
    config_path: &Path,
    entity: &str,
    aspect: &str,
    start_millis: Option<i64>,
    end_millis: Option<i64>,
    latest_only: bool,
) -> CliResult<()> {
    let config = load_config(config_path)?;

    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let handler = boot_system(&config)?;

    let mut request = json!({
        "op": "query",
        "entity": entity,
        "aspect": aspect,
        "latest_only": latest_only,
    });
    if let Some(obj) = request.as_object_mut() {
        if let Some(millis) = start_millis {
            obj.insert("start_millis".to_string(), json!(millis));
        }
        if let Some(millis) = end_millis {
            obj.insert("end_millis".to_string(), json!(millis));
        }
    }

    let response = handler.handle(&request.to_string());
    write_json(&response.to_json())?;

    Ok(())
}

/// Load and validate configuration, then apply the log level
fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.min_severity());
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", config.data_dir.as_str())]);
    Ok(config)
}

/// Check if a data directory is initialized
fn is_initialized(config: &Config) -> bool {
    config.descriptor_dir().exists()
}

/// Load descriptor files into a fresh registry
fn load_registry(config: &Config) -> CliResult<AspectRegistry> {
    let mut registry = AspectRegistry::new();
    let loader = DescriptorLoader::new(config.data_path());
    let count = loader.load_into(&mut registry).map_err(|e| {
        CliError::boot_failed(format!("Descriptor load failed: {}", e.message()))
    })?;

    let count = count.to_string();
    log_event_with_fields(Event::DescriptorsLoaded, &[("count", count.as_str())]);
    Ok(registry)
}

/// Boot the system with mandatory journal replay
///
/// Steps (strict order, all mandatory):
/// 1. Load descriptors into the registry
/// 2. Replay the journal through the processor with journaling off
/// 3. Attach the journal writer for new changes
///
/// FATAL: any failure halts startup immediately. No partial startup,
/// no serving without complete replay.
fn boot_system(config: &Config) -> CliResult<ApiHandler> {
    let registry = Arc::new(load_registry(config)?);
    let processor = ChangeProcessor::new(Arc::clone(&registry), config.shard_count);

    log_event(Event::ReplayStart);
    let journal_path = config.journal_path();
    let stats = replay_journal(&journal_path, &processor).map_err(|e| {
        log_event_with_fields(
            Event::JournalCorruption,
            &[("code", e.code().code()), ("message", e.message())],
        );
        CliError::boot_failed(format!("Journal replay failed: {}", e.message()))
    })?;

    let records = stats.records_replayed.to_string();
    let last_sequence = stats.last_sequence.to_string();
    log_event_with_fields(
        Event::ReplayComplete,
        &[
            ("last_sequence", last_sequence.as_str()),
            ("records", records.as_str()),
        ],
    );

    let processor = if config.journal_enabled {
        let writer = JournalWriter::open(config.data_path()).map_err(|e| {
            CliError::boot_failed(format!("Journal open failed: {}", e.message()))
        })?;
        processor.with_journal(writer)
    } else {
        processor
    };

    log_event(Event::BootComplete);
    Ok(ApiHandler::new(registry, processor))
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("aspectdb.json");
        let data_dir = temp_dir.path().join("data");

        let config = json!({
            "data_dir": data_dir.to_string_lossy()
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let data_dir = temp_dir.path().join("data");

        init(&config_path).unwrap();

        assert!(data_dir.join("descriptors").exists());
        assert!(data_dir.join("journal").exists());
        assert!(data_dir
            .join("descriptors")
            .join("schemaFieldAliases.json")
            .exists());
        assert!(data_dir
            .join("descriptors")
            .join("datasetUsageStatistics.json")
            .exists());
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        let result = init(&config_path);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().code(),
            CliErrorCode::AlreadyInitialized
        );
    }

    #[test]
    fn test_start_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let result = start(&config_path);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code(), CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_describe_after_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();
        describe(&config_path, "schemaFieldAliases").unwrap();
        // Unknown aspects render an error envelope but still exit zero.
        describe(&config_path, "bogus").unwrap();
    }

    #[test]
    fn test_boot_system_on_fresh_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();
        let config = Config::load(&config_path).unwrap();
        let handler = boot_system(&config).unwrap();

        // Both built-ins visible through the booted handler.
        let resp = handler.handle(r#"{"op": "describe", "aspect": "schemaFieldAliases"}"#);
        assert!(resp.is_success());
        let resp = handler.handle(r#"{"op": "describe", "aspect": "datasetUsageStatistics"}"#);
        assert!(resp.is_success());
    }

    #[test]
    fn test_boot_replays_journal() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();
        let config = Config::load(&config_path).unwrap();

        {
            let handler = boot_system(&config).unwrap();
            let resp = handler.handle(
                r#"{
                    "op": "apply",
                    "entity": "urn:li:dataset:(urn:li:dataPlatform:bigquery,db.tbl,PROD)",
                    "aspect": "schemaFieldAliases",
                    "change_type": "UPSERT",
                    "payload": {"aliases": []}
                }"#,
            );
            assert!(resp.is_success());
        }

        // A second boot rebuilds the record from the journal.
        let handler = boot_system(&config).unwrap();
        let resp = handler.handle(
            r#"{
                "op": "get",
                "entity": "urn:li:dataset:(urn:li:dataPlatform:bigquery,db.tbl,PROD)",
                "aspect": "schemaFieldAliases"
            }"#,
        );
        assert!(resp.is_success());
    }
}
