//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens the configured store, runs one vault operation and
//! prints its outcome, as text or as JSON with `--json-mode`. Domain outcomes
//! such as "rejected" or "not found" are printed, not returned as errors.

use super::CollectionAction;
use crate::api;
use crate::config::{AppConfig, BackendKind};
use crate::extract::extract_text;
use riskvault_core::{
    AttachOutcome, CollectionName, CollectionOutcome, DeleteOutcome, DocumentStore, DocumentView,
    FileName, Filter, GetOutcome, RiskAssessment, SaveOutcome, UploadOutcome, Vault, VaultError,
    VersionName,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// HELPERS
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: usize) -> Result<(), VaultError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| VaultError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size as u64 {
        return Err(VaultError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, VaultError> {
    let canonical = path.canonicalize().map_err(|e| {
        VaultError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(VaultError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read an input file within the configured upload limit.
fn read_input(path: &Path, config: &AppConfig) -> Result<Vec<u8>, VaultError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, config.max_upload_bytes)?;
    std::fs::read(&path).map_err(|e| VaultError::Io(format!("Cannot read file: {}", e)))
}

/// Open the vault selected by the configuration.
pub fn open_vault(config: &AppConfig) -> Result<Vault, VaultError> {
    Ok(Vault::new(config.backend.open(&config.database)?))
}

/// Parse a `--risk` argument.
///
/// Accepts a flat JSON object mapping the 17 leaf names to integers, or
/// `@path` naming a file that holds one.
pub fn parse_risk(arg: &str) -> Result<RiskAssessment, VaultError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            VaultError::Io(format!("Cannot read risk assessment '{}': {}", path, e))
        })?,
        None => arg.to_string(),
    };
    let leaves: BTreeMap<String, i32> = serde_json::from_str(&text).map_err(|e| {
        VaultError::InvalidInput(format!("Risk assessment is not a flat JSON object: {}", e))
    })?;
    RiskAssessment::from_flat(&leaves)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), VaultError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| VaultError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), VaultError> {
    let vault = open_vault(config)?;

    println!("Riskvault Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Backend:    {}", config.backend.as_str());
    println!("  Database:   {:?}", config.database);
    println!("  Rate limit: {} req/s", config.rate_limit);
    println!();
    println!("Endpoints:");
    println!("  GET         /health              - Health check");
    println!("  GET|POST|DELETE /collections     - Manage collections");
    println!("  POST        /documents/upload    - Upload a file");
    println!("  POST        /documents/risk-assessment - Attach risk assessment");
    println!("  POST        /documents/versions  - Save a version");
    println!("  GET|DELETE  /documents           - Get / delete a document");
    println!("  GET         /documents/latest    - Latest version");
    println!("  GET         /documents/history   - Version history");
    println!("  DELETE      /documents/version   - Delete one version");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, vault).await
}

// =============================================================================
// INIT / STATUS COMMANDS
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(config: &AppConfig, force: bool) -> Result<(), VaultError> {
    if config.backend == BackendKind::Memory {
        println!("Memory backend needs no initialization");
        return Ok(());
    }

    let path = &config.database;
    if path.exists() {
        if !force {
            return Err(VaultError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(path)
            .map_err(|e| VaultError::Io(format!("Cannot remove old database: {}", e)))?;
    }

    open_vault(config)?;
    println!("Initialized new redb database at {:?}", path);
    Ok(())
}

/// Document counts of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub documents: usize,
    /// Versions carrying a risk assessment.
    pub scored: usize,
}

/// Count documents and scored documents of every collection.
pub fn collection_stats<S: DocumentStore>(
    vault: &Vault<S>,
) -> Result<BTreeMap<String, CollectionStats>, VaultError> {
    let mut stats = BTreeMap::new();
    for collection in vault.list_collections()? {
        let documents = vault.store().count(&collection, &Filter::all())?;
        let scored = vault
            .store()
            .count(&collection, &Filter::all().with_risk_assessment())?;
        stats.insert(collection.0, CollectionStats { documents, scored });
    }
    Ok(stats)
}

/// Show collections and document counts.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), VaultError> {
    let vault = open_vault(config)?;
    let stats = collection_stats(&vault)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "backend": config.backend.as_str(),
            "collections": stats,
        }));
    }

    println!("Riskvault Status");
    println!("================");
    println!("Database: {:?}", config.database);
    println!("Backend:  {}", config.backend.as_str());
    println!();
    if stats.is_empty() {
        println!("No collections");
    }
    for (name, s) in &stats {
        println!("{:<32} {} document(s), {} scored", name, s.documents, s.scored);
    }
    Ok(())
}

// =============================================================================
// COLLECTION COMMAND
// =============================================================================

/// Create, drop or list collections.
pub fn cmd_collection(
    config: &AppConfig,
    json_mode: bool,
    action: &CollectionAction,
) -> Result<(), VaultError> {
    let vault = open_vault(config)?;

    let (name, outcome) = match action {
        CollectionAction::List => {
            let names: Vec<String> = vault.list_collections()?.into_iter().map(|c| c.0).collect();
            if json_mode {
                return print_json(&serde_json::json!({ "collections": names }));
            }
            for name in names {
                println!("{}", name);
            }
            return Ok(());
        }
        CollectionAction::Create { name } => {
            let collection = CollectionName::new(name.as_str());
            (name, vault.create_collection(&collection)?)
        }
        CollectionAction::Drop { name } => {
            let collection = CollectionName::new(name.as_str());
            (name, vault.drop_collection(&collection)?)
        }
    };

    let label = match outcome {
        CollectionOutcome::Created => "created",
        CollectionOutcome::AlreadyExists => "already_exists",
        CollectionOutcome::Dropped => "dropped",
        CollectionOutcome::NotFound => "not_found",
    };
    if json_mode {
        print_json(&serde_json::json!({ "collection": name, "outcome": label }))
    } else {
        println!("Collection '{}': {}", name, label.replace('_', " "));
        Ok(())
    }
}

// =============================================================================
// WRITE COMMANDS
// =============================================================================

/// Extract a file and store it as version 0.
pub fn cmd_upload(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file: &Path,
    name: Option<String>,
) -> Result<(), VaultError> {
    let stored_name = match name {
        Some(n) => n,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| VaultError::InvalidInput("Input path has no file name".to_string()))?,
    };
    let file_name = FileName::new(stored_name);
    let collection = CollectionName::new(collection);

    let bytes = read_input(file, config)?;
    let content = extract_text(&file_name, &bytes)?;

    let vault = open_vault(config)?;
    let label = match vault.upload(&file_name, &content, &collection)? {
        UploadOutcome::Created => "created",
        UploadOutcome::AlreadyExists => "already_exists",
    };

    if json_mode {
        print_json(&serde_json::json!({
            "collection": collection,
            "file_name": file_name,
            "characters": content.chars().count(),
            "outcome": label,
        }))
    } else {
        println!("Upload '{}' into '{}': {}", file_name, collection, label.replace('_', " "));
        Ok(())
    }
}

/// Attach the risk assessment of version 0.
pub fn cmd_attach(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
    risk: &str,
) -> Result<(), VaultError> {
    let risk = parse_risk(risk)?;
    let collection = CollectionName::new(collection);
    let file_name = FileName::new(file_name);

    let vault = open_vault(config)?;
    let label = match vault.attach_risk_assessment(&file_name, &collection, risk)? {
        AttachOutcome::Attached => "attached",
        AttachOutcome::Rejected => "rejected",
        AttachOutcome::NotFound => "not_found",
    };

    if json_mode {
        print_json(&serde_json::json!({ "file_name": file_name, "outcome": label }))
    } else {
        println!("Attach to '{}': {}", file_name, label.replace('_', " "));
        Ok(())
    }
}

/// Save a new version if the risk assessment changed.
pub fn cmd_save(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
    content_file: &Path,
    risk: &str,
    exclusive: bool,
) -> Result<(), VaultError> {
    let risk = parse_risk(risk)?;
    let bytes = read_input(content_file, config)?;
    let content = String::from_utf8(bytes)
        .map_err(|e| VaultError::InvalidInput(format!("Content file is not UTF-8: {}", e)))?;
    let collection = CollectionName::new(collection);
    let file_name = FileName::new(file_name);

    let vault = open_vault(config)?;
    let outcome = if exclusive {
        vault.save_version_exclusive(&file_name, &collection, &content, risk)?
    } else {
        vault.save_version(&file_name, &collection, &content, risk)?
    };

    let (label, version) = match outcome {
        SaveOutcome::Saved(v) => ("saved", Some(v)),
        SaveOutcome::Unchanged => ("unchanged", None),
        SaveOutcome::NoHistory => ("no_history", None),
    };

    if json_mode {
        print_json(&serde_json::json!({
            "file_name": file_name,
            "outcome": label,
            "version_name": version,
        }))
    } else {
        match version {
            Some(v) => println!("Saved '{}' as version {}", file_name, v),
            None => println!("Save '{}': {}", file_name, label.replace('_', " ")),
        }
        Ok(())
    }
}

// =============================================================================
// READ COMMANDS
// =============================================================================

fn print_document(
    outcome: GetOutcome,
    collection: &CollectionName,
    json_mode: bool,
) -> Result<(), VaultError> {
    let document = match outcome {
        GetOutcome::Found(document) => document,
        GetOutcome::NotFound => {
            if json_mode {
                return print_json(&serde_json::json!({ "outcome": "not_found" }));
            }
            println!("Document not found");
            return Ok(());
        }
    };

    let view = DocumentView::new(&document, collection);
    if json_mode {
        return print_json(&view);
    }

    println!("File:       {}", view.file_name);
    println!("Collection: {}", view.collection_name);
    println!("Version:    {}", view.version_name);
    match document.risk_assessment {
        Some(risk) => {
            println!("Risk score: {}", risk.score);
            for (name, value) in risk.flatten() {
                println!("  {:<32} {}", name, value);
            }
        }
        None => println!("Risk score: (not assessed)"),
    }
    println!();
    println!("{}", view.content);
    Ok(())
}

/// Get one version, the lowest when none is given.
pub fn cmd_get(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
    version: Option<u32>,
) -> Result<(), VaultError> {
    let collection = CollectionName::new(collection);
    let vault = open_vault(config)?;
    let outcome = vault.get_document(
        &FileName::new(file_name),
        &collection,
        version.map(VersionName::new),
    )?;
    print_document(outcome, &collection, json_mode)
}

/// Get the latest version.
pub fn cmd_latest(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
) -> Result<(), VaultError> {
    let collection = CollectionName::new(collection);
    let vault = open_vault(config)?;
    let outcome = vault.get_latest(&FileName::new(file_name), &collection)?;
    print_document(outcome, &collection, json_mode)
}

/// List the versions of a file.
pub fn cmd_history(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
) -> Result<(), VaultError> {
    let vault = open_vault(config)?;
    let history =
        vault.list_versions(&FileName::new(file_name), &CollectionName::new(collection))?;

    if json_mode {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("Document not found");
        return Ok(());
    }

    println!("{:<8} {:<10} {:>10}", "VERSION", "SCORE", "CHARS");
    for entry in history {
        let score = entry
            .risk_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<10} {:>10}",
            entry.version_name, score, entry.content_length
        );
    }
    Ok(())
}

// =============================================================================
// DELETE COMMAND
// =============================================================================

/// Delete one version, or every version of the file.
pub fn cmd_delete(
    config: &AppConfig,
    json_mode: bool,
    collection: &str,
    file_name: &str,
    version: Option<u32>,
) -> Result<(), VaultError> {
    let collection = CollectionName::new(collection);
    let file = FileName::new(file_name);
    let vault = open_vault(config)?;

    let outcome = match version {
        Some(v) => vault.delete_version(&file, &collection, VersionName::new(v))?,
        None => vault.delete_document(&file, &collection)?,
    };
    let deleted = match outcome {
        DeleteOutcome::Deleted(n) => n,
        DeleteOutcome::NotFound => 0,
    };

    if json_mode {
        print_json(&serde_json::json!({ "file_name": file, "deleted": deleted }))
    } else {
        println!("Deleted {} document(s) of '{}'", deleted, file);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FLAT_RISK: &str = r#"{
        "riskAssessmentScore": 5,
        "financialScore": 1, "financialSystemQueryScore": 2,
        "financialKeywordsScore": 3, "financialXgbScore": 4,
        "reputationalScore": 0, "reputationalSystemQueryScore": 0,
        "reputationalKeywordsScore": 0, "reputationalXgbScore": 0,
        "regulatoryScore": 0, "regulatorySystemQueryScore": 0,
        "regulatoryKeywordsScore": 0, "regulatoryXgbScore": 0,
        "operationalScore": 0, "operationalSystemQueryScore": 0,
        "operationalKeywordsScore": 0, "operationalXgbScore": 0
    }"#;

    fn redb_config(dir: &Path) -> AppConfig {
        AppConfig {
            database: dir.join("cli.redb"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn parse_inline_risk() {
        let risk = parse_risk(FLAT_RISK).expect("parse");
        assert_eq!(risk.score, 5);
        assert_eq!(risk.financial.xgb, 4);
    }

    #[test]
    fn parse_risk_from_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("risk.json");
        std::fs::write(&path, FLAT_RISK).expect("write");

        let risk = parse_risk(&format!("@{}", path.display())).expect("parse");
        assert_eq!(risk.financial.keywords, 3);
    }

    #[test]
    fn parse_risk_missing_leaf_is_error() {
        let result = parse_risk(r#"{"riskAssessmentScore": 5}"#);
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));

        let result = parse_risk("not json");
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn upload_attach_save_against_redb() {
        let dir = tempdir().expect("tempdir");
        let config = redb_config(dir.path());
        let input = dir.path().join("report.txt");
        std::fs::write(&input, "quarterly report").expect("write");
        let next = dir.path().join("v1.txt");
        std::fs::write(&next, "revised report").expect("write");

        cmd_upload(&config, true, "ns", &input, None).expect("upload");
        cmd_attach(&config, true, "ns", "report.txt", FLAT_RISK).expect("attach");

        let mut changed: BTreeMap<String, i32> = serde_json::from_str(FLAT_RISK).expect("json");
        changed.insert("riskAssessmentScore".to_string(), 9);
        let changed = serde_json::to_string(&changed).expect("json");
        cmd_save(&config, true, "ns", "report.txt", &next, &changed, true).expect("save");

        let vault = open_vault(&config).expect("open");
        let latest = vault
            .get_latest(&FileName::new("report.txt"), &CollectionName::new("ns"))
            .expect("latest")
            .into_document()
            .expect("found");
        assert_eq!(latest.version_name, VersionName(1));
        assert_eq!(latest.content, "revised report");
    }

    #[test]
    fn stats_count_scored_versions() {
        let vault = Vault::in_memory();
        let (ns, file) = (CollectionName::new("ns"), FileName::new("f1"));
        vault.create_collection(&CollectionName::new("empty")).expect("create");
        vault.upload(&file, "text1", &ns).expect("upload");
        vault.upload(&FileName::new("f2"), "text2", &ns).expect("upload");
        vault
            .attach_risk_assessment(&file, &ns, parse_risk(FLAT_RISK).expect("parse"))
            .expect("attach");

        let stats = collection_stats(&vault).expect("stats");
        assert_eq!(stats["ns"], CollectionStats { documents: 2, scored: 1 });
        assert_eq!(stats["empty"], CollectionStats { documents: 0, scored: 0 });
    }

    #[test]
    fn init_refuses_existing_database_without_force() {
        let dir = tempdir().expect("tempdir");
        let config = redb_config(dir.path());

        cmd_init(&config, false).expect("init");
        assert!(cmd_init(&config, false).is_err());
        cmd_init(&config, true).expect("force init");
    }

    #[test]
    fn missing_input_file_is_io_error() {
        let dir = tempdir().expect("tempdir");
        let config = redb_config(dir.path());
        let result = cmd_upload(&config, true, "ns", &dir.path().join("nope.pdf"), None);
        assert!(matches!(result, Err(VaultError::Io(_))));
    }
}
