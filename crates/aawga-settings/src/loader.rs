//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AawgaSettings::default()`]
//! 2. If `~/.aawga/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. [`validate`] the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{AawgaSettings, BackendKind};

/// Resolve the path to the settings file (`~/.aawga/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".aawga").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<AawgaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<AawgaSettings> {
    let mut settings = read_layers(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

fn read_layers(path: &Path) -> Result<AawgaSettings> {
    let defaults = serde_json::to_value(AawgaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Check cross-field constraints the types cannot express.
pub fn validate(settings: &AawgaSettings) -> Result<()> {
    let r = &settings.retrieval;
    check_window("chunk", r.chunk_size, r.chunk_overlap)?;
    check_window("documentChunk", r.document_chunk_size, r.document_chunk_overlap)?;
    if r.top_k == 0 {
        return Err(SettingsError::invalid("retrieval.topK", "must be at least 1"));
    }
    if settings.embedding.batch_size == 0 {
        return Err(SettingsError::invalid("embedding.batchSize", "must be at least 1"));
    }
    if settings.generation.timeout_ms == 0 {
        return Err(SettingsError::invalid("generation.timeoutMs", "must be positive"));
    }
    if settings.embedding.timeout_ms == 0 {
        return Err(SettingsError::invalid("embedding.timeoutMs", "must be positive"));
    }
    Ok(())
}

fn check_window(name: &str, size: usize, overlap: usize) -> Result<()> {
    if size == 0 {
        return Err(SettingsError::invalid(
            format!("retrieval.{name}Size"),
            "must be at least 1",
        ));
    }
    if overlap >= size {
        return Err(SettingsError::invalid(
            format!("retrieval.{name}Overlap"),
            format!("{overlap} must be smaller than {name}Size ({size})"),
        ));
    }
    Ok(())
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut AawgaSettings) {
    apply_env_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
///
/// `USE_DUMMY_AGENT=true` selects the stub generation backend; an explicit
/// `AAWGA_GENERATION_BACKEND` wins over it.
pub fn apply_env_overrides_from<F>(settings: &mut AawgaSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Generation ──────────────────────────────────────────────────
    if env.bool("USE_DUMMY_AGENT") == Some(true) {
        settings.generation.backend = BackendKind::Stub;
    }
    if let Some(v) = env.backend("AAWGA_GENERATION_BACKEND") {
        settings.generation.backend = v;
    }
    if let Some(v) = env.string("AAWGA_MODEL") {
        settings.generation.model = v;
    }
    if let Some(v) = env.string("AAWGA_BASE_URL") {
        settings.generation.base_url = v;
    }
    if let Some(v) = env.u64("AAWGA_TIMEOUT_MS", 1000, 600_000) {
        settings.generation.timeout_ms = v;
    }
    if let Some(v) = env.string("OPENAI_API_KEY") {
        settings.generation.api_key = Some(v);
    }

    // ── Embedding ───────────────────────────────────────────────────
    if let Some(v) = env.backend("AAWGA_EMBEDDING_BACKEND") {
        settings.embedding.backend = v;
    }
    if let Some(v) = env.string("AAWGA_EMBEDDING_MODEL") {
        settings.embedding.model = v;
    }
    if let Some(v) = env.string("AAWGA_EMBEDDING_BASE_URL") {
        settings.embedding.base_url = v;
    }

    // ── Retrieval ───────────────────────────────────────────────────
    if let Some(v) = env.bool("AAWGA_RETRIEVAL_ENABLED") {
        settings.retrieval.enabled = v;
    }
    if let Some(v) = env.string("AAWGA_INDEX_ROOT") {
        settings.retrieval.index_root = v;
    }
    if let Some(v) = env.usize("AAWGA_TOP_K", 1, 100) {
        settings.retrieval.top_k = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("AAWGA_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env readers ─────────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, kind: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let val = self.string(name)?;
        let result = parse(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, kind, "invalid env var, ignoring");
        }
        result
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.parsed(name, "bool", parse_bool)
    }

    fn backend(&self, name: &str) -> Option<BackendKind> {
        self.parsed(name, "backend", BackendKind::parse)
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, "u64", |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, "usize", |v| parse_usize_range(v, min, max))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn with_env(vars: &[(&str, &str)]) -> AawgaSettings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut settings = AawgaSettings::default();
        apply_env_overrides_from(&mut settings, |name| map.get(name).cloned());
        settings
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"retrieval": {"topK": 3, "indexRoot": "vs"}});
        let source = serde_json::json!({"retrieval": {"topK": 5}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["retrieval"]["topK"], 5);
        assert_eq!(merged["retrieval"]["indexRoot"], "vs");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = read_layers(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.retrieval.chunk_size, 500);
        assert_eq!(settings.generation.model, "gpt-4");
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"generation": {"backend": "stub"}, "retrieval": {"topK": 5}}"#,
        )
        .unwrap();

        let settings = read_layers(&path).unwrap();
        assert_eq!(settings.generation.backend, BackendKind::Stub);
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.chunk_overlap, 50);
        assert_eq!(settings.generation.model, "gpt-4");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.json is not valid JSON"));
    }

    #[test]
    fn load_rejects_overlap_not_smaller_than_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"retrieval": {"chunkSize": 100, "chunkOverlap": 100}}"#,
        )
        .unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert_eq!(err.field(), Some("retrieval.chunkOverlap"));
        assert_eq!(
            err.to_string(),
            "retrieval.chunkOverlap: 100 must be smaller than chunkSize (100)"
        );
    }

    #[test]
    fn load_rejects_wrongly_typed_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"retrieval": {"topK": "three"}}"#).unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Schema(_)));
    }

    // ── validate ────────────────────────────────────────────────────

    #[test]
    fn validate_rejects_zero_top_k() {
        let mut settings = AawgaSettings::default();
        settings.retrieval.top_k = 0;
        assert_eq!(validate(&settings).unwrap_err().field(), Some("retrieval.topK"));
    }

    #[test]
    fn validate_names_the_zero_timeout() {
        let mut settings = AawgaSettings::default();
        settings.embedding.timeout_ms = 0;
        assert_eq!(
            validate(&settings).unwrap_err().field(),
            Some("embedding.timeoutMs")
        );
    }

    #[test]
    fn validate_rejects_zero_document_window() {
        let mut settings = AawgaSettings::default();
        settings.retrieval.document_chunk_size = 0;
        settings.retrieval.document_chunk_overlap = 0;
        assert!(validate(&settings).is_err());
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn dummy_toggle_selects_stub_generation() {
        let settings = with_env(&[("USE_DUMMY_AGENT", "true")]);
        assert_eq!(settings.generation.backend, BackendKind::Stub);
    }

    #[test]
    fn dummy_toggle_false_keeps_live() {
        let settings = with_env(&[("USE_DUMMY_AGENT", "false")]);
        assert_eq!(settings.generation.backend, BackendKind::Live);
    }

    #[test]
    fn explicit_backend_wins_over_dummy_toggle() {
        let settings = with_env(&[
            ("USE_DUMMY_AGENT", "true"),
            ("AAWGA_GENERATION_BACKEND", "live"),
        ]);
        assert_eq!(settings.generation.backend, BackendKind::Live);
    }

    #[test]
    fn api_key_and_endpoints() {
        let settings = with_env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AAWGA_BASE_URL", "http://localhost:9999/v1"),
            ("AAWGA_EMBEDDING_BACKEND", "live"),
            ("AAWGA_EMBEDDING_MODEL", "embed-small"),
        ]);
        assert_eq!(settings.generation.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.generation.base_url, "http://localhost:9999/v1");
        assert_eq!(settings.embedding.backend, BackendKind::Live);
        assert_eq!(settings.embedding.model, "embed-small");
    }

    #[test]
    fn invalid_values_are_ignored() {
        let settings = with_env(&[
            ("AAWGA_RETRIEVAL_ENABLED", "maybe"),
            ("AAWGA_TIMEOUT_MS", "5"),
            ("AAWGA_EMBEDDING_BACKEND", "faiss"),
            ("OPENAI_API_KEY", ""),
        ]);
        assert!(settings.retrieval.enabled);
        assert_eq!(settings.generation.timeout_ms, 60_000);
        assert_eq!(settings.embedding.backend, BackendKind::Stub);
        assert!(settings.generation.api_key.is_none());
    }

    #[test]
    fn retrieval_overrides() {
        let settings = with_env(&[
            ("AAWGA_RETRIEVAL_ENABLED", "off"),
            ("AAWGA_INDEX_ROOT", "/var/lib/aawga"),
            ("AAWGA_TOP_K", "7"),
            ("AAWGA_LOG_LEVEL", "debug"),
        ]);
        assert!(!settings.retrieval.enabled);
        assert_eq!(settings.retrieval.index_root, "/var/lib/aawga");
        assert_eq!(settings.retrieval.top_k, 7);
        assert_eq!(settings.logging.level, "debug");
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "On"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "No"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u64_range("30000", 1000, 600_000), Some(30_000));
        assert_eq!(parse_u64_range("500", 1000, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1000, 600_000), None);
        assert_eq!(parse_usize_range("3", 1, 100), Some(3));
        assert_eq!(parse_usize_range("0", 1, 100), None);
    }
}
