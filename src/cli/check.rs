//! `check`: load a token the way a playground would and report problems.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use replbox::compiler::Unavailable;
use replbox::config::{IMPORT_MAP_FILE, StoreConfig};
use replbox::file::FileKind;
use replbox::logger::MemoryLog;
use replbox::serializer;
use replbox::store::{ReplStore, StoreOptions};
use replbox::{debug, log};

use super::pack::extract_token;

/// What a store made of a token.
#[derive(Debug)]
pub struct Report {
    pub main_file: String,
    /// `(filename, kind, bytes)` in display order.
    pub files: Vec<(String, FileKind, usize)>,
    /// The token carried no import map; one was synthesized.
    pub import_map_added: bool,
    pub errors: Vec<String>,
}

/// Decode `input` and load it into a store.
///
/// Unlike a playground, an undecodable token is an error here rather than a
/// silent fallback to the welcome project.
pub fn check_token(input: &str, config: Arc<StoreConfig>) -> Result<Report> {
    let token = extract_token(input);
    let decoded = serializer::deserialize(token).context("Invalid share token")?;

    let store = ReplStore::new(
        Arc::new(Unavailable),
        StoreOptions::default()
            .with_config(Arc::clone(&config))
            .with_log(Arc::new(MemoryLog::new()))
            .with_serialized_state(token),
    );

    let ext = &config.project.sfc_extension;
    let files = store
        .get_files()
        .into_iter()
        .map(|(name, content)| {
            let kind = FileKind::detect(&name, ext);
            (name, kind, content.len())
        })
        .collect();

    Ok(Report {
        main_file: store.main_file(),
        files,
        import_map_added: !decoded.contains_key(IMPORT_MAP_FILE),
        errors: store.load_errors(),
    })
}

/// `replbox check` entry point.
pub fn run(input: &str, config: Arc<StoreConfig>) -> Result<()> {
    let report = check_token(input, config)?;

    log!("check"; "{} files, main file {}", report.files.len(), report.main_file);
    for (name, kind, bytes) in &report.files {
        debug!("check"; "{} ({}, {} bytes)", name, kind.name(), bytes);
    }
    if report.import_map_added {
        log!("check"; "{} missing, synthesized with default runtime", IMPORT_MAP_FILE);
    }
    for error in &report.errors {
        log!("error"; "{}", error);
    }

    if !report.errors.is_empty() {
        bail!("token has {} problem(s)", report.errors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use replbox::serializer::FileMap;

    fn token(entries: &[(&str, &str)]) -> String {
        let files: FileMap = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        serializer::serialize(&files).unwrap()
    }

    #[test]
    fn test_report_for_clean_token() {
        let report = check_token(
            &token(&[("App.vue", "<h1/>"), ("style.css", "h1{}")]),
            Arc::new(StoreConfig::default()),
        )
        .unwrap();

        assert_eq!(report.main_file, "App.vue");
        assert!(report.import_map_added);
        assert!(report.errors.is_empty());
        assert_eq!(report.files[0], ("App.vue".to_string(), FileKind::Component, 5));
        assert_eq!(report.files[1].1, FileKind::Style);
    }

    #[test]
    fn test_report_flags_broken_import_map() {
        let input = token(&[("App.vue", "<h1/>"), ("import-map.json", "{,}")]);
        let report = check_token(&input, Arc::new(StoreConfig::default())).unwrap();

        assert!(!report.import_map_added);
        assert_eq!(report.errors.len(), 1);
        assert!(run(&input, Arc::new(StoreConfig::default())).is_err());
    }

    #[test]
    fn test_bad_token_is_an_error() {
        let err = check_token("#@@@", Arc::new(StoreConfig::default())).unwrap_err();
        assert!(err.to_string().contains("Invalid share token"));
    }
}
