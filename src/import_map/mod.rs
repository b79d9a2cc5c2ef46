//! Import map maintenance.
//!
//! `import-map.json` tells the sandbox where bare module names resolve. The
//! store owns two entries in it: the framework runtime and its server
//! renderer. Everything else belongs to the user.
//!
//! Two merge rules apply:
//! - [`ensure`] only adds the reserved entries when they are missing
//! - [`force_runtime`] (version switch) overwrites them
//!
//! A map that does not parse is never rewritten; callers turn the returned
//! [`ParseError`] into a diagnostic via [`syntax_error`].

use serde_json::{Map, Value};

use crate::config::{IMPORT_MAP_FILE, RuntimeConfig, RuntimeUrls};
use crate::error::ParseError;
use crate::file::{File, FileSet};

/// What [`ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The file was missing and has been synthesized.
    Created,
    /// Reserved entries were missing and have been added.
    Repaired,
    /// Nothing to do.
    Unchanged,
}

/// Diagnostic text for an unreadable import map.
pub fn syntax_error(err: &ParseError) -> String {
    format!("Syntax error in {IMPORT_MAP_FILE}: {err}")
}

/// Parse import map text. The root must be a JSON object.
pub fn parse(content: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::Shape {
            at: "$",
            expected: "an object",
        }),
    }
}

/// Make sure the import map exists and contains both reserved entries.
///
/// User-supplied URLs for the reserved keys are left alone.
pub fn ensure(
    files: &mut FileSet,
    runtime: &RuntimeConfig,
    urls: &RuntimeUrls,
) -> Result<EnsureOutcome, ParseError> {
    let Some(file) = files.get(IMPORT_MAP_FILE) else {
        let mut imports = Map::new();
        imports.insert(runtime.runtime_key().to_string(), urls.runtime.clone().into());
        imports.insert(
            runtime.server_renderer_key(),
            urls.server_renderer.clone().into(),
        );
        let mut root = Map::new();
        root.insert("imports".to_string(), Value::Object(imports));

        let content = render(&root)?;
        files.insert(
            IMPORT_MAP_FILE.to_string(),
            File::new(IMPORT_MAP_FILE, content),
        );
        return Ok(EnsureOutcome::Created);
    };

    let mut root = parse(file.content())?;
    let imports = imports_mut(&mut root)?;

    let mut changed = false;
    for (key, url) in reserved(runtime, urls) {
        if !imports.contains_key(&key) {
            imports.insert(key, url.into());
            changed = true;
        }
    }

    if !changed {
        return Ok(EnsureOutcome::Unchanged);
    }
    write(files, &root)?;
    Ok(EnsureOutcome::Repaired)
}

/// Overwrite both reserved entries with `urls` (version switch).
pub fn force_runtime(
    files: &mut FileSet,
    runtime: &RuntimeConfig,
    urls: &RuntimeUrls,
) -> Result<(), ParseError> {
    let mut root = read(files)?;
    let imports = imports_mut(&mut root)?;
    for (key, url) in reserved(runtime, urls) {
        imports.insert(key, url.into());
    }
    write(files, &root)
}

/// Current import map; a missing file reads as an empty object.
pub fn read(files: &FileSet) -> Result<Map<String, Value>, ParseError> {
    match files.get(IMPORT_MAP_FILE) {
        Some(file) => parse(file.content()),
        None => Ok(Map::new()),
    }
}

/// Pretty-print `map` (two-space indent, insertion key order) into the file,
/// creating it when absent.
pub fn write(files: &mut FileSet, map: &Map<String, Value>) -> Result<(), ParseError> {
    let content = render(map)?;
    match files.get_mut(IMPORT_MAP_FILE) {
        Some(file) => {
            file.set_content(content);
        }
        None => {
            files.insert(
                IMPORT_MAP_FILE.to_string(),
                File::new(IMPORT_MAP_FILE, content),
            );
        }
    }
    Ok(())
}

fn render(map: &Map<String, Value>) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(map)?)
}

fn imports_mut(root: &mut Map<String, Value>) -> Result<&mut Map<String, Value>, ParseError> {
    match root
        .entry("imports")
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(imports) => Ok(imports),
        _ => Err(ParseError::Shape {
            at: "imports",
            expected: "an object",
        }),
    }
}

fn reserved(runtime: &RuntimeConfig, urls: &RuntimeUrls) -> [(String, String); 2] {
    [
        (runtime.runtime_key().to_string(), urls.runtime.clone()),
        (runtime.server_renderer_key(), urls.server_renderer.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(content: Option<&str>) -> (FileSet, RuntimeConfig, RuntimeUrls) {
        let mut files = FileSet::new();
        files.insert("App.vue".into(), File::new("App.vue", "<h1/>"));
        if let Some(content) = content {
            files.insert(IMPORT_MAP_FILE.into(), File::new(IMPORT_MAP_FILE, content));
        }
        let runtime = RuntimeConfig::default();
        let urls = RuntimeUrls {
            runtime: "https://cdn/vue.js".into(),
            server_renderer: "https://cdn/ssr.js".into(),
        };
        (files, runtime, urls)
    }

    fn content(files: &FileSet) -> &str {
        files[IMPORT_MAP_FILE].content()
    }

    #[test]
    fn test_missing_map_is_synthesized() {
        let (mut files, runtime, urls) = setup(None);
        assert_eq!(ensure(&mut files, &runtime, &urls).unwrap(), EnsureOutcome::Created);
        assert_eq!(
            content(&files),
            "{\n  \"imports\": {\n    \"vue\": \"https://cdn/vue.js\",\n    \"vue/server-renderer\": \"https://cdn/ssr.js\"\n  }\n}"
        );
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let (mut files, runtime, urls) = setup(Some("{\"imports\": {}}"));
        assert_eq!(ensure(&mut files, &runtime, &urls).unwrap(), EnsureOutcome::Repaired);
        let after_first = content(&files).to_string();
        let revision = files[IMPORT_MAP_FILE].revision();

        assert_eq!(ensure(&mut files, &runtime, &urls).unwrap(), EnsureOutcome::Unchanged);
        assert_eq!(content(&files), after_first);
        assert_eq!(files[IMPORT_MAP_FILE].revision(), revision);
    }

    #[test]
    fn test_ensure_keeps_user_urls_and_entries() {
        let user = r#"{"imports": {"vue": "https://my.cdn/vue.js", "lodash": "https://cdn/lodash.js"}}"#;
        let (mut files, runtime, urls) = setup(Some(user));
        ensure(&mut files, &runtime, &urls).unwrap();

        let map = read(&files).unwrap();
        let imports = map["imports"].as_object().unwrap();
        assert_eq!(imports["vue"], "https://my.cdn/vue.js");
        assert_eq!(imports["lodash"], "https://cdn/lodash.js");
        assert_eq!(imports["vue/server-renderer"], "https://cdn/ssr.js");
        // user key order is preserved, new key appended
        assert_eq!(
            imports.keys().collect::<Vec<_>>(),
            vec!["vue", "lodash", "vue/server-renderer"]
        );
    }

    #[test]
    fn test_complete_user_map_not_reformatted() {
        let user = r#"{"imports":{"vue":"a","vue/server-renderer":"b"}}"#;
        let (mut files, runtime, urls) = setup(Some(user));
        assert_eq!(ensure(&mut files, &runtime, &urls).unwrap(), EnsureOutcome::Unchanged);
        assert_eq!(content(&files), user);
    }

    #[test]
    fn test_trailing_comma_reports_syntax_error() {
        let broken = "{\"imports\": {\"vue\": \"x\",}}";
        let (mut files, runtime, urls) = setup(Some(broken));
        let err = ensure(&mut files, &runtime, &urls).unwrap_err();
        assert!(syntax_error(&err).starts_with("Syntax error in import-map.json: "));
        assert_eq!(content(&files), broken);
    }

    #[test]
    fn test_missing_imports_key_is_created() {
        let (mut files, runtime, urls) = setup(Some("{\"scopes\": {}}"));
        ensure(&mut files, &runtime, &urls).unwrap();
        let map = read(&files).unwrap();
        assert!(map.contains_key("scopes"));
        assert_eq!(map["imports"]["vue"], "https://cdn/vue.js");
    }

    #[test]
    fn test_non_object_shapes_left_untouched() {
        for broken in ["[1, 2]", "{\"imports\": 5}"] {
            let (mut files, runtime, urls) = setup(Some(broken));
            let err = ensure(&mut files, &runtime, &urls).unwrap_err();
            assert!(matches!(err, ParseError::Shape { .. }));
            assert_eq!(content(&files), broken);
        }
    }

    #[test]
    fn test_force_runtime_overwrites_reserved_only() {
        let user = r#"{"imports": {"vue": "https://my.cdn/vue.js", "lodash": "https://cdn/lodash.js"}}"#;
        let (mut files, runtime, _) = setup(Some(user));
        let urls = runtime.urls(Some("3.4.1"));
        force_runtime(&mut files, &runtime, &urls).unwrap();

        let map = read(&files).unwrap();
        assert_eq!(map["imports"]["vue"], urls.runtime.as_str());
        assert_eq!(map["imports"]["vue/server-renderer"], urls.server_renderer.as_str());
        assert_eq!(map["imports"]["lodash"], "https://cdn/lodash.js");
    }

    #[test]
    fn test_force_runtime_refuses_broken_map() {
        let (mut files, runtime, urls) = setup(Some("{oops"));
        assert!(force_runtime(&mut files, &runtime, &urls).is_err());
        assert_eq!(content(&files), "{oops");
    }

    #[test]
    fn test_read_missing_is_empty() {
        let (files, _, _) = setup(None);
        assert!(read(&files).unwrap().is_empty());
    }
}
