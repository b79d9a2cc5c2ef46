//! `pack` / `unpack`: directory ↔ share token.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use replbox::config::{IMPORT_MAP_FILE, StoreConfig};
use replbox::file::{File, FileSet};
use replbox::import_map;
use replbox::serializer::{self, FileMap, TOKEN_MARKER};

/// Read the top-level files of `dir` and encode them as a token.
///
/// The main file goes first and the import map is completed with the
/// reserved runtime entries, as a store would do on load.
pub fn pack_dir(dir: &Path, config: &StoreConfig) -> Result<String> {
    let files = read_project(dir, &config.project.main_file)?;
    if files.is_empty() {
        bail!("no files found in '{}'", dir.display());
    }

    let mut set: FileSet = files
        .into_iter()
        .map(|(name, content)| (name.clone(), File::new(name, content)))
        .collect();
    let urls = config.runtime.urls(None);
    if let Err(e) = import_map::ensure(&mut set, &config.runtime, &urls) {
        bail!("{}", import_map::syntax_error(&e));
    }

    let files: FileMap = set
        .iter()
        .map(|(name, file)| (name.clone(), file.content().to_string()))
        .collect();
    serializer::serialize(&files).context("Failed to encode project")
}

/// Decode `input` and write its files into `output`. Returns the written paths.
///
/// Nothing is written when any target exists and `force` is off.
pub fn unpack_to(input: &str, output: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let files = serializer::deserialize(extract_token(input)).context("Invalid share token")?;

    let mut targets = Vec::with_capacity(files.len());
    for name in files.keys() {
        let path = safe_join(output, name)?;
        if path.exists() && !force {
            bail!(
                "'{}' already exists (use --force to overwrite)",
                path.display()
            );
        }
        targets.push(path);
    }

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create '{}'", output.display()))?;
    for (path, content) in targets.iter().zip(files.values()) {
        fs::write(path, content)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    Ok(targets)
}

/// Token part of `input`, which may be a full URL ending in `#<token>`.
pub fn extract_token(input: &str) -> &str {
    let input = input.trim();
    input
        .rsplit_once(TOKEN_MARKER)
        .map_or(input, |(_, token)| token)
}

fn read_project(dir: &Path, main_file: &str) -> Result<FileMap> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read '{}'", dir.display()))?;

    let mut files = FileMap::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let content = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read '{}'", entry.path().display()))?;
        files.insert(name, content);
    }

    files.sort_keys();
    if let Some(index) = files.get_index_of(main_file) {
        files.move_index(index, 0);
    }
    // import map last, like a freshly created project
    if let Some(index) = files.get_index_of(IMPORT_MAP_FILE) {
        let last = files.len() - 1;
        files.move_index(index, last);
    }
    Ok(files)
}

/// `root/name`, refusing anything but a plain file name.
fn safe_join(root: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(name)),
        _ => bail!("refusing to write unsafe file name '{name}'"),
    }
}
