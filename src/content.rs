//! Content directory discovery and metadata loading.
//!
//! A content directory (one post, or the about page) holds exactly two files:
//!
//! ```text
//! site-src/posts/hello/
//! ├── meta.yml        # Metadata: title, date, anything else
//! └── hello.md        # Markdown body
//! ```
//!
//! Files are matched by extension (`.yml`/`.yaml` for metadata, `.md`/
//! `.markdown` for content). Zero or several candidates for either role is an
//! error; there is no "pick the first one" fallback.

use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const METADATA_EXTENSIONS: &[&str] = &["yml", "yaml"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not find file or directory at \"{}\".", .0.display())]
    MissingPath(PathBuf),
    #[error(
        "Expected exactly one {role} file in \"{}\", found {}{}",
        .dir.display(),
        .found.len(),
        format_candidates(.found)
    )]
    AmbiguousOrMissingContent {
        dir: PathBuf,
        role: ContentRole,
        found: Vec<String>,
    },
    #[error("Could not parse metadata file \"{}\": {reason}", .path.display())]
    MetadataParse { path: PathBuf, reason: String },
}

fn format_candidates(found: &[String]) -> String {
    if found.is_empty() {
        String::new()
    } else {
        format!(" ({})", found.join(", "))
    }
}

/// Which of the two files a content directory must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    Metadata,
    Markdown,
}

impl ContentRole {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            ContentRole::Metadata => METADATA_EXTENSIONS,
            ContentRole::Markdown => MARKDOWN_EXTENSIONS,
        }
    }
}

impl fmt::Display for ContentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRole::Metadata => f.write_str("metadata (.yml)"),
            ContentRole::Markdown => f.write_str("markdown (.md)"),
        }
    }
}

/// The two files found in a content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFiles {
    pub metadata: PathBuf,
    pub markdown: PathBuf,
}

/// Key→value mapping loaded from a metadata file.
pub type Metadata = Map<String, Value>;

/// Locate the single metadata file and single markdown file in `dir`.
pub fn discover(dir: &Path) -> Result<ContentFiles, ContentError> {
    if !dir.is_dir() {
        return Err(ContentError::MissingPath(dir.to_path_buf()));
    }

    let files = list_files(dir)?;
    let metadata = single_match(dir, &files, ContentRole::Metadata)?;
    let markdown = single_match(dir, &files, ContentRole::Markdown)?;

    Ok(ContentFiles { metadata, markdown })
}

/// Non-hidden entries of `dir`, sorted by name.
///
/// An entry that cannot be read fails the listing rather than being skipped.
pub fn list_visible(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    visible_sorted(fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path())))
}

fn visible_sorted<I>(entries: I) -> Result<Vec<PathBuf>, ContentError>
where
    I: IntoIterator<Item = std::io::Result<PathBuf>>,
{
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if !hidden {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Regular, non-hidden files in `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    Ok(list_visible(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .collect())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy();
            extensions.iter().any(|want| ext.eq_ignore_ascii_case(want))
        })
        .unwrap_or(false)
}

fn single_match(dir: &Path, files: &[PathBuf], role: ContentRole) -> Result<PathBuf, ContentError> {
    let matches: Vec<&PathBuf> = files
        .iter()
        .filter(|p| has_extension(p, role.extensions()))
        .collect();

    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        _ => Err(ContentError::AmbiguousOrMissingContent {
            dir: dir.to_path_buf(),
            role,
            found: matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

/// Parse a YAML metadata file into a mapping.
///
/// An empty file is an empty mapping. Anything other than a mapping at the
/// top level (a list, a bare scalar) is a parse error. Required fields are
/// the caller's business.
pub fn load_metadata(path: &Path) -> Result<Metadata, ContentError> {
    if !path.is_file() {
        return Err(ContentError::MissingPath(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_metadata(&text).map_err(|reason| ContentError::MetadataParse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_metadata(text: &str) -> Result<Metadata, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    if yaml.is_null() {
        return Ok(Metadata::new());
    }
    match serde_json::to_value(&yaml).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "expected a mapping at the top level, found {}",
            value_kind(&other)
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Read a content directory's metadata and raw markdown in one go.
pub fn load_content(dir: &Path) -> Result<(Metadata, String), ContentError> {
    let files = discover(dir)?;
    let metadata = load_metadata(&files.metadata)?;
    let markdown = fs::read_to_string(&files.markdown)?;
    Ok((metadata, markdown))
}
