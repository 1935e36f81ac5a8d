//! Configuration file discovery and multi-document YAML parsing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use walkdir::WalkDir;

use super::block::{Body, DeclRange, RawBlock, API_VERSION};
use crate::diagnostics::{Diagnostic, Diagnostics};

/// Which files in a directory hold configuration.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// File extensions to include, without the leading dot.
    pub extensions: Vec<String>,
    /// File names to skip even when their extension matches.
    pub exclude: Vec<String>,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            exclude: Vec::new(),
            recursive: false,
        }
    }
}

/// Contents of one configuration file.
#[derive(Debug, Clone)]
pub struct FileData {
    /// Path the file was listed under, used in diagnostics.
    pub path: PathBuf,
    /// Raw UTF-8 text of the file.
    pub content: String,
}

/// Returns true if `path` has one of `extensions`.
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x == ext))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Lists configuration files under `dir`, sorted by path.
///
/// Hidden files and directories are skipped. Symbolic links are followed, so a
/// linked file is listed under the link's own path. A missing directory is an
/// error.
pub fn list_files(dir: &Path, options: &ListOptions) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' is not a directory", dir.display()),
        ));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(&e.file_name().to_string_lossy()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        // With links followed this is the type of the link target.
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        if options.exclude.iter().any(|x| *x == name) {
            continue;
        }
        if matches_extension(path, &options.extensions) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Reads every file, reporting unreadable ones as diagnostics.
pub fn load_file_data(paths: &[PathBuf]) -> (Vec<FileData>, Diagnostics) {
    let mut files = Vec::with_capacity(paths.len());
    let mut diags = Diagnostics::new();

    for path in paths {
        match fs::read_to_string(path) {
            Ok(content) => files.push(FileData {
                path: path.clone(),
                content,
            }),
            Err(e) => diags.push(
                Diagnostic::error(format!("Failed to read file '{}'", path.display()))
                    .with_detail(e.to_string()),
            ),
        }
    }

    (files, diags)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    api_version: String,
    kind: String,
    #[serde(default)]
    metadata: Value,
    #[serde(default)]
    spec: Value,
}

/// Marker lines that open (`---`) or close (`...`) a YAML document, returning
/// whatever follows the marker on the same line.
fn marker_rest<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

fn has_content(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.starts_with('#')
}

/// Returns the 1-based line span of every non-empty document in `content`.
///
/// Only used to attach source locations; parsing itself goes through the
/// YAML stream reader.
fn document_ranges(content: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start_line = 1;
    let mut in_document = false;
    let mut last_line = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;

        if let Some(rest) = marker_rest(line, "---") {
            if in_document {
                ranges.push((start_line, line_no - 1));
            }
            // `--- {a: 1}` puts the document on the marker line.
            in_document = has_content(rest);
            start_line = if in_document { line_no } else { line_no + 1 };
            continue;
        }
        if marker_rest(line, "...").is_some() {
            if in_document {
                ranges.push((start_line, line_no - 1));
            }
            in_document = false;
            start_line = line_no + 1;
            continue;
        }
        if !in_document && has_content(line) {
            in_document = true;
        }
    }

    if in_document {
        ranges.push((start_line, last_line));
    }
    ranges
}

/// Reads every document of a YAML stream, stopping at the first syntax error.
fn read_documents(content: &str) -> (Vec<Value>, Option<serde_yaml::Error>) {
    let mut values = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        match Value::deserialize(document) {
            Ok(value) => values.push(value),
            Err(e) => return (values, Some(e)),
        }
    }
    (values, None)
}

fn parse_document(value: Value, decl_range: DeclRange) -> Result<Option<RawBlock>, Diagnostic> {
    // Comment-only and empty documents.
    if value.is_null() {
        return Ok(None);
    }

    let envelope: Envelope = serde_yaml::from_value(value).map_err(|e| {
        Diagnostic::error("Invalid configuration document")
            .with_detail(e.to_string())
            .with_subject(&decl_range)
    })?;

    if envelope.api_version != API_VERSION {
        return Err(Diagnostic::error("Unsupported apiVersion")
            .with_detail(format!(
                "found '{}', expected '{}'",
                envelope.api_version, API_VERSION
            ))
            .with_subject(&decl_range));
    }

    Ok(Some(RawBlock {
        kind: envelope.kind,
        metadata: envelope.metadata,
        spec: envelope.spec,
        decl_range,
    }))
}

fn parse_file(file: &FileData, blocks: &mut Vec<RawBlock>, diags: &mut Diagnostics) {
    let (values, syntax_error) = read_documents(&file.content);
    let ranges = document_ranges(&file.content);
    let whole_file = DeclRange {
        file: file.path.clone(),
        start_line: 1,
        end_line: file.content.lines().count().max(1),
    };
    // Streams the line scan cannot follow (directives, odd markers) fall back
    // to whole-file ranges.
    let ranges_usable = if syntax_error.is_some() {
        ranges.len() >= values.len()
    } else {
        ranges.len() == values.len()
    };

    for (idx, value) in values.into_iter().enumerate() {
        let decl_range = match ranges.get(idx) {
            Some(&(start_line, end_line)) if ranges_usable => DeclRange {
                file: file.path.clone(),
                start_line,
                end_line,
            },
            _ => whole_file.clone(),
        };
        match parse_document(value, decl_range) {
            Ok(Some(block)) => blocks.push(block),
            Ok(None) => {}
            Err(diag) => diags.push(diag),
        }
    }

    if let Some(e) = syntax_error {
        let subject = match e.location() {
            Some(location) => DeclRange {
                file: file.path.clone(),
                start_line: location.line(),
                end_line: location.line(),
            },
            None => whole_file,
        };
        diags.push(
            Diagnostic::error("Failed to parse configuration file")
                .with_detail(e.to_string())
                .with_subject(&subject),
        );
    }
}

/// Parses every document of every file into a single body.
pub fn parse_files(files: &[FileData]) -> (Body, Diagnostics) {
    let mut blocks = Vec::new();
    let mut diags = Diagnostics::new();

    for file in files {
        parse_file(file, &mut blocks, &mut diags);
    }

    (Body::new(blocks), diags)
}
