//! Path and URL helpers for import resolution and output URLs.

use std::path::{Component, Path, PathBuf};

/// Resolves an import path recorded in a manifest to a file on disk.
///
/// Imports beginning with `/` are relative to the document root; all other
/// imports are relative to the directory of the importing input file.
pub fn resolve_import(import: &str, doc_root: &Path, input_dir: &Path) -> PathBuf {
    match import.strip_prefix('/') {
        Some(rest) => doc_root.join(rest.trim_start_matches('/')),
        None => input_dir.join(import),
    }
}

/// Returns the file name of `name` with directories and a trailing `.css`
/// extension removed.
pub fn css_basename(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.strip_suffix(".css").unwrap_or(base)
}

/// Returns `true` if `raw` is a relative reference: no scheme, no leading
/// slash, and not an absolute filesystem path.
pub fn is_relative_reference(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('/') || raw.starts_with('\\') {
        return false;
    }
    if has_scheme(raw) {
        return false;
    }
    !Path::new(raw).is_absolute()
}

fn has_scheme(raw: &str) -> bool {
    match raw.find(':') {
        // A single letter before the colon is a drive, not a scheme.
        Some(idx) if idx > 1 => raw[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Builds a relative URL prefix leading from directory `from` to directory `to`.
///
/// Walks past the shared leading segments, emits `../` for every remaining
/// segment of `from`, then appends the remaining segments of `to`. A non-empty
/// result always ends with `/`; identical directories yield an empty string.
pub fn link_between_paths(from: &Path, to: &Path) -> String {
    let from = segments(from);
    let to = segments(to);

    let shared = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut link = "../".repeat(from.len() - shared);
    for seg in &to[shared..] {
        link.push_str(seg);
        link.push('/');
    }
    link
}

/// Splits a path into its normal segments, folding `.` and `..`.
fn segments(path: &Path) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(seg) => out.push(seg.to_string_lossy().into_owned()),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}
