//! Source acquisition and the literate markdown transform.
//!
//! Stories load through a [`SourceProvider`], so the compiler never
//! touches the filesystem directly and tests can feed sources from
//! memory. Sources named `*.md` are documents: prose is blanked, fenced
//! code is kept, and links to other story files become includes, all
//! without disturbing line numbers.

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use fabula_foundation::{Error, Result};

/// Supplies source text by story-relative name.
pub trait SourceProvider {
    /// Reads one source. Include paths resolve through the same
    /// provider, so every name is relative to the story root.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the source cannot be read.
    fn read(&mut self, name: &str) -> Result<String>;
}

/// Reads sources from a directory on disk.
#[derive(Clone, Debug)]
pub struct FileProvider {
    root: PathBuf,
}

impl FileProvider {
    /// Creates a provider rooted at a directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceProvider for FileProvider {
    fn read(&mut self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path)
            .map_err(|err| Error::io(path.display().to_string(), err.to_string()))
    }
}

/// Serves sources from an in-memory map. Used by tests and by hosts that
/// bundle story text into the program.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    files: HashMap<String, String>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a source.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }
}

impl SourceProvider for MemoryProvider {
    fn read(&mut self, name: &str) -> Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| Error::io(name, "no such source"))
    }
}

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)]+)\)").expect("link pattern"));

/// Splits source text into lines, applying the literate transform to
/// markdown documents. The returned lines always map 1:1 onto the input
/// lines, so positions survive the rewrite.
#[must_use]
pub fn prepare_lines(name: &str, text: &str) -> Vec<String> {
    if name.ends_with(".md") {
        literate(text)
    } else {
        text.lines().map(str::to_string).collect()
    }
}

/// The literate transform: fenced lines are code, linked story files
/// become includes, everything else is blank.
fn literate(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut in_fence = false;
    for raw in text.lines() {
        if raw.trim_start().starts_with("```") {
            in_fence = !in_fence;
            lines.push(String::new());
            continue;
        }
        if in_fence {
            lines.push(raw.to_string());
            continue;
        }
        match story_link(raw) {
            Some(target) => lines.push(format!("include \"{target}\";")),
            None => lines.push(String::new()),
        }
    }
    lines
}

/// Extracts the first link on a prose line that points at another story
/// source. Links to anything else (web pages, images) stay prose.
fn story_link(line: &str) -> Option<String> {
    let caps = LINK.captures(line)?;
    let target = caps.get(1)?.as_str();
    if target.ends_with(".md") || target.ends_with(".fab") {
        Some(target.to_string())
    } else {
        None
    }
}
