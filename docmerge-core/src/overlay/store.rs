//! Content stores for human-authored supplementary documentation.
//!
//! A store answers two questions per overlay key: what content exists, and
//! "create placeholder content unless something is already there". Stores
//! never overwrite existing content.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::docs::OverlayFields;
use crate::error::{DocmergeError, DocmergeResult};

/// Content found under one overlay key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoredContent {
    pub fields: OverlayFields,
    /// Machine-generated and untouched since; never applied to the graph
    pub is_placeholder: bool,
}

impl AuthoredContent {
    pub fn authored(fields: OverlayFields) -> Self {
        Self {
            fields,
            is_placeholder: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            fields: OverlayFields::default(),
            is_placeholder: true,
        }
    }
}

/// Lookup and create-if-absent access to authored content.
pub trait ContentStore: Send + Sync {
    /// Existing content for `key`, if any.
    fn read(&self, key: &str) -> DocmergeResult<Option<AuthoredContent>>;

    /// Register placeholder content for `key` unless content already exists.
    ///
    /// Returns true when this call created the content.
    fn create_if_absent(&self, key: &str, title: &str) -> DocmergeResult<bool>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Mutex-guarded map. Counts creations so callers can audit side effects.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    entries: Mutex<HashMap<String, AuthoredContent>>,
    creations: AtomicUsize,
    created_keys: Mutex<Vec<String>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed authored content for a key.
    pub fn with_content(self, key: impl Into<String>, fields: OverlayFields) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), AuthoredContent::authored(fields));
        self
    }

    /// Number of placeholder creations performed.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Keys created, in creation order.
    pub fn created_keys(&self) -> Vec<String> {
        self.created_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, key: &str) -> DocmergeResult<Option<AuthoredContent>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn create_if_absent(&self, key: &str, _title: &str) -> DocmergeResult<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), AuthoredContent::placeholder());
        self.creations.fetch_add(1, Ordering::SeqCst);
        self.created_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.to_string());
        Ok(true)
    }
}

// ============================================================================
// Filesystem store
// ============================================================================

const MARKER_PREFIX: &str = "<!-- docmerge:placeholder sha256=";
const MARKER_SUFFIX: &str = " -->";

/// Section headings, in file order.
const SECTIONS: [&str; 6] = [
    "Usage",
    "Examples",
    "Best Practices",
    "Patterns",
    "Considerations",
    "Related APIs",
];

/// One markdown file per overlay key under a root directory.
///
/// Placeholder files start with a marker line holding the SHA-256 of the
/// body. A file whose body still matches is machine content; once someone
/// edits it the digest no longer matches and it reads back as authored.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key` (`a/b/c` -> `<root>/a/b/c.md`).
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
        if let Some((last, dirs)) = segments.split_last() {
            for dir in dirs {
                path.push(dir);
            }
            // Names may contain dots, so the extension is appended, not set.
            path.push(format!("{}.md", last));
        }
        path
    }
}

impl ContentStore for FsContentStore {
    fn read(&self, key: &str) -> DocmergeResult<Option<AuthoredContent>> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DocmergeError::content_store(key, format!("{}: {}", path.display(), e))),
        };
        Ok(Some(parse_content(&text)))
    }

    fn create_if_absent(&self, key: &str, title: &str) -> DocmergeResult<bool> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DocmergeError::content_store(key, format!("{}: {}", parent.display(), e)))?;
        }

        // create_new makes check-and-create one atomic filesystem step
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(DocmergeError::content_store(key, format!("{}: {}", path.display(), e))),
        };

        write_or_discard(&path, file, render_placeholder(title).as_bytes())
            .map_err(|e| DocmergeError::content_store(key, format!("{}: {}", path.display(), e)))?;
        Ok(true)
    }
}

/// Write a freshly created file, removing it again if the write fails.
///
/// A truncated placeholder would read back as authored content and never
/// be recreated.
fn write_or_discard(path: &Path, mut file: impl Write, body: &[u8]) -> std::io::Result<()> {
    let result = file.write_all(body).and_then(|()| file.flush());
    drop(file);
    if result.is_err() {
        fs::remove_file(path).ok();
    }
    result
}

fn hash_body(body: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(body.as_bytes());
    format!("{:x}", sha.finalize())
}

/// Placeholder file: marker line, then a title and empty sections.
fn render_placeholder(title: &str) -> String {
    let mut body = format!("# {}\n", title);
    for section in SECTIONS {
        body.push_str(&format!("\n## {}\n", section));
    }
    format!("{}{}{}\n{}", MARKER_PREFIX, hash_body(&body), MARKER_SUFFIX, body)
}

fn parse_content(text: &str) -> AuthoredContent {
    let (is_placeholder, body) = match text.split_once('\n') {
        Some((first, rest)) if first.starts_with(MARKER_PREFIX) => {
            let digest = first
                .trim_start_matches(MARKER_PREFIX)
                .trim_end()
                .trim_end_matches(MARKER_SUFFIX.trim_start());
            (digest.trim() == hash_body(rest), rest)
        }
        _ => (false, text),
    };

    if is_placeholder {
        return AuthoredContent::placeholder();
    }
    AuthoredContent::authored(parse_sections(body))
}

/// Split markdown on `## ` headings into overlay fields.
fn parse_sections(text: &str) -> OverlayFields {
    let mut fields = OverlayFields::default();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            if let Some((name, content)) = current.take() {
                assign(&mut fields, &name, &content);
            }
            current = Some((heading.trim().to_string(), String::new()));
        } else if let Some((_, ref mut content)) = current {
            content.push_str(line);
            content.push('\n');
        }
    }
    if let Some((name, content)) = current {
        assign(&mut fields, &name, &content);
    }

    fields
}

fn assign(fields: &mut OverlayFields, heading: &str, content: &str) {
    let text = content.trim();
    if text.is_empty() {
        return;
    }
    match heading.to_ascii_lowercase().as_str() {
        "usage" => fields.usage = Some(text.to_string()),
        "examples" | "example" => fields.examples = Some(text.to_string()),
        "best practices" => fields.best_practices = Some(text.to_string()),
        "patterns" => fields.patterns = Some(text.to_string()),
        "considerations" => fields.considerations = Some(text.to_string()),
        "related apis" => {
            let items: Vec<String> = text
                .lines()
                .map(|l| l.trim().trim_start_matches(['-', '*']).trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if !items.is_empty() {
                fields.related_apis = Some(items);
            }
        }
        _ => {}
    }
}
