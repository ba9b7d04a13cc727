//! File-backed collaborators: Parsoid HTML snapshots in a directory, a directory page store and a
//! static redirect table.
//!
//! The "source markup" of a snapshot is its HTML; no wikitext conversion takes place.

use coordinator_core::{
    BoxError, DocumentProvider, DocumentTree, PageStore, ParsoidDocument, RedirectResolver,
    TemplateAliases,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the JSON-lines edit log written by [`DirectoryStore`].
pub const EDIT_LOG: &str = "edits.jsonl";

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid redirect table {origin}: {source}")]
    Redirects {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Core(#[from] coordinator_core::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;

/// File name of a page snapshot: whitespace becomes `_`, `/` is percent-encoded.
pub fn page_file_name(page: &str) -> String {
    let mut out = String::with_capacity(page.len() + 5);
    for ch in page.trim().chars() {
        match ch {
            '/' => out.push_str("%2F"),
            ch if ch.is_whitespace() => out.push('_'),
            ch => out.push(ch),
        }
    }
    out.push_str(".html");
    out
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| FsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `<root>/<page>.html` snapshots.
#[derive(Debug, Clone)]
pub struct HtmlDirectory {
    root: PathBuf,
}

impl HtmlDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, page: &str) -> PathBuf {
        self.root.join(page_file_name(page))
    }

    pub fn load_sync(&self, page: &str) -> Result<ParsoidDocument> {
        let html = read_to_string(&self.path_for(page))?;
        Ok(ParsoidDocument::parse(html)?)
    }
}

impl DocumentProvider for HtmlDirectory {
    type Document = ParsoidDocument;

    async fn load(&self, page: &str) -> std::result::Result<ParsoidDocument, BoxError> {
        Ok(self.load_sync(page)?)
    }

    async fn to_wikitext(
        &self,
        document: &ParsoidDocument,
    ) -> std::result::Result<String, BoxError> {
        Ok(document.serialize())
    }
}

/// Writes saved pages to `<root>/<page>.html` and appends one JSON line per save to
/// [`EDIT_LOG`].
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_sync(&self, page: &str, html: &str, summary: &str) -> Result<()> {
        let path = self.root.join(page_file_name(page));
        std::fs::write(&path, html).map_err(|source| FsError::Write {
            path: path.clone(),
            source,
        })?;

        let log_path = self.root.join(EDIT_LOG);
        let entry = serde_json::json!({
            "page": page,
            "file": page_file_name(page),
            "summary": summary,
            "bytes": html.len(),
        });
        let write_log = || -> std::io::Result<()> {
            let mut log = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)?;
            writeln!(log, "{entry}")
        };
        write_log().map_err(|source| FsError::Write {
            path: log_path.clone(),
            source,
        })?;

        tracing::debug!(page, path = %path.display(), "wrote page snapshot");
        Ok(())
    }
}

impl PageStore for DirectoryStore {
    async fn save(
        &self,
        page: &str,
        wikitext: &str,
        summary: &str,
    ) -> std::result::Result<(), BoxError> {
        Ok(self.save_sync(page, wikitext, summary)?)
    }
}

/// A fixed redirect table, keyed by canonical template title:
///
/// ```json
/// { "Template:Coord": ["Template:Coordinates", "Template:Coor dms"] }
/// ```
///
/// Templates missing from the table have no redirects.
#[derive(Debug, Clone, Default)]
pub struct StaticRedirects {
    table: BTreeMap<String, Vec<String>>,
}

impl StaticRedirects {
    pub fn new(table: BTreeMap<String, Vec<String>>) -> Self {
        Self { table }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::parse(raw, "<inline>")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_to_string(path)?;
        Self::parse(&raw, &path.display().to_string())
    }

    fn parse(raw: &str, origin: &str) -> Result<Self> {
        let table = serde_json::from_str(raw).map_err(|source| FsError::Redirects {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self { table })
    }

    /// The whole table as template aliases, without going through the async resolver.
    pub fn to_aliases(&self) -> TemplateAliases {
        self.table
            .iter()
            .fold(TemplateAliases::new(), |aliases, (canonical, redirects)| {
                aliases.with(canonical.clone(), redirects.clone())
            })
    }
}

impl RedirectResolver for StaticRedirects {
    async fn redirects(&self, canonical: &str) -> std::result::Result<Vec<String>, BoxError> {
        Ok(self.table.get(canonical).cloned().unwrap_or_default())
    }
}
