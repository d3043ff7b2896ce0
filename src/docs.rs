// Markdown documentation resources
//
// Publishes the `*.md` files of the docs directory as MCP resources so a
// client can read them before calling any tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

pub const DOCS_URI_PREFIX: &str = "resource:docs/markdown/";
pub const MARKDOWN_MIME: &str = "text/markdown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocResource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct DocsLibrary {
    dir: Option<PathBuf>,
}

impl DocsLibrary {
    /// Use the first candidate directory that exists
    pub fn discover(candidates: &[PathBuf]) -> Self {
        let dir = candidates.iter().find(|p| p.is_dir()).cloned();
        match &dir {
            Some(dir) => info!("Found docs directory at: {}", dir.display()),
            None => warn!("Could not find docs directory. Tried: {:?}", candidates),
        }
        Self { dir }
    }

    /// `--docs-dir` first, then `./docs`, then `docs` next to the executable
    pub fn default_candidates(explicit: Option<PathBuf>) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = explicit.into_iter().collect();
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("docs"));
        }
        if let Some(exe_dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
            candidates.push(exe_dir.join("docs"));
            candidates.push(exe_dir.join("../../docs"));
        }
        candidates
    }

    pub fn list(&self) -> Result<Vec<DocResource>> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| DocResource {
                uri: format!("{}{}", DOCS_URI_PREFIX, name),
                description: format!("Fat Zebra documentation: {}", name),
                name,
                mime_type: MARKDOWN_MIME.to_string(),
            })
            .collect())
    }

    /// Read the document behind `uri`; `None` when it is not one of ours
    pub fn read(&self, uri: &str) -> Result<Option<String>> {
        let (Some(dir), Some(name)) = (&self.dir, uri.strip_prefix(DOCS_URI_PREFIX)) else {
            return Ok(None);
        };
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") || !name.ends_with(".md") {
            return Ok(None);
        }

        let path = dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_and_reads_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("payments.md"), "# Payments").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = DocsLibrary::discover(&[dir.path().join("missing"), dir.path().to_path_buf()]);
        let resources = docs.list().unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, "resource:docs/markdown/payments.md");
        assert_eq!(resources[0].mime_type, "text/markdown");

        assert_eq!(docs.read("resource:docs/markdown/payments.md").unwrap().as_deref(), Some("# Payments"));
        assert_eq!(docs.read("resource:docs/markdown/../secret.md").unwrap(), None);
        assert_eq!(docs.read("resource:docs/markdown/notes.txt").unwrap(), None);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let docs = DocsLibrary::discover(&[PathBuf::from("/definitely/not/here")]);
        assert!(docs.list().unwrap().is_empty());
        assert_eq!(docs.read("resource:docs/markdown/payments.md").unwrap(), None);
    }
}
