use std::collections::HashSet;
use std::fs;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::DocumentEntry;

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").expect("wikilink pattern is valid")
});

/// Link targets of every `[[Name]]` / `[[Name|Display]]` in `content`,
/// trimmed, first occurrence wins.
pub fn extract_wiki_links(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WIKI_LINK
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().trim().to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Supplies the raw outbound link names of one document.
pub trait LinkReader {
    fn read_links(&self, document: &DocumentEntry) -> Result<Vec<String>>;
}

/// Reads documents from disk, treating `DocumentEntry::id` as a path.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsLinkReader;

impl LinkReader for FsLinkReader {
    fn read_links(&self, document: &DocumentEntry) -> Result<Vec<String>> {
        let content = fs::read_to_string(&document.id)
            .with_context(|| format!("failed to read document {}", document.id))?;
        Ok(extract_wiki_links(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_aliased_links() {
        let content = "See [[Alpha]] and [[ Beta | the beta note ]], then [[Gamma|g]].";
        assert_eq!(extract_wiki_links(content), vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn removes_duplicates_keeping_first_occurrence() {
        let content = "[[B]] [[A]] [[B|again]] [[A]]";
        assert_eq!(extract_wiki_links(content), vec!["B", "A"]);
    }

    #[test]
    fn ignores_malformed_and_empty_links() {
        let content = "[[]] [[ ]] [single] [[Ok]] [[open";
        assert_eq!(extract_wiki_links(content), vec!["Ok"]);
    }

    #[test]
    fn fs_reader_reads_links_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.md");
        fs::write(&path, "links to [[B]] and [[C|see c]]").unwrap();
        let entry = DocumentEntry::document("A.md", path.to_string_lossy());

        assert_eq!(FsLinkReader.read_links(&entry).unwrap(), vec!["B", "C"]);
    }

    #[test]
    fn fs_reader_reports_missing_documents() {
        let dir = tempfile::tempdir().unwrap();
        let entry = DocumentEntry::document(
            "gone.md",
            dir.path().join("gone.md").to_string_lossy(),
        );
        assert!(FsLinkReader.read_links(&entry).is_err());
    }
}
