use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Result, ensure};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::util::is_markdown_name;

/// One entry of the document tree handed to the graph builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentEntry {
    pub is_container: bool,
    pub name: String,
    /// Backing document identifier (the filesystem path for scanned vaults).
    pub id: String,
    pub children: Vec<DocumentEntry>,
}

impl DocumentEntry {
    pub fn document(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            is_container: false,
            name: name.into(),
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn container(
        name: impl Into<String>,
        id: impl Into<String>,
        children: Vec<DocumentEntry>,
    ) -> Self {
        Self {
            is_container: true,
            name: name.into(),
            id: id.into(),
            children,
        }
    }

    pub fn document_count(&self) -> usize {
        if self.is_container {
            self.children.iter().map(Self::document_count).sum()
        } else {
            1
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn folders_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

struct OpenFolder {
    depth: usize,
    entry: DocumentEntry,
}

fn close_folder(folder: OpenFolder, stack: &mut [OpenFolder], roots: &mut Vec<DocumentEntry>) {
    if folder.entry.children.is_empty() {
        return;
    }
    match stack.last_mut() {
        Some(parent) => parent.entry.children.push(folder.entry),
        None => roots.push(folder.entry),
    }
}

/// Walks `root` and returns the Markdown document tree below it.
///
/// Hidden entries are skipped, folders without documents are pruned, and
/// unreadable entries are logged and ignored.
pub fn scan_vault(root: &Path) -> Result<Vec<DocumentEntry>> {
    ensure!(root.is_dir(), "vault path {} is not a directory", root.display());

    let mut roots = Vec::new();
    let mut stack: Vec<OpenFolder> = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(folders_first)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(%error, "skipping unreadable vault entry");
                continue;
            }
        };

        while stack.last().is_some_and(|open| open.depth >= entry.depth()) {
            if let Some(folder) = stack.pop() {
                close_folder(folder, &mut stack, &mut roots);
            }
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let id = entry.path().to_string_lossy().into_owned();

        if entry.file_type().is_dir() {
            stack.push(OpenFolder {
                depth: entry.depth(),
                entry: DocumentEntry::container(name, id, Vec::new()),
            });
        } else if entry.file_type().is_file() && is_markdown_name(&name) {
            let document = DocumentEntry::document(name, id);
            match stack.last_mut() {
                Some(parent) => parent.entry.children.push(document),
                None => roots.push(document),
            }
        }
    }

    while let Some(folder) = stack.pop() {
        close_folder(folder, &mut stack, &mut roots);
    }

    let documents = roots.iter().map(DocumentEntry::document_count).sum::<usize>();
    debug!(root = %root.display(), documents, "scanned vault");
    Ok(roots)
}
