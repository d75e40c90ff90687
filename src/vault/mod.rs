mod links;
mod tree;
mod watch;

pub use links::{FsLinkReader, LinkReader, extract_wiki_links};
pub use tree::{DocumentEntry, scan_vault};
pub use watch::VaultWatcher;
