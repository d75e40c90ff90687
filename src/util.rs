const MARKDOWN_EXTENSIONS: [&str; 2] = [".markdown", ".md"];

/// Display title of a document: its file name without the Markdown extension.
pub fn normalize_title(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();
    for extension in MARKDOWN_EXTENSIONS {
        if lower.ends_with(extension) && lower.len() > extension.len() {
            return trimmed[..trimmed.len() - extension.len()].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

pub fn is_markdown_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    MARKDOWN_EXTENSIONS
        .iter()
        .any(|extension| lower.ends_with(extension) && lower.len() > extension.len())
}

pub fn short_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(path)
}
