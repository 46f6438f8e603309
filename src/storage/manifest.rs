use crate::state::LinkSet;
use crate::url::{canonicalize_url, is_absolute_http};
use std::path::Path;

/// Header line of the link manifest
pub const MANIFEST_HEADER: &str = "URL";

/// Reads the product links to extract
///
/// Lines are trimmed and anything that does not start with `http` (the
/// header, blanks, comments) is ignored. Links are canonicalized and
/// deduplicated, keeping the order of first appearance; malformed links are
/// logged and dropped.
///
/// # Returns
///
/// * `Ok(LinkSet)` - Canonical product URLs in manifest order
/// * `Err(io::Error)` - The manifest could not be read
pub fn read_manifest(path: &Path) -> std::io::Result<LinkSet> {
    let content = std::fs::read_to_string(path)?;
    let mut links = LinkSet::new();
    let mut duplicates = 0;

    for line in content.lines().map(str::trim) {
        if !is_absolute_http(line) {
            continue;
        }

        match canonicalize_url(line) {
            Ok(url) => {
                if !links.insert(url) {
                    duplicates += 1;
                }
            }
            Err(e) => tracing::warn!("Skipping manifest entry {}: {}", line, e),
        }
    }

    if duplicates > 0 {
        tracing::info!("Ignored {} duplicate manifest entries", duplicates);
    }

    Ok(links)
}

/// Writes the link manifest, replacing any previous one
///
/// The manifest is written next to its final location and renamed into
/// place, so an interrupted write never leaves a truncated manifest.
pub fn write_manifest(path: &Path, links: &LinkSet) -> std::io::Result<()> {
    let mut content = String::from(MANIFEST_HEADER);
    content.push('\n');
    for url in links.iter() {
        content.push_str(url);
        content.push('\n');
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    std::fs::write(&staging, content)?;
    std::fs::rename(&staging, path)?;

    tracing::info!("Wrote {} links to {}", links.len(), path.display());
    Ok(())
}
