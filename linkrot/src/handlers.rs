use anyhow::{Context, Result, bail};
use colored::Colorize;
use linkrot_core::{BatchState, BrokenLinkRecord};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

// Helper functions for the audit and batch handlers

/// Expand `~` in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load the page URL -> snapshot key mapping.
///
/// Accepts either a JSON object or plain text with one `<url> <key>` pair per
/// line. Blank lines and `#` comments are ignored in the text form.
pub fn load_page_mapping(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read page mapping {}", path.display()))?;

    let mapping: HashMap<String, String> = if content.trim_start().starts_with('{') {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON page mapping in {}", path.display()))?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_mapping_line)
            .collect()
    };

    if mapping.is_empty() {
        bail!("No pages found in {}", path.display());
    }

    Ok(mapping)
}

/// Parse a single `<url> <key>` line
pub fn parse_mapping_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split_whitespace();
    let (Some(url), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
        eprintln!("{} Skipping malformed mapping line '{}'", "⚠".yellow(), line);
        return None;
    };

    if Url::parse(url).is_err() {
        eprintln!("{} Skipping invalid page URL '{}'", "⚠".yellow(), url);
        return None;
    }

    Some((url.to_string(), key.to_string()))
}

/// Load broken links reported by traffic analytics (a JSON array)
pub fn load_traffic_links(path: &Path) -> Result<Vec<BrokenLinkRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read traffic links {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid traffic links JSON in {}", path.display()))
}

/// Load batch state, starting fresh when the file does not exist yet
pub fn load_batch_state(path: &Path) -> Result<BatchState> {
    if !path.exists() {
        return Ok(BatchState::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch state {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid batch state in {}", path.display()))
}

pub fn save_batch_state(path: &Path, state: &BatchState) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("Failed to write batch state {}", path.display()))
}
