use anyhow::{Result, anyhow};
use std::path::Path;

/// Sanitize a client-supplied filename: strip any path components, reject
/// traversal sequences and control characters.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Take only the final component, whatever separators the client used
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!("Invalid filename"));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(anyhow!("Filename contains control characters"));
    }

    Ok(name.to_string())
}

/// Base name (stem) used as the logical key for outputs and previews.
/// Non-portable characters are replaced so the result is always a safe
/// single path component.
pub fn file_base_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Lowercased extension of a filename, if it has a sane one.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
}
