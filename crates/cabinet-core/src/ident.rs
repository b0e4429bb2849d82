use std::collections::HashSet;

use crate::manifest::UnitDescriptor;

const AUTHOR_SLUG_MAX: usize = 20;

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn truncate_slug(slug: &str, max: usize) -> String {
    let cut: String = slug.chars().take(max).collect();
    cut.trim_end_matches('-').to_string()
}

/// Pick the storage identifier for `descriptor`, avoiding everything in `taken`.
///
/// 1. slug of the name (`unit` if it has no usable characters);
/// 2. plus the author slug whenever an author is set;
/// 3. plus the version slug if that is taken;
/// 4. plus the smallest free `-N`.
pub fn resolve_identifier(descriptor: &UnitDescriptor, taken: &HashSet<String>) -> String {
    let mut base = slugify(&descriptor.name);
    if base.is_empty() {
        base = "unit".to_string();
    }

    if let Some(author) = descriptor.author.as_deref() {
        let author = truncate_slug(&slugify(author), AUTHOR_SLUG_MAX);
        if !author.is_empty() {
            base = format!("{base}-{author}");
        }
    }
    if !taken.contains(&base) {
        return base;
    }

    if let Some(version) = descriptor.version.as_deref() {
        let version = slugify(version);
        if !version.is_empty() {
            base = format!("{base}-{version}");
            if !taken.contains(&base) {
                return base;
            }
        }
    }

    (1u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}
