use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

pub const MAX_TAG_LEN: usize = 64;
pub const MAX_TAGS: usize = 500;

/// Trim and lowercase one tag.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Turns a client-supplied list into the set that gets stored: each tag
/// trimmed and lowercased, empties dropped, duplicates folded. The whole
/// list is rejected if any tag is malformed or the set is too large.
pub fn normalize_tags<I, T>(raw: I) -> AppResult<BTreeSet<String>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for item in raw {
        let tag = normalize_tag(item.as_ref());
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::validation(format!(
                "Interest tags must be at most {MAX_TAG_LEN} characters"
            )));
        }
        if tag.chars().any(char::is_control) {
            return Err(AppError::validation(
                "Interest tags must not contain control characters",
            ));
        }
        set.insert(tag);
        if set.len() > MAX_TAGS {
            return Err(AppError::validation(format!(
                "At most {MAX_TAGS} interests can be saved"
            )));
        }
    }
    Ok(set)
}
