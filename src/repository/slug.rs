use std::collections::HashSet;

/// Transliterates `input` to ASCII, spells out `&` as `and`, lowercases it,
/// and collapses every run of non-alphanumeric characters into a single `-`.
/// Leading and trailing dashes are dropped.
pub fn slugify(input: &str) -> String {
    let ascii = deunicode::deunicode(&input.replace('&', " and "));
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Returns `base` if unused, otherwise `base-N` for the smallest free `N >= 1`.
/// An empty `base` is replaced with `fallback`.
///
/// The caller collects `existing` from a full listing just before writing;
/// two concurrent callers can therefore pick the same slug.
pub fn unique_slug<'a, I>(base: &str, fallback: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = if base.is_empty() { fallback } else { base };
    let taken: HashSet<&str> = existing.into_iter().collect();

    if !taken.contains(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
