/// Turns a free-text topic or repository name into a URL-safe slug:
/// lowercase, with runs of non-alphanumeric characters collapsed to a single
/// hyphen and no leading or trailing hyphen. Deterministic, so the same name
/// always yields the same slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases() {
        assert_eq!(slugify("Rust"), "rust");
        assert_eq!(slugify("CLI"), "cli");
    }

    #[test]
    fn test_collapses_separator_runs() {
        assert_eq!(slugify("self hosted"), "self-hosted");
        assert_eq!(slugify("machine -- learning"), "machine-learning");
        assert_eq!(slugify("a_b.c"), "a-b-c");
    }

    #[test]
    fn test_trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  web  "), "web");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn test_non_ascii_becomes_separator() {
        assert_eq!(slugify("caf\u{e9} tools"), "caf-tools");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("###"), "");
    }
}
