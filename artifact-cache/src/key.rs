/// Deterministic, filesystem-safe cache key for an artifact request.
///
/// Each non-empty component is lowercased with runs of non-alphanumeric
/// characters collapsed to `-`; the components join with `-` and the
/// fixed `face` suffix closes the key. The result is always a valid
/// single path segment.
pub fn derive_cache_key(components: &[Option<&str>]) -> String {
    let mut parts: Vec<String> = components
        .iter()
        .flatten()
        .map(|component| slug(component))
        .filter(|part| !part.is_empty())
        .collect();
    parts.push("face".to_owned());
    parts.join("-")
}

/// Human-readable description of the same request: the non-empty
/// components title-cased and space-joined.
pub fn describe(components: &[Option<&str>]) -> String {
    components
        .iter()
        .flatten()
        .filter(|component| !component.trim().is_empty())
        .map(|component| title_case(component))
        .collect::<Vec<String>>()
        .join(" ")
}

fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_owned()
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_byte_exact() {
        let key = derive_cache_key(&[
            Some("Computer Science"),
            Some("Avery"),
            Some(""),
            Some("2024"),
        ]);
        assert_eq!(key, "computer-science-avery-2024-face");
    }

    #[test]
    fn test_cache_key_with_no_components() {
        assert_eq!(derive_cache_key(&[None, None, None, None]), "face");
    }

    #[test]
    fn test_cache_key_is_a_single_path_segment() {
        let key = derive_cache_key(&[
            Some("a/b\\c"),
            Some("  spaced  out  "),
            None,
            Some("x..y"),
        ]);
        assert_eq!(key, "a-b-c-spaced-out-x-y-face");
        assert!(!key.contains('/'));
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_describe_title_cases() {
        let description = describe(&[
            Some("computer science"),
            Some("AVERY"),
            Some(""),
            Some("2024"),
        ]);
        assert_eq!(description, "Computer Science Avery 2024");
    }
}
