//! Root-cause canonicalization.

/// Synonyms collapsed before any root-cause comparison, as
/// `(lower-cased raw, canonical)`.
const SYNONYMS: [(&str, &str); 4] = [
    ("code", "code issue"),
    ("coding", "code issue"),
    ("coding issue", "code issue"),
    ("code issue", "code issue"),
];

/// Lower-case, trim, collapse inner whitespace, then map synonyms.
#[must_use]
pub fn canonical_root_cause(raw: &str) -> String {
    let lowered = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == lowered)
        .map_or(lowered, |(_, canonical)| (*canonical).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_synonyms_collapse() {
        assert_eq!(canonical_root_cause("Coding"), "code issue");
        assert_eq!(canonical_root_cause(" code "), "code issue");
        assert_eq!(canonical_root_cause("Code   Issue"), "code issue");
    }

    #[test]
    fn other_values_are_lowercased_only() {
        assert_eq!(canonical_root_cause("Requirement Gap"), "requirement gap");
        assert_eq!(canonical_root_cause(""), "");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for raw in ["Coding", "Environment", "  DATA  issue "] {
            let once = canonical_root_cause(raw);
            assert_eq!(canonical_root_cause(&once), once);
        }
    }
}
