//! Short-form → canonical team name lookup used by the intent router before
//! filter construction. The table is deliberately small and explicit rather
//! than a fuzzy-matching scheme: the set of teams a single club's query
//! surface has to recognize is fixed and short.

const ALIASES: &[(&str, &str)] = &[
    ("blue 10s", "Caroline Springs Blue U10"),
    ("blue u10", "Caroline Springs Blue U10"),
    ("white 10s", "Caroline Springs White U10"),
    ("white u10", "Caroline Springs White U10"),
    ("blue 12s", "Caroline Springs Blue U12"),
    ("blue u12", "Caroline Springs Blue U12"),
    ("white 12s", "Caroline Springs White U12"),
    ("white u12", "Caroline Springs White U12"),
    ("blue 14s", "Caroline Springs Blue U14"),
    ("blue u14", "Caroline Springs Blue U14"),
    ("white 14s", "Caroline Springs White U14"),
    ("white u14", "Caroline Springs White U14"),
];

/// Normalizes a short form like `"blue 10s"` to its canonical team name. Does
/// a case-insensitive, whitespace-collapsed match against the known aliases;
/// anything unrecognized is returned unchanged so the caller can still try a
/// literal lookup against the configured identifier bundle.
pub fn canonicalize(input: &str) -> String {
    let normalized = input.trim().to_lowercase();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    for (alias, canonical) in ALIASES {
        if *alias == normalized {
            return canonical.to_string();
        }
    }
    input.to_string()
}

/// Scans free text for the first known alias substring and returns its
/// canonical name. Used by the intent router to pull a team hint out of a
/// question before the caller has supplied one explicitly.
pub fn find_alias_in_text(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| lowered.contains(alias))
        .map(|(_, canonical)| canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_known_short_forms() {
        assert_eq!(canonicalize("blue 10s"), "Caroline Springs Blue U10");
        assert_eq!(canonicalize("  Blue   10s "), "Caroline Springs Blue U10");
        assert_eq!(canonicalize("white u10"), "Caroline Springs White U10");
    }

    #[test]
    fn passes_through_unknown_names() {
        assert_eq!(canonicalize("Melbourne CC U10"), "Melbourne CC U10");
    }

    #[test]
    fn finds_alias_embedded_in_a_question() {
        assert_eq!(find_alias_in_text("ladder for blue 10s please").as_deref(), Some("Caroline Springs Blue U10"));
        assert_eq!(find_alias_in_text("how's the weather today"), None);
    }
}
