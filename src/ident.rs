//! Validation of variable names.
//!
//! A name is a bare identifier: it starts with a letter, continues with letters,
//! digits or underscores, does not start with an underscore, and is not one of
//! the [`RESERVED_WORDS`].

/// Words that cannot name a variable.
pub const RESERVED_WORDS: &[&str] = &[
    // Formula vocabulary.
    "and", "or", "not", "True", "False", "None",
    // Keywords.
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "is", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

/// Returns `true` if `name` may be used as a variable name.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    // Names starting with '_' are reserved.
    if !first.is_alphabetic() {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    !is_reserved(name)
}

/// Returns `true` if `name` is one of the [`RESERVED_WORDS`].
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["a", "x1", "foo_bar", "Var", "état", "b2_"] {
            assert!(is_valid_identifier(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in ["", "_x", "__", "1x", "not$a$variable", "a b", "a-b", "x.y"] {
            assert!(!is_valid_identifier(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_reserved_words() {
        assert!(!is_valid_identifier("in"));
        assert!(!is_valid_identifier("not"));
        assert!(!is_valid_identifier("True"));
        assert!(is_reserved("while"));
        assert!(!is_reserved("whilst"));
        assert!(is_valid_identifier("whilst"));
    }
}
