//! Filesystem-safe path components.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Sanitizes one path component (a directory segment or a file name).
///
/// - Replaces NUL, `/`, `\`, control characters and `<>:"|?*` with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing spaces, dots and underscores
/// - Limits length to 255 bytes on a char boundary
///
/// Spaces inside the name are kept; media titles rely on them.
pub fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let reserved = matches!(c, '\0' | '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*');
        let c = if reserved || c.is_control() { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_component("AC/DC"), "AC_DC");
        assert_eq!(sanitize_component("a\\b"), "a_b");
    }

    #[test]
    fn keeps_inner_spaces() {
        assert_eq!(sanitize_component("01. Song Name.mp3"), "01. Song Name.mp3");
    }

    #[test]
    fn trims_dots_and_spaces() {
        assert_eq!(sanitize_component("  ..  Album  ..  "), "Album");
        assert_eq!(sanitize_component(".."), "");
    }

    #[test]
    fn reserved_and_control_chars() {
        assert_eq!(sanitize_component("what?: yes*"), "what_ yes");
        assert_eq!(sanitize_component("file\x00name"), "file_name");
    }

    #[test]
    fn caps_length_on_char_boundary() {
        let long = "é".repeat(200);
        let s = sanitize_component(&long);
        assert!(s.len() <= 255);
        assert!(s.chars().all(|c| c == 'é'));
    }
}
