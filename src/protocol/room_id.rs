//! Room identifier sanitization and generation.

use rand::Rng;

/// Characters a generated room identifier is drawn from.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum length of a room identifier.
pub const MAX_LEN: usize = 8;

/// Normalize an untrusted room identifier: keep ASCII alphanumerics only,
/// uppercase, truncate to 8 characters. Total and idempotent; an empty
/// result means the input was invalid.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_LEN)
        .collect()
}

/// Generate a random 8-character room identifier. `thread_rng` is a CSPRNG,
/// so identifiers are not guessable.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..MAX_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_uppercases_and_strips() {
        assert_eq!(sanitize("abcd"), "ABCD");
        assert_eq!(sanitize("my room 42!!"), "MYROOM42");
        assert_eq!(sanitize("a-b_c.d"), "ABCD");
        assert_eq!(sanitize("rööm"), "RM");
    }

    #[test]
    fn sanitize_truncates_to_eight() {
        assert_eq!(sanitize("abcdefghijkl"), "ABCDEFGH");
        assert_eq!(sanitize("123456789"), "12345678");
    }

    #[test]
    fn sanitize_is_total_and_idempotent() {
        for raw in ["", "    ", "!!!", "abcd", "ABCD1234", "ユーザー", "a b c d e"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "not idempotent for {raw:?}");
            assert!(once.len() <= MAX_LEN);
        }
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn generated_ids_are_well_formed() {
        for _ in 0..32 {
            let id = generate();
            assert_eq!(id.len(), MAX_LEN);
            assert!(id.bytes().all(|b| CHARSET.contains(&b)));
            // generated identifiers are already in sanitized form
            assert_eq!(sanitize(&id), id);
        }
    }
}
