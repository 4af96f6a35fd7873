/// Project invite tokens
///
/// An invite token is 32 random bytes, hex encoded (64 characters). A project
/// carries at most one at a time; it's cleared when redeemed and replaced
/// when regenerated.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::invite::{generate_invite_token, is_well_formed};
///
/// let token = generate_invite_token();
/// assert_eq!(token.len(), 64);
/// assert!(is_well_formed(&token));
/// ```

use rand::RngCore;

/// Random bytes per token
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a fresh invite token from the thread-local CSPRNG
pub fn generate_invite_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether a presented string could be an invite token
///
/// Lets callers reject garbage without a store lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invite_token() {
        let token = generate_invite_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed(&"ab".repeat(32)));
        assert!(!is_well_formed("abc"));
        assert!(!is_well_formed(&"zz".repeat(32)));
        assert!(!is_well_formed(""));
    }
}
