use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Maximum allowed password length in characters
///
/// Argon2 is intentionally slow; without a cap, very long inputs could tie up
/// CPU for the duration of a single hash.
const MAX_PASSWORD_LENGTH: usize = 64;

/// Characters that satisfy the special-character strength rule
const SPECIAL_CHARACTERS: &str = "<>@!#$%&*()_[]{}?:;|'\\,./-=";

/// Hash a password using the Argon2id algorithm
///
/// A fresh random salt comes from the OS CSPRNG on every call, so the same
/// password never produces the same digest twice. The output is a PHC-format
/// string (`$argon2id$v=19$...$<salt>$<hash>`) that embeds the salt and cost
/// parameters, which is exactly what gets stored in place of the plaintext.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();

    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Verify a password against a stored PHC-format digest
///
/// The salt and parameters are parsed out of the digest itself, the candidate
/// is re-hashed with them, and the comparison runs in constant time, so
/// timing reveals nothing about how close a guess was.
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    Ok(password_matched)
}

/// Check password strength, returning one message per violated rule
///
/// All rules are evaluated independently (no short-circuit) so the client
/// learns every problem at once. An empty vector means the password is
/// acceptable. The three rules:
/// 1. at least 8 characters;
/// 2. at least one lowercase letter, one uppercase letter and one digit
///    (a single combined rule with a single message);
/// 3. at least one character from [`SPECIAL_CHARACTERS`].
pub fn check_strength(password: &str) -> Vec<String> {
    let mut violations = Vec::new();

    // Characters, not bytes: multi-byte input must not satisfy the minimum
    if password.chars().count() < 8 {
        violations.push("Password must be at least 8 characters.".to_string());
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lowercase && has_uppercase && has_digit) {
        violations.push(
            "Password must contain lowercase and uppercase letters and a digit.".to_string(),
        );
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        violations.push("Password must contain at least one special character.".to_string());
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let digest = hash("Abcdef1!").unwrap();
        assert!(compare("Abcdef1!", &digest).unwrap());
        assert!(!compare("Abcdef2!", &digest).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        // Fresh salt per call
        let first = hash("Abcdef1!").unwrap();
        let second = hash("Abcdef1!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn hash_rejects_empty_and_oversized_passwords() {
        assert_eq!(hash("").unwrap_err(), ErrorMessage::EmptyPassword);
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(
            hash(long).unwrap_err(),
            ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH)
        );
    }

    #[test]
    fn compare_rejects_garbage_digest() {
        assert_eq!(
            compare("Abcdef1!", "not-a-phc-string").unwrap_err(),
            ErrorMessage::InvalidHashFormat
        );
    }

    #[test]
    fn weak_password_collects_all_violations() {
        // Too short, no uppercase/digit, no special character
        let violations = check_strength("abc");
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn strong_password_passes() {
        assert!(check_strength("Abcdef1!").is_empty());
    }

    #[test]
    fn character_class_rule_is_one_combined_message() {
        // Long enough and has a special character, but no digit: exactly one
        // violation for the combined class rule
        let violations = check_strength("Abcdefgh!");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn length_rule_counts_characters_not_bytes() {
        // 7 characters but 10 UTF-8 bytes; every other rule is satisfied
        let violations = check_strength("Añññ1!a");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("8 characters"));
    }

    #[test]
    fn missing_special_character_is_flagged() {
        let violations = check_strength("Abcdefg1");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("special"));
    }
}
