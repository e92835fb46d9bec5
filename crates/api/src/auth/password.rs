//! Password policy and hashing with Argon2

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashCost;

/// Characters accepted as the "special character" of a strong password
pub const SPECIAL_CHARACTERS: &str = "@$!%*?&";

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate password strength
///
/// Every rule is evaluated, and the first unmet one is reported in the fixed
/// order uppercase, lowercase, digit, special character, length.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordValidationError> {
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARACTERS.contains(c));
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;

    if !has_uppercase {
        return Err(PasswordValidationError::MissingUppercase);
    }

    if !has_lowercase {
        return Err(PasswordValidationError::MissingLowercase);
    }

    if !has_digit {
        return Err(PasswordValidationError::MissingDigit);
    }

    if !has_special {
        return Err(PasswordValidationError::MissingSpecialChar);
    }

    if !long_enough {
        return Err(PasswordValidationError::TooShort);
    }

    Ok(())
}

/// Argon2id hasher with configurable cost
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a throwaway password, verified against when a login names an
    /// unknown user so both failure paths do the same amount of work
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(
            cost.memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            cost.iterations.unwrap_or(Params::DEFAULT_T_COST),
            cost.parallelism.unwrap_or(Params::DEFAULT_P_COST),
            None,
        )
        .map_err(|e| PasswordError::Params(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "gods-dummy-password")?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    /// Verify a password against a stored hash
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        verify_password(password, hash)
    }

    /// Spend the cost of one verification without a real hash
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Hash a password using Argon2id with default parameters
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_with(&Argon2::default(), password)
}

/// Verify a password against a hash
///
/// The cost parameters are read from the PHC string itself, so hashes made
/// with any configured cost verify here. A hash that does not parse counts
/// as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Invalid hashing parameters: {0}")]
    Params(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordValidationError {
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one digit")]
    MissingDigit,
    #[error("Password must contain at least one special character (@$!%*?&)")]
    MissingSpecialChar,
    #[error("Password must be at least 8 characters long")]
    TooShort,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost {
            memory_kib: Some(1024),
            iterations: Some(1),
            parallelism: Some(1),
        })
        .expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher();
        let password = "Str0ng!Pw";
        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains(password));
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("Str0ng!Px", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = cheap_hasher();
        let first = hasher.hash("Str0ng!Pw").unwrap();
        let second = hasher.hash("Str0ng!Pw").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("Str0ng!Pw", &first));
        assert!(hasher.verify("Str0ng!Pw", &second));
    }

    #[test]
    fn test_default_cost_hash_verifies() {
        let hash = hash_password("Def4ult&Cost").unwrap();
        assert!(verify_password("Def4ult&Cost", &hash));
        assert!(cheap_hasher().verify("Def4ult&Cost", &hash));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("Str0ng!Pw", "not-a-phc-string"));
        assert!(!verify_password("Str0ng!Pw", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHasher::new(HashCost {
            memory_kib: Some(1),
            iterations: Some(0),
            parallelism: Some(1),
        });
        assert!(matches!(result, Err(PasswordError::Params(_))));
    }

    #[test]
    fn test_password_validation() {
        // No uppercase
        assert_eq!(
            validate_password_strength("str0ng!pw"),
            Err(PasswordValidationError::MissingUppercase)
        );

        // No lowercase
        assert_eq!(
            validate_password_strength("STR0NG!PW"),
            Err(PasswordValidationError::MissingLowercase)
        );

        // No digits
        assert_eq!(
            validate_password_strength("Strong!Pw"),
            Err(PasswordValidationError::MissingDigit)
        );

        // Special characters outside the accepted set do not count
        assert_eq!(
            validate_password_strength("Str0ng#Pw"),
            Err(PasswordValidationError::MissingSpecialChar)
        );

        // Too short
        assert_eq!(
            validate_password_strength("S0ng!Pw"),
            Err(PasswordValidationError::TooShort)
        );

        // Valid password
        assert!(validate_password_strength("Str0ng!Pw").is_ok());
        assert!(validate_password_strength("Aa1@aaaa").is_ok());
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Fails every rule: uppercase is reported
        assert_eq!(
            validate_password_strength(""),
            Err(PasswordValidationError::MissingUppercase)
        );

        // Lowercase and later rules fail
        assert_eq!(
            validate_password_strength("A"),
            Err(PasswordValidationError::MissingLowercase)
        );

        // Digit, special and length fail
        assert_eq!(
            validate_password_strength("Ab"),
            Err(PasswordValidationError::MissingDigit)
        );

        // Special and length fail
        assert_eq!(
            validate_password_strength("Ab1"),
            Err(PasswordValidationError::MissingSpecialChar)
        );

        // Only length fails
        assert_eq!(
            validate_password_strength("Ab1!"),
            Err(PasswordValidationError::TooShort)
        );
    }

    #[test]
    fn test_every_special_character_accepted() {
        for special in SPECIAL_CHARACTERS.chars() {
            let password = format!("Passw0rd{special}");
            assert!(
                validate_password_strength(&password).is_ok(),
                "{password} should be accepted"
            );
        }
    }

    #[test]
    fn test_no_upper_length_bound() {
        let long_password = "Aa1!".repeat(200);
        assert!(validate_password_strength(&long_password).is_ok());
    }
}
