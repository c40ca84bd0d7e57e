//! Generated logins for demo users and the demo guid.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::auth::{RETAIL_STORE_MANAGER_ROLE, SUPPLY_CHAIN_MANAGER_ROLE};
use crate::errors::ServiceError;

/// Length of the random part of generated emails, usernames and passwords
pub const TOKEN_LENGTH: usize = 10;

/// Kind of user a demo can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerKind {
    SupplyChain,
    RetailStore,
}

impl ManagerKind {
    pub fn role(self) -> &'static str {
        match self {
            ManagerKind::SupplyChain => SUPPLY_CHAIN_MANAGER_ROLE,
            ManagerKind::RetailStore => RETAIL_STORE_MANAGER_ROLE,
        }
    }

    fn email_prefix(self) -> &'static str {
        match self {
            ManagerKind::SupplyChain => "chris",
            ManagerKind::RetailStore => "ruth",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ManagerKind::SupplyChain => "Supply Chain Manager",
            ManagerKind::RetailStore => "Retail Store Manager",
        }
    }
}

/// Plaintext login for a user about to be created
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn generate(kind: ManagerKind) -> Self {
        let token = random_token();
        Self {
            email: format!("{}.{}@acme.com", kind.email_prefix(), token),
            username: format!("{} ({})", kind.title(), token),
            password: random_token(),
        }
    }
}

pub fn random_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// argon2id PHC string for `password`
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

/// Opaque, URL-safe identifier for a demo.
///
/// Salted argon2 digest of `"<id> <createdAt>"`; a fresh salt is drawn on
/// every call so two calls never agree.
pub fn make_demo_guid(id: i32, created_at: &DateTime<Utc>) -> Result<String, ServiceError> {
    // 8 MiB, one pass
    let params = Params::new(8 * 1024, 1, 1, Some(32))
        .map_err(|e| ServiceError::HashError(e.to_string()))?;
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    let input = format!("{} {}", id, created_at.to_rfc3339());
    let hash = hasher
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| ServiceError::HashError(e.to_string()))?;
    let output = hash
        .hash
        .ok_or_else(|| ServiceError::HashError("argon2 produced no output".to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(output.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(ManagerKind::SupplyChain, "chris.", "Supply Chain Manager (", "supplychainmanager")]
    #[case(ManagerKind::RetailStore, "ruth.", "Retail Store Manager (", "retailstoremanager")]
    fn credentials_follow_naming_scheme(
        #[case] kind: ManagerKind,
        #[case] email_prefix: &str,
        #[case] username_prefix: &str,
        #[case] role: &str,
    ) {
        let creds = Credentials::generate(kind);

        assert!(creds.email.starts_with(email_prefix));
        assert!(creds.email.ends_with("@acme.com"));
        assert!(creds.username.starts_with(username_prefix));
        assert!(creds.username.ends_with(')'));
        assert_eq!(creds.password.len(), TOKEN_LENGTH);
        assert_eq!(kind.role(), role);

        let email_token = &creds.email[email_prefix.len()..creds.email.len() - "@acme.com".len()];
        assert!(creds.username.contains(email_token));
    }

    #[test]
    fn random_tokens_are_alphanumeric() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"s3cret-pass", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn guid_is_url_safe_and_salted(id in 1i32..1_000_000, secs in 0i64..4_000_000_000) {
            let created_at = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
            let first = make_demo_guid(id, &created_at).unwrap();
            let second = make_demo_guid(id, &created_at).unwrap();

            prop_assert!(!first.is_empty());
            prop_assert!(first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            prop_assert_ne!(first, second);
        }
    }
}
