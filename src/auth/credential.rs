use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;
use std::sync::RwLock;
use tracing::{debug, info};

/// Claims the client looks at. The token is never verified client side.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    #[allow(dead_code)]
    exp: Option<u64>,
}

#[derive(Debug, Default)]
struct CredentialState {
    token: Option<String>,
    generation: u64,
}

/// Holds the bearer credential the remote source authenticates with.
///
/// The generation counter bumps on every change so in-flight work can tell
/// whether the session it started under is still the current one.
#[derive(Debug, Default)]
pub struct CredentialStore {
    state: RwLock<CredentialState>,
}

impl CredentialStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            state: RwLock::new(CredentialState {
                token: token.filter(|t| !t.trim().is_empty()),
                generation: 0,
            }),
        }
    }

    /// Install a new credential and return the new generation.
    pub fn set(&self, token: impl Into<String>) -> u64 {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.token = Some(token.into());
        state.generation += 1;
        info!("Credential set (generation {})", state.generation);
        state.generation
    }

    /// Remove the credential, returning the one that was held.
    ///
    /// Only the first of several concurrent callers gets `Some`.
    pub fn take(&self) -> Option<String> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let previous = state.token.take();
        if previous.is_some() {
            state.generation += 1;
            info!("Credential discarded (generation {})", state.generation);
        }
        previous
    }

    pub fn clear(&self) {
        let _ = self.take();
    }

    pub fn generation(&self) -> u64 {
        self.state.read().unwrap_or_else(|e| e.into_inner()).generation
    }

    /// The usable token, if any. An expired JWT counts as missing.
    pub fn current(&self) -> Result<String, CredentialError> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let token = state.token.as_ref().ok_or(CredentialError::Missing)?;
        if is_expired(token) {
            return Err(CredentialError::Expired);
        }
        Ok(token.clone())
    }

    pub fn is_present(&self) -> bool {
        self.current().is_ok()
    }
}

/// Checks the `exp` claim of JWT credentials. Opaque tokens never expire here.
fn is_expired(token: &str) -> bool {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(_) => false,
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => true,
            _ => {
                debug!("Credential is not a readable JWT, treating as opaque");
                false
            }
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    Missing,
    Expired,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Missing => write!(f, "No credential is set"),
            CredentialError::Expired => write!(f, "Credential has expired"),
        }
    }
}

impl std::error::Error for CredentialError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use std::sync::Arc;
    use std::thread;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    fn token_expiring_in(offset: Duration) -> String {
        let now = Utc::now();
        let claims = TestClaims {
            sub: "user-1".to_string(),
            exp: (now + offset).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test_secret".as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_credential() {
        let store = CredentialStore::new(None);
        assert_eq!(store.current(), Err(CredentialError::Missing));
        assert!(!store.is_present());
    }

    #[test]
    fn test_blank_initial_token_is_ignored() {
        let store = CredentialStore::new(Some("  ".to_string()));
        assert!(!store.is_present());
    }

    #[test]
    fn test_opaque_token_is_accepted() {
        let store = CredentialStore::new(Some("opaque-token".to_string()));
        assert_eq!(store.current().unwrap(), "opaque-token");
    }

    #[test]
    fn test_valid_jwt_is_accepted() {
        let token = token_expiring_in(Duration::hours(24));
        let store = CredentialStore::new(Some(token.clone()));
        assert_eq!(store.current().unwrap(), token);
    }

    #[test]
    fn test_expired_jwt_is_rejected() {
        let store = CredentialStore::new(Some(token_expiring_in(Duration::hours(-1))));
        assert_eq!(store.current(), Err(CredentialError::Expired));
        assert!(!store.is_present());
    }

    #[test]
    fn test_generation_tracks_changes() {
        let store = CredentialStore::new(None);
        assert_eq!(store.generation(), 0);
        assert_eq!(store.set("a"), 1);
        assert_eq!(store.set("b"), 2);
        store.clear();
        assert_eq!(store.generation(), 3);
        // clearing an empty store is not a change
        store.clear();
        assert_eq!(store.generation(), 3);
    }

    #[test]
    fn test_take_returns_token_once() {
        let store = Arc::new(CredentialStore::new(Some("token".to_string())));

        let mut handles = vec![];
        for _ in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || store.take().is_some()));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(!store.is_present());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(CredentialError::Missing.to_string(), "No credential is set");
        assert_eq!(CredentialError::Expired.to_string(), "Credential has expired");
    }
}
