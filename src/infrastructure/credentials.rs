// Credential source backed by configuration
use crate::application::dashboard_repository::CredentialSource;

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Blank tokens count as signed out.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_absent() {
        assert!(StaticCredentials::new(Some("  ".to_string())).token().is_none());
        assert!(StaticCredentials::new(None).token().is_none());
        assert_eq!(
            StaticCredentials::new(Some("abc".to_string())).token().as_deref(),
            Some("abc")
        );
    }
}
