//! crates/course_assistant_core/src/credentials.rs
//!
//! API key resolution. An explicitly configured key wins; otherwise the
//! provider's environment variable is read at call time.

use crate::domain::TextProvider;
use crate::error::{GenerationError, GenerationResult};

#[derive(Clone, Default)]
pub struct ApiKeys {
    openai: Option<String>,
    anthropic: Option<String>,
}

impl ApiKeys {
    pub fn new(openai: Option<String>, anthropic: Option<String>) -> Self {
        Self { openai, anthropic }
    }

    fn explicit(&self, provider: TextProvider) -> Option<&str> {
        match provider {
            TextProvider::OpenAi => self.openai.as_deref(),
            TextProvider::Anthropic => self.anthropic.as_deref(),
        }
    }

    /// Returns the key to use for `provider`, or a missing-credential error.
    pub fn resolve(&self, provider: TextProvider) -> GenerationResult<String> {
        self.explicit(provider)
            .map(str::to_string)
            .or_else(|| std::env::var(provider.env_var()).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingCredential {
                provider: provider.vendor_name(),
                env_var: provider.env_var(),
            })
    }
}

// Keys are never printed.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("openai", &self.openai.as_ref().map(|_| "***"))
            .field("anthropic", &self.anthropic.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn explicit_key_takes_precedence() {
        std::env::set_var("OPENAI_API_KEY", "from-env");
        let keys = ApiKeys::new(Some("explicit".to_string()), None);
        assert_eq!(keys.resolve(TextProvider::OpenAi).unwrap(), "explicit");
        std::env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    #[serial]
    fn falls_back_to_environment() {
        std::env::set_var("ANTHROPIC_API_KEY", "from-env");
        let keys = ApiKeys::default();
        assert_eq!(keys.resolve(TextProvider::Anthropic).unwrap(), "from-env");
        std::env::remove_var("ANTHROPIC_API_KEY");
    }

    #[test]
    #[serial]
    fn missing_key_names_the_variable() {
        std::env::remove_var("OPENAI_API_KEY");
        let err = ApiKeys::default().resolve(TextProvider::OpenAi).unwrap_err();
        match err {
            GenerationError::MissingCredential { env_var, .. } => {
                assert_eq!(env_var, "OPENAI_API_KEY")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
