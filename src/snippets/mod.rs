//! Snippet supply - the text the player races to type

pub mod fallback;
pub mod github;
pub mod supplier;

use async_trait::async_trait;

pub use fallback::FallbackPool;
pub use github::GithubSource;
pub use supplier::SnippetSupplier;

/// Shortest snippet accepted from a remote source
pub const MIN_SNIPPET_LEN: usize = 50;

/// A typing target. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub code: String,
    /// Declared language tag
    pub language: String,
    /// Repository the snippet came from (`owner/name`)
    pub repo: String,
    /// Display filename
    pub file_name: String,
    /// Opaque identifier used to avoid repeats
    pub origin: String,
}

impl CodeSnippet {
    /// Reject snippets too small to be worth a round
    pub fn validate(self) -> Result<Self, SnippetError> {
        let len = self.code.trim().chars().count();
        if len < MIN_SNIPPET_LEN {
            return Err(SnippetError::TooShort(len));
        }
        Ok(self)
    }
}

/// A remote provider of snippets
#[async_trait]
pub trait SnippetSource: Send + Sync {
    /// Fetch a snippet, avoiding `exclude` origins when alternatives exist
    async fn fetch(&self, exclude: &[String]) -> Result<CodeSnippet, SnippetError>;
}

/// Snippet fetch errors
#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Search returned no files")]
    NoResults,

    #[error("Failed to decode file contents: {0}")]
    Decode(String),

    #[error("Snippet too short ({0} chars)")]
    TooShort(usize),

    #[error("Local fetch quota exhausted")]
    RateLimited,

    #[error("Remote snippets disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(code: &str) -> CodeSnippet {
        CodeSnippet {
            code: code.to_string(),
            language: "rust".to_string(),
            repo: "rust-lang/rust".to_string(),
            file_name: "lib.rs".to_string(),
            origin: "origin".to_string(),
        }
    }

    #[test]
    fn short_snippets_are_rejected() {
        assert!(matches!(
            snippet("fn f() {}").validate(),
            Err(SnippetError::TooShort(9))
        ));
        assert!(matches!(snippet("   ").validate(), Err(SnippetError::TooShort(0))));
    }

    #[test]
    fn long_snippets_pass() {
        let code = "pub fn add(a: i32, b: i32) -> i32 {\n    a.wrapping_add(b)\n}";
        assert!(snippet(code).validate().is_ok());
    }
}
