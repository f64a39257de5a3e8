//! Snippet supplier - remote source with local fallback
//!
//! Never fails: any remote error (network, API limit, malformed or tiny
//! content, local quota) degrades to a pick from the bundled pool.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::util::rate_limit::{create_limiter_per_minute, Limiter};

use super::{CodeSnippet, FallbackPool, SnippetError, SnippetSource};

pub struct SnippetSupplier {
    source: Option<Arc<dyn SnippetSource>>,
    pool: FallbackPool,
    limiter: Arc<Limiter>,
    rng: Mutex<ChaCha8Rng>,
}

impl SnippetSupplier {
    /// Supplier backed by a remote source, throttled to `fetches_per_minute`
    pub fn new(source: Arc<dyn SnippetSource>, fetches_per_minute: u32, seed: u64) -> Self {
        Self {
            source: Some(source),
            pool: FallbackPool::bundled(),
            limiter: create_limiter_per_minute(fetches_per_minute),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Supplier that only serves the bundled pool
    pub fn offline(seed: u64) -> Self {
        Self {
            source: None,
            pool: FallbackPool::bundled(),
            limiter: create_limiter_per_minute(1),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Fetch the next snippet, avoiding `exclude` origins where possible
    pub async fn fetch_next(&self, exclude: &[String]) -> CodeSnippet {
        match self.try_remote(exclude).await {
            Ok(snippet) => {
                debug!(origin = %snippet.origin, "Fetched remote snippet");
                snippet
            }
            Err(SnippetError::Disabled) => self.fallback(exclude),
            Err(e) => {
                warn!(error = %e, "Snippet fetch failed, using bundled pool");
                self.fallback(exclude)
            }
        }
    }

    /// Pick from the bundled pool
    pub fn fallback(&self, exclude: &[String]) -> CodeSnippet {
        self.pool.pick(exclude, &mut *self.rng.lock())
    }

    async fn try_remote(&self, exclude: &[String]) -> Result<CodeSnippet, SnippetError> {
        let source = self.source.as_ref().ok_or(SnippetError::Disabled)?;

        if self.limiter.check().is_err() {
            return Err(SnippetError::RateLimited);
        }

        source.fetch(exclude).await?.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        code: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnippetSource for FixedSource {
        async fn fetch(&self, _exclude: &[String]) -> Result<CodeSnippet, SnippetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CodeSnippet {
                code: self.code.to_string(),
                language: "rust".to_string(),
                repo: "rust-lang/rust".to_string(),
                file_name: "remote.rs".to_string(),
                origin: "remote-1".to_string(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SnippetSource for FailingSource {
        async fn fetch(&self, _exclude: &[String]) -> Result<CodeSnippet, SnippetError> {
            Err(SnippetError::Api {
                status: 403,
                body: "rate limited".to_string(),
            })
        }
    }

    const LONG_CODE: &str = "pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {\n    v.max(lo).min(hi)\n}";

    #[test]
    fn remote_snippet_is_returned() {
        let source = Arc::new(FixedSource { code: LONG_CODE, calls: AtomicUsize::new(0) });
        let supplier = SnippetSupplier::new(source, 10, 1);
        let snippet = tokio_test::block_on(supplier.fetch_next(&[]));
        assert_eq!(snippet.origin, "remote-1");
    }

    #[test]
    fn failure_falls_back_to_unused_pool_entry() {
        let supplier = SnippetSupplier::new(Arc::new(FailingSource), 10, 1);
        let exclude = vec!["fallback-1".to_string(), "fallback-2".to_string()];
        let snippet = tokio_test::block_on(supplier.fetch_next(&exclude));
        assert_eq!(snippet.origin, "fallback-3");
    }

    #[test]
    fn too_short_remote_content_falls_back() {
        let source = Arc::new(FixedSource { code: "x = 1", calls: AtomicUsize::new(0) });
        let supplier = SnippetSupplier::new(source, 10, 1);
        let snippet = tokio_test::block_on(supplier.fetch_next(&[]));
        assert!(snippet.origin.starts_with("fallback-"));
    }

    #[test]
    fn quota_exhaustion_skips_remote() {
        let source = Arc::new(FixedSource { code: LONG_CODE, calls: AtomicUsize::new(0) });
        let supplier = SnippetSupplier::new(source.clone(), 1, 1);
        let first = tokio_test::block_on(supplier.fetch_next(&[]));
        let second = tokio_test::block_on(supplier.fetch_next(&[]));
        assert_eq!(first.origin, "remote-1");
        assert!(second.origin.starts_with("fallback-"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn offline_supplier_serves_pool() {
        let supplier = SnippetSupplier::offline(4);
        let snippet = tokio_test::block_on(supplier.fetch_next(&[]));
        assert!(snippet.origin.starts_with("fallback-"));
    }
}
