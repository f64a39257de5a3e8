//! Bundled snippets used when remote fetching fails

use rand::seq::SliceRandom;
use rand::Rng;

use super::CodeSnippet;

const BUNDLED: &[(&str, &str, &str, &str, &str)] = &[
    (
        "pub fn binary_search(items: &[i32], needle: i32) -> Option<usize> {\n  let (mut lo, mut hi) = (0, items.len());\n  while lo < hi {\n    let mid = lo + (hi - lo) / 2;\n    match items[mid].cmp(&needle) {\n      Ordering::Less => lo = mid + 1,\n      Ordering::Greater => hi = mid,\n      Ordering::Equal => return Some(mid),\n    }\n  }\n  None\n}",
        "rust",
        "rust-lang/rust",
        "search.rs",
        "fallback-1",
    ),
    (
        "def chunked(iterable, size):\n    batch = []\n    for item in iterable:\n        batch.append(item)\n        if len(batch) == size:\n            yield batch\n            batch = []\n    if batch:\n        yield batch",
        "python",
        "python/cpython",
        "batching.py",
        "fallback-2",
    ),
    (
        "export function debounce(fn, wait) {\n  let timer = null;\n  return (...args) => {\n    clearTimeout(timer);\n    timer = setTimeout(() => fn(...args), wait);\n  };\n}",
        "javascript",
        "nodejs/node",
        "debounce.js",
        "fallback-3",
    ),
];

/// Fixed local pool of snippets
#[derive(Debug, Clone)]
pub struct FallbackPool {
    snippets: Vec<CodeSnippet>,
}

impl FallbackPool {
    /// The pool shipped with the game
    pub fn bundled() -> Self {
        let snippets = BUNDLED
            .iter()
            .map(|(code, language, repo, file_name, origin)| CodeSnippet {
                code: (*code).to_string(),
                language: (*language).to_string(),
                repo: (*repo).to_string(),
                file_name: (*file_name).to_string(),
                origin: (*origin).to_string(),
            })
            .collect();
        Self { snippets }
    }

    /// Pick a random entry, preferring ones whose origin is not excluded.
    /// Falls back to any entry once every origin has been used.
    pub fn pick<R: Rng + ?Sized>(&self, exclude: &[String], rng: &mut R) -> CodeSnippet {
        let fresh: Vec<&CodeSnippet> = self
            .snippets
            .iter()
            .filter(|s| !exclude.contains(&s.origin))
            .collect();

        let choice = if fresh.is_empty() {
            self.snippets.choose(rng)
        } else {
            fresh.choose(rng).copied()
        };

        // The bundled pool is never empty
        choice.cloned().unwrap_or_else(|| Self::bundled().snippets[0].clone())
    }
}

impl Default for FallbackPool {
    fn default() -> Self {
        Self::bundled()
    }
}
