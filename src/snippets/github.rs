//! GitHub code-search snippet source

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{CodeSnippet, SnippetError, SnippetSource};

/// Lines kept from the chosen file
const EXCERPT_LINES: usize = 15;

/// Only the first few search hits are considered
const PICK_WINDOW: usize = 10;

/// Search result pages sampled
const MAX_PAGE: u32 = 5;

const USER_AGENT: &str = concat!("code-battle-royale/", env!("CARGO_PKG_VERSION"));

/// Prefixes that mark a good place to start an excerpt
const DECLARATION_PREFIXES: &[&str] = &["function", "class", "def", "const ", "pub fn", "export "];

/// Line prefixes treated as comments and dropped
const COMMENT_PREFIXES: &[&str] = &["//", "#", "*", "/*"];

#[derive(Debug, Clone, Copy)]
struct RepoTarget {
    owner: &'static str,
    repo: &'static str,
    language: &'static str,
    extension: &'static str,
}

const POPULAR_REPOS: &[RepoTarget] = &[
    RepoTarget {
        owner: "facebook",
        repo: "react",
        language: "javascript",
        extension: "js",
    },
    RepoTarget {
        owner: "python",
        repo: "cpython",
        language: "python",
        extension: "py",
    },
    RepoTarget {
        owner: "microsoft",
        repo: "vscode",
        language: "typescript",
        extension: "ts",
    },
    RepoTarget {
        owner: "tensorflow",
        repo: "tensorflow",
        language: "python",
        extension: "py",
    },
    RepoTarget {
        owner: "django",
        repo: "django",
        language: "python",
        extension: "py",
    },
    RepoTarget {
        owner: "nodejs",
        repo: "node",
        language: "javascript",
        extension: "js",
    },
    RepoTarget {
        owner: "golang",
        repo: "go",
        language: "go",
        extension: "go",
    },
    RepoTarget {
        owner: "rust-lang",
        repo: "rust",
        language: "rust",
        extension: "rs",
    },
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// A code-search hit
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub name: String,
    /// Blob API URL, doubles as the snippet origin
    pub git_url: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: String,
}

/// Snippet source backed by the GitHub REST API
pub struct GithubSource {
    client: Client,
    api_url: String,
    token: Option<String>,
    rng: Mutex<ChaCha8Rng>,
}

impl GithubSource {
    pub fn new(api_url: impl Into<String>, token: Option<String>, seed: u64) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");

        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SnippetError> {
        let response = self.request(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SnippetError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SnippetSource for GithubSource {
    async fn fetch(&self, exclude: &[String]) -> Result<CodeSnippet, SnippetError> {
        let (target, page, pick_seed) = {
            let mut rng = self.rng.lock();
            let target = POPULAR_REPOS[rng.gen_range(0..POPULAR_REPOS.len())];
            (target, rng.gen_range(1..=MAX_PAGE), rng.gen::<u64>())
        };
        let mut pick_rng = ChaCha8Rng::seed_from_u64(pick_seed);

        let url = format!(
            "{}/search/code?q=extension:{}+repo:{}/{}+size:>2000&page={}",
            self.api_url, target.extension, target.owner, target.repo, page
        );
        debug!(repo = target.repo, page, "Searching GitHub for a snippet");

        let search: SearchResponse = self.get_json(&url).await?;
        let item = choose_item(&search.items, exclude, &mut pick_rng)
            .cloned()
            .ok_or(SnippetError::NoResults)?;

        let blob: BlobResponse = self.get_json(&item.git_url).await?;
        if !blob.encoding.is_empty() && blob.encoding != "base64" {
            return Err(SnippetError::Decode(format!(
                "unsupported encoding {}",
                blob.encoding
            )));
        }
        let text = decode_blob(&blob.content)?;

        CodeSnippet {
            code: extract_excerpt(&text, &mut pick_rng),
            language: target.language.to_string(),
            repo: format!("{}/{}", target.owner, target.repo),
            file_name: item.name,
            origin: item.git_url,
        }
        .validate()
    }
}

/// Choose a hit among the first few, preferring origins not yet used
pub fn choose_item<'a, R: Rng + ?Sized>(
    items: &'a [SearchItem],
    exclude: &[String],
    rng: &mut R,
) -> Option<&'a SearchItem> {
    let fresh: Vec<&SearchItem> = items
        .iter()
        .filter(|item| !exclude.contains(&item.git_url))
        .collect();

    let candidates: Vec<&SearchItem> = if fresh.is_empty() {
        items.iter().collect()
    } else {
        fresh
    };

    let window = candidates.len().min(PICK_WINDOW);
    candidates[..window].choose(rng).copied()
}

/// Decode a base64 blob body (GitHub wraps it at 60 columns)
pub fn decode_blob(content: &str) -> Result<String, SnippetError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| SnippetError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SnippetError::Decode(e.to_string()))
}

/// Cut a short, comment-free excerpt out of a source file.
///
/// Starts at the first declaration-looking line, or at a random offset when
/// there is none.
pub fn extract_excerpt<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    let start = lines
        .iter()
        .position(|line| {
            let t = line.trim();
            DECLARATION_PREFIXES.iter().any(|p| t.starts_with(p))
        })
        .unwrap_or_else(|| rng.gen_range(0..lines.len().saturating_sub(EXCERPT_LINES).max(1)));

    lines
        .iter()
        .skip(start)
        .take(EXCERPT_LINES)
        .filter(|line| {
            let t = line.trim();
            !t.is_empty() && !COMMENT_PREFIXES.iter().any(|p| t.starts_with(p))
        })
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
        .replace('\t', "  ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> SearchItem {
        SearchItem {
            name: format!("{url}.rs"),
            git_url: url.to_string(),
        }
    }

    #[test]
    fn popular_repos_pair_language_with_extension() {
        assert_eq!(POPULAR_REPOS.len(), 8);
        for target in POPULAR_REPOS {
            let expected = match target.language {
                "javascript" => "js",
                "typescript" => "ts",
                "python" => "py",
                "rust" => "rs",
                "go" => "go",
                other => panic!("unexpected language {other}"),
            };
            assert_eq!(target.extension, expected, "{}/{}", target.owner, target.repo);
        }
    }

    #[test]
    fn excerpt_starts_at_declaration_and_drops_comments() {
        let text = "use std::io;\n\n// helper\npub fn read() {\n\t// inner comment\n\tlet x = 1;\n\n\tx\n}\n";
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(extract_excerpt(text, &mut rng), "pub fn read() {\n  let x = 1;\n  x\n}");
    }

    #[test]
    fn excerpt_is_capped_at_fifteen_lines() {
        let text: String = (0..40).map(|i| format!("def f{i}(): pass\n")).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let excerpt = extract_excerpt(&text, &mut rng);
        assert_eq!(excerpt.lines().count(), 15);
        assert!(excerpt.starts_with("def f0"));
    }

    #[test]
    fn excerpt_without_declaration_uses_random_offset() {
        let text: String = (0..10).map(|i| format!("x{i} = {i}\n")).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // Short files always start at the top
        assert!(extract_excerpt(&text, &mut rng).starts_with("x0 = 0"));
    }

    #[test]
    fn decode_blob_handles_wrapped_base64() {
        let encoded = STANDARD.encode("fn main() {}\n");
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        assert_eq!(decode_blob(&wrapped).unwrap(), "fn main() {}\n");
        assert!(matches!(decode_blob("@@@"), Err(SnippetError::Decode(_))));
    }

    #[test]
    fn choose_item_skips_excluded() {
        let items = vec![item("a"), item("b")];
        let exclude = vec!["a".to_string()];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(choose_item(&items, &exclude, &mut rng).unwrap().git_url, "b");
        }
    }

    #[test]
    fn choose_item_reuses_when_all_excluded() {
        let items = vec![item("a")];
        let exclude = vec!["a".to_string()];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(choose_item(&items, &exclude, &mut rng).unwrap().git_url, "a");
        assert!(choose_item(&[], &exclude, &mut rng).is_none());
    }
}
