use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const TYPE_FIT_URL: &str = "https://type.fit/api/quotes";
const QUOTABLE_URL: &str = "https://api.quotable.io/quotes?limit=50";

const MAX_QUOTES: usize = 500;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub author: String,
    pub quote: String,
    pub motivation: bool,
}

#[derive(Debug, Serialize)]
pub struct QuotesPayload {
    pub quotes: Vec<Quote>,
    pub source: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

struct CacheEntry {
    quotes: Vec<Quote>,
    expires_at: Instant,
}

/// Quote sources tried in fixed order: bundled file, then type.fit, then
/// Quotable. Results are normalized, de-duplicated by quote text, capped,
/// and cached process-wide. The cache lock is held across the upstream
/// fetch so concurrent misses collapse into a single call.
pub struct QuoteService {
    http: reqwest::Client,
    quotes_file: Option<PathBuf>,
    typefit_url: String,
    quotable_url: String,
    ttl: Duration,
    cache: Mutex<Option<CacheEntry>>,
}

impl QuoteService {
    pub fn new(quotes_file: Option<PathBuf>, ttl: Duration) -> Self {
        Self::with_endpoints(quotes_file, ttl, TYPE_FIT_URL.into(), QUOTABLE_URL.into())
    }

    fn with_endpoints(
        quotes_file: Option<PathBuf>,
        ttl: Duration,
        typefit_url: String,
        quotable_url: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to build quotes HTTP client");

        Self {
            http,
            quotes_file,
            typefit_url,
            quotable_url,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> QuotesPayload {
        let mut cache = self.cache.lock().await;

        let now = Instant::now();
        if let Some(entry) = cache.as_ref() {
            if entry.expires_at > now {
                return QuotesPayload {
                    quotes: entry.quotes.clone(),
                    source: "cache".into(),
                    stale: false,
                };
            }
        }

        // Cache miss (or expired). The lock stays held here, so a second
        // concurrent miss waits and then reads the freshly stored entry.
        match self.fetch_chain().await {
            Some((quotes, source)) => {
                *cache = Some(CacheEntry {
                    quotes: quotes.clone(),
                    expires_at: Instant::now() + self.ttl,
                });
                QuotesPayload {
                    quotes,
                    source: source.into(),
                    stale: false,
                }
            }
            None => {
                // Every source failed. Prefer expired cached data over the
                // canned defaults; never surface a 500 for quotes.
                if let Some(entry) = cache.as_ref() {
                    tracing::warn!("Quote sources unavailable; serving expired cache");
                    return QuotesPayload {
                        quotes: entry.quotes.clone(),
                        source: "cache".into(),
                        stale: true,
                    };
                }
                tracing::warn!("Quote sources unavailable and cache empty; serving defaults");
                QuotesPayload {
                    quotes: default_quotes(),
                    source: "default".into(),
                    stale: false,
                }
            }
        }
    }

    /// Try each source in priority order; `None` when all failed or came
    /// back empty.
    async fn fetch_chain(&self) -> Option<(Vec<Quote>, &'static str)> {
        if let Some(path) = self.quotes_file.clone() {
            match load_local(&path).await {
                Ok(quotes) if !quotes.is_empty() => return Some((quotes, "local")),
                Ok(_) => tracing::debug!(path = %path.display(), "Local quote file empty"),
                Err(e) => tracing::debug!(error = %e, "Local quote file unreadable"),
            }
        }

        match self.fetch_typefit().await {
            Ok(quotes) if !quotes.is_empty() => return Some((quotes, "type.fit")),
            Ok(_) => tracing::debug!("type.fit returned no quotes"),
            Err(e) => tracing::debug!(error = %e, "type.fit fetch failed"),
        }

        match self.fetch_quotable().await {
            Ok(quotes) if !quotes.is_empty() => return Some((quotes, "quotable")),
            Ok(_) => tracing::debug!("Quotable returned no quotes"),
            Err(e) => tracing::debug!(error = %e, "Quotable fetch failed"),
        }

        None
    }

    async fn fetch_typefit(&self) -> anyhow::Result<Vec<Quote>> {
        let response = self.http.get(&self.typefit_url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("type.fit returned {}", response.status());
        }
        let raw: Vec<TypeFitQuote> = response.json().await?;
        Ok(normalize_typefit(raw))
    }

    async fn fetch_quotable(&self) -> anyhow::Result<Vec<Quote>> {
        let response = self.http.get(&self.quotable_url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Quotable returned {}", response.status());
        }
        let raw: QuotableResponse = response.json().await?;
        Ok(normalize_quotable(raw))
    }
}

async fn load_local(path: &Path) -> anyhow::Result<Vec<Quote>> {
    let bytes = tokio::fs::read(path).await?;
    let quotes: Vec<Quote> = serde_json::from_slice(&bytes)?;
    Ok(dedupe_and_cap(quotes))
}

#[derive(Debug, Deserialize)]
struct TypeFitQuote {
    text: Option<String>,
    author: Option<String>,
}

fn normalize_typefit(raw: Vec<TypeFitQuote>) -> Vec<Quote> {
    let quotes = raw
        .into_iter()
        .filter_map(|q| {
            let text = q.text?;
            if text.trim().is_empty() {
                return None;
            }
            Some(Quote {
                author: q.author.unwrap_or_else(|| "Unknown".into()),
                quote: text,
                motivation: false,
            })
        })
        .collect();
    dedupe_and_cap(quotes)
}

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    results: Vec<QuotableQuote>,
}

#[derive(Debug, Deserialize)]
struct QuotableQuote {
    content: String,
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

fn normalize_quotable(raw: QuotableResponse) -> Vec<Quote> {
    let quotes = raw
        .results
        .into_iter()
        .filter(|q| !q.content.trim().is_empty())
        .map(|q| Quote {
            motivation: q
                .tags
                .iter()
                .any(|t| t.eq_ignore_ascii_case("motivational") || t.eq_ignore_ascii_case("inspirational")),
            author: q.author.unwrap_or_else(|| "Unknown".into()),
            quote: q.content,
        })
        .collect();
    dedupe_and_cap(quotes)
}

/// Drop exact-duplicate quote texts within a batch and cap the result.
fn dedupe_and_cap(quotes: Vec<Quote>) -> Vec<Quote> {
    let mut seen = HashSet::new();
    quotes
        .into_iter()
        .filter(|q| seen.insert(q.quote.clone()))
        .take(MAX_QUOTES)
        .collect()
}

/// Served when every source is empty and nothing is cached.
pub fn default_quotes() -> Vec<Quote> {
    [
        ("Maya Angelou", "Love recognizes no barriers."),
        ("Lao Tzu", "Being deeply loved by someone gives you strength, while loving someone deeply gives you courage."),
        ("A. A. Milne", "If you live to be a hundred, I want to live to be a hundred minus one day so I never have to live without you."),
        ("Victor Hugo", "The greatest happiness of life is the conviction that we are loved."),
        ("Aristotle", "Love is composed of a single soul inhabiting two bodies."),
        ("Dr. Seuss", "You know you're in love when you can't fall asleep because reality is finally better than your dreams."),
        ("Audrey Hepburn", "The best thing to hold onto in life is each other."),
        ("Leo Tolstoy", "We are asleep until we fall in love."),
        ("Rumi", "Lovers don't finally meet somewhere. They're in each other all along."),
        ("Antoine de Saint-Exupery", "Love does not consist of gazing at each other, but in looking outward together in the same direction."),
    ]
    .into_iter()
    .map(|(author, quote)| Quote {
        author: author.into(),
        quote: quote.into(),
        motivation: true,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_service(quotes_file: Option<PathBuf>, ttl: Duration) -> QuoteService {
        // Ports that refuse connections immediately; no real network I/O.
        QuoteService::with_endpoints(
            quotes_file,
            ttl,
            "http://127.0.0.1:1/api/quotes".into(),
            "http://127.0.0.1:1/quotes".into(),
        )
    }

    fn temp_quote_file(name: &str, quotes: &[Quote]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("duet-quotes-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, serde_json::to_vec(quotes).unwrap()).unwrap();
        path
    }

    #[test]
    fn default_list_has_ten_unique_quotes() {
        let quotes = default_quotes();
        assert_eq!(quotes.len(), 10);
        assert_eq!(dedupe_and_cap(quotes.clone()).len(), 10);
    }

    #[test]
    fn dedupe_drops_repeats_and_caps() {
        let mut quotes = Vec::new();
        for i in 0..600 {
            quotes.push(Quote {
                author: "A".into(),
                quote: format!("q{}", i % 550),
                motivation: false,
            });
        }
        let result = dedupe_and_cap(quotes);
        assert_eq!(result.len(), MAX_QUOTES);
    }

    #[test]
    fn typefit_shape_normalizes() {
        let raw: Vec<TypeFitQuote> = serde_json::from_str(
            r#"[
                {"text": "first", "author": "Someone"},
                {"text": "first", "author": "Someone Else"},
                {"text": "", "author": "Empty"},
                {"text": "second", "author": null}
            ]"#,
        )
        .unwrap();

        let quotes = normalize_typefit(raw);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].quote, "first");
        assert_eq!(quotes[1].author, "Unknown");
        assert!(!quotes[0].motivation);
    }

    #[test]
    fn quotable_shape_normalizes() {
        let raw: QuotableResponse = serde_json::from_str(
            r#"{"results": [
                {"content": "keep going", "author": "Coach", "tags": ["Motivational"]},
                {"content": "plain", "author": "Author"}
            ]}"#,
        )
        .unwrap();

        let quotes = normalize_quotable(raw);
        assert_eq!(quotes.len(), 2);
        assert!(quotes[0].motivation);
        assert!(!quotes[1].motivation);
    }

    #[tokio::test]
    async fn all_sources_down_serves_defaults() {
        let service = unreachable_service(None, Duration::from_secs(3600));
        let payload = service.get().await;
        assert_eq!(payload.source, "default");
        assert_eq!(payload.quotes, default_quotes());
        assert!(!payload.stale);
    }

    #[tokio::test]
    async fn local_file_then_cache_hit() {
        let quotes = vec![
            Quote { author: "A".into(), quote: "one".into(), motivation: false },
            Quote { author: "B".into(), quote: "two".into(), motivation: true },
        ];
        let path = temp_quote_file("hit", &quotes);
        let service = unreachable_service(Some(path.clone()), Duration::from_secs(3600));

        let first = service.get().await;
        assert_eq!(first.source, "local");
        assert_eq!(first.quotes, quotes);

        let second = service.get().await;
        assert_eq!(second.source, "cache");
        assert_eq!(second.quotes, first.quotes);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn expired_cache_survives_source_outage() {
        let quotes = vec![Quote { author: "A".into(), quote: "one".into(), motivation: false }];
        let path = temp_quote_file("stale", &quotes);
        let service = unreachable_service(Some(path.clone()), Duration::ZERO);

        let first = service.get().await;
        assert_eq!(first.source, "local");

        // Entry expires immediately; the file disappears before the refetch.
        std::fs::remove_file(&path).unwrap();

        let second = service.get().await;
        assert_eq!(second.source, "cache");
        assert!(second.stale);
        assert_eq!(second.quotes, quotes);
    }
}
