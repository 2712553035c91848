use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use marketpulse_common::{RawPlace, RecordSource};

use crate::providers::PlaceProvider;

/// Virtual-time allowance Chromium gets before the DOM is dumped. The maps
/// results panel populates from script, so an immediate dump would be empty.
const SETTLE_BUDGET: Duration = Duration::from_secs(5);

/// Hard guard on the whole Chromium process per navigation.
const PROCESS_GUARD: Duration = Duration::from_secs(30);

// --- Chrome session ---

/// A headless Chromium handle scoped to one scan run. Owns the temporary
/// profile directory; dropping the session removes it on every exit path.
pub struct ChromeSession {
    bin: String,
    profile: tempfile::TempDir,
}

impl ChromeSession {
    pub fn launch(bin: &str) -> Result<Self> {
        let profile = tempfile::tempdir().context("Failed to create Chrome profile dir")?;
        info!(bin, profile = %profile.path().display(), "Chrome session ready");
        Ok(Self {
            bin: bin.to_string(),
            profile,
        })
    }

    /// Navigate to a URL and return the settled DOM.
    pub async fn render(&self, url: &str) -> Result<String> {
        let result = tokio::time::timeout(
            PROCESS_GUARD,
            tokio::process::Command::new(&self.bin)
                .args([
                    "--headless",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                    &format!("--user-data-dir={}", self.profile.path().display()),
                    &format!("--virtual-time-budget={}", SETTLE_BUDGET.as_millis()),
                    "--dump-dom",
                    url,
                ])
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    anyhow::bail!("Chrome exited with error: {}", stderr.trim());
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Err(e)) => Err(e).context(format!("Failed to run Chrome for {url}")),
            Err(_) => anyhow::bail!(
                "Chrome timed out after {}s for {url}",
                PROCESS_GUARD.as_secs()
            ),
        }
    }
}

// --- Chrome place provider ---

pub struct ChromeProvider {
    session: ChromeSession,
}

impl ChromeProvider {
    pub fn new(session: ChromeSession) -> Self {
        info!("Using Chrome place provider (dump-dom + article extraction)");
        Self { session }
    }
}

#[async_trait]
impl PlaceProvider for ChromeProvider {
    async fn places(&self, query: &str) -> Result<Vec<RawPlace>> {
        let url = maps_search_url(query);
        info!(query, scraper = "chrome", "Rendering maps search");

        let html = self.session.render(&url).await?;
        if html.is_empty() {
            warn!(query, scraper = "chrome", "Empty DOM output");
            return Ok(Vec::new());
        }

        let places = places_from_dom(&html);
        info!(query, count = places.len(), "Extracted article listings");
        Ok(places)
    }

    fn source(&self) -> RecordSource {
        RecordSource::Chrome
    }

    // The settle budget already spaces navigations out.
    fn pause(&self) -> Duration {
        Duration::ZERO
    }
}

fn maps_search_url(query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://www.google.com/maps/search/{encoded}")
}

// --- DOM extraction ---

/// Parse every result article out of a dumped maps DOM. Listings that fail
/// to parse are skipped individually.
pub fn places_from_dom(html: &str) -> Vec<RawPlace> {
    article_segments(html)
        .into_iter()
        .filter_map(|segment| parse_article(&visible_text(segment)))
        .collect()
}

/// Each `role="article"` marker opens a result card; a segment starts after
/// the marker's enclosing tag and runs to the next marker, so nested markup
/// stays with its own card.
fn article_segments(html: &str) -> Vec<&str> {
    let marker = regex::Regex::new(r#"role\s*=\s*["']article["']"#).expect("valid regex");
    let matches: Vec<(usize, usize)> = marker
        .find_iter(html)
        .map(|m| (m.start(), m.end()))
        .collect();

    matches
        .iter()
        .enumerate()
        .filter_map(|(i, &(_, end))| {
            let body = end + html[end..].find('>')? + 1;
            let stop = matches.get(i + 1).map(|&(s, _)| s).unwrap_or(html.len());
            (body <= stop).then(|| &html[body..stop])
        })
        .collect()
}

/// Reduce an HTML fragment to its visible text, one line per block element.
fn visible_text(fragment: &str) -> String {
    let hidden = regex::Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>")
        .expect("valid regex");
    let blocks = regex::Regex::new(r"(?i)</?(div|p|li|h[1-6])[^>]*>|<br\s*/?>").expect("valid regex");
    let tags = regex::Regex::new(r"<[^>]+>").expect("valid regex");
    // Segments cut mid-document can end inside the next card's opening tag.
    let unterminated = regex::Regex::new(r"<[^>]*\z").expect("valid regex");

    let text = hidden.replace_all(fragment, " ");
    let text = blocks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");
    let text = unterminated.replace(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Line layout of a result card: line 0 is the place name; line 1 is the
/// rating row when it starts with a digit or '(', otherwise a category.
fn parse_article(text: &str) -> Option<RawPlace> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let name = lines.next()?;
    let mut place = RawPlace {
        title: Some(name.to_string()),
        ..RawPlace::default()
    };

    if let Some(line) = lines.next() {
        if looks_like_rating(line) {
            place.rating = leading_number(line);
        } else {
            place.category = Some(line.to_string());
        }
    }

    Some(place)
}

fn looks_like_rating(line: &str) -> bool {
    line.starts_with(|c: char| c.is_ascii_digit()) || line.starts_with('(')
}

fn leading_number(line: &str) -> Option<f64> {
    let digits: String = line
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_query() {
        assert_eq!(
            maps_search_url("textile shops in Kochi"),
            "https://www.google.com/maps/search/textile+shops+in+Kochi"
        );
    }

    #[test]
    fn articles_parse_name_and_rating() {
        let html = r#"
            <div role="article"><div class="title">Spice Bazaar</div><div><span>4.3</span><span>(210)</span></div></div>
            <div role="article"><div class="title">Corner Store</div><div>General store</div></div>
        "#;

        let places = places_from_dom(html);
        assert_eq!(places.len(), 2);

        assert_eq!(places[0].title.as_deref(), Some("Spice Bazaar"));
        assert_eq!(places[0].rating, Some(4.3));
        assert!(places[0].category.is_none());

        assert_eq!(places[1].title.as_deref(), Some("Corner Store"));
        assert!(places[1].rating.is_none());
        assert_eq!(places[1].category.as_deref(), Some("General store"));
    }

    #[test]
    fn review_count_only_line_is_not_a_category() {
        // A '(' opener marks the rating row even when the rating itself is missing.
        let html = r#"<div role="article"><div>Night Cafe</div><div>(88)</div></div>"#;

        let places = places_from_dom(html);
        assert_eq!(places.len(), 1);
        assert!(places[0].rating.is_none());
        assert!(places[0].category.is_none());
    }

    #[test]
    fn empty_article_is_skipped() {
        let html = r#"<div role="article"><script>var x = 1;</script></div>
            <div role="article"><div>Real Shop</div></div>"#;

        let places = places_from_dom(html);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].title.as_deref(), Some("Real Shop"));
    }

    #[test]
    fn dom_without_articles_yields_nothing() {
        assert!(places_from_dom("<html><body>Nothing here</body></html>").is_empty());
    }

    #[test]
    fn visible_text_strips_markup_and_decodes_entities() {
        let text = visible_text("<div>Tea &amp; Snacks</div><div>4.5</div>");
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, vec!["Tea & Snacks", "4.5"]);
    }

    #[test]
    fn leading_number_ignores_trailing_review_count() {
        assert_eq!(leading_number("4.5(1,234)"), Some(4.5));
        assert_eq!(leading_number("(1,234)"), None);
    }
}
