// extractor.rs
use crate::scraper::models::ListingRecord;
use crate::scraper::price::{has_price_signal, normalize_price};
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Listing anchors, most specific first.
const ANCHOR_PATTERNS: &[(&str, &str)] = &[
    ("listing-link", r#"a[data-testid="listing-link"]"#),
    ("aria-listing-path", r#"a[aria-label][href*="/v-"]"#),
];

/// Price-bearing elements inside a card, in priority order.
const PRICE_PATTERNS: &[&str] = &[
    r#"[data-testid="listing-price"]"#,
    r#"span[data-testid="ad-price"]"#,
    "div.price",
    "span.price",
    "p.price",
];

/// Number of `span`s after the anchor scanned when a card has no price element at all.
const PRICE_LOOKAHEAD: usize = 4;

/// Gallery thumbnails carry the ad's aria-label pattern but are not ads.
const NOISE_TITLE_PREFIXES: &[&str] = &["open the picture"];

/// Href fragments that mark a non-listing link under the union policy.
const NON_LISTING_MARKERS: &[&str] = &["imageIndex=", "gallery="];

/// How the anchor matchers are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Use the first matcher that finds anything; later ones are never consulted.
    #[default]
    FirstMatch,
    /// Union every matcher, dropping anchors whose href has a non-listing marker.
    UnionExcluding,
}

/// One structural pattern for locating listing anchors.
pub struct AnchorMatcher {
    name: &'static str,
    selector: Selector,
}

impl AnchorMatcher {
    fn new(name: &'static str, pattern: &str) -> Result<Self, ScraperError> {
        let selector =
            Selector::parse(pattern).map_err(|e| ScraperError::HtmlParse(e.to_string()))?;
        Ok(Self { name, selector })
    }

    fn matches<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selector).collect()
    }
}

pub struct ListingExtractor {
    origin: Url,
    origin_prefix: String,
    policy: SelectionPolicy,
    matchers: Vec<AnchorMatcher>,
    price_selectors: Vec<Selector>,
}

impl ListingExtractor {
    /// `site` is any URL on the marketplace; only its scheme and host are kept.
    pub fn new(site: &Url, policy: SelectionPolicy) -> Result<Self, ScraperError> {
        if !matches!(site.scheme(), "http" | "https") || site.host_str().is_none() {
            return Err(ScraperError::Config(format!(
                "site URL must be http(s) with a host: {site}"
            )));
        }

        let origin_prefix = site.origin().ascii_serialization();
        let origin = Url::parse(&origin_prefix).map_err(|e| ScraperError::Config(e.to_string()))?;

        let matchers = ANCHOR_PATTERNS
            .iter()
            .map(|&(name, pattern)| AnchorMatcher::new(name, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let price_selectors = PRICE_PATTERNS
            .iter()
            .map(|p| Selector::parse(p).map_err(|e| ScraperError::HtmlParse(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            origin,
            origin_prefix,
            policy,
            matchers,
            price_selectors,
        })
    }

    /// Parse one page and return its listings, deduplicated by URL in first-seen order.
    ///
    /// Malformed markup, missing attributes and pages without listings all
    /// degrade to fewer (or zero) records rather than an error.
    pub fn extract(&self, html: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        let anchors = self.candidate_anchors(&document);
        let anchor_count = anchors.len();

        let records: Vec<ListingRecord> = anchors
            .into_iter()
            .filter_map(|anchor| self.build_record(&document, anchor))
            .collect();

        let listings = dedup_by_url(records);
        debug!(
            anchors = anchor_count,
            listings = listings.len(),
            "Extracted listings from page"
        );
        listings
    }

    fn candidate_anchors<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match self.policy {
            SelectionPolicy::FirstMatch => {
                for matcher in &self.matchers {
                    let found = matcher.matches(document);
                    if !found.is_empty() {
                        debug!(matcher = matcher.name, count = found.len(), "Anchor matcher hit");
                        return found;
                    }
                }
                Vec::new()
            }
            SelectionPolicy::UnionExcluding => {
                let union: HashSet<_> = self
                    .matchers
                    .iter()
                    .flat_map(|matcher| matcher.matches(document))
                    .map(|anchor| anchor.id())
                    .collect();

                // Emit in document order, as a single grouped selector would.
                document
                    .root_element()
                    .descendants()
                    .filter(|node| union.contains(&node.id()))
                    .filter_map(ElementRef::wrap)
                    .filter(|anchor| !is_non_listing_href(anchor.value().attr("href").unwrap_or("")))
                    .collect()
            }
        }
    }

    fn build_record<'a>(&self, document: &'a Html, anchor: ElementRef<'a>) -> Option<ListingRecord> {
        let title = anchor_title(anchor)?;
        let url = self.resolve_url(anchor.value().attr("href")?)?;
        let price_text = self.find_price_text(document, anchor).unwrap_or_default();
        let price = normalize_price(Some(&price_text));

        Some(ListingRecord {
            title,
            price_text,
            price,
            url,
        })
    }

    /// Root-relative hrefs get the site's scheme and host; absolute http(s) hrefs pass through.
    fn resolve_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if href.starts_with('/') && !href.starts_with("//") {
            return Some(format!("{}{}", self.origin_prefix, href));
        }

        match Url::parse(href) {
            Ok(absolute) => is_web_url(&absolute).then(|| href.to_string()),
            Err(_) => self
                .origin
                .join(href)
                .ok()
                .filter(is_web_url)
                .map(String::from),
        }
    }

    /// Primary search: price selectors inside the nearest `div`/`li` (or the whole
    /// document). Only when none of them match any node do we fall back to the
    /// spans following the anchor. Matches without a currency signal do not
    /// trigger the fallback.
    fn find_price_text<'a>(&self, document: &'a Html, anchor: ElementRef<'a>) -> Option<String> {
        let container = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| matches!(el.value().name(), "div" | "li"));

        let mut candidates: Vec<ElementRef<'a>> = Vec::new();
        for selector in &self.price_selectors {
            match container {
                Some(card) => candidates.extend(card.select(selector)),
                None => candidates.extend(document.select(selector)),
            }
        }

        if candidates.is_empty() {
            candidates.extend(following_elements(document, anchor, "span").take(PRICE_LOOKAHEAD));
        }

        candidates
            .into_iter()
            .map(element_text)
            .find(|text| has_price_signal(text))
    }
}

/// Drop records without a URL and every repeat of a URL already seen.
pub fn dedup_by_url(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = UrlSet::default();
    records.into_iter().filter(|r| seen.admit(r)).collect()
}

/// Running set of listing URLs, shared across pages by the crawler.
#[derive(Debug, Default)]
pub struct UrlSet {
    seen: HashSet<String>,
}

impl UrlSet {
    /// True the first time a non-empty URL is offered.
    pub fn admit(&mut self, record: &ListingRecord) -> bool {
        !record.url.is_empty() && self.seen.insert(record.url.clone())
    }
}

fn anchor_title(anchor: ElementRef<'_>) -> Option<String> {
    let label = anchor
        .value()
        .attr("aria-label")
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let title = match label {
        Some(l) => l.to_string(),
        None => element_text(anchor),
    };

    if title.is_empty() || is_noise_title(&title) {
        return None;
    }
    Some(title)
}

fn is_noise_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    NOISE_TITLE_PREFIXES.iter().any(|p| lowered.starts_with(p))
}

fn is_non_listing_href(href: &str) -> bool {
    NON_LISTING_MARKERS.iter().any(|m| href.contains(m))
}

fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Text nodes trimmed, empties dropped, joined with single spaces.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Elements named `tag` after `anchor` in document order, including its own descendants.
fn following_elements<'a>(
    document: &'a Html,
    anchor: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let anchor_id = anchor.id();
    document
        .root_element()
        .descendants()
        .skip_while(move |node| node.id() != anchor_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}
