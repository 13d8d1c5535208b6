use serde::Serialize;

// ListingRecord
//  ├── title        (aria-label or anchor text, trimmed)
//  ├── price_text   (raw snippet as found, "" when none)
//  ├── price        (normalized from price_text)
//  └── url          (absolute, dedup key)

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub title: String,
    pub price_text: String,
    pub price: Option<f64>,
    pub url: String,
}

impl ListingRecord {
    /// Price snippet for display; "N/A" when nothing was found near the anchor.
    pub fn price_label(&self) -> &str {
        if self.price_text.is_empty() {
            "N/A"
        } else {
            &self.price_text
        }
    }
}
