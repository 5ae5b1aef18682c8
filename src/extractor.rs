use reqwest::Url;

use crate::browser::Card;
use crate::error::{ExtractionError, ScrapeError};
use crate::models::{CandidateRecord, NO_PRICE, NO_TITLE};

/// Turns one rendered card into a [`CandidateRecord`].
///
/// Extraction is text based: the title is the first visible line and the
/// price is the first line carrying a currency glyph. Missing pieces fall back
/// to sentinels; only failures reading the card itself are errors.
#[derive(Debug, Clone)]
pub struct Extractor {
    base: Url,
    glyphs: Vec<char>,
}

impl Extractor {
    pub fn new(base_origin: &str, glyphs: &[char]) -> Result<Self, ScrapeError> {
        let base = Url::parse(base_origin)
            .map_err(|e| ScrapeError::Config(format!("base origin {:?}: {}", base_origin, e)))?;
        Ok(Self {
            base,
            glyphs: glyphs.to_vec(),
        })
    }

    pub fn extract<C: Card>(&self, card: &C) -> Result<CandidateRecord, ExtractionError> {
        let text = card.inner_text()?;
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        let title = first_non_empty(&lines).unwrap_or(NO_TITLE).to_string();
        let price_text = self.first_priced(&lines).unwrap_or(NO_PRICE).to_string();
        let link = match card.first_anchor_href()? {
            Some(href) => self.resolve(&href)?,
            None => String::new(),
        };

        Ok(CandidateRecord {
            title,
            price_text,
            link,
        })
    }

    fn first_priced<'a>(&self, lines: &[&'a str]) -> Option<&'a str> {
        lines
            .iter()
            .copied()
            .find(|line| line.chars().any(|c| self.glyphs.contains(&c)))
    }

    fn resolve(&self, href: &str) -> Result<String, ExtractionError> {
        let href = href.trim();
        if href.is_empty() {
            return Ok(String::new());
        }
        self.base
            .join(href)
            .map(|url| url.to_string())
            .map_err(|e| ExtractionError::BadHref {
                href: href.to_string(),
                reason: e.to_string(),
            })
    }
}

fn first_non_empty<'a>(lines: &[&'a str]) -> Option<&'a str> {
    lines.iter().copied().find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotCard;

    struct BrokenCard;

    impl Card for BrokenCard {
        fn inner_text(&self) -> Result<String, ExtractionError> {
            Err(ExtractionError::Text("node detached".to_string()))
        }

        fn first_anchor_href(&self) -> Result<Option<String>, ExtractionError> {
            Ok(None)
        }
    }

    fn extractor() -> Extractor {
        Extractor::new("https://www.airbnb.com", &['$', '₸', '€']).unwrap()
    }

    #[test]
    fn reads_title_price_and_absolute_link() {
        let card = SnapshotCard::new(
            "\n  Apartment in Almaty\nCozy studio\n₸ 18 500 night\n$40 total",
            Some("/rooms/42?check_in=2024-01-01"),
        );
        let record = extractor().extract(&card).unwrap();
        assert_eq!(record.title, "Apartment in Almaty");
        assert_eq!(record.price_text, "₸ 18 500 night");
        assert_eq!(record.link, "https://www.airbnb.com/rooms/42?check_in=2024-01-01");
    }

    #[test]
    fn absolute_hrefs_are_kept() {
        let card = SnapshotCard::new("Flat", Some("https://other.example/rooms/7"));
        assert_eq!(extractor().extract(&card).unwrap().link, "https://other.example/rooms/7");
    }

    #[test]
    fn missing_anchor_yields_empty_link() {
        let card = SnapshotCard::new("Flat\n€ 90", None);
        let record = extractor().extract(&card).unwrap();
        assert_eq!(record.link, "");
        assert_eq!(record.price_text, "€ 90");
    }

    #[test]
    fn no_currency_glyph_yields_no_price() {
        let card = SnapshotCard::new("Guest house\nRated 4.9", Some("/rooms/1"));
        assert_eq!(extractor().extract(&card).unwrap().price_text, NO_PRICE);
    }

    #[test]
    fn empty_text_yields_no_title() {
        let card = SnapshotCard::new("  \n \n", Some("/rooms/1"));
        let record = extractor().extract(&card).unwrap();
        assert_eq!(record.title, NO_TITLE);
        assert_eq!(record.price_text, NO_PRICE);
    }

    #[test]
    fn unreadable_card_is_an_error() {
        assert!(matches!(extractor().extract(&BrokenCard), Err(ExtractionError::Text(_))));
    }

    #[test]
    fn glyph_set_is_configurable() {
        let extractor = Extractor::new("https://www.airbnb.com", &['£']).unwrap();
        let card = SnapshotCard::new("Room\n$40\n£35", None);
        assert_eq!(extractor.extract(&card).unwrap().price_text, "£35");
    }
}
