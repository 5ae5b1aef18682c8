use serde::{Deserialize, Serialize};

pub const NO_TITLE: &str = "No Title";
pub const NO_PRICE: &str = "No Price";

/// One listing as read off a rendered card.
///
/// Serialized with the raw dataset header `title,price,link`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub title: String,
    #[serde(rename = "price")]
    pub price_text: String,
    pub link: String,
}

/// A raw row after the cleaning stage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CleanedRecord {
    pub title: String,
    pub price: String,
    pub link: String,
    pub price_cleaned: i64,
}
