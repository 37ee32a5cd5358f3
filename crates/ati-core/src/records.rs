use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One of the three content channels a post is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Meta,
}

impl Modality {
    /// Fixed modality order used wherever per-modality values are laid out
    /// side by side (embeddings, CSV columns).
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Image, Modality::Meta];

    /// Column prefix used by the per-post feature files.
    #[must_use]
    pub fn column_prefix(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Meta => "meta",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_prefix())
    }
}

/// The four scalars scored for a single modality of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityScores {
    /// Distance from typical market content, 0-1.
    pub novelty: f64,
    /// Spread of the content within itself, 0-1.
    pub diversity: f64,
    /// Derived diversity score, 0-1.
    pub ds: f64,
    /// Derived trap index, conventionally 0-100.
    pub ati: f64,
}

/// One observed post with its engagement counts and modality scores.
///
/// Every numeric field defaults to zero when the source value is missing or
/// unparsable, and every text field defaults to the empty string. Records are
/// never mutated after parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Brand handle, already trimmed. Empty when the source row had none.
    pub brand: String,
    pub likes: i64,
    pub comments: i64,
    pub followers: i64,
    /// Engagement rate as supplied by the source (`y` column).
    pub engagement: f64,
    pub text: ModalityScores,
    pub image: ModalityScores,
    pub meta: ModalityScores,
    /// Combined trap index across modalities.
    pub ati: f64,
    /// Combined diversity score across modalities.
    pub ds: f64,
    pub caption: String,
    pub ocr_text: String,
    pub posted_at: Option<NaiveDateTime>,
    /// Platform short code, used to build a post URL when present.
    pub shortcode: Option<String>,
}

impl PostRecord {
    #[must_use]
    pub fn modality(&self, modality: Modality) -> &ModalityScores {
        match modality {
            Modality::Text => &self.text,
            Modality::Image => &self.image,
            Modality::Meta => &self.meta,
        }
    }

    /// Mean novelty across the three modalities.
    #[must_use]
    pub fn mean_novelty(&self) -> f64 {
        (self.text.novelty + self.image.novelty + self.meta.novelty) / 3.0
    }

    /// Mean diversity across the three modalities.
    #[must_use]
    pub fn mean_diversity(&self) -> f64 {
        (self.text.diversity + self.image.diversity + self.meta.diversity) / 3.0
    }

    /// Public URL of the post, when the source carried a short code.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.shortcode
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(|code| format!("https://www.instagram.com/p/{code}/"))
    }
}
