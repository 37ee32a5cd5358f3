//! Fixed-length brand embeddings built from modality-wise means.

use std::collections::BTreeMap;

use ati_core::{Modality, PostRecord};
use serde::Serialize;

/// Three modalities times four components.
pub const EMBEDDING_DIM: usize = 12;

/// Components per modality, in vector order.
pub const COMPONENTS: [&str; 4] = ["ati", "ds", "novelty", "diversity"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandEmbedding {
    pub brand: String,
    /// `[text.ati/100, text.ds, text.novelty, text.diversity, image.., meta..]`
    pub vector: [f64; EMBEDDING_DIM],
}

impl BrandEmbedding {
    /// Mean novelty across the three modalities.
    #[must_use]
    pub fn mean_novelty(&self) -> f64 {
        (0..Modality::ALL.len())
            .map(|m| self.vector[m * COMPONENTS.len() + 2])
            .sum::<f64>()
            / 3.0
    }
}

/// Average a brand's posts into one embedding.
///
/// ATI is divided by 100 so every component shares the 0-1 scale. Returns
/// `None` for a brand with no posts.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn embed<'a, I>(brand: &str, posts: I) -> Option<BrandEmbedding>
where
    I: IntoIterator<Item = &'a PostRecord>,
{
    let mut sums = [0.0; EMBEDDING_DIM];
    let mut count = 0usize;
    for post in posts {
        count += 1;
        for (m, modality) in Modality::ALL.iter().enumerate() {
            let scores = post.modality(*modality);
            let base = m * COMPONENTS.len();
            sums[base] += scores.ati / 100.0;
            sums[base + 1] += scores.ds;
            sums[base + 2] += scores.novelty;
            sums[base + 3] += scores.diversity;
        }
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(BrandEmbedding {
        brand: brand.to_string(),
        vector: sums.map(|s| s / n),
    })
}

/// Embed every non-blank brand in `records`, ordered by brand handle.
#[must_use]
pub fn embed_all(records: &[PostRecord]) -> Vec<BrandEmbedding> {
    let mut by_brand: BTreeMap<&str, Vec<&PostRecord>> = BTreeMap::new();
    for record in records {
        let brand = record.brand.trim();
        if !brand.is_empty() {
            by_brand.entry(brand).or_default().push(record);
        }
    }
    by_brand
        .into_iter()
        .filter_map(|(brand, posts)| embed(brand, posts))
        .collect()
}
