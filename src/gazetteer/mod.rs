//! Surface-form gazetteer index.
//!
//! The gazetteer is a bipartite frequency resource: surface variants mapped
//! to knowledge-base identifiers with occurrence counts, stored in both
//! directions. [`GazetteerIndex::load`] reads the two JSON resources,
//! [`GazetteerIndex::filter`] prunes noisy associations, and the lookup
//! accessors serve the ranking and linking stages. An index is read-only
//! after construction and is intended to be shared behind an [`Arc`] for the
//! lifetime of the process.
//!
//! [`Arc`]: std::sync::Arc

pub mod coords;
/// Resource load errors.
pub mod error;

#[cfg(test)]
mod tests;

pub use coords::{CoordinateIndex, haversine_km};
pub use error::ResourceError;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

/// Raw association table: key to counterpart to occurrence count.
type AssociationTable = HashMap<String, BTreeMap<String, u64>>;

/// Bidirectional surface-form to identifier frequency index.
///
/// Built once at startup via [`GazetteerIndex::load`]; every lookup after
/// that is read-only. Both directions always describe the same association
/// set, also after [`GazetteerIndex::filter`] rebuilds them.
#[derive(Debug, Clone, Default)]
pub struct GazetteerIndex {
    variant_to_ids: AssociationTable,
    id_to_variants: AssociationTable,
}

impl GazetteerIndex {
    /// Loads the two gazetteer resources.
    ///
    /// `variants_path` maps surface variant to `{identifier: count}`;
    /// `ids_path` maps identifier to `{variant: count}`. Either file being
    /// absent or malformed is a [`ResourceError`].
    pub fn load(variants_path: &Path, ids_path: &Path) -> Result<Self, ResourceError> {
        let variant_to_ids = read_association_table(variants_path)?;
        let id_to_variants = read_association_table(ids_path)?;

        let index = Self {
            variant_to_ids,
            id_to_variants,
        };

        let stray = index.count_inconsistent_pairs();
        if stray > 0 {
            warn!(
                stray_pairs = stray,
                "gazetteer directions disagree; filter() will rebuild both from the variant direction"
            );
        }

        info!(
            variants = index.variant_count(),
            identifiers = index.id_count(),
            "gazetteer resources loaded"
        );

        Ok(index)
    }

    /// Builds an index directly from `(variant, identifier, count)` triples.
    ///
    /// Both directions are derived from the triples, so the result is
    /// mutually consistent by construction.
    pub fn from_associations<I>(associations: I) -> Self
    where
        I: IntoIterator<Item = (String, String, u64)>,
    {
        let mut variant_to_ids: AssociationTable = HashMap::new();
        let mut id_to_variants: AssociationTable = HashMap::new();

        for (variant, id, count) in associations {
            variant_to_ids
                .entry(variant.clone())
                .or_default()
                .insert(id.clone(), count);
            id_to_variants.entry(id).or_default().insert(variant, count);
        }

        Self {
            variant_to_ids,
            id_to_variants,
        }
    }

    /// Number of distinct surface variants.
    #[inline]
    pub fn variant_count(&self) -> usize {
        self.variant_to_ids.len()
    }

    /// Number of distinct identifiers.
    #[inline]
    pub fn id_count(&self) -> usize {
        self.id_to_variants.len()
    }

    /// Returns `true` if the index holds no associations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variant_to_ids.is_empty()
    }

    /// Returns `true` if `variant` is a known surface form.
    #[inline]
    pub fn contains_variant(&self, variant: &str) -> bool {
        self.variant_to_ids.contains_key(variant)
    }

    /// Iterates over all known surface variants.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.variant_to_ids.keys().map(String::as_str)
    }

    /// Raw identifier counts recorded under `variant`.
    #[inline]
    pub fn candidates(&self, variant: &str) -> Option<&BTreeMap<String, u64>> {
        self.variant_to_ids.get(variant)
    }

    /// Raw occurrence count for a `(variant, identifier)` association.
    pub fn raw_count(&self, variant: &str, id: &str) -> Option<u64> {
        self.variant_to_ids
            .get(variant)
            .and_then(|ids| ids.get(id))
            .copied()
    }

    /// Normalized relevance of each identifier under `variant`.
    ///
    /// Relevance is the identifier's share of the variant's total count
    /// mass, so the returned values sum to 1.0 for a non-empty entry.
    pub fn normalized_candidates(&self, variant: &str) -> Option<BTreeMap<String, f64>> {
        let ids = self.variant_to_ids.get(variant)?;
        let total: u64 = ids.values().sum();
        if total == 0 {
            return None;
        }
        Some(
            ids.iter()
                .map(|(id, count)| (id.clone(), *count as f64 / total as f64))
                .collect(),
        )
    }

    /// Surface variants recorded under `id`.
    #[inline]
    pub fn variants_for_id(&self, id: &str) -> Option<&BTreeMap<String, u64>> {
        self.id_to_variants.get(id)
    }

    /// Filters noisy associations, returning a new index.
    ///
    /// Per identifier: keep only the `top_mentions` most frequent variants,
    /// drop variants whose count share for that identifier falls below
    /// `minimum_relevance`, and drop variants carrying a disambiguating
    /// qualifier (parenthetical or comma-separated suffix). Both directions
    /// are rebuilt from the surviving associations.
    ///
    /// The result is deterministic for fixed inputs and thresholds, is a
    /// subset of `self`, and re-filtering with the same thresholds is a
    /// no-op: dropping low-relevance variants only raises the shares of the
    /// survivors.
    pub fn filter(&self, top_mentions: usize, minimum_relevance: f64) -> Self {
        let mut surviving: Vec<(String, String, u64)> = Vec::new();

        for (id, variants) in &self.id_to_variants {
            let total: u64 = variants.values().sum();
            if total == 0 {
                continue;
            }

            let mut ranked: Vec<(&String, u64)> =
                variants.iter().map(|(v, c)| (v, *c)).collect();
            // Most frequent first; ties resolve alphabetically so the same
            // inputs always keep the same top slice.
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

            for (variant, count) in ranked.into_iter().take(top_mentions) {
                if has_disambiguating_qualifier(variant) {
                    debug!(variant = %variant, id = %id, "dropping qualified variant");
                    continue;
                }
                let relevance = count as f64 / total as f64;
                if relevance < minimum_relevance {
                    continue;
                }
                surviving.push((variant.clone(), id.clone(), count));
            }
        }

        let filtered = Self::from_associations(surviving);

        info!(
            variants_before = self.variant_count(),
            variants_after = filtered.variant_count(),
            identifiers_before = self.id_count(),
            identifiers_after = filtered.id_count(),
            top_mentions,
            minimum_relevance,
            "gazetteer filtered"
        );

        filtered
    }

    fn count_inconsistent_pairs(&self) -> usize {
        let mut stray = 0;
        for (variant, ids) in &self.variant_to_ids {
            for (id, count) in ids {
                let mirrored = self
                    .id_to_variants
                    .get(id)
                    .and_then(|variants| variants.get(variant));
                if mirrored != Some(count) {
                    stray += 1;
                }
            }
        }
        stray
    }
}

/// Returns `true` if the variant carries a disambiguating qualifier, e.g.
/// `"Sheffield (Tasmania)"` or `"Ashton, Northamptonshire"`. Such entries
/// are gazetteer noise: the qualifier never appears in running text.
pub fn has_disambiguating_qualifier(variant: &str) -> bool {
    variant.contains('(') || variant.contains(')') || variant.contains(',')
}

fn read_association_table(path: &Path) -> Result<AssociationTable, ResourceError> {
    let raw = fs::read_to_string(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ResourceError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
