//! Identifier to coordinate lookup for the distance baseline.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use super::error::ResourceError;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Read-only identifier to `(latitude, longitude)` lookup.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    coords: HashMap<String, (f64, f64)>,
}

impl CoordinateIndex {
    /// Loads a JSON resource mapping identifier to `[latitude, longitude]`.
    pub fn load(path: &Path) -> Result<Self, ResourceError> {
        let raw = fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: HashMap<String, Value> =
            serde_json::from_str(&raw).map_err(|source| ResourceError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut coords = HashMap::with_capacity(table.len());
        for (id, value) in table {
            let pair = value
                .as_array()
                .filter(|a| a.len() == 2)
                .and_then(|a| Some((a[0].as_f64()?, a[1].as_f64()?)))
                .ok_or_else(|| ResourceError::InvalidCoordinate { id: id.clone() })?;
            coords.insert(id, pair);
        }

        info!(entries = coords.len(), "coordinate resource loaded");
        Ok(Self { coords })
    }

    /// Builds an index from in-memory entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, (f64, f64))>,
    {
        Self {
            coords: entries.into_iter().collect(),
        }
    }

    /// Coordinates for `id`, if known.
    #[inline]
    pub fn lookup(&self, id: &str) -> Option<(f64, f64)> {
        self.coords.get(id).copied()
    }

    /// Number of identifiers with coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns `true` if no coordinates are loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Great-circle distance in kilometres between two `(latitude, longitude)`
/// points, by the haversine formula.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat_a, lon_a) = (a.0.to_radians(), a.1.to_radians());
    let (lat_b, lon_b) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat_b - lat_a;
    let dlon = lon_b - lon_a;

    let h = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
