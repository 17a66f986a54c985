//! Read-only monument catalogue.
//!
//! The builtin records ship embedded in the binary and are validated once at
//! startup; nothing mutates the catalogue afterwards.

use std::collections::HashSet;

use super::models::{Monument, Period};
use crate::error::AppError;
use crate::validation::require_slug;

const BUILTIN_MONUMENTS: &str = include_str!("../../data/monuments.json");

#[derive(Debug, Clone)]
pub struct MonumentCatalog {
    monuments: Vec<Monument>,
}

impl MonumentCatalog {
    /// Load the builtin catalogue.
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_json(BUILTIN_MONUMENTS)
    }

    /// Parse and validate a JSON array of monument records.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let monuments: Vec<Monument> = serde_json::from_str(json)?;
        Self::new(monuments)
    }

    /// Validate uniqueness of ids and presence of every model reference.
    pub fn new(monuments: Vec<Monument>) -> Result<Self, AppError> {
        let mut seen = HashSet::new();
        for m in &monuments {
            require_slug("monument id", &m.id)?;
            if !seen.insert(m.id.as_str()) {
                return Err(AppError::Validation(format!("duplicate monument id '{}'", m.id)));
            }
            for period in Period::ALL {
                if m.model_for(period).trim().is_empty() {
                    return Err(AppError::Validation(format!(
                        "monument '{}' has no {} model",
                        m.id, period
                    )));
                }
            }
        }

        tracing::debug!(count = monuments.len(), "Monument catalogue loaded");
        Ok(Self { monuments })
    }

    pub fn all(&self) -> &[Monument] {
        &self.monuments
    }

    pub fn get(&self, id: &str) -> Option<&Monument> {
        self.monuments.iter().find(|m| m.id == id)
    }

    /// Like `get`, but a miss is `AppError::NotFound("Monument not found")`.
    pub fn require(&self, id: &str) -> Result<&Monument, AppError> {
        self.get(id)
            .ok_or_else(|| AppError::NotFound("Monument not found".into()))
    }

    pub fn len(&self) -> usize {
        self.monuments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monuments.is_empty()
    }
}

/// Static GeoJSON outline for the India map view: a bounding polygon.
pub fn india_map_geojson() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [68.7, 8.4],
                        [97.25, 8.4],
                        [97.25, 37.6],
                        [68.7, 37.6],
                        [68.7, 8.4]
                    ]]
                },
                "properties": { "name": "India" }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_loads() {
        let catalog = MonumentCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 16);
        let taj = catalog.get("taj-mahal").unwrap();
        assert_eq!(taj.name, "Taj Mahal");
        assert_eq!(taj.unesco, Some(true));
        assert!(catalog.get("somnath-temple").is_some());
        assert!(catalog.get("not-a-real-id").is_none());
    }

    #[test]
    fn test_somnath_reuses_one_model() {
        let catalog = MonumentCatalog::builtin().unwrap();
        let somnath = catalog.get("somnath-temple").unwrap();
        assert_eq!(somnath.model_for(Period::Past), somnath.model_for(Period::Present));
        assert_eq!(somnath.model_for(Period::Ancient), somnath.model_for(Period::Present));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let catalog = MonumentCatalog::builtin().unwrap();
        let mut monuments = catalog.all().to_vec();
        monuments.push(monuments[0].clone());
        let err = MonumentCatalog::new(monuments).unwrap_err();
        assert!(err.to_string().contains("duplicate monument id 'taj-mahal'"));
    }

    #[test]
    fn test_missing_model_rejected() {
        let catalog = MonumentCatalog::builtin().unwrap();
        let mut monuments = catalog.all().to_vec();
        monuments[1].historical_models.ancient = "  ".into();
        let err = MonumentCatalog::new(monuments).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_require_not_found() {
        let catalog = MonumentCatalog::builtin().unwrap();
        let err = catalog.require("atlantis").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Monument not found"));
    }

    #[test]
    fn test_india_polygon_is_closed() {
        let map = india_map_geojson();
        let ring = map["features"][0]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(map["features"][0]["properties"]["name"], "India");
    }
}
