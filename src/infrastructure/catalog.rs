use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::domain::catalog::{DivePackage, Equipment};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogProvider;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    equipment: Vec<Equipment>,
    #[serde(default)]
    packages: Vec<DivePackage>,
}

/// In-memory catalog, typically loaded once from a JSON file at startup.
#[derive(Debug, Default)]
pub struct JsonCatalog {
    equipment: HashMap<String, Equipment>,
    packages: HashMap<String, DivePackage>,
}

impl JsonCatalog {
    pub fn from_records(equipment: Vec<Equipment>, packages: Vec<DivePackage>) -> Self {
        Self {
            equipment: equipment.into_iter().map(|e| (e.id.clone(), e)).collect(),
            packages: packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidInput(format!("invalid catalog: {e}")))?;
        Ok(Self::from_records(file.equipment, file.packages))
    }

    /// A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            log::warn!("Catalog file {} not found, starting empty", path.display());
            return Ok(Self::default());
        }
        let catalog = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!(
            "Loaded catalog: {} equipment, {} packages",
            catalog.equipment.len(),
            catalog.packages.len()
        );
        Ok(catalog)
    }
}

impl CatalogProvider for JsonCatalog {
    fn find_equipment_by_id(&self, id: &str) -> Option<Equipment> {
        self.equipment.get(id).cloned()
    }

    fn find_package_by_id(&self, id: &str) -> Option<DivePackage> {
        self.packages.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "equipment": [
            {"id": "1", "name": "Dive Computer", "price": "499.00", "rentalPrice": "25.00",
             "stock": 3, "available": true, "isRentable": true}
        ],
        "packages": [
            {"id": "p1", "name": "Night Dive", "price": "95.00", "minParticipants": 1,
             "maxParticipants": 8, "availableDates": ["2026-11-07T19:00:00Z"]}
        ]
    }"#;

    #[test]
    fn parses_catalog_json() {
        let catalog = JsonCatalog::from_json(CATALOG).unwrap();

        let computer = catalog.find_equipment_by_id("1").unwrap();
        assert!(computer.is_rentable);
        assert_eq!(computer.stock, 3);

        let night = catalog.find_package_by_id("p1").unwrap();
        assert_eq!(night.available_dates.len(), 1);
        assert!(catalog.find_package_by_id("1").is_none());
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = JsonCatalog::load(&dir.path().join("none.json")).unwrap();
        assert!(catalog.find_equipment_by_id("1").is_none());
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        assert!(matches!(
            JsonCatalog::from_json("{\"equipment\": 3}"),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
