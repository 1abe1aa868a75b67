// One-shot catalog seeding from a JSON document.
//
// Operators and maps are keyed by name, so reseeding only adds what is missing.
// Info sections have no natural key and are only inserted into an empty table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::{Database, NewInfoSection, NewMap, NewOperator};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid seed entry: {0}")]
    Invalid(String),
    #[error("database error while seeding: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub operators: Vec<NewOperator>,
    #[serde(default)]
    pub maps: Vec<NewMap>,
    #[serde(default)]
    pub game_info: Vec<NewInfoSection>,
}

/// Counts of rows actually inserted by a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub operators: usize,
    pub maps: usize,
    pub info_sections: usize,
}

impl CatalogSeed {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        let seed: CatalogSeed = serde_json::from_str(raw)?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), SeedError> {
        for op in &self.operators {
            if op.name.trim().is_empty() {
                return Err(SeedError::Invalid("operator with empty name".into()));
            }
            for (field, value) in [("armor", op.armor), ("speed", op.speed)] {
                if !(1..=3).contains(&value) {
                    return Err(SeedError::Invalid(format!(
                        "operator '{}' has {field} {value}, expected 1-3",
                        op.name
                    )));
                }
            }
        }
        if let Some(map) = self.maps.iter().find(|m| m.name.trim().is_empty()) {
            return Err(SeedError::Invalid(format!(
                "map with empty name (image {})",
                map.image_url
            )));
        }
        Ok(())
    }
}

impl Database {
    pub async fn seed(&self, seed: &CatalogSeed) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        for op in &seed.operators {
            if self.insert_operator(op).await?.is_some() {
                report.operators += 1;
            }
        }

        for map in &seed.maps {
            if self.insert_map(map).await?.is_some() {
                report.maps += 1;
            }
        }

        if self.count_info_sections().await? == 0 {
            for section in &seed.game_info {
                self.insert_info_section(section).await?;
                report.info_sections += 1;
            }
        }

        tracing::info!(
            operators = report.operators,
            maps = report.maps,
            info_sections = report.info_sections,
            "Catalog seeded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Side;

    const BUNDLED: &str = include_str!("../data/catalog.json");

    #[test]
    fn test_bundled_catalog_parses() {
        let seed = CatalogSeed::from_json(BUNDLED).unwrap();
        assert_eq!(seed.operators.len(), 20);
        assert_eq!(seed.maps.len(), 5);
        assert_eq!(seed.game_info.len(), 6);

        let attackers = seed
            .operators
            .iter()
            .filter(|o| o.side == Side::Attacker)
            .count();
        assert_eq!(attackers, 10);
    }

    #[test]
    fn test_rejects_out_of_range_armor() {
        let raw = r#"{"operators": [{"name": "Tank", "side": "Defender", "ability": "x", "armor": 5, "speed": 1}]}"#;
        let err = CatalogSeed::from_json(raw).unwrap_err();
        assert!(matches!(err, SeedError::Invalid(_)));
        assert!(err.to_string().contains("armor 5"));
    }

    #[test]
    fn test_rejects_unknown_side() {
        let raw = r#"{"operators": [{"name": "Ghost", "side": "Spectator", "ability": "x", "armor": 1, "speed": 1}]}"#;
        assert!(matches!(
            CatalogSeed::from_json(raw).unwrap_err(),
            SeedError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogSeed::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[tokio::test]
    async fn test_seed_is_rerunnable() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let seed = CatalogSeed::from_json(BUNDLED).unwrap();

        let first = db.seed(&seed).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                operators: 20,
                maps: 5,
                info_sections: 6
            }
        );

        let second = db.seed(&seed).await.unwrap();
        assert_eq!(second, SeedReport::default());

        assert_eq!(db.list_operators().await.unwrap().len(), 20);
        assert_eq!(db.list_info_sections().await.unwrap().len(), 6);
    }
}
