// Local board-game catalog: the reference corpus the retriever indexes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One catalog entry. Source data is scraped and patchy, so every field
/// besides `id` and `name` falls back to a neutral default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_min_players")]
    pub min_players: i64,
    #[serde(default = "default_max_players")]
    pub max_players: i64,
    #[serde(default = "default_weight")]
    pub difficulty_weight: f64,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub mechanics: String,
}

fn default_min_players() -> i64 {
    1
}

fn default_max_players() -> i64 {
    99
}

fn default_weight() -> f64 {
    2.0
}

/// Load the catalog from a JSON array file.
pub fn load(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&raw)?;
    Ok(entries)
}

/// Render one entry as the reference text embedded in concept prompts.
pub fn document(entry: &CatalogEntry) -> String {
    format!(
        "Game: {}\nDescription: {}\nTheme: {}\nPlayers: {}-{}\nWeight: {:.2}\nMechanics: {}",
        entry.name,
        entry.description,
        entry.theme,
        entry.min_players,
        entry.max_players,
        entry.difficulty_weight,
        entry.mechanics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_entry_gets_defaults() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{ "id": 7, "name": "Mystery Game" }"#).unwrap();
        assert_eq!(entry.min_players, 1);
        assert_eq!(entry.max_players, 99);
        assert_eq!(entry.difficulty_weight, 2.0);
        assert_eq!(entry.description, "");
        assert_eq!(entry.mechanics, "");
    }

    #[test]
    fn test_full_entry_parses() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Settlers",
                "description": "Trade and build on a hex island.",
                "minPlayers": 3,
                "maxPlayers": 4,
                "difficultyWeight": 2.3,
                "theme": "Economic",
                "mechanics": "Dice rolling, trading, network building"
            }"#,
        )
        .unwrap();
        assert_eq!(entry.min_players, 3);
        assert_eq!(entry.difficulty_weight, 2.3);
    }

    #[test]
    fn test_document_rendering() {
        let entry = CatalogEntry {
            id: 1,
            name: "Settlers".into(),
            description: "Trade and build.".into(),
            min_players: 3,
            max_players: 4,
            difficulty_weight: 2.3,
            theme: "Economic".into(),
            mechanics: "Trading".into(),
        };
        let doc = document(&entry);
        assert!(doc.contains("Game: Settlers"));
        assert!(doc.contains("Players: 3-4"));
        assert!(doc.contains("Weight: 2.30"));
        assert!(doc.contains("Mechanics: Trading"));
    }
}
