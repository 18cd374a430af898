use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Série A clubs of the 2025 season keyed by event-feed team id.
pub const BRASILEIRAO_2025: [(u32, &str); 20] = [
    (1239, "Flamengo"),
    (1234, "Palmeiras"),
    (1221, "Bahia"),
    (1219, "Internacional"),
    (1230, "Cruzeiro"),
    (1227, "Botafogo"),
    (1232, "Fluminense"),
    (1226, "Vasco"),
    (1237, "Corinthians"),
    (1224, "São Paulo"),
    (1241, "Santos"),
    (5438, "Red Bull Bragantino"),
    (1235, "Atlético Mineiro"),
    (2065, "Fortaleza"),
    (1231, "Sport"),
    (1238, "Vitória"),
    (1244, "Grêmio"),
    (7334, "Ceará"),
    (1220, "Juventude"),
    (6332, "Mirassol"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    names: HashMap<u32, String>,
}

impl TeamDirectory {
    pub fn brasileirao_2025() -> Self {
        Self::from_entries(
            BRASILEIRAO_2025
                .iter()
                .map(|(id, name)| TeamEntry { id: *id, name: (*name).to_string() }),
        )
    }

    pub fn from_entries(entries: impl IntoIterator<Item = TeamEntry>) -> Self {
        let mut names = HashMap::new();
        for entry in entries {
            names.insert(entry.id, entry.name);
        }
        Self { names }
    }

    /// Adds or replaces entries; later entries win.
    pub fn extend(&mut self, entries: &[TeamEntry]) {
        for entry in entries {
            self.names.insert(entry.id, entry.name.clone());
        }
    }

    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display names sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.names.values().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_ids() {
        let dir = TeamDirectory::brasileirao_2025();
        assert_eq!(dir.len(), 20);
        assert_eq!(dir.resolve(1239), Some("Flamengo"));
        assert_eq!(dir.resolve(6332), Some("Mirassol"));
        assert_eq!(dir.resolve(9999), None);
    }

    #[test]
    fn extend_overrides_existing() {
        let mut dir = TeamDirectory::brasileirao_2025();
        dir.extend(&[
            TeamEntry { id: 1226, name: "Vasco da Gama".to_string() },
            TeamEntry { id: 42, name: "Remo".to_string() },
        ]);
        assert_eq!(dir.resolve(1226), Some("Vasco da Gama"));
        assert_eq!(dir.resolve(42), Some("Remo"));
        assert_eq!(dir.len(), 21);
    }
}
