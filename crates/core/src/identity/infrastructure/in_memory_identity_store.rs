use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::identity::domain::identity_store::{IdentityStore, PersonRecord};

/// Identity store held in memory, optionally loaded from a JSON array of
/// `{"id": .., "name": ..}` records.
#[derive(Clone, Debug, Default)]
pub struct InMemoryIdentityStore {
    people: HashMap<i64, PersonRecord>,
}

impl InMemoryIdentityStore {
    pub fn new(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        Self {
            people: records.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let json = fs::read_to_string(path)?;
        let records: Vec<PersonRecord> = serde_json::from_str(&json)?;
        log::info!("Loaded {} identities from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn lookup(
        &self,
        person_id: i64,
    ) -> Result<Option<PersonRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.people.get(&person_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookup_known_and_unknown() {
        let store = InMemoryIdentityStore::new([PersonRecord {
            id: 3,
            name: "Ada".into(),
        }]);
        assert_eq!(store.lookup(3).unwrap().unwrap().name, "Ada");
        assert!(store.lookup(4).unwrap().is_none());
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 1, "name": "A"}}, {{"id": 2, "name": "B"}}]"#).unwrap();
        let store = InMemoryIdentityStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(2).unwrap().unwrap().name, "B");
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(InMemoryIdentityStore::load(file.path()).is_err());
    }
}
