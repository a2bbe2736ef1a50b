use serde::{Deserialize, Serialize};

/// A known person a worker can match a face against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: i64,
    pub name: String,
}

/// Resolves person ids returned by identify workers.
pub trait IdentityStore: Send + Sync {
    fn lookup(
        &self,
        person_id: i64,
    ) -> Result<Option<PersonRecord>, Box<dyn std::error::Error + Send + Sync>>;
}
