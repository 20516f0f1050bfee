use salesdesk_types::{EntityType, RecordId, UserId};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A typed entity that can be stored through a [`Repository`](crate::Repository).
///
/// The serialized form is what filters and sorts are evaluated against, so
/// field clauses name serialized (snake_case) field names.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const ENTITY_TYPE: EntityType;

    fn id(&self) -> &RecordId;

    /// Owner of the record. Reference catalog entities have none.
    fn owner_id(&self) -> Option<&UserId> {
        None
    }

    /// Creation time in milliseconds since the Unix epoch.
    fn created_at(&self) -> i64;

    /// Last modification time in milliseconds since the Unix epoch.
    fn updated_at(&self) -> i64 {
        self.created_at()
    }
}
