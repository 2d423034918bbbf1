/// All primary keys are UUIDs generated by the database or the in-memory store.
pub type DbId = uuid::Uuid;

pub type Timestamp = chrono::DateTime<chrono::Utc>;
