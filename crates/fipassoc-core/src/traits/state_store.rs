// # State Store Trait
//
// Defines the interface for persisting association handles between runs.
//
// ## Purpose
//
// The host lifecycle keeps exactly one thing per resource: the composite
// id plus the fields it was created with. The store maps a resource name
// (chosen by the operator) to that record.
//
// ## Implementations
//
// - In-memory: `MemoryStateStore`
// - File-based JSON: `FileStateStore`

use async_trait::async_trait;

use crate::resource::AssociationState;

/// Persisted record for one association resource
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Composite id `<floating_ip>/<instance_id>/<fixed_ip>`
    pub id: String,
    /// Region the association lives in
    pub region: String,
    /// The public address
    pub floating_ip: String,
    /// The instance it is attached to
    pub instance_id: String,
    /// Fixed IP on the instance, may be empty
    #[serde(default)]
    pub fixed_ip: String,
    /// Timestamp of the last successful read
    pub last_refreshed: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Build a record from a present association state
    ///
    /// Returns `None` when the state is marked absent, since there is
    /// nothing to persist.
    pub fn from_state(state: &AssociationState) -> Option<Self> {
        let id = state.id.clone()?;
        Some(Self {
            id,
            region: state.region.clone(),
            floating_ip: state.floating_ip.clone(),
            instance_id: state.instance_id.clone(),
            fixed_ip: state.fixed_ip.clone(),
            last_refreshed: chrono::Utc::now(),
        })
    }

    /// Convert back to the state shape the adapter works with
    pub fn to_state(&self) -> AssociationState {
        AssociationState {
            id: Some(self.id.clone()),
            region: self.region.clone(),
            floating_ip: self.floating_ip.clone(),
            instance_id: self.instance_id.clone(),
            fixed_ip: self.fixed_ip.clone(),
        }
    }
}

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Stores hold records only; they never call the compute service and
/// never decide whether a resource needs to change.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the record stored under `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The stored record
    /// - `Ok(None)`: No record found
    /// - `Err(Error)`: Storage error
    async fn get_record(&self, name: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Create or replace the record stored under `name`
    async fn set_record(&self, name: &str, record: &StateRecord) -> Result<(), crate::Error>;

    /// Delete the record stored under `name`
    ///
    /// Deleting a missing record is not an error.
    async fn delete_record(&self, name: &str) -> Result<(), crate::Error>;

    /// List all resource names in the store
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
