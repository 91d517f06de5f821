//! Resource lifecycle engine
//!
//! The LifecycleEngine plays the part of the declarative host around
//! [`FloatingIpAssociation`]:
//! - Looks up the persisted handle for a named resource
//! - Decides between create, refresh, replace and destroy
//! - Persists the handle the adapter hands back
//!
//! ## Architecture
//!
//! ```text
//!   AssociationConfig
//!          │
//!          ▼
//! ┌──────────────────┐   get/set   ┌──────────────┐
//! │ LifecycleEngine  │────────────►│  StateStore  │
//! └──────────────────┘             └──────────────┘
//!          │ create / read / delete
//!          ▼
//! ┌──────────────────────┐         ┌───────────────┐
//! │ FloatingIpAssociation│────────►│ ComputeClient │
//! └──────────────────────┘         └───────────────┘
//! ```
//!
//! Calls are sequential; nothing is retried. A failed step returns
//! immediately and leaves the stored record as it was before that step.

use crate::config::AssociationConfig;
use crate::error::{Error, Result};
use crate::resource::{AssociationState, FloatingIpAssociation};
use crate::traits::{StateRecord, StateStore};
use tracing::{debug, info, warn};

/// Result of [`LifecycleEngine::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No record existed; the association was created
    Created {
        /// Composite id of the new association
        id: String,
    },
    /// A record existed but the association was gone; it was created again
    Recreated {
        /// Composite id of the new association
        id: String,
    },
    /// ForceNew fields changed; the old association was destroyed first
    Replaced {
        /// Composite id of the new association
        id: String,
        /// Fields that forced the replacement
        fields: Vec<&'static str>,
    },
    /// Live state matches the configuration
    Unchanged {
        /// Composite id of the existing association
        id: String,
    },
}

/// Result of [`LifecycleEngine::refresh`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The association still exists
    Present(AssociationState),
    /// The association was removed out-of-band; the record was dropped
    Gone,
    /// Nothing is stored under that name
    Unknown,
}

/// Drives the association adapter against persisted state
pub struct LifecycleEngine {
    /// Adapter that talks to the compute service
    resource: FloatingIpAssociation,

    /// Persisted handles, keyed by resource name
    state_store: Box<dyn StateStore>,
}

impl LifecycleEngine {
    /// Create a new lifecycle engine
    pub fn new(resource: FloatingIpAssociation, state_store: Box<dyn StateStore>) -> Self {
        Self {
            resource,
            state_store,
        }
    }

    /// Access the underlying state store
    pub fn state_store(&self) -> &dyn StateStore {
        self.state_store.as_ref()
    }

    /// Converge the named resource onto `config`
    pub async fn apply(&self, name: &str, config: &AssociationConfig) -> Result<ApplyOutcome> {
        config.validate()?;

        let Some(record) = self.state_store.get_record(name).await? else {
            info!(name, "No stored association, creating");
            let id = self.create(name, config).await?;
            return Ok(ApplyOutcome::Created { id });
        };

        let current = self.resource.read(&record.id, &record.region).await?;
        if !current.is_present() {
            warn!(name, id = %record.id, "Association disappeared, recreating");
            self.state_store.delete_record(name).await?;
            let id = self.create(name, config).await?;
            return Ok(ApplyOutcome::Recreated { id });
        }

        let fields = config.replacement_fields(&current);
        if !fields.is_empty() {
            info!(name, ?fields, "ForceNew fields changed, replacing association");
            self.resource.delete(&current).await?;
            self.state_store.delete_record(name).await?;
            let id = self.create(name, config).await?;
            return Ok(ApplyOutcome::Replaced { id, fields });
        }

        debug!(name, id = %record.id, "Association up to date");
        self.persist(name, &current).await?;
        Ok(ApplyOutcome::Unchanged { id: record.id })
    }

    async fn create(&self, name: &str, config: &AssociationConfig) -> Result<String> {
        let state = self.resource.create(config).await?;
        match StateRecord::from_state(&state) {
            Some(record) => {
                self.state_store.set_record(name, &record).await?;
                Ok(record.id)
            }
            None => Err(Error::association(Error::not_found(format!(
                "floating IP {} is not attached to {} after associating",
                config.floating_ip, config.instance_id
            )))),
        }
    }

    async fn persist(&self, name: &str, state: &AssociationState) -> Result<()> {
        if let Some(record) = StateRecord::from_state(state) {
            self.state_store.set_record(name, &record).await?;
        }
        Ok(())
    }

    /// Re-read the named resource and update or drop its record
    pub async fn refresh(&self, name: &str) -> Result<RefreshOutcome> {
        let Some(record) = self.state_store.get_record(name).await? else {
            return Ok(RefreshOutcome::Unknown);
        };

        let state = self.resource.read(&record.id, &record.region).await?;
        if state.is_present() {
            self.persist(name, &state).await?;
            Ok(RefreshOutcome::Present(state))
        } else {
            warn!(name, id = %record.id, "Association removed out-of-band, dropping record");
            self.state_store.delete_record(name).await?;
            Ok(RefreshOutcome::Gone)
        }
    }

    /// Disassociate the named resource and drop its record
    ///
    /// # Returns
    ///
    /// `Ok(false)` when nothing was stored under `name`.
    pub async fn destroy(&self, name: &str) -> Result<bool> {
        let Some(record) = self.state_store.get_record(name).await? else {
            debug!(name, "Nothing to destroy");
            return Ok(false);
        };

        self.resource.delete(&record.to_state()).await?;
        self.state_store.delete_record(name).await?;
        info!(name, id = %record.id, "Association destroyed");
        Ok(true)
    }

    /// Adopt an existing association under `name`
    pub async fn import(&self, name: &str, id: &str, region: &str) -> Result<AssociationState> {
        let state = self.resource.import(id, region).await?;
        if !state.is_present() {
            return Err(Error::not_found(format!(
                "cannot import non-existent association {}",
                id
            )));
        }

        self.persist(name, &state).await?;
        info!(name, id, "Association imported");
        Ok(state)
    }
}
