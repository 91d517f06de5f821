//! Floating IP association resource
//!
//! [`FloatingIpAssociation`] translates the create/read/delete lifecycle of
//! an association into compute API calls:
//!
//! ```text
//! create ── associate_instance ──► read
//! read   ── get_floating_ip     ──► present | absent
//! delete ── disassociate_instance
//! ```
//!
//! Each operation makes exactly one call to the compute service (create
//! makes one more through its follow-up read) and never retries.

mod id;

pub use id::AssociationId;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AssociationConfig;
use crate::error::{Error, Result};
use crate::traits::{AssociateOpts, ComputeClient, ComputeClientFactory, DisassociateOpts};

/// Observed state of an association, as handed back to the lifecycle
///
/// `id == None` means the association does not exist and the lifecycle
/// should forget it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationState {
    /// Composite id, `None` when marked absent
    pub id: Option<String>,
    /// Region the association lives in
    pub region: String,
    /// The public address
    pub floating_ip: String,
    /// The instance it is attached to
    pub instance_id: String,
    /// Fixed IP on the instance, may be empty
    pub fixed_ip: String,
}

impl AssociationState {
    /// Whether the association exists
    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn value_of(&self, name: &str) -> &str {
        match name {
            "region" => &self.region,
            "floating_ip" => &self.floating_ip,
            "instance_id" => &self.instance_id,
            "fixed_ip" => &self.fixed_ip,
            _ => "",
        }
    }
}

/// Adapter between the resource lifecycle and the compute service
#[derive(Clone)]
pub struct FloatingIpAssociation {
    clients: Arc<dyn ComputeClientFactory>,
}

impl FloatingIpAssociation {
    /// Create an adapter that obtains clients from `clients`
    pub fn new(clients: Arc<dyn ComputeClientFactory>) -> Self {
        Self { clients }
    }

    fn client(&self, region: &str) -> Result<Arc<dyn ComputeClient>> {
        self.clients.client(region).map_err(|e| match e {
            Error::ClientInit(_) => e,
            other => Error::client_init(other.to_string()),
        })
    }

    /// Attach the floating IP and read the result back
    ///
    /// The associate call is synchronous, so there is no waiting between
    /// the call and the read.
    pub async fn create(&self, config: &AssociationConfig) -> Result<AssociationState> {
        config.validate()?;
        let client = self.client(&config.region)?;

        let opts = AssociateOpts::new(&config.floating_ip, &config.fixed_ip);
        debug!(
            client = client.client_name(),
            instance_id = %config.instance_id,
            ?opts,
            "Associate options"
        );

        client
            .associate_instance(&config.instance_id, &opts)
            .await
            .map_err(Error::association)?;

        let id = AssociationId::new(&config.floating_ip, &config.instance_id, &config.fixed_ip);
        info!(id = %id, region = %config.region, "Floating IP associated");

        self.read_with(client.as_ref(), &id.to_string(), &config.region)
            .await
    }

    /// Refresh an association from its composite id
    ///
    /// Fields come from the id, not from the live record; the live record
    /// is only used to decide whether the association still exists.
    pub async fn read(&self, id: &str, region: &str) -> Result<AssociationState> {
        // Reject a corrupt id before touching the network.
        AssociationId::parse(id)?;
        let client = self.client(region)?;
        self.read_with(client.as_ref(), id, region).await
    }

    async fn read_with(
        &self,
        client: &dyn ComputeClient,
        id: &str,
        region: &str,
    ) -> Result<AssociationState> {
        let parsed = AssociationId::parse(id)?;

        let mut state = AssociationState {
            id: Some(id.to_string()),
            region: region.to_string(),
            floating_ip: parsed.floating_ip,
            instance_id: parsed.instance_id,
            fixed_ip: parsed.fixed_ip,
        };

        match client.get_floating_ip(&state.floating_ip).await {
            Ok(fip) if fip.is_associated() => {}
            Ok(_) => {
                warn!(id, "Floating IP is no longer associated, marking absent");
                state.id = None;
            }
            Err(e) if e.is_not_found() => {
                warn!(id, "Floating IP not found, marking absent");
                state.id = None;
            }
            Err(e) => return Err(e),
        }

        Ok(state)
    }

    /// Detach the floating IP
    ///
    /// A not-found answer means it is already detached and counts as
    /// success.
    pub async fn delete(&self, state: &AssociationState) -> Result<()> {
        let client = self.client(&state.region)?;

        let opts = DisassociateOpts::new(&state.floating_ip);
        debug!(
            client = client.client_name(),
            instance_id = %state.instance_id,
            ?opts,
            "Disassociate options"
        );

        match client
            .disassociate_instance(&state.instance_id, &opts)
            .await
        {
            Ok(()) => {
                info!(
                    floating_ip = %state.floating_ip,
                    instance_id = %state.instance_id,
                    "Floating IP disassociated"
                );
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(
                    floating_ip = %state.floating_ip,
                    instance_id = %state.instance_id,
                    "Floating IP association already gone"
                );
                Ok(())
            }
            Err(e) => Err(Error::disassociation(e)),
        }
    }

    /// Hydrate an association from an externally supplied id
    pub async fn import(&self, id: &str, region: &str) -> Result<AssociationState> {
        self.read(id, region).await
    }
}

impl std::fmt::Debug for FloatingIpAssociation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatingIpAssociation").finish_non_exhaustive()
    }
}
