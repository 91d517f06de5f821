// # Compute Client Trait
//
// Defines the capability surface of a cloud compute service that the
// association adapter needs: associate, disassociate, and look up a
// floating IP.
//
// ## Implementations
//
// - OpenStack Compute (Nova): `fipassoc-openstack` crate
//
// ## Usage
//
// ```rust,ignore
// use fipassoc_core::traits::{AssociateOpts, ComputeClient};
//
// async fn attach(client: &dyn ComputeClient) -> fipassoc_core::Result<()> {
//     let opts = AssociateOpts::new("203.0.113.5", "");
//     client.associate_instance("vm-123", &opts).await
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Options for an associate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateOpts {
    /// The floating IP address to attach
    pub floating_ip: String,
    /// Fixed IP on the instance to attach to; empty lets the cloud pick
    pub fixed_ip: String,
}

impl AssociateOpts {
    /// Create associate options
    pub fn new(floating_ip: impl Into<String>, fixed_ip: impl Into<String>) -> Self {
        Self {
            floating_ip: floating_ip.into(),
            fixed_ip: fixed_ip.into(),
        }
    }
}

/// Options for a disassociate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisassociateOpts {
    /// The floating IP address to detach
    pub floating_ip: String,
}

impl DisassociateOpts {
    /// Create disassociate options
    pub fn new(floating_ip: impl Into<String>) -> Self {
        Self {
            floating_ip: floating_ip.into(),
        }
    }
}

/// Live record of a floating IP as reported by the compute service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    /// Provider id of the floating IP
    pub id: String,
    /// The public address
    pub ip: String,
    /// Fixed IP it is bound to, empty when unbound
    pub fixed_ip: String,
    /// Instance it is attached to, empty when unattached
    pub instance_id: String,
    /// Pool the address was allocated from
    pub pool: String,
}

impl FloatingIp {
    /// Whether the floating IP is currently attached to any instance
    pub fn is_associated(&self) -> bool {
        !self.instance_id.is_empty()
    }
}

/// Trait for compute service clients
///
/// A client is bound to a single region. Implementations must be
/// thread-safe and usable across async tasks.
///
/// # Contract
///
/// - One API call per method invocation
/// - No retry, backoff, or polling; failures are returned as-is
/// - A missing floating IP or instance must be reported as
///   [`Error::NotFound`](crate::Error::NotFound) so callers can classify it
/// - No state is cached between calls
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Attach a floating IP to an instance
    ///
    /// The call is synchronous on the provider side: once it returns
    /// `Ok(())` the address is attached.
    async fn associate_instance(
        &self,
        instance_id: &str,
        opts: &AssociateOpts,
    ) -> Result<(), crate::Error>;

    /// Detach a floating IP from an instance
    async fn disassociate_instance(
        &self,
        instance_id: &str,
        opts: &DisassociateOpts,
    ) -> Result<(), crate::Error>;

    /// Fetch the current record of a floating IP
    ///
    /// # Returns
    ///
    /// - `Ok(FloatingIp)`: The live record
    /// - `Err(Error::NotFound)`: The floating IP no longer exists
    /// - `Err(Error)`: Any other failure
    async fn get_floating_ip(&self, floating_ip: &str) -> Result<FloatingIp, crate::Error>;

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}

/// Builds region-scoped compute clients
///
/// The adapter asks for a fresh client on every operation, so
/// implementations decide whether to share connections.
pub trait ComputeClientFactory: Send + Sync {
    /// Create a client for `region`
    ///
    /// # Returns
    ///
    /// - `Ok(client)`: A client bound to the region
    /// - `Err(Error::ClientInit)`: The region cannot be served
    fn client(&self, region: &str) -> Result<Arc<dyn ComputeClient>, crate::Error>;
}
