//! Core traits for floating IP association management
//!
//! - [`ComputeClient`]: Talk to the cloud compute service
//! - [`ComputeClientFactory`]: Build region-scoped compute clients
//! - [`StateStore`]: Persist association handles between runs

pub mod compute_client;
pub mod state_store;

pub use compute_client::{
    AssociateOpts, ComputeClient, ComputeClientFactory, DisassociateOpts, FloatingIp,
};
pub use state_store::{StateRecord, StateStore};
