// # fipassoc-core
//
// Core library for attaching floating IPs to compute instances as a
// declarative resource.
//
// ## Architecture Overview
//
// - **ComputeClient**: Trait for the cloud compute API (associate,
//   disassociate, get floating IP)
// - **ComputeClientFactory**: Builds region-scoped clients; injected, never global
// - **FloatingIpAssociation**: The resource adapter (create / read / delete / import)
// - **AssociationId**: The `<floating_ip>/<instance_id>/<fixed_ip>` handle
// - **StateStore**: Persists handles between runs
// - **LifecycleEngine**: Decides create vs. refresh vs. replace vs. destroy
//
// ## Design Principles
//
// 1. **One call per step**: every operation is a single request to the compute API
// 2. **No retries**: failures go straight back to the caller
// 3. **Absence is not an error**: a vanished association is reported, not raised
// 4. **Library-First**: the binary is a thin shell around this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod resource;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{ASSOCIATION_SCHEMA, AssociationConfig, ProviderConfig};
pub use engine::{ApplyOutcome, LifecycleEngine, RefreshOutcome};
pub use error::{Error, Result};
pub use resource::{AssociationId, AssociationState, FloatingIpAssociation};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{ComputeClient, ComputeClientFactory, StateStore};
