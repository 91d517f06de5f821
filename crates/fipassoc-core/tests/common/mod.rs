//! Test doubles and common utilities for contract tests
//!
//! [`MockCloud`] simulates a compute service holding a set of floating
//! IPs. It serves as both the client and the client factory, counts every
//! call, and can be told to fail the next call of a given kind.

#![allow(dead_code)]

use fipassoc_core::error::{Error, Result};
use fipassoc_core::traits::{
    AssociateOpts, ComputeClient, ComputeClientFactory, DisassociateOpts, FloatingIp,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const REGION: &str = "RegionOne";
pub const FLOATING_IP: &str = "203.0.113.5";
pub const INSTANCE_ID: &str = "vm-123";

/// Failure to inject into the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Report the object as missing
    NotFound,
    /// Report a server-side error
    Server,
    /// Report an authentication error
    Auth,
}

impl Failure {
    fn into_error(self, what: &str) -> Error {
        match self {
            Failure::NotFound => Error::not_found(format!("{what} not found")),
            Failure::Server => Error::provider("mock", format!("{what}: 500 Internal Server Error")),
            Failure::Auth => Error::auth(format!("{what}: token rejected")),
        }
    }
}

#[derive(Default)]
struct CloudState {
    floating_ips: HashMap<String, FloatingIp>,
    fail_next_associate: Option<Failure>,
    fail_next_disassociate: Option<Failure>,
    fail_next_get: Option<Failure>,
}

#[derive(Default)]
struct Counters {
    associate: AtomicUsize,
    disassociate: AtomicUsize,
    get: AtomicUsize,
    client: AtomicUsize,
}

/// Simulated compute service
#[derive(Clone, Default)]
pub struct MockCloud {
    state: Arc<Mutex<CloudState>>,
    counters: Arc<Counters>,
    regions: Option<Arc<Vec<String>>>,
}

impl MockCloud {
    /// A cloud serving every region
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloud that only serves the given regions
    pub fn with_regions(regions: &[&str]) -> Self {
        Self {
            regions: Some(Arc::new(regions.iter().map(|r| r.to_string()).collect())),
            ..Self::default()
        }
    }

    /// Allocate an unattached floating IP
    pub fn allocate(&self, ip: &str) -> &Self {
        self.state.lock().unwrap().floating_ips.insert(
            ip.to_string(),
            FloatingIp {
                id: format!("fip-{ip}"),
                ip: ip.to_string(),
                pool: "public".to_string(),
                ..FloatingIp::default()
            },
        );
        self
    }

    /// Release a floating IP entirely
    pub fn release(&self, ip: &str) {
        self.state.lock().unwrap().floating_ips.remove(ip);
    }

    /// Detach a floating IP behind the adapter's back
    pub fn detach_out_of_band(&self, ip: &str) {
        if let Some(fip) = self.state.lock().unwrap().floating_ips.get_mut(ip) {
            fip.instance_id.clear();
            fip.fixed_ip.clear();
        }
    }

    /// Current live record of a floating IP
    pub fn floating_ip(&self, ip: &str) -> Option<FloatingIp> {
        self.state.lock().unwrap().floating_ips.get(ip).cloned()
    }

    pub fn fail_next_associate(&self, failure: Failure) {
        self.state.lock().unwrap().fail_next_associate = Some(failure);
    }

    pub fn fail_next_disassociate(&self, failure: Failure) {
        self.state.lock().unwrap().fail_next_disassociate = Some(failure);
    }

    pub fn fail_next_get(&self, failure: Failure) {
        self.state.lock().unwrap().fail_next_get = Some(failure);
    }

    pub fn associate_calls(&self) -> usize {
        self.counters.associate.load(Ordering::SeqCst)
    }

    pub fn disassociate_calls(&self) -> usize {
        self.counters.disassociate.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.counters.get.load(Ordering::SeqCst)
    }

    pub fn client_calls(&self) -> usize {
        self.counters.client.load(Ordering::SeqCst)
    }

    /// Total calls made against the compute API
    pub fn api_calls(&self) -> usize {
        self.associate_calls() + self.disassociate_calls() + self.get_calls()
    }
}

#[async_trait::async_trait]
impl ComputeClient for MockCloud {
    async fn associate_instance(&self, instance_id: &str, opts: &AssociateOpts) -> Result<()> {
        self.counters.associate.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.fail_next_associate.take() {
            return Err(failure.into_error("associate"));
        }

        let fip = state
            .floating_ips
            .get_mut(&opts.floating_ip)
            .ok_or_else(|| Error::not_found(format!("floating ip {}", opts.floating_ip)))?;
        fip.instance_id = instance_id.to_string();
        fip.fixed_ip = if opts.fixed_ip.is_empty() {
            "10.0.0.4".to_string()
        } else {
            opts.fixed_ip.clone()
        };
        Ok(())
    }

    async fn disassociate_instance(
        &self,
        instance_id: &str,
        opts: &DisassociateOpts,
    ) -> Result<()> {
        self.counters.disassociate.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.fail_next_disassociate.take() {
            return Err(failure.into_error("disassociate"));
        }

        match state.floating_ips.get_mut(&opts.floating_ip) {
            Some(fip) if fip.instance_id == instance_id => {
                fip.instance_id.clear();
                fip.fixed_ip.clear();
                Ok(())
            }
            _ => Err(Error::not_found(format!(
                "floating ip {} on {}",
                opts.floating_ip, instance_id
            ))),
        }
    }

    async fn get_floating_ip(&self, floating_ip: &str) -> Result<FloatingIp> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.fail_next_get.take() {
            return Err(failure.into_error("get"));
        }

        state
            .floating_ips
            .get(floating_ip)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("floating ip {floating_ip}")))
    }

    fn client_name(&self) -> &'static str {
        "mock"
    }
}

impl ComputeClientFactory for MockCloud {
    fn client(&self, region: &str) -> Result<Arc<dyn ComputeClient>> {
        self.counters.client.fetch_add(1, Ordering::SeqCst);
        if let Some(regions) = &self.regions
            && !regions.iter().any(|r| r == region)
        {
            return Err(Error::client_init(format!("no compute endpoint for region '{region}'")));
        }
        Ok(Arc::new(self.clone()))
    }
}
