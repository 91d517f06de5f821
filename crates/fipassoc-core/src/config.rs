//! Configuration and schema types
//!
//! [`AssociationConfig`] is the desired state of one association resource,
//! [`ASSOCIATION_SCHEMA`] describes its fields, and [`ProviderConfig`]
//! describes how to reach the compute service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resource::AssociationState;

/// Environment variable that supplies the default region
pub const REGION_ENV_VAR: &str = "OS_REGION_NAME";

/// Description of one resource field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    /// Field name
    pub name: &'static str,
    /// Whether the user must supply a value
    pub required: bool,
    /// Whether changing the value forces destroy-and-recreate
    pub force_new: bool,
    /// Environment variable consulted when no value is given
    pub env_default: Option<&'static str>,
}

/// Schema of the floating IP association resource
///
/// Every field is ForceNew: there is no in-place update.
pub const ASSOCIATION_SCHEMA: &[SchemaField] = &[
    SchemaField {
        name: "region",
        required: true,
        force_new: true,
        env_default: Some(REGION_ENV_VAR),
    },
    SchemaField {
        name: "floating_ip",
        required: true,
        force_new: true,
        env_default: None,
    },
    SchemaField {
        name: "instance_id",
        required: true,
        force_new: true,
        env_default: None,
    },
    SchemaField {
        name: "fixed_ip",
        required: false,
        force_new: true,
        env_default: None,
    },
];

/// Desired state of a floating IP association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// Region to operate in
    #[serde(default = "default_region")]
    pub region: String,

    /// The public address to attach
    pub floating_ip: String,

    /// The instance to attach it to
    pub instance_id: String,

    /// Fixed IP on the instance, for multi-NIC instances
    #[serde(default)]
    pub fixed_ip: String,
}

impl AssociationConfig {
    /// Create a configuration; the region falls back to `OS_REGION_NAME`
    pub fn new(floating_ip: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            region: default_region(),
            floating_ip: floating_ip.into(),
            instance_id: instance_id.into(),
            fixed_ip: String::new(),
        }
    }

    /// Set the region explicitly
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the fixed IP
    pub fn with_fixed_ip(mut self, fixed_ip: impl Into<String>) -> Self {
        self.fixed_ip = fixed_ip.into();
        self
    }

    /// Validate required fields
    ///
    /// Addresses are not checked for format; the compute service owns that.
    pub fn validate(&self) -> Result<(), crate::Error> {
        for field in ASSOCIATION_SCHEMA.iter().filter(|f| f.required) {
            if self.value_of(field.name).is_empty() {
                return Err(match field.env_default {
                    Some(var) => crate::Error::config(format!(
                        "{} is required (set it explicitly or via {})",
                        field.name, var
                    )),
                    None => crate::Error::config(format!("{} is required", field.name)),
                });
            }
        }
        Ok(())
    }

    /// ForceNew fields whose desired value differs from `current`
    ///
    /// A non-empty result means the association must be destroyed and
    /// created again.
    pub fn replacement_fields(&self, current: &AssociationState) -> Vec<&'static str> {
        ASSOCIATION_SCHEMA
            .iter()
            .filter(|f| f.force_new)
            .filter(|f| self.value_of(f.name) != current.value_of(f.name))
            .map(|f| f.name)
            .collect()
    }

    fn value_of(&self, name: &str) -> &str {
        match name {
            "region" => &self.region,
            "floating_ip" => &self.floating_ip,
            "instance_id" => &self.instance_id,
            "fixed_ip" => &self.fixed_ip,
            _ => "",
        }
    }
}

fn default_region() -> String {
    std::env::var(REGION_ENV_VAR).unwrap_or_default()
}

/// Compute provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// OpenStack Compute (Nova)
    OpenStack {
        /// Keystone token sent as `X-Auth-Token`
        auth_token: String,
        /// Compute endpoint per region
        #[serde(default)]
        endpoints: HashMap<String, String>,
        /// Endpoint used for regions missing from `endpoints`
        #[serde(default)]
        default_endpoint: Option<String>,
        /// Log mutating calls instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::OpenStack {
                auth_token,
                endpoints,
                default_endpoint,
                ..
            } => {
                if auth_token.is_empty() {
                    return Err(crate::Error::config("OpenStack auth token cannot be empty"));
                }
                if endpoints.is_empty() && default_endpoint.as_deref().is_none_or(str::is_empty) {
                    return Err(crate::Error::config(
                        "At least one OpenStack compute endpoint is required",
                    ));
                }
                for (region, url) in endpoints {
                    if !url.starts_with("https://") && !url.starts_with("http://") {
                        return Err(crate::Error::config(format!(
                            "Compute endpoint for region '{}' must be an HTTP(S) URL. Got: {}",
                            region, url
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Parse a `region=url,region=url` endpoint list
pub fn parse_endpoint_map(raw: &str) -> Result<HashMap<String, String>, crate::Error> {
    let mut endpoints = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (region, url) = entry.split_once('=').ok_or_else(|| {
            crate::Error::config(format!(
                "Invalid endpoint entry '{}': expected region=url",
                entry
            ))
        })?;
        let (region, url) = (region.trim(), url.trim());
        if region.is_empty() || url.is_empty() {
            return Err(crate::Error::config(format!(
                "Invalid endpoint entry '{}': region and url must be non-empty",
                entry
            )));
        }
        endpoints.insert(region.to_string(), url.trim_end_matches('/').to_string());
    }
    Ok(endpoints)
}
