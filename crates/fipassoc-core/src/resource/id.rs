//! Composite association id
//!
//! The compute API has no object for an association, so the resource is
//! identified by `<floating_ip>/<instance_id>/<fixed_ip>`. The format is
//! persisted in existing state and must not change.
//!
//! Parsing takes the first three `/`-separated segments positionally.
//! A `fixed_ip` that itself contains `/` does not survive a round trip.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const SEPARATOR: char = '/';

/// Parsed form of the composite id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationId {
    /// The public address
    pub floating_ip: String,
    /// The instance it is attached to
    pub instance_id: String,
    /// Fixed IP on the instance, may be empty
    pub fixed_ip: String,
}

impl AssociationId {
    /// Create an id from its parts
    pub fn new(
        floating_ip: impl Into<String>,
        instance_id: impl Into<String>,
        fixed_ip: impl Into<String>,
    ) -> Self {
        Self {
            floating_ip: floating_ip.into(),
            instance_id: instance_id.into(),
            fixed_ip: fixed_ip.into(),
        }
    }

    /// Parse a composite id
    ///
    /// # Errors
    ///
    /// [`Error::MalformedId`] if `id` has fewer than three segments.
    pub fn parse(id: &str) -> Result<Self> {
        let mut parts = id.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(floating_ip), Some(instance_id), Some(fixed_ip)) => {
                Ok(Self::new(floating_ip, instance_id, fixed_ip))
            }
            _ => Err(Error::malformed_id(id)),
        }
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.floating_ip, self.instance_id, self.fixed_ip
        )
    }
}

impl FromStr for AssociationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
