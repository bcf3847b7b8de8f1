//! Device resource locator
//!
//! A locator addresses one data point on a device:
//! `/object[/instance[/resource[/resource-instance]]]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest usable identifier; 65535 is reserved
pub const MAX_RESOURCE_ID: u16 = 65534;

/// Errors from parsing a resource locator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("resource path is empty")]
    Empty,
    #[error("resource path must start with '/'")]
    MissingLeadingSlash,
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
    #[error("resource path has more than four segments")]
    TooManySegments,
}

/// Structured device resource path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceUri {
    pub object_id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_instance_id: Option<u16>,
}

impl ResourceUri {
    /// Locator for a whole object
    pub fn object(object_id: u16) -> Self {
        Self {
            object_id,
            instance_id: None,
            resource_id: None,
            resource_instance_id: None,
        }
    }

    /// Locator for a single resource
    pub fn resource(object_id: u16, instance_id: u16, resource_id: u16) -> Self {
        Self {
            object_id,
            instance_id: Some(instance_id),
            resource_id: Some(resource_id),
            resource_instance_id: None,
        }
    }
}

impl FromStr for ResourceUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UriError::Empty);
        }
        let rest = s.strip_prefix('/').ok_or(UriError::MissingLeadingSlash)?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Err(UriError::Empty);
        }

        let mut ids = [None; 4];
        for (index, segment) in rest.split('/').enumerate() {
            if index >= ids.len() {
                return Err(UriError::TooManySegments);
            }
            ids[index] = Some(parse_segment(segment)?);
        }

        Ok(Self {
            object_id: ids[0].ok_or(UriError::Empty)?,
            instance_id: ids[1],
            resource_id: ids[2],
            resource_instance_id: ids[3],
        })
    }
}

fn parse_segment(segment: &str) -> Result<u16, UriError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UriError::InvalidSegment(segment.to_string()));
    }

    segment
        .parse::<u32>()
        .ok()
        .filter(|id| *id <= MAX_RESOURCE_ID as u32)
        .map(|id| id as u16)
        .ok_or_else(|| UriError::InvalidSegment(segment.to_string()))
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.object_id)?;
        for id in [
            self.instance_id,
            self.resource_id,
            self.resource_instance_id,
        ]
        .into_iter()
        .flatten()
        {
            write!(f, "/{}", id)?;
        }
        Ok(())
    }
}
