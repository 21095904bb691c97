//! Typed model of the Thanos receive limits configuration file.
//!
//! See <https://thanos.io/tip/components/receive.md/#understanding-the-configuration-file>
//! for the upstream description of the format. Only the fields the controller reads or
//! writes are modelled; everything else found in a document is kept in the `extra` map of
//! the enclosing struct and written back unchanged.
//!
//! Every optional integer is an [`Option`] so that an omitted field and an explicit `0`
//! survive a decode/encode cycle as two different things.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed limits document: {0}")]
    Decode(#[source] serde_yaml::Error),

    #[error("unable to serialize limits document: {0}")]
    Encode(#[source] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fields present in a document that this crate does not model.
pub type UnknownFields = BTreeMap<String, serde_yaml::Value>;

/// The root of a limits configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsDocument {
    #[serde(default)]
    pub write: WriteLimits,

    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl LimitsDocument {
    /// Decode a document from its YAML text.
    ///
    /// A blank document decodes to the empty document. Unknown keys are accepted at every
    /// level, known keys holding a value of the wrong shape are an error.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(Error::Decode)
    }

    /// Encode the document to YAML text.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::Encode)
    }
}

/// The `write` section: limits applied on the receive write path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteLimits {
    #[serde(default)]
    pub global: GlobalConfig,

    /// Limits applied to any tenant without an entry in `tenants`.
    #[serde(default)]
    pub default: TenantConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenants: Option<BTreeMap<String, TenantConfig>>,

    #[serde(flatten)]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,

    #[serde(default)]
    pub meta_monitoring_url: String,

    /// PromQL evaluated by the meta-monitoring system. Never interpreted here.
    #[serde(default)]
    pub meta_monitoring_limit_query: String,

    #[serde(flatten)]
    pub extra: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_series_limit: Option<i64>,

    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// Per remote-write request limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes_limit: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_limit: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_limit: Option<i64>,

    #[serde(flatten)]
    pub extra: UnknownFields,
}
