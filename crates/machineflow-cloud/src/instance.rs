//! Canonical instance model
//!
//! Provider adapters translate their wire types to and from [`Instance`];
//! nothing above the adapter layer sees provider-specific shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key-value labels attached to a provider resource
pub type Tags = BTreeMap<String, String>;

/// Lifecycle state of an instance, as reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    #[default]
    Unknown,
}

impl InstanceState {
    /// Map a provider state name; unrecognised names become `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            _ => InstanceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Unknown => "unknown",
        }
    }

    /// Whether the instance is gone or on its way out
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstanceState::ShuttingDown | InstanceState::Terminated
        )
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a provider resource by id or ARN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

impl ResourceReference {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            arn: None,
        }
    }

    pub fn with_arn(arn: impl Into<String>) -> Self {
        Self {
            id: None,
            arn: Some(arn.into()),
        }
    }
}

/// A provider compute instance
///
/// `instance_type`, `image_id`, `subnet_id` and `user_data` are fixed once the
/// instance exists. Only `tags` and `security_group_ids` are reconciled in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Provider-assigned identifier, set only after creation succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub state: InstanceState,

    /// Instance size/class (e.g. "m5.large")
    #[serde(rename = "type")]
    pub instance_type: String,

    pub image_id: String,

    pub subnet_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    /// Observed security groups, id to name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_groups: BTreeMap<String, String>,

    /// Bootstrap payload, written once at creation and never read back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_profile: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ena_support: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs_optimized: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
}

impl Instance {
    /// Start a creation request for the given type, image and subnet
    pub fn new(
        instance_type: impl Into<String>,
        image_id: impl Into<String>,
        subnet_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_type: instance_type.into(),
            image_id: image_id.into(),
            subnet_id: subnet_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    pub fn with_security_group(mut self, group_id: impl Into<String>) -> Self {
        self.security_group_ids.push(group_id.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    /// One-line JSON rendering for error context, with user data reduced to its size
    pub fn describe(&self) -> String {
        let mut summary = self.clone();
        if let Some(data) = &summary.user_data {
            summary.user_data = Some(format!("<{} bytes>", data.len()));
        }
        serde_json::to_string(&summary).unwrap_or_else(|_| format!("{:?}", summary))
    }
}
