//! Machine and cluster inputs consumed by the reconciler
//!
//! These mirror the objects the owning control loop keeps: the machine spec
//! (labels), the machine provider config (what to run), the machine provider
//! status (what was recorded last time) and the cluster provider status
//! (region, subnets and security groups created for the cluster).

use crate::instance::{InstanceState, ResourceReference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Label key that selects the machine's role
pub const ROLE_LABEL: &str = "set";

/// Role of a machine within the cluster, resolved once from its labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineRole {
    ControlPlane,
    Node,
    #[default]
    Unspecified,
}

impl MachineRole {
    /// Resolve the role from a label value ("controlplane" or "node")
    pub fn from_label(value: Option<&str>) -> Self {
        match value {
            Some("controlplane") => MachineRole::ControlPlane,
            Some("node") => MachineRole::Node,
            _ => MachineRole::Unspecified,
        }
    }

    /// Security group this role attaches to, if any
    pub fn security_group_role(&self) -> Option<SecurityGroupRole> {
        match self {
            MachineRole::ControlPlane => Some(SecurityGroupRole::ControlPlane),
            MachineRole::Node => Some(SecurityGroupRole::Node),
            MachineRole::Unspecified => None,
        }
    }
}

impl std::fmt::Display for MachineRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineRole::ControlPlane => write!(f, "controlplane"),
            MachineRole::Node => write!(f, "node"),
            MachineRole::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// The machine being reconciled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl MachineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn role(&self) -> MachineRole {
        MachineRole::from_label(self.labels.get(ROLE_LABEL).map(String::as_str))
    }
}

/// Image selection; an unset id falls back to the region default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmiReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Per-machine provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineProviderConfig {
    pub instance_type: String,

    #[serde(default)]
    pub ami: AmiReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<ResourceReference>,

    /// SSH key pair name; empty means none
    #[serde(default)]
    pub key_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<ResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs_optimized: Option<bool>,
}

impl MachineProviderConfig {
    pub fn new(instance_type: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            ..Default::default()
        }
    }

    pub fn with_ami(mut self, id: impl Into<String>) -> Self {
        self.ami.id = Some(id.into());
        self
    }

    pub fn with_subnet(mut self, id: impl Into<String>) -> Self {
        self.subnet = Some(ResourceReference::with_id(id));
        self
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_iam_instance_profile(mut self, arn: impl Into<String>) -> Self {
        self.iam_instance_profile = Some(ResourceReference::with_arn(arn));
        self
    }
}

/// What the control loop recorded about the machine on earlier passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineProviderStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_state: Option<InstanceState>,
}

impl MachineProviderStatus {
    pub fn with_instance_id(id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(id.into()),
            instance_state: None,
        }
    }
}

/// A subnet created for the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,

    #[serde(default)]
    pub is_public: bool,
}

impl Subnet {
    pub fn private(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn public(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_public: true,
            ..Default::default()
        }
    }
}

/// Ordered subnet list with public/private filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subnets(pub Vec<Subnet>);

impl Subnets {
    pub fn filter_private(&self) -> Vec<&Subnet> {
        self.0.iter().filter(|s| !s.is_public).collect()
    }

    pub fn filter_public(&self) -> Vec<&Subnet> {
        self.0.iter().filter(|s| s.is_public).collect()
    }
}

impl From<Vec<Subnet>> for Subnets {
    fn from(subnets: Vec<Subnet>) -> Self {
        Self(subnets)
    }
}

/// Role a cluster security group is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityGroupRole {
    Bastion,
    ControlPlane,
    Node,
}

impl std::fmt::Display for SecurityGroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityGroupRole::Bastion => write!(f, "bastion"),
            SecurityGroupRole::ControlPlane => write!(f, "controlplane"),
            SecurityGroupRole::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Network resources created for the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(default)]
    pub subnets: Subnets,

    #[serde(default)]
    pub security_groups: HashMap<SecurityGroupRole, SecurityGroup>,
}

/// Cluster-level status shared by every machine in the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProviderStatus {
    pub region: String,

    #[serde(default)]
    pub network: Network,
}

impl ClusterProviderStatus {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            network: Network::default(),
        }
    }

    pub fn with_subnet(mut self, subnet: Subnet) -> Self {
        self.network.subnets.0.push(subnet);
        self
    }

    pub fn with_security_group(mut self, role: SecurityGroupRole, id: impl Into<String>) -> Self {
        let id = id.into();
        self.network.security_groups.insert(
            role,
            SecurityGroup {
                name: format!("{}-{}", self.region, role),
                id,
            },
        );
        self
    }

    pub fn security_group(&self, role: SecurityGroupRole) -> Option<&SecurityGroup> {
        self.network.security_groups.get(&role)
    }
}
