//! Creation parameter resolution
//!
//! Turns a machine, its provider config and the cluster status into the
//! [`Instance`] that will be submitted for creation. Explicit config always
//! wins; otherwise defaults come from the cluster status and the injected
//! region image table.

use crate::bootstrap::CONTROL_PLANE_USER_DATA;
use crate::error::{CloudError, Result};
use crate::instance::Instance;
use crate::machine::{ClusterProviderStatus, MachineProviderConfig, MachineRole, MachineSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default image per region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageLookup {
    images: HashMap<String, String>,
}

impl ImageLookup {
    pub fn with_image(mut self, region: impl Into<String>, image_id: impl Into<String>) -> Self {
        self.images.insert(region.into(), image_id.into());
        self
    }

    pub fn get(&self, region: &str) -> Option<&str> {
        self.images.get(region).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Policy for building new instances
#[derive(Debug, Clone)]
pub struct CreationPolicy {
    images: ImageLookup,
    control_plane_user_data: String,
}

impl CreationPolicy {
    pub fn new(images: ImageLookup) -> Self {
        Self {
            images,
            control_plane_user_data: CONTROL_PLANE_USER_DATA.to_string(),
        }
    }

    /// Replace the built-in control-plane bootstrap script
    pub fn with_control_plane_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.control_plane_user_data = user_data.into();
        self
    }

    pub fn images(&self) -> &ImageLookup {
        &self.images
    }

    /// Resolve every creation parameter. Makes no provider calls.
    pub fn build_instance(
        &self,
        machine: &MachineSpec,
        config: &MachineProviderConfig,
        cluster: &ClusterProviderStatus,
    ) -> Result<Instance> {
        if config.instance_type.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "instance type is required".to_string(),
            ));
        }

        let image_id = match config.ami.id.as_deref() {
            Some(id) => id.to_string(),
            None => self
                .images
                .get(&cluster.region)
                .ok_or_else(|| {
                    CloudError::InvalidConfig(format!(
                        "no default image for region {:?}",
                        cluster.region
                    ))
                })?
                .to_string(),
        };

        let subnet_id = match config.subnet.as_ref().and_then(|s| s.id.as_deref()) {
            Some(id) => id.to_string(),
            None => cluster
                .network
                .subnets
                .filter_private()
                .first()
                .map(|s| s.id.clone())
                .ok_or_else(|| {
                    CloudError::InvalidConfig(
                        "failed to run instance, no private subnets available".to_string(),
                    )
                })?,
        };

        let mut instance = Instance::new(&config.instance_type, image_id, subnet_id);

        let role = machine.role();
        if role == MachineRole::ControlPlane {
            instance.user_data = Some(self.control_plane_user_data.clone());
        }

        if let Some(group_role) = role.security_group_role() {
            let group = cluster.security_group(group_role).ok_or_else(|| {
                CloudError::InvalidConfig(format!(
                    "cluster has no {} security group for {} machine",
                    group_role, role
                ))
            })?;
            instance.security_group_ids.push(group.id.clone());
        }

        if !config.key_name.is_empty() {
            instance.key_name = Some(config.key_name.clone());
        }

        if let Some(profile) = &config.iam_instance_profile {
            if profile.arn.is_some() {
                instance.iam_profile = Some(profile.clone());
            }
        }

        instance.ebs_optimized = config.ebs_optimized;

        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ResourceReference;
    use crate::machine::{ROLE_LABEL, SecurityGroupRole, Subnet};

    fn cluster() -> ClusterProviderStatus {
        ClusterProviderStatus::new("us-east-1")
            .with_subnet(Subnet::public("subnet-pub"))
            .with_subnet(Subnet::private("subnet-1"))
            .with_subnet(Subnet::private("subnet-2"))
            .with_security_group(SecurityGroupRole::ControlPlane, "sg-cp")
            .with_security_group(SecurityGroupRole::Node, "sg-node")
    }

    fn policy() -> CreationPolicy {
        CreationPolicy::new(ImageLookup::default().with_image("us-east-1", "ami-default"))
    }

    #[test]
    fn test_control_plane_defaults() {
        let machine = MachineSpec::new("cp-0").with_label(ROLE_LABEL, "controlplane");
        let config = MachineProviderConfig::new("m5.large");

        let instance = policy().build_instance(&machine, &config, &cluster()).unwrap();

        assert_eq!(instance.instance_type, "m5.large");
        assert_eq!(instance.image_id, "ami-default");
        assert_eq!(instance.subnet_id, "subnet-1");
        assert_eq!(instance.security_group_ids, vec!["sg-cp".to_string()]);
        assert_eq!(
            instance.user_data.as_deref(),
            Some(CONTROL_PLANE_USER_DATA)
        );
        assert!(instance.id.is_none());
        assert!(instance.key_name.is_none());
        assert!(instance.iam_profile.is_none());
    }

    #[test]
    fn test_node_gets_node_group_without_user_data() {
        let machine = MachineSpec::new("node-0").with_label(ROLE_LABEL, "node");
        let config = MachineProviderConfig::new("t3.large").with_key_name("ops");

        let instance = policy().build_instance(&machine, &config, &cluster()).unwrap();

        assert_eq!(instance.security_group_ids, vec!["sg-node".to_string()]);
        assert!(instance.user_data.is_none());
        assert_eq!(instance.key_name.as_deref(), Some("ops"));
    }

    #[test]
    fn test_explicit_overrides_without_role() {
        let machine = MachineSpec::new("misc");
        let config = MachineProviderConfig::new("t3.micro")
            .with_ami("ami-123")
            .with_subnet("subnet-9")
            .with_iam_instance_profile("arn:aws:iam::123:instance-profile/nodes");

        let instance = policy()
            .build_instance(&machine, &config, &ClusterProviderStatus::new("nowhere-1"))
            .unwrap();

        assert_eq!(instance.image_id, "ami-123");
        assert_eq!(instance.subnet_id, "subnet-9");
        assert!(instance.security_group_ids.is_empty());
        assert!(instance.user_data.is_none());
        assert_eq!(
            instance.iam_profile,
            Some(ResourceReference::with_arn(
                "arn:aws:iam::123:instance-profile/nodes"
            ))
        );
    }

    #[test]
    fn test_iam_profile_without_arn_is_omitted() {
        let mut config = MachineProviderConfig::new("t3.micro")
            .with_ami("ami-1")
            .with_subnet("subnet-1");
        config.iam_instance_profile = Some(ResourceReference::with_id("nodes"));

        let instance = policy()
            .build_instance(&MachineSpec::default(), &config, &cluster())
            .unwrap();
        assert!(instance.iam_profile.is_none());
    }

    #[test]
    fn test_no_private_subnet_is_config_error() {
        let cluster =
            ClusterProviderStatus::new("us-east-1").with_subnet(Subnet::public("subnet-pub"));
        let config = MachineProviderConfig::new("m5.large");

        let err = policy()
            .build_instance(&MachineSpec::default(), &config, &cluster)
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_unknown_region_is_config_error() {
        let config = MachineProviderConfig::new("m5.large").with_subnet("subnet-1");
        let err = policy()
            .build_instance(
                &MachineSpec::default(),
                &config,
                &ClusterProviderStatus::new("ap-south-2"),
            )
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(msg) if msg.contains("ap-south-2")));
    }

    #[test]
    fn test_missing_role_group_is_config_error() {
        let machine = MachineSpec::new("node-0").with_label(ROLE_LABEL, "node");
        let cluster =
            ClusterProviderStatus::new("us-east-1").with_subnet(Subnet::private("subnet-1"));

        let err = policy()
            .build_instance(&machine, &MachineProviderConfig::new("m5.large"), &cluster)
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_empty_instance_type_is_config_error() {
        let err = policy()
            .build_instance(
                &MachineSpec::default(),
                &MachineProviderConfig::default(),
                &cluster(),
            )
            .unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_user_data_override() {
        let policy = policy().with_control_plane_user_data("#!/bin/sh\necho hi\n");
        let machine = MachineSpec::new("cp-0").with_label(ROLE_LABEL, "controlplane");

        let instance = policy
            .build_instance(&machine, &MachineProviderConfig::new("m5.large"), &cluster())
            .unwrap();
        assert_eq!(instance.user_data.as_deref(), Some("#!/bin/sh\necho hi\n"));
    }
}
