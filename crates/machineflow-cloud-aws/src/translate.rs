//! Translation between the canonical instance model and EC2 wire types

use aws_sdk_ec2::types::{
    IamInstanceProfileSpecification, Instance as Ec2Instance, ResourceType, Tag, TagSpecification,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use machineflow_cloud::{CloudError, Instance, InstanceState, ResourceReference, Result, Tags};

/// Parameters of a single EC2 `RunInstances` call
///
/// Optional collections are `None` rather than empty so that they are left
/// out of the request entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInstancesRequest {
    pub instance_type: String,
    pub image_id: String,
    pub subnet_id: String,
    pub key_name: Option<String>,
    pub ebs_optimized: Option<bool>,
    /// Base64-encoded bootstrap payload
    pub user_data: Option<String>,
    pub security_group_ids: Option<Vec<String>>,
    pub iam_instance_profile: Option<IamInstanceProfileSpecification>,
    pub tag_specifications: Option<Vec<TagSpecification>>,
    pub min_count: i32,
    pub max_count: i32,
}

/// Build the `RunInstances` parameters for `instance`
pub fn to_run_instances_request(instance: &Instance) -> RunInstancesRequest {
    let user_data = instance
        .user_data
        .as_ref()
        .map(|data| STANDARD.encode(data.as_bytes()));

    let security_group_ids = if instance.security_group_ids.is_empty() {
        None
    } else {
        Some(instance.security_group_ids.clone())
    };

    let iam_instance_profile = instance
        .iam_profile
        .as_ref()
        .and_then(|profile| profile.arn.as_deref())
        .map(|arn| IamInstanceProfileSpecification::builder().arn(arn).build());

    let tag_specifications = if instance.tags.is_empty() {
        None
    } else {
        Some(vec![
            TagSpecification::builder()
                .resource_type(ResourceType::Instance)
                .set_tags(Some(to_wire_tags(&instance.tags)))
                .build(),
        ])
    };

    RunInstancesRequest {
        instance_type: instance.instance_type.clone(),
        image_id: instance.image_id.clone(),
        subnet_id: instance.subnet_id.clone(),
        key_name: instance.key_name.clone(),
        ebs_optimized: instance.ebs_optimized,
        user_data,
        security_group_ids,
        iam_instance_profile,
        tag_specifications,
        min_count: 1,
        max_count: 1,
    }
}

/// Map an EC2 instance description onto the canonical model.
///
/// Identifier, state, type, subnet and image are always present on a valid
/// response; their absence is a protocol violation.
pub fn from_wire_instance(wire: &Ec2Instance) -> Result<Instance> {
    let id = required(wire.instance_id(), "instance id")?;
    let state = required(
        wire.state().and_then(|s| s.name()).map(|n| n.as_str()),
        "state name",
    )?;
    let instance_type = required(wire.instance_type().map(|t| t.as_str()), "instance type")?;
    let subnet_id = required(wire.subnet_id(), "subnet id")?;
    let image_id = required(wire.image_id(), "image id")?;

    let mut instance = Instance {
        id: Some(id.to_string()),
        state: InstanceState::from_name(state),
        instance_type: instance_type.to_string(),
        subnet_id: subnet_id.to_string(),
        image_id: image_id.to_string(),
        key_name: wire.key_name().map(str::to_string),
        private_ip: wire.private_ip_address().map(str::to_string),
        public_ip: wire.public_ip_address().map(str::to_string),
        ena_support: wire.ena_support(),
        ebs_optimized: wire.ebs_optimized(),
        ..Default::default()
    };

    for group in wire.security_groups() {
        if let Some(group_id) = group.group_id() {
            instance.security_group_ids.push(group_id.to_string());
            instance.security_groups.insert(
                group_id.to_string(),
                group.group_name().unwrap_or_default().to_string(),
            );
        }
    }

    if let Some(profile) = wire.iam_instance_profile() {
        if let Some(arn) = profile.arn() {
            instance.iam_profile = Some(ResourceReference {
                id: profile.id().map(str::to_string),
                arn: Some(arn.to_string()),
            });
        }
    }

    instance.tags = from_wire_tags(wire.tags());

    Ok(instance)
}

pub fn to_wire_tags(tags: &Tags) -> Vec<Tag> {
    tags.iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}

/// Tags without a key are dropped
pub fn from_wire_tags(tags: &[Tag]) -> Tags {
    tags.iter()
        .filter_map(|tag| {
            tag.key()
                .map(|key| (key.to_string(), tag.value().unwrap_or_default().to_string()))
        })
        .collect()
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| {
        CloudError::ProtocolViolation(format!("EC2 instance response is missing {}", field))
    })
}
