//! EC2 implementation of [`InstanceClient`]

use crate::error::from_sdk_error;
use crate::translate::{
    RunInstancesRequest, from_wire_instance, to_run_instances_request, to_wire_tags,
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::operation::run_instances::RunInstancesOutput;
use aws_sdk_ec2::types::InstanceType;
use machineflow_cloud::{CloudError, Instance, InstanceClient, Result, Tags};
use tracing::debug;

/// Instance client backed by the EC2 API
#[derive(Clone)]
pub struct Ec2InstanceClient {
    client: Client,
    region: String,
}

impl Ec2InstanceClient {
    /// Load AWS configuration from the environment for `region`
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::from_sdk_config(&config, region)
    }

    pub fn from_sdk_config(config: &SdkConfig, region: &str) -> Self {
        Self::from_client(Client::new(config), region)
    }

    pub fn from_client(client: Client, region: &str) -> Self {
        Self {
            client,
            region: region.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn send_run_instances(&self, request: RunInstancesRequest) -> Result<Instance> {
        let response = self
            .client
            .run_instances()
            .instance_type(InstanceType::from(request.instance_type.as_str()))
            .image_id(request.image_id)
            .subnet_id(request.subnet_id)
            .set_key_name(request.key_name)
            .set_ebs_optimized(request.ebs_optimized)
            .set_user_data(request.user_data)
            .set_security_group_ids(request.security_group_ids)
            .set_iam_instance_profile(request.iam_instance_profile)
            .set_tag_specifications(request.tag_specifications)
            .min_count(request.min_count)
            .max_count(request.max_count)
            .send()
            .await
            .map_err(from_sdk_error)?;

        launched_instance(&response)
    }
}

/// The single instance described for `instance_id`.
///
/// An empty reservation list means the id is unknown.
fn described_instance(response: &DescribeInstancesOutput, instance_id: &str) -> Result<Instance> {
    let wire = response
        .reservations()
        .first()
        .and_then(|r| r.instances().first())
        .ok_or_else(|| CloudError::ResourceNotFound(instance_id.to_string()))?;

    from_wire_instance(wire)
}

fn launched_instance(response: &RunInstancesOutput) -> Result<Instance> {
    let wire = response.instances().first().ok_or_else(|| {
        CloudError::ProtocolViolation(format!(
            "no instance returned for reservation {}",
            response.reservation_id().unwrap_or("<none>")
        ))
    })?;

    from_wire_instance(wire)
}

impl std::fmt::Debug for Ec2InstanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2InstanceClient")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl InstanceClient for Ec2InstanceClient {
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance> {
        debug!(instance_id = %instance_id, region = %self.region, "Describing instance");

        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(from_sdk_error)?;

        described_instance(&response, instance_id)
    }

    async fn run_instance(&self, instance: &Instance) -> Result<Instance> {
        self.send_run_instances(to_run_instances_request(instance)).await
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(from_sdk_error)?;

        Ok(())
    }

    async fn modify_instance_security_groups(
        &self,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        self.client
            .modify_instance_attribute()
            .instance_id(instance_id)
            .set_groups(Some(group_ids.to_vec()))
            .send()
            .await
            .map_err(from_sdk_error)?;

        Ok(())
    }

    async fn create_tags(&self, resource_id: &str, tags: &Tags) -> Result<()> {
        self.client
            .create_tags()
            .resources(resource_id)
            .set_tags(Some(to_wire_tags(tags)))
            .send()
            .await
            .map_err(from_sdk_error)?;

        Ok(())
    }

    async fn delete_tags(&self, resource_id: &str, tags: &Tags) -> Result<()> {
        self.client
            .delete_tags()
            .resources(resource_id)
            .set_tags(Some(to_wire_tags(tags)))
            .send()
            .await
            .map_err(from_sdk_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        Instance as Ec2Instance, InstanceState as Ec2InstanceState, InstanceStateName, Reservation,
    };
    use machineflow_cloud::InstanceState;

    fn pending_instance(id: &str) -> Ec2Instance {
        Ec2Instance::builder()
            .instance_id(id)
            .state(
                Ec2InstanceState::builder()
                    .name(InstanceStateName::Pending)
                    .build(),
            )
            .instance_type(InstanceType::T3Micro)
            .subnet_id("subnet-1")
            .image_id("ami-1")
            .build()
    }

    #[test]
    fn test_describe_without_reservations_is_not_found() {
        let response = DescribeInstancesOutput::builder().build();

        let err = described_instance(&response, "i-0abc").unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, CloudError::ResourceNotFound(ref id) if id == "i-0abc"));
    }

    #[test]
    fn test_describe_empty_reservation_is_not_found() {
        let response = DescribeInstancesOutput::builder()
            .reservations(Reservation::builder().reservation_id("r-1").build())
            .build();

        let err = described_instance(&response, "i-0abc").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_describe_picks_first_instance() {
        let response = DescribeInstancesOutput::builder()
            .reservations(
                Reservation::builder()
                    .instances(pending_instance("i-0abc"))
                    .build(),
            )
            .build();

        let instance = described_instance(&response, "i-0abc").unwrap();
        assert_eq!(instance.id.as_deref(), Some("i-0abc"));
        assert_eq!(instance.state, InstanceState::Pending);
    }

    #[test]
    fn test_run_without_instances_is_protocol_violation() {
        let response = RunInstancesOutput::builder().reservation_id("r-1").build();

        let err = launched_instance(&response).unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, CloudError::ProtocolViolation(ref msg) if msg.contains("r-1")));
    }

    #[test]
    fn test_run_returns_launched_instance() {
        let response = RunInstancesOutput::builder()
            .reservation_id("r-1")
            .instances(pending_instance("i-0new"))
            .build();

        let instance = launched_instance(&response).unwrap();
        assert_eq!(instance.id.as_deref(), Some("i-0new"));
        assert_eq!(instance.instance_type, "t3.micro");
    }

    // Note: These tests require AWS credentials and are marked as integration tests
    // They are skipped in regular test runs

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_client_creation() {
        let client = Ec2InstanceClient::new("us-east-1").await;
        assert_eq!(client.region(), "us-east-1");
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_describe_unknown_instance_is_not_found() {
        let client = Ec2InstanceClient::new("us-east-1").await;
        let err = client
            .describe_instance("i-00000000000000000")
            .await
            .unwrap_err();
        assert!(client.is_not_found(&err));
    }
}
