//! Instance lifecycle reconciler
//!
//! Implements the create-or-get protocol for a single machine:
//!
//! ```text
//! status.instance_id set? ──yes──▶ describe ──found──▶ return it
//!         │                           │
//!         no                      not found ──▶ create
//!         │                           │
//!         ▼                       other error ──▶ propagate (never create)
//!       create
//! ```
//!
//! Calls for the same machine must be serialized by the caller; two
//! concurrent reconciles can both observe "absent" and create twice.

use crate::error::{CloudError, Result};
use crate::instance::{Instance, Tags};
use crate::machine::{
    ClusterProviderStatus, MachineProviderConfig, MachineProviderStatus, MachineSpec,
};
use crate::policy::CreationPolicy;
use crate::provider::InstanceClient;
use crate::tags::{TagAction, plan_update};

/// Reconciles machines against provider instances
pub struct InstanceReconciler<C> {
    client: C,
    policy: CreationPolicy,
}

impl<C: InstanceClient> InstanceReconciler<C> {
    pub fn new(client: C, policy: CreationPolicy) -> Self {
        Self { client, policy }
    }

    /// Return the instance if it exists.
    ///
    /// No identifier means no lookup. Not-found maps to `None`; every other
    /// failure is an error and must not be read as absence.
    pub async fn find_existing(&self, instance_id: Option<&str>) -> Result<Option<Instance>> {
        let Some(instance_id) = instance_id else {
            return Ok(None);
        };

        match self.client.describe_instance(instance_id).await {
            Ok(instance) => {
                tracing::debug!(
                    instance_id = %instance_id,
                    state = %instance.state,
                    "Found instance"
                );
                Ok(Some(instance))
            }
            Err(e) if self.client.is_not_found(&e) => {
                tracing::warn!(instance_id = %instance_id, "Recorded instance no longer exists");
                Ok(None)
            }
            Err(e) => Err(e.context(format!("failed to describe instance {}", instance_id))),
        }
    }

    /// Build a new instance from policy and submit it.
    ///
    /// Configuration errors are returned before any provider call. Provider
    /// errors carry the attempted instance; nothing is rolled back.
    pub async fn create_instance(
        &self,
        machine: &MachineSpec,
        config: &MachineProviderConfig,
        cluster: &ClusterProviderStatus,
    ) -> Result<Instance> {
        let input = self.policy.build_instance(machine, config, cluster)?;

        tracing::info!(
            machine = machine.name.as_deref().unwrap_or("<unnamed>"),
            role = %machine.role(),
            instance_type = %input.instance_type,
            image_id = %input.image_id,
            subnet_id = %input.subnet_id,
            "Running instance"
        );

        let created = self
            .client
            .run_instance(&input)
            .await
            .map_err(|e| e.context(format!("failed to run instance {}", input.describe())))?;

        if created.id.is_none() {
            return Err(CloudError::ProtocolViolation(
                "run instance returned an instance without an id".to_string(),
            ));
        }

        tracing::info!(
            instance_id = created.id.as_deref().unwrap_or_default(),
            state = %created.state,
            "Instance created"
        );
        Ok(created)
    }

    /// Return the recorded instance if it still exists, otherwise create one
    pub async fn reconcile(
        &self,
        status: &MachineProviderStatus,
        machine: &MachineSpec,
        config: &MachineProviderConfig,
        cluster: &ClusterProviderStatus,
    ) -> Result<Instance> {
        if let Some(instance) = self.find_existing(status.instance_id.as_deref()).await? {
            return Ok(instance);
        }

        self.create_instance(machine, config, cluster).await
    }

    pub async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        tracing::info!(instance_id = %instance_id, "Terminating instance");

        self.client
            .terminate_instance(instance_id)
            .await
            .map_err(|e| e.context(format!("failed to terminate instance {}", instance_id)))
    }

    /// Replace the instance's security groups with `group_ids` in one call
    pub async fn update_security_groups(
        &self,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()> {
        if group_ids.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "refusing to remove every security group from instance {}",
                instance_id
            )));
        }

        tracing::debug!(
            instance_id = %instance_id,
            groups = ?group_ids,
            "Updating security groups"
        );

        self.client
            .modify_instance_security_groups(instance_id, group_ids)
            .await
            .map_err(|e| {
                e.context(format!(
                    "failed to modify security groups of instance {}",
                    instance_id
                ))
            })
    }

    /// Apply tag changes to a resource with at most one create and one delete call
    pub async fn update_resource_tags(
        &self,
        resource_id: &str,
        create: &Tags,
        delete: &Tags,
    ) -> Result<()> {
        let actions = plan_update(resource_id, create, delete);
        if actions.is_empty() {
            tracing::debug!(resource_id = %resource_id, "Tags already up to date");
            return Ok(());
        }

        for action in &actions {
            tracing::debug!("Applying: {}", action);
            let result = match action {
                TagAction::Create { resource_id, tags } => {
                    self.client.create_tags(resource_id, tags).await
                }
                TagAction::Delete { resource_id, tags } => {
                    self.client.delete_tags(resource_id, tags).await
                }
            };
            result.map_err(|e| e.context(format!("failed to {}", action)))?;
        }

        Ok(())
    }
}
