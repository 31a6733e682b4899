//! Instance client capability
//!
//! The reconciler talks to the cloud only through [`InstanceClient`]. Adapters
//! own the wire format and the mapping of provider error codes onto
//! [`CloudError`].

use crate::error::{CloudError, Result};
use crate::instance::{Instance, Tags};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Provider operations needed to reconcile one instance
///
/// Implementations must be safe to share across tasks reconciling different
/// machines.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InstanceClient: Send + Sync {
    /// Describe a single instance. A missing instance is an error for which
    /// [`InstanceClient::is_not_found`] returns true.
    async fn describe_instance(&self, instance_id: &str) -> Result<Instance>;

    /// Create exactly one instance and return it as the provider reports it
    async fn run_instance(&self, instance: &Instance) -> Result<Instance>;

    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;

    /// Replace the full security group membership of an instance
    async fn modify_instance_security_groups(
        &self,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<()>;

    async fn create_tags(&self, resource_id: &str, tags: &Tags) -> Result<()>;

    async fn delete_tags(&self, resource_id: &str, tags: &Tags) -> Result<()>;

    /// Whether `err` means the resource does not exist
    fn is_not_found(&self, err: &CloudError) -> bool {
        err.is_not_found()
    }
}
