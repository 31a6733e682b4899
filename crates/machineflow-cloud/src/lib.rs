//! machineflow instance reconciliation
//!
//! This crate reconciles the desired state of a cluster machine against the
//! compute instance backing it in a cloud provider. It is provider-agnostic:
//! provider crates implement [`InstanceClient`] and translate their wire types
//! to the canonical [`Instance`] model.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              control loop (caller)               │
//! │   persists MachineProviderStatus.instance_id     │
//! └─────────────────┬───────────────────────────────┘
//!                   │ reconcile / tags / groups
//! ┌─────────────────▼───────────────────────────────┐
//! │               machineflow-cloud                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          InstanceReconciler               │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │CreationPolicy│  │ Tag planning │            │
//! │  └──────────────┘  └──────────────┘            │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait InstanceClient { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ machineflow-  │
//! │  cloud-aws    │
//! └───────────────┘
//! ```

pub mod bootstrap;
pub mod error;
pub mod instance;
pub mod machine;
pub mod policy;
pub mod provider;
pub mod reconciler;
pub mod tags;

// Re-exports
pub use error::{CloudError, Result};
pub use instance::{Instance, InstanceState, ResourceReference, Tags};
pub use machine::{
    AmiReference, ClusterProviderStatus, MachineProviderConfig, MachineProviderStatus,
    MachineRole, MachineSpec, Network, SecurityGroup, SecurityGroupRole, Subnet, Subnets,
};
pub use policy::{CreationPolicy, ImageLookup};
pub use provider::InstanceClient;
pub use reconciler::InstanceReconciler;
pub use tags::{TagAction, TagDiff, plan_update};
