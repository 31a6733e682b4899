//! EC2 provider for machineflow
//!
//! Implements [`machineflow_cloud::InstanceClient`] on top of `aws-sdk-ec2`.
//! All EC2 field names and shapes stay in this crate.
//!
//! # Example
//!
//! ```ignore
//! use machineflow_cloud::{CreationPolicy, ImageLookup, InstanceReconciler};
//! use machineflow_cloud_aws::Ec2InstanceClient;
//!
//! let client = Ec2InstanceClient::new("us-east-1").await;
//! let images = ImageLookup::default().with_image("us-east-1", "ami-0123456789abcdef0");
//! let reconciler = InstanceReconciler::new(client, CreationPolicy::new(images));
//!
//! let instance = reconciler.reconcile(&status, &machine, &config, &cluster).await?;
//! ```

pub mod client;
pub mod error;
pub mod translate;

pub use client::Ec2InstanceClient;
pub use error::{classify_error, from_sdk_error};
pub use translate::{RunInstancesRequest, from_wire_instance, to_run_instances_request};
