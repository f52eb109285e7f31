//! doksplan: resolve a declarative DigitalOcean Kubernetes configuration into
//! an ordered, dependency-annotated plan of resource intents.
//!
//! The library is pure apart from one version lookup; it never creates or
//! inspects live infrastructure.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod model;
pub mod resolver;

pub use catalog::{DigitalOceanCatalog, StaticCatalog, VersionCatalog};
pub use config::ClusterConfig;
pub use resolver::{Plan, ResolveError, Resolver};
