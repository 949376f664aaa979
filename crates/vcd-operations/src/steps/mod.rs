//! Provisioning steps that run inside a [`ProvisionPipeline`](crate::pipeline::ProvisionPipeline).
//!
//! Steps talk to each other only through [`vcd_core::ProvisionState`], using
//! the keys in [`vcd_core::keys`].

mod insert_media;
mod instantiate;

pub use insert_media::InsertMediaStep;
pub use instantiate::{InstantiateArgs, InstantiateStep};
