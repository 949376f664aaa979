mod entity;
mod error;
mod request;
mod state;
mod task;

pub use entity::{Entity, EntityKind, Href, Link, LinkRel};
pub use error::CoreError;
pub use request::{
    CONTENT_TYPE, HttpMethod, InstantiateVAppTemplateParams, MediaInsertOrEjectParams, Payload,
    RemoteRequest, media_type,
};
pub use state::{ProvisionState, StateValue, keys};
pub use task::{Task, TaskStatus};

pub type Result<T> = std::result::Result<T, CoreError>;
