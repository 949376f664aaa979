use vcd_core::{Entity, EntityKind, Href, RemoteRequest, Task};

use crate::Result;

/// Access to the cloud management API used by provisioning steps.
///
/// Implementations own transport, authentication and serialization. Every
/// method may fail with `OperationError::RemoteCallFailed`. Implementations
/// must be safe to share between concurrently running pipelines.
pub trait RemoteEntityGateway: Send + Sync {
    /// Look up an entity by its catalog id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup call fails. An unknown id is `Ok(None)`.
    fn resolve_by_id(&self, id: &str) -> Result<Option<Entity>>;

    /// Look up an entity by name. May be served from the client-side cache;
    /// call [`flush_cache`](Self::flush_cache) first when the cache may be stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup call fails. An unknown name is `Ok(None)`.
    fn resolve_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<Entity>>;

    /// # Errors
    ///
    /// Returns an error if the link cannot be fetched.
    fn resolve_link(&self, href: &Href) -> Result<Entity>;

    /// Fetch the latest snapshot of `entity` by its href. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity cannot be fetched.
    fn reload(&self, entity: &Entity) -> Result<Entity>;

    /// # Errors
    ///
    /// Returns an error if the task cannot be fetched.
    fn reload_task(&self, task: &Task) -> Result<Task>;

    /// The virtual datacenter new vApps are created in.
    ///
    /// # Errors
    ///
    /// Returns an error if the VDC cannot be fetched.
    fn vdc(&self) -> Result<Entity>;

    /// Send a request that creates an entity and return the created entity.
    /// The entity usually still has running tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    fn invoke(&self, request: RemoteRequest) -> Result<Entity>;

    /// Send a request answered with a task and return that task without
    /// waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    fn start_task(&self, request: RemoteRequest) -> Result<Task>;

    /// Drop every cached entity so the next lookup reads from the server.
    fn flush_cache(&self);
}
