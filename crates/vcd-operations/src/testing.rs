//! In-memory gateway for tests.
//!
//! [`FakeGateway`] keeps a small entity store and answers every
//! [`RemoteEntityGateway`] call from it. Tests script busy entities, failing
//! tasks and rejected requests, then inspect the recorded calls.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use vcd_core::{
    Entity, EntityKind, Href, HttpMethod, LinkRel, Payload, RemoteRequest, Task, TaskStatus,
};

use crate::traits::RemoteEntityGateway;
use crate::{OperationError, Result};

/// A gateway call as seen by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ResolveById(String),
    ResolveByName(EntityKind, String),
    ResolveLink(Href),
    Reload(Href),
    ReloadTask(Href),
    Vdc,
    Invoke(RemoteRequest),
    StartTask(RemoteRequest),
    FlushCache,
}

#[derive(Default)]
struct FakeState {
    entities: IndexMap<Href, Entity>,
    catalog: IndexMap<String, Href>,
    vdc: Option<Href>,
    busy: IndexMap<Href, u32>,
    reloads: IndexMap<Href, u32>,
    name_cache: IndexMap<(EntityKind, String), Entity>,
    tasks: IndexMap<Href, Task>,
    rejected: IndexMap<Href, String>,
    failing: IndexMap<Href, String>,
    calls: Vec<GatewayCall>,
    deleted: Vec<Href>,
    inserted_media: Vec<(Href, Href)>,
    next_id: u32,
}

impl FakeState {
    fn store(&mut self, entity: Entity) {
        for child in &entity.children {
            self.store(child.clone());
        }
        self.entities.insert(entity.href.clone(), entity);
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn entity(&self, href: &Href) -> Result<Entity> {
        self.entities
            .get(href)
            .cloned()
            .ok_or_else(|| OperationError::remote(format!("GET {href}"), "404 Not Found"))
    }

    fn create_vapp(&mut self, request: &RemoteRequest) -> Result<Entity> {
        let Some(Payload::InstantiateVAppTemplate(params)) = &request.payload else {
            return Err(OperationError::remote(
                format!("POST {}", request.target),
                "400 Bad Request",
            ));
        };
        let template = self.entity(&params.source)?;

        let id = self.next_id();
        let href = Href::new(format!("https://vcd/vapp-{id}"));
        let mut vapp = Entity::new(EntityKind::VApp, href.clone(), params.name.clone())
            .with_link(LinkRel::Remove, href.clone());
        for (index, template_vm) in template.vms().enumerate() {
            let vm_href = format!("{href}/vm-{index}");
            vapp = vapp.with_child(
                Entity::new(EntityKind::Vm, vm_href.as_str(), template_vm.name.clone())
                    .with_link(LinkRel::InsertMedia, format!("{vm_href}/media/insertMedia")),
            );
        }

        self.store(vapp.clone());
        self.busy.insert(href.clone(), 1);
        Ok(vapp.with_running_task(Task::new(
            format!("https://vcd/task-{id}"),
            "vdcInstantiateVapp",
            TaskStatus::Running,
        )))
    }

    fn apply(&mut self, request: &RemoteRequest) {
        match (&request.method, &request.payload) {
            (HttpMethod::Delete, _) => {
                if let Some(entity) = self.entities.shift_remove(&request.target) {
                    for child in &entity.children {
                        self.entities.shift_remove(&child.href);
                    }
                }
                self.deleted.push(request.target.clone());
            }
            (_, Some(Payload::MediaInsertOrEject(params))) => {
                self.inserted_media
                    .push((request.target.clone(), params.media_href.clone()));
            }
            _ => {}
        }
    }
}

fn operation(request: &RemoteRequest) -> String {
    match (&request.method, &request.payload) {
        (HttpMethod::Delete, _) => "delete".to_string(),
        (_, Some(Payload::MediaInsertOrEject(_))) => "insertMedia".to_string(),
        (method, _) => format!("{method:?}").to_lowercase(),
    }
}

/// In-memory [`RemoteEntityGateway`].
///
/// Lookups by name go through a cache that is filled on first use and only
/// emptied by [`flush_cache`](RemoteEntityGateway::flush_cache), so a test
/// that renames or replaces an entity sees stale answers until it flushes.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an entity and, recursively, its children.
    #[must_use]
    pub fn with_entity(self, entity: Entity) -> Self {
        self.state().store(entity);
        self
    }

    /// Add a catalog item that can be found by `id`.
    #[must_use]
    pub fn with_catalog_item(self, id: impl Into<String>, item: Entity) -> Self {
        {
            let mut state = self.state();
            state.catalog.insert(id.into(), item.href.clone());
            state.store(item);
        }
        self
    }

    #[must_use]
    pub fn with_vdc(self, vdc: Entity) -> Self {
        {
            let mut state = self.state();
            state.vdc = Some(vdc.href.clone());
            state.store(vdc);
        }
        self
    }

    /// Report a running task on the next `reloads` reloads of `href`.
    pub fn set_busy(&self, href: &Href, reloads: u32) {
        self.state().busy.insert(href.clone(), reloads);
    }

    /// Let every task started against `target` fail with `message`.
    pub fn fail_tasks_for(&self, target: &Href, message: impl Into<String>) {
        self.state().failing.insert(target.clone(), message.into());
    }

    /// Reject every request sent to `target` before a task is created.
    pub fn reject_requests_to(&self, target: &Href, message: impl Into<String>) {
        self.state().rejected.insert(target.clone(), message.into());
    }

    /// Move the entity at `old` to `new`, as the server does when it replaces
    /// an object. Self links follow the entity.
    pub fn replace_href(&self, old: &Href, new: &Href) {
        let mut state = self.state();
        if let Some(mut entity) = state.entities.shift_remove(old) {
            entity.href = new.clone();
            for link in &mut entity.links {
                if &link.href == old {
                    link.href = new.clone();
                }
            }
            state.entities.insert(new.clone(), entity);
        }
    }

    pub fn rename(&self, href: &Href, name: impl Into<String>) {
        if let Some(entity) = self.state().entities.get_mut(href) {
            entity.name = name.into();
        }
    }

    #[must_use]
    pub fn entity(&self, href: &Href) -> Option<Entity> {
        self.state().entities.get(href).cloned()
    }

    #[must_use]
    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<Entity> {
        self.state()
            .entities
            .values()
            .find(|entity| entity.kind == kind && entity.name == name)
            .cloned()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Targets of completed delete tasks, oldest first.
    #[must_use]
    pub fn deleted(&self) -> Vec<Href> {
        self.state().deleted.clone()
    }

    /// `(insert link, media href)` of every completed media insert.
    #[must_use]
    pub fn inserted_media(&self) -> Vec<(Href, Href)> {
        self.state().inserted_media.clone()
    }

    #[must_use]
    pub fn reload_count(&self, href: &Href) -> u32 {
        self.state().reloads.get(href).copied().unwrap_or(0)
    }
}

impl RemoteEntityGateway for FakeGateway {
    fn resolve_by_id(&self, id: &str) -> Result<Option<Entity>> {
        let mut state = self.state();
        state.calls.push(GatewayCall::ResolveById(id.to_string()));
        let Some(href) = state.catalog.get(id).cloned() else {
            return Ok(None);
        };
        Ok(state.entities.get(&href).cloned())
    }

    fn resolve_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<Entity>> {
        let mut state = self.state();
        state
            .calls
            .push(GatewayCall::ResolveByName(kind, name.to_string()));

        let key = (kind, name.to_string());
        if let Some(cached) = state.name_cache.get(&key) {
            return Ok(Some(cached.clone()));
        }

        let found = state
            .entities
            .values()
            .find(|entity| entity.kind == kind && entity.name == name)
            .cloned();
        if let Some(entity) = &found {
            state.name_cache.insert(key, entity.clone());
        }
        Ok(found)
    }

    fn resolve_link(&self, href: &Href) -> Result<Entity> {
        let mut state = self.state();
        state.calls.push(GatewayCall::ResolveLink(href.clone()));
        state.entity(href)
    }

    fn reload(&self, entity: &Entity) -> Result<Entity> {
        let mut state = self.state();
        let href = entity.href.clone();
        state.calls.push(GatewayCall::Reload(href.clone()));
        *state.reloads.entry(href.clone()).or_insert(0) += 1;

        let mut snapshot = state.entity(&href)?;
        if let Some(remaining) = state.busy.get_mut(&href) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                snapshot = snapshot.with_running_task(Task::new(
                    format!("{href}/task"),
                    "busy",
                    TaskStatus::Running,
                ));
            }
        }
        Ok(snapshot)
    }

    fn reload_task(&self, task: &Task) -> Result<Task> {
        let mut state = self.state();
        state.calls.push(GatewayCall::ReloadTask(task.href.clone()));
        state
            .tasks
            .get(&task.href)
            .cloned()
            .ok_or_else(|| OperationError::remote(format!("GET {}", task.href), "404 Not Found"))
    }

    fn vdc(&self) -> Result<Entity> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Vdc);
        let href = state
            .vdc
            .clone()
            .ok_or_else(|| OperationError::remote("GET vdc", "no VDC configured"))?;
        state.entity(&href)
    }

    fn invoke(&self, request: RemoteRequest) -> Result<Entity> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Invoke(request.clone()));
        if let Some(message) = state.rejected.get(&request.target) {
            return Err(OperationError::remote(operation(&request), message.clone()));
        }
        state.create_vapp(&request)
    }

    fn start_task(&self, request: RemoteRequest) -> Result<Task> {
        let mut state = self.state();
        state.calls.push(GatewayCall::StartTask(request.clone()));
        let operation = operation(&request);
        if let Some(message) = state.rejected.get(&request.target) {
            return Err(OperationError::remote(operation, message.clone()));
        }

        let id = state.next_id();
        let href = Href::new(format!("https://vcd/task-{id}"));
        let mut finished = Task::new(href.clone(), operation.clone(), TaskStatus::Success);
        if let Some(message) = state.failing.get(&request.target).cloned() {
            finished.status = TaskStatus::Error;
            finished.error_message = Some(message);
        } else {
            state.apply(&request);
        }
        state.tasks.insert(href.clone(), finished);

        Ok(Task::new(href, operation, TaskStatus::Running))
    }

    fn flush_cache(&self) {
        let mut state = self.state();
        state.calls.push(GatewayCall::FlushCache);
        state.name_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> Entity {
        Entity::new(EntityKind::Vm, "https://vcd/vm-1", "vm-1")
    }

    #[test]
    fn busy_entity_reports_running_task_for_scripted_reloads() -> anyhow::Result<()> {
        let gateway = FakeGateway::new().with_entity(vm());
        gateway.set_busy(&vm().href, 1);

        assert!(gateway.reload(&vm())?.has_running_tasks());
        assert!(!gateway.reload(&vm())?.has_running_tasks());
        assert_eq!(gateway.reload_count(&vm().href), 2);
        Ok(())
    }

    #[test]
    fn name_lookup_is_cached_until_flushed() -> anyhow::Result<()> {
        let gateway = FakeGateway::new().with_entity(vm());
        gateway.resolve_by_name(EntityKind::Vm, "vm-1")?;
        gateway.replace_href(&vm().href, &Href::new("https://vcd/vm-2"));

        let stale = gateway.resolve_by_name(EntityKind::Vm, "vm-1")?;
        gateway.flush_cache();
        let fresh = gateway.resolve_by_name(EntityKind::Vm, "vm-1")?;

        assert_eq!(stale.map(|e| e.href), Some(vm().href));
        assert_eq!(fresh.map(|e| e.href), Some(Href::new("https://vcd/vm-2")));
        Ok(())
    }

    #[test]
    fn delete_task_removes_entity() -> anyhow::Result<()> {
        let gateway = FakeGateway::new().with_entity(vm());

        let task = gateway.start_task(RemoteRequest::delete(vm().href))?;
        let finished = gateway.reload_task(&task)?;

        assert!(finished.is_success());
        assert!(gateway.entity(&vm().href).is_none());
        assert_eq!(gateway.deleted(), vec![vm().href]);
        Ok(())
    }

    #[test]
    fn failing_target_yields_error_task_without_effect() -> anyhow::Result<()> {
        let gateway = FakeGateway::new().with_entity(vm());
        gateway.fail_tasks_for(&vm().href, "locked");

        let task = gateway.start_task(RemoteRequest::delete(vm().href))?;
        let finished = gateway.reload_task(&task)?;

        assert_eq!(finished.status, TaskStatus::Error);
        assert_eq!(finished.error_message.as_deref(), Some("locked"));
        assert!(gateway.deleted().is_empty());
        Ok(())
    }

    #[test]
    fn rejected_target_fails_before_task_starts() {
        let gateway = FakeGateway::new().with_entity(vm());
        gateway.reject_requests_to(&vm().href, "403 Forbidden");

        let err = gateway
            .start_task(RemoteRequest::delete(vm().href))
            .expect_err("request is rejected");

        assert!(matches!(err, OperationError::RemoteCallFailed { .. }));
    }
}
