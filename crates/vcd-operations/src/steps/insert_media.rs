use std::marker::PhantomData;

use tracing::debug;
use vcd_core::{
    Entity, EntityKind, LinkRel, MediaInsertOrEjectParams, Payload, ProvisionState,
    RemoteRequest, keys,
};
use vcd_saga::SagaStep;

use crate::context::StepContext;
use crate::error::PollSnapshot;
use crate::traits::RemoteEntityGateway;
use crate::{OperationError, Result};

/// Inserts a catalog media into the VM stored under [`keys::VM`].
///
/// The server rejects the insert while either the media or the VM is busy,
/// so the step polls both in one wait until neither has running tasks, then
/// sends it. The VM is reloaded and written back to the state afterwards.
///
/// There is no rollback: the media sits in a VM that an earlier step's
/// rollback removes along with its vApp.
pub struct InsertMediaStep<G> {
    media_name: String,
    _marker: PhantomData<G>,
}

impl<G> InsertMediaStep<G> {
    #[must_use]
    pub fn new(media_name: impl Into<String>) -> Self {
        Self {
            media_name: media_name.into(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn media_name(&self) -> &str {
        &self.media_name
    }
}

impl<G> SagaStep for InsertMediaStep<G>
where
    G: RemoteEntityGateway,
{
    type State = ProvisionState;
    type Context = StepContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "insert_media"
    }

    fn execute(&self, ctx: &Self::Context, state: &mut Self::State) -> Result<()> {
        let gateway = ctx.gateway();

        let media = gateway
            .resolve_by_name(EntityKind::Media, &self.media_name)?
            .ok_or_else(|| OperationError::ObjectNotFound {
                kind: EntityKind::Media,
                reference: self.media_name.clone(),
            })?;
        let vm = state.require_entity(keys::VM)?.clone();
        let params = MediaInsertOrEjectParams {
            media_href: media.href.clone(),
        };

        debug!(media = %media.name, vm = %vm.name, "waiting for media and VM to be idle");
        let (media, vm) = ctx
            .poller()
            .wait_until(
                || -> Result<(Entity, Entity)> {
                    Ok((gateway.reload(&media)?, gateway.reload(&vm)?))
                },
                |(media, vm): &(Entity, Entity)| {
                    !media.has_running_tasks() && !vm.has_running_tasks()
                },
            )
            .map_err(|err| {
                OperationError::from_poll(err, |(media, vm)| {
                    let busy = if media.has_running_tasks() { media } else { vm };
                    PollSnapshot::Entity(Box::new(busy))
                })
            })?;

        let target = vm
            .link(LinkRel::InsertMedia)
            .ok_or_else(|| OperationError::MissingLink {
                kind: EntityKind::Vm,
                name: vm.name.clone(),
                rel: LinkRel::InsertMedia,
            })?
            .clone();
        debug!(media = %media.name, vm = %vm.name, "inserting media");
        ctx.submit_and_wait(RemoteRequest::post(
            target,
            Payload::MediaInsertOrEject(params),
        ))?;

        let vm = gateway.reload(&vm)?;
        state.insert(keys::VM, vm);
        Ok(())
    }

    fn compensation_description(&self) -> String {
        format!("nothing to undo for media '{}'", self.media_name)
    }
}
