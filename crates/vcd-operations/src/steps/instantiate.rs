use std::marker::PhantomData;

use tracing::{debug, warn};
use vcd_core::{
    Entity, EntityKind, Href, InstantiateVAppTemplateParams, LinkRel, Payload, ProvisionState,
    RemoteRequest, keys,
};
use vcd_saga::SagaStep;

use crate::context::StepContext;
use crate::traits::RemoteEntityGateway;
use crate::{OperationError, Result};

/// Parameters for creating a vApp from a catalog template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateArgs {
    /// Catalog item id of the vApp template.
    pub template_id: String,
    pub vapp_name: String,
    pub description: String,
    /// Disk placement preferences. Empty entries are skipped.
    pub disk_locality: Vec<Option<Href>>,
    /// Storage profile applied to every VM of the template.
    pub storage_profile: Option<String>,
}

impl InstantiateArgs {
    #[must_use]
    pub fn new(template_id: impl Into<String>, vapp_name: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            vapp_name: vapp_name.into(),
            description: String::new(),
            disk_locality: Vec::new(),
            storage_profile: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_disk_locality(mut self, disks: Vec<Option<Href>>) -> Self {
        self.disk_locality = disks;
        self
    }

    #[must_use]
    pub fn with_storage_profile(mut self, profile: impl Into<String>) -> Self {
        self.storage_profile = Some(profile.into());
        self
    }
}

/// Creates a vApp from a template and stores it under [`keys::VAPP`].
///
/// The vApp name is recorded under [`keys::INSTANTIATE_VAPP_NAME`] before the
/// create request is sent. Rollback finds the vApp again by that name, since
/// the handle returned at creation may no longer point at it.
pub struct InstantiateStep<G> {
    args: InstantiateArgs,
    _marker: PhantomData<G>,
}

impl<G> InstantiateStep<G> {
    #[must_use]
    pub fn new(args: InstantiateArgs) -> Self {
        Self {
            args,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn args(&self) -> &InstantiateArgs {
        &self.args
    }

    fn params(&self, template: &Entity) -> InstantiateVAppTemplateParams {
        let mut params = InstantiateVAppTemplateParams::new(
            self.args.vapp_name.clone(),
            self.args.description.clone(),
            template.href.clone(),
        );

        for disk in self.args.disk_locality.iter().flatten() {
            for vm in template.vms() {
                params.locality.insert(vm.href.clone(), disk.clone());
            }
        }

        if let Some(profile) = &self.args.storage_profile {
            for vm in template.vms() {
                params
                    .storage_profiles
                    .insert(vm.href.clone(), profile.clone());
            }
        }

        params
    }
}

impl<G> InstantiateStep<G>
where
    G: RemoteEntityGateway,
{
    fn delete_by_name(&self, ctx: &StepContext<G>, name: &str) -> Result<()> {
        let gateway = ctx.gateway();
        gateway.flush_cache();

        let Some(vapp) = gateway.resolve_by_name(EntityKind::VApp, name)? else {
            debug!(vapp = name, "vApp not found, nothing to delete");
            return Ok(());
        };

        let remove = vapp
            .link(LinkRel::Remove)
            .ok_or_else(|| OperationError::MissingLink {
                kind: EntityKind::VApp,
                name: vapp.name.clone(),
                rel: LinkRel::Remove,
            })?
            .clone();

        debug!(vapp = name, href = %remove, "deleting vApp");
        ctx.submit_and_wait(RemoteRequest::delete(remove))?;
        Ok(())
    }
}

impl<G> SagaStep for InstantiateStep<G>
where
    G: RemoteEntityGateway,
{
    type State = ProvisionState;
    type Context = StepContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "instantiate"
    }

    fn execute(&self, ctx: &Self::Context, state: &mut Self::State) -> Result<()> {
        let gateway = ctx.gateway();

        let catalog_item = gateway
            .resolve_by_id(&self.args.template_id)?
            .ok_or_else(|| OperationError::ObjectNotFound {
                kind: EntityKind::CatalogItem,
                reference: self.args.template_id.clone(),
            })?;
        let template_href =
            catalog_item
                .link(LinkRel::Entity)
                .ok_or_else(|| OperationError::MissingLink {
                    kind: EntityKind::CatalogItem,
                    name: catalog_item.name.clone(),
                    rel: LinkRel::Entity,
                })?;
        let template = gateway.resolve_link(template_href)?;
        let params = self.params(&template);

        let vdc = gateway.vdc()?;
        let target = vdc
            .link(LinkRel::InstantiateVAppTemplate)
            .ok_or_else(|| OperationError::MissingLink {
                kind: EntityKind::Vdc,
                name: vdc.name.clone(),
                rel: LinkRel::InstantiateVAppTemplate,
            })?
            .clone();

        state.insert(keys::INSTANTIATE_VAPP_NAME, self.args.vapp_name.clone());

        debug!(
            template = %template.href,
            vapp = %self.args.vapp_name,
            vms = template.vms().count(),
            "instantiating vApp template"
        );
        let vapp = gateway.invoke(RemoteRequest::post(
            target,
            Payload::InstantiateVAppTemplate(params),
        ))?;
        let vapp = ctx.wait_entity(&vapp)?;

        debug!(vapp = %vapp.name, href = %vapp.href, "vApp instantiated");
        state.insert(keys::VAPP, vapp);
        Ok(())
    }

    fn compensate(&self, ctx: &Self::Context, state: &mut Self::State) -> Result<()> {
        if let Some(name) = state.text(keys::INSTANTIATE_VAPP_NAME).map(str::to_owned) {
            if let Err(error) = self.delete_by_name(&ctx.detached(), &name) {
                warn!(vapp = %name, %error, "failed to delete instantiated vApp");
            }
        }

        state.remove(keys::VAPP);
        state.remove(keys::INSTANTIATE_VAPP_NAME);
        Ok(())
    }

    fn compensation_description(&self) -> String {
        format!("delete vApp '{}'", self.args.vapp_name)
    }
}
