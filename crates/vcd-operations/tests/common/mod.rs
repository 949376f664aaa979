#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use vcd_core::{Entity, EntityKind, Href, LinkRel};
use vcd_operations::context::StepContext;
use vcd_operations::testing::FakeGateway;
use vcd_poll::{CancellationToken, PollConfig, Poller};

pub const TEMPLATE_ID: &str = "T1";
pub const TEMPLATE: &str = "https://vcd/vAppTemplate/vappTemplate-1";
pub const CATALOG_ITEM: &str = "https://vcd/catalogItem/item-1";
pub const VDC: &str = "https://vcd/vdc/vdc-1";
pub const MEDIA: &str = "https://vcd/media/media-1";
pub const MEDIA_NAME: &str = "tools.iso";

/// The first vApp the fake creates gets this href.
pub const FIRST_VAPP: &str = "https://vcd/vapp-1";

/// Insert link of the first VM in [`FIRST_VAPP`].
pub const FIRST_VM_INSERT: &str = "https://vcd/vapp-1/vm-0/media/insertMedia";

pub fn template() -> Entity {
    Entity::new(EntityKind::VAppTemplate, TEMPLATE, "centos-7")
        .with_child(Entity::new(
            EntityKind::Vm,
            "https://vcd/vAppTemplate/vm-a",
            "web",
        ))
        .with_child(Entity::new(
            EntityKind::Vm,
            "https://vcd/vAppTemplate/vm-b",
            "db",
        ))
}

pub fn media() -> Entity {
    Entity::new(EntityKind::Media, MEDIA, MEDIA_NAME)
}

/// A gateway with a template published as catalog item `T1`, a VDC that
/// accepts instantiation requests and one media object.
pub fn gateway() -> FakeGateway {
    let item = Entity::new(EntityKind::CatalogItem, CATALOG_ITEM, "centos-7")
        .with_link(LinkRel::Entity, TEMPLATE);
    let vdc = Entity::new(EntityKind::Vdc, VDC, "vdc-1").with_link(
        LinkRel::InstantiateVAppTemplate,
        format!("{VDC}/action/instantiateVAppTemplate"),
    );

    FakeGateway::new()
        .with_entity(template())
        .with_catalog_item(TEMPLATE_ID, item)
        .with_vdc(vdc)
        .with_entity(media())
}

pub fn context(gateway: FakeGateway) -> (Arc<FakeGateway>, StepContext<FakeGateway>) {
    context_with_timeout(gateway, Duration::from_secs(2))
}

pub fn context_with_timeout(
    gateway: FakeGateway,
    timeout: Duration,
) -> (Arc<FakeGateway>, StepContext<FakeGateway>) {
    let gateway = Arc::new(gateway);
    let config = PollConfig::new(timeout, Duration::from_millis(1)).expect("valid config");
    let ctx = StepContext::new(
        Arc::clone(&gateway),
        Poller::new(config, CancellationToken::new()),
    );
    (gateway, ctx)
}

pub fn href(value: &str) -> Href {
    Href::new(value)
}
