use std::fmt;

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Stable handle of a remote object.
///
/// The href survives renames, but it may point at an object the server has
/// since replaced. Callers that need the object as it is now re-resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Href(String);

impl Href {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self(href.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self::new(href)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    VApp,
    Vm,
    Media,
    CatalogItem,
    VAppTemplate,
    Vdc,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VApp => "vApp",
            Self::Vm => "VM",
            Self::Media => "media",
            Self::CatalogItem => "catalog item",
            Self::VAppTemplate => "vApp template",
            Self::Vdc => "VDC",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation of a link published by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkRel {
    /// Deletes the entity.
    Remove,
    /// Inserts a media object into a VM.
    InsertMedia,
    /// Instantiates a vApp template inside a VDC.
    InstantiateVAppTemplate,
    /// Points from a catalog item to the entity it publishes.
    Entity,
}

impl fmt::Display for LinkRel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rel = match self {
            Self::Remove => "remove",
            Self::InsertMedia => "insertMedia",
            Self::InstantiateVAppTemplate => "instantiateVAppTemplate",
            Self::Entity => "entity",
        };
        f.write_str(rel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: LinkRel,
    pub href: Href,
}

/// Snapshot of a remote object as last read from the server.
///
/// A snapshot goes stale as soon as it is read. Reload it before acting on
/// it whenever freshness matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub href: Href,
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub running_tasks: Vec<Task>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// VMs of a vApp or vApp template.
    #[serde(default)]
    pub children: Vec<Entity>,
}

impl Entity {
    #[must_use]
    pub fn new(kind: EntityKind, href: impl Into<Href>, name: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            name: name.into(),
            kind,
            running_tasks: Vec::new(),
            links: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_link(mut self, rel: LinkRel, href: impl Into<Href>) -> Self {
        self.links.push(Link {
            rel,
            href: href.into(),
        });
        self
    }

    #[must_use]
    pub fn with_running_task(mut self, task: Task) -> Self {
        self.running_tasks.push(task);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Entity) -> Self {
        self.children.push(child);
        self
    }

    /// First link with the given relation.
    #[must_use]
    pub fn link(&self, rel: LinkRel) -> Option<&Href> {
        self.links
            .iter()
            .find(|link| link.rel == rel)
            .map(|link| &link.href)
    }

    #[must_use]
    pub fn has_running_tasks(&self) -> bool {
        self.running_tasks.iter().any(|task| !task.is_terminal())
    }

    /// VMs contained in this vApp or template.
    pub fn vms(&self) -> impl Iterator<Item = &Entity> {
        self.children
            .iter()
            .filter(|child| child.kind == EntityKind::Vm)
    }
}
