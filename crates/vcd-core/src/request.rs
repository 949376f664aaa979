use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::Href;

/// Content types of the request bodies built by provisioning steps.
pub mod media_type {
    pub const INSTANTIATE_VAPP_TEMPLATE_PARAMS: &str =
        "application/vnd.vmware.vcloud.instantiateVAppTemplateParams+xml";
    pub const MEDIA_INSERT_OR_EJECT_PARAMS: &str =
        "application/vnd.vmware.vcloud.mediaInsertOrEjectParams+xml";
}

pub const CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiateVAppTemplateParams {
    pub name: String,
    pub description: String,
    /// The vApp template to instantiate.
    pub source: Href,
    pub all_eulas_accepted: bool,
    pub linked_clone: bool,
    /// Disk placement per template VM.
    #[serde(default)]
    pub locality: IndexMap<Href, Href>,
    /// Storage profile per template VM.
    #[serde(default)]
    pub storage_profiles: IndexMap<Href, String>,
}

impl InstantiateVAppTemplateParams {
    /// Full clone with all EULAs accepted and no placement preferences.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, source: Href) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            source,
            all_eulas_accepted: true,
            linked_clone: false,
            locality: IndexMap::new(),
            storage_profiles: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInsertOrEjectParams {
    pub media_href: Href,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    InstantiateVAppTemplate(InstantiateVAppTemplateParams),
    MediaInsertOrEject(MediaInsertOrEjectParams),
}

impl Payload {
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::InstantiateVAppTemplate(_) => media_type::INSTANTIATE_VAPP_TEMPLATE_PARAMS,
            Self::MediaInsertOrEject(_) => media_type::MEDIA_INSERT_OR_EJECT_PARAMS,
        }
    }
}

/// A mutating call against the remote API, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub method: HttpMethod,
    pub target: Href,
    pub payload: Option<Payload>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl RemoteRequest {
    /// POST `payload` to `target`, labelled with the payload's content type.
    #[must_use]
    pub fn post(target: Href, payload: Payload) -> Self {
        let mut headers = IndexMap::new();
        headers.insert(CONTENT_TYPE.to_string(), payload.media_type().to_string());
        Self {
            method: HttpMethod::Post,
            target,
            payload: Some(payload),
            headers,
        }
    }

    #[must_use]
    pub fn delete(target: Href) -> Self {
        Self {
            method: HttpMethod::Delete,
            target,
            payload: None,
            headers: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }
}
