//! Resource kinds and filter context

use crate::types::StringMap;
use serde::{Deserialize, Serialize};

/// A list resource exposed by the dashboard API
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Catalogue products (public listing)
    Products,
    /// Admin users and their roles
    Admins,
    /// Contact-us inquiries
    Contacts,
}

impl ResourceKind {
    /// Default collection path on the API
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Products => "/api/products",
            Self::Admins => "/api/admins",
            Self::Contacts => "/api/contact-us",
        }
    }

    /// Whether listing requires a bearer token by default
    pub fn requires_auth_by_default(self) -> bool {
        !matches!(self, Self::Products)
    }

    /// Short name used in config files and logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Admins => "admins",
            Self::Contacts => "contacts",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where and how a resource is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Which resource this is
    pub kind: ResourceKind,
    /// Collection path, e.g. `/api/products`
    pub path: String,
    /// Attach the bearer token to requests
    pub requires_auth: bool,
}

impl ResourceSpec {
    /// Create a spec with the resource's defaults
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            path: kind.default_path().to_string(),
            requires_auth: kind.requires_auth_by_default(),
        }
    }

    /// Override the collection path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Override the auth requirement
    #[must_use]
    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Path of a single record
    pub fn record_path(&self, id: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), id)
    }
}

impl From<ResourceKind> for ResourceSpec {
    fn from(kind: ResourceKind) -> Self {
        Self::new(kind)
    }
}

/// Search and filter parameters of a list view
///
/// Two contexts that compare unequal produce unrelated cursor chains, so a
/// change of context invalidates every cached page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterContext {
    /// Free-text search term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Role filter (admin listing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Any further filters, passed through verbatim
    #[serde(default, skip_serializing_if = "StringMap::is_empty")]
    pub extra: StringMap,
}

impl FilterContext {
    /// Create an empty filter context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term; blank terms clear it
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = non_blank(search.into());
        self
    }

    /// Set the role filter; blank values clear it
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = non_blank(role.into());
        self
    }

    /// Add an extra filter
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Check if no filter is set
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.role.is_none() && self.extra.values().all(String::is_empty)
    }

    /// Render as query parameters, skipping empty values
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(role) = &self.role {
            params.push(("role".to_string(), role.clone()));
        }
        params.extend(
            self.extra
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        params
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
