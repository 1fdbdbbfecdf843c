//! Deployment environments and the registry they are selected from.

use crate::error::EnvironmentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deployment target: one OCM gateway scoped to one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Symbolic name, e.g. `staging`.
    pub name: String,
    /// Base URL of the API gateway.
    pub url: String,
    /// Organization whose clusters are audited.
    pub organization_id: String,
}

/// Catalog of known environments, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRegistry {
    entries: BTreeMap<String, String>,
}

impl Default for EnvironmentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EnvironmentRegistry {
    /// The public OCM gateways.
    pub fn builtin() -> Self {
        let entries = [
            ("integration", "https://api.integration.openshift.com"),
            ("staging", "https://api.stage.openshift.com"),
            ("production", "https://api.openshift.com"),
        ]
        .into_iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect();

        Self { entries }
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(name.into(), url.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_entry(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.insert(name, url);
        self
    }

    /// Returns the gateway URL registered under `name`.
    pub fn url(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Registered environment names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Iterates `(name, url)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds an environment for `name` scoped to `organization_id`.
    pub fn environment(
        &self,
        name: &str,
        organization_id: &str,
    ) -> Result<Environment, EnvironmentError> {
        let url = self
            .url(name)
            .ok_or_else(|| EnvironmentError::UnknownEnvironment {
                name: name.to_string(),
                known: self.names().join(", "),
            })?;

        if organization_id.trim().is_empty() {
            return Err(EnvironmentError::MissingOrganization(name.to_string()));
        }

        Ok(Environment {
            name: name.to_string(),
            url: url.to_string(),
            organization_id: organization_id.trim().to_string(),
        })
    }

    /// Parses an `environment:organization-id` selector.
    pub fn parse_selector(&self, selector: &str) -> Result<Environment, EnvironmentError> {
        let parts: Vec<&str> = selector.split(':').collect();
        match parts.as_slice() {
            [name, organization_id] => self.environment(name.trim(), organization_id),
            _ => Err(EnvironmentError::MalformedSelector(selector.to_string())),
        }
    }

    /// Parses every selector, failing on the first invalid one.
    pub fn parse_selectors<S: AsRef<str>>(
        &self,
        selectors: &[S],
    ) -> Result<Vec<Environment>, EnvironmentError> {
        selectors
            .iter()
            .map(|s| self.parse_selector(s.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = EnvironmentRegistry::builtin();
        assert_eq!(registry.names(), vec!["integration", "production", "staging"]);
        assert_eq!(registry.url("production"), Some("https://api.openshift.com"));
    }

    #[test]
    fn test_parse_selector() {
        let registry = EnvironmentRegistry::builtin();
        let env = registry.parse_selector("staging:fooid1234").unwrap();
        assert_eq!(env.name, "staging");
        assert_eq!(env.url, "https://api.stage.openshift.com");
        assert_eq!(env.organization_id, "fooid1234");
    }

    #[test]
    fn test_parse_selector_rejects_malformed_input() {
        let registry = EnvironmentRegistry::builtin();
        assert!(matches!(
            registry.parse_selector("staging"),
            Err(EnvironmentError::MalformedSelector(_))
        ));
        assert!(matches!(
            registry.parse_selector("staging:a:b"),
            Err(EnvironmentError::MalformedSelector(_))
        ));
        assert!(matches!(
            registry.parse_selector("staging:"),
            Err(EnvironmentError::MissingOrganization(_))
        ));
    }

    #[test]
    fn test_parse_selector_rejects_unknown_environment() {
        let registry = EnvironmentRegistry::builtin();
        let err = registry.parse_selector("qa:org").unwrap_err();
        assert!(err.to_string().contains("qa"));
        assert!(err.to_string().contains("integration, production, staging"));
    }

    #[test]
    fn test_custom_entries_override_builtins() {
        let registry = EnvironmentRegistry::builtin()
            .with_entry("staging", "https://staging.internal")
            .with_entry("local", "http://localhost:8000");

        assert_eq!(registry.url("staging"), Some("https://staging.internal"));
        let env = registry.parse_selector("local:org-1").unwrap();
        assert_eq!(env.url, "http://localhost:8000");
    }

    #[test]
    fn test_parse_selectors_preserves_order() {
        let registry = EnvironmentRegistry::builtin();
        let envs = registry
            .parse_selectors(&["production:p", "integration:i"])
            .unwrap();
        assert_eq!(envs[0].name, "production");
        assert_eq!(envs[1].name, "integration");
    }
}
