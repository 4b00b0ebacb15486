//! Domain scope filter.
//!
//! One [`Scope`] is built per crawl run and shared by every scope decision:
//! seed validation, frontier dequeue and link classification. Carrying the
//! policy in a single value keeps those call sites from disagreeing.

use crate::canonical::{host_of, is_in_scope, primary_domain};
use crate::types::config::ScopePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    primary_domain: String,
    policy: ScopePolicy,
}

impl Scope {
    pub fn new(primary_domain: impl Into<String>, policy: ScopePolicy) -> Self {
        Self {
            primary_domain: primary_domain.into(),
            policy,
        }
    }

    /// Scope of a submitted seed (bare domain or URL).
    pub fn for_seed(seed: &str, policy: ScopePolicy) -> Option<Self> {
        primary_domain(seed).map(|domain| Self::new(domain, policy))
    }

    pub fn primary_domain(&self) -> &str {
        &self.primary_domain
    }

    /// Whether a canonical URL belongs to this scope.
    pub fn contains(&self, normalized_url: &str) -> bool {
        match self.policy {
            ScopePolicy::Exact => is_in_scope(normalized_url, &self.primary_domain),
            ScopePolicy::IncludeSubdomains => host_of(normalized_url).is_some_and(|host| {
                host == self.primary_domain
                    || host.ends_with(&format!(".{}", self.primary_domain))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_policy_rejects_subdomains() {
        let scope = Scope::for_seed("https://www.example.com", ScopePolicy::Exact).unwrap();
        assert_eq!(scope.primary_domain(), "example.com");
        assert!(scope.contains("https://example.com/about"));
        assert!(!scope.contains("https://shop.example.com/"));
        assert!(!scope.contains("https://external.org/"));
    }

    #[test]
    fn test_subdomain_policy() {
        let scope = Scope::new("example.com", ScopePolicy::IncludeSubdomains);
        assert!(scope.contains("https://shop.example.com/cart"));
        assert!(scope.contains("https://example.com/"));
        assert!(!scope.contains("https://badexample.com/"));
    }

    #[test]
    fn test_invalid_seed_has_no_scope() {
        assert!(Scope::for_seed("mailto:x@example.com", ScopePolicy::Exact).is_none());
    }
}
