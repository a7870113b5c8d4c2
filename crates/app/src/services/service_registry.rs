//! Cached list of services the hub exposes.
//!
//! Filled after a successful hydration and replaced wholesale on refresh;
//! readers always see a complete list.

use std::sync::{Arc, RwLock};

use habridge_domain::hub::ServiceDomain;

/// Process-wide cache of the hub's service catalogue.
#[derive(Default)]
pub struct ServiceRegistry {
    domains: RwLock<Arc<Vec<ServiceDomain>>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list.
    pub fn replace(&self, domains: Vec<ServiceDomain>) {
        let next = Arc::new(domains);
        match self.domains.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Current list; cheap to clone.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<ServiceDomain>> {
        match self.domains.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
