//! Subnet ownership resolution
//!
//! Governance signing needs to know which control keys a subnet auth's
//! indices point at. Resolution goes through the [`OwnershipResolver`]
//! trait so the coordinator works the same against a live node client or
//! a fixture. Results are memoized in an [`OwnershipCache`] owned by the
//! caller; there is no process-wide cache, and stale entries are dropped
//! with [`OwnershipCache::invalidate`].

use std::collections::{hash_map::Entry, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::components::OutputOwners;
use crate::core::ids::{Address, Id};

/// Errors from ownership lookups
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("No ownership record for subnet {0}")]
    NotFound(Id),
    #[error("Ownership backend error: {0}")]
    Backend(String),
}

/// The control keys and threshold governing one subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetOwnership {
    pub subnet_id: Id,
    pub threshold: u32,
    pub control_keys: Vec<Address>,
}

impl SubnetOwnership {
    pub fn new(subnet_id: Id, threshold: u32, control_keys: Vec<Address>) -> Self {
        SubnetOwnership {
            subnet_id,
            threshold,
            control_keys,
        }
    }

    pub fn from_owners(subnet_id: Id, owners: &OutputOwners) -> Self {
        SubnetOwnership {
            subnet_id,
            threshold: owners.threshold,
            control_keys: owners.addresses.clone(),
        }
    }

    /// The control key an auth index points at
    pub fn signer_at(&self, index: u32) -> Option<&Address> {
        self.control_keys.get(index as usize)
    }

    pub fn position_of(&self, address: &Address) -> Option<u32> {
        self.control_keys
            .iter()
            .position(|a| a == address)
            .map(|i| i as u32)
    }

    /// False when the threshold demands more keys than exist. Such a
    /// record can never authorize anything, but it is still resolvable
    /// and reportable.
    pub fn is_satisfiable(&self) -> bool {
        (self.threshold as usize) <= self.control_keys.len()
    }
}

/// Source of subnet ownership records
pub trait OwnershipResolver {
    fn resolve(&self, subnet_id: &Id) -> Result<SubnetOwnership, OwnershipError>;
}

/// In-memory resolver backed by a fixed table
///
/// Used by tests and by the offline tooling, where ownership comes from a
/// file instead of a node query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticResolver {
    records: HashMap<Id, SubnetOwnership>,
}

impl StaticResolver {
    pub fn new() -> Self {
        StaticResolver {
            records: HashMap::new(),
        }
    }

    pub fn insert(&mut self, ownership: SubnetOwnership) {
        self.records.insert(ownership.subnet_id, ownership);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OwnershipResolver for StaticResolver {
    fn resolve(&self, subnet_id: &Id) -> Result<SubnetOwnership, OwnershipError> {
        self.records
            .get(subnet_id)
            .cloned()
            .ok_or(OwnershipError::NotFound(*subnet_id))
    }
}

/// Memoized ownership lookups for one coordinator
#[derive(Debug, Default)]
pub struct OwnershipCache {
    entries: HashMap<Id, SubnetOwnership>,
}

impl OwnershipCache {
    pub fn new() -> Self {
        OwnershipCache {
            entries: HashMap::new(),
        }
    }

    /// Seed a record directly, as when ownership came from a file
    pub fn insert(&mut self, ownership: SubnetOwnership) {
        self.entries.insert(ownership.subnet_id, ownership);
    }

    /// Return the cached record, resolving and caching on a miss
    pub fn get_or_resolve(
        &mut self,
        subnet_id: &Id,
        resolver: &dyn OwnershipResolver,
    ) -> Result<&SubnetOwnership, OwnershipError> {
        match self.entries.entry(*subnet_id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let ownership = resolver.resolve(subnet_id)?;
                debug!(
                    "cached ownership for subnet {}: {}-of-{}",
                    subnet_id.short(),
                    ownership.threshold,
                    ownership.control_keys.len()
                );
                Ok(entry.insert(ownership))
            }
        }
    }

    /// Drop one subnet's record, forcing the next lookup to re-resolve.
    /// Needed after an ownership transfer commits.
    pub fn invalidate(&mut self, subnet_id: &Id) -> bool {
        self.entries.remove(subnet_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Resolver that counts how many lookups reach the backend
    struct CountingResolver {
        inner: StaticResolver,
        calls: Cell<usize>,
    }

    impl CountingResolver {
        fn new(inner: StaticResolver) -> Self {
            CountingResolver {
                inner,
                calls: Cell::new(0),
            }
        }
    }

    impl OwnershipResolver for CountingResolver {
        fn resolve(&self, subnet_id: &Id) -> Result<SubnetOwnership, OwnershipError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.resolve(subnet_id)
        }
    }

    fn sample_ownership(subnet_id: Id) -> SubnetOwnership {
        SubnetOwnership::new(
            subnet_id,
            2,
            vec![
                Address::from_slice(&[1; 20]),
                Address::from_slice(&[2; 20]),
                Address::from_slice(&[3; 20]),
            ],
        )
    }

    #[test]
    fn test_signer_lookup() {
        let ownership = sample_ownership(Id::from_slice(&[9; 32]));
        assert_eq!(ownership.signer_at(1), Some(&Address::from_slice(&[2; 20])));
        assert_eq!(ownership.signer_at(3), None);
        assert_eq!(ownership.position_of(&Address::from_slice(&[3; 20])), Some(2));
        assert!(ownership.is_satisfiable());
    }

    #[test]
    fn test_unsatisfiable_threshold() {
        let ownership = SubnetOwnership::new(
            Id::EMPTY,
            3,
            vec![Address::from_slice(&[1; 20]), Address::from_slice(&[2; 20])],
        );
        assert!(!ownership.is_satisfiable());
    }

    #[test]
    fn test_static_resolver_not_found() {
        let resolver = StaticResolver::new();
        let missing = Id::from_slice(&[7; 32]);
        assert_eq!(
            resolver.resolve(&missing),
            Err(OwnershipError::NotFound(missing))
        );
    }

    #[test]
    fn test_seeded_cache_never_hits_the_backend() {
        let subnet_id = Id::from_slice(&[4; 32]);
        let resolver = CountingResolver::new(StaticResolver::new());

        let mut cache = OwnershipCache::new();
        cache.insert(sample_ownership(subnet_id));
        let ownership = cache.get_or_resolve(&subnet_id, &resolver).unwrap();
        assert_eq!(ownership.threshold, 2);
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn test_cache_resolves_once() {
        let subnet_id = Id::from_slice(&[5; 32]);
        let mut inner = StaticResolver::new();
        inner.insert(sample_ownership(subnet_id));
        let resolver = CountingResolver::new(inner);

        let mut cache = OwnershipCache::new();
        for _ in 0..3 {
            let ownership = cache.get_or_resolve(&subnet_id, &resolver).unwrap();
            assert_eq!(ownership.threshold, 2);
        }
        assert_eq!(resolver.calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_refresh() {
        let subnet_id = Id::from_slice(&[6; 32]);
        let mut inner = StaticResolver::new();
        inner.insert(sample_ownership(subnet_id));
        let resolver = CountingResolver::new(inner);

        let mut cache = OwnershipCache::new();
        cache.get_or_resolve(&subnet_id, &resolver).unwrap();
        assert!(cache.invalidate(&subnet_id));
        assert!(!cache.invalidate(&subnet_id));
        cache.get_or_resolve(&subnet_id, &resolver).unwrap();
        assert_eq!(resolver.calls.get(), 2);
    }

    #[test]
    fn test_cache_miss_propagates_error() {
        let resolver = StaticResolver::new();
        let mut cache = OwnershipCache::new();
        let missing = Id::from_slice(&[8; 32]);
        assert!(matches!(
            cache.get_or_resolve(&missing, &resolver),
            Err(OwnershipError::NotFound(_))
        ));
        assert!(cache.is_empty());
    }
}
