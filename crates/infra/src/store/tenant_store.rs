use std::collections::HashMap;
use std::hash::Hash;

use stockflow_core::TenantId;

/// Tenant-isolated key/value storage for workflow headers.
///
/// Every access is keyed by tenant; a record of one tenant is invisible to the
/// others even when ids collide.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;
    fn upsert(&mut self, tenant_id: TenantId, key: K, value: V);
    fn list(&self, tenant_id: TenantId) -> Vec<V>;
}

/// In-memory tenant-isolated table.
///
/// Carries no lock of its own: it lives inside the inventory store's state and
/// is guarded by that lock.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: HashMap<(TenantId, K), V>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        self.inner.get(&(tenant_id, key.clone())).cloned()
    }

    fn upsert(&mut self, tenant_id: TenantId, key: K, value: V) {
        self.inner.insert((tenant_id, key), value);
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        self.inner
            .iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect()
    }
}
