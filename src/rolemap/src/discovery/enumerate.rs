//! Type enumeration and namespace filtering

use crate::error::{DiscoveryError, HostError};
use crate::host::HostRuntime;
use crate::model::{TypeDescriptor, TypeHandle};

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Namespaces never worth inspecting: runtime library, bundled
/// frameworks, array types, alternate-launcher internals
pub const DEFAULT_REJECTED_PREFIXES: &[&str] = &[
    "java.",
    "javax.",
    "sun.",
    "jdk.",
    "com.sun.",
    "org.",
    "com.google.",
    "io.",
    "it.unimi.",
    "kotlin.",
    "[",
    "com.moonsworth.",
    "com.lunarclient.",
    "lunar.",
];

/// Prefix-based rejection of type names
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    rejected: Vec<String>,
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl NamespaceFilter {
    /// Default prefixes plus configured extras and the engine's own namespace
    pub fn new(extra: &[String], self_prefixes: &[String]) -> Self {
        let rejected = DEFAULT_REJECTED_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().cloned())
            .chain(self_prefixes.iter().cloned())
            .filter(|p| !p.is_empty())
            .collect();
        Self { rejected }
    }

    /// Prefix that rejects `name`, if any
    pub fn rejection(&self, name: &str) -> Option<&str> {
        self.rejected
            .iter()
            .find(|p| name.starts_with(p.as_str()))
            .map(String::as_str)
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.rejection(name).is_none()
    }
}

/// Accepted host types of one discovery pass
#[derive(Debug, Default)]
pub struct TypeUniverse {
    types: Vec<Arc<TypeDescriptor>>,
    by_name: HashMap<String, usize>,
    by_handle: HashMap<TypeHandle, usize>,
    /// Types reported by the host
    pub scanned: usize,
    /// Types dropped by the namespace filter
    pub rejected: usize,
    /// Types whose description failed
    pub failed: usize,
}

impl TypeUniverse {
    fn push(&mut self, desc: TypeDescriptor) {
        let index = self.types.len();
        self.by_name.insert(desc.name.clone(), index);
        self.by_handle.insert(desc.handle, index);
        self.types.push(Arc::new(desc));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn by_handle(&self, handle: TypeHandle) -> Option<&Arc<TypeDescriptor>> {
        self.by_handle.get(&handle).map(|&i| &self.types[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Accepted types in host enumeration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// SHA-256 over the sorted accepted type names, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut names: Vec<&str> = self.types.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        let mut hasher = Sha256::new();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

/// Enumerate and describe loaded types, keeping those the filter accepts
pub fn enumerate_types(
    host: &dyn HostRuntime,
    filter: &NamespaceFilter,
) -> Result<TypeUniverse, DiscoveryError> {
    let handles = match host.loaded_types() {
        Ok(handles) => handles,
        Err(HostError::NotReady(reason)) => return Err(DiscoveryError::EnumerationNotReady(reason)),
        Err(e) => return Err(DiscoveryError::EnumerationNotReady(e.to_string())),
    };
    if handles.is_empty() {
        return Err(DiscoveryError::EnumerationNotReady(
            "host reported no loaded types".to_string(),
        ));
    }

    let mut universe = TypeUniverse {
        scanned: handles.len(),
        ..Default::default()
    };

    for handle in handles {
        let desc = match host.describe(handle) {
            Ok(desc) => desc,
            Err(e) => {
                trace!("Skipping type {:?}: {}", handle, e);
                universe.failed += 1;
                continue;
            }
        };
        if let Some(prefix) = filter.rejection(&desc.name) {
            trace!("Rejected {} ({})", desc.name, prefix);
            universe.rejected += 1;
            continue;
        }
        universe.push(desc);
    }

    debug!(
        "Enumerated {} types: {} accepted, {} rejected, {} failed",
        universe.scanned,
        universe.len(),
        universe.rejected,
        universe.failed
    );

    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::MockHost;
    use crate::host::{Snapshot, SnapshotHost, TypeEntry};

    fn host() -> SnapshotHost {
        let snapshot = Snapshot::default()
            .with_type(TypeEntry::new("java.lang.Object"))
            .with_type(TypeEntry::new("org.lwjgl.Display"))
            .with_type(TypeEntry::new("com.lunarclient.Bridge"))
            .with_type(TypeEntry::new("[I"))
            .with_type(TypeEntry::new("ave"))
            .with_type(TypeEntry::new("net.minecraft.client.Minecraft"))
            .with_type(TypeEntry::new("me.agent.Hook"));
        SnapshotHost::from_snapshot(snapshot).unwrap()
    }

    #[test]
    fn test_filter_rejects_runtime_and_launcher_namespaces() {
        let filter = NamespaceFilter::new(&[], &["me.agent.".to_string()]);
        assert!(!filter.accepts("java.util.ArrayList"));
        assert!(!filter.accepts("[Ljava.lang.String;"));
        assert!(!filter.accepts("com.moonsworth.lunar.Client"));
        assert!(!filter.accepts("me.agent.Hook"));
        assert!(filter.accepts("ave"));
        assert!(filter.accepts("net.minecraft.client.Minecraft"));
        assert_eq!(filter.rejection("kotlin.Unit"), Some("kotlin."));
    }

    #[test]
    fn test_enumerate_counts() {
        let filter = NamespaceFilter::new(&[], &["me.agent.".to_string()]);
        let universe = enumerate_types(&host(), &filter).unwrap();
        assert_eq!(universe.scanned, 7);
        assert_eq!(universe.rejected, 5);
        assert_eq!(universe.len(), 2);
        assert!(universe.contains("ave"));
        assert!(!universe.contains("java.lang.Object"));
    }

    #[test]
    fn test_not_ready_and_empty_are_retryable() {
        let filter = NamespaceFilter::default();
        let mock = MockHost::new(host()).not_ready_for(1).empty_for(1);

        let first = enumerate_types(&mock, &filter).unwrap_err();
        assert!(matches!(first, DiscoveryError::EnumerationNotReady(_)));
        assert!(first.is_retryable());

        let second = enumerate_types(&mock, &filter).unwrap_err();
        assert!(matches!(second, DiscoveryError::EnumerationNotReady(_)));

        assert!(enumerate_types(&mock, &filter).is_ok());
    }

    #[test]
    fn test_throwing_descriptions_are_skipped() {
        let mock = MockHost::new(host()).throw_on_describe("ave");
        let universe = enumerate_types(&mock, &NamespaceFilter::default()).unwrap();
        assert_eq!(universe.failed, 1);
        assert!(!universe.contains("ave"));
        assert!(universe.contains("net.minecraft.client.Minecraft"));
    }

    #[test]
    fn test_fingerprint_ignores_enumeration_order() {
        let a = Snapshot::default()
            .with_type(TypeEntry::new("a.A"))
            .with_type(TypeEntry::new("b.B"));
        let b = Snapshot::default()
            .with_type(TypeEntry::new("b.B"))
            .with_type(TypeEntry::new("a.A"));
        let filter = NamespaceFilter::default();
        let ua = enumerate_types(&SnapshotHost::from_snapshot(a).unwrap(), &filter).unwrap();
        let ub = enumerate_types(&SnapshotHost::from_snapshot(b).unwrap(), &filter).unwrap();
        assert_eq!(ua.fingerprint(), ub.fingerprint());
        assert_eq!(ua.fingerprint().len(), 64);
    }
}
