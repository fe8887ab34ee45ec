//! Minimalistic, type-safe service hub.
//!
//! Modules expose services to each other through the hub:
//! - A provider module registers an implementation during activation.
//! - Modules activated later fetch it by *interface type* (usually a trait object).
//!
//! Implementation details:
//! - Key = `type_name::<T>()`, which works for `T = dyn Trait`.
//! - Value = `Arc<T>` stored as `Box<dyn Any + Send + Sync>` (downcast on read).
//! - Re-registering overwrites the previous value; existing `Arc`s held by consumers remain valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Stable type key for trait objects, built from the fully-qualified `type_name::<T>()`.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceHubError {
    #[error("service not found: type={type_key:?}")]
    NotFound { type_key: TypeKey },

    #[error("type mismatch in hub for type={type_key:?}")]
    TypeMismatch { type_key: TypeKey },
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Type-safe registry of services keyed by interface type.
#[derive(Default)]
pub struct ServiceHub {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl fmt::Debug for ServiceHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<TypeKey> = self.map.read().keys().copied().collect();
        f.debug_struct("ServiceHub").field("services", &keys).finish()
    }
}

impl ServiceHub {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under the interface type `T`.
    /// `T` can be a trait object like `dyn my_module::GreeterApi`.
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        if self.map.write().insert(type_key, Box::new(service)).is_some() {
            tracing::debug!(service = ?type_key, "service re-registered, previous value replaced");
        }
    }

    /// Fetch a service by interface type `T`.
    ///
    /// # Errors
    /// Returns [`ServiceHubError::NotFound`] if nothing is registered under `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ServiceHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let r = self.map.read();
        let boxed = r.get(&type_key).ok_or(ServiceHubError::NotFound { type_key })?;
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ServiceHubError::TypeMismatch { type_key })
    }

    #[must_use]
    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.read().contains_key(&TypeKey::of::<T>())
    }

    /// Remove a service; returns it if present.
    pub fn remove<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(&TypeKey::of::<T>())?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    trait Clock: Send + Sync + std::fmt::Debug {
        fn now(&self) -> u64;
    }

    #[derive(Debug)]
    struct Fixed(u64);

    impl Clock for Fixed {
        fn now(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn register_and_get_trait_object() {
        let hub = ServiceHub::new();
        hub.register::<dyn Clock>(Arc::new(Fixed(7)));

        let clock = hub.get::<dyn Clock>().unwrap();
        assert_eq!(clock.now(), 7);
        assert!(hub.contains::<dyn Clock>());
    }

    #[test]
    fn missing_service_is_not_found() {
        let hub = ServiceHub::new();
        let err = hub.get::<dyn Clock>().unwrap_err();
        assert!(matches!(err, ServiceHubError::NotFound { .. }));
    }

    #[test]
    fn re_register_overwrites_but_keeps_old_arcs_alive() {
        let hub = ServiceHub::new();
        hub.register::<dyn Clock>(Arc::new(Fixed(1)));
        let old = hub.get::<dyn Clock>().unwrap();

        hub.register::<dyn Clock>(Arc::new(Fixed(2)));
        assert_eq!(old.now(), 1);
        assert_eq!(hub.get::<dyn Clock>().unwrap().now(), 2);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn remove_returns_service() {
        let hub = ServiceHub::new();
        hub.register::<String>(Arc::new("svc".to_owned()));
        assert_eq!(hub.remove::<String>().as_deref().map(String::as_str), Some("svc"));
        assert!(hub.is_empty());
    }
}
