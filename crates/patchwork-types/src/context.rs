//! Tag-keyed service context.
//!
//! A [`Context`] maps [`TagId`]s to type-erased [`Service`] values. It is
//! persistent: cloning is O(1) and every mutating method copies the
//! underlying table on write, so other holders of the same context never
//! observe the change.
//!
//! # Invariants
//!
//! - Keys are compared by tag identity, never by name.
//! - Iteration follows insertion order; re-binding an existing tag keeps its
//!   position, removing a tag shifts later bindings down.
//! - Equality ignores order and compares services by pointer identity.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ContextError;
use crate::tag::{Tag, TagId};

/// A shared, type-erased service value.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Returns `true` if both handles point at the same service allocation.
pub fn same_service(a: &Service, b: &Service) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Persistent map from service tags to services.
#[derive(Clone, Default)]
pub struct Context {
    services: Arc<IndexMap<TagId, Service>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no service is bound.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns `true` if `tag` is bound.
    pub fn contains<S>(&self, tag: &Tag<S>) -> bool {
        self.services.contains_key(&tag.id())
    }

    /// Returns `true` if the erased tag id is bound.
    pub fn contains_id(&self, id: TagId) -> bool {
        self.services.contains_key(&id)
    }

    // ---------------------------------------------------------------
    // Typed access
    // ---------------------------------------------------------------

    /// Look up the service bound to `tag`.
    ///
    /// Returns `None` if the tag is unbound or bound to a value of another
    /// type.
    pub fn get<S>(&self, tag: &Tag<S>) -> Option<Arc<S>>
    where
        S: Any + Send + Sync,
    {
        self.try_get(tag).ok()
    }

    /// Look up the service bound to `tag`, reporting why it is unavailable.
    pub fn try_get<S>(&self, tag: &Tag<S>) -> Result<Arc<S>, ContextError>
    where
        S: Any + Send + Sync,
    {
        let service = self
            .services
            .get(&tag.id())
            .ok_or(ContextError::ServiceNotFound(tag.id()))?;
        Arc::clone(service)
            .downcast::<S>()
            .map_err(|_| ContextError::ServiceTypeMismatch {
                tag: tag.id(),
                expected: type_name::<S>(),
            })
    }

    /// Return a new context with `service` bound to `tag`.
    pub fn add<S>(&self, tag: &Tag<S>, service: S) -> Self
    where
        S: Any + Send + Sync,
    {
        self.add_shared(tag, Arc::new(service))
    }

    /// Return a new context with an already shared `service` bound to `tag`.
    pub fn add_shared<S>(&self, tag: &Tag<S>, service: Arc<S>) -> Self
    where
        S: Any + Send + Sync,
    {
        let mut next = self.clone();
        next.insert_erased(tag.id(), service);
        next
    }

    /// Return a new context without `tag`.
    pub fn without<S>(&self, tag: &Tag<S>) -> Self {
        let mut next = self.clone();
        next.remove(tag.id());
        next
    }

    /// Return a new context holding every binding of `self` followed by the
    /// bindings of `other`. Bindings in `other` win on conflict.
    pub fn merge(&self, other: &Context) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut next = self.clone();
        for (id, service) in other.iter() {
            next.insert_erased(id, Arc::clone(service));
        }
        next
    }

    // ---------------------------------------------------------------
    // Erased access
    // ---------------------------------------------------------------

    /// The service bound to `id`, if any.
    pub fn get_erased(&self, id: TagId) -> Option<&Service> {
        self.services.get(&id)
    }

    /// Bind `service` to `id`, returning the previous binding.
    pub fn insert_erased(&mut self, id: TagId, service: Service) -> Option<Service> {
        Arc::make_mut(&mut self.services).insert(id, service)
    }

    /// Unbind `id`, returning the removed service.
    pub fn remove(&mut self, id: TagId) -> Option<Service> {
        if !self.services.contains_key(&id) {
            return None;
        }
        Arc::make_mut(&mut self.services).shift_remove(&id)
    }

    /// Iterate over bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TagId, &Service)> + '_ {
        self.services.iter().map(|(id, service)| (*id, service))
    }

    /// Iterate over bound tag ids in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.services.keys().copied()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.services, &other.services) {
            return true;
        }
        self.len() == other.len()
            && self.iter().all(|(id, service)| {
                other
                    .get_erased(id)
                    .is_some_and(|theirs| same_service(service, theirs))
            })
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags()).finish()
    }
}

impl FromIterator<(TagId, Service)> for Context {
    fn from_iter<I: IntoIterator<Item = (TagId, Service)>>(iter: I) -> Self {
        Self {
            services: Arc::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Database {
        url: String,
    }

    #[test]
    fn add_and_get_typed() {
        let db = Tag::<Database>::new("Database");
        let ctx = Context::new().add(
            &db,
            Database {
                url: "postgres://localhost".into(),
            },
        );
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get(&db).unwrap().url, "postgres://localhost");
    }

    #[test]
    fn add_does_not_touch_original() {
        let port = Tag::<u16>::new("Port");
        let empty = Context::new();
        let ctx = empty.add(&port, 8080);
        assert!(empty.is_empty());
        assert!(ctx.contains(&port));
    }

    #[test]
    fn try_get_missing_service() {
        let port = Tag::<u16>::new("Port");
        let err = Context::new().try_get(&port).unwrap_err();
        assert_eq!(err, ContextError::ServiceNotFound(port.id()));
    }

    #[test]
    fn try_get_mistyped_service() {
        let port = Tag::<u16>::new("Port");
        let mut ctx = Context::new();
        ctx.insert_erased(port.id(), Arc::new("not a port".to_string()));
        assert!(matches!(
            ctx.try_get(&port),
            Err(ContextError::ServiceTypeMismatch { .. })
        ));
        assert!(ctx.get(&port).is_none());
    }

    #[test]
    fn rebinding_keeps_position() {
        let a = Tag::<u8>::new("a");
        let b = Tag::<u8>::new("b");
        let ctx = Context::new().add(&a, 1).add(&b, 2).add(&a, 3);
        let order: Vec<TagId> = ctx.tags().collect();
        assert_eq!(order, vec![a.id(), b.id()]);
        assert_eq!(*ctx.get(&a).unwrap(), 3);
    }

    #[test]
    fn remove_shifts_later_bindings() {
        let a = Tag::<u8>::new("a");
        let b = Tag::<u8>::new("b");
        let c = Tag::<u8>::new("c");
        let ctx = Context::new().add(&a, 1).add(&b, 2).add(&c, 3).without(&b);
        let order: Vec<TagId> = ctx.tags().collect();
        assert_eq!(order, vec![a.id(), c.id()]);
    }

    #[test]
    fn equality_is_by_service_identity() {
        let a = Tag::<u8>::new("a");
        let shared = Arc::new(7u8);
        let left = Context::new().add_shared(&a, Arc::clone(&shared));
        let right = Context::new().add_shared(&a, shared);
        assert_eq!(left, right);

        // Structurally equal but separately allocated services differ.
        let other = Context::new().add(&a, 7u8);
        assert_ne!(left, other);
    }

    #[test]
    fn equality_ignores_order() {
        let a = Tag::<u8>::new("a");
        let b = Tag::<u8>::new("b");
        let one: Service = Arc::new(1u8);
        let two: Service = Arc::new(2u8);
        let ab: Context = [(a.id(), one.clone()), (b.id(), two.clone())]
            .into_iter()
            .collect();
        let ba: Context = [(b.id(), two), (a.id(), one)].into_iter().collect();
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_prefers_right_bindings() {
        let a = Tag::<u8>::new("a");
        let b = Tag::<u8>::new("b");
        let left = Context::new().add(&a, 1).add(&b, 2);
        let right = Context::new().add(&b, 20);
        let merged = left.merge(&right);
        assert_eq!(*merged.get(&a).unwrap(), 1);
        assert_eq!(*merged.get(&b).unwrap(), 20);
        assert_eq!(*left.get(&b).unwrap(), 2);
    }
}
