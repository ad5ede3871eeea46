use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

/// Identity of a service slot.
///
/// Two ids are equal only if they were produced by the same call to
/// [`TagId::new`]. The name is carried for display and takes no part in
/// equality or hashing.
#[derive(Clone, Copy)]
pub struct TagId {
    seq: u64,
    name: &'static str,
}

impl TagId {
    /// Allocate a fresh, globally unique tag id.
    pub fn new(name: &'static str) -> Self {
        Self {
            seq: NEXT_TAG.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// The human-readable name given at creation.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The unique sequence number backing this id.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl PartialEq for TagId {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for TagId {}

impl Hash for TagId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({}#{})", self.name, self.seq)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.seq)
    }
}

/// A typed handle for a service of type `S`.
///
/// Tags are compared by identity: creating two tags with the same name and
/// service type yields two distinct slots.
pub struct Tag<S> {
    id: TagId,
    _service: PhantomData<fn() -> S>,
}

impl<S> Tag<S> {
    pub fn new(name: &'static str) -> Self {
        Self {
            id: TagId::new(name),
            _service: PhantomData,
        }
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name
    }
}

impl<S> Clone for Tag<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Tag<S> {}

impl<S> PartialEq for Tag<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Tag<S> {}

impl<S> fmt::Debug for Tag<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.id).finish()
    }
}
