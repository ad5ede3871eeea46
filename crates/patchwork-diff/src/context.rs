//! Service context differ over [`Context`].
//!
//! Tags are matched by identity and services by pointer identity: a tag
//! re-bound to a separately allocated but structurally equal service still
//! produces an `UpdateService`.

use std::fmt;
use std::sync::Arc;

use patchwork_types::{same_service, Context, Service, TagId};
use tracing::debug;

use crate::config::PatchConfig;
use crate::differ::Differ;
use crate::error::DiffResult;
use crate::tree::{dismantle, tree_eq, tree_fmt, walk, PatchTree};

const CONTAINER: &str = "context";

/// Function that derives a new service from the currently bound one.
pub type UpdateFn = Arc<dyn Fn(&Service) -> Service + Send + Sync>;

/// A change to a [`Context`].
pub enum ContextPatch {
    Empty,
    AndThen(Arc<ContextPatch>, Arc<ContextPatch>),
    AddService { tag: TagId, service: Service },
    RemoveService { tag: TagId },
    UpdateService { tag: TagId, update: UpdateFn },
}

impl ContextPatch {
    pub fn is_empty(&self) -> bool {
        matches!(self, ContextPatch::Empty)
    }

    pub fn and_then(self, that: Self) -> Self {
        if self.is_empty() {
            return that;
        }
        if that.is_empty() {
            return self;
        }
        ContextPatch::AndThen(Arc::new(self), Arc::new(that))
    }

    /// An `UpdateService` that re-binds `tag` to `service` unconditionally.
    pub fn replace_service(tag: TagId, service: Service) -> Self {
        ContextPatch::UpdateService {
            tag,
            update: Arc::new(move |_: &Service| Arc::clone(&service)),
        }
    }
}

impl PatchTree for ContextPatch {
    fn vacant() -> Self {
        ContextPatch::Empty
    }

    fn children(&self) -> Option<(&Self, &Self)> {
        match self {
            ContextPatch::AndThen(first, second) => Some((&**first, &**second)),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<(&mut Arc<Self>, &mut Arc<Self>)> {
        match self {
            ContextPatch::AndThen(first, second) => Some((first, second)),
            _ => None,
        }
    }
}

impl Drop for ContextPatch {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl Clone for ContextPatch {
    fn clone(&self) -> Self {
        match self {
            ContextPatch::Empty => ContextPatch::Empty,
            ContextPatch::AndThen(first, second) => {
                ContextPatch::AndThen(Arc::clone(first), Arc::clone(second))
            }
            ContextPatch::AddService { tag, service } => ContextPatch::AddService {
                tag: *tag,
                service: Arc::clone(service),
            },
            ContextPatch::RemoveService { tag } => ContextPatch::RemoveService { tag: *tag },
            ContextPatch::UpdateService { tag, update } => ContextPatch::UpdateService {
                tag: *tag,
                update: Arc::clone(update),
            },
        }
    }
}

// Services and update functions compare by pointer identity.
impl PartialEq for ContextPatch {
    fn eq(&self, other: &Self) -> bool {
        tree_eq(self, other, |left, right| match (left, right) {
            (ContextPatch::Empty, ContextPatch::Empty) => true,
            (
                ContextPatch::AddService { tag, service },
                ContextPatch::AddService {
                    tag: other_tag,
                    service: other_service,
                },
            ) => tag == other_tag && same_service(service, other_service),
            (
                ContextPatch::RemoveService { tag },
                ContextPatch::RemoveService { tag: other_tag },
            ) => tag == other_tag,
            (
                ContextPatch::UpdateService { tag, update },
                ContextPatch::UpdateService {
                    tag: other_tag,
                    update: other_update,
                },
            ) => tag == other_tag && std::ptr::addr_eq(Arc::as_ptr(update), Arc::as_ptr(other_update)),
            _ => false,
        })
    }
}

impl fmt::Debug for ContextPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        tree_fmt(self, f, |leaf, f| match leaf {
            ContextPatch::Empty | ContextPatch::AndThen(..) => f.write_str("Empty"),
            ContextPatch::AddService { tag, .. } => f.debug_tuple("AddService").field(tag).finish(),
            ContextPatch::RemoveService { tag } => {
                f.debug_tuple("RemoveService").field(tag).finish()
            }
            ContextPatch::UpdateService { tag, .. } => {
                f.debug_tuple("UpdateService").field(tag).finish()
            }
        })
    }
}

/// Differ for [`Context`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextDiffer;

/// A differ for service contexts.
pub fn environment() -> ContextDiffer {
    ContextDiffer
}

impl Differ for ContextDiffer {
    type Value = Context;
    type Patch = ContextPatch;

    fn empty(&self) -> Self::Patch {
        ContextPatch::Empty
    }

    fn is_empty(&self, patch: &Self::Patch) -> bool {
        patch.is_empty()
    }

    fn diff(&self, old: &Context, new: &Context) -> Self::Patch {
        let mut patch = ContextPatch::Empty;

        for (tag, service) in new.iter() {
            match old.get_erased(tag) {
                Some(existing) if same_service(existing, service) => {}
                Some(_) => {
                    patch = patch.and_then(ContextPatch::replace_service(tag, Arc::clone(service)));
                }
                None => {
                    patch = patch.and_then(ContextPatch::AddService {
                        tag,
                        service: Arc::clone(service),
                    });
                }
            }
        }

        for tag in old.tags().filter(|tag| !new.contains_id(*tag)) {
            patch = patch.and_then(ContextPatch::RemoveService { tag });
        }

        patch
    }

    fn combine(&self, first: &Self::Patch, second: &Self::Patch) -> Self::Patch {
        first.clone().and_then(second.clone())
    }

    fn apply(
        &self,
        patch: &Self::Patch,
        old: &Context,
        config: &PatchConfig,
    ) -> DiffResult<Context> {
        let mut context = old.clone();
        let mut updated = false;

        let instructions = walk(patch, config.worklist_capacity, |node| {
            match node {
                ContextPatch::Empty | ContextPatch::AndThen(..) => {}
                ContextPatch::AddService { tag, service } => {
                    context.insert_erased(*tag, Arc::clone(service));
                }
                ContextPatch::RemoveService { tag } => {
                    context.remove(*tag);
                }
                ContextPatch::UpdateService { tag, update } => match context.get_erased(*tag) {
                    Some(current) => {
                        let next = update(current);
                        context.insert_erased(*tag, next);
                        updated = true;
                    }
                    None => config.resolve_missing(CONTAINER, "UpdateService")?,
                },
            }
            Ok(())
        })?;

        debug!(container = CONTAINER, instructions, updated, len = context.len(), "applied patch");
        if !updated {
            return Ok(context);
        }
        Ok(in_original_order(old, &context))
    }
}

/// Rebuild `patched` with surviving bindings of `old` first, in their
/// original order, followed by every other binding in application order.
fn in_original_order(old: &Context, patched: &Context) -> Context {
    let survivors = old
        .tags()
        .filter_map(|tag| patched.get_erased(tag).map(|service| (tag, Arc::clone(service))));
    let added = patched
        .iter()
        .filter(|(tag, _)| !old.contains_id(*tag))
        .map(|(tag, service)| (tag, Arc::clone(service)));
    survivors.chain(added).collect()
}
