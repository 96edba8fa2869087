//! Values attached to a [`Context`] on behalf of one owner.
//!
//! A slot stores its value in the context's own extensions, so the value is dropped
//! together with the last clone of the context, whichever way the call ends. Each slot
//! has its own id: two slots holding the same value type never see each other's entries.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use super::Context;

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(0);

/// Extension holding the values of every slot of type `V` attached to one context.
#[derive(Clone)]
struct SlotValues<V>(HashMap<u64, V>);

pub(crate) struct ContextSlot<V> {
    id: u64,
    _value: PhantomData<fn() -> V>,
}

impl<V> Default for ContextSlot<V> {
    fn default() -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            _value: PhantomData,
        }
    }
}

impl<V> ContextSlot<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Attach `value` to `context`, replacing what this slot held there.
    pub(crate) fn insert(&self, context: &Context, value: V) {
        context.with_extensions(|extensions| {
            match extensions.get_mut::<SlotValues<V>>() {
                Some(values) => {
                    values.0.insert(self.id, value);
                }
                None => {
                    extensions.insert(SlotValues(HashMap::from([(self.id, value)])));
                }
            }
        });
    }

    pub(crate) fn get(&self, context: &Context) -> Option<V> {
        context.with_extensions(|extensions| {
            extensions
                .get::<SlotValues<V>>()
                .and_then(|values| values.0.get(&self.id).cloned())
        })
    }
}
