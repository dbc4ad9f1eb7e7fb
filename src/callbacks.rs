//! Handle-based subscriber lists.

/// Identifies a registered callback. Handles start at 1 and are never reused.
pub type CallbackHandle = u32;

pub struct CallbackRegistry<F: ?Sized> {
    entries: Vec<(CallbackHandle, Box<F>)>,
    next_handle: CallbackHandle,
}

impl<F: ?Sized> CallbackRegistry<F> {
    pub fn new() -> Self {
        CallbackRegistry {
            entries: Vec::new(),
            next_handle: 1,
        }
    }

    pub fn add(&mut self, callback: Box<F>) -> CallbackHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.entries.push((handle, callback));
        handle
    }

    /// Returns false when `handle` was not registered.
    pub fn remove(&mut self, handle: CallbackHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callbacks in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut F> {
        self.entries.iter_mut().map(|(_, cb)| cb.as_mut())
    }
}

impl<F: ?Sized> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
