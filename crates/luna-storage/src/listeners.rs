//! Change listeners for the stores.

use std::sync::Arc;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Registered callbacks for one store.
pub struct Listeners<T> {
    entries: Vec<(ListenerId, Callback<T>)>,
    next_id: usize,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Listeners<T> {
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Arc::new(callback)));
        id
    }

    /// Returns true if the listener was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(listener_id, _)| *listener_id != id);
        self.entries.len() < before
    }

    pub fn notify(&self, value: &T) {
        for (_, callback) in &self.entries {
            callback(value);
        }
    }
}
