use std::sync::Arc;

pub(crate) type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A registered observer: a change handler paired with an effect handler.
///
/// `on_change` should stay free of side effects; `on_effect` is where they
/// belong. Both receive the same payload, change first.
pub(crate) struct Observer<T: ?Sized> {
    on_change: Callback<T>,
    on_effect: Callback<T>,
}

impl<T: ?Sized + 'static> Observer<T> {
    /// Observer whose effect handler does nothing.
    pub(crate) fn new<F>(on_change: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            on_change: Arc::new(on_change),
            on_effect: Arc::new(|_: &T| {}),
        }
    }

    pub(crate) fn with_effect<F, E>(on_change: F, on_effect: E) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
        E: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            on_change: Arc::new(on_change),
            on_effect: Arc::new(on_effect),
        }
    }

    pub(crate) fn notify(&self, payload: &T) {
        (self.on_change)(payload);
        (self.on_effect)(payload);
    }
}

// Manual Clone: only the handler Arcs are cloned, T need not be Clone.
impl<T: ?Sized> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            on_change: Arc::clone(&self.on_change),
            on_effect: Arc::clone(&self.on_effect),
        }
    }
}
