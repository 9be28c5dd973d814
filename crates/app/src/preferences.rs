//! Reactive preference values.
//!
//! A [`Preference`] is an explicitly injected setting: the UI layer reads it,
//! writes it, and observes it through [`Preference::changes`]. There is no
//! ambient global access; whoever needs a preference receives it (or a group
//! such as [`ReaderPreferences`]) by reference.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use shiori_domain::library::LibrarySort;

/// A single reactive setting value backed by a tokio [`watch`] channel.
///
/// Clones share the same underlying value.
#[derive(Debug)]
pub struct Preference<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for Preference<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Preference<T> {
    /// Create a preference holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Read the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Replace the value, waking every `changes()` stream.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Observe the value: emits the current value immediately, then every
    /// subsequent write. The stream ends only when dropped.
    #[must_use]
    pub fn changes(&self) -> WatchStream<T> {
        WatchStream::new(self.sender.subscribe())
    }
}

/// The reading-related settings surfaced to the UI layer.
#[derive(Debug, Clone)]
pub struct ReaderPreferences {
    pub library_sort: Preference<LibrarySort>,
    pub night_mode: Preference<bool>,
    pub font_size: Preference<u32>,
}

impl Default for ReaderPreferences {
    fn default() -> Self {
        Self {
            library_sort: Preference::new(LibrarySort::default()),
            night_mode: Preference::new(false),
            font_size: Preference::new(16),
        }
    }
}
