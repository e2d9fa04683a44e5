// 📣 Refresh events - explicit message passing instead of ambient broadcasts
//
// Components never reach for a global: whoever needs to signal a refresh is
// handed an `EventBus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RefreshEvent {
    /// Manual or scheduled refresh request; `feed = None` means all feeds
    RefreshRequested {
        feed: Option<String>,
        at: DateTime<Utc>,
    },

    FeedRefreshed {
        feed: String,
        count: usize,
        at: DateTime<Utc>,
    },

    FeedFailed {
        feed: String,
        error: String,
        at: DateTime<Utc>,
    },

    /// Locally cached parsed transfers were dropped
    CacheCleared { key: String },
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: RefreshEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn publish(&self, _event: RefreshEvent) {}
}

type Subscriber = Box<dyn Fn(&RefreshEvent) + Send + Sync>;

/// Keeps a history of published events and fans them out to subscribers
/// synchronously, in subscription order
#[derive(Default)]
pub struct InMemoryEventBus {
    history: Mutex<Vec<RefreshEvent>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl InMemoryEventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(Box::new(callback));
        }
    }

    pub fn history(&self) -> Vec<RefreshEvent> {
        self.history
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, event: RefreshEvent) {
        if let Ok(subscribers) = self.subscribers.lock() {
            for subscriber in subscribers.iter() {
                subscriber(&event);
            }
        }
        if let Ok(mut history) = self.history.lock() {
            history.push(event);
        }
    }
}

impl<T: EventBus + ?Sized> EventBus for Arc<T> {
    fn publish(&self, event: RefreshEvent) {
        (**self).publish(event)
    }
}
