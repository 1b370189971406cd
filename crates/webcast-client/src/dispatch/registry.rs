use std::collections::{BTreeMap, HashMap};

use webcast_core::error::{FeedError, Result};

use crate::config::HandlerEntry;
use crate::handlers::{handler_fn, HandlerFn};

use super::MessageKind;

/// An enabled handler bound to its message type.
#[derive(Clone)]
pub struct Handler {
    pub kind: MessageKind,
    pub run: HandlerFn,
    pub options: HandlerEntry,
}

/// Message-type key -> enabled handler. Read-only after construction.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Handler>,
}

impl HandlerRegistry {
    /// Build from the `handlers` config table.
    ///
    /// Unknown message-type keys are skipped with a warning. A `handler`
    /// name that does not exist, or names another type's handler, is a
    /// configuration error.
    pub fn from_config(table: &BTreeMap<String, HandlerEntry>) -> Result<Self> {
        let mut handlers = HashMap::new();

        for (key, entry) in table {
            let Some(kind) = MessageKind::from_method(key) else {
                tracing::warn!(key = %key, "unknown message type in handler table; ignored");
                continue;
            };

            if let Some(name) = entry.handler.as_deref() {
                match MessageKind::from_handler_name(name) {
                    Some(k) if k == kind => {}
                    Some(_) => {
                        return Err(FeedError::Config(format!(
                            "handlers.{key}: handler {name:?} cannot decode this message type"
                        )))
                    }
                    None => {
                        return Err(FeedError::Config(format!(
                            "handlers.{key}: unknown handler {name:?}"
                        )))
                    }
                }
            }

            if !entry.enabled {
                continue;
            }

            handlers.insert(
                kind.method(),
                Handler {
                    kind,
                    run: handler_fn(kind),
                    options: entry.clone(),
                },
            );
        }

        let mut enabled: Vec<&str> = handlers.keys().copied().collect();
        enabled.sort_unstable();
        tracing::info!(handlers = ?enabled, "handler registry built");

        Ok(Self { handlers })
    }

    /// Enabled handler for `key`, if any.
    pub fn resolve(&self, key: &str) -> Option<&Handler> {
        self.handlers.get(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
