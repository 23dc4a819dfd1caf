//! Command dispatch table
//!
//! Maps upper-cased verbs to handlers. New commands are added with
//! `register` without touching existing handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::commands::{CommandHandler, PassHandler, UnknownCommand, UserHandler};

pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    fallback: Arc<dyn CommandHandler>,
}

impl CommandRegistry {
    /// Registry with no verbs; everything goes to the fallback.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(UnknownCommand),
        }
    }

    /// Registry with the login commands installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("USER", UserHandler);
        registry.register("PASS", PassHandler);
        registry
    }

    /// Add or replace the handler for `verb` (any case).
    pub fn register<H>(&mut self, verb: &str, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        self.handlers.insert(verb.to_ascii_uppercase(), Arc::new(handler));
        self
    }

    /// Replace the handler used for unregistered verbs.
    pub fn set_fallback<H>(&mut self, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        self.fallback = Arc::new(handler);
        self
    }

    /// Handler for an upper-cased verb, falling back when unregistered.
    pub fn resolve(&self, verb: &str) -> Arc<dyn CommandHandler> {
        self.handlers
            .get(verb)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Minimum argument count for an upper-cased verb.
    pub fn min_args(&self, verb: &str) -> usize {
        self.handlers
            .get(verb)
            .map_or(0, |handler| handler.min_args())
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.handlers.contains_key(&verb.to_ascii_uppercase())
    }

    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
