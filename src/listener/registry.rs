//! Extension-keyed lookup of media resource handlers.

use super::MediaResource;
use crate::error::{MixerError, MixerResult};
use std::collections::HashMap;
use std::path::Path;

/// Builds an unopened resource handler.
pub type ResourceFactory = Box<dyn Fn() -> Box<dyn MediaResource> + Send + Sync>;

/// Maps lowercase file extensions to resource factories.
#[derive(Default)]
pub struct ResourceRegistry {
    factories: HashMap<String, ResourceFactory>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("ResourceRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `extension` (with or without the leading dot).
    /// Replaces any previous handler for the same extension.
    pub fn register<F>(&mut self, extension: &str, factory: F)
    where
        F: Fn() -> Box<dyn MediaResource> + Send + Sync + 'static,
    {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.factories.insert(key, Box::new(factory));
    }

    /// Removes the handler for `extension`.
    pub fn unregister(&mut self, extension: &str) -> bool {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.factories.remove(&key).is_some()
    }

    /// Whether a handler exists for `extension`.
    pub fn supports(&self, extension: &str) -> bool {
        let key = extension.trim_start_matches('.').to_ascii_lowercase();
        self.factories.contains_key(&key)
    }

    /// Builds and opens the handler matching `locator`'s extension.
    pub fn open(&self, locator: &str) -> MixerResult<Box<dyn MediaResource>> {
        let extension = Path::new(locator)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| MixerError::unsupported_resource(""))?;
        let factory = self
            .factories
            .get(&extension)
            .ok_or_else(|| MixerError::unsupported_resource(extension.as_str()))?;

        let mut resource = factory();
        resource.open_resource(locator)?;
        Ok(resource)
    }
}
