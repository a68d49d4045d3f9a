//! The global plugin registry and access functions.

use crate::registry::Registry;
use once_cell::sync::Lazy;
use std::sync::Arc;

// The one and only global registry.
// It will be created on its first access in a thread-safe manner.
static GLOBAL_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// Provides a reference to the global registry.
///
/// Plugins registered here are available to every experiment built without an
/// explicit registry.
///
/// # Examples
///
/// ```
/// use trellis_ioc::global;
///
/// fn register_plugins() {
///   // Get the global registry and register a value reachable as `$greeting`.
///   global()
///     .register_value("greeting", String::from("Hello from global!"))
///     .unwrap();
/// }
/// # register_plugins();
/// ```
pub fn global() -> &'static Registry {
  &GLOBAL_REGISTRY
}

/// A shared handle to the global registry.
pub(crate) fn shared() -> Arc<Registry> {
  Arc::clone(&GLOBAL_REGISTRY)
}
