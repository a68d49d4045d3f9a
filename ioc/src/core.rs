//! Core, non-public bookkeeping for a build.

use crate::error::{Error, Result};
use std::cell::RefCell;

/// The top-level keys whose build is in progress, innermost last.
///
/// This is the key to detecting loops: a forward reference builds its target on
/// demand, so a key that is asked for while it is still on the stack can never finish.
#[derive(Default)]
pub(crate) struct BuildStack {
  keys: RefCell<Vec<String>>,
}

/// An RAII guard marking one key as being built.
///
/// When created, it pushes the key onto the build stack. If the key is already
/// there, the configuration contains a loop and an error carrying the whole chain is
/// returned instead. When the guard is dropped, the key is popped again, on the error
/// path as well.
pub(crate) struct BuildGuard<'a> {
  stack: &'a BuildStack,
}

impl<'a> BuildGuard<'a> {
  pub(crate) fn enter(stack: &'a BuildStack, key: &str) -> Result<Self> {
    let mut keys = stack.keys.borrow_mut();
    if let Some(start) = keys.iter().position(|k| k == key) {
      let mut chain = keys[start..].to_vec();
      chain.push(key.to_owned());
      return Err(Error::CyclicReference { chain });
    }
    keys.push(key.to_owned());
    Ok(Self { stack })
  }
}

impl Drop for BuildGuard<'_> {
  fn drop(&mut self) {
    self.stack.keys.borrow_mut().pop();
  }
}
