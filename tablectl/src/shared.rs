use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tablectl_exec::Executor;

use crate::{Action, Result, TableController, UidMarkMap, UidMarkRegistry};

/// A [`TableController`] shared between callers.
///
/// Each operation holds the lock from slot lookup through the external commands to the rule
/// count update, so concurrent add and remove calls on the same slot cannot interleave.
#[derive(Debug)]
pub struct SharedController<E, U = UidMarkMap> {
    inner: Arc<Mutex<TableController<E, U>>>,
}

impl<E, U> Clone for SharedController<E, U> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: Executor, U: UidMarkRegistry> SharedController<E, U> {
    /// Wraps `controller` for shared use.
    pub fn new(controller: TableController<E, U>) -> Self {
        Self { inner: Arc::new(Mutex::new(controller)) }
    }

    /// Locks the controller for a sequence of operations that must not interleave with others.
    pub fn lock(&self) -> MutexGuard<'_, TableController<E, U>> {
        self.inner.lock()
    }

    /// See [`TableController::add_route`].
    pub fn add_route(
        &self,
        iface: &str,
        destination: &str,
        prefix: u8,
        gateway: &str,
    ) -> Result<()> {
        self.lock().add_route(iface, destination, prefix, gateway)
    }

    /// See [`TableController::remove_route`].
    pub fn remove_route(
        &self,
        iface: &str,
        destination: &str,
        prefix: u8,
        gateway: &str,
    ) -> Result<()> {
        self.lock().remove_route(iface, destination, prefix, gateway)
    }

    /// See [`TableController::modify_from_rule`].
    pub fn modify_from_rule(&self, index: usize, action: Action, address: &str) -> Result<()> {
        self.lock().modify_from_rule(index, action, address)
    }

    /// See [`TableController::modify_local_route`].
    pub fn modify_local_route(
        &self,
        index: usize,
        action: Action,
        iface: &str,
        address: &str,
    ) -> Result<()> {
        self.lock().modify_local_route(index, action, iface, address)
    }

    /// See [`TableController::set_fwmark_rule`].
    pub fn add_fwmark_rule(&self, iface: &str) -> Result<()> {
        self.lock().add_fwmark_rule(iface)
    }

    /// See [`TableController::set_fwmark_rule`].
    pub fn remove_fwmark_rule(&self, iface: &str) -> Result<()> {
        self.lock().remove_fwmark_rule(iface)
    }

    /// See [`TableController::set_uid_rule`].
    pub fn add_uid_rule(&self, iface: &str, uid_start: u32, uid_end: u32) -> Result<()> {
        self.lock().add_uid_rule(iface, uid_start, uid_end)
    }

    /// See [`TableController::set_uid_rule`].
    pub fn remove_uid_rule(&self, iface: &str, uid_start: u32, uid_end: u32) -> Result<()> {
        self.lock().remove_uid_rule(iface, uid_start, uid_end)
    }

    /// See [`TableController::table_for`].
    pub fn table_for(&self, iface: &str) -> Option<u32> {
        self.lock().table_for(iface)
    }
}
