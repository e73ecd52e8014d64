use tablectl_exec::{command, Executor};

use crate::{ControllerOptions, Error, Result, SlotRegistry, UidMarkMap, UidMarkRegistry};

/// Which `iptables` flavours a firewall rule is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IptablesTarget {
    /// `iptables` only.
    V4,
    /// `iptables`, then `ip6tables`.
    V4V6,
}

impl IptablesTarget {
    fn has_v6(self) -> bool {
        matches!(self, Self::V4V6)
    }
}

/// Manages the secondary routing tables of a set of interfaces.
///
/// Every interface that needs its own table is bound to one slot of a [`SlotRegistry`]. The
/// controller sequences the `ip` and `iptables` invocations for each operation through an
/// [`Executor`] and keeps the slot rule counts in step with what was installed:
///
/// - routes ([`add_route`](Self::add_route), [`remove_route`](Self::remove_route))
/// - source rules and local routes ([`modify_from_rule`](Self::modify_from_rule),
///   [`modify_local_route`](Self::modify_local_route))
/// - fwmark rules with their NAT masquerade ([`set_fwmark_rule`](Self::set_fwmark_rule))
/// - UID range marks ([`set_uid_rule`](Self::set_uid_rule))
///
/// All operations block until the external commands have exited. The controller itself is not
/// synchronized; use [`SharedController`](crate::SharedController) when several callers need it.
#[derive(Debug)]
pub struct TableController<E, U = UidMarkMap> {
    pub(crate) slots: SlotRegistry,
    pub(crate) executor: E,
    pub(crate) uid_marks: U,
    pub(crate) options: ControllerOptions,
}

impl<E: Executor> TableController<E, UidMarkMap> {
    /// Creates a controller with default options and an empty in-memory UID mark map.
    pub fn new(executor: E) -> Self {
        Self::from_parts(executor, UidMarkMap::new(), ControllerOptions::default())
    }
}

impl<E: Executor, U: UidMarkRegistry> TableController<E, U> {
    /// Creates a controller from its parts, failing if `options` would place a slot table
    /// outside the usable range.
    pub fn with_options(executor: E, uid_marks: U, options: ControllerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_parts(executor, uid_marks, options))
    }

    fn from_parts(executor: E, uid_marks: U, options: ControllerOptions) -> Self {
        Self { slots: SlotRegistry::new(options.base_table), executor, uid_marks, options }
    }

    /// The table slots and their rule counts.
    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    /// The UID ranges marked so far.
    pub fn uid_marks(&self) -> &U {
        &self.uid_marks
    }

    /// Tool paths, chain names and base table in use.
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// The executor every command goes through.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the slot bound to `iface`, without allocating one.
    pub fn slot_index(&self, iface: &str) -> Option<usize> {
        if iface.is_empty() {
            return None;
        }
        self.slots.find_slot(iface)
    }

    /// Returns the table number (and fwmark) currently owned by `iface`.
    pub fn table_for(&self, iface: &str) -> Option<u32> {
        self.slot_index(iface).map(|index| self.slots.table_index(index))
    }

    /// Runs one command. A failure is reported as `op`.
    pub(crate) fn run(&self, op: &'static str, args: &[&str]) -> Result<()> {
        self.executor.run(args).map_err(Error::command(op))?;
        Ok(())
    }

    /// Runs an `iptables` command for every flavour in `target`. All flavours are attempted even
    /// if one fails; the first failure is returned.
    pub(crate) fn exec_iptables(
        &self,
        op: &'static str,
        target: IptablesTarget,
        args: &[&str],
    ) -> Result<()> {
        let v6 = target.has_v6().then_some(self.options.ip6tables_path.as_str());

        let mut result = Ok(());
        for binary in [Some(self.options.iptables_path.as_str()), v6].into_iter().flatten() {
            let mut cmd = Vec::with_capacity(args.len() + 1);
            cmd.push(binary);
            cmd.extend_from_slice(args);

            if let Err(e) = self.run(op, &cmd) {
                tracing::error!(?e, cmd = %command::display(&cmd), "iptables command failed");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }
}
