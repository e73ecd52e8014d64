use tablectl_exec::Executor;

use crate::{Action, Result, TableController, UidMarkRegistry};

/// `ip` protocol flag for an address literal: any colon means IPv6.
pub fn ip_version(address: &str) -> &'static str {
    if address.contains(':') {
        "-6"
    } else {
        "-4"
    }
}

impl<E: Executor, U: UidMarkRegistry> TableController<E, U> {
    /// Routes packets sourced from `address` through the table of slot `index`.
    pub fn modify_from_rule(&mut self, index: usize, action: Action, address: &str) -> Result<()> {
        self.slots.verify(index)?;

        let table = self.slots.table_index(index);
        let table_str = table.to_string();
        let args = [
            self.options.ip_path.as_str(),
            ip_version(address),
            "rule",
            action.as_str(),
            "from",
            address,
            "table",
            table_str.as_str(),
        ];

        if let Err(e) = self.run("ip rule modification failed", &args) {
            tracing::error!(?e, %action, address, table, "ip rule modification failed");
            return Err(e);
        }

        self.slots.adjust_rule_count(index, action);
        Ok(())
    }

    /// Installs or removes the route to one of the interface's own addresses in the table of
    /// slot `index`.
    ///
    /// The rule count is adjusted before the command runs and regardless of its outcome: local
    /// routes are usually removed after the interface is gone, in which case `ip` fails but the
    /// slot must still be released.
    pub fn modify_local_route(
        &mut self,
        index: usize,
        action: Action,
        iface: &str,
        address: &str,
    ) -> Result<()> {
        self.slots.verify(index)?;
        self.slots.adjust_rule_count(index, action);

        let table = self.slots.table_index(index);
        let table_str = table.to_string();
        let args = [
            self.options.ip_path.as_str(),
            "route",
            action.as_str(),
            address,
            "dev",
            iface,
            "table",
            table_str.as_str(),
        ];

        self.run("ip route modification failed", &args).map_err(|e| {
            tracing::debug!(?e, %action, address, iface, table, "local route modification failed");
            e
        })
    }
}
