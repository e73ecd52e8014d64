use tablectl_exec::Executor;

use crate::{Action, Error, Result, TableController, UidMarkRegistry};

/// Gateway meaning "no next hop": the route goes straight out of the device. Compared as a
/// literal string, `ip` itself does not accept `::` as a gateway.
pub const UNSPECIFIED_GATEWAY: &str = "::";

impl<E: Executor, U: UidMarkRegistry> TableController<E, U> {
    /// Adds `destination/prefix_length` to the table of `iface`, binding a table slot to the
    /// interface if it has none yet.
    pub fn add_route(
        &mut self,
        iface: &str,
        destination: &str,
        prefix_length: u8,
        gateway: &str,
    ) -> Result<()> {
        let fresh = self.slot_index(iface).is_none();
        let index = self.slots.allocate(iface)?;

        let res = self.modify_route(Action::Add, iface, destination, prefix_length, gateway, index);
        if res.is_err() && fresh {
            self.slots.release_unused(index);
        }
        res
    }

    /// Removes a route previously added with [`add_route`](Self::add_route). The interface must
    /// already own a table.
    pub fn remove_route(
        &mut self,
        iface: &str,
        destination: &str,
        prefix_length: u8,
        gateway: &str,
    ) -> Result<()> {
        let Some(index) = self.slot_index(iface) else {
            tracing::error!(iface, "interface not found");
            return Err(Error::InterfaceNotFound(iface.to_string()));
        };

        self.modify_route(Action::Del, iface, destination, prefix_length, gateway, index)
    }

    fn modify_route(
        &mut self,
        action: Action,
        iface: &str,
        destination: &str,
        prefix_length: u8,
        gateway: &str,
        index: usize,
    ) -> Result<()> {
        let table = self.slots.table_index(index);
        let table_str = table.to_string();
        let dest = format!("{destination}/{prefix_length}");

        let mut args = vec![self.options.ip_path.as_str(), "route", action.as_str(), dest.as_str()];
        if gateway != UNSPECIFIED_GATEWAY {
            args.extend(["via", gateway]);
        }
        args.extend(["dev", iface, "table", table_str.as_str()]);

        if let Err(e) = self.run("ip route modification failed", &args) {
            tracing::error!(
                ?e,
                %action,
                %dest,
                gateway,
                iface,
                table,
                "ip route modification failed"
            );
            return Err(e);
        }

        self.slots.adjust_rule_count(index, action);
        tracing::debug!(%action, %dest, iface, table, "route modified");
        Ok(())
    }
}
