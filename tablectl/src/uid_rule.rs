use tablectl_exec::Executor;

use crate::{controller::IptablesTarget, Action, Error, Result, TableController, UidMarkRegistry};

impl<E: Executor, U: UidMarkRegistry> TableController<E, U> {
    /// Shorthand for [`set_uid_rule`](Self::set_uid_rule) with `add = true`.
    pub fn add_uid_rule(&mut self, iface: &str, uid_start: u32, uid_end: u32) -> Result<()> {
        self.set_uid_rule(iface, uid_start, uid_end, true)
    }

    /// Shorthand for [`set_uid_rule`](Self::set_uid_rule) with `add = false`.
    pub fn remove_uid_rule(&mut self, iface: &str, uid_start: u32, uid_end: u32) -> Result<()> {
        self.set_uid_rule(iface, uid_start, uid_end, false)
    }

    /// Marks packets owned by UIDs in `[uid_start, uid_end]` with the table number of `iface`.
    ///
    /// The interface must already own a table; this never allocates one. The association is
    /// recorded in the UID mark registry before the firewall is touched, and a rejection by the
    /// registry leaves the firewall alone.
    pub fn set_uid_rule(
        &mut self,
        iface: &str,
        uid_start: u32,
        uid_end: u32,
        add: bool,
    ) -> Result<()> {
        let action = Action::from_add(add);
        let Some(index) = self.slot_index(iface) else {
            return Err(Error::invalid(format!("no table for interface {iface}")));
        };
        if uid_start > uid_end {
            return Err(Error::invalid(format!("invalid uid range {uid_start}-{uid_end}")));
        }

        let mark = self.slots.table_index(index);
        let accepted = match action {
            Action::Add => self.uid_marks.add(uid_start, uid_end, mark),
            Action::Del => self.uid_marks.remove(uid_start, uid_end, mark),
        };
        if !accepted {
            tracing::debug!(%action, iface, uid_start, uid_end, mark, "uid range rejected");
            return Err(Error::invalid(format!(
                "uid range {uid_start}-{uid_end} rejected for mark {mark}"
            )));
        }

        let mark_str = mark.to_string();
        let uids = format!("{uid_start}-{uid_end}");
        let args = [
            "-t",
            "mangle",
            action.iptables_flag(),
            self.options.mangle_chain.as_str(),
            "-m",
            "owner",
            "--uid-owner",
            uids.as_str(),
            "-j",
            "MARK",
            "--set-mark",
            mark_str.as_str(),
        ];

        self.exec_iptables("iptables mangle modification failed", IptablesTarget::V4V6, &args)
    }
}
