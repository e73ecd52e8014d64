use tablectl_exec::Executor;

use crate::{controller::IptablesTarget, Action, Result, TableController, UidMarkRegistry};

impl<E: Executor, U: UidMarkRegistry> TableController<E, U> {
    /// Shorthand for [`set_fwmark_rule`](Self::set_fwmark_rule) with `add = true`.
    pub fn add_fwmark_rule(&mut self, iface: &str) -> Result<()> {
        self.set_fwmark_rule(iface, true)
    }

    /// Shorthand for [`set_fwmark_rule`](Self::set_fwmark_rule) with `add = false`.
    pub fn remove_fwmark_rule(&mut self, iface: &str) -> Result<()> {
        self.set_fwmark_rule(iface, false)
    }

    /// Routes packets marked for `iface` through its table and masquerades them on the way out.
    ///
    /// The mark is the table number itself. This is two independent steps: the `ip rule` first,
    /// then the NAT rule. When the NAT rule fails the `ip rule` stays in place and keeps its
    /// reference on the slot; the error is returned so the caller can retry or remove it.
    pub fn set_fwmark_rule(&mut self, iface: &str, add: bool) -> Result<()> {
        let action = Action::from_add(add);
        let fresh = self.slot_index(iface).is_none();
        let index = self.slots.allocate(iface)?;

        let mark = self.slots.table_index(index);
        let mark_str = mark.to_string();
        let rule = [
            self.options.ip_path.as_str(),
            "rule",
            action.as_str(),
            "fwmark",
            mark_str.as_str(),
            "table",
            mark_str.as_str(),
        ];

        if let Err(e) = self.run("ip rule modification failed", &rule) {
            tracing::error!(?e, %action, iface, mark, "ip rule fwmark modification failed");
            if fresh {
                self.slots.release_unused(index);
            }
            return Err(e);
        }

        self.slots.adjust_rule_count(index, action);

        // Kernels before 3.7 only NAT IPv4.
        let nat = [
            "-t",
            "nat",
            action.iptables_flag(),
            self.options.nat_chain.as_str(),
            "-o",
            iface,
            "-m",
            "mark",
            "--mark",
            mark_str.as_str(),
            "-j",
            "MASQUERADE",
        ];

        let res = self.exec_iptables("iptables NAT modification failed", IptablesTarget::V4, &nat);
        if let Err(e) = res {
            tracing::warn!(
                ?e,
                %action,
                iface,
                mark,
                "fwmark rule applied but NAT rule failed, rule set is partially applied"
            );
            return Err(e);
        }

        Ok(())
    }
}
