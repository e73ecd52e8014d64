use crate::{Error, Result, BASE_TABLE_NUMBER, INTERFACES_TRACKED};

/// Highest table number callers may use before the kernel reserved ones
/// (`compat` = 252, `default` = 253, `main` = 254, `local` = 255).
const LAST_UNRESERVED_TABLE: u32 = 251;

/// Options for a [`TableController`](crate::TableController).
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Path of the `ip` tool.
    pub ip_path: String,
    /// Path of the IPv4 `iptables` tool.
    pub iptables_path: String,
    /// Path of the IPv6 `ip6tables` tool.
    pub ip6tables_path: String,
    /// Chain in the `nat` table holding the per-interface masquerade rules.
    pub nat_chain: String,
    /// Chain in the `mangle` table holding the UID range mark rules.
    pub mangle_chain: String,
    /// Table number of the first slot. Slot `i` owns table `base_table + i`, which is also the
    /// fwmark used for that interface.
    pub base_table: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            ip_path: "ip".to_string(),
            iptables_path: "iptables".to_string(),
            ip6tables_path: "ip6tables".to_string(),
            nat_chain: "st_nat_POSTROUTING".to_string(),
            mangle_chain: "st_mangle_OUTPUT".to_string(),
            base_table: BASE_TABLE_NUMBER,
        }
    }
}

impl ControllerOptions {
    /// Sets the path of the `ip` tool.
    pub fn with_ip_path(mut self, path: impl Into<String>) -> Self {
        self.ip_path = path.into();
        self
    }

    /// Sets the paths of `iptables` and `ip6tables`.
    pub fn with_iptables_paths(mut self, v4: impl Into<String>, v6: impl Into<String>) -> Self {
        self.iptables_path = v4.into();
        self.ip6tables_path = v6.into();
        self
    }

    /// Sets the chain receiving masquerade rules.
    pub fn with_nat_chain(mut self, chain: impl Into<String>) -> Self {
        self.nat_chain = chain.into();
        self
    }

    /// Sets the chain receiving UID mark rules.
    pub fn with_mangle_chain(mut self, chain: impl Into<String>) -> Self {
        self.mangle_chain = chain.into();
        self
    }

    /// Sets the table number of the first slot. Checked by [`validate`](Self::validate).
    pub fn with_base_table(mut self, base_table: u32) -> Self {
        self.base_table = base_table;
        self
    }

    /// Checks that every slot maps to a table outside the kernel reserved range.
    pub fn validate(&self) -> Result<()> {
        let last = self.base_table.checked_add(INTERFACES_TRACKED as u32 - 1);
        if self.base_table == 0 || last.map_or(true, |last| last > LAST_UNRESERVED_TABLE) {
            return Err(Error::invalid(format!(
                "base table {} overlaps reserved routing tables",
                self.base_table
            )));
        }

        for (name, value) in [
            ("ip path", &self.ip_path),
            ("iptables path", &self.iptables_path),
            ("ip6tables path", &self.ip6tables_path),
            ("nat chain", &self.nat_chain),
            ("mangle chain", &self.mangle_chain),
        ] {
            if value.is_empty() {
                return Err(Error::invalid(format!("empty {name}")));
            }
        }

        Ok(())
    }
}
