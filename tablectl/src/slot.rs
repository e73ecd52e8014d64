//! Fixed-capacity registry binding interface names to secondary routing tables.
//!
//! Each of the [`INTERFACES_TRACKED`] slots owns exactly one kernel table, whose number is the
//! slot position plus the registry's base table number. A slot is occupied while it holds an
//! interface name, and carries a count of the routes and rules that currently point at its
//! table. When a removal brings that count back to zero the slot is released.

use std::fmt;

use crate::{Error, Result, IFNAMSIZ, INTERFACES_TRACKED};

/// Whether a rule or route is being installed or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Install the rule or route.
    Add,
    /// Remove it again.
    Del,
}

impl Action {
    /// [`Action::Add`] if `add`, else [`Action::Del`].
    pub fn from_add(add: bool) -> Self {
        if add {
            Self::Add
        } else {
            Self::Del
        }
    }

    /// The verb understood by `ip route` and `ip rule`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Del => "del",
        }
    }

    /// The append/delete flag understood by `iptables`.
    pub fn iptables_flag(self) -> &'static str {
        match self {
            Self::Add => "-A",
            Self::Del => "-D",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interface name stored inline, at most [`IFNAMSIZ`] bytes long.
///
/// Longer names are not representable. The empty name marks a free slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterfaceName {
    buf: [u8; IFNAMSIZ],
    len: u8,
}

impl InterfaceName {
    /// The name of a free slot.
    pub const EMPTY: Self = Self { buf: [0; IFNAMSIZ], len: 0 };

    /// Copies `name` inline, or returns `None` if it is longer than [`IFNAMSIZ`] bytes.
    pub fn new(name: &str) -> Option<Self> {
        let len = name.len();
        if len > IFNAMSIZ {
            return None;
        }

        let mut buf = [0; IFNAMSIZ];
        buf[..len].copy_from_slice(name.as_bytes());
        Some(Self { buf, len: len as u8 })
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        // Only ever filled from a whole `&str`.
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or_default()
    }

    /// Whether this is [`InterfaceName::EMPTY`].
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One secondary table: the interface bound to it and how many routes and rules use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    name: InterfaceName,
    rule_count: u32,
}

impl Slot {
    /// The bound interface, empty when the slot is free.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Routes and rules currently pointing at the table.
    pub fn rule_count(&self) -> u32 {
        self.rule_count
    }

    /// Whether an interface is bound to the slot.
    pub fn is_occupied(&self) -> bool {
        !self.name.is_empty()
    }

    fn clear(&mut self) {
        self.name = InterfaceName::EMPTY;
        self.rule_count = 0;
    }
}

/// The pool of [`INTERFACES_TRACKED`] slots, numbered from a base table.
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    slots: [Slot; INTERFACES_TRACKED],
    base_table: u32,
}

impl SlotRegistry {
    /// Creates a registry with every slot free, slot 0 owning `base_table`.
    pub fn new(base_table: u32) -> Self {
        Self { slots: [Slot::default(); INTERFACES_TRACKED], base_table }
    }

    /// Table number of slot 0.
    pub fn base_table(&self) -> u32 {
        self.base_table
    }

    /// Number of slots, occupied or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Kernel table number owned by the slot at `index`.
    #[inline]
    pub fn table_index(&self, index: usize) -> u32 {
        self.base_table + index as u32
    }

    /// The slot at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Returns the position of the slot holding exactly `name`. Looking up the empty name
    /// returns the first free slot. A name longer than [`IFNAMSIZ`] is never bound.
    pub fn find_slot(&self, name: &str) -> Option<usize> {
        let name = InterfaceName::new(name)?;
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Returns the slot already bound to `name`, or binds the first free one.
    pub fn allocate(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::invalid("empty interface name"));
        }
        let Some(stored) = InterfaceName::new(name) else {
            return Err(Error::invalid(format!("interface name {name} exceeds {IFNAMSIZ} bytes")));
        };

        if let Some(index) = self.find_slot(name) {
            return Ok(index);
        }

        let Some(index) = self.find_slot("") else {
            tracing::error!(iface = name, "max number of NATed interfaces reached");
            return Err(Error::CapacityExceeded);
        };

        let table = self.table_index(index);
        let slot = &mut self.slots[index];
        slot.name = stored;
        slot.rule_count = 0;

        tracing::debug!(iface = %slot.name, index, table, "allocated table slot");
        Ok(index)
    }

    /// Fails unless `index` is in range and currently bound to an interface.
    pub fn verify(&self, index: usize) -> Result<()> {
        match self.slots.get(index) {
            Some(slot) if slot.is_occupied() => Ok(()),
            _ => Err(Error::invalid(format!("invalid table slot {index}"))),
        }
    }

    /// Applies `action` to the rule count of the slot at `index`. A removal that would bring the
    /// count below one releases the slot, even if the count was already zero.
    pub fn adjust_rule_count(&mut self, index: usize, action: Action) {
        let table = self.table_index(index);
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };

        match action {
            Action::Add => slot.rule_count += 1,
            Action::Del => {
                if slot.rule_count <= 1 {
                    if slot.is_occupied() {
                        tracing::debug!(iface = %slot.name, table, "releasing table slot");
                    }
                    slot.clear();
                } else {
                    slot.rule_count -= 1;
                }
            }
        }
    }

    /// Frees the slot at `index` if nothing references its table yet. Used to undo an
    /// allocation whose first command failed.
    pub(crate) fn release_unused(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.rule_count == 0 {
                slot.clear();
            }
        }
    }

    /// Iterates the occupied slots as `(table, slot)`.
    pub fn occupied(&self) -> impl Iterator<Item = (u32, &Slot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_occupied())
            .map(|(index, slot)| (self.table_index(index), slot))
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new(crate::BASE_TABLE_NUMBER)
    }
}
