//! Inventory operations and views.
//!
//! The world reports inventory as slot records. [`totals`] and [`count_of`]
//! collapse those into per-kind counts for planners; [`Inventory`] is the
//! mutable store behind the grid world, with checked arithmetic throughout
//! so that no operation silently overflows.

use std::collections::BTreeMap;

use blockwright_types::{ItemKind, ItemStack};

use crate::error::WorldError;

/// Items per inventory slot.
pub const STACK_SIZE: u32 = 64;

/// Collapse slot records into per-kind totals.
pub fn totals(stacks: &[ItemStack]) -> BTreeMap<ItemKind, u32> {
    let mut out: BTreeMap<ItemKind, u32> = BTreeMap::new();
    for stack in stacks {
        let entry = out.entry(stack.kind.clone()).or_insert(0);
        *entry = entry.saturating_add(stack.count);
    }
    out
}

/// Total count of `kind` across all slots.
pub fn count_of(stacks: &[ItemStack], kind: &ItemKind) -> u32 {
    stacks
        .iter()
        .filter(|s| &s.kind == kind)
        .fold(0_u32, |acc, s| acc.saturating_add(s.count))
}

/// Per-kind item counts with checked add and remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<ItemKind, u32>,
}

impl Inventory {
    /// An empty inventory.
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// How many of `kind` are held.
    pub fn count(&self, kind: &ItemKind) -> u32 {
        self.items.get(kind).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `kind` are held.
    pub fn has(&self, kind: &ItemKind, amount: u32) -> bool {
        self.count(kind) >= amount
    }

    /// Add `amount` of `kind`.
    pub fn add(&mut self, kind: &ItemKind, amount: u32) -> Result<(), WorldError> {
        if amount == 0 {
            return Ok(());
        }
        let entry = self.items.entry(kind.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| WorldError::ArithmeticOverflow {
                context: format!("inventory count of {kind}"),
            })?;
        Ok(())
    }

    /// Remove `amount` of `kind`, failing if not enough are held.
    ///
    /// Removes the key entirely when the count reaches zero.
    pub fn remove(&mut self, kind: &ItemKind, amount: u32) -> Result<(), WorldError> {
        let held = self.count(kind);
        let remaining = held.checked_sub(amount).ok_or_else(|| WorldError::MissingItem {
            item: kind.clone(),
            needed: amount,
            held,
        })?;
        if remaining == 0 {
            self.items.remove(kind);
        } else {
            self.items.insert(kind.clone(), remaining);
        }
        Ok(())
    }

    /// Slot records, splitting large counts into stacks of [`STACK_SIZE`].
    pub fn stacks(&self) -> Vec<ItemStack> {
        let mut out = Vec::new();
        let mut slot: u16 = 0;
        for (kind, &count) in &self.items {
            let mut left = count;
            while left > 0 {
                let take = left.min(STACK_SIZE);
                out.push(ItemStack {
                    kind: kind.clone(),
                    count: take,
                    slot,
                });
                slot = slot.saturating_add(1);
                left = left.saturating_sub(take);
            }
        }
        out
    }
}
