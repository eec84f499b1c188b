// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node kinds and effect flags.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// What a work node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The root of a tree; its host instance is the container.
    Root,
    /// A native element.
    HostElement,
    /// A native text node.
    HostText,
    /// A function component; has no host instance of its own.
    Component,
}

impl NodeKind {
    /// Returns whether nodes of this kind own a host instance that is
    /// inserted into a parent (elements and text).
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::HostElement | Self::HostText)
    }

    /// Returns whether nodes of this kind act as the host parent of their
    /// descendants.
    #[must_use]
    pub const fn is_host_parent(self) -> bool {
        matches!(self, Self::HostElement | Self::Root)
    }
}

/// Pending host mutations for a node.
///
/// A set flag means exactly one mutation is pending; the commit clears each
/// flag right after applying it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EffectFlags(u8);

impl EffectFlags {
    /// No pending mutation.
    pub const NONE: Self = Self(0);
    /// Insert (or move) the node's host instance.
    pub const PLACEMENT: Self = Self(1 << 0);
    /// Patch the node's host instance.
    pub const UPDATE: Self = Self(1 << 1);
    /// Tear down the children listed in the node's deletions.
    pub const CHILD_DELETION: Self = Self(1 << 2);
    /// Every flag the commit acts on.
    pub const MUTATION_MASK: Self = Self(Self::PLACEMENT.0 | Self::UPDATE.0 | Self::CHILD_DELETION.0);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns whether all flags in `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether any flag in `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Clears the flags in `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for EffectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EffectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EffectFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for EffectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("EffectFlags(NONE)");
        }
        let mut set = f.debug_set();
        if self.contains(Self::PLACEMENT) {
            set.entry(&format_args!("PLACEMENT"));
        }
        if self.contains(Self::UPDATE) {
            set.entry(&format_args!("UPDATE"));
        }
        if self.contains(Self::CHILD_DELETION) {
            set.entry(&format_args!("CHILD_DELETION"));
        }
        set.finish()
    }
}
