//! Per-opcode instruction counter.

use std::collections::BTreeMap;
use std::fmt;

/// Invocation counts keyed by opcode display name.
///
/// Names iterate in lexical order, which is also the dump order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionCounter {
    counts: BTreeMap<&'static str, u64>,
}

impl InstructionCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more invocation of `name`.
    pub fn increment(&mut self, name: &'static str) {
        *self.counts.entry(name).or_insert(0) += 1;
    }

    /// Count for `name`, 0 if never seen.
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Sum over all names.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(name, count)` pairs in dump order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    /// Whether nothing has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One `name->count` line per opcode.
impl fmt::Display for InstructionCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, count) in self.iter() {
            writeln!(f, "{}->{}", name, count)?;
        }
        Ok(())
    }
}
