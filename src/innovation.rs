//! Innovation history shared by every genome of a run.
//!
//! When a genome grows a new synapse it asks the history for an innovation
//! number. A recorded number is handed out again only when the request comes
//! from the same endpoint nodes AND the requesting genome carries exactly the
//! synapse set that was recorded alongside it. Anything else allocates a fresh
//! number and appends a record.
//!
//! Matching on the full synapse set is stricter than classic NEAT, which only
//! matches endpoints within one generation. Two genomes that reach the same
//! connection through different histories get distinct numbers.

use serde::{Deserialize, Serialize};

/// First innovation number handed out by a fresh history.
pub const FIRST_INNOVATION: u64 = 1000;

/// One allocation recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationRecord {
    /// Number of the source node.
    pub from: u32,
    /// Number of the target node.
    pub to: u32,
    /// Innovation number assigned to the synapse.
    pub innovation: u64,
    /// Sorted innovation numbers the requesting genome carried at the time.
    pub snapshot: Vec<u64>,
}

impl InnovationRecord {
    /// Whether a request from `from -> to` by a genome holding `synapses`
    /// (sorted) may reuse this record.
    fn matches(&self, from: u32, to: u32, synapses: &[u64]) -> bool {
        self.from == from && self.to == to && self.snapshot == synapses
    }
}

/// Append-only ledger of innovation numbers.
///
/// The history is owned by the caller (usually a
/// [`Generation`](crate::generation::Generation)) and passed explicitly to
/// every operation that may create a synapse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationHistory {
    records: Vec<InnovationRecord>,
    next_innovation: u64,
}

impl Default for InnovationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl InnovationHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_innovation: FIRST_INNOVATION,
        }
    }

    /// Look up or allocate the innovation number for a synapse `from -> to`
    /// requested by a genome currently holding the synapses `current`.
    pub fn innovation_for<I>(&mut self, from: u32, to: u32, current: I) -> u64
    where
        I: IntoIterator<Item = u64>,
    {
        let mut snapshot: Vec<u64> = current.into_iter().collect();
        snapshot.sort_unstable();

        if let Some(record) = self
            .records
            .iter()
            .find(|record| record.matches(from, to, &snapshot))
        {
            return record.innovation;
        }

        let innovation = self.next_innovation;
        self.next_innovation += 1;
        self.records.push(InnovationRecord {
            from,
            to,
            innovation,
            snapshot,
        });
        innovation
    }

    /// Number of recorded allocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no allocation has happened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded allocations in the order they happened.
    #[must_use]
    pub fn records(&self) -> &[InnovationRecord] {
        &self.records
    }
}
