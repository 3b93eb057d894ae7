//! Bounded conversation history replayed to the provider on every call.

use iete_protocol::models::Turn;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use tracing::trace;

/// Ordered turn history holding at most `max_turns` entries. Appending past
/// the bound silently drops the oldest turns.
#[derive(Debug, Clone)]
pub struct Session {
    turns: VecDeque<Turn>,
    max_turns: NonZeroUsize,
    system_instruction: String,
}

impl Session {
    pub fn new(max_turns: NonZeroUsize, system_instruction: impl Into<String>) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns.get()),
            max_turns,
            system_instruction: system_instruction.into(),
        }
    }

    /// Drops all turns and installs a new instruction for later calls.
    pub fn reset(&mut self, system_instruction: impl Into<String>) {
        self.turns.clear();
        self.system_instruction = system_instruction.into();
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns.get() {
            self.turns.pop_front();
            trace!(max_turns = self.max_turns.get(), "evicted oldest turn");
        }
    }

    /// Oldest-first copy of the retained turns.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> NonZeroUsize {
        self.max_turns
    }
}
