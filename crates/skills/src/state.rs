//! Per-session active skill set and its transition policies.
//!
//! Every mutation computes the next `active` sequence in full and swaps it in
//! with a single assignment, so an abandoned request never observes a
//! half-applied transition.

use skillgate_core::{DEFAULT_FIFO_CAPACITY, SessionConfig, TransitionMode};

use crate::types::{Result, SkillError};

/// Outcome of an activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The skill became active; `dropped` lists ids that left the set
    /// (the previous skill under Replace, the oldest entry under FIFO).
    Activated { dropped: Vec<String> },
    /// The skill was already active and `active` is unchanged
    AlreadyActive,
}

impl Transition {
    pub fn changed(&self) -> bool {
        matches!(self, Transition::Activated { .. })
    }

    pub fn dropped(&self) -> &[String] {
        match self {
            Transition::Activated { dropped } => dropped,
            Transition::AlreadyActive => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSkillState {
    mode: TransitionMode,
    capacity: usize,
    /// Insertion order, no duplicates
    active: Vec<String>,
}

impl SessionSkillState {
    /// Empty state with the default FIFO capacity
    pub fn new(mode: TransitionMode) -> Self {
        Self { mode, capacity: DEFAULT_FIFO_CAPACITY, active: Vec::new() }
    }

    /// Empty state with an explicit capacity; zero is rejected under FIFO.
    pub fn with_capacity(mode: TransitionMode, capacity: usize) -> Result<Self> {
        if mode == TransitionMode::Fifo && capacity == 0 {
            return Err(SkillError::InvalidTransition("fifo capacity must be at least 1".to_string()));
        }
        Ok(Self { mode, capacity, active: Vec::new() })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::with_capacity(config.mode, config.capacity)
    }

    pub fn mode(&self) -> TransitionMode {
        self.mode
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Active skill ids in insertion order
    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn is_active(&self, skill_id: &str) -> bool {
        self.active.iter().any(|id| id == skill_id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Apply the session's transition policy for `skill_id`.
    ///
    /// Callers check permissions first; this never refuses an id.
    pub fn activate(&mut self, skill_id: &str) -> Transition {
        if self.is_active(skill_id) {
            return Transition::AlreadyActive;
        }

        let (next, dropped) = match self.mode {
            TransitionMode::Replace => (vec![skill_id.to_string()], self.active.clone()),
            TransitionMode::Accumulate => {
                let mut next = self.active.clone();
                next.push(skill_id.to_string());
                (next, Vec::new())
            }
            TransitionMode::Fifo => {
                let mut next = self.active.clone();
                next.push(skill_id.to_string());
                let overflow = next.len().saturating_sub(self.capacity);
                let dropped: Vec<String> = next.drain(..overflow).collect();
                (next, dropped)
            }
        };

        self.active = next;
        Transition::Activated { dropped }
    }

    /// Remove `skill_id` if present. Returns whether anything changed.
    pub fn deactivate(&mut self, skill_id: &str) -> bool {
        if !self.is_active(skill_id) {
            return false;
        }
        self.active = self.active.iter().filter(|id| *id != skill_id).cloned().collect();
        true
    }
}
