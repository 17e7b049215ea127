//! Line registry
//!
//! Immutable table mapping each monitored line to its hardware configuration,
//! plus the hardware-offset → registry-index map the reader uses. Built once
//! at engine construction and never mutated.

use std::collections::HashMap;

use crate::gpio::{LineRequest, Pull};

use super::error::{EngineError, Result};

/// Static configuration for one monitored line.
#[derive(Debug, Clone, Copy)]
pub struct LineConfig {
    /// Hardware line offset on the GPIO chip
    pub offset: u32,
    /// Button wired active-low (pressed pulls the line low)
    pub active_low: bool,
    /// Request an internal pull resistor matching the polarity
    pub enable_pull: bool,
}

impl LineConfig {
    /// Pull policy for this line: pull-up for active-low buttons,
    /// pull-down otherwise, nothing when pulls are disabled.
    pub fn pull(&self) -> Pull {
        if !self.enable_pull {
            Pull::None
        } else if self.active_low {
            Pull::Up
        } else {
            Pull::Down
        }
    }
}

/// Immutable per-line configuration table.
#[derive(Debug)]
pub struct LineRegistry {
    lines: Vec<LineConfig>,
    by_offset: HashMap<u32, usize>,
}

impl LineRegistry {
    /// Build the registry, rejecting empty and duplicate line sets.
    pub fn new(lines: Vec<LineConfig>) -> Result<Self> {
        if lines.is_empty() {
            return Err(EngineError::EmptyLineSet);
        }

        let mut by_offset = HashMap::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if by_offset.insert(line.offset, index).is_some() {
                return Err(EngineError::DuplicateLine(line.offset));
            }
        }

        Ok(Self { lines, by_offset })
    }

    /// Number of configured lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the registry is empty (never true after construction).
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Configuration for a registry index.
    pub fn get(&self, index: usize) -> Option<&LineConfig> {
        self.lines.get(index)
    }

    /// Registry index for a hardware offset, if registered.
    ///
    /// Line offsets are never assumed contiguous or small; this map is the
    /// only translation between hardware numbering and engine indices.
    pub fn index_of(&self, offset: u32) -> Option<usize> {
        self.by_offset.get(&offset).copied()
    }

    /// Per-line open parameters for the edge source.
    pub fn line_requests(&self) -> Vec<LineRequest> {
        self.lines
            .iter()
            .map(|line| LineRequest {
                offset: line.offset,
                pull: line.pull(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(offset: u32) -> LineConfig {
        LineConfig {
            offset,
            active_low: true,
            enable_pull: true,
        }
    }

    #[test]
    fn test_empty_line_set_rejected() {
        let err = LineRegistry::new(Vec::new()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyLineSet));
    }

    #[test]
    fn test_duplicate_offset_rejected() {
        let err = LineRegistry::new(vec![line(5), line(7), line(5)]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateLine(5)));
    }

    #[test]
    fn test_index_lookup_is_sparse() {
        let registry = LineRegistry::new(vec![line(25), line(6), line(27)]).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.index_of(25), Some(0));
        assert_eq!(registry.index_of(27), Some(2));
        assert_eq!(registry.index_of(4), None);
    }

    #[test]
    fn test_pull_derivation() {
        let active_low = line(1);
        assert_eq!(active_low.pull(), Pull::Up);

        let active_high = LineConfig {
            offset: 2,
            active_low: false,
            enable_pull: true,
        };
        assert_eq!(active_high.pull(), Pull::Down);

        let no_pull = LineConfig {
            offset: 3,
            active_low: true,
            enable_pull: false,
        };
        assert_eq!(no_pull.pull(), Pull::None);
    }
}
