//! In-memory lines for simulation and tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{LineError, OutputLine, PresenceSensor};

/// Shared boolean line; clones observe and drive the same level
#[derive(Debug, Clone, Default)]
pub struct MemoryLine {
    level: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryLine {
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the level from the outside (simulated hardware)
    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }

    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Number of `OutputLine::write` calls seen
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PresenceSensor for MemoryLine {
    fn is_active(&mut self) -> Result<bool, LineError> {
        Ok(self.level())
    }
}

impl OutputLine for MemoryLine {
    fn write(&mut self, level: bool) -> Result<(), LineError> {
        self.level.store(level, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_current(&self) -> bool {
        self.level()
    }
}
