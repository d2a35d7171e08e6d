//! Single-slot autosave debouncer.
//!
//! Scheduling while a save is pending replaces it, so a burst of mutations
//! produces one write `delay` after the last of them. The debouncer only
//! tracks deadlines; the editor decides what firing means.

use crate::clock::Millis;

#[derive(Debug, Clone)]
pub struct AutoSave {
    delay: Millis,
    /// Time of the most recent `schedule` call, if a save is pending
    scheduled_at: Option<Millis>,
    /// Bumped on every schedule/cancel/fire; lets async drivers spot a replaced slot
    generation: u64,
}

impl AutoSave {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: delay_ms.min(i64::MAX as u64) as Millis,
            scheduled_at: None,
            generation: 0,
        }
    }

    /// Cancel any pending save and schedule a new one. Returns the new generation.
    pub fn schedule(&mut self, now: Millis) -> u64 {
        self.scheduled_at = Some(now);
        self.generation += 1;
        self.generation
    }

    /// Drop the pending save. Returns false if nothing was pending.
    pub fn cancel(&mut self) -> bool {
        if self.scheduled_at.take().is_some() {
            self.generation += 1;
            true
        } else {
            false
        }
    }

    /// Clock time at which the pending save should fire.
    pub fn deadline(&self) -> Option<Millis> {
        self.scheduled_at.map(|at| at.saturating_add(self.delay))
    }

    pub fn is_due(&self, now: Millis) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Clear the slot if it is due. Returns true when the caller should write.
    pub fn take_due(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.take()
        } else {
            false
        }
    }

    /// Clear the slot regardless of the deadline. Returns true if a save was pending.
    pub fn take(&mut self) -> bool {
        self.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.scheduled_at.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn delay_ms(&self) -> Millis {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_collapses_to_one_deadline() {
        let mut autosave = AutoSave::new(1000);

        for t in [0, 100, 200, 300, 400] {
            autosave.schedule(t);
        }

        assert_eq!(autosave.deadline(), Some(1400));
        assert!(!autosave.take_due(1399));
        assert!(autosave.take_due(1400));
        assert!(!autosave.is_pending());
        assert!(!autosave.take_due(5000));
    }

    #[test]
    fn test_generation_tracks_replacement() {
        let mut autosave = AutoSave::new(10);
        let first = autosave.schedule(0);
        let second = autosave.schedule(5);
        assert!(second > first);

        assert!(autosave.cancel());
        assert!(autosave.generation() > second);
        assert!(!autosave.cancel());
    }

    #[test]
    fn test_take_ignores_deadline() {
        let mut autosave = AutoSave::new(1000);
        assert!(!autosave.take());
        autosave.schedule(0);
        assert!(autosave.take());
        assert_eq!(autosave.deadline(), None);
    }
}
