use std::collections::VecDeque;

use keysynth_types::KnobEvent;

/// Pending knob movements, oldest first.
///
/// Nothing is dropped or merged: a burst of N movements takes N ticks to apply.
#[derive(Debug, Default, Clone)]
pub struct KnobQueue {
    events: VecDeque<KnobEvent>,
}

impl KnobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<KnobEvent>) {
        self.events.push_back(event.into());
    }

    /// Remove and return the oldest event.
    pub fn pop(&mut self) -> Option<KnobEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnobEvent> {
        self.events.iter()
    }
}

impl Extend<KnobEvent> for KnobQueue {
    fn extend<I: IntoIterator<Item = KnobEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_arrival_order() {
        let mut q = KnobQueue::new();
        q.push((1, 1));
        q.push((1, -1));
        q.push((2, 5));
        assert_eq!(q.pop(), Some(KnobEvent::new(1, 1)));
        assert_eq!(q.pop(), Some(KnobEvent::new(1, -1)));
        assert_eq!(q.pop(), Some(KnobEvent::new(2, 5)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn repeated_knob_is_not_coalesced() {
        let mut q = KnobQueue::new();
        q.extend([KnobEvent::new(0, 1), KnobEvent::new(0, 1), KnobEvent::new(0, 1)]);
        assert_eq!(q.len(), 3);
        assert!(q.iter().all(|e| *e == KnobEvent::new(0, 1)));
    }
}
