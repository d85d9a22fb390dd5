//! # PCNT - event delivery
//!
//! The interrupt handler must never block, so unit events travel to the
//! application through a fixed-capacity queue. [`Pcnt::handle_interrupt`]
//! pushes one [`EventNotification`] per interrupting unit and the application
//! takes them with [`Pcnt::poll_event`]. When the queue is full the
//! [`OverflowPolicy`] decides which notification is lost.
//!
//! [`Pcnt::handle_interrupt`]: crate::Pcnt::handle_interrupt
//! [`Pcnt::poll_event`]: crate::Pcnt::poll_event

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use enumset::EnumSet;
use heapless::Deque;

use crate::unit::{self, Event, Events, ZeroMode};

/// A snapshot of a unit's status, taken when its interrupt fired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventNotification {
    /// The unit that raised the interrupt.
    pub unit: unit::Number,
    /// The raw status word of the unit.
    pub status: u32,
}

impl EventNotification {
    /// The events latched in the status word.
    pub fn events(&self) -> EnumSet<Event> {
        EnumSet::from_repr_truncated(self.status)
    }

    /// The events latched in the status word, as flags.
    pub fn flags(&self) -> Events {
        Events::from_status(self.status)
    }

    /// The zero mode latched in the status word.
    pub fn zero_mode(&self) -> ZeroMode {
        ZeroMode::from_status(self.status)
    }
}

/// What to do with a notification when the queue is full.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Evict the oldest queued notification to make room.
    #[default]
    DropOldest,
    /// Discard the incoming notification.
    DropNewest,
}

/// Fixed-capacity single-producer, single-consumer queue of
/// [`EventNotification`]s, safe to push from interrupt context.
pub struct EventQueue<const N: usize> {
    queue: Mutex<RefCell<Deque<EventNotification, N>>>,
    dropped: Mutex<Cell<u32>>,
    policy: OverflowPolicy,
}

impl<const N: usize> EventQueue<N> {
    /// Creates an empty queue.
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
            dropped: Mutex::new(Cell::new(0)),
            policy,
        }
    }

    /// The overflow policy of this queue.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Maximum number of queued notifications.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Queues a notification.
    ///
    /// Returns `false` if a notification (the new or the oldest one) was lost.
    pub fn push(&self, notification: EventNotification) -> bool {
        critical_section::with(|cs| {
            let mut queue = self.queue.borrow_ref_mut(cs);

            if queue.is_full() {
                let dropped = self.dropped.borrow(cs);
                dropped.set(dropped.get().saturating_add(1));

                match self.policy {
                    OverflowPolicy::DropOldest => {
                        warn!("PCNT event queue full, dropping oldest");
                        queue.pop_front();
                    }
                    OverflowPolicy::DropNewest => {
                        warn!("PCNT event queue full, dropping {:?}", notification.unit);
                        return false;
                    }
                }

                // room was made above
                queue.push_back(notification).ok();
                false
            } else {
                queue.push_back(notification).is_ok()
            }
        })
    }

    /// Takes the oldest notification.
    pub fn pop(&self) -> Option<EventNotification> {
        critical_section::with(|cs| self.queue.borrow_ref_mut(cs).pop_front())
    }

    /// Number of queued notifications.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.queue.borrow_ref(cs).len())
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of notifications lost to overflow so far.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.dropped.borrow(cs).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(unit: unit::Number) -> EventNotification {
        EventNotification {
            unit,
            status: EnumSet::only(Event::HighLimit).as_repr(),
        }
    }

    #[test]
    fn delivers_in_order() {
        let queue = EventQueue::<4>::new(OverflowPolicy::DropOldest);
        assert!(queue.is_empty());

        assert!(queue.push(notification(unit::Number::Unit0)));
        assert!(queue.push(notification(unit::Number::Unit1)));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit0));
        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit1));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn drop_oldest_keeps_latest() {
        let queue = EventQueue::<2>::new(OverflowPolicy::DropOldest);

        queue.push(notification(unit::Number::Unit0));
        queue.push(notification(unit::Number::Unit1));
        assert!(!queue.push(notification(unit::Number::Unit2)));

        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit1));
        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit2));
        assert!(queue.is_empty());
    }

    #[test]
    fn drop_newest_keeps_earliest() {
        let queue = EventQueue::<2>::new(OverflowPolicy::DropNewest);

        queue.push(notification(unit::Number::Unit0));
        queue.push(notification(unit::Number::Unit1));
        assert!(!queue.push(notification(unit::Number::Unit2)));
        assert!(!queue.push(notification(unit::Number::Unit3)));

        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit0));
        assert_eq!(queue.pop().map(|n| n.unit), Some(unit::Number::Unit1));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn notification_decodes_status() {
        let n = EventNotification {
            unit: unit::Number::Unit5,
            status: (EnumSet::only(Event::Zero) | Event::Threshold0).as_repr()
                | ZeroMode::NegZero.bits(),
        };

        assert_eq!(n.events(), Event::Zero | Event::Threshold0);
        assert!(n.flags().zero && n.flags().threshold0 && !n.flags().low_limit);
        assert_eq!(n.zero_mode(), ZeroMode::NegZero);
    }
}
