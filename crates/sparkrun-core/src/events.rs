use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

struct BusInner<E> {
    next_id: Cell<u64>,
    /// Ids of every live subscription, kept apart from `listeners` so it can be
    /// read while a dispatch holds the listener list.
    live: RefCell<Vec<SubscriptionId>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
    /// Subscriptions made while a dispatch was running.
    incoming: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
    /// Unsubscriptions made while a dispatch was running.
    removed: RefCell<Vec<SubscriptionId>>,
    pending: RefCell<VecDeque<E>>,
}

/// Single-threaded publish/subscribe channel owned by a game session.
///
/// Cloning the bus yields another handle to the same channel. Events published
/// from inside a listener are queued and delivered, in order, once the current
/// dispatch finishes; every listener in one dispatch sees the same event.
pub struct EventBus<E> {
    inner: Rc<BusInner<E>>,
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner {
                next_id: Cell::new(1),
                live: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                incoming: RefCell::new(Vec::new()),
                removed: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// Register a listener. It receives every event published afterwards.
    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.live.borrow_mut().push(id);

        let entry: (SubscriptionId, Listener<E>) = (id, Box::new(listener));
        match self.inner.listeners.try_borrow_mut() {
            Ok(mut listeners) => listeners.push(entry),
            Err(_) => self.inner.incoming.borrow_mut().push(entry),
        }
        id
    }

    /// Remove a listener. Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        {
            let mut live = self.inner.live.borrow_mut();
            let Some(pos) = live.iter().position(|&l| l == id) else {
                return false;
            };
            live.swap_remove(pos);
        }

        self.inner.incoming.borrow_mut().retain(|(l, _)| *l != id);
        match self.inner.listeners.try_borrow_mut() {
            Ok(mut listeners) => listeners.retain(|(l, _)| *l != id),
            Err(_) => self.inner.removed.borrow_mut().push(id),
        }
        true
    }

    /// Deliver `event` to every listener.
    pub fn publish(&self, event: E) {
        self.inner.pending.borrow_mut().push_back(event);

        // Re-entrant publish: the dispatch loop further up the stack delivers it.
        let Ok(mut listeners) = self.inner.listeners.try_borrow_mut() else {
            tracing::trace!(
                pending = self.inner.pending.borrow().len(),
                "Queued event published during dispatch"
            );
            return;
        };

        loop {
            listeners.append(&mut self.inner.incoming.borrow_mut());
            let removed: Vec<SubscriptionId> = self.inner.removed.borrow_mut().drain(..).collect();
            if !removed.is_empty() {
                listeners.retain(|(id, _)| !removed.contains(id));
            }

            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };

            for (id, listener) in listeners.iter_mut() {
                if self.inner.removed.borrow().contains(id) {
                    continue;
                }
                listener(&event);
            }
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.live.borrow().len()
    }

    /// Subscribe a buffering queue that collects cloned events until drained.
    pub fn queue(&self) -> EventQueue<E>
    where
        E: Clone,
    {
        let buffer = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&buffer);
        let id = self.subscribe(move |event: &E| sink.borrow_mut().push_back(event.clone()));
        EventQueue {
            bus: self.clone(),
            buffer,
            id: Some(id),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.inner.live.borrow().len())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

/// A subscriber that buffers events for later, pull-side processing.
///
/// Dropping the queue (or calling [`EventQueue::detach`]) unsubscribes it.
pub struct EventQueue<E: 'static> {
    bus: EventBus<E>,
    buffer: Rc<RefCell<VecDeque<E>>>,
    id: Option<SubscriptionId>,
}

impl<E: 'static> EventQueue<E> {
    /// Take every buffered event in arrival order.
    pub fn drain(&self) -> Vec<E> {
        self.buffer.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.borrow().is_empty()
    }

    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Stop receiving events. Already-buffered events stay drainable.
    pub fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl<E: 'static> Drop for EventQueue<E> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<E: 'static> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("buffered", &self.buffer.borrow().len())
            .field("attached", &self.id.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listener_sees_the_event() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |e: &u32| seen.borrow_mut().push((tag, *e)));
        }
        bus.publish(7);
        assert_eq!(seen.borrow().len(), 3);
        assert!(seen.borrow().iter().all(|(_, e)| *e == 7));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: EventBus<u32> = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| c.set(c.get() + 1));
        bus.publish(1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(2);
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn reentrant_publish_is_delivered_after_current_event() {
        let bus: EventBus<u32> = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let o = Rc::clone(&order);
        bus.subscribe(move |e: &u32| {
            o.borrow_mut().push(*e);
            if *e == 1 {
                inner_bus.publish(2);
            }
        });
        let o = Rc::clone(&order);
        bus.subscribe(move |e: &u32| o.borrow_mut().push(*e + 100));

        bus.publish(1);
        assert_eq!(*order.borrow(), vec![1, 101, 2, 102]);
    }

    #[test]
    fn subscribe_during_dispatch_applies_to_next_event() {
        let bus: EventBus<u32> = EventBus::new();
        let late_hits = Rc::new(Cell::new(0));

        let handle = bus.clone();
        let hits = Rc::clone(&late_hits);
        let armed = Cell::new(false);
        bus.subscribe(move |_| {
            if !armed.replace(true) {
                let hits = Rc::clone(&hits);
                handle.subscribe(move |_| hits.set(hits.get() + 1));
            }
        });

        bus.publish(1);
        assert_eq!(late_hits.get(), 0);
        bus.publish(2);
        assert_eq!(late_hits.get(), 1);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn unsubscribe_during_dispatch_skips_remaining_delivery() {
        let bus: EventBus<u32> = EventBus::new();
        let victim_hits = Rc::new(Cell::new(0));

        let victim_id = Rc::new(Cell::new(None));
        let handle = bus.clone();
        let vid = Rc::clone(&victim_id);
        bus.subscribe(move |_| {
            if let Some(id) = vid.get() {
                handle.unsubscribe(id);
            }
        });
        let hits = Rc::clone(&victim_hits);
        victim_id.set(Some(bus.subscribe(move |_| hits.set(hits.get() + 1))));

        bus.publish(1);
        bus.publish(2);
        assert_eq!(victim_hits.get(), 0);
    }

    #[test]
    fn queue_buffers_until_drained() {
        let bus: EventBus<&'static str> = EventBus::new();
        let queue = bus.queue();
        bus.publish("added");
        bus.publish("removed");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(), vec!["added", "removed"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn dropping_queue_unsubscribes() {
        let bus: EventBus<u8> = EventBus::new();
        {
            let _queue = bus.queue();
            assert_eq!(bus.listener_count(), 1);
        }
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn detached_queue_keeps_buffered_events() {
        let bus: EventBus<u8> = EventBus::new();
        let mut queue = bus.queue();
        bus.publish(1);
        queue.detach();
        bus.publish(2);
        assert!(!queue.is_attached());
        assert_eq!(queue.drain(), vec![1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn queue_preserves_publish_order(
                events in proptest::collection::vec(any::<u16>(), 0..64)
            ) {
                let bus: EventBus<u16> = EventBus::new();
                let queue = bus.queue();
                for e in &events {
                    bus.publish(*e);
                }
                prop_assert_eq!(queue.drain(), events);
            }

            #[test]
            fn reentrant_publishes_arrive_after_their_trigger(
                seeds in proptest::collection::vec(0u16..1000, 1..16)
            ) {
                let bus: EventBus<u16> = EventBus::new();
                let queue = bus.queue();
                let echo = bus.clone();
                bus.subscribe(move |e| {
                    if *e < 1000 {
                        echo.publish(*e + 1000);
                    }
                });
                for s in &seeds {
                    bus.publish(*s);
                }
                let seen = queue.drain();
                let expected: Vec<u16> = seeds.iter().flat_map(|s| [*s, *s + 1000]).collect();
                prop_assert_eq!(seen, expected);
            }
        }
    }
}
