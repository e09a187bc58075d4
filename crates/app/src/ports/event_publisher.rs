//! Event publisher port — hands domain events to the background engines.

use std::sync::Arc;

use taskhook_domain::event::DomainEvent;

/// Accepts domain events after a mutation succeeded.
///
/// Publishing never blocks and never fails the caller; implementations
/// that cannot accept an event log and drop it.
pub trait EventPublisher {
    fn publish(&self, event: DomainEvent);
}

impl<T: EventPublisher + Send + Sync> EventPublisher for Arc<T> {
    fn publish(&self, event: DomainEvent) {
        (**self).publish(event);
    }
}
