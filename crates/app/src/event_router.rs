//! In-process event router backed by a bounded tokio [`mpsc`] channel.
//!
//! Request handlers publish through an [`EventEmitter`], which never blocks.
//! A single worker receives the events and hands each one to the automation
//! engine and the webhook dispatcher as two independent tasks.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use taskhook_domain::event::DomainEvent;

use crate::automation_engine::AutomationEngine;
use crate::ports::{
    AutomationRepository, EventPublisher, HttpTransport, IntegrationRepository, TaskRepository,
    WebhookRepository,
};
use crate::webhook_dispatcher::WebhookDispatcher;

/// Something that consumes domain events in the background.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: &DomainEvent) -> impl Future<Output = ()> + Send;
}

impl<AR, TR, IR, H> EventHandler for AutomationEngine<AR, TR, IR, H>
where
    AR: AutomationRepository + Send + Sync + 'static,
    TR: TaskRepository + Send + Sync + 'static,
    IR: IntegrationRepository + Send + Sync + 'static,
    H: HttpTransport + Send + Sync + 'static,
{
    fn handle(&self, event: &DomainEvent) -> impl Future<Output = ()> + Send {
        self.process(event)
    }
}

impl<WR, H> EventHandler for WebhookDispatcher<WR, H>
where
    WR: WebhookRepository + Send + Sync + 'static,
    H: HttpTransport + Send + Sync + 'static,
{
    fn handle(&self, event: &DomainEvent) -> impl Future<Output = ()> + Send {
        self.dispatch(event.name, event.snapshot.to_value())
    }
}

/// Create the emitter/receiver pair. A capacity of 0 is raised to 1.
#[must_use]
pub fn channel(capacity: usize) -> (EventEmitter, EventReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (EventEmitter { sender }, EventReceiver { receiver })
}

/// Cheap, cloneable publishing half of the event channel.
#[derive(Clone)]
pub struct EventEmitter {
    sender: mpsc::Sender<DomainEvent>,
}

impl EventPublisher for EventEmitter {
    fn publish(&self, event: DomainEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = %event.name, "event queue full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(event = %event.name, "event router stopped, dropping event");
            }
        }
    }
}

/// Receiving half, consumed by [`EventRouter::spawn`].
pub struct EventReceiver {
    receiver: mpsc::Receiver<DomainEvent>,
}

/// Routes every event to the automation engine and the webhook dispatcher.
pub struct EventRouter<A, W> {
    automations: Arc<A>,
    webhooks: Arc<W>,
}

impl<A: EventHandler, W: EventHandler> EventRouter<A, W> {
    pub fn new(automations: Arc<A>, webhooks: Arc<W>) -> Self {
        Self {
            automations,
            webhooks,
        }
    }

    /// Run the worker loop on the current runtime.
    ///
    /// The loop ends once every [`EventEmitter`] is dropped and the queue is
    /// drained; the handle resolves after in-flight handlers have finished.
    pub fn spawn(self, receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }

    async fn run(self, mut receiver: EventReceiver) {
        let mut in_flight = JoinSet::new();
        while let Some(event) = receiver.receiver.recv().await {
            while let Some(result) = in_flight.try_join_next() {
                report(result);
            }
            tracing::debug!(event = %event.name, "routing event");
            let event = Arc::new(event);

            let automations = Arc::clone(&self.automations);
            let for_automations = Arc::clone(&event);
            in_flight.spawn(async move { automations.handle(&for_automations).await });

            let webhooks = Arc::clone(&self.webhooks);
            in_flight.spawn(async move { webhooks.handle(&event).await });
        }
        while let Some(result) = in_flight.join_next().await {
            report(result);
        }
        tracing::info!("event router stopped");
    }
}

fn report(result: Result<(), JoinError>) {
    if let Err(err) = result {
        tracing::error!(error = %err, "event handler task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use taskhook_domain::event::EventName;
    use taskhook_domain::snapshot::Snapshot;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventName>>,
    }

    impl EventHandler for Recorder {
        fn handle(&self, event: &DomainEvent) -> impl Future<Output = ()> + Send {
            self.seen.lock().unwrap().push(event.name);
            async {}
        }
    }

    struct Panicking;

    impl EventHandler for Panicking {
        fn handle(&self, _event: &DomainEvent) -> impl Future<Output = ()> + Send {
            async { panic!("handler blew up") }
        }
    }

    fn event(name: EventName) -> DomainEvent {
        DomainEvent::new(name, Snapshot::new().with("id", "t1"), None)
    }

    #[tokio::test]
    async fn should_deliver_each_event_to_both_handlers() {
        let automations = Arc::new(Recorder::default());
        let webhooks = Arc::new(Recorder::default());
        let (emitter, receiver) = channel(8);
        let handle =
            EventRouter::new(Arc::clone(&automations), Arc::clone(&webhooks)).spawn(receiver);

        emitter.publish(event(EventName::TaskCreated));
        emitter.publish(event(EventName::TaskCompleted));
        drop(emitter);
        handle.await.unwrap();

        let expected = vec![EventName::TaskCreated, EventName::TaskCompleted];
        for recorder in [&automations, &webhooks] {
            let mut seen = recorder.seen.lock().unwrap().clone();
            seen.sort();
            assert_eq!(seen, expected);
        }
    }

    #[tokio::test]
    async fn should_keep_routing_when_a_handler_panics() {
        let webhooks = Arc::new(Recorder::default());
        let (emitter, receiver) = channel(8);
        let handle = EventRouter::new(Arc::new(Panicking), Arc::clone(&webhooks)).spawn(receiver);

        emitter.publish(event(EventName::TaskCreated));
        emitter.publish(event(EventName::TaskUpdated));
        drop(emitter);
        handle.await.unwrap();

        assert_eq!(webhooks.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_drop_events_when_queue_is_full() {
        let (emitter, mut receiver) = channel(1);

        emitter.publish(event(EventName::TaskCreated));
        emitter.publish(event(EventName::TaskUpdated));
        drop(emitter);

        let first = receiver.receiver.recv().await.unwrap();
        assert_eq!(first.name, EventName::TaskCreated);
        assert!(receiver.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn should_not_fail_publisher_after_router_stopped() {
        let (emitter, receiver) = channel(4);
        drop(receiver);

        emitter.publish(event(EventName::TaskCreated));
    }
}
