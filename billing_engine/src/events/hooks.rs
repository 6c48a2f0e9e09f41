use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    PayoutCreatedEvent,
    PayoutStatusChangedEvent,
    ReportAcceptedEvent,
    ReportDisputedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The publishing side of the configured hooks. Cloned into every API that emits events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub report_disputed_producer: Vec<EventProducer<ReportDisputedEvent>>,
    pub report_accepted_producer: Vec<EventProducer<ReportAcceptedEvent>>,
    pub payout_created_producer: Vec<EventProducer<PayoutCreatedEvent>>,
    pub payout_status_producer: Vec<EventProducer<PayoutStatusChangedEvent>>,
}

impl EventProducers {
    pub async fn report_disputed(&self, event: ReportDisputedEvent) {
        for producer in &self.report_disputed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn report_accepted(&self, event: ReportAcceptedEvent) {
        for producer in &self.report_accepted_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn payout_created(&self, event: PayoutCreatedEvent) {
        for producer in &self.payout_created_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn payout_status_changed(&self, event: PayoutStatusChangedEvent) {
        for producer in &self.payout_status_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_report_disputed: Option<EventHandler<ReportDisputedEvent>>,
    pub on_report_accepted: Option<EventHandler<ReportAcceptedEvent>>,
    pub on_payout_created: Option<EventHandler<PayoutCreatedEvent>>,
    pub on_payout_status_changed: Option<EventHandler<PayoutStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_report_disputed: hooks.on_report_disputed.map(|f| EventHandler::new(buffer_size, f)),
            on_report_accepted: hooks.on_report_accepted.map(|f| EventHandler::new(buffer_size, f)),
            on_payout_created: hooks.on_payout_created.map(|f| EventHandler::new(buffer_size, f)),
            on_payout_status_changed: hooks.on_payout_status_changed.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_report_disputed {
            result.report_disputed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_report_accepted {
            result.report_accepted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payout_created {
            result.payout_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payout_status_changed {
            result.payout_status_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns one task per configured hook. Each task ends once all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_report_disputed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_report_accepted {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payout_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payout_status_changed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_report_disputed: Option<Handler<ReportDisputedEvent>>,
    pub on_report_accepted: Option<Handler<ReportAcceptedEvent>>,
    pub on_payout_created: Option<Handler<PayoutCreatedEvent>>,
    pub on_payout_status_changed: Option<Handler<PayoutStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_report_disputed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReportDisputedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_report_disputed = Some(Arc::new(f));
        self
    }

    pub fn on_report_accepted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReportAcceptedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_report_accepted = Some(Arc::new(f));
        self
    }

    pub fn on_payout_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payout_created = Some(Arc::new(f));
        self
    }

    pub fn on_payout_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payout_status_changed = Some(Arc::new(f));
        self
    }
}
