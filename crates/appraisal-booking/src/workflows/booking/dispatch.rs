use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::collaborators::{BookingNotifier, EventSink, NurturingClient};
use super::domain::BookingId;
use super::wizard::BookingEffect;

/// What became of a detached collaborator call. Only ever logged or inspected in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    Delivered,
    Rejected(String),
    Failed(String),
    Panicked,
}

/// Handle to a fire-and-forget call. Dropping it leaves the task running.
#[derive(Debug)]
pub struct DetachedTask {
    label: &'static str,
    handle: JoinHandle<DeliveryReport>,
}

impl DetachedTask {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub async fn report(self) -> DeliveryReport {
        match self.handle.await {
            Ok(report) => report,
            Err(err) if err.is_panic() => DeliveryReport::Panicked,
            Err(err) => DeliveryReport::Failed(err.to_string()),
        }
    }
}

/// Executes wizard effects without linking their results to the caller's control flow.
#[derive(Clone)]
pub struct EffectDispatcher {
    nurturing: Arc<dyn NurturingClient>,
    notifier: Arc<dyn BookingNotifier>,
    events: Arc<dyn EventSink>,
}

impl EffectDispatcher {
    pub fn new(
        nurturing: Arc<dyn NurturingClient>,
        notifier: Arc<dyn BookingNotifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            nurturing,
            notifier,
            events,
        }
    }

    /// Emit analytics inline and spawn network calls. Must run inside a tokio runtime.
    pub fn dispatch(
        &self,
        booking_id: &BookingId,
        effects: Vec<BookingEffect>,
    ) -> Vec<DetachedTask> {
        let mut tasks = Vec::new();

        for effect in effects {
            match effect {
                BookingEffect::Track(event) => {
                    let name = event.event.as_str();
                    if let Err(err) = self.events.emit(event) {
                        warn!(%booking_id, event = name, error = %err, "analytics event dropped");
                    }
                }
                BookingEffect::SendToNurturing(submission) => {
                    let client = Arc::clone(&self.nurturing);
                    let booking_id = booking_id.clone();
                    let handle = tokio::spawn(async move {
                        let report = match client.submit_contact(submission).await {
                            Ok(ack) if ack.success => DeliveryReport::Delivered,
                            Ok(ack) => DeliveryReport::Rejected(
                                ack.error.unwrap_or_else(|| "unspecified".to_string()),
                            ),
                            Err(err) => DeliveryReport::Failed(err.to_string()),
                        };
                        log_report(&booking_id, "nurturing", &report);
                        report
                    });
                    tasks.push(DetachedTask {
                        label: "nurturing",
                        handle,
                    });
                }
                BookingEffect::NotifyBooking(notification) => {
                    let notifier = Arc::clone(&self.notifier);
                    let booking_id = booking_id.clone();
                    let handle = tokio::spawn(async move {
                        let report = match notifier.submit_booking(notification).await {
                            Ok(receipt) if receipt.success => DeliveryReport::Delivered,
                            Ok(receipt) => DeliveryReport::Rejected(
                                receipt.error.unwrap_or_else(|| "unspecified".to_string()),
                            ),
                            Err(err) => DeliveryReport::Failed(err.to_string()),
                        };
                        log_report(&booking_id, "booking_notification", &report);
                        report
                    });
                    tasks.push(DetachedTask {
                        label: "booking_notification",
                        handle,
                    });
                }
            }
        }

        tasks
    }
}

fn log_report(booking_id: &BookingId, label: &'static str, report: &DeliveryReport) {
    match report {
        DeliveryReport::Delivered => debug!(%booking_id, collaborator = label, "delivered"),
        DeliveryReport::Rejected(reason) => {
            warn!(%booking_id, collaborator = label, %reason, "collaborator rejected call")
        }
        DeliveryReport::Failed(error) => {
            warn!(%booking_id, collaborator = label, %error, "collaborator call failed")
        }
        DeliveryReport::Panicked => {
            warn!(%booking_id, collaborator = label, "collaborator task panicked")
        }
    }
}
