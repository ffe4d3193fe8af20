use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use appraisal_booking::config::NotificationConfig;
use appraisal_booking::workflows::booking::{
    AdminEmailNotifier, AdminMailer, AnalyticsEvent, BookingId, BookingNotification,
    BookingService, BookingWizard, CollaboratorError, Collaborators, ContactSubmission,
    EventSink, NurturingClient, PaymentCallback, PaymentGateway, PaymentOutcome,
    RepositoryError, SessionRepository, SubmissionAck,
};
use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<BookingId, BookingWizard>>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, wizard: BookingWizard) -> Result<(), RepositoryError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        if guard.contains_key(wizard.booking_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(wizard.booking_id().clone(), wizard);
        Ok(())
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingWizard>, RepositoryError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    fn modify<T, F>(&self, id: &BookingId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut BookingWizard) -> T,
    {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        let wizard = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(apply(wizard))
    }

    fn remove(&self, id: &BookingId) -> Result<(), RepositoryError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Stand-in for the CRM webhook: logs each lead.
#[derive(Default, Clone)]
pub(crate) struct LoggingNurturingClient;

#[async_trait]
impl NurturingClient for LoggingNurturingClient {
    async fn submit_contact(
        &self,
        submission: ContactSubmission,
    ) -> Result<SubmissionAck, CollaboratorError> {
        info!(
            booking_id = %submission.booking_id,
            source = %submission.source,
            step = %submission.step,
            "lead forwarded to nurturing"
        );
        Ok(SubmissionAck {
            success: true,
            error: None,
        })
    }
}

/// Mail transport that logs messages and keeps them for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingMailer {
    sent: Arc<Mutex<Vec<(String, BookingNotification)>>>,
}

impl LoggingMailer {
    pub(crate) fn sent(&self) -> Vec<(String, BookingNotification)> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AdminMailer for LoggingMailer {
    async fn send(
        &self,
        to: &str,
        notification: &BookingNotification,
    ) -> Result<(), CollaboratorError> {
        info!(%to, service_type = %notification.service_type, "booking notification mailed");
        self.sent
            .lock()
            .map_err(|_| CollaboratorError::Transport("outbox poisoned".to_string()))?
            .push((to.to_string(), notification.clone()));
        Ok(())
    }
}

/// Analytics sink that writes each event to the trace log.
#[derive(Default, Clone)]
pub(crate) struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), CollaboratorError> {
        info!(
            event = event.event.as_str(),
            step = event.step,
            booking_id = %event.booking_id,
            value = ?event.conversion_value,
            currency = %event.currency,
            "analytics event"
        );
        Ok(())
    }
}

/// Accepts the payment step's callback at face value.
#[derive(Default, Clone)]
pub(crate) struct CallbackPaymentGateway;

#[async_trait]
impl PaymentGateway for CallbackPaymentGateway {
    async fn confirm(
        &self,
        _booking_id: &BookingId,
        callback: &PaymentCallback,
    ) -> Result<PaymentOutcome, CollaboratorError> {
        Ok(callback.outcome())
    }
}

pub(crate) fn booking_service(
    config: &NotificationConfig,
    mailer: Arc<LoggingMailer>,
) -> BookingService<InMemorySessionRepository> {
    let collaborators = Collaborators {
        nurturing: Arc::new(LoggingNurturingClient),
        notifier: Arc::new(AdminEmailNotifier::new(mailer, config.clone())),
        payments: Arc::new(CallbackPaymentGateway),
        events: Arc::new(TracingEventSink),
    };
    BookingService::new(
        Arc::new(InMemorySessionRepository::default()),
        collaborators,
        config,
    )
}
