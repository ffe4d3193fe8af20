use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::NotificationConfig;
use crate::workflows::booking::collaborators::{
    AnalyticsEvent, BookingNotification, BookingNotifier, BookingReceipt, CollaboratorError,
    ContactSubmission, EventSink, NurturingClient, PaymentCallback, PaymentGateway,
    SubmissionAck,
};
use crate::workflows::booking::domain::BookingId;
use crate::workflows::booking::repository::{RepositoryError, SessionRepository};
use crate::workflows::booking::service::{BookingService, Collaborators};
use crate::workflows::booking::validation::{ContactForm, PropertyDetailsForm, ScheduleForm};
use crate::workflows::booking::wizard::{BookingWizard, PaymentOutcome};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date")
}

pub(super) fn contact_form() -> ContactForm {
    ContactForm {
        name: "Jordan Avery".to_string(),
        email: "jordan.avery@example.com".to_string(),
        phone: "(515) 555-0142".to_string(),
    }
}

pub(super) fn property_form() -> PropertyDetailsForm {
    PropertyDetailsForm {
        address: "1420 Grand Avenue, Des Moines IA 50309".to_string(),
        zip_code: None,
        date_needed: "2025-10-15".to_string(),
        purpose: "refinance".to_string(),
        requester: "owner".to_string(),
        size_of_home: "2000".to_string(),
        size_of_lot: Some("0.25".to_string()),
        is_lot_over_one_acre: false,
        has_site_influence: false,
        number_of_living_units: "1".to_string(),
        scope_of_inspection: "interior".to_string(),
    }
}

pub(super) fn schedule_form() -> ScheduleForm {
    ScheduleForm {
        appointment_date: "2025-10-08".to_string(),
        appointment_time: "10:30 AM".to_string(),
    }
}

pub(super) fn succeeded() -> PaymentCallback {
    PaymentCallback {
        status: crate::workflows::booking::collaborators::PaymentStatus::Succeeded,
        reference: Some("pi_12345".to_string()),
        failure_reason: None,
    }
}

/// Wizard advanced to the payment step with the fixtures above.
pub(super) fn wizard_at_payment() -> BookingWizard {
    let mut wizard = BookingWizard::start(Default::default());
    wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");
    wizard
        .submit_property(&property_form(), today())
        .expect("property accepted");
    wizard
        .submit_schedule(&schedule_form())
        .expect("schedule accepted");
    wizard
}

/// How a fake collaborator answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Behavior {
    Succeed,
    Reject,
    Fail,
    Panic,
}

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    pub(super) sessions: Arc<Mutex<HashMap<BookingId, BookingWizard>>>,
}

impl SessionRepository for MemorySessions {
    fn insert(&self, wizard: BookingWizard) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(wizard.booking_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(wizard.booking_id().clone(), wizard);
        Ok(())
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<BookingWizard>, RepositoryError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn modify<T, F>(&self, id: &BookingId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut BookingWizard) -> T,
    {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        let wizard = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(apply(wizard))
    }

    fn remove(&self, id: &BookingId) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct RecordingNurturing {
    pub(super) behavior: Behavior,
    calls: Mutex<Vec<ContactSubmission>>,
}

impl RecordingNurturing {
    pub(super) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<ContactSubmission> {
        self.calls.lock().expect("nurturing mutex poisoned").clone()
    }
}

#[async_trait]
impl NurturingClient for RecordingNurturing {
    async fn submit_contact(
        &self,
        submission: ContactSubmission,
    ) -> Result<SubmissionAck, CollaboratorError> {
        self.calls
            .lock()
            .expect("nurturing mutex poisoned")
            .push(submission);
        match self.behavior {
            Behavior::Succeed => Ok(SubmissionAck {
                success: true,
                error: None,
            }),
            Behavior::Reject => Ok(SubmissionAck {
                success: false,
                error: Some("duplicate lead".to_string()),
            }),
            Behavior::Fail => Err(CollaboratorError::Transport("webhook timed out".to_string())),
            Behavior::Panic => panic!("nurturing client blew up"),
        }
    }
}

pub(super) struct RecordingNotifier {
    pub(super) behavior: Behavior,
    calls: Mutex<Vec<BookingNotification>>,
}

impl RecordingNotifier {
    pub(super) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<BookingNotification> {
        self.calls.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn submit_booking(
        &self,
        notification: BookingNotification,
    ) -> Result<BookingReceipt, CollaboratorError> {
        self.calls
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        match self.behavior {
            Behavior::Succeed => Ok(BookingReceipt {
                success: true,
                booking_id: Some("crm-881".to_string()),
                error: None,
            }),
            Behavior::Reject => Ok(BookingReceipt {
                success: false,
                booking_id: None,
                error: Some("mailbox full".to_string()),
            }),
            Behavior::Fail => Err(CollaboratorError::Transport("smtp refused".to_string())),
            Behavior::Panic => panic!("notifier blew up"),
        }
    }
}

#[derive(Default)]
pub(super) struct RecordingEvents {
    events: Mutex<Vec<AnalyticsEvent>>,
    pub(super) failing: bool,
}

impl RecordingEvents {
    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(super) fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .iter()
            .map(|event| event.event.as_str())
            .collect()
    }

    pub(super) fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), CollaboratorError> {
        self.events.lock().expect("event mutex poisoned").push(event);
        if self.failing {
            Err(CollaboratorError::Transport("beacon blocked".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Gateway answering from a script, falling back to the callback itself.
pub(super) struct ScriptedPayments {
    pub(super) answer: Option<Result<PaymentOutcome, CollaboratorError>>,
}

#[async_trait]
impl PaymentGateway for ScriptedPayments {
    async fn confirm(
        &self,
        _booking_id: &BookingId,
        callback: &PaymentCallback,
    ) -> Result<PaymentOutcome, CollaboratorError> {
        match &self.answer {
            Some(answer) => answer.clone(),
            None => Ok(callback.outcome()),
        }
    }
}

pub(super) struct Harness {
    pub(super) service: BookingService<MemorySessions>,
    pub(super) sessions: Arc<MemorySessions>,
    pub(super) nurturing: Arc<RecordingNurturing>,
    pub(super) notifier: Arc<RecordingNotifier>,
    pub(super) events: Arc<RecordingEvents>,
}

pub(super) fn harness(
    nurturing: Behavior,
    notifier: Behavior,
    payments: Option<Result<PaymentOutcome, CollaboratorError>>,
) -> Harness {
    let sessions = Arc::new(MemorySessions::default());
    let nurturing = Arc::new(RecordingNurturing::new(nurturing));
    let notifier = Arc::new(RecordingNotifier::new(notifier));
    let events = Arc::new(RecordingEvents::default());
    let collaborators = Collaborators {
        nurturing: nurturing.clone(),
        notifier: notifier.clone(),
        payments: Arc::new(ScriptedPayments { answer: payments }),
        events: events.clone(),
    };
    let service = BookingService::new(
        sessions.clone(),
        collaborators,
        &NotificationConfig::default(),
    );
    Harness {
        service,
        sessions,
        nurturing,
        notifier,
        events,
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
