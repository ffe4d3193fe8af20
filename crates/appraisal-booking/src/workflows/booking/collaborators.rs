//! Outbound ports consumed by the booking wizard and the payloads it hands them.
//!
//! None of these calls gate a wizard transition. Implementations live with the host
//! application (HTTP clients, mail relays, tag managers); the wizard only builds payloads.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Attribution, BookingDraft, BookingId, BookingStep};
use super::quote::format_currency;
use super::wizard::PaymentOutcome;
use crate::config::NotificationConfig;

pub const CONTACT_SOURCE: &str = "booking_wizard";

/// Failure reported by any outbound collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator transport unavailable: {0}")]
    Transport(String),
    #[error("collaborator rejected request: {0}")]
    Rejected(String),
}

/// Payload for the contact/nurturing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub booking_id: BookingId,
    pub source: String,
    pub step: String,
    pub attribution_data: Attribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload for the staff booking notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotification {
    pub service_type: String,
    pub preferred_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub address: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("booking draft is missing {0} details")]
    MissingSection(&'static str),
}

impl BookingNotification {
    /// Assemble the staff notification from a finalised draft.
    pub fn from_draft(draft: &BookingDraft) -> Result<Self, NotificationError> {
        let contact = draft
            .contact
            .as_ref()
            .ok_or(NotificationError::MissingSection("contact"))?;
        let property = draft
            .property
            .as_ref()
            .ok_or(NotificationError::MissingSection("property"))?;
        let schedule = draft
            .schedule
            .as_ref()
            .ok_or(NotificationError::MissingSection("schedule"))?;
        let confirmation = draft
            .confirmation_number
            .as_ref()
            .ok_or(NotificationError::MissingSection("confirmation"))?;
        let amount = draft
            .quote_amount
            .ok_or(NotificationError::MissingSection("quote"))?;

        let mut notes = String::new();
        let _ = writeln!(notes, "Confirmation Number: {confirmation}");
        let _ = writeln!(notes, "Appointment Time: {}", schedule.appointment_time);
        let _ = writeln!(notes, "Property Size: {} sq ft", property.size_of_home);
        let _ = writeln!(notes, "Number of Units: {}", property.living_units.as_str());
        let _ = writeln!(notes, "Scope of Inspection: {}", property.scope.label());
        let _ = writeln!(notes, "Purpose: {}", property.purpose.label());
        let _ = writeln!(notes, "Requester: {}", property.requester.label());
        let _ = writeln!(
            notes,
            "Date Needed: {}",
            property.date_needed.format("%Y-%m-%d")
        );
        let _ = write!(notes, "Amount Paid: {}", format_currency(amount));

        Ok(Self {
            service_type: format!("Residential Appraisal ({})", property.scope.label()),
            preferred_date: schedule.appointment_date.clone(),
            zip: resolve_zip(property.zip_code.as_deref(), &property.address),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            name: contact.name.clone(),
            address: property.address.clone(),
            notes,
        })
    }
}

fn embedded_zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[0-9]{5}(?:-[0-9]{4})?\b").expect("zip pattern compiles"))
}

/// Prefer the structured zip field; otherwise take the last zip-shaped token in the
/// free-text address. The fallback is a heuristic and yields `None` rather than guessing.
pub fn resolve_zip(structured: Option<&str>, address: &str) -> Option<String> {
    if let Some(zip) = structured.map(str::trim).filter(|zip| !zip.is_empty()) {
        return Some(zip.to_string());
    }

    embedded_zip_pattern()
        .find_iter(address)
        .last()
        .map(|found| found.as_str().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    BookingStarted,
    BookingStepCompleted,
    BookingCompleted,
    ContactInfoCompleted,
    PropertyDetailsCompleted,
    ScheduleCompleted,
    PaymentCompleted,
}

impl EventName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingStarted => "booking_started",
            Self::BookingStepCompleted => "booking_step_completed",
            Self::BookingCompleted => "booking_completed",
            Self::ContactInfoCompleted => "booking_contact_info_completed",
            Self::PropertyDetailsCompleted => "booking_property_details_completed",
            Self::ScheduleCompleted => "booking_schedule_completed",
            Self::PaymentCompleted => "booking_payment_completed",
        }
    }

    /// Step-specific variant emitted alongside `booking_step_completed`.
    pub const fn completed(step: BookingStep) -> Option<Self> {
        match step {
            BookingStep::ContactInfo => Some(Self::ContactInfoCompleted),
            BookingStep::PropertyDetails => Some(Self::PropertyDetailsCompleted),
            BookingStep::Schedule => Some(Self::ScheduleCompleted),
            BookingStep::Payment => Some(Self::PaymentCompleted),
            BookingStep::Confirmation => None,
        }
    }
}

/// Analytics event carried to the host's tag manager or beacon endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: EventName,
    pub step: u8,
    pub booking_id: BookingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_value: Option<f64>,
    pub currency: String,
    #[serde(flatten)]
    pub attribution: BTreeMap<String, String>,
}

#[async_trait]
pub trait NurturingClient: Send + Sync {
    async fn submit_contact(
        &self,
        submission: ContactSubmission,
    ) -> Result<SubmissionAck, CollaboratorError>;
}

#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn submit_booking(
        &self,
        notification: BookingNotification,
    ) -> Result<BookingReceipt, CollaboratorError>;
}

/// Injected "emit event" capability; the concrete sink belongs to the host.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

/// Completion callback forwarded from the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub status: PaymentStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl PaymentCallback {
    /// Take the callback at face value.
    pub fn outcome(&self) -> PaymentOutcome {
        match self.status {
            PaymentStatus::Succeeded => PaymentOutcome::Completed {
                reference: self.reference.clone(),
            },
            PaymentStatus::Failed => PaymentOutcome::Failed {
                reason: self
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "payment declined".to_string()),
            },
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn confirm(
        &self,
        booking_id: &BookingId,
        callback: &PaymentCallback,
    ) -> Result<PaymentOutcome, CollaboratorError>;
}

/// Mail transport used by [`AdminEmailNotifier`].
#[async_trait]
pub trait AdminMailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        notification: &BookingNotification,
    ) -> Result<(), CollaboratorError>;
}

/// Booking notifier that mails staff, retrying once on a distinct fallback address.
pub struct AdminEmailNotifier<M> {
    mailer: Arc<M>,
    config: NotificationConfig,
}

impl<M> AdminEmailNotifier<M>
where
    M: AdminMailer + 'static,
{
    pub fn new(mailer: Arc<M>, config: NotificationConfig) -> Self {
        Self { mailer, config }
    }
}

#[async_trait]
impl<M> BookingNotifier for AdminEmailNotifier<M>
where
    M: AdminMailer + 'static,
{
    async fn submit_booking(
        &self,
        notification: BookingNotification,
    ) -> Result<BookingReceipt, CollaboratorError> {
        let primary = self.config.admin_email.as_str();
        let primary_error = match self.mailer.send(primary, &notification).await {
            Ok(()) => {
                return Ok(BookingReceipt {
                    success: true,
                    booking_id: None,
                    error: None,
                })
            }
            Err(err) => err,
        };

        let Some(fallback) = self.config.distinct_fallback() else {
            return Err(primary_error);
        };

        warn!(
            error = %primary_error,
            fallback,
            "primary admin notification failed; retrying fallback address"
        );
        self.mailer.send(fallback, &notification).await?;
        Ok(BookingReceipt {
            success: true,
            booking_id: None,
            error: Some(primary_error.to_string()),
        })
    }
}
