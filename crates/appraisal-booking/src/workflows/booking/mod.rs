//! Appraisal booking wizard: property validation, quote calculation, and the five-step
//! flow from contact details to a confirmed, paid booking.

pub mod collaborators;
pub mod dispatch;
pub mod domain;
pub mod quote;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use collaborators::{
    AdminEmailNotifier, AdminMailer, AnalyticsEvent, BookingNotification, BookingNotifier,
    BookingReceipt, CollaboratorError, ContactSubmission, EventName, EventSink,
    NurturingClient, PaymentCallback, PaymentGateway, PaymentStatus, SubmissionAck,
};
pub use dispatch::{DeliveryReport, DetachedTask, EffectDispatcher};
pub use domain::{
    Attribution, BookingDraft, BookingId, BookingStep, ConfirmationNumber, ContactDetails,
    InspectionScope, LivingUnits, PropertyDetails, Purpose, Requester, ScheduleDetails,
};
pub use quote::{calculate_quote, price_breakdown, Quote, QuoteBreakdown, QuoteInput};
pub use repository::{RepositoryError, SessionRepository};
pub use router::booking_router;
pub use service::{BookingService, BookingServiceError, Collaborators, Submission};
pub use validation::{ContactForm, PropertyDetailsForm, ScheduleForm, ValidationErrors};
pub use wizard::{BookingEffect, BookingWizard, PaymentOutcome, StepOutcome, WizardError};
