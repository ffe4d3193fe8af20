//! Five-step booking state machine.
//!
//! Transitions are synchronous and return the collaborator calls they imply as data
//! ([`BookingEffect`]). Executing those effects is the dispatcher's job, so no network
//! result can hold back or roll back a step.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::collaborators::{
    AnalyticsEvent, BookingNotification, ContactSubmission, EventName, CONTACT_SOURCE,
};
use super::domain::{
    Attribution, BookingDraft, BookingId, BookingStep, ConfirmationNumber, ContactDetails,
};
use super::quote::{calculate_quote, Quote, QuoteInput};
use super::validation::{ContactForm, PropertyDetailsForm, ScheduleForm, ValidationErrors};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Message shown on the confirmation step regardless of how staff notification went.
pub const CONFIRMATION_MESSAGE: &str =
    "Thank you! Your appraisal is booked. Our team will reach out shortly to confirm the details.";

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{message}")]
    QuoteAdvisory { message: String },
    #[error("expected to be at step {expected} but wizard is at step {current}")]
    UnexpectedStep {
        expected: BookingStep,
        current: BookingStep,
    },
    #[error("a submission for step {0} is already in flight")]
    SubmissionInFlight(BookingStep),
    #[error("already at the first step")]
    AtFirstStep,
    #[error("booking is confirmed; no further changes are possible")]
    Terminal,
    #[error("step {0} has not been completed yet")]
    StepIncomplete(BookingStep),
    #[error("payment was not completed: {reason}")]
    PaymentFailed { reason: String },
}

/// Result reported by the payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Completed { reference: Option<String> },
    /// The provider could not be reached to confirm; proceed on the customer's word.
    AssumedCompleted { reason: String },
    Failed { reason: String },
}

/// Collaborator call implied by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingEffect {
    Track(AnalyticsEvent),
    SendToNurturing(ContactSubmission),
    NotifyBooking(BookingNotification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: BookingStep,
    pub effects: Vec<BookingEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationView {
    pub booking_id: BookingId,
    pub confirmation_number: ConfirmationNumber,
    pub message: &'static str,
}

/// Serializable snapshot handed to the rendering shell.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub booking_id: BookingId,
    pub step: BookingStep,
    pub step_number: u8,
    pub step_label: &'static str,
    pub furthest_step: u8,
    pub submission_in_flight: bool,
    pub draft: BookingDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationView>,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: BookingStep,
    furthest: BookingStep,
    in_flight: bool,
    draft: BookingDraft,
    attribution: Attribution,
    currency: String,
    started_reported: bool,
    nurtured_contact: Option<ContactDetails>,
}

impl BookingWizard {
    pub fn start(attribution: Attribution) -> Self {
        Self::with_booking_id(BookingId::generate(), attribution)
    }

    pub fn with_booking_id(booking_id: BookingId, attribution: Attribution) -> Self {
        debug!(%booking_id, "booking wizard started");
        Self {
            step: BookingStep::ContactInfo,
            furthest: BookingStep::ContactInfo,
            in_flight: false,
            draft: BookingDraft::new(booking_id),
            attribution,
            currency: DEFAULT_CURRENCY.to_string(),
            started_reported: false,
            nurtured_contact: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn booking_id(&self) -> &BookingId {
        &self.draft.booking_id
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn furthest_step(&self) -> BookingStep {
        self.furthest
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn quote(&self) -> Option<Quote> {
        self.draft
            .quote_amount
            .map(|amount| Quote::Price { amount })
    }

    pub fn contact_form(&self) -> ContactForm {
        self.draft
            .contact
            .as_ref()
            .map(ContactForm::from)
            .unwrap_or_default()
    }

    pub fn property_form(&self) -> PropertyDetailsForm {
        self.draft
            .property
            .as_ref()
            .map(PropertyDetailsForm::from)
            .unwrap_or_default()
    }

    pub fn schedule_form(&self) -> ScheduleForm {
        self.draft
            .schedule
            .as_ref()
            .map(ScheduleForm::from)
            .unwrap_or_default()
    }

    pub fn confirmation(&self) -> Option<ConfirmationView> {
        self.draft
            .confirmation_number
            .as_ref()
            .map(|number| ConfirmationView {
                booking_id: self.draft.booking_id.clone(),
                confirmation_number: number.clone(),
                message: CONFIRMATION_MESSAGE,
            })
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            booking_id: self.draft.booking_id.clone(),
            step: self.step,
            step_number: self.step.number(),
            step_label: self.step.label(),
            furthest_step: self.furthest.number(),
            submission_in_flight: self.in_flight,
            draft: self.draft.clone(),
            quote_display: self.quote().map(|quote| quote.display()),
            confirmation: self.confirmation(),
        }
    }

    fn ensure_at(&self, expected: BookingStep) -> Result<(), WizardError> {
        if self.step == BookingStep::Confirmation {
            return Err(WizardError::Terminal);
        }
        if self.in_flight {
            return Err(WizardError::SubmissionInFlight(self.step));
        }
        if self.step != expected {
            return Err(WizardError::UnexpectedStep {
                expected,
                current: self.step,
            });
        }
        Ok(())
    }

    fn move_to(&mut self, step: BookingStep) {
        self.step = step;
        if step > self.furthest {
            self.furthest = step;
        }
    }

    /// A rejected edit of step 2 invalidates the later steps for forward navigation; the
    /// stored data stays for prefill but has to be re-submitted.
    fn hold_at_property_details(&mut self) {
        if self.furthest > BookingStep::PropertyDetails {
            self.furthest = BookingStep::PropertyDetails;
        }
    }

    fn event(&self, event: EventName, step: BookingStep, value: Option<f64>) -> BookingEffect {
        BookingEffect::Track(AnalyticsEvent {
            event,
            step: step.number(),
            booking_id: self.draft.booking_id.clone(),
            conversion_value: value,
            currency: self.currency.clone(),
            attribution: self.attribution.clone(),
        })
    }

    fn completion_events(&self, step: BookingStep, value: Option<f64>) -> Vec<BookingEffect> {
        let mut effects = vec![self.event(EventName::BookingStepCompleted, step, value)];
        if let Some(specific) = EventName::completed(step) {
            effects.push(self.event(specific, step, value));
        }
        effects
    }

    /// Step 1 → 2.
    pub fn submit_contact(&mut self, form: &ContactForm) -> Result<StepOutcome, WizardError> {
        self.ensure_at(BookingStep::ContactInfo)?;
        let contact = form.validate()?;

        let mut effects = Vec::new();
        if !self.started_reported {
            effects.push(self.event(EventName::BookingStarted, BookingStep::ContactInfo, None));
            self.started_reported = true;
        }
        effects.extend(self.completion_events(BookingStep::ContactInfo, None));

        if self.nurtured_contact.as_ref() != Some(&contact) {
            effects.push(BookingEffect::SendToNurturing(ContactSubmission {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                booking_id: self.draft.booking_id.clone(),
                source: CONTACT_SOURCE.to_string(),
                step: BookingStep::ContactInfo.slug().to_string(),
                attribution_data: self.attribution.clone(),
            }));
            self.nurtured_contact = Some(contact.clone());
        }

        self.draft.contact = Some(contact);
        self.move_to(BookingStep::PropertyDetails);
        info!(booking_id = %self.draft.booking_id, "contact details captured");

        Ok(StepOutcome {
            step: self.step,
            effects,
        })
    }

    /// Step 2 → 3. Only a numeric quote lets the booking through.
    pub fn submit_property(
        &mut self,
        form: &PropertyDetailsForm,
        today: NaiveDate,
    ) -> Result<StepOutcome, WizardError> {
        self.ensure_at(BookingStep::PropertyDetails)?;
        let property = match form.validate(today) {
            Ok(property) => property,
            Err(errors) => {
                self.hold_at_property_details();
                return Err(errors.into());
            }
        };

        let amount = match calculate_quote(&QuoteInput::from(&property)) {
            Quote::Price { amount } => amount,
            Quote::Advisory { message } => {
                self.hold_at_property_details();
                info!(
                    booking_id = %self.draft.booking_id,
                    units = property.living_units.as_str(),
                    "quote requires consultation; holding at property details"
                );
                return Err(WizardError::QuoteAdvisory { message });
            }
        };

        self.draft.property = Some(property);
        self.draft.quote_amount = Some(amount);
        self.move_to(BookingStep::Schedule);
        info!(booking_id = %self.draft.booking_id, amount, "property details priced");

        Ok(StepOutcome {
            step: self.step,
            effects: self.completion_events(BookingStep::PropertyDetails, Some(amount)),
        })
    }

    /// Step 3 → 4.
    pub fn submit_schedule(&mut self, form: &ScheduleForm) -> Result<StepOutcome, WizardError> {
        self.ensure_at(BookingStep::Schedule)?;
        let schedule = form.validate()?;

        self.draft.schedule = Some(schedule);
        self.move_to(BookingStep::Payment);
        debug!(booking_id = %self.draft.booking_id, "appointment captured");

        Ok(StepOutcome {
            step: self.step,
            effects: self.completion_events(BookingStep::Schedule, self.draft.quote_amount),
        })
    }

    /// Mark the payment submission in flight; a second attempt is refused until it settles.
    pub fn begin_payment(&mut self) -> Result<(), WizardError> {
        self.ensure_at(BookingStep::Payment)?;
        self.in_flight = true;
        Ok(())
    }

    /// Release an in-flight payment without settling it.
    pub fn cancel_payment(&mut self) {
        self.in_flight = false;
    }

    /// Step 4 → 5. A reported payment failure keeps the wizard at the payment step.
    pub fn complete_payment(
        &mut self,
        outcome: PaymentOutcome,
    ) -> Result<StepOutcome, WizardError> {
        if self.step == BookingStep::Confirmation {
            return Err(WizardError::Terminal);
        }
        if self.step != BookingStep::Payment {
            return Err(WizardError::UnexpectedStep {
                expected: BookingStep::Payment,
                current: self.step,
            });
        }
        self.in_flight = false;

        match outcome {
            PaymentOutcome::Failed { reason } => {
                warn!(booking_id = %self.draft.booking_id, %reason, "payment failed");
                return Err(WizardError::PaymentFailed { reason });
            }
            PaymentOutcome::AssumedCompleted { reason } => {
                warn!(
                    booking_id = %self.draft.booking_id,
                    %reason,
                    "payment confirmation unavailable; assuming success"
                );
            }
            PaymentOutcome::Completed { reference } => {
                debug!(booking_id = %self.draft.booking_id, ?reference, "payment completed");
            }
        }

        let confirmation = ConfirmationNumber::generate();
        self.draft.confirmation_number = Some(confirmation.clone());
        self.move_to(BookingStep::Confirmation);

        let value = self.draft.quote_amount;
        let mut effects = self.completion_events(BookingStep::Payment, value);
        effects.push(self.event(EventName::BookingCompleted, BookingStep::Confirmation, value));

        match BookingNotification::from_draft(&self.draft) {
            Ok(notification) => effects.push(BookingEffect::NotifyBooking(notification)),
            Err(err) => warn!(
                booking_id = %self.draft.booking_id,
                error = %err,
                "booking notification could not be assembled"
            ),
        }

        info!(
            booking_id = %self.draft.booking_id,
            confirmation_number = %confirmation,
            "booking confirmed"
        );

        Ok(StepOutcome {
            step: self.step,
            effects,
        })
    }

    /// Return to the previous step, keeping everything entered so far.
    pub fn back(&mut self) -> Result<BookingStep, WizardError> {
        if self.step == BookingStep::Confirmation {
            return Err(WizardError::Terminal);
        }
        if self.in_flight {
            return Err(WizardError::SubmissionInFlight(self.step));
        }
        let previous = self.step.previous().ok_or(WizardError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    /// Re-confirm the stored data of the current step and move on, without re-validating,
    /// re-pricing, or contacting collaborators.
    pub fn advance(&mut self) -> Result<BookingStep, WizardError> {
        self.ensure_at(self.step)?;
        let next = match self.step.next() {
            Some(next) if self.step < self.furthest && self.draft.has_step_data(self.step) => {
                next
            }
            _ => return Err(WizardError::StepIncomplete(self.step)),
        };
        self.step = next;
        Ok(next)
    }
}
