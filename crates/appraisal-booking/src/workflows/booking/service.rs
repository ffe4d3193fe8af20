use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use super::collaborators::{
    BookingNotifier, EventSink, NurturingClient, PaymentCallback, PaymentGateway, PaymentStatus,
};
use super::dispatch::{DetachedTask, EffectDispatcher};
use super::domain::{Attribution, BookingId, BookingStep};
use super::repository::{RepositoryError, SessionRepository};
use super::validation::{ContactForm, PropertyDetailsForm, ScheduleForm};
use super::wizard::{BookingWizard, PaymentOutcome, StepOutcome, WizardError, WizardView};
use crate::config::NotificationConfig;

/// Outbound ports the service needs.
#[derive(Clone)]
pub struct Collaborators {
    pub nurturing: Arc<dyn NurturingClient>,
    pub notifier: Arc<dyn BookingNotifier>,
    pub payments: Arc<dyn PaymentGateway>,
    pub events: Arc<dyn EventSink>,
}

/// Snapshot after a successful submission plus the detached calls it started.
#[derive(Debug)]
pub struct Submission {
    pub view: WizardView,
    pub tasks: Vec<DetachedTask>,
}

/// Service composing the session repository, the wizard, and its collaborators.
pub struct BookingService<R> {
    repository: Arc<R>,
    payments: Arc<dyn PaymentGateway>,
    dispatcher: EffectDispatcher,
    currency: String,
}

impl<R> BookingService<R>
where
    R: SessionRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        collaborators: Collaborators,
        config: &NotificationConfig,
    ) -> Self {
        let dispatcher = EffectDispatcher::new(
            collaborators.nurturing,
            collaborators.notifier,
            collaborators.events,
        );

        Self {
            repository,
            payments: collaborators.payments,
            dispatcher,
            currency: config.currency.clone(),
        }
    }

    /// Open a new wizard session.
    pub fn start(&self, attribution: Attribution) -> Result<WizardView, BookingServiceError> {
        let wizard = BookingWizard::start(attribution).with_currency(self.currency.clone());
        let view = wizard.view();
        self.repository.insert(wizard)?;
        Ok(view)
    }

    pub fn get(&self, booking_id: &BookingId) -> Result<WizardView, BookingServiceError> {
        let wizard = self
            .repository
            .fetch(booking_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(wizard.view())
    }

    pub fn abandon(&self, booking_id: &BookingId) -> Result<(), BookingServiceError> {
        self.repository.remove(booking_id)?;
        Ok(())
    }

    pub fn submit_contact(
        &self,
        booking_id: &BookingId,
        form: ContactForm,
    ) -> Result<Submission, BookingServiceError> {
        self.transition(booking_id, |wizard| wizard.submit_contact(&form))
    }

    pub fn submit_property(
        &self,
        booking_id: &BookingId,
        form: PropertyDetailsForm,
        today: NaiveDate,
    ) -> Result<Submission, BookingServiceError> {
        self.transition(booking_id, |wizard| wizard.submit_property(&form, today))
    }

    pub fn submit_schedule(
        &self,
        booking_id: &BookingId,
        form: ScheduleForm,
    ) -> Result<Submission, BookingServiceError> {
        self.transition(booking_id, |wizard| wizard.submit_schedule(&form))
    }

    pub fn back(&self, booking_id: &BookingId) -> Result<WizardView, BookingServiceError> {
        self.navigate(booking_id, BookingWizard::back)
    }

    pub fn advance(&self, booking_id: &BookingId) -> Result<WizardView, BookingServiceError> {
        self.navigate(booking_id, BookingWizard::advance)
    }

    /// Settle the payment step. The session is marked busy while the gateway is consulted,
    /// so duplicate callbacks are refused instead of producing a second confirmation.
    pub async fn complete_payment(
        &self,
        booking_id: &BookingId,
        callback: PaymentCallback,
    ) -> Result<Submission, BookingServiceError> {
        self.repository
            .modify(booking_id, BookingWizard::begin_payment)??;
        let mut guard = InFlightPayment {
            repository: Arc::clone(&self.repository),
            booking_id: booking_id.clone(),
            armed: true,
        };

        let outcome = match self.payments.confirm(booking_id, &callback).await {
            Ok(outcome) => outcome,
            // Only a success signal from the payment step may be taken on trust.
            Err(err) if callback.status == PaymentStatus::Succeeded => {
                warn!(%booking_id, error = %err, "payment gateway unreachable; assuming success");
                PaymentOutcome::AssumedCompleted {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                warn!(
                    %booking_id,
                    error = %err,
                    "payment gateway unreachable; callback reported failure"
                );
                callback.outcome()
            }
        };

        guard.armed = false;
        self.transition(booking_id, move |wizard| wizard.complete_payment(outcome))
    }

    fn transition<F>(
        &self,
        booking_id: &BookingId,
        apply: F,
    ) -> Result<Submission, BookingServiceError>
    where
        F: FnOnce(&mut BookingWizard) -> Result<StepOutcome, WizardError>,
    {
        let (outcome, view) = self.repository.modify(booking_id, |wizard| {
            let outcome = apply(wizard);
            (outcome, wizard.view())
        })?;
        let outcome = outcome?;
        let tasks = self.dispatcher.dispatch(booking_id, outcome.effects);
        Ok(Submission { view, tasks })
    }

    fn navigate<F>(
        &self,
        booking_id: &BookingId,
        apply: F,
    ) -> Result<WizardView, BookingServiceError>
    where
        F: FnOnce(&mut BookingWizard) -> Result<BookingStep, WizardError>,
    {
        let (result, view) = self.repository.modify(booking_id, |wizard| {
            let result = apply(wizard);
            (result, wizard.view())
        })?;
        result?;
        Ok(view)
    }
}

/// Releases the busy flag if a payment request is dropped before it settles.
struct InFlightPayment<R: SessionRepository> {
    repository: Arc<R>,
    booking_id: BookingId,
    armed: bool,
}

impl<R: SessionRepository> Drop for InFlightPayment<R> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self
                .repository
                .modify(&self.booking_id, BookingWizard::cancel_payment);
        }
    }
}

/// Error raised by the booking service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
