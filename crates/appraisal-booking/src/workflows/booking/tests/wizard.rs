use std::collections::BTreeMap;

use super::common::{contact_form, property_form, schedule_form, today, wizard_at_payment};
use crate::workflows::booking::collaborators::{EventName, CONTACT_SOURCE};
use crate::workflows::booking::domain::{BookingId, BookingStep};
use crate::workflows::booking::quote::MULTI_FAMILY_ADVISORY;
use crate::workflows::booking::validation::{ContactForm, PropertyDetailsForm, ValidationFailure};
use crate::workflows::booking::wizard::{
    BookingEffect, BookingWizard, PaymentOutcome, WizardError, CONFIRMATION_MESSAGE,
};

fn tracked(effects: &[BookingEffect]) -> Vec<&'static str> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            BookingEffect::Track(event) => Some(event.event.as_str()),
            _ => None,
        })
        .collect()
}

fn nurturing_calls(effects: &[BookingEffect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, BookingEffect::SendToNurturing(_)))
        .count()
}

fn completed() -> PaymentOutcome {
    PaymentOutcome::Completed {
        reference: Some("pi_12345".to_string()),
    }
}

#[test]
fn new_session_starts_at_contact_info_with_empty_draft() {
    let wizard = BookingWizard::with_booking_id(BookingId("bk-1".to_string()), BTreeMap::new());

    assert_eq!(wizard.step(), BookingStep::ContactInfo);
    assert_eq!(wizard.furthest_step(), BookingStep::ContactInfo);
    assert!(!wizard.is_busy());
    assert!(wizard.draft().contact.is_none());
    assert!(wizard.quote().is_none());
    assert!(wizard.confirmation().is_none());
    assert_eq!(wizard.contact_form(), ContactForm::default());
}

#[test]
fn contact_submission_advances_and_sends_lead_with_attribution() {
    let attribution = BTreeMap::from([
        ("utm_source".to_string(), "google".to_string()),
        ("gclid".to_string(), "abc123".to_string()),
    ]);
    let mut wizard =
        BookingWizard::with_booking_id(BookingId("bk-2".to_string()), attribution.clone());

    let outcome = wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");

    assert_eq!(outcome.step, BookingStep::PropertyDetails);
    assert_eq!(
        tracked(&outcome.effects),
        vec![
            "booking_started",
            "booking_step_completed",
            "booking_contact_info_completed"
        ]
    );
    let submission = outcome
        .effects
        .iter()
        .find_map(|effect| match effect {
            BookingEffect::SendToNurturing(submission) => Some(submission),
            _ => None,
        })
        .expect("lead submitted");
    assert_eq!(submission.email, "jordan.avery@example.com");
    assert_eq!(submission.source, CONTACT_SOURCE);
    assert_eq!(submission.step, "contact_info");
    assert_eq!(submission.booking_id.as_str(), "bk-2");
    assert_eq!(submission.attribution_data, attribution);
}

#[test]
fn invalid_contact_keeps_wizard_in_place() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    let err = wizard
        .submit_contact(&ContactForm::default())
        .expect_err("empty form");

    match err {
        WizardError::Validation(errors) => {
            assert!(errors.contains(ValidationFailure::MissingName));
            assert_eq!(errors.len(), 3);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(wizard.step(), BookingStep::ContactInfo);
    assert!(wizard.draft().contact.is_none());
}

#[test]
fn property_submission_stores_quote_and_reports_value() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");

    let outcome = wizard
        .submit_property(&property_form(), today())
        .expect("property accepted");

    assert_eq!(outcome.step, BookingStep::Schedule);
    assert_eq!(wizard.draft().quote_amount, Some(450.0));
    assert_eq!(wizard.view().quote_display.as_deref(), Some("$450.00"));
    let values: Vec<Option<f64>> = outcome
        .effects
        .iter()
        .filter_map(|effect| match effect {
            BookingEffect::Track(event) => Some(event.conversion_value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![Some(450.0), Some(450.0)]);
}

#[test]
fn multi_family_advisory_blocks_advancement() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");

    let form = PropertyDetailsForm {
        number_of_living_units: "5+".to_string(),
        ..property_form()
    };
    match wizard.submit_property(&form, today()) {
        Err(WizardError::QuoteAdvisory { message }) => assert_eq!(message, MULTI_FAMILY_ADVISORY),
        other => panic!("expected advisory, got {other:?}"),
    }
    assert_eq!(wizard.step(), BookingStep::PropertyDetails);
    assert!(wizard.draft().property.is_none());
    assert!(wizard.draft().quote_amount.is_none());
}

#[test]
fn submissions_for_the_wrong_step_are_refused() {
    let mut wizard = BookingWizard::start(BTreeMap::new());

    match wizard.submit_schedule(&schedule_form()) {
        Err(WizardError::UnexpectedStep { expected, current }) => {
            assert_eq!(expected, BookingStep::Schedule);
            assert_eq!(current, BookingStep::ContactInfo);
        }
        other => panic!("expected unexpected-step error, got {other:?}"),
    }
    match wizard.begin_payment() {
        Err(WizardError::UnexpectedStep { .. }) => {}
        other => panic!("expected unexpected-step error, got {other:?}"),
    }
}

#[test]
fn payment_completes_booking_and_notifies_staff() {
    let mut wizard = wizard_at_payment();
    wizard.begin_payment().expect("payment starts");

    let outcome = wizard
        .complete_payment(completed())
        .expect("payment accepted");

    assert_eq!(outcome.step, BookingStep::Confirmation);
    assert_eq!(
        tracked(&outcome.effects),
        vec![
            "booking_step_completed",
            "booking_payment_completed",
            "booking_completed"
        ]
    );
    let notification = outcome
        .effects
        .iter()
        .find_map(|effect| match effect {
            BookingEffect::NotifyBooking(notification) => Some(notification),
            _ => None,
        })
        .expect("staff notified");
    assert_eq!(notification.zip.as_deref(), Some("50309"));
    assert_eq!(notification.service_type, "Residential Appraisal (Interior Appraisal)");

    let confirmation = wizard.confirmation().expect("confirmation issued");
    assert!(confirmation.confirmation_number.as_str().starts_with("AB-"));
    assert_eq!(confirmation.message, CONFIRMATION_MESSAGE);
    assert!(notification
        .notes
        .contains(confirmation.confirmation_number.as_str()));
    assert!(!wizard.is_busy());
}

#[test]
fn confirmation_is_terminal() {
    let mut wizard = wizard_at_payment();
    wizard.begin_payment().expect("payment starts");
    wizard
        .complete_payment(completed())
        .expect("payment accepted");
    let confirmed = wizard.draft().clone();

    assert!(matches!(wizard.back(), Err(WizardError::Terminal)));
    assert!(matches!(wizard.advance(), Err(WizardError::Terminal)));
    assert!(matches!(
        wizard.submit_contact(&contact_form()),
        Err(WizardError::Terminal)
    ));
    assert!(matches!(
        wizard.complete_payment(completed()),
        Err(WizardError::Terminal)
    ));
    assert_eq!(wizard.draft(), &confirmed);
}

#[test]
fn in_flight_payment_refuses_duplicates_and_navigation() {
    let mut wizard = wizard_at_payment();
    wizard.begin_payment().expect("payment starts");

    assert!(wizard.is_busy());
    assert!(matches!(
        wizard.begin_payment(),
        Err(WizardError::SubmissionInFlight(BookingStep::Payment))
    ));
    assert!(matches!(
        wizard.back(),
        Err(WizardError::SubmissionInFlight(BookingStep::Payment))
    ));

    wizard.cancel_payment();
    assert!(!wizard.is_busy());
    wizard.begin_payment().expect("retry allowed once released");
}

#[test]
fn failed_payment_stays_on_payment_step() {
    let mut wizard = wizard_at_payment();
    wizard.begin_payment().expect("payment starts");

    match wizard.complete_payment(PaymentOutcome::Failed {
        reason: "card declined".to_string(),
    }) {
        Err(WizardError::PaymentFailed { reason }) => assert_eq!(reason, "card declined"),
        other => panic!("expected payment failure, got {other:?}"),
    }
    assert_eq!(wizard.step(), BookingStep::Payment);
    assert!(!wizard.is_busy());
    assert!(wizard.confirmation().is_none());
}

#[test]
fn unconfirmed_payment_is_assumed_complete() {
    let mut wizard = wizard_at_payment();
    wizard.begin_payment().expect("payment starts");

    let outcome = wizard
        .complete_payment(PaymentOutcome::AssumedCompleted {
            reason: "provider timeout".to_string(),
        })
        .expect("booking proceeds");
    assert_eq!(outcome.step, BookingStep::Confirmation);
    assert!(wizard.confirmation().is_some());
}

#[test]
fn back_is_refused_at_the_first_step() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    assert!(matches!(wizard.back(), Err(WizardError::AtFirstStep)));
}

#[test]
fn back_then_forward_preserves_draft_exactly() {
    let mut wizard = wizard_at_payment();
    let before = serde_json::to_string(wizard.draft()).expect("draft serializes");

    assert_eq!(wizard.back().expect("back"), BookingStep::Schedule);
    assert_eq!(wizard.back().expect("back"), BookingStep::PropertyDetails);
    assert_eq!(wizard.property_form().date_needed, "2025-10-15");

    assert_eq!(wizard.advance().expect("forward"), BookingStep::Schedule);
    assert_eq!(wizard.advance().expect("forward"), BookingStep::Payment);

    let after = serde_json::to_string(wizard.draft()).expect("draft serializes");
    assert_eq!(before, after);
    assert_eq!(wizard.furthest_step(), BookingStep::Payment);
}

#[test]
fn resubmitting_prefilled_forms_preserves_draft_and_skips_duplicate_lead() {
    let mut wizard = wizard_at_payment();
    let before = serde_json::to_string(wizard.draft()).expect("draft serializes");

    wizard.back().expect("back");
    wizard.back().expect("back");
    wizard.back().expect("back");
    assert_eq!(wizard.step(), BookingStep::ContactInfo);

    let outcome = wizard
        .submit_contact(&wizard.contact_form())
        .expect("contact re-confirmed");
    assert_eq!(nurturing_calls(&outcome.effects), 0);
    assert!(!tracked(&outcome.effects).contains(&EventName::BookingStarted.as_str()));

    wizard
        .submit_property(&wizard.property_form(), today())
        .expect("property re-confirmed");
    wizard
        .submit_schedule(&wizard.schedule_form())
        .expect("schedule re-confirmed");

    let after = serde_json::to_string(wizard.draft()).expect("draft serializes");
    assert_eq!(before, after);
}

#[test]
fn changed_contact_is_sent_to_nurturing_again() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");
    wizard.back().expect("back");

    let outcome = wizard
        .submit_contact(&ContactForm {
            phone: "515-555-0199".to_string(),
            ..contact_form()
        })
        .expect("contact accepted");
    assert_eq!(nurturing_calls(&outcome.effects), 1);
}

#[test]
fn advance_requires_a_previously_completed_step() {
    let mut wizard = BookingWizard::start(BTreeMap::new());
    assert!(matches!(
        wizard.advance(),
        Err(WizardError::StepIncomplete(BookingStep::ContactInfo))
    ));

    wizard
        .submit_contact(&contact_form())
        .expect("contact accepted");
    assert!(matches!(
        wizard.advance(),
        Err(WizardError::StepIncomplete(BookingStep::PropertyDetails))
    ));
}

#[test]
fn edited_property_is_repriced_on_resubmission() {
    let mut wizard = wizard_at_payment();
    wizard.back().expect("back");
    wizard.back().expect("back");

    wizard
        .submit_property(
            &PropertyDetailsForm {
                has_site_influence: true,
                ..wizard.property_form()
            },
            today(),
        )
        .expect("property accepted");

    assert_eq!(wizard.draft().quote_amount, Some(550.0));
    assert_eq!(wizard.step(), BookingStep::Schedule);
    assert!(wizard.draft().schedule.is_some());
}

#[test]
fn view_reflects_wizard_state() {
    let wizard = wizard_at_payment();
    let view = wizard.view();

    assert_eq!(view.step, BookingStep::Payment);
    assert_eq!(view.step_number, 4);
    assert_eq!(view.step_label, "Payment");
    assert_eq!(view.furthest_step, 4);
    assert!(!view.submission_in_flight);

    let json = serde_json::to_value(&view).expect("view serializes");
    assert!(json.get("confirmation").is_none());
    assert_eq!(json["quote_display"], "$450.00");
}

#[test]
fn rejected_property_edit_cannot_be_skipped_with_forward() {
    let mut wizard = wizard_at_payment();
    wizard.back().expect("back");
    wizard.back().expect("back");

    let multi_family = PropertyDetailsForm {
        number_of_living_units: "5+".to_string(),
        ..wizard.property_form()
    };
    assert!(matches!(
        wizard.submit_property(&multi_family, today()),
        Err(WizardError::QuoteAdvisory { .. })
    ));
    assert!(matches!(
        wizard.advance(),
        Err(WizardError::StepIncomplete(BookingStep::PropertyDetails))
    ));
    assert_eq!(wizard.step(), BookingStep::PropertyDetails);
    assert_eq!(wizard.furthest_step(), BookingStep::PropertyDetails);

    let invalid = PropertyDetailsForm {
        size_of_home: "12".to_string(),
        ..wizard.property_form()
    };
    assert!(matches!(
        wizard.submit_property(&invalid, today()),
        Err(WizardError::Validation(_))
    ));
    assert!(wizard.advance().is_err());

    wizard
        .submit_property(&wizard.property_form(), today())
        .expect("stored details accepted again");
    assert_eq!(wizard.step(), BookingStep::Schedule);
    assert!(matches!(
        wizard.advance(),
        Err(WizardError::StepIncomplete(BookingStep::Schedule))
    ));
    wizard
        .submit_schedule(&wizard.schedule_form())
        .expect("schedule re-confirmed");
    assert_eq!(wizard.step(), BookingStep::Payment);
}
