use crate::infra::{booking_service, LoggingMailer};
use appraisal_booking::config::NotificationConfig;
use appraisal_booking::error::AppError;
use appraisal_booking::workflows::booking::validation::parse_date;
use appraisal_booking::workflows::booking::{
    price_breakdown, Attribution, BookingServiceError, ContactForm, InspectionScope,
    LivingUnits, PaymentCallback, PaymentStatus, PropertyDetailsForm, QuoteInput, ScheduleForm,
    WizardError,
};
use chrono::{Days, Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

fn parse_scope(raw: &str) -> Result<InspectionScope, String> {
    InspectionScope::parse(raw).ok_or_else(|| {
        format!("unknown scope '{raw}' (expected inspection, desktop, interior, or exterior)")
    })
}

fn parse_units(raw: &str) -> Result<LivingUnits, String> {
    LivingUnits::parse(raw)
        .ok_or_else(|| format!("unknown living units '{raw}' (expected 1, 2, 3, 4, or 5+)"))
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Scope of work; interior pricing applies when omitted
    #[arg(long, value_parser = parse_scope)]
    pub(crate) scope: Option<InspectionScope>,
    /// Gross living area in square feet
    #[arg(long)]
    pub(crate) size: u32,
    /// Number of living units (1, 2, 3, 4, or 5+)
    #[arg(long, value_parser = parse_units, default_value = "1")]
    pub(crate) units: LivingUnits,
    /// The lot is larger than one acre
    #[arg(long)]
    pub(crate) lot_over_one_acre: bool,
    /// The site has an external influence (highway, commercial neighbor, ...)
    #[arg(long)]
    pub(crate) site_influence: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Calendar date the booking is made on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Scope of work for the sample property
    #[arg(long, value_parser = parse_scope, default_value = "interior")]
    pub(crate) scope: InspectionScope,
    /// Gross living area of the sample property
    #[arg(long, default_value_t = 2400)]
    pub(crate) size: u32,
    /// Number of living units; 5+ shows the consultation advisory
    #[arg(long, value_parser = parse_units, default_value = "1")]
    pub(crate) units: LivingUnits,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let breakdown = price_breakdown(&QuoteInput {
        scope: args.scope,
        size_of_home: args.size,
        living_units: args.units,
        is_lot_over_one_acre: args.lot_over_one_acre,
        has_site_influence: args.site_influence,
    });

    println!("Appraisal quote");
    for component in &breakdown.components {
        println!(
            "- {:<26} {:>10.2}  {}",
            format!("{:?}", component.kind),
            component.amount,
            component.notes
        );
    }
    if breakdown.quote.is_advisory() {
        println!("\n{}", breakdown.quote.display());
    } else {
        println!("\nTotal: {}", breakdown.quote.display());
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let config = NotificationConfig::default();
    let mailer = Arc::new(LoggingMailer::default());
    let service = booking_service(&config, mailer.clone());

    let attribution = Attribution::from([
        ("utm_source".to_string(), "cli".to_string()),
        ("utm_medium".to_string(), "demo".to_string()),
    ]);
    let view = service.start(attribution)?;
    let booking_id = view.booking_id;
    println!("Booking session {booking_id} opened at {}", view.step);

    let submission = service.submit_contact(
        &booking_id,
        ContactForm {
            name: "Riley Harper".to_string(),
            email: "riley.harper@example.com".to_string(),
            phone: "(515) 555-0188".to_string(),
        },
    )?;
    println!("- Contact captured -> {}", submission.view.step);
    for task in submission.tasks {
        let label = task.label();
        println!("  {label}: {:?}", task.report().await);
    }

    let date_needed = today.checked_add_days(Days::new(10)).unwrap_or(today);
    let property = PropertyDetailsForm {
        address: "2100 Fleur Drive, Des Moines IA 50321".to_string(),
        zip_code: None,
        date_needed: date_needed.format("%Y-%m-%d").to_string(),
        purpose: "purchase".to_string(),
        requester: "agent".to_string(),
        size_of_home: args.size.to_string(),
        size_of_lot: Some("0.4".to_string()),
        is_lot_over_one_acre: false,
        has_site_influence: false,
        number_of_living_units: args.units.as_str().to_string(),
        scope_of_inspection: args.scope.as_str().to_string(),
    };
    let submission = match service.submit_property(&booking_id, property, today) {
        Ok(submission) => submission,
        Err(BookingServiceError::Wizard(WizardError::QuoteAdvisory { message })) => {
            println!("- Property details held: {message}");
            return Ok(());
        }
        Err(BookingServiceError::Wizard(WizardError::Validation(errors))) => {
            println!("- Property details rejected:");
            for field in errors.fields {
                println!("    {}: {}", field.field, field.message);
            }
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    println!(
        "- Property priced at {} -> {}",
        submission.view.quote_display.as_deref().unwrap_or("n/a"),
        submission.view.step
    );

    let appointment = today.checked_add_days(Days::new(4)).unwrap_or(today);
    let submission = service.submit_schedule(
        &booking_id,
        ScheduleForm {
            appointment_date: appointment.format("%Y-%m-%d").to_string(),
            appointment_time: "10:00 AM".to_string(),
        },
    )?;
    println!("- Appointment requested -> {}", submission.view.step);

    let submission = service
        .complete_payment(
            &booking_id,
            PaymentCallback {
                status: PaymentStatus::Succeeded,
                reference: Some("demo-payment".to_string()),
                failure_reason: None,
            },
        )
        .await?;
    for task in submission.tasks {
        let label = task.label();
        println!("  {label}: {:?}", task.report().await);
    }

    if let Some(confirmation) = submission.view.confirmation {
        println!(
            "- Confirmed as {}\n  {}",
            confirmation.confirmation_number, confirmation.message
        );
    }

    for (to, notification) in mailer.sent() {
        println!("\nStaff notification to {to} ({})", notification.service_type);
        for line in notification.notes.lines() {
            println!("  {line}");
        }
    }

    Ok(())
}
