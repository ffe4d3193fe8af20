//! Form validation for the booking wizard.
//!
//! Raw forms arrive as strings straight from the browser. Each validator collects every
//! offending field before returning so the caller can highlight all of them at once, and
//! on success yields a typed record whose enum fields are closed.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::{
    ContactDetails, InspectionScope, LivingUnits, PropertyDetails, Purpose, Requester,
    ScheduleDetails,
};

pub const MIN_ADDRESS_LENGTH: usize = 10;
pub const MIN_HOME_SIZE: i64 = 100;
pub const MAX_HOME_SIZE: i64 = 50_000;
pub const MAX_LOT_ACRES: f64 = 1000.0;

/// Reason a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("name is required")]
    MissingName,
    #[error("enter a valid email address")]
    InvalidEmail,
    #[error("enter a valid 10-digit phone number")]
    InvalidPhone,
    #[error("address must be at least 10 characters")]
    InvalidAddress,
    #[error("zip code must be NNNNN or NNNNN-NNNN")]
    InvalidZip,
    #[error("date must be formatted YYYY-MM-DD")]
    InvalidDate,
    #[error("date needed cannot be in the past")]
    DateInPast,
    #[error("select one of the listed options")]
    InvalidEnum,
    #[error("home size must be a whole number between 100 and 50,000 sq ft")]
    SizeOutOfRange,
    #[error("lot size must be greater than 0 and at most 1,000 acres")]
    LotSizeOutOfRange,
    #[error("appointment date is required")]
    MissingAppointmentDate,
    #[error("appointment time is required")]
    MissingAppointmentTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub failure: ValidationFailure,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, failure: ValidationFailure) -> Self {
        Self {
            field: field.to_string(),
            failure,
            message: failure.to_string(),
        }
    }
}

/// Every field-level failure produced by one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &str, failure: ValidationFailure) {
        self.fields.push(FieldError::new(field, failure));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn failure_for(&self, field: &str) -> Option<ValidationFailure> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.failure)
    }

    pub fn contains(&self, failure: ValidationFailure) -> bool {
        self.fields.iter().any(|error| error.failure == failure)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .fields
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(
            f,
            "{} field(s) failed validation: {}",
            self.fields.len(),
            details.join("; ")
        )
    }
}

impl std::error::Error for ValidationErrors {}

fn zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("zip pattern compiles"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

fn optional(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn is_valid_zip(raw: &str) -> bool {
    zip_pattern().is_match(raw.trim())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Step 1 form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name", ValidationFailure::MissingName);
        }

        let email = self.email.trim();
        if !email_pattern().is_match(email) {
            errors.push("email", ValidationFailure::InvalidEmail);
        }

        let digits: String = self.phone.chars().filter(char::is_ascii_digit).collect();
        let phone_ok = match digits.len() {
            10 => true,
            11 => digits.starts_with('1'),
            _ => false,
        };
        if !phone_ok {
            errors.push("phone", ValidationFailure::InvalidPhone);
        }

        errors.into_result(|| ContactDetails {
            name: name.to_string(),
            email: email.to_ascii_lowercase(),
            phone: self.phone.trim().to_string(),
        })
    }
}

impl From<&ContactDetails> for ContactForm {
    fn from(details: &ContactDetails) -> Self {
        Self {
            name: details.name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
        }
    }
}

/// Step 2 form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetailsForm {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub date_needed: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub size_of_home: String,
    #[serde(default)]
    pub size_of_lot: Option<String>,
    #[serde(default)]
    pub is_lot_over_one_acre: bool,
    #[serde(default)]
    pub has_site_influence: bool,
    #[serde(default)]
    pub number_of_living_units: String,
    #[serde(default)]
    pub scope_of_inspection: String,
}

impl PropertyDetailsForm {
    /// Validate against the rules for property input; `today` is the local calendar date.
    pub fn validate(&self, today: NaiveDate) -> Result<PropertyDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let address = self.address.trim();
        if address.chars().count() < MIN_ADDRESS_LENGTH {
            errors.push("address", ValidationFailure::InvalidAddress);
        }

        let zip_code = optional(&self.zip_code);
        if let Some(zip) = zip_code {
            if !is_valid_zip(zip) {
                errors.push("zipCode", ValidationFailure::InvalidZip);
            }
        }

        let date_needed = match parse_date(&self.date_needed) {
            Ok(date) if date < today => {
                errors.push("dateNeeded", ValidationFailure::DateInPast);
                None
            }
            Ok(date) => Some(date),
            Err(_) => {
                errors.push("dateNeeded", ValidationFailure::InvalidDate);
                None
            }
        };

        let purpose = Purpose::parse(&self.purpose);
        if purpose.is_none() {
            errors.push("purpose", ValidationFailure::InvalidEnum);
        }

        let requester = Requester::parse(&self.requester);
        if requester.is_none() {
            errors.push("requester", ValidationFailure::InvalidEnum);
        }

        let size_of_home = self
            .size_of_home
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|size| (MIN_HOME_SIZE..=MAX_HOME_SIZE).contains(size))
            .map(|size| size as u32);
        if size_of_home.is_none() {
            errors.push("sizeOfHome", ValidationFailure::SizeOutOfRange);
        }

        let size_of_lot = match optional(&self.size_of_lot) {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(acres) if acres.is_finite() && acres > 0.0 && acres <= MAX_LOT_ACRES => {
                    Some(acres)
                }
                _ => {
                    errors.push("sizeOfLot", ValidationFailure::LotSizeOutOfRange);
                    None
                }
            },
        };

        let living_units = LivingUnits::parse(&self.number_of_living_units);
        if living_units.is_none() {
            errors.push("numberOfLivingUnits", ValidationFailure::InvalidEnum);
        }

        let scope = InspectionScope::parse(&self.scope_of_inspection);
        if scope.is_none() {
            errors.push("scopeOfInspection", ValidationFailure::InvalidEnum);
        }

        match (
            date_needed,
            purpose,
            requester,
            size_of_home,
            living_units,
            scope,
        ) {
            (
                Some(date_needed),
                Some(purpose),
                Some(requester),
                Some(size_of_home),
                Some(living_units),
                Some(scope),
            ) if errors.is_empty() => Ok(PropertyDetails {
                address: address.to_string(),
                zip_code: zip_code.map(str::to_string),
                date_needed,
                purpose,
                requester,
                size_of_home,
                size_of_lot,
                is_lot_over_one_acre: self.is_lot_over_one_acre,
                has_site_influence: self.has_site_influence,
                living_units,
                scope,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&PropertyDetails> for PropertyDetailsForm {
    fn from(details: &PropertyDetails) -> Self {
        Self {
            address: details.address.clone(),
            zip_code: details.zip_code.clone(),
            date_needed: details.date_needed.format("%Y-%m-%d").to_string(),
            purpose: details.purpose.as_str().to_string(),
            requester: details.requester.as_str().to_string(),
            size_of_home: details.size_of_home.to_string(),
            size_of_lot: details.size_of_lot.map(|acres| acres.to_string()),
            is_lot_over_one_acre: details.is_lot_over_one_acre,
            has_site_influence: details.has_site_influence,
            number_of_living_units: details.living_units.as_str().to_string(),
            scope_of_inspection: details.scope.as_str().to_string(),
        }
    }
}

/// Step 3 form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleForm {
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub appointment_time: String,
}

impl ScheduleForm {
    pub fn validate(&self) -> Result<ScheduleDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let appointment_date = self.appointment_date.trim();
        if appointment_date.is_empty() {
            errors.push("appointmentDate", ValidationFailure::MissingAppointmentDate);
        }
        let appointment_time = self.appointment_time.trim();
        if appointment_time.is_empty() {
            errors.push("appointmentTime", ValidationFailure::MissingAppointmentTime);
        }

        errors.into_result(|| ScheduleDetails {
            appointment_date: appointment_date.to_string(),
            appointment_time: appointment_time.to_string(),
        })
    }
}

impl From<&ScheduleDetails> for ScheduleForm {
    fn from(details: &ScheduleDetails) -> Self {
        Self {
            appointment_date: details.appointment_date.clone(),
            appointment_time: details.appointment_time.clone(),
        }
    }
}
