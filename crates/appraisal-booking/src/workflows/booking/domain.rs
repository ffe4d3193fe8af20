use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session-scoped identifier assigned when the wizard starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof of booking shown to the customer once payment succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationNumber(pub String);

impl ConfirmationNumber {
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Self(format!("AB-{}", &simple[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marketing-source metadata carried through to analytics and nurturing payloads.
pub type Attribution = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    ContactInfo,
    PropertyDetails,
    Schedule,
    Payment,
    Confirmation,
}

impl BookingStep {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::ContactInfo,
            Self::PropertyDetails,
            Self::Schedule,
            Self::Payment,
            Self::Confirmation,
        ]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::ContactInfo => 1,
            Self::PropertyDetails => 2,
            Self::Schedule => 3,
            Self::Payment => 4,
            Self::Confirmation => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|step| step.number() == number)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ContactInfo => "Contact Info",
            Self::PropertyDetails => "Property Details",
            Self::Schedule => "Schedule",
            Self::Payment => "Payment",
            Self::Confirmation => "Confirmation",
        }
    }

    /// Identifier used in analytics event names and collaborator payloads.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ContactInfo => "contact_info",
            Self::PropertyDetails => "property_details",
            Self::Schedule => "schedule",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::ContactInfo => Some(Self::PropertyDetails),
            Self::PropertyDetails => Some(Self::Schedule),
            Self::Schedule => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::ContactInfo => None,
            Self::PropertyDetails => Some(Self::ContactInfo),
            Self::Schedule => Some(Self::PropertyDetails),
            Self::Payment => Some(Self::Schedule),
            Self::Confirmation => Some(Self::Payment),
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Purchase,
    Refinance,
    Divorce,
    Estate,
    Other,
}

impl Purpose {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Purchase,
            Self::Refinance,
            Self::Divorce,
            Self::Estate,
            Self::Other,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Refinance => "refinance",
            Self::Divorce => "divorce",
            Self::Estate => "estate",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::Refinance => "Refinance",
            Self::Divorce => "Divorce",
            Self::Estate => "Estate / Probate",
            Self::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|value| value.as_str() == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requester {
    Owner,
    Agent,
    Lender,
    Lawyer,
    Other,
}

impl Requester {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Owner,
            Self::Agent,
            Self::Lender,
            Self::Lawyer,
            Self::Other,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Agent => "agent",
            Self::Lender => "lender",
            Self::Lawyer => "lawyer",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Owner => "Property Owner",
            Self::Agent => "Real Estate Agent",
            Self::Lender => "Lender",
            Self::Lawyer => "Attorney",
            Self::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|value| value.as_str() == wanted)
    }
}

/// Number of living units on the property. Anything above four is outside residential pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LivingUnits {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5+")]
    FivePlus,
}

impl LivingUnits {
    pub const fn ordered() -> [Self; 5] {
        [Self::One, Self::Two, Self::Three, Self::Four, Self::FivePlus]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::FivePlus => "5+",
        }
    }

    pub const fn is_multi_unit(self) -> bool {
        matches!(self, Self::Two | Self::Three | Self::Four)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|value| value.as_str() == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionScope {
    Inspection,
    Desktop,
    Interior,
    Exterior,
}

impl InspectionScope {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Inspection,
            Self::Desktop,
            Self::Interior,
            Self::Exterior,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inspection => "inspection",
            Self::Desktop => "desktop",
            Self::Interior => "interior",
            Self::Exterior => "exterior",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Inspection => "Property Inspection",
            Self::Desktop => "Desktop Appraisal",
            Self::Interior => "Interior Appraisal",
            Self::Exterior => "Exterior-Only Appraisal",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|value| value.as_str() == wanted)
    }
}

/// Validated step 1 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Validated step 2 data. Enum fields cannot carry values outside their closed sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub address: String,
    pub zip_code: Option<String>,
    pub date_needed: NaiveDate,
    pub purpose: Purpose,
    pub requester: Requester,
    pub size_of_home: u32,
    pub size_of_lot: Option<f64>,
    pub is_lot_over_one_acre: bool,
    pub has_site_influence: bool,
    pub living_units: LivingUnits,
    pub scope: InspectionScope,
}

/// Validated step 3 data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDetails {
    pub appointment_date: String,
    pub appointment_time: String,
}

/// Accumulating record of one wizard session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDraft {
    pub booking_id: BookingId,
    pub contact: Option<ContactDetails>,
    pub property: Option<PropertyDetails>,
    pub quote_amount: Option<f64>,
    pub schedule: Option<ScheduleDetails>,
    pub confirmation_number: Option<ConfirmationNumber>,
}

impl BookingDraft {
    pub fn new(booking_id: BookingId) -> Self {
        Self {
            booking_id,
            contact: None,
            property: None,
            quote_amount: None,
            schedule: None,
            confirmation_number: None,
        }
    }

    /// Whether the data owned by `step` has been captured.
    pub fn has_step_data(&self, step: BookingStep) -> bool {
        match step {
            BookingStep::ContactInfo => self.contact.is_some(),
            BookingStep::PropertyDetails => self.property.is_some() && self.quote_amount.is_some(),
            BookingStep::Schedule => self.schedule.is_some(),
            BookingStep::Payment | BookingStep::Confirmation => {
                self.confirmation_number.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_numbered_one_through_five() {
        let numbers: Vec<u8> = BookingStep::ordered()
            .iter()
            .map(|step| step.number())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(BookingStep::from_number(3), Some(BookingStep::Schedule));
        assert_eq!(BookingStep::from_number(0), None);
        assert_eq!(BookingStep::from_number(6), None);
    }

    #[test]
    fn next_and_previous_are_inverse() {
        for step in BookingStep::ordered() {
            if let Some(next) = step.next() {
                assert_eq!(next.previous(), Some(step));
            }
        }
        assert_eq!(BookingStep::Confirmation.next(), None);
        assert_eq!(BookingStep::ContactInfo.previous(), None);
    }

    #[test]
    fn enum_parsing_is_closed() {
        assert_eq!(Purpose::parse(" Estate "), Some(Purpose::Estate));
        assert_eq!(Purpose::parse("investment"), None);
        assert_eq!(Requester::parse("LAWYER"), Some(Requester::Lawyer));
        assert_eq!(LivingUnits::parse("5+"), Some(LivingUnits::FivePlus));
        assert_eq!(LivingUnits::parse("5"), None);
        assert_eq!(InspectionScope::parse("desktop"), Some(InspectionScope::Desktop));
        assert_eq!(InspectionScope::parse("drive-by"), None);
    }

    #[test]
    fn living_units_serialize_as_form_values() {
        let json = serde_json::to_string(&LivingUnits::FivePlus).expect("serializes");
        assert_eq!(json, "\"5+\"");
        let parsed: LivingUnits = serde_json::from_str("\"3\"").expect("deserializes");
        assert_eq!(parsed, LivingUnits::Three);
    }

    #[test]
    fn confirmation_numbers_are_prefixed_and_unique() {
        let first = ConfirmationNumber::generate();
        let second = ConfirmationNumber::generate();
        assert!(first.as_str().starts_with("AB-"));
        assert_eq!(first.as_str().len(), 11);
        assert_ne!(first, second);
    }
}
