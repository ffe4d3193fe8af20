use serde::{Deserialize, Serialize};

use super::domain::{InspectionScope, LivingUnits, PropertyDetails};

/// Returned instead of a price for properties with five or more living units.
pub const MULTI_FAMILY_ADVISORY: &str =
    "Please call for a quote. We only appraise residential properties with up to four units.";

pub const SIZE_SURCHARGE_THRESHOLD_SQFT: u32 = 3000;
pub const SIZE_SURCHARGE_PER_SQFT: f64 = 0.10;
pub const LARGE_LOT_SURCHARGE: f64 = 100.0;
pub const SITE_INFLUENCE_SURCHARGE: f64 = 100.0;
pub const MULTI_UNIT_SURCHARGE: f64 = 200.0;

/// Base fee for a scope of work. Unset scope is billed as an interior appraisal.
pub const fn base_price(scope: Option<InspectionScope>) -> f64 {
    match scope {
        Some(InspectionScope::Inspection) => 200.0,
        Some(InspectionScope::Desktop) => 250.0,
        Some(InspectionScope::Exterior) => 350.0,
        Some(InspectionScope::Interior) | None => 450.0,
    }
}

/// Property attributes that drive pricing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub scope: Option<InspectionScope>,
    pub size_of_home: u32,
    pub living_units: LivingUnits,
    #[serde(default)]
    pub is_lot_over_one_acre: bool,
    #[serde(default)]
    pub has_site_influence: bool,
}

impl From<&PropertyDetails> for QuoteInput {
    fn from(details: &PropertyDetails) -> Self {
        Self {
            scope: Some(details.scope),
            size_of_home: details.size_of_home,
            living_units: details.living_units,
            is_lot_over_one_acre: details.is_lot_over_one_acre,
            has_site_influence: details.has_site_influence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Quote {
    Price { amount: f64 },
    Advisory { message: String },
}

impl Quote {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Quote::Price { amount } => Some(*amount),
            Quote::Advisory { .. } => None,
        }
    }

    pub fn is_advisory(&self) -> bool {
        matches!(self, Quote::Advisory { .. })
    }

    /// Customer-facing rendering: a two-decimal price or the advisory verbatim.
    pub fn display(&self) -> String {
        match self {
            Quote::Price { amount } => format_currency(*amount),
            Quote::Advisory { message } => message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceComponentKind {
    BasePrice,
    SizeSurcharge,
    LargeLotSurcharge,
    SiteInfluenceSurcharge,
    MultiUnitSurcharge,
}

/// Discrete contribution to a quote so staff can see how a price was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComponent {
    pub kind: PriceComponentKind,
    pub amount: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub components: Vec<PriceComponent>,
    pub quote: Quote,
}

pub fn price_breakdown(input: &QuoteInput) -> QuoteBreakdown {
    let base = base_price(input.scope);
    let mut components = vec![PriceComponent {
        kind: PriceComponentKind::BasePrice,
        amount: base,
        notes: match input.scope {
            Some(scope) => format!("{} base fee", scope.label()),
            None => "default base fee".to_string(),
        },
    }];

    if input.living_units == LivingUnits::FivePlus {
        return QuoteBreakdown {
            components,
            quote: Quote::Advisory {
                message: MULTI_FAMILY_ADVISORY.to_string(),
            },
        };
    }

    let mut total = base;

    if input.size_of_home > SIZE_SURCHARGE_THRESHOLD_SQFT {
        let excess = input.size_of_home - SIZE_SURCHARGE_THRESHOLD_SQFT;
        let surcharge = f64::from(excess) * SIZE_SURCHARGE_PER_SQFT;
        components.push(PriceComponent {
            kind: PriceComponentKind::SizeSurcharge,
            amount: surcharge,
            notes: format!("{excess} sq ft above {SIZE_SURCHARGE_THRESHOLD_SQFT} sq ft"),
        });
        total += surcharge;
    }

    if input.is_lot_over_one_acre {
        components.push(PriceComponent {
            kind: PriceComponentKind::LargeLotSurcharge,
            amount: LARGE_LOT_SURCHARGE,
            notes: "lot larger than one acre".to_string(),
        });
        total += LARGE_LOT_SURCHARGE;
    }

    if input.has_site_influence {
        components.push(PriceComponent {
            kind: PriceComponentKind::SiteInfluenceSurcharge,
            amount: SITE_INFLUENCE_SURCHARGE,
            notes: "external site influence".to_string(),
        });
        total += SITE_INFLUENCE_SURCHARGE;
    }

    if input.living_units.is_multi_unit() {
        components.push(PriceComponent {
            kind: PriceComponentKind::MultiUnitSurcharge,
            amount: MULTI_UNIT_SURCHARGE,
            notes: format!("{} living units", input.living_units.as_str()),
        });
        total += MULTI_UNIT_SURCHARGE;
    }

    QuoteBreakdown {
        components,
        quote: Quote::Price { amount: total },
    }
}

/// Price an appraisal order. Pure and total: either a positive amount or the advisory.
pub fn calculate_quote(input: &QuoteInput) -> Quote {
    price_breakdown(input).quote
}

/// Format a dollar amount with thousands separators and two decimals.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (index, digit) in dollars.chars().enumerate() {
        if index > 0 && (dollars.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(scope: InspectionScope, size: u32, units: LivingUnits) -> QuoteInput {
        QuoteInput {
            scope: Some(scope),
            size_of_home: size,
            living_units: units,
            is_lot_over_one_acre: false,
            has_site_influence: false,
        }
    }

    #[test]
    fn base_price_follows_scope() {
        assert_eq!(base_price(Some(InspectionScope::Inspection)), 200.0);
        assert_eq!(base_price(Some(InspectionScope::Desktop)), 250.0);
        assert_eq!(base_price(Some(InspectionScope::Exterior)), 350.0);
        assert_eq!(base_price(Some(InspectionScope::Interior)), 450.0);
        assert_eq!(base_price(None), 450.0);
    }

    #[test]
    fn breakdown_lists_components_in_pricing_order() {
        let breakdown = price_breakdown(&QuoteInput {
            scope: Some(InspectionScope::Inspection),
            size_of_home: 4000,
            living_units: LivingUnits::Two,
            is_lot_over_one_acre: true,
            has_site_influence: true,
        });

        let kinds: Vec<PriceComponentKind> =
            breakdown.components.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PriceComponentKind::BasePrice,
                PriceComponentKind::SizeSurcharge,
                PriceComponentKind::LargeLotSurcharge,
                PriceComponentKind::SiteInfluenceSurcharge,
                PriceComponentKind::MultiUnitSurcharge,
            ]
        );
        let summed: f64 = breakdown.components.iter().map(|c| c.amount).sum();
        let amount = breakdown.quote.amount().expect("numeric quote");
        assert!((summed - amount).abs() < 1e-9);
        assert!((amount - 700.0).abs() < 1e-9);
    }

    #[test]
    fn advisory_breakdown_stops_after_base_price() {
        let breakdown = price_breakdown(&input(
            InspectionScope::Exterior,
            9000,
            LivingUnits::FivePlus,
        ));
        assert_eq!(breakdown.components.len(), 1);
        assert_eq!(breakdown.quote.display(), MULTI_FAMILY_ADVISORY);
    }

    #[test]
    fn currency_formatting_uses_two_decimals_and_grouping() {
        assert_eq!(format_currency(450.0), "$450.00");
        assert_eq!(format_currency(500.05), "$500.05");
        assert_eq!(format_currency(4950.1), "$4,950.10");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn quote_serializes_with_kind_tag() {
        let price = serde_json::to_value(Quote::Price { amount: 450.0 }).expect("serializes");
        assert_eq!(price["kind"], "price");
        assert_eq!(price["amount"], 450.0);

        let advisory = calculate_quote(&input(InspectionScope::Desktop, 1200, LivingUnits::FivePlus));
        let value = serde_json::to_value(&advisory).expect("serializes");
        assert_eq!(value["kind"], "advisory");
        assert_eq!(value["message"], MULTI_FAMILY_ADVISORY);
    }
}
