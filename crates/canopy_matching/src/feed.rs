//! JSON inventory feed parsing (spec §4.3 step 1-2, §6 input format).

use crate::error::{MatchError, Result};
use canopy_protocol::WeightUnit;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One item extracted from the feed, ready to be matched against the
/// catalog/table.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub product_name: String,
    pub vendor: String,
    pub brand: Option<String>,
    pub inventory_type: Option<String>,
    pub weight_magnitude: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub thca_percent: Option<f64>,
    pub cbda_percent: Option<f64>,
}

#[derive(Deserialize)]
struct EnvelopeShape {
    inventory_transfer_items: Vec<Value>,
    from_license_name: Option<String>,
}

/// Parse the raw feed body into a flat list of items, resolving the
/// envelope form's default vendor per item (spec §4.3 step 1).
///
/// The envelope/array shape itself must be well-formed — a malformed top
/// level is a hard error — but a single malformed item (missing
/// `product_name`, no resolvable vendor) is logged and skipped rather than
/// failing the whole feed (spec §4.3, §9).
pub fn parse_feed(body: &str) -> Result<Vec<InventoryItem>> {
    let root: Value = serde_json::from_str(body)?;

    let (items, default_vendor): (Vec<Value>, Option<String>) = match root {
        Value::Array(items) => (items, None),
        Value::Object(_) => {
            let envelope: EnvelopeShape = serde_json::from_value(root)?;
            (envelope.inventory_transfer_items, envelope.from_license_name)
        }
        _ => return Err(MatchError::MissingField("top-level array or object".to_string())),
    };

    let total = items.len();
    let mut parsed = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        match parse_item(item, default_vendor.as_deref()) {
            Ok(item) => parsed.push(item),
            Err(err) => warn!(index, total, error = %err, "skipping malformed feed item"),
        }
    }
    Ok(parsed)
}

fn parse_item(value: Value, default_vendor: Option<&str>) -> Result<InventoryItem> {
    let product_name = value
        .get("product_name")
        .and_then(Value::as_str)
        .ok_or_else(|| MatchError::MissingField("product_name".to_string()))?
        .to_string();

    let vendor = value
        .get("vendor")
        .or_else(|| value.get("vendor_name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| default_vendor.map(str::to_string))
        .ok_or_else(|| MatchError::MissingField("vendor".to_string()))?;

    let brand =
        value.get("brand").or_else(|| value.get("brand_name")).and_then(Value::as_str).map(str::to_string);

    let inventory_type = value.get("inventory_type").and_then(Value::as_str).map(str::to_string);

    let (weight_magnitude, weight_unit) = value
        .get("weight")
        .and_then(Value::as_str)
        .map(parse_weight_string)
        .unwrap_or((None, None));

    let lab_result = value.get("lab_result_data");
    let lab_field = |key: &str| lab_result.and_then(|l| l.get(key)).and_then(Value::as_f64);

    Ok(InventoryItem {
        product_name,
        vendor,
        brand,
        inventory_type,
        weight_magnitude,
        weight_unit,
        thc_percent: lab_field("thc"),
        cbd_percent: lab_field("cbd"),
        thca_percent: lab_field("thca"),
        cbda_percent: lab_field("cbda"),
    })
}

/// Parse a weight string like "3.5g", "1oz", "1/8 oz" into magnitude+unit.
fn parse_weight_string(raw: &str) -> (Option<f64>, Option<WeightUnit>) {
    let trimmed = raw.trim();
    let split_at = trimmed.find(|c: char| c.is_ascii_alphabetic());
    let Some(split_at) = split_at else {
        return (trimmed.parse().ok(), None);
    };

    let (number_part, unit_part) = trimmed.split_at(split_at);
    let unit = WeightUnit::parse(unit_part);
    let magnitude = parse_fraction(number_part.trim());
    (magnitude, unit)
}

fn parse_fraction(raw: &str) -> Option<f64> {
    if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            None
        } else {
            Some(num / den)
        }
    } else {
        raw.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_level_array() {
        let body = r#"[{"product_name": "A", "vendor": "Acme"}]"#;
        let items = parse_feed(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].vendor, "Acme");
    }

    #[test]
    fn envelope_form_defaults_vendor_per_item() {
        let body = r#"{
            "from_license_name": "Acme",
            "inventory_transfer_items": [{"product_name": "A"}, {"product_name": "B", "vendor": "Other"}]
        }"#;
        let items = parse_feed(body).unwrap();
        assert_eq!(items[0].vendor, "Acme");
        assert_eq!(items[1].vendor, "Other");
    }

    #[test]
    fn item_missing_product_name_is_skipped_not_fatal() {
        let body = r#"[{"vendor": "Acme"}, {"product_name": "B", "vendor": "Other"}]"#;
        let items = parse_feed(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "B");
    }

    #[test]
    fn malformed_top_level_is_still_a_hard_error() {
        let body = r#""just a string""#;
        assert!(parse_feed(body).is_err());
    }

    #[test]
    fn fractional_ounce_weight_parses() {
        let (magnitude, unit) = parse_weight_string("1/8 oz");
        assert_eq!(magnitude, Some(0.125));
        assert_eq!(unit, Some(WeightUnit::Ounces));
    }
}
