//! Spreadsheet loading: `.xlsx`/`.xls` via calamine, `.csv` via the `csv`
//! crate, both projected through the header-alias table into [`Product`].

use crate::aliases::{resolve, CanonicalField};
use crate::error::{Result, TabularError};
use calamine::{open_workbook_auto, Data, Reader};
use canopy_protocol::{Lineage, Product, ProductType, WeightUnit};
use std::collections::BTreeMap;
use std::path::Path;

/// Parse `path` into a sequence of [`Product`] rows (spec §4.2 `load`).
/// An empty file (no data rows) is not an error: the header-only upload
/// boundary case (spec §8) yields zero products, not a failure.
pub fn load_path(path: &Path) -> Result<Vec<Product>> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "xlsx" | "xls" | "xlsb" | "ods" => load_workbook(path),
        "csv" => load_csv(path),
        other => Err(TabularError::UnsupportedExtension(other.to_string())),
    }
}

fn load_workbook(path: &Path) -> Result<Vec<Product>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name =
        workbook.sheet_names().first().cloned().ok_or(TabularError::Empty)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(TabularError::Empty)?;
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

    let mut products = Vec::new();
    for row in rows {
        let mut raw = BTreeMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            raw.insert(header.clone(), cell_to_string(cell));
        }
        if raw.values().all(|v| v.trim().is_empty()) {
            continue;
        }
        products.push(row_to_product(raw));
    }
    Ok(products)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn load_csv(path: &Path) -> Result<Vec<Product>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut raw = BTreeMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            raw.insert(header.clone(), value.to_string());
        }
        if raw.values().all(|v| v.trim().is_empty()) {
            continue;
        }
        products.push(row_to_product(raw));
    }
    Ok(products)
}

fn row_to_product(raw: BTreeMap<String, String>) -> Product {
    let mut fields: BTreeMap<CanonicalField, String> = BTreeMap::new();
    let mut extra = BTreeMap::new();

    for (header, value) in raw {
        match resolve(&header) {
            Some(field) => {
                fields.insert(field, value);
            }
            None => {
                extra.insert(header, value);
            }
        }
    }

    let get = |f: CanonicalField| fields.get(&f).map(String::as_str).unwrap_or("");
    let get_f64 = |f: CanonicalField| fields.get(&f).and_then(|v| v.trim().parse::<f64>().ok());

    let product_type = ProductType::parse(get(CanonicalField::ProductType)).unwrap_or(ProductType::Flower);

    let default_lineage = if product_type.is_classic() { Lineage::Hybrid } else { Lineage::Mixed };
    let lineage = Lineage::normalize(get(CanonicalField::Lineage), default_lineage);

    let strain_name = {
        let raw_strain = get(CanonicalField::StrainName).trim();
        if raw_strain.is_empty() {
            Some("Mixed".to_string())
        } else {
            Some(raw_strain.to_string())
        }
    };

    let ratio = {
        let raw_ratio = get(CanonicalField::Ratio).trim();
        if raw_ratio.is_empty() {
            None
        } else {
            Some(raw_ratio.to_string())
        }
    };

    let weight_unit = fields.get(&CanonicalField::WeightUnit).and_then(|v| WeightUnit::parse(v));

    let mut product = Product {
        product_name: get(CanonicalField::ProductName).trim().to_string(),
        vendor: get(CanonicalField::Vendor).trim().to_string(),
        product_type,
        lineage,
        brand: fields.get(&CanonicalField::Brand).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        weight_magnitude: get_f64(CanonicalField::WeightMagnitude),
        weight_unit,
        price: get_f64(CanonicalField::Price),
        thc_percent: get_f64(CanonicalField::ThcPercent),
        cbd_percent: get_f64(CanonicalField::CbdPercent),
        thca_percent: get_f64(CanonicalField::ThcaPercent),
        cbda_percent: get_f64(CanonicalField::CbdaPercent),
        thc_mg: get_f64(CanonicalField::ThcMg),
        cbd_mg: get_f64(CanonicalField::CbdMg),
        ratio,
        doh_compliant: parse_yes_no(get(CanonicalField::DohCompliant)),
        archived: parse_yes_no(get(CanonicalField::Archived)),
        accepted_date: fields
            .get(&CanonicalField::AcceptedDate)
            .and_then(|v| chrono::NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok()),
        expiration_date: fields
            .get(&CanonicalField::ExpirationDate)
            .and_then(|v| chrono::NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok()),
        description: fields.get(&CanonicalField::Description).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        strain_name,
        source: fields.get(&CanonicalField::Source).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        match_score: None,
        match_confidence: None,
        extra,
    };

    product.enforce_paraphernalia_lineage();
    product
}

fn parse_yes_no(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_header_only_yields_zero_products() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Product Name*,Vendor/Supplier*,Product Type*").unwrap();

        let products = load_path(&path).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn csv_row_resolves_aliases_and_preserves_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Product Name*,Vendor/Supplier*,Product Type*,Custom Field").unwrap();
        writeln!(file, "Blue Dream 3.5g,Acme,flower,custom-value").unwrap();

        let products = load_path(&path).unwrap();
        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.product_name, "Blue Dream 3.5g");
        assert_eq!(product.vendor, "Acme");
        assert_eq!(product.product_type, ProductType::Flower);
        assert_eq!(product.extra.get("Custom Field"), Some(&"custom-value".to_string()));
        assert_eq!(product.strain_name.as_deref(), Some("Mixed"));
    }

    #[test]
    fn paraphernalia_row_forces_lineage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Product Name*,Vendor/Supplier*,Product Type*,Lineage").unwrap();
        writeln!(file, "Grinder,Acme,paraphernalia,SATIVA").unwrap();

        let products = load_path(&path).unwrap();
        assert_eq!(products[0].lineage, Lineage::Paraphernalia);
    }
}
