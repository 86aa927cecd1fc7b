//! Header-name aliasing (spec §4.2): accept any of a per-field synonym set
//! and project it to one canonical field.

/// Canonical field names this crate knows how to read directly off a row.
/// Everything else passes through into [`canopy_protocol::Product::extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    ProductName,
    Vendor,
    ProductType,
    Lineage,
    Brand,
    WeightMagnitude,
    WeightUnit,
    Price,
    ThcPercent,
    CbdPercent,
    ThcaPercent,
    CbdaPercent,
    ThcMg,
    CbdMg,
    Ratio,
    DohCompliant,
    Archived,
    AcceptedDate,
    ExpirationDate,
    Description,
    StrainName,
    Source,
}

const ALIAS_TABLE: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::ProductName, &["Product Name*", "ProductName", "Product Name", "product_name"]),
    (CanonicalField::Vendor, &["Vendor/Supplier*", "Vendor", "Supplier", "vendor"]),
    (CanonicalField::ProductType, &["Product Type*", "ProductType", "Product Type", "product_type"]),
    (CanonicalField::Lineage, &["Lineage", "Product Strain Type", "lineage"]),
    (CanonicalField::Brand, &["Brand", "brand"]),
    (CanonicalField::WeightMagnitude, &["Weight", "Weight Magnitude", "weight_magnitude"]),
    (CanonicalField::WeightUnit, &["Weight Unit", "Unit", "weight_unit"]),
    (CanonicalField::Price, &["Price", "Unit Price", "price"]),
    (CanonicalField::ThcPercent, &["THC %", "THC Percent", "thc_percent"]),
    (CanonicalField::CbdPercent, &["CBD %", "CBD Percent", "cbd_percent"]),
    (CanonicalField::ThcaPercent, &["THCA %", "THCA Percent", "thca_percent"]),
    (CanonicalField::CbdaPercent, &["CBDA %", "CBDA Percent", "cbda_percent"]),
    (CanonicalField::ThcMg, &["THC mg", "THC Milligrams", "thc_mg"]),
    (CanonicalField::CbdMg, &["CBD mg", "CBD Milligrams", "cbd_mg"]),
    (CanonicalField::Ratio, &["Ratio", "ratio"]),
    (CanonicalField::DohCompliant, &["DOH Compliant*", "DOH", "doh_compliant"]),
    (CanonicalField::Archived, &["Archived", "archived"]),
    (CanonicalField::AcceptedDate, &["Accepted Date", "accepted_date"]),
    (CanonicalField::ExpirationDate, &["Expiration Date", "expiration_date"]),
    (CanonicalField::Description, &["Description", "description"]),
    (CanonicalField::StrainName, &["Product Strain", "Strain", "strain_name"]),
    (CanonicalField::Source, &["Source", "source"]),
];

/// Resolve a raw spreadsheet header to its canonical field, if known.
/// Matching is exact after trimming; the source spreadsheets are produced
/// by a small set of known templates so fuzzy header matching isn't needed.
pub fn resolve(raw_header: &str) -> Option<CanonicalField> {
    let trimmed = raw_header.trim();
    ALIAS_TABLE
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| s.eq_ignore_ascii_case(trimmed)))
        .map(|(field, _)| *field)
}
