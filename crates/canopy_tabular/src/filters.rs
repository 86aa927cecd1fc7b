//! Filter predicates and faceted `dynamic_filter_options` (spec §4.2).

use canopy_protocol::{derived::combined_weight, Product};
use std::collections::{BTreeMap, BTreeSet};

/// One filterable category. Each holds the set of accepted values; a row
/// matches a category if its value is a member (OR within category),
/// and must match every active category (AND across categories).
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub vendor: BTreeSet<String>,
    pub brand: BTreeSet<String>,
    pub product_type: BTreeSet<String>,
    pub lineage: BTreeSet<String>,
    pub weight: BTreeSet<String>,
    pub strain: BTreeSet<String>,
    pub doh: Option<bool>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.vendor.is_empty()
            && self.brand.is_empty()
            && self.product_type.is_empty()
            && self.lineage.is_empty()
            && self.weight.is_empty()
            && self.strain.is_empty()
            && self.doh.is_none()
    }

    fn matches_except(&self, product: &Product, skip: FilterCategory) -> bool {
        let check = |values: &BTreeSet<String>, field: &str| values.is_empty() || values.contains(field);

        (skip == FilterCategory::Vendor || check(&self.vendor, &product.vendor))
            && (skip == FilterCategory::Brand
                || check(&self.brand, product.brand.as_deref().unwrap_or_default()))
            && (skip == FilterCategory::ProductType
                || check(&self.product_type, product.product_type.as_str()))
            && (skip == FilterCategory::Lineage || check(&self.lineage, product.lineage.as_str()))
            && (skip == FilterCategory::Weight || check(&self.weight, &combined_weight(product)))
            && (skip == FilterCategory::Strain
                || check(&self.strain, product.strain_name.as_deref().unwrap_or_default()))
            && (skip == FilterCategory::Doh
                || self.doh.map(|want| want == product.doh_compliant).unwrap_or(true))
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_except(product, FilterCategory::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterCategory {
    None,
    Vendor,
    Brand,
    ProductType,
    Lineage,
    Weight,
    Strain,
    Doh,
}

/// Rows satisfying every active filter category (spec §4.2 `apply_filters`).
pub fn apply_filters<'a>(rows: &'a [Product], filters: &FilterSet) -> Vec<&'a Product> {
    rows.iter().filter(|p| !p.archived && filters.matches(p)).collect()
}

/// Per category, the values that would remain selectable given every other
/// category's active selection (spec §4.2 `dynamic_filter_options`).
pub fn dynamic_filter_options(rows: &[Product], filters: &FilterSet) -> BTreeMap<&'static str, BTreeSet<String>> {
    let mut options = BTreeMap::new();

    let categories = [
        ("vendor", FilterCategory::Vendor),
        ("brand", FilterCategory::Brand),
        ("product_type", FilterCategory::ProductType),
        ("lineage", FilterCategory::Lineage),
        ("weight", FilterCategory::Weight),
        ("strain", FilterCategory::Strain),
        ("doh", FilterCategory::Doh),
    ];

    for (name, category) in categories {
        let mut values = BTreeSet::new();
        for product in rows.iter().filter(|p| !p.archived) {
            if !filters.matches_except(product, category) {
                continue;
            }
            let value = match category {
                FilterCategory::Vendor => product.vendor.clone(),
                FilterCategory::Brand => product.brand.clone().unwrap_or_default(),
                FilterCategory::ProductType => product.product_type.as_str().to_string(),
                FilterCategory::Lineage => product.lineage.as_str().to_string(),
                FilterCategory::Weight => combined_weight(product),
                FilterCategory::Strain => product.strain_name.clone().unwrap_or_default(),
                FilterCategory::Doh => product.doh_compliant.to_string(),
                FilterCategory::None => unreachable!(),
            };
            if !value.is_empty() {
                values.insert(value);
            }
        }
        options.insert(name, values);
    }

    options
}
