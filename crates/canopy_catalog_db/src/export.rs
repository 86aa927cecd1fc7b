//! Spreadsheet-mirror export (`export_database`, spec §4.4).

use crate::error::Result;
use crate::repository::CatalogStore;
use canopy_protocol::derived::{combined_weight, desc_and_weight, joint_ratio, ratio_or_thc_cbd};
use std::path::Path;

const FIXED_COLUMNS: &[&str] = &[
    "Product Name",
    "Vendor",
    "Product Type",
    "Lineage",
    "Brand",
    "CombinedWeight",
    "Price",
    "DescAndWeight",
    "JointRatio",
    "Ratio_or_THC_CBD",
    "Strain",
    "DOH Compliant",
    "Archived",
];

impl CatalogStore {
    /// Produce a CSV mirror of a store's product table at `path`. Extra
    /// columns preserved on upload are appended after the fixed columns,
    /// union of all keys seen across rows, sorted for determinism.
    pub async fn export_database(&self, store_name: Option<&str>, path: &Path) -> Result<usize> {
        let products = self.all_products(store_name).await?;

        let mut extra_keys = std::collections::BTreeSet::new();
        for product in &products {
            extra_keys.extend(product.extra.keys().cloned());
        }

        let mut writer = csv::Writer::from_path(path)?;
        let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
        header.extend(extra_keys.iter().cloned());
        writer.write_record(&header)?;

        for product in &products {
            let mut record: Vec<String> = vec![
                product.product_name.clone(),
                product.vendor.clone(),
                product.product_type.as_str().to_string(),
                product.lineage.as_str().to_string(),
                product.brand.clone().unwrap_or_default(),
                combined_weight(product),
                product.price.map(|p| p.to_string()).unwrap_or_default(),
                desc_and_weight(product),
                joint_ratio(product).unwrap_or_default(),
                ratio_or_thc_cbd(product),
                product.strain_name.clone().unwrap_or_default(),
                if product.doh_compliant { "Yes".to_string() } else { "No".to_string() },
                if product.archived { "Yes".to_string() } else { "No".to_string() },
            ];
            for key in &extra_keys {
                record.push(product.extra.get(key).cloned().unwrap_or_default());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(products.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_protocol::{Lineage, Product, ProductType, WeightUnit};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store
            .add_or_update_product(
                None,
                Product {
                    product_name: "Blue Dream 3.5g".into(),
                    vendor: "Acme".into(),
                    product_type: ProductType::Flower,
                    lineage: Lineage::Sativa,
                    brand: None,
                    weight_magnitude: Some(3.5),
                    weight_unit: Some(WeightUnit::Grams),
                    price: Some(40.0),
                    thc_percent: Some(22.0),
                    cbd_percent: None,
                    thca_percent: None,
                    cbda_percent: None,
                    thc_mg: None,
                    cbd_mg: None,
                    ratio: None,
                    doh_compliant: true,
                    archived: false,
                    accepted_date: None,
                    expiration_date: None,
                    description: Some("Classic".into()),
                    strain_name: None,
                    source: None,
                    match_score: None,
                    match_confidence: None,
                    extra: BTreeMap::new(),
                },
            )
            .await
            .unwrap();

        let out_path = dir.path().join("export.csv");
        let count = store.export_database(None, &out_path).await.unwrap();
        assert_eq!(count, 1);
        let contents = std::fs::read_to_string(&out_path).unwrap();
        assert!(contents.contains("Blue Dream 3.5g"));
        assert!(contents.contains("3.5g"));
    }
}
