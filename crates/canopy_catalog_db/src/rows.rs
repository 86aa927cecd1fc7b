//! `sqlx::FromRow` mappings between catalog tables and domain types.

use crate::error::{DbError, Result};
use canopy_protocol::{Lineage, Product, ProductType, Strain, WeightUnit};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub product_name: String,
    pub vendor: String,
    pub product_type: String,
    pub lineage: String,
    pub brand: Option<String>,
    pub weight_magnitude: Option<f64>,
    pub weight_unit: Option<String>,
    pub price: Option<f64>,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub thca_percent: Option<f64>,
    pub cbda_percent: Option<f64>,
    pub thc_mg: Option<f64>,
    pub cbd_mg: Option<f64>,
    pub ratio: Option<String>,
    pub doh_compliant: i64,
    pub archived: i64,
    pub accepted_date: Option<String>,
    pub expiration_date: Option<String>,
    pub description: Option<String>,
    pub strain_name: Option<String>,
    pub source: Option<String>,
    pub match_score: Option<f64>,
    pub match_confidence: Option<f64>,
    pub extra_json: String,
}

impl ProductRow {
    pub fn into_product(self) -> Result<Product> {
        let extra: BTreeMap<String, String> = serde_json::from_str(&self.extra_json)?;
        Ok(Product {
            product_name: self.product_name,
            vendor: self.vendor,
            product_type: ProductType::parse(&self.product_type).ok_or_else(|| {
                DbError::not_found(format!("unknown product_type {}", self.product_type))
            })?,
            lineage: Lineage::normalize(&self.lineage, Lineage::Mixed),
            brand: self.brand,
            weight_magnitude: self.weight_magnitude,
            weight_unit: self.weight_unit.as_deref().and_then(WeightUnit::parse),
            price: self.price,
            thc_percent: self.thc_percent,
            cbd_percent: self.cbd_percent,
            thca_percent: self.thca_percent,
            cbda_percent: self.cbda_percent,
            thc_mg: self.thc_mg,
            cbd_mg: self.cbd_mg,
            ratio: self.ratio,
            doh_compliant: self.doh_compliant != 0,
            archived: self.archived != 0,
            accepted_date: self.accepted_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            expiration_date: self.expiration_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            description: self.description,
            strain_name: self.strain_name,
            source: self.source,
            match_score: self.match_score,
            match_confidence: self.match_confidence,
            extra,
        })
    }
}

pub fn extra_json(product: &Product) -> Result<String> {
    Ok(serde_json::to_string(&product.extra)?)
}

#[derive(Debug, sqlx::FromRow)]
pub struct StrainRow {
    pub strain_name: String,
    pub canonical_lineage: Option<String>,
    pub sovereign_lineage: Option<String>,
    pub occurrence_count: i64,
    pub first_seen: String,
    pub last_seen: String,
    pub confidence: f64,
}

impl StrainRow {
    pub fn into_strain(self) -> Strain {
        Strain {
            strain_name: self.strain_name,
            canonical_lineage: self.canonical_lineage.map(|l| Lineage::normalize(&l, Lineage::Mixed)),
            sovereign_lineage: self.sovereign_lineage.map(|l| Lineage::normalize(&l, Lineage::Mixed)),
            occurrence_count: self.occurrence_count.max(0) as u64,
            first_seen: parse_timestamp(&self.first_seen),
            last_seen: parse_timestamp(&self.last_seen),
            confidence: self.confidence,
        }
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}
