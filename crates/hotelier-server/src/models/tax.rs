use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxRate {
    #[serde(rename = "_id")]
    pub id: String,
    pub country: String,
    /// Empty for a country-wide rate.
    pub province: String,
    /// Fraction, e.g. `0.13` for 13%.
    pub tax_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxRateInput {
    pub country: String,
    #[serde(default)]
    pub province: String,
    pub tax_rate: f64,
}
