use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::LocalizedContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportRegion {
    Europe,
    Africa,
    Asia,
    MiddleEast,
    Americas,
    Oceania,
    Other,
}

impl ExportRegion {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "europe" | "eu" => ExportRegion::Europe,
            "africa" => ExportRegion::Africa,
            "asia" => ExportRegion::Asia,
            "middle-east" | "middleeast" => ExportRegion::MiddleEast,
            "americas" | "america" => ExportRegion::Americas,
            "oceania" => ExportRegion::Oceania,
            _ => ExportRegion::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportKpis {
    pub tonnage: f64,
    pub countries_served: u32,
    pub producer_partners: u32,
    pub years_active: u32,
    pub traced_lots_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionExports {
    pub region: ExportRegion,
    pub percentage: f64,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDestination {
    pub country: LocalizedContent,
    /// ISO 3166-1 alpha-2, upper case.
    pub code: String,
    pub percentage: f64,
    pub port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyVolume {
    pub month: u32,
    pub year: i32,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMixEntry {
    pub product: LocalizedContent,
    pub slug: String,
    pub volume: f64,
    pub percentage: f64,
    pub color: String,
}

/// The currently published export snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatistics {
    pub last_updated: DateTime<Utc>,
    pub kpis: ExportKpis,
    pub exports_by_region: Vec<RegionExports>,
    pub top_destinations: Vec<TopDestination>,
    pub monthly_volumes: Vec<MonthlyVolume>,
    pub product_mix: Vec<ProductMixEntry>,
}

impl ExportStatistics {
    /// Sum of monthly volumes for one calendar year.
    pub fn volume_for_year(&self, year: i32) -> f64 {
        self.monthly_volumes
            .iter()
            .filter(|entry| entry.year == year)
            .map(|entry| entry.volume)
            .sum()
    }
}
