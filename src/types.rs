use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// The crime categories tracked per region and year, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Rape,
    Kidnap,
    Dowry,
    Assault,
    Modesty,
    Domestic,
    Trafficking,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Rape,
        Category::Kidnap,
        Category::Dowry,
        Category::Assault,
        Category::Modesty,
        Category::Domestic,
        Category::Trafficking,
    ];

    /// Column name in the statistics store
    pub fn column(self) -> &'static str {
        match self {
            Category::Rape => "rape_cases",
            Category::Kidnap => "kidnap_assault",
            Category::Dowry => "dowry_deaths",
            Category::Assault => "assault_on_women",
            Category::Modesty => "assault_on_modesty",
            Category::Domestic => "domestic_violence",
            Category::Trafficking => "women_trafficking",
        }
    }

    /// Key used inside `crimeBreakdown`
    pub fn breakdown_key(self) -> &'static str {
        match self {
            Category::Rape => "rape",
            Category::Kidnap => "kidnap",
            Category::Dowry => "dowry",
            Category::Assault => "assault",
            Category::Modesty => "modesty",
            Category::Domestic => "domestic",
            Category::Trafficking => "trafficking",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.column() == column)
    }
}

/// One count per category. Field names match the store columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub rape_cases: u64,
    #[serde(default)]
    pub kidnap_assault: u64,
    #[serde(default)]
    pub dowry_deaths: u64,
    #[serde(default)]
    pub assault_on_women: u64,
    #[serde(default)]
    pub assault_on_modesty: u64,
    #[serde(default)]
    pub domestic_violence: u64,
    #[serde(default)]
    pub women_trafficking: u64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Rape => self.rape_cases,
            Category::Kidnap => self.kidnap_assault,
            Category::Dowry => self.dowry_deaths,
            Category::Assault => self.assault_on_women,
            Category::Modesty => self.assault_on_modesty,
            Category::Domestic => self.domestic_violence,
            Category::Trafficking => self.women_trafficking,
        }
    }

    fn slot(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Rape => &mut self.rape_cases,
            Category::Kidnap => &mut self.kidnap_assault,
            Category::Dowry => &mut self.dowry_deaths,
            Category::Assault => &mut self.assault_on_women,
            Category::Modesty => &mut self.assault_on_modesty,
            Category::Domestic => &mut self.domestic_violence,
            Category::Trafficking => &mut self.women_trafficking,
        }
    }

    pub fn with(mut self, category: Category, count: u64) -> Self {
        *self.slot(category) = count;
        self
    }

    /// Adds every category of `other` into `self`, saturating at `u64::MAX`.
    pub fn accumulate(&mut self, other: &CategoryCounts) {
        for category in Category::ALL {
            let slot = self.slot(category);
            *slot = slot.saturating_add(other.get(category));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> u64 {
        self.iter().fold(0u64, |sum, (_, n)| sum.saturating_add(n))
    }
}

/// A single region's counts for one year, as ingested from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "YearlyRow")]
pub struct YearlyRecord {
    #[serde(rename = "state")]
    pub region: String,
    pub year: i32,
    #[serde(flatten)]
    pub counts: CategoryCounts,
}

impl YearlyRecord {
    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}

/// Wire shape of a yearly record: the counts plus the per-year total.
#[derive(Serialize)]
struct YearlyRow {
    state: String,
    year: i32,
    #[serde(flatten)]
    counts: CategoryCounts,
    total_crimes: u64,
}

impl From<YearlyRecord> for YearlyRow {
    fn from(record: YearlyRecord) -> Self {
        let total_crimes = record.total();
        YearlyRow {
            state: record.region,
            year: record.year,
            counts: record.counts,
            total_crimes,
        }
    }
}

/// Percentage share of the region total per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub rape: f64,
    pub kidnap: f64,
    pub dowry: f64,
    pub assault: f64,
    pub modesty: f64,
    pub domestic: f64,
    pub trafficking: f64,
}

impl Breakdown {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Rape => self.rape,
            Category::Kidnap => self.kidnap,
            Category::Dowry => self.dowry,
            Category::Assault => self.assault,
            Category::Modesty => self.modesty,
            Category::Domestic => self.domestic,
            Category::Trafficking => self.trafficking,
        }
    }

    /// Builds a breakdown from values in `Category::ALL` order.
    pub fn from_values(values: [f64; 7]) -> Self {
        let [rape, kidnap, dowry, assault, modesty, domestic, trafficking] = values;
        Breakdown {
            rape,
            kidnap,
            dowry,
            assault,
            modesty,
            domestic,
            trafficking,
        }
    }

    pub fn sum(&self) -> f64 {
        Category::ALL.into_iter().map(|c| self.get(c)).sum()
    }
}

/// Aggregated, ranked view of one region across all loaded years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    #[serde(rename = "state")]
    pub region: String,
    #[serde(flatten)]
    pub category_totals: CategoryCounts,
    #[serde(rename = "total_crimes")]
    pub total: u64,
    pub rank: usize,
    #[serde(rename = "crimeBreakdown")]
    pub breakdown: Breakdown,
}

/// Dataset-wide bounds reported by the overall statistics query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_rape_cases: u64,
    pub total_kidnap_assault: u64,
    pub total_dowry_deaths: u64,
    pub total_assault_on_women: u64,
    pub total_assault_on_modesty: u64,
    pub total_domestic_violence: u64,
    pub total_women_trafficking: u64,
    pub total_states: usize,
    pub start_year: i32,
    pub end_year: i32,
}

impl OverallStats {
    pub fn new(totals: &CategoryCounts, total_states: usize, start_year: i32, end_year: i32) -> Self {
        OverallStats {
            total_rape_cases: totals.rape_cases,
            total_kidnap_assault: totals.kidnap_assault,
            total_dowry_deaths: totals.dowry_deaths,
            total_assault_on_women: totals.assault_on_women,
            total_assault_on_modesty: totals.assault_on_modesty,
            total_domestic_violence: totals.domestic_violence,
            total_women_trafficking: totals.women_trafficking,
            total_states,
            start_year,
            end_year,
        }
    }
}

/// A named boundary polygon from the geometry dataset.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Display name as spelled in the geometry source
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> YearlyRecord {
        YearlyRecord {
            region: "Kerala".to_string(),
            year: 2004,
            counts: CategoryCounts::default()
                .with(Category::Rape, 3)
                .with(Category::Trafficking, 2),
        }
    }

    #[test]
    fn yearly_record_serializes_store_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["state"], "Kerala");
        assert_eq!(json["year"], 2004);
        assert_eq!(json["rape_cases"], 3);
        assert_eq!(json["women_trafficking"], 2);
        assert_eq!(json["dowry_deaths"], 0);
        assert_eq!(json["total_crimes"], 5);
    }

    #[test]
    fn yearly_record_reads_back_its_own_output() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed: YearlyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn summary_uses_crime_breakdown_key() {
        let summary = RegionSummary {
            region: "Goa".to_string(),
            category_totals: CategoryCounts::default().with(Category::Dowry, 4),
            total: 4,
            rank: 1,
            breakdown: Breakdown {
                dowry: 100.0,
                ..Breakdown::default()
            },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["state"], "Goa");
        assert_eq!(json["total_crimes"], 4);
        assert_eq!(json["rank"], 1);
        assert_eq!(json["crimeBreakdown"]["dowry"], 100.0);
        assert_eq!(json["crimeBreakdown"]["trafficking"], 0.0);
    }

    #[test]
    fn huge_counts_saturate_instead_of_wrapping() {
        let half = u64::MAX / 2 + 1;
        let mut counts = CategoryCounts::default().with(Category::Rape, half);
        counts.accumulate(&CategoryCounts::default().with(Category::Rape, half));
        assert_eq!(counts.rape_cases, u64::MAX);

        let wide = CategoryCounts::default()
            .with(Category::Rape, half)
            .with(Category::Dowry, half);
        assert_eq!(wide.total(), u64::MAX);
    }

    #[test]
    fn category_columns_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_column(category.column()), Some(category));
        }
        assert_eq!(Category::from_column("total_crimes"), None);
    }
}
