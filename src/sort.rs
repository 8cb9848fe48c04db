use crate::error::{CrimeMapError, CrimeMapResult};
use crate::types::{Category, RegionSummary, YearlyRecord};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = CrimeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(CrimeMapError::UnknownDirection(other.to_string())),
        }
    }
}

/// A column always yields the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Number(i128),
    Text(&'a str),
}

pub trait Column: Copy + Eq + Debug + 'static {
    const ALL: &'static [Self];

    /// Column key as it appears in JSON and query strings
    fn key(self) -> &'static str;

    fn default_spec() -> SortSpec<Self>;

    fn parse(key: &str) -> CrimeMapResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .ok_or_else(|| CrimeMapError::UnknownColumn(key.to_string()))
    }
}

pub trait Sortable {
    type Column: Column;

    fn sort_value(&self, column: Self::Column) -> SortValue<'_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec<C: Column> {
    #[serde(serialize_with = "serialize_column")]
    pub key: C,
    pub direction: SortDirection,
}

fn serialize_column<C: Column, S: Serializer>(column: &C, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(column.key())
}

impl<C: Column> SortSpec<C> {
    pub fn new(key: C, direction: SortDirection) -> Self {
        SortSpec { key, direction }
    }

    /// A key without a direction sorts ascending.
    pub fn parse(key: Option<&str>, direction: Option<&str>) -> CrimeMapResult<Self> {
        let default = C::default_spec();
        let key = match key {
            Some(k) => C::parse(k)?,
            None => default.key,
        };
        let direction = match direction {
            Some(d) => d.parse()?,
            None if key == default.key => default.direction,
            None => SortDirection::Ascending,
        };
        Ok(SortSpec { key, direction })
    }
}

#[derive(Debug, Clone)]
pub struct SortModel<C: Column> {
    spec: SortSpec<C>,
}

impl<C: Column> SortModel<C> {
    pub fn new(spec: SortSpec<C>) -> Self {
        SortModel { spec }
    }

    pub fn spec(&self) -> SortSpec<C> {
        self.spec
    }

    /// Same key flips the direction; a new key starts ascending.
    pub fn toggle(&mut self, key: C) -> SortSpec<C> {
        self.spec = if self.spec.key == key {
            SortSpec::new(key, self.spec.direction.flipped())
        } else {
            SortSpec::new(key, SortDirection::Ascending)
        };
        self.spec
    }

    pub fn apply<T>(&self, rows: &[T]) -> Vec<T>
    where
        T: Sortable<Column = C> + Clone,
    {
        apply(rows, self.spec)
    }
}

impl<C: Column> Default for SortModel<C> {
    fn default() -> Self {
        Self::new(C::default_spec())
    }
}

/// Stable sort of `rows` by `spec`. Rows with equal keys keep their input
/// order in both directions.
pub fn apply<T>(rows: &[T], spec: SortSpec<T::Column>) -> Vec<T>
where
    T: Sortable + Clone,
{
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let ord: Ordering = a.sort_value(spec.key).cmp(&b.sort_value(spec.key));
        match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearColumn {
    Year,
    Count(Category),
    Total,
}

impl Column for YearColumn {
    const ALL: &'static [Self] = &[
        YearColumn::Year,
        YearColumn::Count(Category::Rape),
        YearColumn::Count(Category::Kidnap),
        YearColumn::Count(Category::Dowry),
        YearColumn::Count(Category::Assault),
        YearColumn::Count(Category::Modesty),
        YearColumn::Count(Category::Domestic),
        YearColumn::Count(Category::Trafficking),
        YearColumn::Total,
    ];

    fn key(self) -> &'static str {
        match self {
            YearColumn::Year => "year",
            YearColumn::Count(category) => category.column(),
            YearColumn::Total => "total_crimes",
        }
    }

    fn default_spec() -> SortSpec<Self> {
        SortSpec::new(YearColumn::Year, SortDirection::Descending)
    }
}

impl Sortable for YearlyRecord {
    type Column = YearColumn;

    fn sort_value(&self, column: YearColumn) -> SortValue<'_> {
        match column {
            YearColumn::Year => SortValue::Number(self.year as i128),
            YearColumn::Count(category) => SortValue::Number(self.counts.get(category) as i128),
            YearColumn::Total => SortValue::Number(self.total() as i128),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionColumn {
    State,
    Count(Category),
    Total,
    Rank,
}

impl Column for RegionColumn {
    const ALL: &'static [Self] = &[
        RegionColumn::State,
        RegionColumn::Count(Category::Rape),
        RegionColumn::Count(Category::Kidnap),
        RegionColumn::Count(Category::Dowry),
        RegionColumn::Count(Category::Assault),
        RegionColumn::Count(Category::Modesty),
        RegionColumn::Count(Category::Domestic),
        RegionColumn::Count(Category::Trafficking),
        RegionColumn::Total,
        RegionColumn::Rank,
    ];

    fn key(self) -> &'static str {
        match self {
            RegionColumn::State => "state",
            RegionColumn::Count(category) => category.column(),
            RegionColumn::Total => "total_crimes",
            RegionColumn::Rank => "rank",
        }
    }

    /// Highest total first, i.e. rank order.
    fn default_spec() -> SortSpec<Self> {
        SortSpec::new(RegionColumn::Total, SortDirection::Descending)
    }
}

impl Sortable for RegionSummary {
    type Column = RegionColumn;

    fn sort_value(&self, column: RegionColumn) -> SortValue<'_> {
        match column {
            RegionColumn::State => SortValue::Text(&self.region),
            RegionColumn::Count(category) => {
                SortValue::Number(self.category_totals.get(category) as i128)
            }
            RegionColumn::Total => SortValue::Number(self.total as i128),
            RegionColumn::Rank => SortValue::Number(self.rank as i128),
        }
    }
}
