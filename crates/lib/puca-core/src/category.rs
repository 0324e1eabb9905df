//! Fixed registry of searchable feature categories.

use std::borrow::Cow;
use std::str::FromStr;
use std::{error::Error, fmt};

/// Every category the server can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Parking,
    Toilets,
    CommunityCentre,
    PostOffice,
    Cafe,
    FastFood,
    School,
    Kindergarten,
    Retail,
    VacantBuilding,
    Defibrillator,
    Pitch,
    FitnessCentre,
    Hotel,
    Museum,
    IrishStreetName,
}

/// How the aggregator formats results for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    Generic,
    Parking,
    VacantBuildings,
    IrishStreetNames,
    Defibrillators,
}

struct CategoryEntry {
    category: Category,
    name: &'static str,
    filter: &'static str,
    label: &'static str,
}

const CATEGORY_TABLE: &[CategoryEntry] = &[
    CategoryEntry {
        category: Category::Parking,
        name: "parking",
        filter: r#"nwr["amenity"="parking"]"#,
        label: "parking amenities",
    },
    CategoryEntry {
        category: Category::Toilets,
        name: "toilets",
        filter: r#"nwr["amenity"="toilets"]"#,
        label: "toilets",
    },
    CategoryEntry {
        category: Category::CommunityCentre,
        name: "community_centre",
        filter: r#"nwr["amenity"="community_centre"]"#,
        label: "community centres",
    },
    CategoryEntry {
        category: Category::PostOffice,
        name: "post_office",
        filter: r#"nwr["amenity"="post_office"]"#,
        label: "post offices",
    },
    CategoryEntry {
        category: Category::Cafe,
        name: "cafe",
        filter: r#"nwr["amenity"="cafe"]"#,
        label: "cafes",
    },
    CategoryEntry {
        category: Category::FastFood,
        name: "fast_food",
        filter: r#"nwr["amenity"="fast_food"]"#,
        label: "fast food places",
    },
    CategoryEntry {
        category: Category::School,
        name: "school",
        filter: r#"nwr["building"="school"]"#,
        label: "school buildings",
    },
    CategoryEntry {
        category: Category::Kindergarten,
        name: "kindergarten",
        filter: r#"nwr["building"="kindergarten"]"#,
        label: "kindergarten buildings",
    },
    CategoryEntry {
        category: Category::Retail,
        name: "retail",
        filter: r#"nwr["building"="retail"]"#,
        label: "retail buildings",
    },
    CategoryEntry {
        category: Category::VacantBuilding,
        name: "vacant_building",
        filter: r#"nwr["building"]["vacant"="yes"]"#,
        label: "vacant buildings",
    },
    CategoryEntry {
        category: Category::Defibrillator,
        name: "defibrillator",
        filter: r#"node["emergency"="defibrillator"]"#,
        label: "defibrillators",
    },
    CategoryEntry {
        category: Category::Pitch,
        name: "pitch",
        filter: r#"nwr["leisure"="pitch"]"#,
        label: "pitches",
    },
    CategoryEntry {
        category: Category::FitnessCentre,
        name: "fitness_centre",
        filter: r#"nwr["leisure"="fitness_centre"]"#,
        label: "fitness centres",
    },
    CategoryEntry {
        category: Category::Hotel,
        name: "hotel",
        filter: r#"nwr["tourism"="hotel"]"#,
        label: "hotels",
    },
    CategoryEntry {
        category: Category::Museum,
        name: "museum",
        filter: r#"nwr["tourism"="museum"]"#,
        label: "museums",
    },
    CategoryEntry {
        category: Category::IrishStreetName,
        name: "irish_street_name",
        filter: r#"way["name:ga"]"#,
        label: "thoroughfares with an Irish name",
    },
];

impl Category {
    pub fn all() -> impl Iterator<Item = Self> {
        CATEGORY_TABLE.iter().map(|entry| entry.category)
    }

    // Table rows are declared in variant order.
    const fn entry(self) -> &'static CategoryEntry {
        &CATEGORY_TABLE[self as usize]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.entry().name
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.entry().label
    }

    #[must_use]
    pub fn filter(self) -> FilterFragment {
        FilterFragment(Cow::Borrowed(self.entry().filter))
    }

    #[must_use]
    pub const fn style(self) -> ReportStyle {
        match self {
            Self::Parking => ReportStyle::Parking,
            Self::VacantBuilding => ReportStyle::VacantBuildings,
            Self::IrishStreetName => ReportStyle::IrishStreetNames,
            Self::Defibrillator => ReportStyle::Defibrillators,
            _ => ReportStyle::Generic,
        }
    }

    #[must_use]
    pub const fn requires_enrichment(self) -> bool {
        matches!(self, Self::Defibrillator)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CATEGORY_TABLE
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.category)
            .ok_or_else(|| CategoryError::Unknown(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    Unknown(String),
    InvalidFilter(String),
}

impl fmt::Display for CategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => {
                let known: Vec<&str> = CATEGORY_TABLE.iter().map(|entry| entry.name).collect();
                write!(
                    f,
                    "Unknown category '{name}'. Valid categories are: {}.",
                    known.join(", ")
                )
            }
            Self::InvalidFilter(message) => write!(f, "Invalid query filter: {message}"),
        }
    }
}

impl Error for CategoryError {}

/// Tag filter placed inside the spatial query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFragment(Cow<'static, str>);

impl FilterFragment {
    /// Accepts a caller-supplied filter such as `nwr["building"="school"]`.
    ///
    /// # Errors
    /// Returns `CategoryError::InvalidFilter` for a blank filter or one that
    /// would terminate the templated statement early.
    pub fn raw(filter: &str) -> Result<Self, CategoryError> {
        let trimmed = filter.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::InvalidFilter(
                "the query must not be empty".to_string(),
            ));
        }
        if trimmed.contains(';') {
            return Err(CategoryError::InvalidFilter(
                "only the search terms are needed, without ';' (e.g. nwr[\"building\"=\"school\"])"
                    .to_string(),
            ));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Looks up the filter fragment for a category name.
///
/// # Errors
/// Returns `CategoryError::Unknown` carrying the name when it is not in the table.
pub fn resolve_filter(name: &str) -> Result<FilterFragment, CategoryError> {
    name.parse::<Category>().map(Category::filter)
}
