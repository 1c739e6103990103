use serde::{Deserialize, Serialize};

/// Sort direction for a column.
///
/// `Natural` is the empty direction: rows return to their ingestion order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
    #[serde(rename = "")]
    Natural,
}

impl SortDirection {
    /// Parse the wire/attribute form (`"asc"`, `"desc"` or `""`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            "" => Some(Self::Natural),
            _ => None,
        }
    }

    /// The wire/attribute form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Natural => "",
        }
    }

    /// Next direction when a header is activated: asc, desc, natural, asc...
    #[must_use]
    pub fn cycle(current: Option<Self>) -> Self {
        match current {
            Some(Self::Asc) => Self::Desc,
            Some(Self::Desc) => Self::Natural,
            Some(Self::Natural) | None => Self::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
