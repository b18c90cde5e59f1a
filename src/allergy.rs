use std::fmt;

use serde::{Deserialize, Serialize};

/// Allergies entered by the user, in the order given.
///
/// Entries are trimmed and never empty; case and duplicates are kept.
/// Serialized as a plain array; decoding applies the same trimming.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AllergyList(Vec<String>);

impl AllergyList {
    /// Parses comma-separated input such as `"peanuts, dairy,, gluten "`.
    pub fn parse(input: &str) -> Self {
        Self::from_entries(input.split(','))
    }

    fn from_entries<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            entries
                .into_iter()
                .map(str::trim)
                .filter(|allergy| !allergy.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// The entries in input order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether no allergy was entered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Consumes the list, returning its entries.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for AllergyList {
    fn from(entries: Vec<String>) -> Self {
        Self::from_entries(entries.iter().map(String::as_str))
    }
}

impl From<AllergyList> for Vec<String> {
    fn from(allergies: AllergyList) -> Self {
        allergies.0
    }
}

impl fmt::Display for AllergyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&self.0.join(", "))
        }
    }
}
