use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a CSV source: the column names in their original order and a lookup from
/// name to position.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<String>,
    header_map: HashMap<String, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from the header row. Surrounding whitespace is trimmed from each
    /// name.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect();

        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.to_owned(), idx))
            .collect();

        if header_map.len() != headers.len() {
            return Err(MappingError(String::from("Encountered a duplicate header")));
        }

        Ok(Self {
            headers,
            header_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn index(&self, header: &str) -> Option<usize> {
        self.header_map.get(header).copied()
    }

    /// Returns the position of each of `required`, or an error naming every one that is missing.
    pub fn require<const N: usize>(&self, required: [&str; N]) -> Result<[usize; N], MappingError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|h| self.index(h).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MappingError(format!(
                "Missing required column(s): {}",
                missing
                    .iter()
                    .map(|h| format!("'{h}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        let mut out = [0usize; N];
        for (slot, header) in out.iter_mut().zip(required) {
            *slot = self.index(header).unwrap_or_default();
        }
        Ok(out)
    }
}
