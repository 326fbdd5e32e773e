use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::TypeError;

/// In-memory code for a missing factor entry.
pub const MISSING_CODE: i32 = -1;

/// Categorical vector: integer codes indexing into a level dictionary.
///
/// Every non-missing code is a valid index into `levels`; missing entries
/// carry [`MISSING_CODE`]. Levels are unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factor {
    codes: Vec<i32>,
    levels: Vec<String>,
    ordered: bool,
    names: Option<Vec<String>>,
}

impl Factor {
    /// Create a factor from codes and levels, validating both.
    pub fn new(codes: Vec<i32>, levels: Vec<String>, ordered: bool) -> Result<Self, TypeError> {
        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if !seen.insert(level.as_str()) {
                return Err(TypeError::DuplicateLevel(level.clone()));
            }
        }
        for (index, &code) in codes.iter().enumerate() {
            if code != MISSING_CODE && (code < 0 || code as usize >= levels.len()) {
                return Err(TypeError::InvalidFactorCode {
                    index,
                    code,
                    levels: levels.len(),
                });
            }
        }
        Ok(Self {
            codes,
            levels,
            ordered,
            names: None,
        })
    }

    /// Build a factor from string values. Levels are the sorted unique
    /// non-missing values.
    pub fn from_values<S: AsRef<str>>(values: &[Option<S>], ordered: bool) -> Self {
        let levels: Vec<String> = values
            .iter()
            .flatten()
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lookup: HashMap<&str, i32> = levels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i as i32))
            .collect();
        let codes = values
            .iter()
            .map(|v| match v {
                Some(s) => lookup[s.as_ref()],
                None => MISSING_CODE,
            })
            .collect();
        Self {
            codes,
            levels,
            ordered,
            names: None,
        }
    }

    /// Attach element names.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, TypeError> {
        if names.len() != self.codes.len() {
            return Err(TypeError::LengthMismatch {
                what: "factor names",
                expected: self.codes.len(),
                actual: names.len(),
            });
        }
        self.names = Some(names);
        Ok(self)
    }

    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        self.codes.contains(&MISSING_CODE)
    }

    /// Expand codes into their level strings.
    pub fn to_values(&self) -> Vec<Option<String>> {
        self.codes
            .iter()
            .map(|&c| {
                if c == MISSING_CODE {
                    None
                } else {
                    Some(self.levels[c as usize].clone())
                }
            })
            .collect()
    }
}
