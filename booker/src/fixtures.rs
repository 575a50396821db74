use crate::{
    error::{DataLoadError, Error},
    model::Booking,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_FIXTURE_DIR: &str = "test-data";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CaseCategory {
    InvalidBooking,
    EdgeCase,
    Security,
}

impl CaseCategory {
    pub const ALL: [CaseCategory; 3] = [
        CaseCategory::InvalidBooking,
        CaseCategory::EdgeCase,
        CaseCategory::Security,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CaseCategory::InvalidBooking => "invalidBookingData",
            CaseCategory::EdgeCase => "edgeCaseData",
            CaseCategory::Security => "securityTestData",
        }
    }
}

impl Display for CaseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One row of a case table: a payload and the status the service must answer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub description: String,
    pub data: Value,
    pub expected_status_code: u16,
}

/// Loads fixtures relative to a root directory.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn booking(&self, name: &str) -> Result<Booking, Error> {
        self.read(self.root.join(name))
    }

    pub fn booking_in_scenario(&self, scenario: &str, name: &str) -> Result<Booking, Error> {
        self.read(self.root.join(scenario).join(name))
    }

    pub fn json(&self, name: &str) -> Result<Value, Error> {
        self.read(self.root.join(name))
    }

    pub fn cases(&self, name: &str, category: CaseCategory) -> Result<Vec<TestCase>, Error> {
        let path = self.root.join(name);
        let document: Value = self.read(&path)?;

        Ok(cases_from(&path, &document, category)?)
    }

    pub fn all_cases(&self, name: &str) -> Result<Vec<(CaseCategory, TestCase)>, Error> {
        let path = self.root.join(name);
        let document: Value = self.read(&path)?;

        let mut all = Vec::new();
        for category in CaseCategory::ALL.iter().copied() {
            if document.get(category.key()).is_none() {
                continue;
            }
            all.extend(
                cases_from(&path, &document, category)?
                    .into_iter()
                    .map(|case| (category, case)),
            );
        }

        Ok(all)
    }

    fn read<T: DeserializeOwned, P: AsRef<Path>>(&self, path: P) -> Result<T, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            tracing::error!(path = %path.display(), "Error loading test data");
            DataLoadError::Unreadable(path.to_path_buf(), e)
        })?;

        let value = serde_json::from_str(&contents)
            .map_err(|e| DataLoadError::Malformed(path.to_path_buf(), e))?;

        tracing::debug!(path = %path.display(), "Loaded test data");
        Ok(value)
    }
}

impl Default for FixtureStore {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_DIR)
    }
}

fn cases_from(
    path: &Path,
    document: &Value,
    category: CaseCategory,
) -> Result<Vec<TestCase>, DataLoadError> {
    let rows = document
        .get(category.key())
        .and_then(Value::as_array)
        .ok_or_else(|| DataLoadError::MissingCategory(path.to_path_buf(), category.key().into()))?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row.clone()).map_err(|_| {
                DataLoadError::MalformedCase(path.to_path_buf(), category.key().into(), index)
            })
        })
        .collect()
}
