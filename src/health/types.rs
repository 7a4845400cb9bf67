use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Outcome level of a single check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckLevel {
    Pass,
    Warn,
    Fail,
}

impl CheckLevel {
    /// Contribution of a check to the overall score
    pub fn weight(&self) -> f64 {
        match self {
            CheckLevel::Pass => 1.0,
            CheckLevel::Warn => 0.5,
            CheckLevel::Fail => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckLevel::Pass => "PASS",
            CheckLevel::Warn => "WARN",
            CheckLevel::Fail => "FAIL",
        }
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check within a dimension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub level: CheckLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl CheckResult {
    pub fn new(name: &str, level: CheckLevel, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            level,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn pass(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckLevel::Pass, message)
    }

    pub fn warn(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckLevel::Warn, message)
    }

    pub fn fail(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckLevel::Fail, message)
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// All checks of one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionReport {
    pub dimension: String,
    pub description: String,
    pub checks: Vec<CheckResult>,
}

impl DimensionReport {
    pub fn count(&self, level: CheckLevel) -> usize {
        self.checks.iter().filter(|c| c.level == level).count()
    }

    /// `2P / 1W / 0F`
    pub fn summary(&self) -> String {
        format!(
            "{}P / {}W / {}F",
            self.count(CheckLevel::Pass),
            self.count(CheckLevel::Warn),
            self.count(CheckLevel::Fail)
        )
    }
}

impl Serialize for DimensionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DimensionReport", 4)?;
        state.serialize_field("dimension", &self.dimension)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("summary", &self.summary())?;
        state.serialize_field("checks", &self.checks)?;
        state.end()
    }
}

/// Letter grade for a health score
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Grade {
    #[serde(rename = "A (Excellent)")]
    A,
    #[serde(rename = "B (Good)")]
    B,
    #[serde(rename = "C (Fair)")]
    C,
    #[serde(rename = "D (Poor)")]
    D,
    #[serde(rename = "F (Critical)")]
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 75.0 {
            Grade::B
        } else if score >= 60.0 {
            Grade::C
        } else if score >= 40.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "A (Excellent)",
            Grade::B => "B (Good)",
            Grade::C => "C (Fair)",
            Grade::D => "D (Poor)",
            Grade::F => "F (Critical)",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A non-passing check with the dimension it came from
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub dimension: String,
    #[serde(flatten)]
    pub check: CheckResult,
}

/// Main health report structure
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthReport {
    pub report_id: String,
    pub generated_at: String,
    pub score: f64,
    pub grade: Grade,
    pub dimensions: Vec<DimensionReport>,
}

impl HealthReport {
    pub fn new(dimensions: Vec<DimensionReport>) -> Self {
        let score = compute_score(&dimensions);
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            score,
            grade: Grade::from_score(score),
            dimensions,
        }
    }

    pub fn check_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.checks.len()).sum()
    }

    /// Every check at `level`, in dimension order.
    pub fn findings(&self, level: CheckLevel) -> Vec<Finding> {
        self.dimensions
            .iter()
            .flat_map(|d| {
                d.checks
                    .iter()
                    .filter(move |c| c.level == level)
                    .map(move |c| Finding {
                        dimension: d.dimension.clone(),
                        check: c.clone(),
                    })
            })
            .collect()
    }
}

/// Mean check weight scaled to 0..=100; zero when there are no checks.
pub fn compute_score(dimensions: &[DimensionReport]) -> f64 {
    let checks: Vec<&CheckResult> = dimensions.iter().flat_map(|d| &d.checks).collect();
    if checks.is_empty() {
        return 0.0;
    }
    let sum: f64 = checks.iter().map(|c| c.level.weight()).sum();
    sum / checks.len() as f64 * 100.0
}
