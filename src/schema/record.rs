//! Evaluation record types.
//!
//! One record is written per evaluated solution. [`EvaluationRecord`] mirrors
//! the JSON document on disk; [`Individual`] is the typed form decoded once at
//! ingestion, with each metric tagged by what it is (objective, constraint or
//! plain metric).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Direction in which an objective improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Minimize,
    Maximize,
}

impl Orientation {
    /// Orientation implied by a record's `minimise` flag.
    pub fn from_minimise(minimise: bool) -> Self {
        if minimise { Self::Minimize } else { Self::Maximize }
    }

    /// Map a raw value onto "lower is better".
    #[inline]
    pub fn orient(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }

    /// Short label used in column names and messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Minimize => "min",
            Self::Maximize => "max",
        }
    }
}

/// Identifier of one independent search run.
///
/// Seeds arrive as numbers or strings; both are kept in textual form.
/// Numeric identifiers order numerically so that `"2" < "10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedId(String);

impl SeedId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode a seed from a JSON value. `null` means no seed.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self(s.clone())),
            other => Some(Self(other.to_string())),
        }
    }
}

impl Ord for SeedId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Integer ids sort numerically and ahead of all other ids.
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SeedId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// A decision variable as stored in a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableRecord {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bounds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bounds: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A metric as stored in a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub dataframe: Option<Value>,
    #[serde(default)]
    pub objective: bool,
    #[serde(default)]
    pub constraint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimise: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One evaluated solution as written by the search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
    pub metrics: Vec<MetricRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_seed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_id: Option<Value>,
    /// Fields this crate does not interpret, kept for round-trip export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Typed form
// ============================================================================

/// What a metric is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Objective(Orientation),
    Constraint,
    Plain,
}

/// A decoded metric.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub value: Option<f64>,
    pub kind: MetricKind,
    pub dataframe: Option<Value>,
    pub extra: Map<String, Value>,
}

/// A decoded decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub extra: Map<String, Value>,
}

/// One evaluation result, immutable after decoding.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Record identity (file stem or document id).
    pub id: String,
    pub evaluated_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub seed: Option<SeedId>,
    pub search_id: Option<String>,
    pub metrics: Vec<Metric>,
    pub variables: Vec<Variable>,
    pub extra: Map<String, Value>,
}

/// Names and orientation of the objectives tracked by a search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectiveSchema {
    pub names: Vec<String>,
    pub orientation: Vec<Orientation>,
}

impl ObjectiveSchema {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fail unless `other` tracks the same objectives in the same order.
    pub fn check(&self, other: &ObjectiveSchema) -> Result<(), RecordError> {
        if self == other {
            Ok(())
        } else {
            Err(RecordError::SchemaMismatch {
                expected: self.to_string(),
                found: other.to_string(),
            })
        }
    }
}

impl fmt::Display for ObjectiveSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, o)) in self.names.iter().zip(&self.orientation).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", name, o.label())?;
        }
        write!(f, "]")
    }
}

impl Individual {
    /// Decode a record. Fails if it cannot take part in dominance comparison.
    pub fn from_record(id: impl Into<String>, record: EvaluationRecord) -> Result<Self, RecordError> {
        let evaluated_at = record
            .evaluated_at
            .as_deref()
            .ok_or_else(|| RecordError::MissingField("evaluated_at".to_string()))
            .and_then(|raw| parse_timestamp("evaluated_at", raw))?;
        let created_at = record
            .created_at
            .as_deref()
            .map(|raw| parse_timestamp("created_at", raw))
            .transpose()?;

        let mut metrics = Vec::with_capacity(record.metrics.len());
        for m in record.metrics {
            let kind = if m.objective {
                let minimise = m
                    .minimise
                    .ok_or_else(|| RecordError::MissingField(format!("{}.minimise", m.name)))?;
                if !m.value.is_some_and(f64::is_finite) {
                    return Err(RecordError::InvalidObjective { name: m.name });
                }
                MetricKind::Objective(Orientation::from_minimise(minimise))
            } else if m.constraint {
                MetricKind::Constraint
            } else {
                MetricKind::Plain
            };
            metrics.push(Metric {
                name: m.name,
                value: m.value,
                kind,
                dataframe: m.dataframe,
                extra: m.extra,
            });
        }

        if !metrics
            .iter()
            .any(|m| matches!(m.kind, MetricKind::Objective(_)))
        {
            return Err(RecordError::NoObjectives);
        }

        let variables = record
            .variables
            .into_iter()
            .map(|v| Variable {
                name: v.name,
                value: v.value,
                lower_bound: v.lower_bounds,
                upper_bound: v.upper_bounds,
                extra: v.extra,
            })
            .collect();

        Ok(Self {
            id: id.into(),
            evaluated_at,
            created_at,
            seed: record.search_seed.as_ref().and_then(SeedId::from_value),
            search_id: record.search_id.as_ref().and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
            metrics,
            variables,
            extra: record.extra,
        })
    }

    /// Parse and decode a JSON document.
    pub fn from_json_str(id: impl Into<String>, json: &str) -> Result<Self, RecordError> {
        let record: EvaluationRecord = serde_json::from_str(json)?;
        Self::from_record(id, record)
    }

    /// Re-encode into the wire shape, including preserved unknown fields.
    pub fn to_record(&self) -> EvaluationRecord {
        EvaluationRecord {
            variables: self
                .variables
                .iter()
                .map(|v| VariableRecord {
                    name: v.name.clone(),
                    value: v.value,
                    upper_bounds: v.upper_bound,
                    lower_bounds: v.lower_bound,
                    extra: v.extra.clone(),
                })
                .collect(),
            metrics: self
                .metrics
                .iter()
                .map(|m| MetricRecord {
                    name: m.name.clone(),
                    value: m.value,
                    dataframe: m.dataframe.clone(),
                    objective: matches!(m.kind, MetricKind::Objective(_)),
                    constraint: m.kind == MetricKind::Constraint,
                    minimise: match m.kind {
                        MetricKind::Objective(o) => Some(o == Orientation::Minimize),
                        _ => None,
                    },
                    extra: m.extra.clone(),
                })
                .collect(),
            created_at: self
                .created_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            evaluated_at: Some(
                self.evaluated_at
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            search_seed: self.seed.as_ref().map(|s| Value::String(s.0.clone())),
            search_id: self.search_id.clone().map(Value::String),
            extra: self.extra.clone(),
        }
    }

    fn objectives(&self) -> impl Iterator<Item = (&Metric, Orientation)> {
        self.metrics.iter().filter_map(|m| match m.kind {
            MetricKind::Objective(o) => Some((m, o)),
            _ => None,
        })
    }

    /// Objective names and orientation, in record order.
    pub fn schema(&self) -> ObjectiveSchema {
        let (names, orientation) = self
            .objectives()
            .map(|(m, o)| (m.name.clone(), o))
            .unzip();
        ObjectiveSchema { names, orientation }
    }

    /// Raw objective values, in record order.
    pub fn objective_values(&self) -> Vec<f64> {
        // Objective values are checked finite at decode time.
        self.objectives()
            .map(|(m, _)| m.value.unwrap_or(f64::NAN))
            .collect()
    }

    /// Objective values mapped onto "lower is better".
    pub fn oriented_objectives(&self) -> Vec<f64> {
        self.objectives()
            .map(|(m, o)| o.orient(m.value.unwrap_or(f64::NAN)))
            .collect()
    }

    /// Constraint values; missing values are reported as `None`.
    pub fn constraint_values(&self) -> Vec<Option<f64>> {
        self.metrics
            .iter()
            .filter(|m| m.kind == MetricKind::Constraint)
            .map(|m| m.value)
            .collect()
    }

    pub fn variable_values(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.value).collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

/// Sort into evaluation order, ties broken by record id.
pub fn sort_by_evaluation(individuals: &mut [Individual]) {
    individuals.sort_by(|a, b| {
        a.evaluated_at
            .cmp(&b.evaluated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub(crate) fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Timestamps without an offset are taken as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(RecordError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

/// Errors decoding a single record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing required field `{0}`")]
    MissingField(String),
    #[error("Field `{field}` is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("Objective `{name}` has no finite value")]
    InvalidObjective { name: String },
    #[error("Record has no objectives")]
    NoObjectives,
    #[error("Objective schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },
}
