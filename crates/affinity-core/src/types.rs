//! Shared types used across all Affinity crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a record (source or target of a recommendation).
///
/// Backends hand out integer or string keys; both are carried as text so
/// observation values and record identities compare directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => RecordId::from(n),
            RawId::Text(s) => RecordId(s),
        }
    }
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Text form used for feature concatenation and taxonomy tokens.
    /// Null renders as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(x) => x.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Numeric form used for min-max normalization.
    /// Null, non-numeric text and text naming a non-finite value
    /// (`NaN`, `inf`) read as 0.
    pub fn as_number(&self) -> f64 {
        match self {
            FieldValue::Null => 0.0,
            FieldValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FieldValue::Int(n) => *n as f64,
            FieldValue::Float(x) if x.is_finite() => *x,
            FieldValue::Float(_) => 0.0,
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .unwrap_or(0.0),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Named attribute values of a record or of a related object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(pub BTreeMap<String, FieldValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Attribute as text; absent reads as `""`.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(FieldValue::as_text).unwrap_or_default()
    }

    /// Attribute as a number; absent reads as `0.0`.
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).map(FieldValue::as_number).unwrap_or(0.0)
    }
}

/// Related data attached to a record under a relation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation {
    /// A single related object (belongs-to / has-one).
    One(Attributes),
    /// A collection of related objects (has-many / many-to-many).
    Many(Vec<Attributes>),
}

/// An entity with an identity, named attributes and named relations.
///
/// Absent attributes never fail: they read as `""` or `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relations: BTreeMap<String, Relation>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.0.insert(name.into(), value.into());
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn text(&self, name: &str) -> String {
        self.attributes.text(name)
    }

    pub fn number(&self, name: &str) -> f64 {
        self.attributes.number(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Copy of this record carrying only the named relations.
    pub fn project(&self, relations: &[String]) -> Record {
        Record {
            id: self.id.clone(),
            attributes: self.attributes.clone(),
            relations: self
                .relations
                .iter()
                .filter(|(name, _)| relations.iter().any(|r| r == *name))
                .map(|(name, rel)| (name.clone(), rel.clone()))
                .collect(),
        }
    }
}

/// Where taxonomy tokens for a record come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxonomySource {
    /// The record's own attribute, stringified.
    Scalar { field: String },
    /// A subfield of a single related object.
    SingleRelated { field: String, subfield: String },
    /// A subfield of every member of a related collection.
    CollectionRelated { field: String, subfield: String },
}

impl TaxonomySource {
    /// Relation this source needs loaded, if any.
    pub fn relation(&self) -> Option<&str> {
        match self {
            TaxonomySource::Scalar { .. } => None,
            TaxonomySource::SingleRelated { field, .. }
            | TaxonomySource::CollectionRelated { field, .. } => Some(field),
        }
    }

    /// Tokens contributed by `record`. Missing subfields yield `""`.
    pub fn resolve(&self, record: &Record) -> Vec<String> {
        match self {
            TaxonomySource::Scalar { field } => vec![record.text(field)],
            TaxonomySource::SingleRelated { field, subfield } => match record.relation(field) {
                Some(Relation::One(obj)) => vec![obj.text(subfield)],
                Some(Relation::Many(list)) => {
                    vec![list.first().map(|obj| obj.text(subfield)).unwrap_or_default()]
                }
                None => vec![String::new()],
            },
            TaxonomySource::CollectionRelated { field, subfield } => match record.relation(field) {
                Some(Relation::Many(list)) => list.iter().map(|obj| obj.text(subfield)).collect(),
                Some(Relation::One(obj)) => vec![obj.text(subfield)],
                None => Vec::new(),
            },
        }
    }
}

/// One raw observation row: a data value seen inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub group: String,
    pub data: String,
}

impl Observation {
    pub fn new(group: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            data: data.into(),
        }
    }
}

/// A persisted recommendation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEdge {
    pub source_type: String,
    pub source_id: RecordId,
    pub target_type: String,
    pub target_id: RecordId,
    pub recommendation_name: String,
    /// Count or score; higher is more relevant.
    pub rank: f64,
}

impl RecommendationEdge {
    /// Whether this edge hangs off `(source_type, source_id, recommendation_name)`.
    pub fn belongs_to(&self, source_type: &str, source_id: &RecordId, recommendation_name: &str) -> bool {
        self.source_type == source_type
            && &self.source_id == source_id
            && self.recommendation_name == recommendation_name
    }

    /// Whether two edges collide on the unique key.
    pub fn same_key(&self, other: &RecommendationEdge) -> bool {
        self.source_type == other.source_type
            && self.source_id == other.source_id
            && self.target_type == other.target_type
            && self.recommendation_name == other.recommendation_name
            && self.target_id == other.target_id
    }
}

/// A target with its rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTarget {
    pub id: RecordId,
    pub rank: f64,
}

impl ScoredTarget {
    pub fn new(id: impl Into<RecordId>, rank: f64) -> Self {
        Self { id: id.into(), rank }
    }
}

/// Ranked targets for one source, highest rank first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    pub source: RecordId,
    pub targets: Vec<ScoredTarget>,
}

impl RankedList {
    /// Sort `targets` by rank descending and keep at most `limit`.
    ///
    /// The sort is stable: equal ranks keep their input order. A NaN rank
    /// counts as 0.
    pub fn from_scores(source: RecordId, mut targets: Vec<ScoredTarget>, limit: usize) -> Self {
        for target in &mut targets {
            if target.rank.is_nan() {
                target.rank = 0.0;
            }
        }
        targets.sort_by(|a, b| b.rank.total_cmp(&a.rank));
        targets.truncate(limit);
        Self { source, targets }
    }

    pub fn target_ids(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.id.as_str()).collect()
    }
}
