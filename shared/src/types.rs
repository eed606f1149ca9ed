//! Core shared types and identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};

/// Roster ids arrive as JSON numbers from clients and as numeric strings
/// from the roster service; both forms are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

fn parse_id(kind: &'static str, input: &str) -> SharedResult<u64> {
    input.trim().parse::<u64>().map_err(|_| SharedError::InvalidId {
        kind,
        input: input.to_string(),
    })
}

fn deserialize_id<'de, D>(kind: &'static str, deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(value) => Ok(value),
        RawId::Text(text) => parse_id(kind, &text).map_err(serde::de::Error::custom),
    }
}

/// Identifier of a person in the remote roster system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId(u64);

impl PersonId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = SharedError;

    fn from_str(s: &str) -> SharedResult<Self> {
        parse_id("person", s).map(Self)
    }
}

impl From<u64> for PersonId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for PersonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PersonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id("person", deserializer).map(Self)
    }
}

/// Identifier of one scheduled occurrence of an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = SharedError;

    fn from_str(s: &str) -> SharedResult<Self> {
        parse_id("instance", s).map(Self)
    }
}

impl From<u64> for InstanceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id("instance", deserializer).map(Self)
    }
}

/// One person in a batch check-in request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinPerson {
    pub person_id: PersonId,
    pub name: String,
    pub code: String,
}

impl CheckinPerson {
    pub fn new(person_id: impl Into<PersonId>, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            person_id: person_id.into(),
            name: name.into(),
            code: code.into(),
        }
    }

    /// Label printed for this person once their check-in succeeds
    pub fn label(&self) -> LabelContent {
        LabelContent::new(self.name.clone()).with_code(self.code.clone())
    }
}

/// Result of one attendance write within a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinOutcome {
    pub person_id: PersonId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckinOutcome {
    pub fn succeeded(person_id: PersonId) -> Self {
        Self {
            person_id,
            success: true,
            error: None,
        }
    }

    pub fn failed(person_id: PersonId, reason: impl Into<String>) -> Self {
        Self {
            person_id,
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Content of a single printed label
///
/// Empty `code`/`extra` strings are treated the same as absent ones, so
/// clients that always send both fields get the layout they expect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelContent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl LabelContent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            extra: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }

    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref().filter(|extra| !extra.is_empty())
    }
}

fn default_true() -> bool {
    true
}

/// Batch check-in request as submitted by a kiosk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCheckinRequest {
    pub instance_id: InstanceId,
    pub people: Vec<CheckinPerson>,
    /// Parent tear-off labels printed after the per-person labels
    #[serde(default)]
    pub extra_labels: Vec<LabelContent>,
    #[serde(default = "default_true")]
    pub print_labels: bool,
}

impl BatchCheckinRequest {
    pub fn new(instance_id: impl Into<InstanceId>, people: Vec<CheckinPerson>) -> Self {
        Self {
            instance_id: instance_id.into(),
            people,
            extra_labels: Vec::new(),
            print_labels: true,
        }
    }

    pub fn with_extra_labels(mut self, extra_labels: Vec<LabelContent>) -> Self {
        self.extra_labels = extra_labels;
        self
    }

    pub fn with_print_labels(mut self, print_labels: bool) -> Self {
        self.print_labels = print_labels;
        self
    }
}

/// Batch check-in response: per-person results plus the print outcome
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCheckinResponse {
    pub results: Vec<CheckinOutcome>,
    pub labels_printed: usize,
}

impl BatchCheckinResponse {
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|outcome| outcome.success).count()
    }
}

/// Reprint request for an arbitrary set of labels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    pub labels: Vec<LabelContent>,
}

/// Family member record flattened from the roster's nested family payload
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub first_name: String,
    pub force_first_name: String,
    pub last_name: String,
    pub role_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_numeric_strings() {
        let from_number: PersonId = serde_json::from_str("42").unwrap();
        let from_text: PersonId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, PersonId::new(42));
        assert_eq!(from_text, PersonId::new(42));

        let bad = serde_json::from_str::<InstanceId>("\"abc\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_ids_serialize_as_strings() {
        let json = serde_json::to_string(&InstanceId::new(7)).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn test_from_str_reports_kind() {
        let err = "x1".parse::<PersonId>().unwrap_err();
        assert_eq!(
            err,
            SharedError::InvalidId {
                kind: "person",
                input: "x1".to_string()
            }
        );
        assert_eq!(" 15 ".parse::<InstanceId>().unwrap(), InstanceId::new(15));
    }

    #[test]
    fn test_label_content_treats_empty_fields_as_absent() {
        let label: LabelContent =
            serde_json::from_str(r#"{"name": "Ada", "code": "", "extra": ""}"#).unwrap();
        assert_eq!(label.code(), None);
        assert_eq!(label.extra(), None);

        let label = LabelContent::new("Parent").with_extra("Ada, Bo");
        assert_eq!(label.extra(), Some("Ada, Bo"));
    }

    #[test]
    fn test_batch_request_defaults() {
        let request: BatchCheckinRequest = serde_json::from_str(
            r#"{"instance_id": "100", "people": [{"person_id": "5", "name": "Ada", "code": "222-2222"}]}"#,
        )
        .unwrap();

        assert!(request.print_labels);
        assert!(request.extra_labels.is_empty());
        assert_eq!(request.instance_id, InstanceId::new(100));
        assert_eq!(request.people[0].person_id, PersonId::new(5));
    }

    #[test]
    fn test_outcome_omits_missing_error() {
        let json = serde_json::to_value(CheckinOutcome::succeeded(PersonId::new(3))).unwrap();
        assert_eq!(json, serde_json::json!({"person_id": "3", "success": true}));
    }
}
