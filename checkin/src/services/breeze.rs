//! Breeze ChMS adapter for attendance and roster lookups

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::time::Duration;

use shared::logging::Component;
use shared::{FamilyMember, InstanceId, PersonId, checkin_debug, checkin_warn};

use crate::config::{DEFAULT_HTTP_TIMEOUT_SECS, KioskConfig};
use crate::error::{CheckinError, CheckinResult};
use crate::traits::{AttendanceGateway, RosterDirectory};

/// Header carrying the account API key
pub const API_KEY_HEADER: &str = "Api-Key";

/// Whether an attendance write was accepted
///
/// The roster answers with a JSON `true` or the string `"true"`; anything
/// else is a refusal.
pub fn is_truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true)) || value.as_str() == Some("true")
}

fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_u64() != Some(0) => Some(number.to_string()),
        _ => None,
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Flatten raw family records into [`FamilyMember`]s
///
/// The member id comes from `person_id`, then `details.id`, then `id`.
pub fn normalize_family(raw_family: &[Value]) -> Vec<FamilyMember> {
    raw_family
        .iter()
        .map(|member| {
            let details = member.get("details");
            let detail = |key: &str| field_text(details.and_then(|d| d.get(key)));

            FamilyMember {
                id: id_text(member.get("person_id"))
                    .or_else(|| id_text(details.and_then(|d| d.get("id"))))
                    .or_else(|| id_text(member.get("id")))
                    .unwrap_or_default(),
                first_name: detail("first_name"),
                force_first_name: detail("force_first_name"),
                last_name: detail("last_name"),
                role_name: field_text(member.get("role_name")),
            }
        })
        .collect()
}

fn into_list(value: Value, endpoint: &str) -> CheckinResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(CheckinError::gateway(format!(
            "{endpoint} returned {} instead of a list",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// HTTP client for one Breeze account
///
/// Holds a single connection pool reused by every call.
#[derive(Clone, Debug)]
pub struct BreezeClient {
    client: Client,
    api_url: String,
    ajax_url: String,
}

impl BreezeClient {
    /// Client for `https://{subdomain}.breezechms.com` with the default timeout
    pub fn new(subdomain: &str, api_key: &str) -> CheckinResult<Self> {
        Self::with_base_urls(
            format!("https://{subdomain}.breezechms.com/api"),
            format!("https://{subdomain}.breezechms.com/ajax"),
            api_key,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    pub fn from_config(config: &KioskConfig) -> CheckinResult<Self> {
        Self::with_base_urls(
            config.api_base_url(),
            config.ajax_base_url(),
            &config.breeze_api_key,
            config.http_timeout,
        )
    }

    /// Client against explicit base URLs, used for staging hosts and tests
    pub fn with_base_urls(
        api_url: impl Into<String>,
        ajax_url: impl Into<String>,
        api_key: &str,
        timeout: Duration,
    ) -> CheckinResult<Self> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| CheckinError::config("breeze_api_key", "contains characters not allowed in a header"))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            ajax_url: ajax_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Issue one API call and parse the JSON body
    async fn request(&self, method: Method, endpoint: &str, query: &[(&str, String)]) -> CheckinResult<Value> {
        let url = format!("{}/{}", self.api_url, endpoint);
        checkin_debug!(Component::Gateway, "{} {}", method, endpoint);

        let mut builder = self.client.request(method, &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckinError::gateway(format!("{endpoint} returned {status}")));
        }

        Ok(response.json().await?)
    }

    async fn attendance_write(&self, action: &str, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        let endpoint = format!("events/attendance/{action}");
        let result = self
            .request(
                Method::POST,
                &endpoint,
                &[
                    ("instance_id", instance_id.to_string()),
                    ("person_id", person_id.to_string()),
                ],
            )
            .await?;
        Ok(is_truthy(&result))
    }

    async fn raw_family(&self, person_id: PersonId) -> CheckinResult<Vec<Value>> {
        let result = self
            .request(Method::GET, &format!("people/{person_id}"), &[])
            .await?;

        Ok(match result {
            Value::Object(mut person) => match person.remove("family") {
                Some(Value::Array(family)) => family,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        })
    }

    async fn search_checkin_people(&self, query: &str) -> CheckinResult<Vec<Value>> {
        let url = format!("{}/search_checkin_people", self.ajax_url);
        let response = self
            .client
            .post(&url)
            .form(&[("query", query)])
            .send()
            .await?
            .error_for_status()?;

        into_list(response.json().await?, "search_checkin_people")
    }
}

#[async_trait]
impl AttendanceGateway for BreezeClient {
    async fn add_attendance(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        self.attendance_write("add", instance_id, person_id).await
    }

    async fn remove_attendance(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        self.attendance_write("delete", instance_id, person_id).await
    }

    async fn list_attendance(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        let result = self
            .request(
                Method::POST,
                "events/attendance/list",
                &[("instance_id", instance_id.to_string())],
            )
            .await?;
        into_list(result, "events/attendance/list")
    }

    async fn eligible_people(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        let result = self
            .request(
                Method::POST,
                "events/attendance/eligible",
                &[("instance_id", instance_id.to_string())],
            )
            .await?;
        into_list(result, "events/attendance/eligible")
    }
}

#[async_trait]
impl RosterDirectory for BreezeClient {
    async fn events(&self, start: Option<String>, end: Option<String>) -> CheckinResult<Vec<Value>> {
        let query: Vec<(&str, String)> = [("start", start), ("end", end)]
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
            .collect();

        let result = self.request(Method::GET, "events", &query).await?;
        into_list(result, "events")
    }

    async fn event_instances(&self, event_id: &str) -> CheckinResult<Vec<Value>> {
        let result = self
            .request(
                Method::GET,
                "events",
                &[("details", "1".to_string()), ("event_id", event_id.to_string())],
            )
            .await?;
        into_list(result, "events")
    }

    async fn person(&self, person_id: PersonId) -> CheckinResult<Value> {
        let filter = json!({ "id": person_id.to_string() }).to_string();
        let result = self
            .request(
                Method::GET,
                "people",
                &[("details", "1".to_string()), ("filter_json", filter)],
            )
            .await?;

        Ok(match result {
            Value::Array(mut people) if !people.is_empty() => people.swap_remove(0),
            other => other,
        })
    }

    async fn family(&self, person_id: PersonId) -> CheckinResult<Vec<FamilyMember>> {
        Ok(normalize_family(&self.raw_family(person_id).await?))
    }

    async fn person_with_family(&self, person_id: PersonId) -> CheckinResult<Value> {
        let mut person = self.person(person_id).await?;
        let family = self.raw_family(person_id).await?;

        match person.as_object_mut() {
            Some(record) => {
                record.insert("family".to_string(), Value::Array(family));
                Ok(person)
            }
            None => Err(CheckinError::gateway(format!("person {person_id} not found"))),
        }
    }

    async fn search_people(&self, query: &str) -> CheckinResult<Vec<Value>> {
        match self.search_checkin_people(query).await {
            Ok(people) => Ok(people),
            Err(e) => {
                checkin_warn!(Component::Gateway, "Check-in search failed, falling back to people filter: {}", e);
                let filter = json!({ "name": query }).to_string();
                let result = self
                    .request(
                        Method::GET,
                        "people",
                        &[("details", "0".to_string()), ("filter_json", filter)],
                    )
                    .await?;
                into_list(result, "people")
            }
        }
    }
}
