use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{
    client::{PipedriveAuth, PipedriveClient, PipedriveError},
    fields::{transform_custom_fields, GetField},
};
use crate::info;
use crate::telemetry::LogKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum VisibleTo {
    ItemOwner,
    AllUsers,
}

impl VisibleTo {
    pub fn code(self) -> u8 {
        match self {
            VisibleTo::ItemOwner => 1,
            VisibleTo::AllUsers => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketingStatus {
    NoConsent,
    Unsubscribed,
    Subscribed,
    Archived,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreatePersonProps {
    pub name: String,
    pub owner_id: Option<i64>,
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub email: Vec<String>,
    #[serde(default)]
    pub phone: Vec<String>,
    #[serde(default)]
    pub label_ids: Vec<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub visible_to: Option<VisibleTo>,
    pub marketing_status: Option<MarketingStatus>,
    // Keyed by the field hash Pipedrive assigns to each custom field.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

fn insert_some<T: Serialize>(body: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value.and_then(|v| serde_json::to_value(v).ok()) {
        body.insert(key.to_string(), value);
    }
}

fn flatten_custom_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => other.clone(),
    }
}

impl CreatePersonProps {
    /// Request body for `POST /persons`. Custom fields win over default
    /// fields sharing a key.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(self.name.clone()));
        insert_some(&mut body, "owner_id", self.owner_id);
        insert_some(&mut body, "org_id", self.organization_id);
        insert_some(&mut body, "marketing_status", self.marketing_status);
        insert_some(&mut body, "visible_to", self.visible_to.map(VisibleTo::code));
        insert_some(&mut body, "first_name", self.first_name.as_ref());
        insert_some(&mut body, "last_name", self.last_name.as_ref());
        if !self.phone.is_empty() {
            insert_some(&mut body, "phone", Some(&self.phone));
        }
        if !self.email.is_empty() {
            insert_some(&mut body, "email", Some(&self.email));
        }
        if !self.label_ids.is_empty() {
            insert_some(&mut body, "label_ids", Some(&self.label_ids));
        }
        for (key, value) in &self.custom_fields {
            body.insert(key.clone(), flatten_custom_value(value));
        }
        Value::Object(body)
    }
}

/// Create a person, then return Pipedrive's response with its `data`
/// keyed by custom field names instead of hashes.
pub async fn create_person(
    auth: &PipedriveAuth,
    props: &CreatePersonProps,
) -> Result<Value, PipedriveError> {
    let client = PipedriveClient::new(auth);
    let mut created: Value = client
        .api_call(Method::POST, "/persons", &[], Some(&props.body()))
        .await?;
    let fields: Vec<GetField> = client.paginated_api_call("/personFields", &[]).await?;
    if let Value::Object(response) = &mut created {
        let data = response.remove("data").unwrap_or(Value::Null);
        response.insert(
            "data".to_string(),
            transform_custom_fields(&fields, data),
        );
    }
    info!(
        LogKey::PipedrivePersonCreated,
        person_id = ?created.get("data").and_then(|d| d.get("id")),
        "Created Pipedrive person"
    );
    Ok(created)
}
