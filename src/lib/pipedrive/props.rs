use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{
    client::{PipedriveAuth, PipedriveClient, PipedriveError},
    fields::{GetField, OptionId},
};

const CONNECT_PLACEHOLDER: &str = "Please connect your account.";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DropdownOption {
    pub label: String,
    pub value: OptionId,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DropdownState {
    pub disabled: bool,
    pub options: Vec<DropdownOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl DropdownState {
    pub fn disconnected() -> DropdownState {
        DropdownState {
            disabled: true,
            options: vec![],
            placeholder: Some(CONNECT_PLACEHOLDER.to_string()),
        }
    }

    fn ready(options: Vec<DropdownOption>) -> DropdownState {
        DropdownState {
            disabled: false,
            options,
            placeholder: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Named {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Option<Vec<T>>,
}

fn named_options(items: Vec<Named>) -> Vec<DropdownOption> {
    items
        .into_iter()
        .map(|item| DropdownOption {
            label: item.name,
            value: OptionId::Int(item.id),
        })
        .collect()
}

pub async fn owners(auth: Option<&PipedriveAuth>) -> Result<DropdownState, PipedriveError> {
    let auth = match auth {
        Some(auth) => auth,
        None => return Ok(DropdownState::disconnected()),
    };
    let users: ListResponse<Named> = PipedriveClient::new(auth)
        .api_call(Method::GET, "/users", &[], None)
        .await?;
    Ok(DropdownState::ready(named_options(
        users.data.unwrap_or_default(),
    )))
}

pub async fn organizations(auth: Option<&PipedriveAuth>) -> Result<DropdownState, PipedriveError> {
    let auth = match auth {
        Some(auth) => auth,
        None => return Ok(DropdownState::disconnected()),
    };
    let organizations: Vec<Named> = PipedriveClient::new(auth)
        .paginated_api_call("/organizations:(id,name)", &[])
        .await?;
    Ok(DropdownState::ready(named_options(organizations)))
}

pub async fn labels(auth: Option<&PipedriveAuth>) -> Result<DropdownState, PipedriveError> {
    let auth = match auth {
        Some(auth) => auth,
        None => return Ok(DropdownState::disconnected()),
    };
    let fields: Vec<GetField> = PipedriveClient::new(auth)
        .paginated_api_call("/personFields:(key,name,options)", &[])
        .await?;
    let options = fields
        .into_iter()
        .find(|field| field.key == "label_ids")
        .and_then(|field| field.options)
        .unwrap_or_default()
        .into_iter()
        .map(|option| DropdownOption {
            label: option.label,
            value: option.id,
        })
        .collect();
    Ok(DropdownState::ready(options))
}
