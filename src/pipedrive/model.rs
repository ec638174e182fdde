//! Wire models for the Pipedrive responses the bridge consumes.

use serde::Deserialize;

/// Response of `GET /v1/persons/search`.
#[derive(Debug, Deserialize)]
pub struct PersonSearchResp {
    #[serde(default)]
    pub data: Option<PersonSearchData>,
}

#[derive(Debug, Deserialize)]
pub struct PersonSearchData {
    #[serde(default)]
    pub items: Vec<PersonSearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct PersonSearchItem {
    pub item: PersonItem,
}

#[derive(Debug, Deserialize)]
pub struct PersonItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `POST /v1/notes`.
#[derive(Debug, Deserialize)]
pub struct CreateNoteResp {
    #[serde(default)]
    pub success: bool,
}
