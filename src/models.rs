use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Namespace of the provider's search API envelope elements.
pub const SEARCH_API_NS: &str = "http://clear.thomsonreuters.com/api/search/2.0";
/// Namespace of criteria and dominant-value blocks.
pub const SEARCH_SCHEMA_NS: &str = "com/thomsonreuters/schemas/search";

// ============ Inbound Requests ============

/// Body of `POST /clear-person-search`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonSearchRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub last_name: String,
    /// Social security number, passed to the provider as typed.
    #[serde(deserialize_with = "null_as_empty")]
    pub social: String,
}

/// Body of `POST /clear-search`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PhoneSearchRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub business_name: String,
}

/// Explicit JSON `null` reads the same as an absent field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A normalized query, one per inbound request.
#[derive(Debug, Clone)]
pub enum SearchQuery {
    Person(PersonSearchRequest),
    Phone(PhoneSearchRequest),
}

impl SearchQuery {
    pub fn kind(&self) -> SearchKind {
        match self {
            SearchQuery::Person(_) => SearchKind::Person,
            SearchQuery::Phone(_) => SearchKind::Phone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Person,
    Phone,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Person => "person",
            SearchKind::Phone => "phone",
        }
    }
}

// ============ Provider Replies ============

/// What the provider answers to a submitted search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub group_count: u64,
    /// Continuation handle; only valid while the provider session lives.
    pub result_uri: Option<String>,
}

/// One candidate match from the provider's result listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub group_id: String,
    pub relevance: String,
    /// `None` when the group carried no `DominantValues` block at all.
    pub dominant_values: Option<DominantValues>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DominantValues {
    Person(PersonDominantValues),
    Phone(PhoneDominantValues),
}

/// Best-guess person fields. Absent leaves are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonDominantValues {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub full_name: String,
    pub ssn: String,
    pub birth_date: String,
    pub age: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub address_reported_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneDominantValues {
    pub phone_number: String,
}

/// A phone from a person's contact detail, deduplicated on `(number, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PhoneEntry {
    pub number: String,
    #[serde(rename = "type")]
    pub phone_type: String,
}

// ============ Outbound Records ============

/// Anything that can be ordered by the provider's relevance score.
pub trait Relevance {
    fn relevance(&self) -> &str;
}

/// Flattened person-search result group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PersonRecord {
    pub relevance: String,
    pub group_id: String,
    /// Last path segment of the continuation URI.
    pub search_id: String,
    pub phone_number: Vec<PhoneEntry>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub full_name: String,
    pub social: String,
    pub birthday: String,
    pub age: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub address_reported_date: String,
}

impl Relevance for PersonRecord {
    fn relevance(&self) -> &str {
        &self.relevance
    }
}

/// Flattened phone-search result group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PhoneRecord {
    pub phone_number: String,
    pub relevance: String,
}

impl Relevance for PhoneRecord {
    fn relevance(&self) -> &str {
        &self.relevance
    }
}

/// Body sent alongside `204` when the provider found nothing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoResultsBody {
    pub message: String,
}

impl Default for NoResultsBody {
    fn default() -> Self {
        Self {
            message: "No results found.".to_string(),
        }
    }
}

/// Error body shape, for API documentation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
