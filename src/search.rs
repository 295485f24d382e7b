//! Search orchestration against the CLEAR provider.
//!
//! Every search runs the same linear sequence: build the request document,
//! submit it, read the group count and continuation URI, fetch the result
//! listing, then (person searches only) fetch each group's contact detail.
//! Records come back sorted by relevance, highest first.

use crate::clear_client::{ClearClient, ProviderResponse};
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::flattener;
use crate::models::{
    PersonRecord, PersonSearchRequest, PhoneRecord, PhoneSearchRequest, Relevance, ResultGroup,
    SearchQuery,
};
use crate::request_builder;
use futures::{stream, StreamExt, TryStreamExt};
use std::future::Future;
use std::time::Duration;

/// Result of a search that did not fail.
///
/// `NoResults` is distinct from `Results(vec![])`: it means the provider
/// reported zero groups and nothing past the submit call was made.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T> {
    NoResults,
    Results(Vec<T>),
}

/// Result listing of a search that found something.
struct Listing {
    result_uri: String,
    groups: Vec<ResultGroup>,
}

pub struct SearchService<'a> {
    client: &'a ClearClient,
    config: &'a Config,
}

impl<'a> SearchService<'a> {
    pub fn new(client: &'a ClearClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Person search, including one contact-detail fetch per result group.
    pub async fn person_search(
        &self,
        req: &PersonSearchRequest,
    ) -> Result<SearchOutcome<PersonRecord>, AppError> {
        within_deadline(self.config.request_deadline, self.run_person_search(req)).await
    }

    /// Phone/business search. Needs no per-group detail.
    pub async fn phone_search(
        &self,
        req: &PhoneSearchRequest,
    ) -> Result<SearchOutcome<PhoneRecord>, AppError> {
        within_deadline(self.config.request_deadline, self.run_phone_search(req)).await
    }

    async fn run_person_search(
        &self,
        req: &PersonSearchRequest,
    ) -> Result<SearchOutcome<PersonRecord>, AppError> {
        let query = SearchQuery::Person(req.clone());
        let Some(listing) = self
            .submit_and_list(&query, &self.config.person_search_url)
            .await?
        else {
            return Ok(SearchOutcome::NoResults);
        };

        let search_id = flattener::search_id_from_uri(&listing.result_uri);
        tracing::info!(
            "Fetching contact detail for {} group(s) (concurrency {})",
            listing.groups.len(),
            self.config.detail_fetch_concurrency
        );

        let fetches: Vec<_> = listing
            .groups
            .iter()
            .map(|group| self.person_record(group, &listing.result_uri, &search_id))
            .collect();

        // `buffered` keeps group order, so ties in the sort below stay in
        // upstream order no matter which detail fetch finishes first.
        let records: Vec<PersonRecord> = stream::iter(fetches)
            .buffered(self.config.detail_fetch_concurrency.max(1))
            .try_collect()
            .await?;

        tracing::info!("Person search produced {} record(s)", records.len());
        Ok(SearchOutcome::Results(sort_by_relevance(records)))
    }

    async fn run_phone_search(
        &self,
        req: &PhoneSearchRequest,
    ) -> Result<SearchOutcome<PhoneRecord>, AppError> {
        let query = SearchQuery::Phone(req.clone());
        let Some(listing) = self
            .submit_and_list(&query, &self.config.phone_search_url)
            .await?
        else {
            return Ok(SearchOutcome::NoResults);
        };

        let records: Vec<PhoneRecord> = listing
            .groups
            .iter()
            .map(flattener::flatten_phone)
            .collect();

        tracing::info!("Phone search produced {} record(s)", records.len());
        Ok(SearchOutcome::Results(sort_by_relevance(records)))
    }

    /// Submits the query and fetches its result listing.
    ///
    /// Returns `None` when the provider reports zero groups.
    async fn submit_and_list(
        &self,
        query: &SearchQuery,
        endpoint: &str,
    ) -> Result<Option<Listing>, AppError> {
        let kind = query.kind();
        let document = request_builder::build(query)?;

        let response = self.client.submit(endpoint, document).await?;
        let body = ensure_success(response).context(format!("{} search submit", kind.as_str()))?;
        let submitted = flattener::parse_submit_response(&body)?;
        tracing::info!(
            "{} search submitted: {} group(s)",
            kind.as_str(),
            submitted.group_count
        );

        if submitted.group_count == 0 {
            tracing::info!("No results found");
            return Ok(None);
        }

        let result_uri = submitted.result_uri.ok_or_else(|| {
            AppError::UpstreamProtocol(format!(
                "{} search reported {} group(s) but no result Uri",
                kind.as_str(),
                submitted.group_count
            ))
        })?;

        let response = self.client.fetch(&result_uri).await?;
        let body = ensure_success(response)
            .context(format!("{} search result fetch", kind.as_str()))?;
        let groups = flattener::parse_result_groups(&body, kind)?;

        if groups.len() as u64 != submitted.group_count {
            tracing::warn!(
                "Provider reported {} group(s) but listed {}",
                submitted.group_count,
                groups.len()
            );
        }

        Ok(Some(Listing { result_uri, groups }))
    }

    async fn person_record(
        &self,
        group: &ResultGroup,
        result_uri: &str,
        search_id: &str,
    ) -> Result<PersonRecord, AppError> {
        if group.group_id.is_empty() {
            return Err(AppError::UpstreamProtocol(
                "person result group without GroupId".to_string(),
            ));
        }

        let detail_uri = format!("{}/{}", result_uri.trim_end_matches('/'), group.group_id);
        let response = self.client.fetch(&detail_uri).await?;
        let body = ensure_success(response)
            .with_context(|| format!("contact detail fetch for group {}", group.group_id))?;
        let phones = flattener::parse_contact_phones(&body)?;

        Ok(flattener::flatten_person(group, phones, search_id))
    }
}

/// Turns a non-2xx provider reply into a business or protocol error.
fn ensure_success(response: ProviderResponse) -> Result<String, AppError> {
    if response.is_success() {
        return Ok(response.body);
    }

    match flattener::parse_error_message(&response.body) {
        Some(message) => Err(AppError::UpstreamBusiness {
            status: response.status,
            message,
        }),
        None => Err(AppError::UpstreamProtocol(format!(
            "provider returned {} without a readable message",
            response.status
        ))),
    }
}

/// Sorts by relevance, descending, keeping input order on ties.
///
/// Relevance is compared as a plain string, the way the provider value has
/// always been compared here, so `"2"` ranks above `"10"`.
pub fn sort_by_relevance<T: Relevance>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by(|a, b| b.relevance().cmp(a.relevance()));
    records
}

async fn within_deadline<T, F>(deadline: Duration, search: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(deadline, search).await.map_err(|_| {
        AppError::Transport(format!("request deadline of {:?} exceeded", deadline))
    })?
}
