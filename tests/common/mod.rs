//! Shared fixtures: configuration pointed at a mock provider and canned
//! provider XML replies.
#![allow(dead_code)]

use clear_relay::integrations::clear_client::ClearClient;
use clear_relay::config::{Config, ProviderCredentials};
use clear_relay::handlers::AppState;
use std::sync::Arc;
use std::time::Duration;

pub const ALLOWED_ORIGIN: &str = "https://greennotecapitalpartners.quickbase.com";
pub const PERSON_SEARCH_PATH: &str = "/api/v3/person/searchResults";
pub const PHONE_SEARCH_PATH: &str = "/api/v2/phone/searchResults";
pub const USERNAME: &str = "relay-user";
pub const PASSWORD: &str = "relay-pass";

/// Configuration whose provider endpoints live on `provider_uri`.
pub fn test_config(provider_uri: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        allowed_origin: ALLOWED_ORIGIN.to_string(),
        credentials: ProviderCredentials {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            cert_path: "unused.p12".to_string(),
            cert_passphrase: "unused".to_string(),
        },
        person_search_url: format!("{}{}", provider_uri, PERSON_SEARCH_PATH),
        phone_search_url: format!("{}{}", provider_uri, PHONE_SEARCH_PATH),
        provider_timeout: Duration::from_secs(10),
        request_deadline: Duration::from_secs(30),
        detail_fetch_concurrency: 2,
        max_concurrent_requests: 4,
    }
}

/// Plain-HTTP client; the mock provider does not speak mutual TLS.
pub fn test_client(config: &Config) -> ClearClient {
    ClearClient::without_identity(&config.credentials, config.provider_timeout).unwrap()
}

pub fn test_state(config: Config) -> Arc<AppState> {
    let clear_client = test_client(&config);
    Arc::new(AppState {
        config,
        clear_client,
    })
}

pub fn submit_reply(group_count: usize, uri: Option<&str>) -> String {
    let uri = uri
        .map(|u| format!("<Uri>{}</Uri>", u))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ns2:SearchResults xmlns:ns2="http://clear.thomsonreuters.com/api/search/2.0">
  {}
  <Status><StatusCode>200</StatusCode></Status>
  <GroupCount>{}</GroupCount>
</ns2:SearchResults>"#,
        uri, group_count
    )
}

/// Person result listing; each entry is `(group_id, relevance, first_name)`.
pub fn person_results(groups: &[(&str, &str, &str)]) -> String {
    let groups: String = groups
        .iter()
        .map(|(id, relevance, first_name)| {
            format!(
                r#"
  <ResultGroup>
    <GroupId>{}</GroupId>
    <Relevance>{}</Relevance>
    <RecordCount>1</RecordCount>
    <DominantValues>
      <ns3:PersonDominantValues>
        <Name>
          <FirstName>{}</FirstName>
          <LastName>DOE</LastName>
          <FullName>{} DOE</FullName>
        </Name>
        <SSN>123-45-XXXX</SSN>
        <AgeInfo><PersonBirthDate>02/1980</PersonBirthDate><PersonAge>45</PersonAge></AgeInfo>
        <Address>
          <Street>10 ELM ST</Street>
          <State>TX</State>
          <ZipCode>73301</ZipCode>
        </Address>
      </ns3:PersonDominantValues>
    </DominantValues>
  </ResultGroup>"#,
                id, relevance, first_name, first_name
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ns4:PersonResultsPage xmlns:ns2="com/thomsonreuters/schemas/common-data"
    xmlns:ns3="com/thomsonreuters/schemas/search"
    xmlns:ns4="http://clear.thomsonreuters.com/api/search/2.0">{}
</ns4:PersonResultsPage>"#,
        groups
    )
}

/// Phone result listing; each entry is `(group_id, relevance, phone_number)`.
pub fn phone_results(groups: &[(&str, &str, &str)]) -> String {
    let groups: String = groups
        .iter()
        .map(|(id, relevance, number)| {
            format!(
                r#"
  <ResultGroup>
    <GroupId>{}</GroupId>
    <Relevance>{}</Relevance>
    <DominantValues>
      <ns2:PhoneDominantValues><PhoneNumber>{}</PhoneNumber></ns2:PhoneDominantValues>
    </DominantValues>
  </ResultGroup>"#,
                id, relevance, number
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ns5:PhoneResultsPage xmlns:ns2="com/thomsonreuters/schemas/search"
    xmlns:ns5="http://clear.thomsonreuters.com/api/search/2.0">{}
</ns5:PhoneResultsPage>"#,
        groups
    )
}

/// Contact detail for one person group; each entry is `(number, type)`.
pub fn contact_detail(phones: &[(&str, &str)]) -> String {
    let phones: String = phones
        .iter()
        .map(|(number, phone_type)| {
            format!(
                "<Phones><PhoneNumber>{}</PhoneNumber><PhoneNumberType>{}</PhoneNumberType></Phones>",
                number, phone_type
            )
        })
        .collect();

    format!(
        r#"<ns4:PersonDetail xmlns:ns4="http://clear.thomsonreuters.com/api/search/2.0">
  <ContactInfo>{}</ContactInfo>
</ns4:PersonDetail>"#,
        phones
    )
}

pub fn error_reply(message: &str) -> String {
    format!("<Response><Message>{}</Message></Response>", message)
}
