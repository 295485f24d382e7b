//! Reads the provider's XML replies and flattens result groups into records.
//!
//! Dominant-value blocks are matched on (namespace URI, local name) after the
//! parser has resolved prefixes, so the person and phone endpoints can use
//! whatever prefixes they like for the same namespace. Every other element is
//! matched on its local name alone.

use crate::errors::AppError;
use crate::models::{
    DominantValues, PersonDominantValues, PersonRecord, PhoneDominantValues, PhoneEntry,
    PhoneRecord, ResultGroup, SearchKind, SubmitResponse, SEARCH_SCHEMA_NS,
};
use roxmltree::{Document, Node};
use std::collections::HashSet;

/// An element name, optionally pinned to a namespace URI.
#[derive(Debug, Clone, Copy)]
struct XmlName {
    namespace: Option<&'static str>,
    local: &'static str,
}

impl XmlName {
    const fn plain(local: &'static str) -> Self {
        Self {
            namespace: None,
            local,
        }
    }

    const fn qualified(namespace: &'static str, local: &'static str) -> Self {
        Self {
            namespace: Some(namespace),
            local,
        }
    }

    fn matches(&self, node: Node<'_, '_>) -> bool {
        node.is_element()
            && node.tag_name().name() == self.local
            && self
                .namespace
                .map_or(true, |ns| node.tag_name().namespace() == Some(ns))
    }
}

// Submit reply / error reply
const GROUP_COUNT: XmlName = XmlName::plain("GroupCount");
const URI: XmlName = XmlName::plain("Uri");
const MESSAGE: XmlName = XmlName::plain("Message");

// Result listing
const RESULT_GROUP: XmlName = XmlName::plain("ResultGroup");
const GROUP_ID: XmlName = XmlName::plain("GroupId");
const RELEVANCE: XmlName = XmlName::plain("Relevance");
const DOMINANT_VALUES: XmlName = XmlName::plain("DominantValues");
const PERSON_DOMINANT_VALUES: XmlName =
    XmlName::qualified(SEARCH_SCHEMA_NS, "PersonDominantValues");
const PHONE_DOMINANT_VALUES: XmlName =
    XmlName::qualified(SEARCH_SCHEMA_NS, "PhoneDominantValues");

// Person dominant values
const NAME: XmlName = XmlName::plain("Name");
const FIRST_NAME: XmlName = XmlName::plain("FirstName");
const LAST_NAME: XmlName = XmlName::plain("LastName");
const MIDDLE_NAME: XmlName = XmlName::plain("MiddleName");
const FULL_NAME: XmlName = XmlName::plain("FullName");
const SSN: XmlName = XmlName::plain("SSN");
const AGE_INFO: XmlName = XmlName::plain("AgeInfo");
const PERSON_BIRTH_DATE: XmlName = XmlName::plain("PersonBirthDate");
const PERSON_AGE: XmlName = XmlName::plain("PersonAge");
const ADDRESS: XmlName = XmlName::plain("Address");
const STREET: XmlName = XmlName::plain("Street");
const CITY: XmlName = XmlName::plain("City");
const STATE: XmlName = XmlName::plain("State");
const ZIP_CODE: XmlName = XmlName::plain("ZipCode");
const COUNTRY: XmlName = XmlName::plain("Country");
const REPORTED_DATE: XmlName = XmlName::plain("ReportedDate");

// Phone dominant values and contact detail
const PHONE_NUMBER: XmlName = XmlName::plain("PhoneNumber");
const PHONES: XmlName = XmlName::plain("Phones");
const PHONE_NUMBER_TYPE: XmlName = XmlName::plain("PhoneNumberType");

/// First strict descendant of `node` named `name`, in document order.
fn find<'a, 'input>(node: Node<'a, 'input>, name: XmlName) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| name.matches(*n))
}

fn text(node: Option<Node<'_, '_>>) -> String {
    node.and_then(|n| n.text()).unwrap_or_default().to_string()
}

/// Text of the first `name` below `parent`; empty when either is missing.
fn leaf(parent: Option<Node<'_, '_>>, name: XmlName) -> String {
    text(parent.and_then(|p| find(p, name)))
}

/// Parses the reply to a submitted search.
///
/// A missing `GroupCount` counts as zero. A present but non-numeric one is a
/// provider contract violation.
pub fn parse_submit_response(xml: &str) -> Result<SubmitResponse, AppError> {
    let doc = Document::parse(xml)?;
    let root = doc.root();

    let group_count = match find(root, GROUP_COUNT) {
        None => 0,
        Some(node) => {
            let raw = node.text().unwrap_or_default().trim();
            raw.parse::<u64>().map_err(|_| {
                AppError::UpstreamProtocol(format!("GroupCount is not a count: {:?}", raw))
            })?
        }
    };

    let result_uri = find(root, URI)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string);

    Ok(SubmitResponse {
        group_count,
        result_uri,
    })
}

/// Extracts the provider's `<Message>` from an error reply, if there is one.
pub fn parse_error_message(xml: &str) -> Option<String> {
    let doc = Document::parse(xml).ok()?;
    let message = find(doc.root(), MESSAGE)?.text()?.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

/// Parses every `ResultGroup` of a result listing, in document order.
pub fn parse_result_groups(xml: &str, kind: SearchKind) -> Result<Vec<ResultGroup>, AppError> {
    let doc = Document::parse(xml)?;

    let groups = doc
        .descendants()
        .filter(|n| RESULT_GROUP.matches(*n))
        .map(|group| ResultGroup {
            group_id: leaf(Some(group), GROUP_ID),
            relevance: leaf(Some(group), RELEVANCE),
            dominant_values: match kind {
                SearchKind::Person => dominant_block(group, PERSON_DOMINANT_VALUES)
                    .map(|block| DominantValues::Person(person_values(block))),
                SearchKind::Phone => dominant_block(group, PHONE_DOMINANT_VALUES)
                    .map(|block| DominantValues::Phone(phone_values(block))),
            },
        })
        .collect::<Vec<_>>();

    tracing::debug!("Parsed {} {} result group(s)", groups.len(), kind.as_str());
    Ok(groups)
}

/// The kind-specific block directly under a group's `DominantValues`.
fn dominant_block<'a, 'input>(
    group: Node<'a, 'input>,
    name: XmlName,
) -> Option<Node<'a, 'input>> {
    group
        .descendants()
        .filter(|n| DOMINANT_VALUES.matches(*n))
        .flat_map(|values| values.children())
        .find(|n| name.matches(*n))
}

fn person_values(block: Node<'_, '_>) -> PersonDominantValues {
    let name = find(block, NAME);
    let age_info = find(block, AGE_INFO);
    let address = find(block, ADDRESS);

    PersonDominantValues {
        first_name: leaf(name, FIRST_NAME),
        last_name: leaf(name, LAST_NAME),
        middle_name: leaf(name, MIDDLE_NAME),
        full_name: leaf(name, FULL_NAME),
        ssn: leaf(Some(block), SSN),
        birth_date: leaf(age_info, PERSON_BIRTH_DATE),
        age: leaf(age_info, PERSON_AGE),
        street: leaf(address, STREET),
        city: leaf(address, CITY),
        state: leaf(address, STATE),
        zip_code: leaf(address, ZIP_CODE),
        country: leaf(address, COUNTRY),
        address_reported_date: leaf(address, REPORTED_DATE),
    }
}

fn phone_values(block: Node<'_, '_>) -> PhoneDominantValues {
    PhoneDominantValues {
        phone_number: leaf(Some(block), PHONE_NUMBER),
    }
}

/// Parses a person's contact detail into unique `(number, type)` phones.
///
/// `Phones` entries missing either element are skipped. First occurrence
/// wins, so output order follows the document.
pub fn parse_contact_phones(xml: &str) -> Result<Vec<PhoneEntry>, AppError> {
    let doc = Document::parse(xml)?;

    let mut seen = HashSet::new();
    let mut phones = Vec::new();
    for entry in doc.descendants().filter(|n| PHONES.matches(*n)) {
        let (Some(number), Some(phone_type)) =
            (find(entry, PHONE_NUMBER), find(entry, PHONE_NUMBER_TYPE))
        else {
            continue;
        };

        let phone = PhoneEntry {
            number: text(Some(number)),
            phone_type: text(Some(phone_type)),
        };
        if seen.insert(phone.clone()) {
            phones.push(phone);
        }
    }

    Ok(phones)
}

/// Text after the last `/` of the continuation URI, taken verbatim.
///
/// No URL normalisation: percent-encoding and any query string are kept as
/// the provider sent them, and a trailing `/` yields an empty id.
pub fn search_id_from_uri(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or_default().to_string()
}

pub fn flatten_person(
    group: &ResultGroup,
    phones: Vec<PhoneEntry>,
    search_id: &str,
) -> PersonRecord {
    let values = match &group.dominant_values {
        Some(DominantValues::Person(values)) => values.clone(),
        _ => PersonDominantValues::default(),
    };

    PersonRecord {
        relevance: group.relevance.clone(),
        group_id: group.group_id.clone(),
        search_id: search_id.to_string(),
        phone_number: phones,
        first_name: values.first_name,
        last_name: values.last_name,
        middle_name: values.middle_name,
        full_name: values.full_name,
        social: values.ssn,
        birthday: values.birth_date,
        age: values.age,
        street: values.street,
        city: values.city,
        state: values.state,
        zip: values.zip_code,
        country: values.country,
        address_reported_date: values.address_reported_date,
    }
}

pub fn flatten_phone(group: &ResultGroup) -> PhoneRecord {
    let phone_number = match &group.dominant_values {
        Some(DominantValues::Phone(values)) => values.phone_number.clone(),
        _ => String::new(),
    };

    PhoneRecord {
        phone_number,
        relevance: group.relevance.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON_RESULTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns4:PersonResultsPage xmlns:ns2="com/thomsonreuters/schemas/common-data"
    xmlns:ns3="com/thomsonreuters/schemas/search"
    xmlns:ns4="http://clear.thomsonreuters.com/api/search/2.0">
  <ResultGroup>
    <GroupId>G-1</GroupId>
    <Relevance>98</Relevance>
    <DominantValues>
      <ns3:PersonDominantValues>
        <Name>
          <FirstName>JANE</FirstName>
          <MiddleName>Q</MiddleName>
          <LastName>DOE</LastName>
          <FullName>JANE Q DOE</FullName>
        </Name>
        <SSN>123-45-XXXX</SSN>
        <AgeInfo>
          <PersonBirthDate>01/1970</PersonBirthDate>
          <PersonAge>55</PersonAge>
        </AgeInfo>
        <Address>
          <Street>1 MAIN ST</Street>
          <State>IL</State>
          <ZipCode>62701</ZipCode>
          <Country>US</Country>
          <ReportedDate>2020-01-01</ReportedDate>
        </Address>
      </ns3:PersonDominantValues>
    </DominantValues>
  </ResultGroup>
  <ResultGroup>
    <GroupId>G-2</GroupId>
    <Relevance>75</Relevance>
  </ResultGroup>
</ns4:PersonResultsPage>"#;

    #[test]
    fn test_submit_response_with_results() {
        let parsed = parse_submit_response(
            r#"<ns2:PersonResults xmlns:ns2="http://clear.thomsonreuters.com/api/search/2.0">
                 <Uri> https://clear.example.com/results/abc123 </Uri>
                 <GroupCount>3</GroupCount>
               </ns2:PersonResults>"#,
        )
        .unwrap();

        assert_eq!(parsed.group_count, 3);
        assert_eq!(
            parsed.result_uri.as_deref(),
            Some("https://clear.example.com/results/abc123")
        );
    }

    #[test]
    fn test_submit_response_without_group_count_is_empty() {
        let parsed = parse_submit_response("<Results><Uri>x</Uri></Results>").unwrap();
        assert_eq!(parsed.group_count, 0);
    }

    #[test]
    fn test_submit_response_rejects_garbage_count() {
        let err = parse_submit_response("<Results><GroupCount>many</GroupCount></Results>")
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamProtocol(_)));
    }

    #[test]
    fn test_malformed_xml_is_internal_error() {
        let err = parse_submit_response("<Results><GroupCount>1</Results>").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            parse_error_message("<Response><Message>Invalid SSN</Message></Response>").as_deref(),
            Some("Invalid SSN")
        );
        assert_eq!(parse_error_message("<Response><Code>9</Code></Response>"), None);
        assert_eq!(parse_error_message("<html>Bad Gateway"), None);
        assert_eq!(parse_error_message("<Response><Message/></Response>"), None);
    }

    #[test]
    fn test_person_groups_flatten_with_missing_fields() {
        let groups = parse_result_groups(PERSON_RESULTS, SearchKind::Person).unwrap();
        assert_eq!(groups.len(), 2);

        let record = flatten_person(&groups[0], Vec::new(), "abc123");
        assert_eq!(record.group_id, "G-1");
        assert_eq!(record.relevance, "98");
        assert_eq!(record.full_name, "JANE Q DOE");
        assert_eq!(record.social, "123-45-XXXX");
        assert_eq!(record.birthday, "01/1970");
        assert_eq!(record.age, "55");
        assert_eq!(record.street, "1 MAIN ST");
        assert_eq!(record.city, "");
        assert_eq!(record.zip, "62701");
        assert_eq!(record.address_reported_date, "2020-01-01");
        assert_eq!(record.search_id, "abc123");
    }

    #[test]
    fn test_group_without_dominant_values_still_emitted() {
        let groups = parse_result_groups(PERSON_RESULTS, SearchKind::Person).unwrap();
        assert_eq!(groups[1].dominant_values, None);

        let record = flatten_person(&groups[1], Vec::new(), "abc123");
        assert_eq!(record.group_id, "G-2");
        assert_eq!(record.relevance, "75");
        assert_eq!(record.first_name, "");
        assert_eq!(record.country, "");
    }

    #[test]
    fn test_namespace_prefix_does_not_matter() {
        let xml = r#"<x:Page xmlns:x="http://clear.thomsonreuters.com/api/search/2.0"
                             xmlns:srch="com/thomsonreuters/schemas/search">
              <ResultGroup>
                <GroupId>P1</GroupId>
                <Relevance>40</Relevance>
                <DominantValues>
                  <srch:PhoneDominantValues><PhoneNumber>555-0100</PhoneNumber></srch:PhoneDominantValues>
                </DominantValues>
              </ResultGroup>
            </x:Page>"#;

        let groups = parse_result_groups(xml, SearchKind::Phone).unwrap();
        let record = flatten_phone(&groups[0]);
        assert_eq!(record.phone_number, "555-0100");
        assert_eq!(record.relevance, "40");
    }

    #[test]
    fn test_default_namespace_on_listing() {
        let xml = r#"<Page xmlns="http://clear.thomsonreuters.com/api/search/2.0"
                           xmlns:s="com/thomsonreuters/schemas/search">
              <ResultGroup>
                <Relevance>7</Relevance>
                <DominantValues>
                  <s:PhoneDominantValues><PhoneNumber>555-0199</PhoneNumber></s:PhoneDominantValues>
                </DominantValues>
              </ResultGroup>
            </Page>"#;

        let groups = parse_result_groups(xml, SearchKind::Phone).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(flatten_phone(&groups[0]).phone_number, "555-0199");
    }

    #[test]
    fn test_dominant_values_in_wrong_namespace_ignored() {
        let xml = r#"<Page xmlns:other="urn:other">
              <ResultGroup>
                <Relevance>1</Relevance>
                <DominantValues>
                  <other:PhoneDominantValues><PhoneNumber>555-0100</PhoneNumber></other:PhoneDominantValues>
                </DominantValues>
              </ResultGroup>
            </Page>"#;

        let groups = parse_result_groups(xml, SearchKind::Phone).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(flatten_phone(&groups[0]).phone_number, "");
    }

    #[test]
    fn test_contact_phones_deduplicated() {
        let xml = r#"<Detail>
              <Phones><PhoneNumber>555-1111</PhoneNumber><PhoneNumberType>Mobile</PhoneNumberType></Phones>
              <Phones><PhoneNumber>555-1111</PhoneNumber><PhoneNumberType>Mobile</PhoneNumberType></Phones>
              <Phones><PhoneNumber>555-2222</PhoneNumber><PhoneNumberType>Home</PhoneNumberType></Phones>
              <Phones><PhoneNumber>555-1111</PhoneNumber><PhoneNumberType>Work</PhoneNumberType></Phones>
              <Phones><PhoneNumber>555-3333</PhoneNumber></Phones>
            </Detail>"#;

        let phones = parse_contact_phones(xml).unwrap();
        let pairs: Vec<(&str, &str)> = phones
            .iter()
            .map(|p| (p.number.as_str(), p.phone_type.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("555-1111", "Mobile"),
                ("555-2222", "Home"),
                ("555-1111", "Work"),
            ]
        );
    }

    #[test]
    fn test_search_id_is_last_segment() {
        assert_eq!(
            search_id_from_uri("https://s2s.example.com/api/v3/person/searchResults/XYZ789"),
            "XYZ789"
        );
        assert_eq!(search_id_from_uri("not a url/ABC"), "ABC");
        assert_eq!(search_id_from_uri("https://s2s.example.com/results/"), "");
    }

    #[test]
    fn test_search_id_is_not_normalised() {
        assert_eq!(search_id_from_uri("https://s2s.example.com/results/A B"), "A B");
        assert_eq!(
            search_id_from_uri("https://s2s.example.com/results/A%20B?page=2"),
            "A%20B?page=2"
        );
    }
}
