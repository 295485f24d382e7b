//! Renders search queries into the provider's XML request documents.
//!
//! Documents are produced with a streaming XML writer, so every piece of
//! caller-supplied text goes through the writer's escaping. Nothing is ever
//! spliced into markup by string formatting.

use crate::errors::AppError;
use crate::models::{
    PersonSearchRequest, PhoneSearchRequest, SearchQuery, SEARCH_API_NS, SEARCH_SCHEMA_NS,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Permissible purpose codes sent with every search.
const GLB_PURPOSE: &str = "B";
const DPPA_PURPOSE: &str = "3";
const VOTER_PURPOSE: &str = "7";

const PHONE_DATASETS: [&str; 13] = [
    "BankAccountHeader",
    "BusinessContactRecords",
    "BusinessPhones",
    "CanadianBusinessPhones",
    "CanadianPhones",
    "Experian",
    "DunBradstreet",
    "HouseholdListings",
    "PhoneRecords",
    "TransUnion",
    "Worldbase",
    "MotorVehicleServiceAndWarrantyRecords",
    "MarijuanaRelatedBusinesses",
];

/// Builds the submit document for `query`.
///
/// Writing into an in-memory buffer cannot fail in practice; the `Result`
/// only surfaces writer errors instead of panicking on them.
pub fn build(query: &SearchQuery) -> Result<String, AppError> {
    match query {
        SearchQuery::Person(req) => build_person_search(req),
        SearchQuery::Phone(req) => build_phone_search(req),
    }
}

pub fn build_person_search(req: &PersonSearchRequest) -> Result<String, AppError> {
    let mut doc = XmlDoc::new()?;

    doc.nested(
        "ps:PersonSearchRequestV3",
        &[("xmlns:ps", SEARCH_API_NS)],
        |doc| {
            permissible_purpose(doc)?;
            doc.leaf("Reference", "S2S Person Search")?;
            doc.nested("Criteria", &[], |doc| {
                doc.nested(
                    "p1:PersonCriteria",
                    &[("xmlns:p1", SEARCH_SCHEMA_NS)],
                    |doc| {
                        doc.nested("NameInfo", &[], |doc| {
                            doc.nested("AdvancedNameSearch", &[], |doc| {
                                doc.leaf("LastSecondaryNameSoundSimilarOption", "false")?;
                                doc.leaf("SecondaryLastNameOption", "OR")?;
                                doc.leaf("FirstNameBeginsWithOption", "false")?;
                                doc.leaf("FirstNameSoundSimilarOption", "false")?;
                                doc.leaf("FirstNameExactMatchOption", "false")
                            })?;
                            doc.leaf("LastName", &req.last_name)?;
                            doc.empty_leaves(&["FirstName", "MiddleInitial", "SecondaryLastName"])
                        })?;
                        doc.nested("AddressInfo", &[], |doc| {
                            doc.leaf("StreetNamesSoundSimilarOption", "false")?;
                            doc.empty_leaves(&[
                                "Street", "City", "State", "County", "ZipCode", "Province",
                                "Country",
                            ])
                        })?;
                        doc.empty_leaves(&["EmailAddress", "NPINumber"])?;
                        doc.leaf("SSN", &req.social)?;
                        doc.leaf("PhoneNumber", "")?;
                        doc.nested("AgeInfo", &[], |doc| {
                            doc.empty_leaves(&["PersonBirthDate", "PersonAgeTo", "PersonAgeFrom"])
                        })?;
                        doc.empty_leaves(&["DriverLicenseNumber", "WorldCheckUniqueId"])
                    },
                )
            })?;
            doc.nested("Datasources", &[], |doc| {
                doc.leaf("PublicRecordPeople", "true")?;
                doc.leaf("NPIRecord", "false")?;
                doc.leaf("WorldCheckRiskIntelligence", "false")
            })
        },
    )?;

    doc.finish()
}

pub fn build_phone_search(req: &PhoneSearchRequest) -> Result<String, AppError> {
    let mut doc = XmlDoc::new()?;

    doc.nested(
        "phs:PhoneSearchRequest",
        &[("xmlns:phs", SEARCH_API_NS)],
        |doc| {
            permissible_purpose(doc)?;
            doc.leaf("Reference", "S2S Phone Search")?;
            doc.nested("Criteria", &[], |doc| {
                doc.nested(
                    "ph1:PhoneCriteria",
                    &[("xmlns:ph1", SEARCH_SCHEMA_NS)],
                    |doc| {
                        doc.leaf("BusinessName", &req.business_name)?;
                        doc.nested("PersonName", &[], |doc| {
                            doc.leaf("LastName", &req.last_name)?;
                            doc.leaf("FirstName", &req.first_name)
                        })?;
                        doc.nested("Address", &[], |doc| {
                            doc.empty_leaves(&[
                                "Street", "City", "State", "ZipCode", "Province", "Country",
                            ])
                        })?;
                        doc.leaf("PhoneNumber", "")
                    },
                )
            })?;
            doc.nested("Datasources", &[], |doc| {
                doc.leaf("PublicRecordPhones", "true")?;
                doc.leaf("ReversePhoneLookup", "true")
            })?;
            doc.nested("PhonesDatasets", &[], |doc| {
                PHONE_DATASETS
                    .iter()
                    .try_for_each(|dataset| doc.leaf(dataset, "false"))
            })
        },
    )?;

    doc.finish()
}

fn permissible_purpose(doc: &mut XmlDoc) -> Result<(), AppError> {
    doc.nested("PermissiblePurpose", &[], |doc| {
        doc.leaf("GLB", GLB_PURPOSE)?;
        doc.leaf("DPPA", DPPA_PURPOSE)?;
        doc.leaf("VOTER", VOTER_PURPOSE)
    })
}

/// Thin element-tree style wrapper over the event writer.
struct XmlDoc {
    writer: Writer<Vec<u8>>,
}

impl XmlDoc {
    fn new() -> Result<Self, AppError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        Ok(Self { writer })
    }

    fn nested<F>(&mut self, name: &str, attrs: &[(&str, &str)], body: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Self) -> Result<(), AppError>,
    {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(write_error)?;
        body(self)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }

    /// Writes `<name>text</name>`, or `<name/>` for empty text.
    /// `BytesText::new` escapes the text.
    fn leaf(&mut self, name: &str, text: &str) -> Result<(), AppError> {
        if text.is_empty() {
            return self
                .writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(write_error);
        }
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(write_error)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }

    fn empty_leaves(&mut self, names: &[&str]) -> Result<(), AppError> {
        names.iter().try_for_each(|name| self.leaf(name, ""))
    }

    fn finish(self) -> Result<String, AppError> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| AppError::Internal(format!("Request document is not UTF-8: {}", e)))
    }
}

fn write_error(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Failed to write request XML: {}", err))
}
