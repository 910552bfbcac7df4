//! Lead list query, lead mutations and the CSV import/export format.

use std::fs::File;
use std::io::Read;

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::Deserialize;
use validator::Validate;

use crate::domain::lead::{KycStatus, Lead, NewLead};
use crate::domain::lead_filter::{DateRange, LeadFilter, LeadTab};
use crate::domain::types::{
    CountryName, EmailAddress, LeadId, LeadPhone, PersonName, SourceFolder, StatusLabel, UserId,
};
use crate::forms::FormError;

pub const EXPORT_HEADER: [&str; 8] = [
    "ID", "Name", "Surname", "Phone", "Email", "Status", "Country", "Source",
];

/// Query string of `GET /leads`. List parameters repeat:
/// `?status=New&status=Call%20Back&agent=4`.
#[derive(Debug, Default, Deserialize)]
pub struct LeadListForm {
    #[serde(default)]
    pub status: Vec<String>,
    pub search: Option<String>,
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub agent: Vec<i32>,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    pub tab: Option<LeadTab>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl LeadListForm {
    pub fn from_query(query: &str) -> Result<Self, FormError> {
        serde_html_form::from_str(query).map_err(|err| FormError::InvalidQuery(err.to_string()))
    }
}

impl TryFrom<LeadListForm> for LeadFilter {
    type Error = FormError;

    fn try_from(form: LeadListForm) -> Result<Self, Self::Error> {
        let defaults = LeadFilter::default();

        let statuses = form
            .status
            .iter()
            .filter(|label| !label.trim().is_empty())
            .map(|label| StatusLabel::new(label.as_str()).map_err(|_| FormError::InvalidStatus))
            .collect::<Result<Vec<_>, _>>()?;
        let agents = form
            .agent
            .into_iter()
            .map(|id| UserId::new(id).map_err(|_| FormError::InvalidUserId))
            .collect::<Result<Vec<_>, _>>()?;
        let sources = form
            .source
            .iter()
            .filter_map(|folder| SourceFolder::new(folder.as_str()).ok())
            .collect();
        let countries = form
            .country
            .iter()
            .filter_map(|country| CountryName::new(country.as_str()).ok())
            .collect();

        Ok(LeadFilter {
            statuses,
            search: form.search.unwrap_or_default(),
            date_range: form.date_range.unwrap_or_default(),
            agents,
            sources,
            countries,
            tab: form.tab.unwrap_or_default(),
            page: form.page.unwrap_or(defaults.page),
            limit: form.limit.unwrap_or(defaults.limit),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    pub status: String,
}

impl TryFrom<UpdateStatusForm> for StatusLabel {
    type Error = FormError;

    fn try_from(form: UpdateStatusForm) -> Result<Self, Self::Error> {
        StatusLabel::new(form.status).map_err(|_| FormError::InvalidStatus)
    }
}

/// `agent_id: null` unassigns the lead.
#[derive(Debug, Deserialize)]
pub struct AssignAgentForm {
    pub agent_id: Option<i32>,
}

fn optional_user_id(id: Option<i32>) -> Result<Option<UserId>, FormError> {
    id.map(|id| UserId::new(id).map_err(|_| FormError::InvalidUserId))
        .transpose()
}

impl TryFrom<AssignAgentForm> for Option<UserId> {
    type Error = FormError;

    fn try_from(form: AssignAgentForm) -> Result<Self, Self::Error> {
        optional_user_id(form.agent_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateKycForm {
    pub kyc_status: String,
}

impl TryFrom<UpdateKycForm> for KycStatus {
    type Error = FormError;

    fn try_from(form: UpdateKycForm) -> Result<Self, Self::Error> {
        form.kyc_status
            .parse()
            .map_err(|_| FormError::InvalidKycStatus)
    }
}

fn lead_ids(ids: &[i32]) -> Result<Vec<LeadId>, FormError> {
    let mut ids = ids
        .iter()
        .map(|&id| LeadId::new(id).map_err(|_| FormError::InvalidLeadId))
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkLeadsForm {
    #[validate(length(min = 1))]
    pub lead_ids: Vec<i32>,
}

pub struct BulkLeadsPayload {
    pub lead_ids: Vec<LeadId>,
}

impl TryFrom<BulkLeadsForm> for BulkLeadsPayload {
    type Error = FormError;

    fn try_from(form: BulkLeadsForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            lead_ids: lead_ids(&form.lead_ids)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkStatusForm {
    #[validate(length(min = 1))]
    pub lead_ids: Vec<i32>,
    pub status: String,
}

pub struct BulkStatusPayload {
    pub lead_ids: Vec<LeadId>,
    pub status: StatusLabel,
}

impl TryFrom<BulkStatusForm> for BulkStatusPayload {
    type Error = FormError;

    fn try_from(form: BulkStatusForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            lead_ids: lead_ids(&form.lead_ids)?,
            status: StatusLabel::new(form.status).map_err(|_| FormError::InvalidStatus)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkAssignForm {
    #[validate(length(min = 1))]
    pub lead_ids: Vec<i32>,
    pub agent_id: Option<i32>,
}

pub struct BulkAssignPayload {
    pub lead_ids: Vec<LeadId>,
    pub agent_id: Option<UserId>,
}

impl TryFrom<BulkAssignForm> for BulkAssignPayload {
    type Error = FormError;

    fn try_from(form: BulkAssignForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            lead_ids: lead_ids(&form.lead_ids)?,
            agent_id: optional_user_id(form.agent_id)?,
        })
    }
}

#[derive(MultipartForm)]
pub struct UploadLeadsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
    /// Source folder the imported leads are tagged with.
    pub folder: Text<String>,
}

/// Leads read from an import file.
#[derive(Debug)]
pub struct ParsedLeads {
    pub leads: Vec<NewLead>,
    /// Rows without a usable name.
    pub skipped: usize,
}

impl UploadLeadsForm {
    /// Target folder and a fresh handle on the uploaded file.
    pub fn open(&self) -> Result<(SourceFolder, File), FormError> {
        let folder =
            SourceFolder::new(self.folder.as_str()).map_err(|_| FormError::InvalidSourceFolder)?;
        let file = self
            .csv
            .file
            .reopen()
            .map_err(|err| FormError::Csv(err.to_string()))?;
        Ok((folder, file))
    }
}

fn optional<T>(value: Option<&str>, build: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(build)
}

/// Reads `name, surname, email, phone, country` columns; header names are
/// matched case-insensitively and unknown columns are ignored.
pub fn parse_leads_csv<R: Read>(
    reader: R,
    folder: &SourceFolder,
    status: &StatusLabel,
) -> Result<ParsedLeads, FormError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()?
        .iter()
        .map(|header| header.to_lowercase())
        .collect::<Vec<_>>();
    let column = |name: &str| headers.iter().position(|header| header == name);
    let name_column = column("name").ok_or_else(|| FormError::Csv("missing name column".into()))?;
    let (surname, email, phone, country) = (
        column("surname"),
        column("email"),
        column("phone"),
        column("country"),
    );

    let mut parsed = ParsedLeads {
        leads: Vec::new(),
        skipped: 0,
    };

    for record in rdr.records() {
        let record = record?;
        let field = |index: Option<usize>| index.and_then(|index| record.get(index));

        let Some(name) = optional(record.get(name_column), |v| PersonName::new(v).ok()) else {
            parsed.skipped += 1;
            continue;
        };

        let mut lead = NewLead::new(name, status.clone());
        lead.surname = optional(field(surname), |v| PersonName::new(v).ok());
        lead.email = optional(field(email), |v| EmailAddress::new(v).ok());
        lead.phone = optional(field(phone), |v| LeadPhone::new(v).ok());
        lead.country = optional(field(country), |v| CountryName::new(v).ok());
        lead.source_file = Some(folder.clone());
        parsed.leads.push(lead);
    }

    Ok(parsed)
}

/// Renders leads in the export layout.
pub fn write_leads_csv(leads: &[Lead]) -> Result<String, FormError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for lead in leads {
        let id = lead.id.to_string();
        writer.write_record([
            id.as_str(),
            lead.name.as_str(),
            lead.surname.as_deref().unwrap_or_default(),
            lead.phone.as_ref().map(LeadPhone::as_str).unwrap_or_default(),
            lead.email.as_ref().map(EmailAddress::as_str).unwrap_or_default(),
            lead.status.as_str(),
            lead.country.as_deref().unwrap_or_default(),
            lead.source_file.as_deref().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| FormError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| FormError::Csv(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn list_query_accepts_repeated_parameters() {
        let form = LeadListForm::from_query(
            "status=New&status=Call%20Back&agent=4&source=march.csv&tab=mine&page=2&limit=20&date_range=today&search=%20jane%20",
        )
        .unwrap();
        let filter = LeadFilter::try_from(form).unwrap();

        assert_eq!(filter.statuses.len(), 2);
        assert_eq!(filter.statuses[1].as_str(), "Call Back");
        assert_eq!(filter.agents, vec![UserId::new(4).unwrap()]);
        assert_eq!(filter.sources[0].as_str(), "march.csv");
        assert_eq!(filter.tab, LeadTab::Mine);
        assert_eq!(filter.date_range, DateRange::Today);
        assert_eq!(filter.effective_search(), Some("jane"));
        assert_eq!((filter.page, filter.limit), (2, 20));
    }

    #[test]
    fn empty_query_is_the_default_filter() {
        let filter = LeadFilter::try_from(LeadListForm::from_query("").unwrap()).unwrap();
        assert_eq!(filter, LeadFilter::default());
    }

    #[test]
    fn bad_agent_id_is_rejected() {
        let form = LeadListForm::from_query("agent=0").unwrap();
        assert!(matches!(
            LeadFilter::try_from(form),
            Err(FormError::InvalidUserId)
        ));
    }

    #[test]
    fn bulk_payload_deduplicates_ids() {
        let payload = BulkStatusPayload::try_from(BulkStatusForm {
            lead_ids: vec![3, 1, 3],
            status: "Interested".to_string(),
        })
        .unwrap();
        assert_eq!(
            payload.lead_ids,
            vec![LeadId::new(1).unwrap(), LeadId::new(3).unwrap()]
        );

        assert!(
            BulkLeadsPayload::try_from(BulkLeadsForm { lead_ids: vec![] }).is_err()
        );
    }

    #[test]
    fn csv_import_tags_folder_and_skips_nameless_rows() {
        let data = "Name,Surname,Email,Phone,Country,Extra\n\
                    Jane,Doe,JANE@example.com,+1 202 555 0143,USA,x\n\
                    ,Nobody,,,,\n\
                    John,,not-an-email,,,\n";
        let folder = SourceFolder::new("march.csv").unwrap();
        let status = StatusLabel::new("New").unwrap();

        let parsed = parse_leads_csv(data.as_bytes(), &folder, &status).unwrap();

        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.leads.len(), 2);
        let jane = &parsed.leads[0];
        assert_eq!(jane.email.as_ref().unwrap().as_str(), "jane@example.com");
        assert_eq!(jane.source_file.as_ref(), Some(&folder));
        assert_eq!(jane.status, status);
        assert_eq!(parsed.leads[1].email, None);
    }

    #[test]
    fn csv_import_requires_name_column() {
        let folder = SourceFolder::new("x").unwrap();
        let status = StatusLabel::new("New").unwrap();
        assert!(parse_leads_csv("email\na@b.c\n".as_bytes(), &folder, &status).is_err());
    }

    #[test]
    fn export_uses_fixed_header() {
        let now = Utc::now().naive_utc();
        let lead = Lead {
            id: LeadId::new(9).unwrap(),
            name: PersonName::new("Jane").unwrap(),
            surname: None,
            email: Some(EmailAddress::new("jane@example.com").unwrap()),
            phone: None,
            country: Some(CountryName::new("Spain").unwrap()),
            status: StatusLabel::new("New").unwrap(),
            kyc_status: KycStatus::Pending,
            source_file: None,
            assigned_to: None,
            trading_account_id: None,
            note_count: 0,
            created_at: now,
            updated_at: now,
        };

        let csv = write_leads_csv(&[lead]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Name,Surname,Phone,Email,Status,Country,Source")
        );
        assert_eq!(lines.next(), Some("9,Jane,,,jane@example.com,New,Spain,"));
    }
}
