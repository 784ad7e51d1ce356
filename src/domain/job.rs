//! Job posting records as they move through the pipeline
//!
//! `RawListingRecord` and `DetailAttributes` come straight out of the HTML
//! extractor, `EnrichedRecord` pairs them positionally, `JobRow` is the
//! typed column view the normalizer works on and `CanonicalRecord` is the
//! fixed-schema row handed to storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One job posting as seen on a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListingRecord {
    pub title: String,
    pub link: Option<String>,
    pub company_name: Option<String>,
    pub job_description: String,
    /// Comma-joined skill tags
    pub skills: String,
    pub location: String,
    pub experience: String,
    pub salary: String,
}

/// Attributes scraped from a single detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAttributes {
    /// Raw job identifier text, e.g. "Job Id: 71234567"
    pub job_id: Option<String>,
    pub employment_type: Option<String>,
    /// Site-defined label (colon stripped) -> value
    pub attributes: BTreeMap<String, String>,
}

impl DetailAttributes {
    /// The all-empty value substituted for failed or skipped fetches
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.job_id.is_none() && self.employment_type.is_none() && self.attributes.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.attributes.get(label).map(String::as_str)
    }
}

/// A listing record joined with the attributes of its detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub listing: RawListingRecord,
    pub details: DetailAttributes,
}

impl EnrichedRecord {
    pub fn new(listing: RawListingRecord, details: DetailAttributes) -> Self {
        Self { listing, details }
    }

    /// Flatten into the typed column view. Empty or blank text counts as absent.
    pub fn into_row(self) -> JobRow {
        let EnrichedRecord { listing, details } = self;
        let attr = |column: Column| details.get(column.label()).and_then(present);

        JobRow {
            job_function: attr(Column::JobFunction),
            industry: attr(Column::Industry),
            specialization: attr(Column::Specialization),
            role: attr(Column::Role),
            qualification: attr(Column::Qualification),
            vacancies: attr(Column::Vacancies),
            hiring_location: attr(Column::HiringLocation),
            employment_type: details
                .employment_type
                .as_deref()
                .and_then(present)
                .or_else(|| attr(Column::EmploymentType)),
            job_id: details.job_id.as_deref().and_then(present),
            title: present(&listing.title),
            link: listing.link.as_deref().and_then(present),
            company_name: listing.company_name.as_deref().and_then(present),
            job_description: present(&listing.job_description),
            skills: present(&listing.skills),
            location: present(&listing.location),
            experience: present(&listing.experience),
            salary: present(&listing.salary),
        }
    }
}

fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Every column the pipeline knows about, in canonical output order.
/// `HiringLocation` is scraped but never part of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Title,
    Link,
    CompanyName,
    JobDescription,
    Skills,
    Location,
    Experience,
    Salary,
    JobId,
    JobFunction,
    Industry,
    Specialization,
    Role,
    Qualification,
    EmploymentType,
    Vacancies,
    HiringLocation,
}

impl Column {
    /// Canonical storage order
    pub const CANONICAL: [Column; 16] = [
        Column::Title,
        Column::Link,
        Column::CompanyName,
        Column::JobDescription,
        Column::Skills,
        Column::Location,
        Column::Experience,
        Column::Salary,
        Column::JobId,
        Column::JobFunction,
        Column::Industry,
        Column::Specialization,
        Column::Role,
        Column::Qualification,
        Column::EmploymentType,
        Column::Vacancies,
    ];

    /// Human label, matching the detail page label where one exists
    pub fn label(self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Link => "Link",
            Column::CompanyName => "Company Name",
            Column::JobDescription => "Job Description",
            Column::Skills => "Skills",
            Column::Location => "Location",
            Column::Experience => "Experience",
            Column::Salary => "Salary",
            Column::JobId => "Job ID",
            Column::JobFunction => "Job Function",
            Column::Industry => "Industry",
            Column::Specialization => "Specialization",
            Column::Role => "Role",
            Column::Qualification => "Qualification",
            Column::EmploymentType => "Employment Type",
            Column::Vacancies => "Vacancies",
            Column::HiringLocation => "Hiring Location",
        }
    }

    /// Storage column name
    pub fn sql_name(self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Link => "link",
            Column::CompanyName => "company_name",
            Column::JobDescription => "job_description",
            Column::Skills => "skills",
            Column::Location => "location",
            Column::Experience => "experience",
            Column::Salary => "salary",
            Column::JobId => "job_id",
            Column::JobFunction => "job_function",
            Column::Industry => "industry",
            Column::Specialization => "specialization",
            Column::Role => "role",
            Column::Qualification => "qualification",
            Column::EmploymentType => "employment_type",
            Column::Vacancies => "vacancies",
            Column::HiringLocation => "hiring_location",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed row of the raw record set. `None` is the "absent" state of a column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRow {
    pub title: Option<String>,
    pub link: Option<String>,
    pub company_name: Option<String>,
    pub job_description: Option<String>,
    pub skills: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub job_id: Option<String>,
    pub job_function: Option<String>,
    pub industry: Option<String>,
    pub specialization: Option<String>,
    pub role: Option<String>,
    pub qualification: Option<String>,
    pub employment_type: Option<String>,
    pub vacancies: Option<String>,
    pub hiring_location: Option<String>,
}

impl JobRow {
    pub fn get(&self, column: Column) -> Option<&str> {
        self.slot(column).as_deref()
    }

    pub fn set(&mut self, column: Column, value: Option<String>) {
        *self.slot_mut(column) = value;
    }

    pub fn take(&mut self, column: Column) -> Option<String> {
        self.slot_mut(column).take()
    }

    fn slot(&self, column: Column) -> &Option<String> {
        match column {
            Column::Title => &self.title,
            Column::Link => &self.link,
            Column::CompanyName => &self.company_name,
            Column::JobDescription => &self.job_description,
            Column::Skills => &self.skills,
            Column::Location => &self.location,
            Column::Experience => &self.experience,
            Column::Salary => &self.salary,
            Column::JobId => &self.job_id,
            Column::JobFunction => &self.job_function,
            Column::Industry => &self.industry,
            Column::Specialization => &self.specialization,
            Column::Role => &self.role,
            Column::Qualification => &self.qualification,
            Column::EmploymentType => &self.employment_type,
            Column::Vacancies => &self.vacancies,
            Column::HiringLocation => &self.hiring_location,
        }
    }

    fn slot_mut(&mut self, column: Column) -> &mut Option<String> {
        match column {
            Column::Title => &mut self.title,
            Column::Link => &mut self.link,
            Column::CompanyName => &mut self.company_name,
            Column::JobDescription => &mut self.job_description,
            Column::Skills => &mut self.skills,
            Column::Location => &mut self.location,
            Column::Experience => &mut self.experience,
            Column::Salary => &mut self.salary,
            Column::JobId => &mut self.job_id,
            Column::JobFunction => &mut self.job_function,
            Column::Industry => &mut self.industry,
            Column::Specialization => &mut self.specialization,
            Column::Role => &mut self.role,
            Column::Qualification => &mut self.qualification,
            Column::EmploymentType => &mut self.employment_type,
            Column::Vacancies => &mut self.vacancies,
            Column::HiringLocation => &mut self.hiring_location,
        }
    }
}

/// Errors raised when a row cannot become a canonical record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Required column '{0}' is absent")]
    MissingColumn(Column),

    #[error("Column '{column}' has invalid value '{value}'")]
    InvalidValue { column: Column, value: String },
}

/// A normalized job posting in the fixed storage schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: Option<String>,
    pub link: Option<String>,
    pub company_name: Option<String>,
    pub job_description: Option<String>,
    pub skills: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary: String,
    pub job_id: String,
    pub job_function: Option<String>,
    pub industry: Option<String>,
    pub specialization: Option<String>,
    pub role: String,
    pub qualification: String,
    pub employment_type: Option<String>,
    pub vacancies: u32,
}

impl TryFrom<JobRow> for CanonicalRecord {
    type Error = RecordError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let required = |value: Option<String>, column: Column| {
            value.ok_or(RecordError::MissingColumn(column))
        };

        let vacancies = match row.vacancies {
            Some(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|_| RecordError::InvalidValue {
                    column: Column::Vacancies,
                    value: text.clone(),
                })?,
            None => return Err(RecordError::MissingColumn(Column::Vacancies)),
        };

        Ok(Self {
            job_id: required(row.job_id, Column::JobId)?,
            salary: required(row.salary, Column::Salary)?,
            role: required(row.role, Column::Role)?,
            qualification: required(row.qualification, Column::Qualification)?,
            vacancies,
            title: row.title,
            link: row.link,
            company_name: row.company_name,
            job_description: row.job_description,
            skills: row.skills,
            location: row.location,
            experience: row.experience,
            job_function: row.job_function,
            industry: row.industry,
            specialization: row.specialization,
            employment_type: row.employment_type,
        })
    }
}
