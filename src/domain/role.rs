//! Rule-based role inference
//!
//! Fills a missing role from the title, specialization and job function
//! text. Rules form one ordered table: title rules, then specialization
//! rules, then job-function rules. The first substring hit wins.

use crate::domain::job::{Column, JobRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleCategory {
    QaEngineer,
    Developer,
    DataScientist,
    ProjectManager,
    Consultant,
    Intern,
    WebDesigner,
    TechnicalArchitect,
    SystemAdministrator,
    MarketingExecutive,
    HrExecutive,
    Dba,
    FrontendDeveloper,
    ErpCrmAnalyst,
    BusinessAnalyst,
    SystemAnalyst,
    NetworkEngineer,
    AdministrationManager,
    Other,
}

impl RoleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleCategory::QaEngineer => "QA Engineer",
            RoleCategory::Developer => "Developer",
            RoleCategory::DataScientist => "Data Scientist",
            RoleCategory::ProjectManager => "Project Manager",
            RoleCategory::Consultant => "Consultant",
            RoleCategory::Intern => "Intern",
            RoleCategory::WebDesigner => "Web Designer",
            RoleCategory::TechnicalArchitect => "Technical Architect",
            RoleCategory::SystemAdministrator => "System Administrator",
            RoleCategory::MarketingExecutive => "Marketing Executive",
            RoleCategory::HrExecutive => "HR Executive",
            RoleCategory::Dba => "DBA",
            RoleCategory::FrontendDeveloper => "Frontend Developer",
            RoleCategory::ErpCrmAnalyst => "ERP/CRM Analyst",
            RoleCategory::BusinessAnalyst => "Business Analyst",
            RoleCategory::SystemAnalyst => "System Analyst",
            RoleCategory::NetworkEngineer => "Network Engineer",
            RoleCategory::AdministrationManager => "Administration Manager",
            RoleCategory::Other => "Other",
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which input text a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    Title,
    Specialization,
    JobFunction,
}

/// Trigger substrings (lower case) mapped to a category
#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub source: RoleSource,
    pub triggers: &'static [&'static str],
    pub category: RoleCategory,
}

const fn rule(
    source: RoleSource,
    triggers: &'static [&'static str],
    category: RoleCategory,
) -> RoleRule {
    RoleRule { source, triggers, category }
}

/// Evaluation order is table order
#[rustfmt::skip]
pub const ROLE_RULES: &[RoleRule] = &[
    rule(RoleSource::Title, &["qa qc engineer", "quality assurance", "testing"], RoleCategory::QaEngineer),
    rule(RoleSource::Title, &["software engineer", "software developer"], RoleCategory::Developer),
    rule(RoleSource::Title, &["data engineer", "data science", "data scientist"], RoleCategory::DataScientist),
    rule(RoleSource::Title, &["project manager", "delivery manager", "it project manager"], RoleCategory::ProjectManager),
    rule(RoleSource::Title, &["consultant", "sap"], RoleCategory::Consultant),
    rule(RoleSource::Title, &["internship", "intern", "fresher"], RoleCategory::Intern),
    rule(RoleSource::Title, &["web designer", "graphic designer", "visualiser"], RoleCategory::WebDesigner),
    rule(RoleSource::Title, &["architect"], RoleCategory::TechnicalArchitect),
    rule(RoleSource::Title, &["administrator", "system admin"], RoleCategory::SystemAdministrator),
    rule(RoleSource::Title, &["marketing"], RoleCategory::MarketingExecutive),
    rule(RoleSource::Title, &["hr"], RoleCategory::HrExecutive),
    rule(RoleSource::Specialization, &["quality assurance/testing"], RoleCategory::QaEngineer),
    rule(RoleSource::Specialization, &["application programming"], RoleCategory::Developer),
    rule(RoleSource::Specialization, &["graphic designing", "web designing"], RoleCategory::WebDesigner),
    rule(RoleSource::Specialization, &["database administration"], RoleCategory::Dba),
    rule(RoleSource::Specialization, &["internet/e-commerce"], RoleCategory::FrontendDeveloper),
    rule(RoleSource::Specialization, &["erp/crm"], RoleCategory::ErpCrmAnalyst),
    rule(RoleSource::JobFunction, &["project leader", "project manager"], RoleCategory::ProjectManager),
    rule(RoleSource::JobFunction, &["business/systems analysis"], RoleCategory::BusinessAnalyst),
    rule(RoleSource::JobFunction, &["client server"], RoleCategory::SystemAnalyst),
    rule(RoleSource::JobFunction, &["network planning"], RoleCategory::NetworkEngineer),
    rule(RoleSource::JobFunction, &["administration"], RoleCategory::AdministrationManager),
];

/// Classify a posting. Absent inputs count as empty text.
pub fn infer_role(
    title: Option<&str>,
    specialization: Option<&str>,
    job_function: Option<&str>,
) -> RoleCategory {
    let title = title.unwrap_or_default().to_lowercase();
    let specialization = specialization.unwrap_or_default().to_lowercase();
    let job_function = job_function.unwrap_or_default().to_lowercase();

    ROLE_RULES
        .iter()
        .find(|rule| {
            let haystack = match rule.source {
                RoleSource::Title => &title,
                RoleSource::Specialization => &specialization,
                RoleSource::JobFunction => &job_function,
            };
            rule.triggers.iter().any(|trigger| haystack.contains(trigger))
        })
        .map_or(RoleCategory::Other, |rule| rule.category)
}

/// Fill the role of every row that has none. Returns how many were filled.
pub fn infer_roles(rows: &mut [JobRow]) -> usize {
    let mut filled = 0;
    for row in rows.iter_mut().filter(|row| row.role.is_none()) {
        let category = infer_role(
            row.get(Column::Title),
            row.get(Column::Specialization),
            row.get(Column::JobFunction),
        );
        row.set(Column::Role, Some(category.as_str().to_string()));
        filled += 1;
    }
    debug!("Inferred roles for {} of {} rows", filled, rows.len());
    filled
}
