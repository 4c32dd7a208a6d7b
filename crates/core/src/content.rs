//! The CV content model.
//!
//! Content is loaded once as a unit and shared read-only between the
//! preview and the export path. Nothing in this crate mutates it.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contact details shown in the document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

/// Skill lists, each rendered as its own sidebar section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub core: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// One experience entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub company: String,
    pub role: String,
    pub period: String,
    /// Employment type, e.g. "Full-time" or "Internship".
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

/// One education entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub institution: String,
    pub degree: String,
    pub years: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Root aggregate of everything the document shows.
///
/// `experience` is reverse-chronological and its order is preserved through
/// pagination, as is the order of `education`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvContent {
    pub name: String,
    pub title: String,
    pub contact: Contact,
    pub summary: String,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub experience: Vec<Job>,
    #[serde(default)]
    pub education: Vec<Degree>,
    #[serde(default)]
    pub certificates: Vec<String>,
    #[serde(default)]
    pub ethics: String,
}

impl CvContent {
    /// Parse content from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::ContentLoad(e.to_string()))
    }

    /// Load content from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExportError::ContentLoad(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::ContentLoad(e.to_string()))
    }

    /// Uppercase initials of the person's name, used by the photo placeholder.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Built-in sample content used when no content file is supplied.
    pub fn sample() -> Self {
        Self {
            name: "Jordan Avery".to_string(),
            title: "Education Data Manager & Data Analyst".to_string(),
            contact: Contact {
                email: "jordan.avery@example.com".to_string(),
                phone: "+44 20 7946 0958".to_string(),
                location: "London, United Kingdom".to_string(),
                nationality: "British".to_string(),
                linkedin: None,
            },
            summary: "Data analytics professional specialised in building sustainable data \
                management systems for educational institutions: collecting, cleaning, \
                cataloguing and reporting academic and administrative data. Six years of \
                experience producing dashboards, impact analyses and decision-support models \
                with Python, Power BI, advanced Excel, SQL and SPSS, applying regression, \
                correlation, decision trees, K-Means and Naive Bayes. Experienced in GDPR \
                compliant data protection practice."
                .to_string(),
            skills: Skills {
                core: vec![
                    "Data Management & Metadata Organisation".to_string(),
                    "Education Data Analytics".to_string(),
                    "Regression & Correlation Analysis".to_string(),
                    "Decision Trees & K-Means".to_string(),
                    "GDPR Compliant Data Retention".to_string(),
                    "Decision Support Systems".to_string(),
                    "Process Analysis & KPI Reporting".to_string(),
                ],
                technical: vec![
                    "Python (Pandas, NumPy)".to_string(),
                    "Microsoft Power BI (DAX, Dashboards)".to_string(),
                    "SQL (Querying, Data Management)".to_string(),
                    "SPSS (Advanced Statistics)".to_string(),
                    "Excel (Power Query, Pivot, VBA)".to_string(),
                    "Git / Version Control".to_string(),
                ],
                languages: vec![
                    "English (Native)".to_string(),
                    "German (Advanced)".to_string(),
                ],
            },
            experience: vec![
                Job {
                    company: "Northfield Research".to_string(),
                    role: "Data Executive".to_string(),
                    period: "2022 – 2025".to_string(),
                    kind: "Full-time".to_string(),
                    location: None,
                    description: vec![
                        "Ran regression, correlation and segmentation analyses on large survey datasets to produce strategic insight.".to_string(),
                        "Built multi-dimensional performance reports with Python, Excel, SPSS and Power BI.".to_string(),
                        "Designed automated quality checks that cut data cleaning time by 30%.".to_string(),
                        "Prepared executive dashboards that simplified complex data for 12 regional managers.".to_string(),
                    ],
                },
                Job {
                    company: "Kingsbridge University".to_string(),
                    role: "Institutional Data & Reporting Specialist".to_string(),
                    period: "2019 – 2022".to_string(),
                    kind: "Full-time".to_string(),
                    location: None,
                    description: vec![
                        "Managed collection, cleaning, storage and reporting of academic and administrative data end to end.".to_string(),
                        "Set up a data management system and metadata structures suited to K12 and higher education.".to_string(),
                        "Developed academic performance analyses, risk maps and decision-support reports in Python and SPSS.".to_string(),
                        "Designed GDPR compliant security models and access hierarchies.".to_string(),
                    ],
                },
                Job {
                    company: "Harrow Foods".to_string(),
                    role: "HR Reporting Intern".to_string(),
                    period: "2017".to_string(),
                    kind: "Internship".to_string(),
                    location: None,
                    description: vec![
                        "Processed and validated timesheet, shift and personnel data with Excel based reporting.".to_string(),
                        "Ran routine quality checks to keep HR data consistent.".to_string(),
                    ],
                },
                Job {
                    company: "Parkside Hotel".to_string(),
                    role: "HR Intern".to_string(),
                    period: "2017".to_string(),
                    kind: "Internship".to_string(),
                    location: None,
                    description: vec![
                        "Supported digitisation and upkeep of personnel records.".to_string(),
                    ],
                },
            ],
            education: vec![
                Degree {
                    institution: "Kingsbridge University".to_string(),
                    degree: "Business Administration (MBA)".to_string(),
                    years: "Thesis stage".to_string(),
                    details: Some(
                        "Focus on management, strategic decision making and process analysis."
                            .to_string(),
                    ),
                },
                Degree {
                    institution: "University of Eastbrook".to_string(),
                    degree: "Psychology (BSc)".to_string(),
                    years: "2011 – 2019".to_string(),
                    details: Some(
                        "Developmental psychology, research methods and statistical analysis."
                            .to_string(),
                    ),
                },
                Degree {
                    institution: "Riverside College".to_string(),
                    degree: "Science Programme".to_string(),
                    years: "2005 – 2009".to_string(),
                    details: None,
                },
            ],
            certificates: vec![
                "Google Data Analytics Certificate".to_string(),
                "IBM Applied Data Science".to_string(),
                "Microsoft Power BI Data Analyst".to_string(),
                "Data-Driven Decision Making".to_string(),
            ],
            ethics: "Committed to child safeguarding principles and professional ethics. \
                Treats GDPR standards, transparency and confidentiality as core principles \
                of data management."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_four_jobs() {
        let cv = CvContent::sample();
        assert_eq!(cv.experience.len(), 4);
        assert_eq!(cv.education.len(), 3);
        assert!(cv.contact.linkedin.is_none());
    }

    #[test]
    fn test_initials() {
        let cv = CvContent::sample();
        assert_eq!(cv.initials(), "JA");
    }

    #[test]
    fn test_initials_single_word() {
        let mut cv = CvContent::sample();
        cv.name = "plato".to_string();
        assert_eq!(cv.initials(), "P");
    }

    #[test]
    fn test_job_type_field_name_on_wire() {
        let cv = CvContent::sample();
        let json = cv.to_json_pretty().unwrap();
        assert!(json.contains("\"type\": \"Full-time\""));
        assert!(!json.contains("\"kind\""));
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let cv = CvContent::sample();
        let parsed = CvContent::from_json_str(&cv.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, cv);
    }

    #[test]
    fn test_missing_optional_sections_default() {
        let json = r#"{
            "name": "A B",
            "title": "T",
            "contact": {"email": "a@b.c", "phone": "1", "location": "X"},
            "summary": "S"
        }"#;
        let cv = CvContent::from_json_str(json).unwrap();
        assert!(cv.experience.is_empty());
        assert!(cv.skills.core.is_empty());
        assert_eq!(cv.ethics, "");
    }

    #[test]
    fn test_invalid_json_is_content_error() {
        let result = CvContent::from_json_str("{ not json");
        assert!(matches!(result, Err(ExportError::ContentLoad(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = CvContent::from_path("/nonexistent/cv.json");
        match result {
            Err(ExportError::ContentLoad(msg)) => assert!(msg.contains("/nonexistent/cv.json")),
            other => panic!("Expected ContentLoad, got {:?}", other),
        }
    }
}
