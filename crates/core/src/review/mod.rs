//! Read-only content and layout review.
//!
//! [`diagnose`] flags content likely to break the two-page layout.
//! [`score`] grades content, ATS friendliness and visual design, the last
//! from ink measurements of an exported PDF. Neither feeds back into
//! rendering.

pub mod ink;
pub mod pdf_scan;

pub use ink::InkStats;
pub use pdf_scan::PdfScanner;

use crate::content::CvContent;
use serde::Serialize;

/// Summary length above which a third page becomes likely.
pub const SUMMARY_OVERFLOW_CHARS: usize = 600;
/// Technical skills beyond this push the sidebar down.
pub const MAX_TECHNICAL_SKILLS: usize = 10;
/// Certificates beyond this risk a phantom third page.
pub const MAX_CERTIFICATES: usize = 5;

/// Terms recruiters' systems commonly screen for.
const ATS_KEYWORDS: [&str; 5] = ["Python", "SQL", "Analysis", "Reporting", "Management"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: &'static str,
    pub issue: String,
    /// False for checks that passed and are reported for reassurance.
    pub detected: bool,
    pub description: String,
    pub severity: Severity,
}

/// Check content against the limits of the fixed two-page layout.
pub fn diagnose(content: &CvContent) -> Vec<Finding> {
    let mut findings = Vec::new();

    let summary_len = content.summary.chars().count();
    if summary_len > SUMMARY_OVERFLOW_CHARS {
        findings.push(Finding {
            id: "overflow-risk",
            issue: "High overflow risk (summary)".to_string(),
            detected: true,
            description: format!(
                "The summary is {} characters. Beyond {} characters a third page becomes likely.",
                summary_len, SUMMARY_OVERFLOW_CHARS
            ),
            severity: Severity::High,
        });
    }

    if content.contact.linkedin.is_none() {
        findings.push(Finding {
            id: "ats-linkedin",
            issue: "ATS gap (LinkedIn)".to_string(),
            detected: true,
            description: "No LinkedIn profile. Applicant tracking systems look for one."
                .to_string(),
            severity: Severity::Medium,
        });
    }

    let technical = content.skills.technical.len();
    if technical > MAX_TECHNICAL_SKILLS {
        findings.push(Finding {
            id: "layout-balance",
            issue: "Sidebar imbalance".to_string(),
            detected: true,
            description: format!(
                "{} technical skills. The sidebar may push the first page past its bottom edge.",
                technical
            ),
            severity: Severity::Medium,
        });
    }

    if content.certificates.len() > MAX_CERTIFICATES {
        findings.push(Finding {
            id: "phantom-page",
            issue: "Third page risk (certificates)".to_string(),
            detected: true,
            description: "The certificate list is long enough to spill onto a third page."
                .to_string(),
            severity: Severity::High,
        });
    } else {
        findings.push(Finding {
            id: "phantom-page-ok",
            issue: "Page structure (safe)".to_string(),
            detected: false,
            description: "Content density fits within the A4 pages.".to_string(),
            severity: Severity::Low,
        });
    }

    findings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Content,
    Ats,
    Design,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub text: String,
    pub kind: IssueKind,
}

impl Issue {
    fn new(kind: IssueKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    fn check(ok: bool, pass: &str, fail: &str, fail_kind: IssueKind) -> Self {
        if ok {
            Self::new(IssueKind::Success, pass)
        } else {
            Self::new(fail_kind, fail)
        }
    }
}

/// Score for one review category, 0 to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub title: String,
    pub score: u8,
    pub issues: Vec<Issue>,
    pub advice: String,
}

/// Grade the content and, when available, the ink measurements of the
/// exported PDF named `file_name`.
pub fn score(content: &CvContent, ink: Option<&InkStats>, file_name: &str) -> Vec<CategoryScore> {
    vec![
        content_score(content),
        ats_score(content, file_name),
        design_score(ink),
    ]
}

fn content_score(content: &CvContent) -> CategoryScore {
    let has_metrics = content
        .experience
        .iter()
        .flat_map(|job| &job.description)
        .any(|line| line.chars().any(|c| c.is_ascii_digit()));
    let summary_len = content.summary.chars().count();
    let summary_ok = summary_len > 300 && summary_len < 800;

    CategoryScore {
        category: Category::Content,
        title: "Content and impact".to_string(),
        score: if has_metrics { 85 } else { 60 },
        issues: vec![
            Issue::check(
                has_metrics,
                "Experience entries include measurable results.",
                "Experience entries lack concrete numbers (%, amounts, counts).",
                IssueKind::Error,
            ),
            Issue::check(
                summary_ok,
                "Summary length is in the ideal range.",
                "Summary is either too short or too long.",
                IssueKind::Warning,
            ),
        ],
        advice: if has_metrics {
            "Strong content. Consider adding wording that highlights leadership.".to_string()
        } else {
            "Recruiters look for outcomes. Phrase entries as 'did X, achieving Y'.".to_string()
        },
    }
}

fn ats_score(content: &CvContent, file_name: &str) -> CategoryScore {
    let file_name_ok = !file_name.contains(' ');
    let haystack = serde_json::to_string(content).unwrap_or_default();
    let has_keywords = ATS_KEYWORDS.iter().any(|k| haystack.contains(k));
    let has_linkedin = content.contact.linkedin.is_some();

    CategoryScore {
        category: Category::Ats,
        title: "Applicant tracking compatibility".to_string(),
        score: if file_name_ok && has_keywords { 90 } else { 70 },
        issues: vec![
            Issue::check(
                file_name_ok,
                "File name is ATS friendly.",
                "File name contains spaces. Use a name like 'First_Last_CV.pdf'.",
                IssueKind::Error,
            ),
            Issue::check(
                has_linkedin,
                "LinkedIn profile present.",
                "LinkedIn profile missing.",
                IssueKind::Error,
            ),
        ],
        advice: "File naming and keywords feed straight into ATS ranking. Mirror the \
                 terms used in the job posting in your skills."
            .to_string(),
    }
}

fn design_score(ink: Option<&InkStats>) -> CategoryScore {
    let mut score: i32 = 80;
    let mut issues = Vec::new();

    match ink {
        Some(stats) => {
            if stats.density < 0.04 {
                issues.push(Issue::new(IssueKind::Warning, "Page looks sparse (low ink density)."));
                score -= 10;
            } else if stats.density > 0.18 {
                issues.push(Issue::new(IssueKind::Warning, "Page looks crowded and may be hard to read."));
                score -= 10;
            } else {
                issues.push(Issue::new(IssueKind::Success, "Ink density is well balanced."));
                score += 5;
            }

            if stats.top_margin_mm < 10.0 || stats.left_margin_mm < 10.0 {
                issues.push(Issue::new(
                    IssueKind::Error,
                    "Margins are narrower than 10mm and may be cut off when printed.",
                ));
                score -= 15;
            } else {
                issues.push(Issue::new(
                    IssueKind::Success,
                    format!("Margins are safe ({:.1}mm).", stats.left_margin_mm),
                ));
                score += 5;
            }
        }
        None => issues.push(Issue::new(
            IssueKind::Warning,
            "Visual analysis unavailable (PDF could not be read).",
        )),
    }

    CategoryScore {
        category: Category::Design,
        title: "Visual design".to_string(),
        score: score.clamp(0, 100) as u8,
        issues,
        advice: "International CVs keep margins of at least 12.7mm (0.5in). Leave white \
                 space for readability."
            .to_string(),
    }
}
