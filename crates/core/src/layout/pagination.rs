//! Static section-to-page assignment.
//!
//! Pages are split by section identity and a fixed count of experience
//! entries, never by measured height. The split is therefore identical for
//! every backend and every photo, at the price of possible overflow or
//! trailing whitespace when entries are unusually long or short.

use super::RenderMode;
use crate::content::CvContent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of one piece of content placed on a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentRef {
    Header,
    Summary,
    Job(usize),
    Degree(usize),
    CoreSkills,
    TechnicalSkills,
    Languages,
    Certificates,
    Ethics,
    Footer,
}

/// Where a piece of content sits on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    FullWidth,
    Main,
    Sidebar,
}

impl ContentRef {
    /// Sections that appear exactly once regardless of content size.
    pub const FIXED: [ContentRef; 8] = [
        ContentRef::Header,
        ContentRef::Summary,
        ContentRef::CoreSkills,
        ContentRef::TechnicalSkills,
        ContentRef::Languages,
        ContentRef::Certificates,
        ContentRef::Ethics,
        ContentRef::Footer,
    ];

    pub fn region(&self) -> Region {
        match self {
            ContentRef::Header | ContentRef::Footer => Region::FullWidth,
            ContentRef::Summary | ContentRef::Job(_) | ContentRef::Degree(_) => Region::Main,
            ContentRef::CoreSkills
            | ContentRef::TechnicalSkills
            | ContentRef::Languages
            | ContentRef::Certificates
            | ContentRef::Ethics => Region::Sidebar,
        }
    }
}

/// Static pagination rule for export mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
    /// Experience entries placed on the first page; the rest go to page two.
    /// Default: 2.
    pub first_page_jobs: usize,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self { first_page_jobs: 2 }
    }
}

/// Contiguous slice of the CV assigned to one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBlock {
    pub index: usize,
    pub items: Vec<ContentRef>,
}

impl PageBlock {
    /// Experience indices on this page, in order.
    pub fn jobs(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ContentRef::Job(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    /// Education indices on this page, in order.
    pub fn degrees(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ContentRef::Degree(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, item: ContentRef) -> bool {
        self.items.contains(&item)
    }

    /// Items in one region, in order.
    pub fn in_region(&self, region: Region) -> Vec<ContentRef> {
        self.items
            .iter()
            .copied()
            .filter(|item| item.region() == region)
            .collect()
    }
}

/// Assign the CV's content to page blocks.
///
/// Preview mode yields one block in reading order. Export mode yields two:
/// header, summary, the first `first_page_jobs` entries and the skill and
/// language lists on page one; the remaining entries, education,
/// certificates, ethics and the footer on page two.
pub fn plan_pages(content: &CvContent, mode: RenderMode, policy: &PaginationPolicy) -> Vec<PageBlock> {
    let jobs = content.experience.len();
    let degrees = content.education.len();

    match mode {
        RenderMode::Preview => {
            let mut items = vec![ContentRef::Header, ContentRef::Summary];
            items.extend((0..jobs).map(ContentRef::Job));
            items.extend((0..degrees).map(ContentRef::Degree));
            items.extend([
                ContentRef::CoreSkills,
                ContentRef::TechnicalSkills,
                ContentRef::Languages,
                ContentRef::Certificates,
                ContentRef::Ethics,
                ContentRef::Footer,
            ]);
            vec![PageBlock { index: 0, items }]
        }
        RenderMode::Export => {
            let split = policy.first_page_jobs.min(jobs);

            let mut first = vec![ContentRef::Header, ContentRef::Summary];
            first.extend((0..split).map(ContentRef::Job));
            first.extend([
                ContentRef::CoreSkills,
                ContentRef::TechnicalSkills,
                ContentRef::Languages,
            ]);

            let mut second: Vec<ContentRef> = (split..jobs).map(ContentRef::Job).collect();
            second.extend((0..degrees).map(ContentRef::Degree));
            second.extend([ContentRef::Certificates, ContentRef::Ethics, ContentRef::Footer]);

            vec![
                PageBlock {
                    index: 0,
                    items: first,
                },
                PageBlock {
                    index: 1,
                    items: second,
                },
            ]
        }
    }
}

/// A violation of the pagination completeness invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("{0:?} is missing from every page")]
    Missing(ContentRef),

    #[error("{0:?} appears on more than one page")]
    Duplicated(ContentRef),

    #[error("{0:?} is out of order")]
    OutOfOrder(ContentRef),

    #[error("{0:?} does not exist in the content")]
    Unknown(ContentRef),
}

/// Check that the blocks, concatenated in order, contain every job, every
/// degree and every fixed section exactly once, with jobs and degrees in
/// their original order.
pub fn check_complete(content: &CvContent, blocks: &[PageBlock]) -> Result<(), PaginationError> {
    let items: Vec<ContentRef> = blocks.iter().flat_map(|b| b.items.iter().copied()).collect();

    let mut next_job = 0;
    let mut next_degree = 0;
    let mut seen_fixed: Vec<ContentRef> = Vec::new();

    for item in &items {
        match *item {
            ContentRef::Job(i) => {
                if i >= content.experience.len() {
                    return Err(PaginationError::Unknown(*item));
                }
                if i < next_job {
                    return Err(PaginationError::Duplicated(*item));
                }
                if i > next_job {
                    return Err(PaginationError::OutOfOrder(*item));
                }
                next_job += 1;
            }
            ContentRef::Degree(i) => {
                if i >= content.education.len() {
                    return Err(PaginationError::Unknown(*item));
                }
                if i < next_degree {
                    return Err(PaginationError::Duplicated(*item));
                }
                if i > next_degree {
                    return Err(PaginationError::OutOfOrder(*item));
                }
                next_degree += 1;
            }
            fixed => {
                if seen_fixed.contains(&fixed) {
                    return Err(PaginationError::Duplicated(fixed));
                }
                seen_fixed.push(fixed);
            }
        }
    }

    if next_job < content.experience.len() {
        return Err(PaginationError::Missing(ContentRef::Job(next_job)));
    }
    if next_degree < content.education.len() {
        return Err(PaginationError::Missing(ContentRef::Degree(next_degree)));
    }
    if let Some(missing) = ContentRef::FIXED.iter().find(|f| !seen_fixed.contains(f)) {
        return Err(PaginationError::Missing(*missing));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Job;

    fn content_with_jobs(n: usize) -> CvContent {
        let mut cv = CvContent::sample();
        let template = cv.experience[0].clone();
        cv.experience = (0..n)
            .map(|i| Job {
                company: format!("Company {}", i),
                ..template.clone()
            })
            .collect();
        cv
    }

    // ========== plan_pages tests ==========

    #[test]
    fn test_four_jobs_split_two_and_two() {
        let cv = content_with_jobs(4);
        let blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].jobs(), vec![0, 1]);
        assert_eq!(blocks[1].jobs(), vec![2, 3]);
    }

    #[test]
    fn test_export_first_page_sections() {
        let cv = CvContent::sample();
        let blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());

        let first = &blocks[0];
        assert!(first.contains(ContentRef::Header));
        assert!(first.contains(ContentRef::Summary));
        assert!(first.contains(ContentRef::CoreSkills));
        assert!(first.contains(ContentRef::TechnicalSkills));
        assert!(first.contains(ContentRef::Languages));
        assert!(first.degrees().is_empty());

        let second = &blocks[1];
        assert_eq!(second.degrees(), vec![0, 1, 2]);
        assert!(second.contains(ContentRef::Certificates));
        assert!(second.contains(ContentRef::Ethics));
        assert!(second.contains(ContentRef::Footer));
        assert!(!second.contains(ContentRef::Header));
    }

    #[test]
    fn test_fewer_jobs_than_split() {
        let cv = content_with_jobs(1);
        let blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        assert_eq!(blocks[0].jobs(), vec![0]);
        assert!(blocks[1].jobs().is_empty());
        assert!(check_complete(&cv, &blocks).is_ok());
    }

    #[test]
    fn test_no_jobs() {
        let cv = content_with_jobs(0);
        let blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        assert!(blocks.iter().all(|b| b.jobs().is_empty()));
        assert!(check_complete(&cv, &blocks).is_ok());
    }

    #[test]
    fn test_custom_split() {
        let cv = content_with_jobs(5);
        let policy = PaginationPolicy { first_page_jobs: 3 };
        let blocks = plan_pages(&cv, RenderMode::Export, &policy);
        assert_eq!(blocks[0].jobs(), vec![0, 1, 2]);
        assert_eq!(blocks[1].jobs(), vec![3, 4]);
    }

    #[test]
    fn test_preview_is_single_block() {
        let cv = content_with_jobs(4);
        let blocks = plan_pages(&cv, RenderMode::Preview, &PaginationPolicy::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].jobs(), vec![0, 1, 2, 3]);
        assert_eq!(blocks[0].items.first(), Some(&ContentRef::Header));
        assert_eq!(blocks[0].items.last(), Some(&ContentRef::Footer));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let cv = CvContent::sample();
        let policy = PaginationPolicy::default();
        assert_eq!(
            plan_pages(&cv, RenderMode::Export, &policy),
            plan_pages(&cv, RenderMode::Export, &policy)
        );
    }

    #[test]
    fn test_regions() {
        let cv = CvContent::sample();
        let blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        assert_eq!(
            blocks[0].in_region(Region::Sidebar),
            vec![
                ContentRef::CoreSkills,
                ContentRef::TechnicalSkills,
                ContentRef::Languages
            ]
        );
        assert_eq!(
            blocks[0].in_region(Region::Main),
            vec![ContentRef::Summary, ContentRef::Job(0), ContentRef::Job(1)]
        );
    }

    // ========== check_complete tests ==========

    #[test]
    fn test_completeness_holds_for_many_sizes() {
        for jobs in 0..8 {
            for split in 0..10 {
                let cv = content_with_jobs(jobs);
                let policy = PaginationPolicy {
                    first_page_jobs: split,
                };
                for mode in [RenderMode::Preview, RenderMode::Export] {
                    let blocks = plan_pages(&cv, mode, &policy);
                    assert_eq!(
                        check_complete(&cv, &blocks),
                        Ok(()),
                        "jobs={} split={} mode={:?}",
                        jobs,
                        split,
                        mode
                    );
                }
            }
        }
    }

    #[test]
    fn test_detects_missing_job() {
        let cv = content_with_jobs(3);
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        blocks[1].items.retain(|i| *i != ContentRef::Job(2));
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::Missing(ContentRef::Job(2)))
        );
    }

    #[test]
    fn test_detects_duplicated_job() {
        let cv = content_with_jobs(3);
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        blocks[1].items.insert(0, ContentRef::Job(1));
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::Duplicated(ContentRef::Job(1)))
        );
    }

    #[test]
    fn test_detects_reordered_degrees() {
        let cv = CvContent::sample();
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        let pos = blocks[1]
            .items
            .iter()
            .position(|i| *i == ContentRef::Degree(0))
            .unwrap();
        blocks[1].items.swap(pos, pos + 1);
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::OutOfOrder(ContentRef::Degree(1)))
        );
    }

    #[test]
    fn test_detects_duplicated_fixed_section() {
        let cv = CvContent::sample();
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        blocks[1].items.push(ContentRef::Summary);
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::Duplicated(ContentRef::Summary))
        );
    }

    #[test]
    fn test_detects_unknown_entry() {
        let cv = content_with_jobs(2);
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        blocks[1].items.insert(0, ContentRef::Job(2));
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::Unknown(ContentRef::Job(2)))
        );
    }

    #[test]
    fn test_detects_missing_fixed_section() {
        let cv = CvContent::sample();
        let mut blocks = plan_pages(&cv, RenderMode::Export, &PaginationPolicy::default());
        blocks[1].items.retain(|i| *i != ContentRef::Ethics);
        assert_eq!(
            check_complete(&cv, &blocks),
            Err(PaginationError::Missing(ContentRef::Ethics))
        );
    }
}
