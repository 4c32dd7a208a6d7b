//! Builds page nodes from content and a page plan.

use super::pagination::{ContentRef, PageBlock, Region};
use super::tree::*;
use crate::asset::ProfileAsset;
use crate::config::{ExportConfig, Labels};
use crate::content::{CvContent, Degree, Job};

const PHOTO_WIDTH: f32 = 120.0;
const PHOTO_HEIGHT: f32 = 150.0;
const ACCENT_HEIGHT: f32 = 12.0;
const ROW_GAP: f32 = 32.0;
const SECTION_GAP: f32 = 24.0;

/// Inputs shared by every page built for one render.
pub(crate) struct PageBuilder<'a> {
    pub content: &'a CvContent,
    pub photo: Option<&'a ProfileAsset>,
    pub config: &'a ExportConfig,
}

impl<'a> PageBuilder<'a> {
    fn labels(&self) -> &Labels {
        &self.config.labels
    }

    /// Build the page node for one block.
    pub fn page(&self, block: &PageBlock, min_height: Option<f32>) -> PageNode {
        let padding = self.config.page.padding_px();
        let mut children = Vec::new();

        if block.contains(ContentRef::Header) {
            children.push(self.header());
        }

        let main = self.main_column(block);
        let sidebar = self.sidebar_column(block);
        if !main.is_empty() || !sidebar.is_empty() {
            children.push(Node::Row(RowNode {
                gap: ROW_GAP,
                columns: vec![
                    Column {
                        span: 8,
                        children: main,
                    },
                    Column {
                        span: 4,
                        children: sidebar,
                    },
                ],
            }));
        }

        if block.contains(ContentRef::Footer) {
            children.push(self.footer());
        }

        PageNode {
            index: block.index,
            width: self.config.page.width_px(),
            min_height,
            padding: Edges {
                top: padding + ACCENT_HEIGHT,
                right: padding,
                bottom: padding,
                left: padding,
            },
            background: Color::from_tuple(self.config.raster.background_color),
            background_image: None,
            accent: Some(Border::new(ACCENT_HEIGHT, Color::SLATE_800)),
            children,
        }
    }

    fn header(&self) -> Node {
        let cv = self.content;
        let contact = &cv.contact;

        let mut contact_line = vec![
            contact.email.as_str(),
            contact.phone.as_str(),
            contact.location.as_str(),
        ];
        if let Some(linkedin) = contact.linkedin.as_deref() {
            contact_line.push(linkedin);
        }
        contact_line.retain(|part| !part.is_empty());

        let mut identity = vec![
            text(&cv.name, TextStyle::new(34.0).bold().color(Color::SLATE_900).line_height(1.15)),
            text(
                &cv.title,
                TextStyle::new(16.0).bold().uppercase().color(Color::BLUE_700),
            ),
            text(
                &contact_line.join("  |  "),
                TextStyle::new(12.0).color(Color::SLATE_600),
            ),
        ];
        if !contact.nationality.is_empty() {
            identity.push(text(
                &contact.nationality,
                TextStyle::new(12.0).color(Color::SLATE_500),
            ));
        }

        let portrait = match self.photo {
            Some(photo) => Node::Image(ImageNode {
                image: ImageRef(photo.clone()),
                width: PHOTO_WIDTH,
                height: PHOTO_HEIGHT,
            }),
            None => Node::Placeholder(PlaceholderNode {
                label: cv.initials(),
                width: PHOTO_WIDTH,
                height: PHOTO_HEIGHT,
                background: Color::SLATE_100,
                color: Color::SLATE_400,
            }),
        };

        Node::Block(BlockNode {
            tag: Some(ContentRef::Header),
            style: BoxStyle {
                padding: Edges::bottom(16.0),
                margin_bottom: SECTION_GAP,
                border_bottom: Some(Border::new(2.0, Color::SLATE_200)),
                avoid_break: true,
                ..Default::default()
            },
            children: vec![Node::Row(RowNode {
                gap: 24.0,
                columns: vec![
                    Column {
                        span: 9,
                        children: identity,
                    },
                    Column {
                        span: 3,
                        children: vec![portrait],
                    },
                ],
            })],
        })
    }

    fn main_column(&self, block: &PageBlock) -> Vec<Node> {
        let mut nodes = Vec::new();
        let items = block.in_region(Region::Main);

        if items.contains(&ContentRef::Summary) {
            nodes.push(heading(&self.labels().summary));
            nodes.push(tagged(
                ContentRef::Summary,
                section_style(),
                vec![text(
                    &self.content.summary,
                    TextStyle::new(13.0).align(TextAlign::Justify),
                )],
            ));
        }

        let jobs = block.jobs();
        if let Some(&first) = jobs.first() {
            let label = if first > 0 {
                &self.labels().experience_continued
            } else {
                &self.labels().experience
            };
            nodes.push(heading(label));
            for index in jobs {
                nodes.push(self.job(index, &self.content.experience[index]));
            }
        }

        let degrees = block.degrees();
        if !degrees.is_empty() {
            nodes.push(heading(&self.labels().education));
            for index in degrees {
                nodes.push(self.degree(index, &self.content.education[index]));
            }
        }

        nodes
    }

    fn job(&self, index: usize, job: &Job) -> Node {
        let mut meta = job.kind.clone();
        if let Some(location) = job.location.as_deref() {
            meta = format!("{} · {}", meta, location);
        }

        let mut children = vec![Node::Row(RowNode {
            gap: 8.0,
            columns: vec![
                Column {
                    span: 8,
                    children: vec![
                        text(&job.role, TextStyle::new(15.0).bold().color(Color::SLATE_900)),
                        text(&job.company, TextStyle::new(13.0).bold().color(Color::BLUE_600)),
                    ],
                },
                Column {
                    span: 4,
                    children: vec![
                        text(
                            &job.period,
                            TextStyle::new(12.0)
                                .bold()
                                .color(Color::SLATE_500)
                                .align(TextAlign::Right),
                        ),
                        text(
                            &meta,
                            TextStyle::new(11.0)
                                .italic()
                                .color(Color::SLATE_400)
                                .align(TextAlign::Right),
                        ),
                    ],
                },
            ],
        })];

        children.extend(
            job.description
                .iter()
                .map(|line| text(&format!("• {}", line), TextStyle::new(12.5))),
        );

        tagged(
            ContentRef::Job(index),
            BoxStyle {
                padding: Edges::left(14.0),
                margin_bottom: 18.0,
                border_left: Some(Border::new(2.0, Color::SLATE_200)),
                avoid_break: true,
                ..Default::default()
            },
            children,
        )
    }

    fn degree(&self, index: usize, degree: &Degree) -> Node {
        let mut children = vec![
            text(&degree.degree, TextStyle::new(14.0).bold().color(Color::SLATE_900)),
            text(
                &format!("{}, {}", degree.institution, degree.years),
                TextStyle::new(12.5).color(Color::SLATE_600),
            ),
        ];
        if let Some(details) = degree.details.as_deref() {
            children.push(text(
                details,
                TextStyle::new(12.0).italic().color(Color::SLATE_500),
            ));
        }

        tagged(
            ContentRef::Degree(index),
            BoxStyle {
                margin_bottom: 14.0,
                avoid_break: true,
                ..Default::default()
            },
            children,
        )
    }

    fn sidebar_column(&self, block: &PageBlock) -> Vec<Node> {
        let cv = self.content;
        let labels = self.labels();
        let mut nodes = Vec::new();

        for item in block.in_region(Region::Sidebar) {
            let (label, body): (&str, Vec<Node>) = match item {
                ContentRef::CoreSkills => (labels.core_skills.as_str(), bullet_list(&cv.skills.core)),
                ContentRef::TechnicalSkills => {
                    (labels.technical_skills.as_str(), bullet_list(&cv.skills.technical))
                }
                ContentRef::Languages => (labels.languages.as_str(), bullet_list(&cv.skills.languages)),
                ContentRef::Certificates => (labels.certificates.as_str(), bullet_list(&cv.certificates)),
                ContentRef::Ethics => (
                    labels.ethics.as_str(),
                    vec![text(&cv.ethics, TextStyle::new(12.0).color(Color::SLATE_600))],
                ),
                _ => continue,
            };

            let mut children = vec![heading(label)];
            children.extend(body);
            nodes.push(tagged(
                item,
                BoxStyle {
                    padding: Edges::all(12.0),
                    margin_bottom: 16.0,
                    background: Some(Color::SLATE_50),
                    avoid_break: true,
                    ..Default::default()
                },
                children,
            ));
        }

        nodes
    }

    fn footer(&self) -> Node {
        let cv = self.content;
        tagged(
            ContentRef::Footer,
            BoxStyle {
                padding: Edges::top(12.0),
                margin_top: SECTION_GAP,
                border_top: Some(Border::new(1.0, Color::SLATE_200)),
                avoid_break: true,
                ..Default::default()
            },
            vec![Node::Row(RowNode {
                gap: 16.0,
                columns: vec![
                    Column {
                        span: 6,
                        children: vec![text(
                            &format!("{} · {}", cv.name, cv.title),
                            TextStyle::new(10.0).color(Color::SLATE_400),
                        )],
                    },
                    Column {
                        span: 6,
                        children: vec![text(
                            &self.labels().footer_note,
                            TextStyle::new(10.0)
                                .uppercase()
                                .color(Color::SLATE_400)
                                .align(TextAlign::Right),
                        )],
                    },
                ],
            })],
        )
    }
}

fn text(content: &str, style: TextStyle) -> Node {
    Node::Text(TextNode {
        text: content.to_string(),
        style,
    })
}

fn heading(label: &str) -> Node {
    Node::Block(BlockNode {
        tag: None,
        style: BoxStyle {
            margin_bottom: 10.0,
            avoid_break: true,
            ..Default::default()
        },
        children: vec![
            Node::Block(BlockNode {
                tag: None,
                style: BoxStyle {
                    padding: Edges::bottom(4.0),
                    ..Default::default()
                },
                children: vec![text(
                    label,
                    TextStyle::new(13.0).bold().uppercase().color(Color::SLATE_800),
                )],
            }),
            Node::Rule(RuleNode {
                thickness: 1.0,
                color: Color::SLATE_300,
            }),
        ],
    })
}

fn tagged(tag: ContentRef, style: BoxStyle, children: Vec<Node>) -> Node {
    Node::Block(BlockNode {
        tag: Some(tag),
        style,
        children,
    })
}

fn section_style() -> BoxStyle {
    BoxStyle {
        margin_bottom: SECTION_GAP,
        ..Default::default()
    }
}

fn bullet_list(items: &[String]) -> Vec<Node> {
    items
        .iter()
        .map(|item| text(&format!("• {}", item), TextStyle::new(12.0)))
        .collect()
}
