//! Page layout adjustments (section margins, body font size)

use crate::names::WordNames;
use crate::paragraph::{for_each_paragraph_mut, for_each_run_mut, set_run_font_size};
use crate::xml::XmlElement;

/// Twips per inch (1 twip = 1/20 point)
const TWIPS_PER_INCH: f64 = 1440.0;

/// Header/footer distance used when a `w:pgMar` has to be created
const DEFAULT_HEADER_FOOTER_TWIPS: i64 = 708;

/// Children of `w:sectPr` that must follow `w:pgMar`
const PGMAR_SUCCESSORS: &[&str] = &[
    "paperSrc",
    "pgBorders",
    "lnNumType",
    "pgNumType",
    "cols",
    "formProt",
    "vAlign",
    "noEndnote",
    "titlePg",
    "textDirection",
    "bidi",
    "rtlGutter",
    "docGrid",
    "printerSettings",
    "sectPrChange",
];

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl PageMargins {
    /// Create margins (inches)
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    fn to_twips(inches: f64) -> i64 {
        (inches * TWIPS_PER_INCH).round() as i64
    }

    fn from_twips(value: Option<&str>) -> f64 {
        value
            .and_then(|v| v.parse::<f64>().ok())
            .map(|twips| twips / TWIPS_PER_INCH)
            .unwrap_or(0.0)
    }
}

/// Set margins on the first section of the main document part.
///
/// The first `w:sectPr` in document order is the first section. A document
/// without any section properties gets a body-level `w:sectPr`.
pub(crate) fn set_page_margins(root: &mut XmlElement, names: &WordNames, margins: PageMargins) {
    let sect_name = names.name("sectPr");
    let body_name = names.name("body");

    if root.find_first_mut(&|el: &XmlElement| el.name == sect_name).is_none() {
        if let Some(body) = root.find_child_mut(&body_name) {
            body.push_element(XmlElement::new(sect_name.clone()));
        } else {
            log::warn!("Document has no body; page margins not applied");
            return;
        }
    }

    let Some(sect) = root.find_first_mut(&|el: &XmlElement| el.name == sect_name) else {
        return;
    };

    let pgmar_name = names.name("pgMar");
    if sect.find_child(&pgmar_name).is_none() {
        let pgmar = XmlElement::new(pgmar_name.clone())
            .with_attribute(names.name("header"), DEFAULT_HEADER_FOOTER_TWIPS.to_string())
            .with_attribute(names.name("footer"), DEFAULT_HEADER_FOOTER_TWIPS.to_string())
            .with_attribute(names.name("gutter"), "0");
        sect.insert_before_any(pgmar, &names.names(PGMAR_SUCCESSORS));
    }

    if let Some(pgmar) = sect.find_child_mut(&pgmar_name) {
        pgmar.set_attribute(names.name("top"), PageMargins::to_twips(margins.top).to_string());
        pgmar.set_attribute(
            names.name("bottom"),
            PageMargins::to_twips(margins.bottom).to_string(),
        );
        pgmar.set_attribute(names.name("left"), PageMargins::to_twips(margins.left).to_string());
        pgmar.set_attribute(
            names.name("right"),
            PageMargins::to_twips(margins.right).to_string(),
        );
    }
}

/// Read the margins of the first section, if any
pub(crate) fn page_margins(root: &XmlElement, names: &WordNames) -> Option<PageMargins> {
    let pgmar = first_sect_pr(root, names)?.find_child(&names.name("pgMar"))?;
    Some(PageMargins {
        top: PageMargins::from_twips(pgmar.attribute(&names.name("top"))),
        bottom: PageMargins::from_twips(pgmar.attribute(&names.name("bottom"))),
        left: PageMargins::from_twips(pgmar.attribute(&names.name("left"))),
        right: PageMargins::from_twips(pgmar.attribute(&names.name("right"))),
    })
}

fn first_sect_pr<'a>(element: &'a XmlElement, names: &WordNames) -> Option<&'a XmlElement> {
    if names.is(element, "sectPr") {
        return Some(element);
    }
    element
        .child_elements()
        .find_map(|child| first_sect_pr(child, names))
}

/// Force a font size on every run of every body paragraph
pub(crate) fn set_body_font_size(root: &mut XmlElement, names: &WordNames, points: f32) {
    let body_name = names.name("body");
    let Some(body) = root.find_child_mut(&body_name) else {
        return;
    };

    let mut runs = 0usize;
    for_each_paragraph_mut(body, names, &mut |paragraph: &mut XmlElement| {
        for_each_run_mut(paragraph, names, &mut |run: &mut XmlElement| {
            set_run_font_size(run, names, points);
            runs += 1;
        });
    });
    log::debug!("Set font size {points}pt on {runs} runs");
}
