//! Paragraph and run traversal
//!
//! A placeholder can be split over several runs when Word records a spelling
//! mark or a formatting change in the middle of it, so matching is done on
//! the concatenated text of all runs in a paragraph.

use crate::names::WordNames;
use crate::xml::{XmlElement, XmlNode};

/// Elements whose paragraphs are visited (block-level containers)
const CONTAINERS: &[&str] = &[
    "body",
    "hdr",
    "ftr",
    "tbl",
    "tr",
    "tc",
    "sdt",
    "sdtContent",
    "customXml",
];

/// Inline wrappers that hold runs inside a paragraph
const RUN_WRAPPERS: &[&str] = &["hyperlink", "ins", "smartTag", "customXml", "fldSimple"];

/// Children of `w:rPr` that must follow `w:sz`
const SZ_SUCCESSORS: &[&str] = &[
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
    "rPrChange",
];

/// Visit every paragraph reachable through block-level containers.
///
/// Paragraphs nested inside another paragraph (text boxes, drawings) are
/// not visited.
pub(crate) fn for_each_paragraph_mut(
    container: &mut XmlElement,
    names: &WordNames,
    f: &mut dyn FnMut(&mut XmlElement),
) {
    for child in container.child_elements_mut() {
        if names.is(child, "p") {
            f(child);
        } else if names.is_any(child, CONTAINERS) {
            for_each_paragraph_mut(child, names, f);
        }
    }
}

/// Immutable counterpart of [`for_each_paragraph_mut`]
pub(crate) fn for_each_paragraph<'a>(
    container: &'a XmlElement,
    names: &WordNames,
    f: &mut dyn FnMut(&'a XmlElement),
) {
    for child in container.child_elements() {
        if names.is(child, "p") {
            f(child);
        } else if names.is_any(child, CONTAINERS) {
            for_each_paragraph(child, names, f);
        }
    }
}

/// Runs of a paragraph in document order, including runs inside hyperlinks
/// and tracked insertions
pub(crate) fn paragraph_runs<'a>(paragraph: &'a XmlElement, names: &WordNames) -> Vec<&'a XmlElement> {
    let mut runs = Vec::new();
    collect_runs(paragraph, names, &mut runs);
    runs
}

fn collect_runs<'a>(element: &'a XmlElement, names: &WordNames, out: &mut Vec<&'a XmlElement>) {
    for child in element.child_elements() {
        if names.is(child, "r") {
            out.push(child);
        } else if names.is_any(child, RUN_WRAPPERS) {
            collect_runs(child, names, out);
        }
    }
}

/// Visit every run of a paragraph mutably
pub(crate) fn for_each_run_mut(
    element: &mut XmlElement,
    names: &WordNames,
    f: &mut dyn FnMut(&mut XmlElement),
) {
    for child in element.child_elements_mut() {
        if names.is(child, "r") {
            f(child);
        } else if names.is_any(child, RUN_WRAPPERS) {
            for_each_run_mut(child, names, f);
        }
    }
}

/// Plain text of a run
pub(crate) fn run_text(run: &XmlElement, names: &WordNames) -> String {
    let mut text = String::new();
    for child in run.child_elements() {
        if names.is(child, "t") {
            text.push_str(&child.text());
        } else if names.is(child, "tab") {
            text.push('\t');
        } else if names.is(child, "cr") {
            text.push('\n');
        } else if names.is(child, "br") {
            // Page and column breaks carry no text
            match child.attribute(&names.name("type")) {
                None | Some("textWrapping") => text.push('\n'),
                Some(_) => {}
            }
        } else if names.is(child, "noBreakHyphen") {
            text.push('-');
        }
    }
    text
}

/// Concatenated text of every run in a paragraph
pub(crate) fn paragraph_text(paragraph: &XmlElement, names: &WordNames) -> String {
    paragraph_runs(paragraph, names)
        .into_iter()
        .map(|run| run_text(run, names))
        .collect()
}

/// Whether a run carries an enabled `w:b`
pub(crate) fn run_is_bold(run: &XmlElement, names: &WordNames) -> bool {
    run.find_child(&names.name("rPr"))
        .and_then(|rpr| rpr.find_child(&names.name("b")))
        .is_some_and(|b| !matches!(b.attribute(&names.name("val")), Some("0" | "false" | "off")))
}

/// Font size of a run in points, if set directly on the run
pub(crate) fn run_font_size(run: &XmlElement, names: &WordNames) -> Option<f32> {
    run.find_child(&names.name("rPr"))
        .and_then(|rpr| rpr.find_child(&names.name("sz")))
        .and_then(|sz| sz.attribute(&names.name("val")))
        .and_then(|val| val.parse::<f32>().ok())
        .map(|half_points| half_points / 2.0)
}

/// Replace tokens in one paragraph.
///
/// Tokens are applied in order against the progressively substituted text.
/// When at least one token matched, every child except `w:pPr` is removed
/// and a single bold run holding the substituted text is appended. Returns
/// the tokens that matched together with their values.
pub(crate) fn substitute_paragraph<K, V>(
    paragraph: &mut XmlElement,
    names: &WordNames,
    replacements: &[(K, V)],
) -> Vec<(String, String)>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut text = paragraph_text(paragraph, names);
    let mut matched = Vec::new();

    for (token, value) in replacements {
        let (token, value) = (token.as_ref(), value.as_ref());
        if token.is_empty() {
            continue;
        }
        if text.contains(token) {
            text = text.replace(token, value);
            matched.push((token.to_string(), value.to_string()));
        }
    }

    if !matched.is_empty() {
        collapse_to_bold_run(paragraph, names, &text);
    }

    matched
}

/// Drop all paragraph content except its properties and append one bold run
fn collapse_to_bold_run(paragraph: &mut XmlElement, names: &WordNames, text: &str) {
    paragraph
        .children
        .retain(|node| matches!(node, XmlNode::Element(el) if names.is(el, "pPr")));
    paragraph.push_element(bold_run(names, text));
}

fn bold_run(names: &WordNames, text: &str) -> XmlElement {
    let mut rpr = XmlElement::new(names.name("rPr"));
    rpr.push_element(XmlElement::new(names.name("b")));

    let mut run = XmlElement::new(names.name("r"));
    run.push_element(rpr);
    append_run_text(&mut run, names, text);
    run
}

/// Append text to a run, mapping tabs and newlines to `w:tab` / `w:br`
fn append_run_text(run: &mut XmlElement, names: &WordNames, text: &str) {
    let mut pending = String::new();

    let flush = |run: &mut XmlElement, pending: &mut String| {
        if pending.is_empty() {
            return;
        }
        let mut t = XmlElement::new(names.name("t")).with_attribute("xml:space", "preserve");
        t.push_text(std::mem::take(pending));
        run.push_element(t);
    };

    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(run, &mut pending);
                run.push_element(XmlElement::new(names.name("tab")));
            }
            '\n' => {
                flush(run, &mut pending);
                run.push_element(XmlElement::new(names.name("br")));
            }
            _ => pending.push(ch),
        }
    }
    flush(run, &mut pending);
}

/// Set the font size (points) directly on a run
pub(crate) fn set_run_font_size(run: &mut XmlElement, names: &WordNames, points: f32) {
    let rpr_name = names.name("rPr");
    if run.find_child(&rpr_name).is_none() {
        // rPr is always the first child of a run
        run.children
            .insert(0, XmlNode::Element(XmlElement::new(rpr_name.clone())));
    }

    let half_points = ((points * 2.0).round() as i64).to_string();
    let sz_name = names.name("sz");
    let val_name = names.name("val");

    if let Some(rpr) = run.find_child_mut(&rpr_name) {
        match rpr.find_child_mut(&sz_name) {
            Some(sz) => sz.set_attribute(val_name, half_points),
            None => rpr.insert_before_any(
                XmlElement::new(sz_name).with_attribute(val_name, half_points),
                &names.names(SZ_SUCCESSORS),
            ),
        }
    }
}
