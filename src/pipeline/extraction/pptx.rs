use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ooxml::{attribute_value, read_part, xml_error};
use super::sanitize::normalize_text;
use super::ExtractionError;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Extract a presentation, one `--- Page N ---` block per slide in
/// presentation order. Every slide gets a marker, even without text;
/// each shape with text contributes its trimmed text on its own line.
pub fn extract_pptx(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let slides = pptx_slides(&bytes)?;

    let mut out = String::new();
    for (i, shapes) in slides.iter().enumerate() {
        out.push_str(&format!("\n--- Page {} ---\n", i + 1));
        for shape in shapes {
            out.push_str(shape);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Non-empty shape texts for each slide, in presentation order.
pub fn pptx_slides(bytes: &[u8]) -> Result<Vec<Vec<String>>, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let presentation = read_part(&mut archive, PRESENTATION_PART)?;
    let rels = read_part(&mut archive, PRESENTATION_RELS)?;

    let targets = relationship_targets(&rels).map_err(xml_error(PRESENTATION_RELS))?;
    let slide_ids = slide_relationship_ids(&presentation).map_err(xml_error(PRESENTATION_PART))?;

    let mut slides = Vec::with_capacity(slide_ids.len());
    for rel_id in slide_ids {
        let Some(target) = targets.get(&rel_id) else {
            return Err(ExtractionError::Archive(format!(
                "slide relationship {rel_id} has no target"
            )));
        };
        let part = resolve_target(target);
        let xml = read_part(&mut archive, &part)?;
        slides.push(shape_texts(&xml).map_err(xml_error(&part))?);
    }
    Ok(slides)
}

/// `Id -> Target` for every relationship in a `.rels` part.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attribute_value(&e, b"Id", false)?;
                let target = attribute_value(&e, b"Target", false)?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_relationship_ids(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = attribute_value(&e, b"id", true)? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Text of each shape on a slide. `mc:Fallback` branches are skipped so
/// content saved in both forms is read once, from `mc:Choice`.
fn shape_texts(slide_xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(slide_xml);
    let mut shapes = Vec::new();
    let mut current: Option<String> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Fallback" => {
                    reader.read_to_end(e.name())?;
                }
                b"sp" => current = Some(String::new()),
                b"t" => in_run_text = current.is_some(),
                b"br" => push_to(&mut current, "\n"),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"br" => push_to(&mut current, "\n"),
            Event::Text(t) if in_run_text => push_to(&mut current, &t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => push_to(&mut current, "\n"),
                b"sp" => {
                    if let Some(text) = current.take() {
                        let text = normalize_text(text.trim());
                        if !text.is_empty() {
                            shapes.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(shapes)
}

fn push_to(shape: &mut Option<String>, text: &str) {
    if let Some(buf) = shape.as_mut() {
        buf.push_str(text);
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{make_test_pptx, make_test_pptx_from_trees, shape};
    use super::*;

    #[test]
    fn slides_follow_presentation_order() {
        let bytes = make_test_pptx(&[&[&["Title slide"]], &[&["Agenda"]]]);
        let slides = pptx_slides(&bytes).unwrap();
        assert_eq!(slides, vec![vec!["Title slide".to_string()], vec!["Agenda".to_string()]]);
    }

    #[test]
    fn paragraphs_within_shape_joined_by_newline() {
        let bytes = make_test_pptx(&[&[&["Line one", "Line two"], &["Other box"]]]);
        let slides = pptx_slides(&bytes).unwrap();
        assert_eq!(slides[0], vec!["Line one\nLine two".to_string(), "Other box".to_string()]);
    }

    #[test]
    fn empty_shapes_skipped_but_slide_marker_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(&path, make_test_pptx(&[&[&["  "]], &[&["Q3 results"]]])).unwrap();

        let text = extract_pptx(&path).unwrap();
        assert_eq!(text, "\n--- Page 1 ---\n\n--- Page 2 ---\nQ3 results\n");
    }

    #[test]
    fn entities_unescaped() {
        let bytes = make_test_pptx(&[&[&["R&amp;D &lt;2024&gt;"]]]);
        assert_eq!(pptx_slides(&bytes).unwrap()[0], vec!["R&D <2024>".to_string()]);
    }

    #[test]
    fn alternate_content_read_once() {
        let tree = format!(
            concat!(
                "<mc:AlternateContent>",
                r#"<mc:Choice Requires="p14">{}</mc:Choice>"#,
                "<mc:Fallback>{}</mc:Fallback>",
                "</mc:AlternateContent>{}",
            ),
            shape(&["CONFIDENTIAL"]),
            shape(&["CONFIDENTIAL"]),
            shape(&["Roadmap"]),
        );
        let slides = pptx_slides(&make_test_pptx_from_trees(&[&tree])).unwrap();
        assert_eq!(slides[0], vec!["CONFIDENTIAL".to_string(), "Roadmap".to_string()]);
    }

    #[test]
    fn line_breaks_with_run_properties() {
        let tree = concat!(
            "<p:sp><p:txBody><a:p><a:r><a:t>Q3</a:t></a:r>",
            r#"<a:br><a:rPr lang="en-US"/></a:br>"#,
            "<a:r><a:t>Revenue</a:t></a:r><a:br/><a:r><a:t>Costs</a:t></a:r></a:p></p:txBody></p:sp>",
        );
        let slides = pptx_slides(&make_test_pptx_from_trees(&[tree])).unwrap();
        assert_eq!(slides[0], vec!["Q3\nRevenue\nCosts".to_string()]);
    }

    #[test]
    fn malformed_slide_is_archive_error() {
        let err = pptx_slides(&make_test_pptx_from_trees(&["<p:sp><a:t>open</p:sp>"])).unwrap_err();
        assert!(matches!(err, ExtractionError::Archive(ref m) if m.contains("slide1.xml")), "{err}");
    }

    #[test]
    fn target_resolution() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide9.xml"), "ppt/slides/slide9.xml");
    }

    #[test]
    fn missing_presentation_part_is_archive_error() {
        let bytes = crate::pipeline::extraction::ooxml::fixtures::build_package(&[("x.xml", "<x/>")]);
        assert!(matches!(pptx_slides(&bytes).unwrap_err(), ExtractionError::Archive(_)));
    }
}
