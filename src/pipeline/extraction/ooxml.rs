//! Shared plumbing for Office Open XML packages: part access inside the
//! zip container and attribute lookup on `quick_xml` start tags.

use std::io::{Read, Seek};

use quick_xml::events::BytesStart;
use zip::ZipArchive;

use super::ExtractionError;

/// Read one package part as UTF-8.
pub fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ExtractionError::Archive(format!("{name}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Encoding(format!("{name}: {e}")))?;
    Ok(xml)
}

/// Malformed XML inside `part`.
pub fn xml_error(part: &str) -> impl Fn(quick_xml::Error) -> ExtractionError + '_ {
    move |e| ExtractionError::Archive(format!("{part}: {e}"))
}

/// Unescaped value of the attribute with local name `local`. `prefixed`
/// picks between `r:id` style keys and bare ones, since both can share a
/// local name on the same tag.
pub fn attribute_value(
    tag: &BytesStart<'_>,
    local: &[u8],
    prefixed: bool,
) -> Result<Option<String>, quick_xml::Error> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local && attr.key.prefix().is_some() == prefixed {
            return Ok(Some(
                quick_xml::escape::unescape(std::str::from_utf8(&attr.value)?)?.into_owned(),
            ));
        }
    }
    Ok(None)
}
