//! quick-xml helpers shared by the SpreadsheetML and XLSX readers.

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart};

use crate::error::{IngestError, Result};

/// Unescaped value of the first attribute whose local name is `name`, so
/// `ss:Index` and `Index` both match `b"Index"`.
pub(crate) fn attribute(start: &BytesStart<'_>, name: &[u8], origin: &str) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| IngestError::xml(origin, err))?;
        if attr.key.local_name().as_ref() != name {
            continue;
        }
        let raw = utf8(&attr.value, origin)?;
        let value = unescape(raw).map_err(|err| IngestError::xml(origin, err))?;
        return Ok(Some(value.into_owned()));
    }
    Ok(None)
}

pub(crate) fn utf8<'b>(bytes: &'b [u8], origin: &str) -> Result<&'b str> {
    std::str::from_utf8(bytes).map_err(|err| IngestError::xml(origin, err))
}

/// Appends the text an entity or character reference stands for.
pub(crate) fn push_reference(buf: &mut String, reference: &BytesRef<'_>, origin: &str) -> Result<()> {
    let name = utf8(reference, origin)?;
    let resolved = match name.strip_prefix('#') {
        Some(code) => {
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value.and_then(char::from_u32).map(String::from)
        }
        None => resolve_predefined_entity(name).map(str::to_string),
    };
    match resolved {
        Some(text) => {
            buf.push_str(&text);
            Ok(())
        }
        None => Err(IngestError::xml(
            origin,
            format!("unknown entity reference '&{name};'"),
        )),
    }
}
