//! XML helpers shared by the SOAP and DIDL-Lite code.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Extracts text content from the first occurrence of an XML element.
///
/// Matches on the local name, so namespace prefixes are ignored. HTML
/// entities in the text are decoded.
///
/// # Example
/// ```ignore
/// let xml = r#"<u:RelTime>0:01:02</u:RelTime>"#;
/// assert_eq!(extract_xml_text(xml, "RelTime"), Some("0:01:02".to_string()));
/// ```
pub fn extract_xml_text(xml: &str, element_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let target_bytes = element_name.as_bytes();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == target_bytes => {
                if let Ok(text) = reader.read_text(e.name()) {
                    let decoded = html_escape::decode_html_entities(&text);
                    return Some(decoded.to_string());
                }
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == target_bytes => {
                return Some(String::new());
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
}

/// Returns an attribute value of an element, entity-decoded.
pub fn get_xml_attr(elem: &BytesStart, attr_name: &[u8]) -> Option<String> {
    elem.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == attr_name)
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value);
            html_escape::decode_html_entities(&raw).into_owned()
        })
}

/// Escapes the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_namespaced_text() {
        let xml = r#"<s:Envelope><s:Body><u:GetPositionInfoResponse><RelTime>0:01:02</RelTime></u:GetPositionInfoResponse></s:Body></s:Envelope>"#;
        assert_eq!(extract_xml_text(xml, "RelTime"), Some("0:01:02".into()));
        assert_eq!(extract_xml_text(xml, "TrackDuration"), None);
    }

    #[test]
    fn decodes_entities_in_text() {
        let xml = "<Result>&lt;DIDL-Lite&gt;&lt;/DIDL-Lite&gt;</Result>";
        assert_eq!(
            extract_xml_text(xml, "Result"),
            Some("<DIDL-Lite></DIDL-Lite>".into())
        );
    }

    #[test]
    fn empty_element_yields_empty_text() {
        assert_eq!(extract_xml_text("<a><b/></a>", "b"), Some(String::new()));
    }

    #[test]
    fn escape_covers_all_specials() {
        assert_eq!(escape_xml(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }
}
