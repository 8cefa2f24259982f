//! Flattened view of the small XML feeds some services publish.

use crate::core::error::RateError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug)]
pub struct Element {
    pub name: String,
    pub text: String,
    attributes: Vec<(String, String)>,
    index: usize,
    parent: Option<usize>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Every element of a document in document order. Names and attribute keys
/// have their namespace prefix stripped.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(service: &str, body: &str) -> Result<Self, RateError> {
        let malformed = |e: &dyn std::fmt::Display| {
            RateError::invalid_response(service, format!("malformed XML: {e}"))
        };

        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        loop {
            match reader.read_event().map_err(|e| malformed(&e))? {
                Event::Start(start) => {
                    let element = element(&start, elements.len(), open.last().copied())
                        .map_err(|e| malformed(&e))?;
                    open.push(element.index);
                    elements.push(element);
                }
                Event::Empty(start) => {
                    let element = element(&start, elements.len(), open.last().copied())
                        .map_err(|e| malformed(&e))?;
                    elements.push(element);
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| malformed(&e))?;
                    if let Some(&current) = open.last() {
                        elements[current].text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(&current) = open.last() {
                        elements[current]
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if elements.is_empty() {
            return Err(RateError::invalid_response(service, "empty XML document"));
        }
        Ok(Document { elements })
    }

    pub fn elements<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Element> {
        self.elements.iter().filter(move |e| e.name == name)
    }

    pub fn first(&self, name: &str) -> Option<&Element> {
        self.elements(name).next()
    }

    pub fn children<'a>(&'a self, parent: &'a Element) -> impl Iterator<Item = &'a Element> {
        self.elements
            .iter()
            .filter(move |e| e.parent == Some(parent.index))
    }

    pub fn child_text<'a>(&'a self, parent: &'a Element, name: &str) -> Option<&'a str> {
        self.children(parent)
            .find(|e| e.name == name)
            .map(|e| e.text.as_str())
    }
}

fn element(
    start: &BytesStart<'_>,
    index: usize,
    parent: Option<usize>,
) -> Result<Element, quick_xml::Error> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        text: String::new(),
        attributes,
        index,
        parent,
    })
}

/// Parses a decimal that may use a comma separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
    <gesmes:subject>Reference rates</gesmes:subject>
    <Cube>
        <Cube time="2016-08-23">
            <Cube currency="USD" rate="1.1321"/>
            <Cube currency="JPY" rate="113.56"/>
        </Cube>
    </Cube>
</gesmes:Envelope>"#;

    #[test]
    fn test_parse_nested_feed() {
        let doc = Document::parse("test", FEED).unwrap();
        assert_eq!(doc.first("subject").unwrap().text, "Reference rates");

        let day = doc.elements("Cube").find(|e| e.attr("time").is_some()).unwrap();
        assert_eq!(day.attr("time"), Some("2016-08-23"));

        let rates: Vec<_> = doc
            .children(day)
            .map(|e| (e.attr("currency").unwrap(), e.attr("rate").unwrap()))
            .collect();
        assert_eq!(rates, [("USD", "1.1321"), ("JPY", "113.56")]);
    }

    #[test]
    fn test_child_text_and_entities() {
        let doc = Document::parse(
            "test",
            "<Root><Item><Name>A &amp; B</Name><Value>1,5</Value></Item></Root>",
        )
        .unwrap();
        let item = doc.first("Item").unwrap();
        assert_eq!(doc.child_text(item, "Name"), Some("A & B"));
        assert_eq!(
            doc.child_text(item, "Value").and_then(parse_decimal),
            Some(1.5)
        );
        assert_eq!(doc.child_text(item, "Missing"), None);
    }

    #[test]
    fn test_malformed_documents() {
        let err = Document::parse("test", "<a><b></a>").unwrap_err();
        assert!(err.to_string().contains("malformed XML"), "{err}");

        let err = Document::parse("test", "").unwrap_err();
        assert!(err.to_string().contains("empty XML document"), "{err}");
    }
}
