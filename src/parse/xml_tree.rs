//! Minimale elementboom bovenop de `quick-xml` pull-reader.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{ParseError, ParseResult};

/// Eén XML-element met attributen in documentvolgorde, de samengevoegde
/// directe tekst en de kindelementen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> ParseResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ruwe attribuutwaarde; `Some("")` betekent aanwezig maar leeg.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Attribuutwaarde die aanwezig én niet leeg is.
    #[must_use]
    pub fn non_empty_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Getrimde tekst, of `None` wanneer er na trimmen niets overblijft.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|text| !text.is_empty())
    }

    #[must_use]
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Eerste direct kind met de gegeven tag.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Alle directe kinderen met de gegeven tag, in documentvolgorde.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Leest een volledig XML-document in en geeft het root element terug.
pub fn parse_document(input: &str) -> ParseResult<XmlElement> {
    let input = input.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Document("onverwachte sluittag".to_owned()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Document(format!(
            "element <{}> is niet afgesloten",
            open.name
        )));
    }

    root.ok_or_else(|| ParseError::Document("document bevat geen root element".to_owned()))
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> ParseResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Document(
            "document bevat meerdere root elementen".to_owned(),
        ));
    }
    *root = Some(element);
    Ok(())
}
