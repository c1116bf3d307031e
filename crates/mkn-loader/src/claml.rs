//! ClaML (Classification Markup Language) parser.
//!
//! Reads `<Class>` elements with their `<SuperClass>`/`<SubClass>` references
//! and the labels of `kind="preferred"` rubrics. Everything else in the
//! document (titles, modifiers, non-preferred rubrics) is skipped.
//!
//! ```text
//! <Class code="J06.9" kind="category">
//!   <SuperClass code="J06"/>
//!   <Rubric kind="preferred">
//!     <Label xml:lang="cs">Akutní infekce horních cest dýchacích NS</Label>
//!   </Rubric>
//! </Class>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use mkn_types::well_known::claml;
use mkn_types::{ClassificationIndex, NodeKind};

use crate::builder::{IndexBuilder, NodeRecord};
use crate::types::{MknError, MknResult, ParseConfig, ParseStats};

#[derive(Debug)]
struct Label {
    lang: Option<String>,
    text: String,
}

/// The `<Class>` element currently being read.
#[derive(Debug, Default)]
struct OpenClass {
    code: String,
    kind: NodeKind,
    parent_code: Option<String>,
    sub_classes: Vec<String>,
    labels: Vec<Label>,
    in_preferred_rubric: bool,
    open_label: Option<Label>,
}

impl OpenClass {
    fn from_element(element: &BytesStart<'_>) -> MknResult<Self> {
        let kind = attribute(element, claml::KIND_ATTR)?.unwrap_or_default();
        Ok(Self {
            code: attribute(element, claml::CODE_ATTR)?.unwrap_or_default(),
            kind: NodeKind::from_label(&kind),
            ..Default::default()
        })
    }

    /// Handles a start tag nested inside the class.
    fn open(&mut self, element: &BytesStart<'_>) -> MknResult<()> {
        let name = element.name();
        match name.as_ref() {
            n if n == claml::RUBRIC.as_bytes() => {
                self.in_preferred_rubric = attribute(element, claml::KIND_ATTR)?.as_deref()
                    == Some(claml::PREFERRED_RUBRIC);
            }
            n if n == claml::LABEL.as_bytes() => {
                if self.in_preferred_rubric && self.open_label.is_none() {
                    self.open_label = Some(Label {
                        lang: attribute(element, claml::LANG_ATTR)?,
                        text: String::new(),
                    });
                }
            }
            _ => self.reference(element)?,
        }
        Ok(())
    }

    /// Handles a self-closing tag nested inside the class.
    fn empty(&mut self, element: &BytesStart<'_>) -> MknResult<()> {
        if element.name().as_ref() == claml::LABEL.as_bytes() {
            if self.in_preferred_rubric {
                self.labels.push(Label {
                    lang: attribute(element, claml::LANG_ATTR)?,
                    text: String::new(),
                });
            }
            return Ok(());
        }
        self.reference(element)
    }

    /// Records `<SuperClass>` and `<SubClass>` references.
    fn reference(&mut self, element: &BytesStart<'_>) -> MknResult<()> {
        let name = element.name();
        if name.as_ref() == claml::SUPER_CLASS.as_bytes() {
            if let Some(code) = attribute(element, claml::CODE_ATTR)?.filter(|c| !c.is_empty()) {
                self.parent_code = Some(code);
            }
        } else if name.as_ref() == claml::SUB_CLASS.as_bytes() {
            if let Some(code) = attribute(element, claml::CODE_ATTR)?.filter(|c| !c.is_empty()) {
                self.sub_classes.push(code);
            }
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if name == claml::LABEL.as_bytes() {
            if let Some(label) = self.open_label.take() {
                self.labels.push(label);
            }
        } else if name == claml::RUBRIC.as_bytes() {
            self.in_preferred_rubric = false;
        }
    }

    fn append_text(&mut self, text: &str) {
        if let Some(label) = self.open_label.as_mut() {
            label.text.push_str(text);
        }
    }

    /// Picks the label in `language`, falling back to the first preferred
    /// label of any language, tagged or not. A class labelled only in
    /// English still gets its English name rather than an empty one.
    fn preferred_label(&self, language: &str) -> String {
        self.labels
            .iter()
            .find(|l| l.lang.as_deref() == Some(language))
            .or_else(|| self.labels.first())
            .map(|l| collapse_whitespace(&l.text))
            .unwrap_or_default()
    }

    fn commit(self, builder: &mut IndexBuilder, language: &str) {
        let display_name = self.preferred_label(language);
        for child in &self.sub_classes {
            builder.declare_child(self.code.as_str(), child.as_str());
        }

        let mut record = NodeRecord::new(self.code, display_name, self.kind);
        record.parent_code = self.parent_code;
        builder.push(record);
    }
}

/// Returns the trimmed, unescaped value of an attribute.
fn attribute(element: &BytesStart<'_>, key: &str) -> MknResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| MknError::malformed(format!("attribute {}: {}", key, e)))?;
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses ClaML content into code and text indices.
///
/// Display names come from the `xml:lang` label matching
/// [`ParseConfig::language`], or the first preferred label when none
/// matches. Label text with inline markup is flattened.
///
/// # Errors
/// Returns a malformed-source error for ill-formed XML, unclosed elements
/// or a document without a root element.
pub fn parse_tree_markup(
    content: &str,
    config: &ParseConfig,
) -> MknResult<(ClassificationIndex, ParseStats)> {
    let mut reader = Reader::from_str(content);
    let mut builder = IndexBuilder::new();
    let mut current: Option<OpenClass> = None;
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut classes_read = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                match current.as_mut() {
                    Some(class) => class.open(&e)?,
                    None if e.name().as_ref() == claml::CLASS.as_bytes() => {
                        current = Some(OpenClass::from_element(&e)?);
                        classes_read += 1;
                    }
                    None => {}
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                match current.as_mut() {
                    Some(class) => class.empty(&e)?,
                    None if e.name().as_ref() == claml::CLASS.as_bytes() => {
                        OpenClass::from_element(&e)?.commit(&mut builder, &config.language);
                        classes_read += 1;
                    }
                    None => {}
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let name = e.name();
                if name.as_ref() == claml::CLASS.as_bytes() {
                    if let Some(class) = current.take() {
                        class.commit(&mut builder, &config.language);
                    }
                } else if let Some(class) = current.as_mut() {
                    class.close(name.as_ref());
                }
            }
            Event::Text(t) => {
                if let Some(class) = current.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| MknError::malformed(format!("label text: {}", e)))?;
                    class.append_text(&text);
                }
            }
            Event::CData(c) => {
                if let Some(class) = current.as_mut() {
                    class.append_text(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(MknError::malformed(format!(
            "unexpected end of document with {} unclosed element(s)",
            depth
        )));
    }
    if !saw_root {
        return Err(MknError::malformed("no root element"));
    }

    builder.note_read(classes_read);
    Ok(builder.build())
}
