//! Structural events consumed by the document driver.
//!
//! The tokenizer itself is `saphyr-parser`; [`EventReader`] narrows its event
//! stream to what the parameter grammar needs: mapping and sequence
//! boundaries, scalars with their literal text and quoting, and enough
//! anchor information to reject anchors and aliases.

use saphyr_parser::{Event, Parser, ScalarStyle, StrInput};

use crate::{
    alloc::try_string,
    error::{ParamError, Result},
};

/// A scalar token as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarToken {
    pub text: String,
    /// Single- or double-quoted in the source.
    pub quoted: bool,
    pub anchored: bool,
}

impl ScalarToken {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
            anchored: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
            anchored: false,
        }
    }

    /// An empty value slot (`key:` with nothing after it, or `~`).
    pub fn is_null(&self) -> bool {
        !self.quoted && (self.text.is_empty() || self.text == "~")
    }

    /// Text and quoting of this token as a sequence element. An empty slot
    /// such as `- ` is an empty string.
    pub fn into_element(self) -> (String, bool) {
        if self.is_null() {
            (String::new(), false)
        } else {
            (self.text, self.quoted)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart { anchored: bool },
    MappingEnd,
    SequenceStart { anchored: bool },
    SequenceEnd,
    Scalar(ScalarToken),
    Alias,
}

/// An event with the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub event: ParseEvent,
    pub line: usize,
}

impl Located {
    pub fn new(event: ParseEvent, line: usize) -> Self {
        Self { event, line }
    }
}

/// Pull-based event stream over a UTF-8 document.
///
/// Yields `Err` once on the first scanner failure and then stops.
pub struct EventReader<'input> {
    parser: Parser<'input, StrInput<'input>>,
    failed: bool,
}

impl<'input> EventReader<'input> {
    pub fn new(text: &'input str) -> Self {
        Self {
            parser: Parser::new_from_str(text),
            failed: false,
        }
    }
}

fn convert(event: Event<'_>) -> Result<Option<ParseEvent>> {
    let event = match event {
        Event::StreamStart => ParseEvent::StreamStart,
        Event::StreamEnd => ParseEvent::StreamEnd,
        Event::DocumentStart { .. } => ParseEvent::DocumentStart,
        Event::DocumentEnd => ParseEvent::DocumentEnd,
        Event::MappingStart(anchor, ..) => ParseEvent::MappingStart {
            anchored: anchor != 0,
        },
        Event::MappingEnd => ParseEvent::MappingEnd,
        Event::SequenceStart(anchor, ..) => ParseEvent::SequenceStart {
            anchored: anchor != 0,
        },
        Event::SequenceEnd => ParseEvent::SequenceEnd,
        Event::Scalar(value, style, anchor, ..) => {
            let text: &str = value.as_ref();
            ParseEvent::Scalar(ScalarToken {
                text: try_string(text)?,
                quoted: matches!(style, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted),
                anchored: anchor != 0,
            })
        }
        Event::Alias(..) => ParseEvent::Alias,
        Event::Nothing => return Ok(None),
    };
    Ok(Some(event))
}

impl Iterator for EventReader<'_> {
    type Item = Result<Located>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.parser.next()? {
                Ok((event, span)) => {
                    let line = span.start.line();
                    match convert(event) {
                        Ok(Some(event)) => return Some(Ok(Located::new(event, line))),
                        Ok(None) => continue,
                        Err(e) => {
                            self.failed = true;
                            return Some(Err(e.at_line(line)));
                        }
                    }
                }
                Err(e) => {
                    self.failed = true;
                    let line = e.marker().line();
                    return Some(Err(ParamError::malformed(e.info()).at_line(line)));
                }
            }
        }
    }
}
