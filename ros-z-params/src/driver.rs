//! Document driver.
//!
//! Walks the event stream of one parameter document and commits every
//! `(node, parameter, value)` it resolves into a [`ParameterStore`]:
//!
//! ```yaml
//! lidar_ns:                  # namespace segment
//!   lidar_1:                 # namespace segment
//!     ros__parameters:       # sentinel: keys below are parameter names
//!       ports: [2438, 2439]  # /lidar_ns/lidar_1 → ports
//!       cam_spec:
//!         angle: 2.34        # /lidar_ns/lidar_1 → cam_spec.angle
//! ```
//!
//! Nesting is tracked with an explicit frame stack, one frame per open
//! mapping or sequence. The first error stops the walk; whatever was
//! committed before it stays in the store.

use tracing::{debug, trace, warn};

use crate::{
    error::{ParamError, Result},
    event::{Located, ParseEvent, ScalarToken},
    infer::{infer_scalar, ArrayBuilder},
    limits::ParserLimits,
    path::PathResolver,
    store::ParameterStore,
    types::ParameterValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InNamespacePath,
    InParameterPath,
    Done,
    Failed,
}

#[derive(Debug)]
enum Frame {
    /// A mapping whose keys are namespace segments.
    Namespace {
        /// Opening this mapping pushed a namespace segment.
        pushed: bool,
        key: Option<String>,
        saw_params: bool,
        params_closed: bool,
    },
    /// A mapping whose keys are parameter name segments.
    Parameters {
        /// `false` for the mapping directly under the sentinel key.
        pushed: bool,
        key: Option<String>,
    },
    Sequence {
        name: String,
        builder: ArrayBuilder,
    },
}

pub struct DocumentDriver<'s> {
    store: &'s mut ParameterStore,
    limits: ParserLimits,
    path: PathResolver,
    frames: Vec<Frame>,
    state: State,
    node: Option<usize>,
    documents: usize,
}

/// Parse `text` into a fresh store bound to `limits`.
pub fn parse_document(text: &str, limits: ParserLimits) -> Result<ParameterStore> {
    let mut store = ParameterStore::with_limits(limits);
    store.parse_str(text)?;
    Ok(store)
}

impl<'s> DocumentDriver<'s> {
    pub fn new(store: &'s mut ParameterStore) -> Self {
        let limits = store.limits().clone();
        Self {
            path: PathResolver::new(&limits),
            store,
            limits,
            frames: Vec::new(),
            state: State::Start,
            node: None,
            documents: 0,
        }
    }

    /// Consume `events` until the stream ends or the first error.
    pub fn run<I>(mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Located>>,
    {
        let mut last_line = 0;
        for item in events {
            let result = item.and_then(|Located { event, line }| {
                trace!("[PARAMS] line {}: {:?}", line, event);
                last_line = line;
                self.handle(event).map_err(|e| e.at_line(line))
            });
            if let Err(e) = result {
                self.state = State::Failed;
                warn!(
                    "[PARAMS] Parameter document rejected ({}): {}",
                    e.kind(),
                    e
                );
                return Err(e);
            }
            if self.state == State::Done {
                return Ok(());
            }
        }

        let err = ParamError::malformed("event stream ended early").at_line(last_line);
        warn!("[PARAMS] Parameter document rejected ({}): {}", err.kind(), err);
        Err(err)
    }

    fn handle(&mut self, event: ParseEvent) -> Result<()> {
        match event {
            ParseEvent::StreamStart => {
                self.expect_state(State::Start, "stream start")?;
                self.state = State::InNamespacePath;
                Ok(())
            }
            ParseEvent::StreamEnd => {
                if !self.frames.is_empty() {
                    return Err(ParamError::malformed("unterminated collection"));
                }
                self.state = State::Done;
                Ok(())
            }
            ParseEvent::DocumentStart => {
                if self.documents > 0 {
                    return Err(ParamError::unsupported(
                        "multiple documents in one stream",
                    ));
                }
                self.documents += 1;
                Ok(())
            }
            ParseEvent::DocumentEnd => {
                if !self.frames.is_empty() {
                    return Err(ParamError::malformed("document ended inside a collection"));
                }
                Ok(())
            }
            ParseEvent::Alias => Err(ParamError::alias()),
            ParseEvent::MappingStart { anchored: true }
            | ParseEvent::SequenceStart { anchored: true } => Err(ParamError::alias()),
            ParseEvent::Scalar(token) if token.anchored => Err(ParamError::alias()),
            ParseEvent::MappingStart { .. } => self.mapping_start(),
            ParseEvent::MappingEnd => self.mapping_end(),
            ParseEvent::SequenceStart { .. } => self.sequence_start(),
            ParseEvent::SequenceEnd => self.sequence_end(),
            ParseEvent::Scalar(token) => self.scalar(token),
        }
    }

    fn expect_state(&self, state: State, what: &str) -> Result<()> {
        if self.state != state {
            return Err(ParamError::malformed(format!("unexpected {}", what)));
        }
        Ok(())
    }

    fn mapping_start(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            None => {
                self.state = State::InNamespacePath;
                self.frames.push(Frame::Namespace {
                    pushed: false,
                    key: None,
                    saw_params: false,
                    params_closed: false,
                });
                Ok(())
            }
            Some(Frame::Namespace { key: None, .. } | Frame::Parameters { key: None, .. }) => {
                Err(ParamError::unsupported("mapping used as a key"))
            }
            Some(Frame::Namespace {
                key: key @ Some(_),
                saw_params,
                ..
            }) => {
                let Some(segment) = key.take() else {
                    return Ok(());
                };
                if segment == self.limits.params_key {
                    *saw_params = true;
                    let name = self.path.enter_parameters()?;
                    debug!("[PARAMS] Parameters for node {}", name);
                    self.node = Some(self.store.open_node(name)?);
                    self.state = State::InParameterPath;
                    self.frames.push(Frame::Parameters {
                        pushed: false,
                        key: None,
                    });
                } else {
                    self.path.push_namespace(&segment)?;
                    self.frames.push(Frame::Namespace {
                        pushed: true,
                        key: None,
                        saw_params: false,
                        params_closed: false,
                    });
                }
                Ok(())
            }
            Some(Frame::Parameters { key: key @ Some(_), .. }) => {
                let Some(segment) = key.take() else {
                    return Ok(());
                };
                self.path.push_parameter(&segment)?;
                self.frames.push(Frame::Parameters {
                    pushed: true,
                    key: None,
                });
                Ok(())
            }
            Some(Frame::Sequence { .. }) => {
                Err(ParamError::unsupported("mapping inside a sequence"))
            }
        }
    }

    fn mapping_end(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(Frame::Namespace { key: Some(key), .. })
            | Some(Frame::Parameters { key: Some(key), .. }) => {
                Err(ParamError::missing_value(key))
            }
            Some(Frame::Namespace { pushed, .. }) => {
                if pushed {
                    self.path.pop_namespace();
                }
                Ok(())
            }
            Some(Frame::Parameters { pushed: true, .. }) => {
                self.path.pop_parameter();
                Ok(())
            }
            Some(Frame::Parameters { pushed: false, .. }) => {
                self.path.leave_parameters();
                self.node = None;
                self.state = State::InNamespacePath;
                if let Some(Frame::Namespace { params_closed, .. }) = self.frames.last_mut() {
                    *params_closed = true;
                }
                Ok(())
            }
            Some(Frame::Sequence { .. }) | None => {
                Err(ParamError::malformed("unbalanced end of mapping"))
            }
        }
    }

    fn sequence_start(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            None => Err(ParamError::malformed("document root must be a mapping")),
            Some(Frame::Namespace { key: None, .. } | Frame::Parameters { key: None, .. }) => {
                Err(ParamError::unsupported("sequence used as a key"))
            }
            Some(Frame::Namespace { key: Some(key), .. }) => {
                Err(namespace_value_error(key, &self.limits))
            }
            Some(Frame::Parameters { key: key @ Some(_), .. }) => {
                let Some(leaf) = key.take() else {
                    return Ok(());
                };
                let name = self.path.parameter_name(&leaf)?;
                self.frames.push(Frame::Sequence {
                    name,
                    builder: ArrayBuilder::new(&self.limits),
                });
                Ok(())
            }
            Some(Frame::Sequence { .. }) => {
                Err(ParamError::unsupported("sequence inside a sequence"))
            }
        }
    }

    fn sequence_end(&mut self) -> Result<()> {
        let Some(Frame::Sequence { name, builder }) = self.frames.pop() else {
            return Err(ParamError::malformed("unbalanced end of sequence"));
        };
        let value = builder.finish()?;
        self.commit(name, value)
    }

    fn scalar(&mut self, token: ScalarToken) -> Result<()> {
        match self.frames.last_mut() {
            None if token.is_null() => Ok(()),
            None => Err(ParamError::malformed("document root must be a mapping")),
            Some(Frame::Namespace {
                key: key @ None,
                saw_params,
                params_closed,
                ..
            }) => {
                let segment = checked_key(token, &self.limits)?;
                if *params_closed {
                    return Err(ParamError::malformed(format!(
                        "key '{}' follows a closed parameters block",
                        segment
                    )));
                }
                if *saw_params && segment == self.limits.params_key {
                    return Err(ParamError::malformed(format!(
                        "duplicate '{}' key",
                        segment
                    )));
                }
                *key = Some(segment);
                Ok(())
            }
            Some(Frame::Namespace { key: Some(key), .. }) => {
                if token.is_null() {
                    return Err(ParamError::missing_value(key.as_str()));
                }
                Err(namespace_value_error(key, &self.limits))
            }
            Some(Frame::Parameters { key: key @ None, .. }) => {
                *key = Some(checked_key(token, &self.limits)?);
                Ok(())
            }
            Some(Frame::Parameters { key: key @ Some(_), .. }) => {
                let Some(leaf) = key.take() else {
                    return Ok(());
                };
                let name = self.path.parameter_name(&leaf)?;
                if token.is_null() {
                    return Err(ParamError::missing_value(name));
                }
                let value = infer_scalar(&token.text, token.quoted, &self.limits)?;
                self.commit(name, value.into())
            }
            Some(Frame::Sequence { builder, .. }) => {
                let (text, quoted) = token.into_element();
                builder.push(text, quoted)
            }
        }
    }

    fn commit(&mut self, name: String, value: ParameterValue) -> Result<()> {
        let Some(node) = self.node else {
            return Err(ParamError::missing_node(format!(
                "parameter '{}' has no enclosing node",
                name
            )));
        };
        self.store.commit(node, name, value)
    }
}

const MERGE_KEY: &str = "<<";

fn checked_key(token: ScalarToken, limits: &ParserLimits) -> Result<String> {
    if token.text.is_empty() || token.is_null() {
        return Err(ParamError::malformed("empty key"));
    }
    if !token.quoted && token.text == MERGE_KEY {
        return Err(ParamError::unsupported("merge keys are not supported"));
    }
    limits.check_string(&token.text)?;
    Ok(token.text)
}

/// A scalar or sequence reached while still collecting namespace segments.
fn namespace_value_error(key: &str, limits: &ParserLimits) -> ParamError {
    if key == limits.params_key {
        ParamError::malformed(format!("'{}' must hold a mapping", key))
    } else {
        ParamError::missing_node(format!("parameter '{}' has no enclosing node", key))
    }
}
