//! Node and parameter path tracking.
//!
//! While the driver descends through nested mappings it keeps two explicit
//! stacks: namespace segments (joined with `/` into a node full name) and,
//! once the sentinel key has been crossed, parameter segments (joined with
//! `.` into a parameter name).

use std::borrow::Cow;

use crate::{
    alloc::{try_join, try_push, try_string},
    error::{Limit, ParamError, Result},
    limits::ParserLimits,
};

const NODE_NS_SEPARATOR: char = '/';
const PARAMETER_NS_SEPARATOR: char = '.';

/// Which kind of mapping key the resolver is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Namespace,
    Parameters,
}

/// Normalize a node full name: one leading `/`, no empty segments.
///
/// Returns the input unchanged when it is already normalized.
pub fn normalize_node_name(name: &str) -> Cow<'_, str> {
    let normalized = name.starts_with(NODE_NS_SEPARATOR)
        && name[1..]
            .split(NODE_NS_SEPARATOR)
            .all(|segment| !segment.is_empty());
    if normalized {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len() + 1);
    for segment in name.split(NODE_NS_SEPARATOR).filter(|s| !s.is_empty()) {
        out.push(NODE_NS_SEPARATOR);
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push(NODE_NS_SEPARATOR);
    }
    Cow::Owned(out)
}

#[derive(Debug)]
pub struct PathResolver {
    node_ns: Vec<String>,
    param_ns: Vec<String>,
    phase: Phase,
    max_depth: usize,
}

impl PathResolver {
    pub fn new(limits: &ParserLimits) -> Self {
        Self {
            node_ns: Vec::new(),
            param_ns: Vec::new(),
            phase: Phase::Namespace,
            max_depth: limits.max_depth,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn depth(&self) -> usize {
        self.node_ns.len() + self.param_ns.len()
    }

    fn check_depth(&self) -> Result<()> {
        if self.depth() >= self.max_depth {
            return Err(ParamError::limit(Limit::Depth, self.max_depth));
        }
        Ok(())
    }

    /// Descend into the mapping under namespace key `segment`.
    pub fn push_namespace(&mut self, segment: &str) -> Result<()> {
        debug_assert_eq!(self.phase, Phase::Namespace);
        self.check_depth()?;
        try_push(&mut self.node_ns, try_string(segment)?)
    }

    pub fn pop_namespace(&mut self) {
        self.node_ns.pop();
    }

    /// Cross the sentinel key, returning the normalized full name of the
    /// node whose parameters follow.
    pub fn enter_parameters(&mut self) -> Result<String> {
        let name = self.node_name()?;
        if name.len() <= 1 {
            return Err(ParamError::missing_node(
                "parameters block has no node name above it",
            ));
        }
        self.phase = Phase::Parameters;
        Ok(name)
    }

    pub fn leave_parameters(&mut self) {
        self.param_ns.clear();
        self.phase = Phase::Namespace;
    }

    /// Descend into the mapping under parameter key `segment`.
    pub fn push_parameter(&mut self, segment: &str) -> Result<()> {
        debug_assert_eq!(self.phase, Phase::Parameters);
        self.check_depth()?;
        try_push(&mut self.param_ns, try_string(segment)?)
    }

    pub fn pop_parameter(&mut self) {
        self.param_ns.pop();
    }

    /// `/`-joined node name built from the namespace stack.
    ///
    /// Segments may themselves contain `/` (a key like `/ns/node`); empty
    /// pieces are dropped so the result never holds `//`.
    pub fn node_name(&self) -> Result<String> {
        let segments = self
            .node_ns
            .iter()
            .flat_map(|s| s.split(NODE_NS_SEPARATOR))
            .filter(|s| !s.is_empty());
        let name = try_join(segments, NODE_NS_SEPARATOR, true)?;
        if name.is_empty() {
            return try_string("/");
        }
        Ok(name)
    }

    /// `.`-joined parameter name of `leaf` under the open parameter mappings.
    pub fn parameter_name(&self, leaf: &str) -> Result<String> {
        let segments = self
            .param_ns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(leaf));
        try_join(segments, PARAMETER_NS_SEPARATOR, false)
    }
}
