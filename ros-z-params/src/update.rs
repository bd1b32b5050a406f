//! Single-value updates.
//!
//! A replacement value such as `[8080]`, `true` or `'0'` is tokenized on its
//! own and typed by the same inferencer and array builder the document driver
//! uses, so a literal always gets the same type on both paths.

use tracing::debug;

use crate::{
    alloc::try_string,
    error::{ParamError, Result},
    event::{EventReader, Located, ParseEvent, ScalarToken},
    infer::{infer_scalar, ArrayBuilder},
    limits::ParserLimits,
    path::normalize_node_name,
    store::ParameterStore,
    types::ParameterValue,
};

impl ParameterStore {
    /// Parse `text` as the new value of `param` on the existing node `node`.
    ///
    /// Overwrites the parameter when it exists, otherwise adds it to the node.
    /// Nothing else in the store changes.
    pub fn parse_value(&mut self, node: &str, param: &str, text: &str) -> Result<()> {
        let node_name = normalize_node_name(node);
        let Some(index) = self.node_index(&node_name) else {
            return Err(ParamError::UnknownNode(node_name.into_owned()));
        };
        if param.is_empty() {
            return Err(ParamError::malformed("empty parameter name"));
        }
        self.limits().check_string(param)?;

        let value = read_value(EventReader::new(text), param, self.limits())?;
        debug!("[PARAMS] Updating {}/{} from '{}'", node_name, param, text);
        let name = try_string(param)?;
        self.commit(index, name, value)
    }
}

/// Read exactly one scalar or flow sequence from `events`.
///
/// `key` only names the value in errors.
pub fn read_value<I>(events: I, key: &str, limits: &ParserLimits) -> Result<ParameterValue>
where
    I: IntoIterator<Item = Result<Located>>,
{
    let mut reader = ValueReader {
        key,
        limits,
        value: None,
        array: None,
        documents: 0,
    };
    for item in events {
        let Located { event, line } = item?;
        reader.handle(event).map_err(|e| e.at_line(line))?;
    }
    if reader.array.is_some() {
        return Err(ParamError::malformed("unterminated sequence"));
    }
    reader.value.ok_or_else(|| ParamError::missing_value(key))
}

struct ValueReader<'a> {
    key: &'a str,
    limits: &'a ParserLimits,
    value: Option<ParameterValue>,
    array: Option<ArrayBuilder>,
    documents: usize,
}

impl ValueReader<'_> {
    fn handle(&mut self, event: ParseEvent) -> Result<()> {
        match event {
            ParseEvent::StreamStart | ParseEvent::StreamEnd | ParseEvent::DocumentEnd => Ok(()),
            ParseEvent::DocumentStart => {
                if self.documents > 0 {
                    return Err(ParamError::unsupported("multiple documents in one value"));
                }
                self.documents += 1;
                Ok(())
            }
            ParseEvent::Alias
            | ParseEvent::MappingStart { anchored: true }
            | ParseEvent::SequenceStart { anchored: true } => Err(ParamError::alias()),
            ParseEvent::Scalar(token) if token.anchored => Err(ParamError::alias()),
            ParseEvent::MappingStart { .. } => {
                Err(ParamError::unsupported("a parameter value cannot be a mapping"))
            }
            ParseEvent::MappingEnd => Err(ParamError::malformed("unbalanced end of mapping")),
            ParseEvent::SequenceStart { .. } => {
                if self.array.is_some() {
                    return Err(ParamError::unsupported("sequence inside a sequence"));
                }
                self.expect_no_value()?;
                self.array = Some(ArrayBuilder::new(self.limits));
                Ok(())
            }
            ParseEvent::SequenceEnd => {
                let Some(builder) = self.array.take() else {
                    return Err(ParamError::malformed("unbalanced end of sequence"));
                };
                self.value = Some(builder.finish()?);
                Ok(())
            }
            ParseEvent::Scalar(token) => self.scalar(token),
        }
    }

    fn scalar(&mut self, token: ScalarToken) -> Result<()> {
        if let Some(builder) = self.array.as_mut() {
            let (text, quoted) = token.into_element();
            return builder.push(text, quoted);
        }
        self.expect_no_value()?;
        if token.is_null() {
            return Err(ParamError::missing_value(self.key));
        }
        self.value = Some(infer_scalar(&token.text, token.quoted, self.limits)?.into());
        Ok(())
    }

    fn expect_no_value(&self) -> Result<()> {
        if self.value.is_some() {
            return Err(ParamError::unsupported("more than one value"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamErrorKind;

    fn lidar_store() -> ParameterStore {
        let mut store = ParameterStore::new();
        store
            .parse_str(
                "lidar_ns:\n  lidar_1:\n    ros__parameters:\n      ports: [2438, 2439, 2440]\n      is_back: false\n",
            )
            .unwrap();
        store
    }

    fn value(text: &str) -> Result<ParameterValue> {
        read_value(EventReader::new(text), "p", &ParserLimits::default())
    }

    #[test]
    fn test_overwrite_array() {
        let mut store = lidar_store();
        store
            .parse_value("lidar_ns/lidar_1", "ports", "[8080]")
            .unwrap();
        assert_eq!(
            store.get("/lidar_ns/lidar_1", "ports"),
            Some(&ParameterValue::IntegerArray(vec![8080]))
        );
        assert_eq!(
            store.get("/lidar_ns/lidar_1", "is_back"),
            Some(&ParameterValue::Bool(false))
        );
        assert_eq!(store.num_parameters(), 2);
    }

    #[test]
    fn test_type_may_change() {
        let mut store = lidar_store();
        store
            .parse_value("/lidar_ns/lidar_1", "is_back", "x86")
            .unwrap();
        assert_eq!(
            store.get("/lidar_ns/lidar_1", "is_back"),
            Some(&ParameterValue::String("x86".into()))
        );
    }

    #[test]
    fn test_insert_new_parameter() {
        let mut store = lidar_store();
        store
            .parse_value("/lidar_ns/lidar_1", "gain", "2.2")
            .unwrap();
        assert_eq!(
            store.get("/lidar_ns/lidar_1", "gain"),
            Some(&ParameterValue::Double(2.2))
        );
        assert_eq!(store.num_parameters(), 3);
    }

    #[test]
    fn test_unknown_node() {
        let mut store = lidar_store();
        let err = store.parse_value("/camera", "id", "1").unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::UnknownNode);
        assert_eq!(store.num_parameters(), 2);
    }

    #[test]
    fn test_empty_parameter_name() {
        let mut store = lidar_store();
        let err = store
            .parse_value("/lidar_ns/lidar_1", "", "1")
            .unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::MalformedStructure);
    }

    #[test]
    fn test_same_inference_as_documents() {
        assert_eq!(value("true").unwrap(), ParameterValue::Bool(true));
        assert_eq!(value("'0'").unwrap(), ParameterValue::String("0".into()));
        assert_eq!(value("\"\"").unwrap(), ParameterValue::String(String::new()));
        assert_eq!(
            value("[and, 7]").unwrap(),
            ParameterValue::StringArray(vec!["and".into(), "7".into()])
        );
        assert_eq!(value("[]").unwrap(), ParameterValue::StringArray(vec![]));
    }

    #[test]
    fn test_rejected_values() {
        assert_eq!(value("").unwrap_err().kind(), ParamErrorKind::MissingValue);
        assert_eq!(value("~").unwrap_err().kind(), ParamErrorKind::MissingValue);
        assert_eq!(
            value("{a: 1}").unwrap_err().kind(),
            ParamErrorKind::UnsupportedStructure
        );
        assert_eq!(
            value("[[1], [2]]").unwrap_err().kind(),
            ParamErrorKind::UnsupportedStructure
        );
        assert_eq!(
            value("&a 1").unwrap_err().kind(),
            ParamErrorKind::AliasNotSupported
        );
        assert_eq!(
            value("[1, 2").unwrap_err().kind(),
            ParamErrorKind::MalformedStructure
        );
    }

    #[test]
    fn test_failed_update_leaves_entry() {
        let mut store = lidar_store();
        store
            .parse_value("/lidar_ns/lidar_1", "ports", "{a: 1}")
            .unwrap_err();
        assert_eq!(
            store.get("/lidar_ns/lidar_1", "ports"),
            Some(&ParameterValue::IntegerArray(vec![2438, 2439, 2440]))
        );
    }
}
