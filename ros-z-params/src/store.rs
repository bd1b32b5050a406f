//! The owned parameter tree.
//!
//! `ParameterStore` maps node full names to their parameters, both in
//! insertion order. It is bound to a [`ParserLimits`] at construction and
//! enforces the node and parameter ceilings whenever a parse adds an entry.

use std::{collections::BTreeSet, fmt, path::Path};

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::{
    driver::DocumentDriver,
    error::{Limit, ParamError, Result},
    event::EventReader,
    limits::ParserLimits,
    path::normalize_node_name,
    types::ParameterValue,
};

/// `depth` value for [`NodeParams::list`] that disables the depth filter.
pub const DEPTH_RECURSIVE: u64 = 0;

/// Names and prefixes returned by [`NodeParams::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParametersResult {
    pub names: Vec<String>,
    pub prefixes: Vec<String>,
}

/// Parameters of a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeParams {
    name: String,
    parameters: IndexMap<String, ParameterValue>,
}

impl NodeParams {
    fn new(name: String) -> Self {
        Self {
            name,
            parameters: IndexMap::new(),
        }
    }

    /// Full name of the node, e.g. `/lidar_ns/lidar_1`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, param: &str) -> Option<&ParameterValue> {
        self.parameters.get(param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// List parameter names under the given dot-separated prefixes.
    ///
    /// An empty `prefixes` slice selects every parameter. `depth` counts the
    /// segments below the matching prefix; [`DEPTH_RECURSIVE`] lists all of
    /// them.
    pub fn list(&self, prefixes: &[String], depth: u64) -> ListParametersResult {
        let mut names = Vec::new();
        let mut found_prefixes = BTreeSet::new();

        for name in self.parameters.keys() {
            let matching = if prefixes.is_empty() {
                Some("")
            } else {
                prefixes
                    .iter()
                    .map(String::as_str)
                    .find(|prefix| is_under(name, prefix))
            };
            let Some(prefix) = matching else {
                continue;
            };

            if depth != DEPTH_RECURSIVE && relative_depth(name, prefix) > depth {
                continue;
            }

            names.push(name.clone());
            if let Some((parent, _)) = name.rsplit_once('.') {
                found_prefixes.insert(parent.to_string());
            }
        }

        names.sort();
        ListParametersResult {
            names,
            prefixes: found_prefixes.into_iter().collect(),
        }
    }
}

fn is_under(name: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || name == prefix
        || name
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn relative_depth(name: &str, prefix: &str) -> u64 {
    let suffix = if prefix.is_empty() {
        name
    } else if name == prefix {
        ""
    } else {
        &name[prefix.len() + 1..]
    };
    if suffix.is_empty() {
        0
    } else {
        suffix.matches('.').count() as u64 + 1
    }
}

/// Whether node selector `selector` applies to the node `node_fqn`.
///
/// - `/**` matches any node
/// - `/ns/**` matches any node below `/ns`
/// - `/ns/*` matches the direct children of `/ns`
/// - anything else must equal the node name
fn matches_node(selector: &str, node_fqn: &str) -> bool {
    if selector == "/**" {
        return true;
    }

    if let Some(prefix) = selector.strip_suffix("/**") {
        return node_fqn
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'));
    }

    if let Some(prefix) = selector.strip_suffix("/*") {
        return match node_fqn.strip_prefix(prefix) {
            Some(rest) => rest
                .strip_prefix('/')
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/')),
            None => false,
        };
    }

    selector == node_fqn
}

fn is_wildcard(selector: &str) -> bool {
    selector.ends_with("/**") || selector.ends_with("/*")
}

/// Node full name → parameter name → value.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    nodes: IndexMap<String, NodeParams>,
    limits: ParserLimits,
    num_parameters: usize,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// An empty store with the default limits.
    pub fn new() -> Self {
        Self::with_limits(ParserLimits::default())
    }

    pub fn with_limits(limits: ParserLimits) -> Self {
        Self {
            nodes: IndexMap::new(),
            limits,
            num_parameters: 0,
        }
    }

    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of parameters across all nodes.
    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }

    /// Look up a node. `name` may omit the leading `/`.
    pub fn node(&self, name: &str) -> Option<&NodeParams> {
        self.nodes.get(normalize_node_name(name).as_ref())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeParams> {
        self.nodes.values()
    }

    pub fn get(&self, node: &str, param: &str) -> Option<&ParameterValue> {
        self.node(node)?.get(param)
    }

    pub fn contains(&self, node: &str, param: &str) -> bool {
        self.get(node, param).is_some()
    }

    /// Parse a parameter document into this store.
    ///
    /// On error, entries committed before the failing event stay in the store.
    pub fn parse_str(&mut self, text: &str) -> Result<()> {
        DocumentDriver::new(self).run(EventReader::new(text))
    }

    /// Read and parse a parameter file.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParamError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("[PARAMS] Loading parameter file {:?}", path);
        self.parse_str(&text)
    }

    /// Parameters that apply to the node `node_fqn`, resolving node selectors.
    ///
    /// Wildcard entries are applied in store order, then the exact entry, so
    /// the most specific value wins.
    pub fn overrides_for(&self, node_fqn: &str) -> IndexMap<String, ParameterValue> {
        let node_fqn = normalize_node_name(node_fqn);
        let mut result = IndexMap::new();

        let wildcards = self
            .nodes
            .values()
            .filter(|n| is_wildcard(&n.name) && matches_node(&n.name, &node_fqn));
        let exact = self.nodes.get(node_fqn.as_ref());

        for node in wildcards.chain(exact) {
            for (name, value) in &node.parameters {
                result.insert(name.clone(), value.clone());
            }
        }
        result
    }

    /// Emit the diagnostic listing through `tracing` at debug level.
    pub fn log_dump(&self) {
        debug!(
            "[PARAMS] {} node(s), {} parameter(s)",
            self.nodes.len(),
            self.num_parameters
        );
        for node in self.nodes.values() {
            debug!("[PARAMS] {}", node.name);
            for (name, value) in &node.parameters {
                debug!(
                    "[PARAMS]   {}: {} ({})",
                    name,
                    value,
                    value.parameter_type()
                );
            }
        }
    }

    pub(crate) fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.get_index_of(name)
    }

    /// Index of the node `name`, creating it when absent.
    ///
    /// `name` must already be normalized.
    pub(crate) fn open_node(&mut self, name: String) -> Result<usize> {
        if let Some(index) = self.nodes.get_index_of(&name) {
            return Ok(index);
        }
        if self.nodes.len() >= self.limits.max_nodes {
            return Err(ParamError::limit(Limit::Nodes, self.limits.max_nodes));
        }
        self.nodes.try_reserve(1)?;
        debug!("[PARAMS] New node: {}", name);
        let (index, _) = self.nodes.insert_full(name.clone(), NodeParams::new(name));
        Ok(index)
    }

    /// Insert or overwrite parameter `name` of the node at `index`.
    pub(crate) fn commit(&mut self, index: usize, name: String, value: ParameterValue) -> Result<()> {
        let Some((_, node)) = self.nodes.get_index_mut(index) else {
            return Err(ParamError::missing_node(format!(
                "no node for parameter '{}'",
                name
            )));
        };

        if let Some(slot) = node.parameters.get_mut(&name) {
            debug!("[PARAMS] Overwriting {}/{}: {}", node.name, name, value);
            *slot = value;
            return Ok(());
        }

        if self.num_parameters >= self.limits.max_parameters {
            return Err(ParamError::limit(
                Limit::Parameters,
                self.limits.max_parameters,
            ));
        }
        node.parameters.try_reserve(1)?;
        debug!("[PARAMS] {}/{} = {}", node.name, name, value);
        node.parameters.insert(name, value);
        self.num_parameters += 1;
        Ok(())
    }
}

/// Structural equality: same nodes holding the same parameters.
impl PartialEq for ParameterStore {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Serialize for ParameterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.nodes.iter().map(|(name, node)| (name, &node.parameters)))
    }
}

impl fmt::Display for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes.values() {
            writeln!(f, "{}:", node.name)?;
            for (name, value) in &node.parameters {
                writeln!(f, "  {}: {} ({})", name, value, value.parameter_type())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamErrorKind;

    fn store_with(params: &[(&str, &str, ParameterValue)]) -> ParameterStore {
        let mut store = ParameterStore::new();
        for (node, name, value) in params {
            let index = store.open_node(node.to_string()).unwrap();
            store
                .commit(index, name.to_string(), value.clone())
                .unwrap();
        }
        store
    }

    #[test]
    fn test_commit_and_get() {
        let store = store_with(&[
            ("/camera", "id", ParameterValue::Integer(1)),
            ("/camera", "cam_spec.angle", ParameterValue::Double(2.34)),
            ("/intel", "arch", ParameterValue::String("x86_64".into())),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.num_parameters(), 3);
        assert_eq!(
            store.get("/camera", "cam_spec.angle"),
            Some(&ParameterValue::Double(2.34))
        );
        assert_eq!(
            store.get("intel", "arch"),
            Some(&ParameterValue::String("x86_64".into()))
        );
        assert!(!store.contains("/camera", "missing"));
        assert!(store.node("/nowhere").is_none());
    }

    #[test]
    fn test_insertion_order() {
        let store = store_with(&[
            ("/b", "z", ParameterValue::Bool(true)),
            ("/a", "y", ParameterValue::Bool(true)),
            ("/b", "x", ParameterValue::Bool(true)),
        ]);
        let names: Vec<_> = store.nodes().map(NodeParams::name).collect();
        assert_eq!(names, vec!["/b", "/a"]);
        let params: Vec<_> = store.node("/b").unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(params, vec!["z", "x"]);
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let mut store = store_with(&[("/n", "p", ParameterValue::Integer(1))]);
        let index = store.node_index("/n").unwrap();
        store
            .commit(index, "p".into(), ParameterValue::String("one".into()))
            .unwrap();
        assert_eq!(store.num_parameters(), 1);
        assert_eq!(store.get("/n", "p"), Some(&ParameterValue::String("one".into())));
    }

    #[test]
    fn test_parameter_ceiling() {
        let mut store = ParameterStore::with_limits(ParserLimits::default().with_max_parameters(2));
        let index = store.open_node("/n".into()).unwrap();
        store.commit(index, "a".into(), ParameterValue::Integer(1)).unwrap();
        store.commit(index, "b".into(), ParameterValue::Integer(2)).unwrap();
        let err = store
            .commit(index, "c".into(), ParameterValue::Integer(3))
            .unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::ResourceLimitExceeded);
        // Overwriting an existing entry is still allowed at the ceiling.
        store.commit(index, "a".into(), ParameterValue::Integer(9)).unwrap();
        assert_eq!(store.num_parameters(), 2);
    }

    #[test]
    fn test_node_ceiling() {
        let mut store = ParameterStore::with_limits(ParserLimits::default().with_max_nodes(1));
        store.open_node("/a".into()).unwrap();
        assert_eq!(store.open_node("/a".into()).unwrap(), 0);
        let err = store.open_node("/b".into()).unwrap_err();
        assert_eq!(err.kind(), ParamErrorKind::ResourceLimitExceeded);
    }

    #[test]
    fn test_list_parameters() {
        let store = store_with(&[
            ("/n", "a", ParameterValue::Bool(true)),
            ("/n", "a.b", ParameterValue::Bool(true)),
            ("/n", "a.b.c", ParameterValue::Bool(true)),
            ("/n", "x.y", ParameterValue::Bool(true)),
        ]);
        let node = store.node("/n").unwrap();

        let result = node.list(&[], DEPTH_RECURSIVE);
        assert_eq!(result.names.len(), 4);
        assert_eq!(result.prefixes, vec!["a", "a.b", "x"]);

        let result = node.list(&["a".to_string()], 1);
        assert_eq!(result.names, vec!["a", "a.b"]);

        let result = node.list(&["a".to_string()], DEPTH_RECURSIVE);
        assert_eq!(result.names.len(), 3);

        let result = node.list(&[], 1);
        assert_eq!(result.names, vec!["a"]);
    }

    #[test]
    fn test_matches_node() {
        assert!(matches_node("/**", "/any/node"));
        assert!(matches_node("/**", "/node"));
        assert!(matches_node("/my_ns/**", "/my_ns/node"));
        assert!(matches_node("/my_ns/**", "/my_ns/deep/node"));
        assert!(!matches_node("/my_ns/**", "/my_nsx/node"));
        assert!(!matches_node("/my_ns/**", "/other_ns/node"));
        assert!(matches_node("/my_ns/*", "/my_ns/node"));
        assert!(!matches_node("/my_ns/*", "/my_ns/deep/node"));
        assert!(matches_node("/my_node", "/my_node"));
        assert!(!matches_node("/my_node", "/other_node"));
    }

    #[test]
    fn test_overrides_exact_wins() {
        let store = store_with(&[
            ("/my_node", "rate", ParameterValue::Integer(10)),
            ("/**", "rate", ParameterValue::Integer(1)),
            ("/**", "global", ParameterValue::Bool(true)),
            ("/other", "not_mine", ParameterValue::Integer(0)),
        ]);
        let params = store.overrides_for("my_node");
        assert_eq!(params["rate"], ParameterValue::Integer(10));
        assert_eq!(params["global"], ParameterValue::Bool(true));
        assert!(!params.contains_key("not_mine"));
    }

    #[test]
    fn test_display_dump() {
        let store = store_with(&[
            ("/lidar_ns/lidar_1", "ports", ParameterValue::IntegerArray(vec![2438, 2439])),
            ("/lidar_ns/lidar_1", "is_back", ParameterValue::Bool(false)),
        ]);
        assert_eq!(
            store.to_string(),
            "/lidar_ns/lidar_1:\n  ports: [2438, 2439] (integer_array)\n  is_back: false (bool)\n"
        );
    }

    #[test]
    fn test_serialize_as_nested_map() {
        let store = store_with(&[("/n", "p", ParameterValue::Integer(3))]);
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"/n":{"p":{"type":"integer","value":3}}}"#);
    }

    #[test]
    fn test_structural_equality_ignores_limits() {
        let a = store_with(&[("/n", "p", ParameterValue::Integer(3))]);
        let mut b = ParameterStore::with_limits(ParserLimits::default().with_max_nodes(5));
        let index = b.open_node("/n".into()).unwrap();
        b.commit(index, "p".into(), ParameterValue::Integer(3)).unwrap();
        assert_eq!(a, b);
    }
}
