// In-memory implementation of the store traits.
//
// The tree is described in JSON with the same layout as the HDF5 files:
//
// ```json
// {
//   "type": "group",
//   "members": {
//     "c_Graphite": {
//       "type": "group",
//       "attrs": { "atomic_weight_ratio": 11.898, "nuclides": ["C0"] },
//       "members": {
//         "kTs": { "type": "group", "members": {
//           "296K": { "type": "dataset", "data": [0.0255] }
//         }}
//       }
//     }
//   }
// }
// ```
//
// Every group and dataset handle handed out is counted until dropped, which
// lets callers check that a load released everything it opened.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SabError};
use crate::store::{AttrValue, Dataset, Group};

/// One node of the in-memory tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Group {
        #[serde(default)]
        attrs: BTreeMap<String, AttrValue>,
        #[serde(default)]
        members: BTreeMap<String, Node>,
    },
    Dataset {
        /// Empty for a scalar
        #[serde(default)]
        shape: Vec<usize>,
        data: Vec<f64>,
        #[serde(default)]
        attrs: BTreeMap<String, AttrValue>,
    },
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Group { members, .. } => members.get(name),
            Node::Dataset { .. } => None,
        }
    }

    fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        match self {
            Node::Group { attrs, .. } | Node::Dataset { attrs, .. } => attrs,
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        match self {
            Node::Group { members, .. } => {
                for (name, member) in members {
                    member.validate(&format!("{}/{}", path, name))?;
                }
                Ok(())
            }
            Node::Dataset { shape, data, .. } => {
                let expected: usize = shape.iter().product();
                if expected != data.len() {
                    return Err(SabError::ShapeMismatch(format!(
                        "dataset '{}' declares shape {:?} but holds {} values",
                        path,
                        shape,
                        data.len()
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Counts one open handle for as long as it lives.
#[derive(Debug)]
struct HandleGuard(Arc<AtomicUsize>);

impl HandleGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        HandleGuard(Arc::clone(counter))
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An immutable in-memory store. Cheap to share between threads.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: Arc<Node>,
    open: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new(root: Node) -> Result<Self> {
        if !matches!(root, Node::Group { .. }) {
            return Err(SabError::ShapeMismatch(
                "store root must be a group".to_string(),
            ));
        }
        root.validate("")?;
        Ok(MemoryStore {
            root: Arc::new(root),
            open: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let root: Node = serde_json::from_value(value)?;
        Self::new(root)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: Node = serde_json::from_str(json)?;
        Self::new(root)
    }

    /// Handle to the root group (`/`).
    pub fn root(&self) -> MemGroup {
        MemGroup {
            root: Arc::clone(&self.root),
            path: Vec::new(),
            _guard: HandleGuard::acquire(&self.open),
        }
    }

    /// Number of group and dataset handles currently alive.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

fn walk<'a>(root: &'a Node, path: &[String]) -> Option<&'a Node> {
    path.iter().try_fold(root, |node, name| node.child(name))
}

fn join_path(path: &[String]) -> String {
    format!("/{}", path.join("/"))
}

/// Group handle into a [`MemoryStore`].
#[derive(Debug)]
pub struct MemGroup {
    root: Arc<Node>,
    path: Vec<String>,
    _guard: HandleGuard,
}

impl MemGroup {
    fn node(&self) -> Result<&Node> {
        walk(&self.root, &self.path)
            .ok_or_else(|| SabError::MissingData(format!("group '{}'", self.name())))
    }

    fn child_path(&self, name: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.extend(name.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        path
    }
}

impl Group for MemGroup {
    type Dataset = MemDataset;

    fn name(&self) -> String {
        join_path(&self.path)
    }

    fn open_group(&self, name: &str) -> Result<Self> {
        let path = self.child_path(name);
        match walk(&self.root, &path) {
            Some(Node::Group { .. }) => Ok(MemGroup {
                root: Arc::clone(&self.root),
                path,
                _guard: HandleGuard::acquire(&self._guard.0),
            }),
            _ => Err(SabError::MissingData(format!(
                "group '{}'",
                join_path(&path)
            ))),
        }
    }

    fn open_dataset(&self, name: &str) -> Result<MemDataset> {
        let path = self.child_path(name);
        match walk(&self.root, &path) {
            Some(Node::Dataset { .. }) => Ok(MemDataset {
                root: Arc::clone(&self.root),
                path,
                _guard: HandleGuard::acquire(&self._guard.0),
            }),
            _ => Err(SabError::MissingData(format!(
                "dataset '{}'",
                join_path(&path)
            ))),
        }
    }

    fn member_names(&self) -> Result<Vec<String>> {
        match self.node()? {
            Node::Group { members, .. } => Ok(members.keys().cloned().collect()),
            Node::Dataset { .. } => Ok(Vec::new()),
        }
    }

    fn dataset_names(&self) -> Result<Vec<String>> {
        match self.node()? {
            Node::Group { members, .. } => Ok(members
                .iter()
                .filter(|(_, node)| matches!(node, Node::Dataset { .. }))
                .map(|(name, _)| name.clone())
                .collect()),
            Node::Dataset { .. } => Ok(Vec::new()),
        }
    }

    fn exists(&self, path: &str) -> bool {
        walk(&self.root, &self.child_path(path)).is_some()
    }

    fn attr(&self, name: &str) -> Result<AttrValue> {
        self.node()?.attrs().get(name).cloned().ok_or_else(|| {
            SabError::MissingData(format!("attribute '{}' on '{}'", name, self.name()))
        })
    }
}

/// Dataset handle into a [`MemoryStore`].
#[derive(Debug)]
pub struct MemDataset {
    root: Arc<Node>,
    path: Vec<String>,
    _guard: HandleGuard,
}

impl MemDataset {
    fn parts(&self) -> Result<(&[usize], &[f64], &BTreeMap<String, AttrValue>)> {
        match walk(&self.root, &self.path) {
            Some(Node::Dataset { shape, data, attrs }) => {
                Ok((shape.as_slice(), data.as_slice(), attrs))
            }
            _ => Err(SabError::MissingData(format!("dataset '{}'", self.name()))),
        }
    }
}

impl Dataset for MemDataset {
    fn name(&self) -> String {
        join_path(&self.path)
    }

    fn shape(&self) -> Vec<usize> {
        self.parts().map(|(shape, _, _)| shape.to_vec()).unwrap_or_default()
    }

    fn read_raw(&self) -> Result<Vec<f64>> {
        Ok(self.parts()?.1.to_vec())
    }

    fn attr(&self, name: &str) -> Result<AttrValue> {
        self.parts()?.2.get(name).cloned().ok_or_else(|| {
            SabError::MissingData(format!("attribute '{}' on '{}'", name, self.name()))
        })
    }

    fn has_attr(&self, name: &str) -> bool {
        self.parts()
            .map(|(_, _, attrs)| attrs.contains_key(name))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_store() -> MemoryStore {
        MemoryStore::from_value(json!({
            "type": "group",
            "members": {
                "table": {
                    "type": "group",
                    "attrs": { "awr": 11.9, "mode": "equal", "names": ["a", "b"] },
                    "members": {
                        "grid": { "type": "dataset", "shape": [2, 3], "data": [1, 2, 3, 4, 5, 6],
                                  "attrs": { "offsets": [0, 2] } },
                        "scalar": { "type": "dataset", "data": [0.5] },
                        "sub": { "type": "group" }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_navigation_and_attributes() {
        let store = sample_store();
        let root = store.root();
        let table = root.open_group("table").unwrap();
        assert_eq!(table.name(), "/table");
        assert_eq!(table.attr_f64("awr").unwrap(), 11.9);
        assert_eq!(table.attr_string("mode").unwrap(), "equal");
        assert_eq!(table.attr_strings("names").unwrap(), vec!["a", "b"]);
        assert_eq!(table.dataset_names().unwrap(), vec!["grid", "scalar"]);
        assert_eq!(table.member_names().unwrap(), vec!["grid", "scalar", "sub"]);
        assert!(table.exists("sub"));
        assert!(root.exists("table/grid"));
        assert!(!root.exists("table/missing"));
        assert!(table.open_group("grid").is_err());
    }

    #[test]
    fn test_dataset_reads() {
        let store = sample_store();
        let root = store.root();
        let grid = root.open_dataset("table/grid").unwrap();
        assert_eq!(grid.shape(), vec![2, 3]);
        let arr = grid.read_2d().unwrap();
        assert_eq!(arr[[1, 0]], 4.0);
        assert!(grid.read_1d().is_err());
        assert_eq!(grid.attr_usize_vec("offsets").unwrap(), vec![0, 2]);

        let scalar = root.open_dataset("table/scalar").unwrap();
        assert_eq!(scalar.read_scalar().unwrap(), 0.5);
    }

    #[test]
    fn test_handles_are_released_on_drop() {
        let store = sample_store();
        {
            let root = store.root();
            let table = root.open_group("table").unwrap();
            let _grid = table.open_dataset("grid").unwrap();
            assert_eq!(store.open_handles(), 3);
        }
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_inconsistent_dataset_is_rejected() {
        let result = MemoryStore::from_value(json!({
            "type": "group",
            "members": {
                "bad": { "type": "dataset", "shape": [2, 2], "data": [1, 2, 3] }
            }
        }));
        assert!(matches!(result, Err(SabError::ShapeMismatch(_))));
    }
}
