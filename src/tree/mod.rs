//! Tree data model for capiview
//!
//! Snapshots arrive from the backend as nested JSON objects. The shape is the
//! same for the management cluster view and the cluster resource view: a
//! `name`, a handful of optional domain attributes and an ordered list of
//! `children`. Everything downstream (layout, cards, canvas) works on the
//! normalized form produced by [`normalize`].

pub mod layout;
pub mod path;
pub mod status;

use serde::{Deserialize, Deserializer, Serialize};

pub use layout::{layout, Bounds, LayoutConfig, LinkGeometry, PositionedNode, TreeLayout};
pub use path::{build_path, LinkPath, Point};
pub use status::NodeStatus;

/// One node of a raw snapshot, exactly as the backend sends it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attrs: NodeAttributes,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<TreeNode>,
    /// Backend fields nothing reads (group, version, uid, ...). Kept so the
    /// fingerprint sees them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Domain attributes used for styling and the lens detail block.
///
/// The management view fills `namespace`, `provider`, `phase`, `ready`,
/// `isManagement` and `clusterUrl`; the cluster resource view fills `kind`,
/// `displayName`, `severity` and `hasReady`. Missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeAttributes {
    pub display_name: String,
    pub namespace: String,
    pub kind: String,
    #[serde(alias = "infrastructureProvider")]
    pub provider: String,
    #[serde(alias = "status")]
    pub phase: String,
    pub severity: String,
    pub ready: bool,
    pub has_ready: bool,
    pub is_management: bool,
    pub cluster_url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TreeNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TreeNode>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TreeNode {
    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Value fingerprint of the whole snapshot.
    ///
    /// Two snapshots with equal content always produce the same string, so a
    /// string comparison is enough to decide whether a redraw is needed.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A snapshot node decorated with render identity and interaction state
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNode {
    pub key: String,
    pub name: String,
    pub attrs: NodeAttributes,
    /// Reserved expansion state. Nothing toggles it yet, every node renders expanded.
    pub collapsed: bool,
    pub children: Vec<NormalizedNode>,
}

/// Decorate a snapshot with identity keys and default interaction state.
///
/// Keys are derived from the path to the node: the root is keyed by its name,
/// every child by `{parent_key}/{sibling_index}:{name}`. Sibling indices make
/// keys unique even when names repeat, and unchanged structure yields the same
/// keys on every refresh. The input is never modified.
pub fn normalize(root: &TreeNode) -> NormalizedNode {
    normalize_with_key(root, root.name.clone())
}

fn normalize_with_key(node: &TreeNode, key: String) -> NormalizedNode {
    let children = node
        .children
        .iter()
        .enumerate()
        .map(|(idx, child)| {
            let child_key = format!("{}/{}:{}", key, idx, child.name);
            normalize_with_key(child, child_key)
        })
        .collect();

    NormalizedNode {
        key,
        name: node.name.clone(),
        attrs: node.attrs.clone(),
        collapsed: false,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    pub(crate) fn leaf(name: &str) -> TreeNode {
        TreeNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn collect_keys(node: &NormalizedNode, out: &mut Vec<String>) {
        out.push(node.key.clone());
        for child in &node.children {
            collect_keys(child, out);
        }
    }

    #[test]
    fn test_deserialize_management_snapshot() {
        let json = r#"{
            "name": "mgmt",
            "namespace": "default",
            "infrastructureProvider": "docker",
            "isManagement": true,
            "phase": "Provisioned",
            "ready": true,
            "clusterUrl": "",
            "children": [
                {"name": "workload-1", "namespace": "default", "phase": "Provisioning", "ready": false, "children": null}
            ]
        }"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();
        assert_eq!(tree.name, "mgmt");
        assert_eq!(tree.attrs.provider, "docker");
        assert!(tree.attrs.is_management);
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn test_missing_children_is_empty() {
        let tree: TreeNode = serde_json::from_str(r#"{"name": "solo"}"#).unwrap();
        assert!(tree.children.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_status_field_reads_as_phase() {
        let tree: TreeNode =
            serde_json::from_str(r#"{"name": "root", "ready": false, "status": "Provisioning"}"#).unwrap();
        assert_eq!(tree.attrs.phase, "Provisioning");
        assert_eq!(NodeStatus::of(&tree.attrs), NodeStatus::Running);
    }

    #[test]
    fn test_unread_fields_change_fingerprint() {
        let a: TreeNode =
            serde_json::from_str(r#"{"name": "m1", "group": "a", "collapsible": false}"#).unwrap();
        let b: TreeNode =
            serde_json::from_str(r#"{"name": "m1", "group": "b", "collapsible": true}"#).unwrap();
        assert_eq!(a.extra.get("group"), Some(&serde_json::json!("a")));
        assert!(!a.extra.contains_key("name"));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn test_keys_unique_with_duplicate_names() {
        let mut root = leaf("root");
        root.children = vec![leaf("dup"), leaf("dup"), leaf("dup")];
        root.children[1].children = vec![leaf("dup")];

        let normalized = normalize(&root);
        let mut keys = Vec::new();
        collect_keys(&normalized, &mut keys);

        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_normalize_defaults_and_preserves_input() {
        let mut root = leaf("root");
        root.children = vec![leaf("a")];
        let before = root.clone();

        let normalized = normalize(&root);
        assert_eq!(root, before);
        assert!(!normalized.collapsed);
        assert!(!normalized.children[0].collapsed);
        assert_eq!(normalized.key, "root");
        assert_eq!(normalized.children[0].key, "root/0:a");
    }

    #[test]
    fn test_keys_stable_across_normalizations() {
        let mut root = leaf("root");
        root.children = vec![leaf("a"), leaf("b")];
        assert_eq!(normalize(&root), normalize(&root));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = leaf("root");
        let mut b = leaf("root");
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.attrs.ready = true;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
