//! Tidy tree layout
//!
//! Places a normalized tree top-down: depth picks the row, and a contour
//! merge picks the column. Each subtree is laid out relative to its own root;
//! siblings are then pushed right until, on every level they share, the left
//! contour of the new subtree clears the right contour of everything placed
//! before it. Parents are centered over their first and last child.
//!
//! The tree is flattened into a pre-order arena first, so both passes are
//! plain loops: children always sit after their parent in pre-order, so
//! walking the arena backwards visits every child before its parent. No
//! recursion depth is tied to tree depth.

use super::{NodeAttributes, NormalizedNode};
use serde::{Deserialize, Serialize};

/// Extra horizontal gap added to the node width for sibling spacing
const NODE_GAP: f64 = 20.0;
/// Separation factor between neighbours that share a parent
const SIBLING_FACTOR: f64 = 1.0;
/// Separation factor between neighbours from different parents (cousins)
const COUSIN_FACTOR: f64 = 1.2;

/// Node and level dimensions, in virtual pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub level_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 350.0,
            node_height: 140.0,
            level_height: 275.0,
        }
    }
}

impl LayoutConfig {
    /// Horizontal distance between two adjacent siblings
    pub fn sibling_distance(&self) -> f64 {
        (self.node_width + NODE_GAP) * SIBLING_FACTOR
    }
}

/// A node with its final coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub key: String,
    pub name: String,
    pub attrs: NodeAttributes,
    pub collapsed: bool,
    pub depth: usize,
    /// Index of the parent in [`TreeLayout::nodes`], `None` for the root
    pub parent: Option<usize>,
    pub x: f64,
    pub y: f64,
}

/// A parent → child edge, as indices into [`TreeLayout::nodes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkGeometry {
    pub source: usize,
    pub target: usize,
}

/// Axis-aligned extent of all node anchors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Result of one layout pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    /// Pre-order, root first
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<LinkGeometry>,
}

impl TreeLayout {
    /// Extent of all anchors; a zero-sized box at the origin for an empty layout
    pub fn bounds(&self) -> Bounds {
        let mut iter = self.nodes.iter();
        let Some(first) = iter.next() else {
            return Bounds {
                min_x: 0.0,
                max_x: 0.0,
                min_y: 0.0,
                max_y: 0.0,
            };
        };

        iter.fold(
            Bounds {
                min_x: first.x,
                max_x: first.x,
                min_y: first.y,
                max_y: first.y,
            },
            |b, n| Bounds {
                min_x: b.min_x.min(n.x),
                max_x: b.max_x.max(n.x),
                min_y: b.min_y.min(n.y),
                max_y: b.max_y.max(n.y),
            },
        )
    }

    pub fn link_endpoints(&self, link: &LinkGeometry) -> (&PositionedNode, &PositionedNode) {
        (&self.nodes[link.source], &self.nodes[link.target])
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.key == key)
    }
}

/// One level of a subtree outline, relative to the subtree root
#[derive(Debug, Clone, Copy)]
struct ContourLevel {
    left: f64,
    left_node: usize,
    right: f64,
    right_node: usize,
}

impl ContourLevel {
    fn single(node: usize) -> Self {
        Self {
            left: 0.0,
            left_node: node,
            right: 0.0,
            right_node: node,
        }
    }

    fn shifted(self, dx: f64) -> Self {
        Self {
            left: self.left + dx,
            right: self.right + dx,
            ..self
        }
    }
}

struct Slot<'a> {
    node: &'a NormalizedNode,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Lay out a normalized tree.
///
/// Returns one positioned node per input node (pre-order) and one link per
/// parent → child edge. Total over every tree shape.
pub fn layout(root: &NormalizedNode, config: &LayoutConfig) -> TreeLayout {
    let slots = flatten(root);
    let n = slots.len();

    // Offset of every node relative to its parent
    let mut offsets = vec![0.0_f64; n];
    let mut contours: Vec<Vec<ContourLevel>> = vec![Vec::new(); n];

    for v in (0..n).rev() {
        let children = &slots[v].children;
        if children.is_empty() {
            contours[v] = vec![ContourLevel::single(v)];
            continue;
        }

        let mut merged: Vec<ContourLevel> = std::mem::take(&mut contours[children[0]]);
        let mut positions = Vec::with_capacity(children.len());
        positions.push(0.0_f64);

        for &child in &children[1..] {
            let outline = std::mem::take(&mut contours[child]);

            let mut pos = f64::NEG_INFINITY;
            for (placed, next) in merged.iter().zip(outline.iter()) {
                let gap = separation(&slots, placed.right_node, next.left_node, config);
                pos = pos.max(placed.right + gap - next.left);
            }

            for (level, next) in outline.iter().enumerate() {
                let next = next.shifted(pos);
                match merged.get_mut(level) {
                    Some(placed) => {
                        placed.right = next.right;
                        placed.right_node = next.right_node;
                    }
                    None => merged.push(next),
                }
            }
            positions.push(pos);
        }

        let first = positions[0];
        let last = positions[positions.len() - 1];
        let mid = (first + last) / 2.0;

        for (&child, pos) in children.iter().zip(&positions) {
            offsets[child] = pos - mid;
        }

        let mut outline = Vec::with_capacity(merged.len() + 1);
        outline.push(ContourLevel::single(v));
        outline.extend(merged.into_iter().map(|level| level.shifted(-mid)));
        contours[v] = outline;
    }

    let mut nodes: Vec<PositionedNode> = Vec::with_capacity(n);
    let mut links = Vec::with_capacity(n.saturating_sub(1));

    for (idx, slot) in slots.iter().enumerate() {
        let x = match slot.parent {
            Some(p) => nodes[p].x + offsets[idx],
            None => 0.0,
        };
        if let Some(p) = slot.parent {
            links.push(LinkGeometry {
                source: p,
                target: idx,
            });
        }
        nodes.push(PositionedNode {
            key: slot.node.key.clone(),
            name: slot.node.name.clone(),
            attrs: slot.node.attrs.clone(),
            collapsed: slot.node.collapsed,
            depth: slot.depth,
            parent: slot.parent,
            x,
            y: slot.depth as f64 * config.level_height,
        });
    }

    TreeLayout { nodes, links }
}

fn separation(slots: &[Slot], a: usize, b: usize, config: &LayoutConfig) -> f64 {
    if slots[a].parent == slots[b].parent {
        config.sibling_distance()
    } else {
        (config.node_width + NODE_GAP) * COUSIN_FACTOR
    }
}

/// Pre-order arena of the tree
fn flatten(root: &NormalizedNode) -> Vec<Slot<'_>> {
    let mut slots: Vec<Slot> = Vec::new();
    let mut stack: Vec<(&NormalizedNode, usize, Option<usize>)> = vec![(root, 0, None)];

    while let Some((node, depth, parent)) = stack.pop() {
        let idx = slots.len();
        if let Some(p) = parent {
            slots[p].children.push(idx);
        }
        slots.push(Slot {
            node,
            depth,
            parent,
            children: Vec::with_capacity(node.children.len()),
        });
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1, Some(idx)));
        }
    }

    slots
}
