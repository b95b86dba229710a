//! Character trie over section names with path compression and size rollup.

use indexmap::map::Entry as MapEntry;
use indexmap::IndexMap;

use super::parse::Section;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieNode {
    Branch(IndexMap<String, TrieNode>),
    /// Terminal slot, always stored under the empty key
    Leaf(Section),
}

impl TrieNode {
    pub fn total_size(&self) -> u64 {
        match self {
            TrieNode::Branch(children) => children.values().map(TrieNode::total_size).sum(),
            TrieNode::Leaf(section) => section.total_size(),
        }
    }

    pub fn children(&self) -> Option<&IndexMap<String, TrieNode>> {
        match self {
            TrieNode::Branch(children) => Some(children),
            TrieNode::Leaf(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTrie {
    root: IndexMap<String, TrieNode>,
}

fn insert(children: &mut IndexMap<String, TrieNode>, mut chars: std::str::Chars<'_>, section: Section) {
    match chars.next() {
        None => match children.entry(String::new()) {
            // Same name seen twice: keep both sizes
            MapEntry::Occupied(mut occupied) => {
                if let TrieNode::Leaf(existing) = occupied.get_mut() {
                    existing.entries.extend(section.entries);
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(TrieNode::Leaf(section));
            }
        },
        Some(ch) => {
            let child = children
                .entry(ch.to_string())
                .or_insert_with(|| TrieNode::Branch(IndexMap::new()));
            if let TrieNode::Branch(grandchildren) = child {
                insert(grandchildren, chars, section);
            }
        }
    }
}

/// Fold a chain of single-child branches into one edge label.
fn collapse(mut label: String, mut node: TrieNode) -> (String, TrieNode) {
    loop {
        node = match node {
            TrieNode::Branch(mut children) if children.len() == 1 => match children.pop() {
                Some((key, child)) => {
                    label.push_str(&key);
                    child
                }
                None => TrieNode::Branch(children),
            },
            other => return (label, other),
        };
    }
}

fn prune_children(children: IndexMap<String, TrieNode>) -> IndexMap<String, TrieNode> {
    children
        .into_iter()
        .map(|(label, node)| {
            let (label, node) = collapse(label, node);
            let node = match node {
                TrieNode::Branch(grandchildren) => TrieNode::Branch(prune_children(grandchildren)),
                leaf => leaf,
            };
            (label, node)
        })
        .collect()
}

fn render_into(children: &IndexMap<String, TrieNode>, prefix: &str, depth: usize, out: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    for (label, node) in children {
        match node {
            TrieNode::Branch(grandchildren) => {
                let name = format!("{prefix}{label}");
                let size = node.total_size();
                out.push(format!("{indent}{name}: {size}"));
                if size > 0 {
                    render_into(grandchildren, &name, depth + 1, out);
                }
            }
            TrieNode::Leaf(section) => {
                out.push(format!("{indent}*{}: {}", section.name, section.total_size()));
            }
        }
    }
}

impl SectionTrie {
    /// One character per edge, one leaf per distinct section name.
    pub fn build<'a>(sections: impl IntoIterator<Item = &'a Section>) -> Self {
        let mut root = IndexMap::new();
        for section in sections {
            insert(&mut root, section.name.chars(), section.clone());
        }
        Self { root }
    }

    /// Path-compress the trie so no branch below the root has a single child.
    pub fn prune(self) -> Self {
        Self {
            root: prune_children(self.root),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.root.values().map(TrieNode::total_size).sum()
    }

    pub fn children(&self) -> &IndexMap<String, TrieNode> {
        &self.root
    }

    pub fn get(&self, label: &str) -> Option<&TrieNode> {
        self.root.get(label)
    }

    /// Nested `name: size` listing; zero-size subtrees are not expanded.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        render_into(&self.root, "", 0, &mut lines);
        lines.join("\n")
    }
}
