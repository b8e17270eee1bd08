//! Tree-token rendering of dependency trees.

use std::fmt::Write;

use deptree_core::config::TokenStyle;

use crate::node::DependencyNode;
use crate::visitor::DependencyNodeVisitor;

/// The four strings a tree is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeTokens {
    node_indent: &'static str,
    last_node_indent: &'static str,
    fill_indent: &'static str,
    last_fill_indent: &'static str,
}

impl TreeTokens {
    /// `+- `, `\- `, `|  `.
    pub const STANDARD: TreeTokens = TreeTokens {
        node_indent: "+- ",
        last_node_indent: "\\- ",
        fill_indent: "|  ",
        last_fill_indent: "   ",
    };

    pub const WHITESPACE: TreeTokens = TreeTokens {
        node_indent: "   ",
        last_node_indent: "   ",
        fill_indent: "   ",
        last_fill_indent: "   ",
    };

    /// Box-drawing characters.
    pub const EXTENDED: TreeTokens = TreeTokens {
        node_indent: "\u{251C}\u{2500} ",
        last_node_indent: "\u{2514}\u{2500} ",
        fill_indent: "\u{2502}  ",
        last_fill_indent: "   ",
    };

    pub fn node_indent(&self, last: bool) -> &'static str {
        if last {
            self.last_node_indent
        } else {
            self.node_indent
        }
    }

    pub fn fill_indent(&self, last: bool) -> &'static str {
        if last {
            self.last_fill_indent
        } else {
            self.fill_indent
        }
    }
}

impl Default for TreeTokens {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl From<TokenStyle> for TreeTokens {
    fn from(style: TokenStyle) -> Self {
        match style {
            TokenStyle::Standard => Self::STANDARD,
            TokenStyle::Whitespace => Self::WHITESPACE,
            TokenStyle::Extended => Self::EXTENDED,
        }
    }
}

/// Writes one line per visited node, prefixed with tree tokens.
///
/// The visitor tracks sibling positions itself and must be shown every node
/// of the tree. To render a filtered tree, build a filtered copy first.
pub struct SerializingVisitor<W> {
    writer: W,
    tokens: TreeTokens,
    /// Children still to be visited, per open ancestor.
    remaining: Vec<usize>,
    /// Whether the node at each open depth is the last of its siblings.
    last: Vec<bool>,
    failed: bool,
}

impl<W: Write> SerializingVisitor<W> {
    pub fn new(writer: W, tokens: TreeTokens) -> Self {
        Self {
            writer,
            tokens,
            remaining: Vec::new(),
            last: Vec::new(),
            failed: false,
        }
    }

    /// Whether writing to the sink failed and traversal was aborted.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, node: &DependencyNode, is_last: bool) -> std::fmt::Result {
        let depth = self.last.len();
        for level in 1..depth {
            self.writer.write_str(self.tokens.fill_indent(self.last[level]))?;
        }
        if depth > 0 {
            self.writer.write_str(self.tokens.node_indent(is_last))?;
        }
        writeln!(self.writer, "{}", node.to_node_string())
    }
}

impl<'a, W: Write> DependencyNodeVisitor<'a> for SerializingVisitor<W> {
    fn visit(&mut self, node: &'a DependencyNode) -> bool {
        let is_last = match self.remaining.last_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => true,
        };
        if self.write_line(node, is_last).is_err() {
            self.failed = true;
            return false;
        }
        self.remaining.push(node.children().len());
        self.last.push(is_last);
        true
    }

    fn end_visit(&mut self, _node: &'a DependencyNode) -> bool {
        if self.failed {
            return false;
        }
        self.remaining.pop();
        self.last.pop();
        true
    }
}

/// Render `root` and its descendants with the given tokens.
pub fn render(root: &DependencyNode, tokens: TreeTokens) -> String {
    let mut visitor = SerializingVisitor::new(String::new(), tokens);
    root.accept(&mut visitor);
    visitor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deptree_core::artifact::{Artifact, ArtifactScope};

    fn node(id: &str) -> DependencyNode {
        DependencyNode::new(Artifact::new("g", id, "1").with_scope(ArtifactScope::Compile))
    }

    /// `root -> (a -> (b, c -> d), e -> f)`
    fn tree() -> DependencyNode {
        let mut c = node("c");
        c.add_child(node("d")).unwrap();
        let mut a = node("a");
        a.add_child(node("b")).unwrap();
        a.add_child(c).unwrap();
        let mut e = node("e");
        e.add_child(node("f")).unwrap();
        let mut root = node("root");
        root.add_child(a).unwrap();
        root.add_child(e).unwrap();
        root
    }

    #[test]
    fn standard_tokens() {
        let expected = "\
g:root:jar:1:compile
+- g:a:jar:1:compile
|  +- g:b:jar:1:compile
|  \\- g:c:jar:1:compile
|     \\- g:d:jar:1:compile
\\- g:e:jar:1:compile
   \\- g:f:jar:1:compile
";
        assert_eq!(render(&tree(), TreeTokens::STANDARD), expected);
    }

    #[test]
    fn whitespace_tokens() {
        let expected = "\
g:root:jar:1:compile
   g:a:jar:1:compile
      g:b:jar:1:compile
      g:c:jar:1:compile
         g:d:jar:1:compile
   g:e:jar:1:compile
      g:f:jar:1:compile
";
        assert_eq!(render(&tree(), TreeTokens::WHITESPACE), expected);
    }

    #[test]
    fn extended_tokens() {
        let expected = "\
g:root:jar:1:compile
├─ g:a:jar:1:compile
│  ├─ g:b:jar:1:compile
│  └─ g:c:jar:1:compile
│     └─ g:d:jar:1:compile
└─ g:e:jar:1:compile
   └─ g:f:jar:1:compile
";
        assert_eq!(render(&tree(), TreeTokens::EXTENDED), expected);
    }

    #[test]
    fn whitespace_matches_legacy_rendering() {
        let tree = tree();
        assert_eq!(render(&tree, TreeTokens::WHITESPACE), tree.to_tree_string());
    }

    #[test]
    fn single_node() {
        assert_eq!(render(&node("only"), TreeTokens::STANDARD), "g:only:jar:1:compile\n");
    }

    #[test]
    fn token_style_mapping() {
        assert_eq!(TreeTokens::from(TokenStyle::Extended), TreeTokens::EXTENDED);
        assert_eq!(TreeTokens::default(), TreeTokens::STANDARD);
    }
}
