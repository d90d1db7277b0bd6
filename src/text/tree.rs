//! Bracketed parse trees such as `(S (NP (DT the) (NN dog)) (VP barks))`

use crate::io::error::{Result, invalid_input};

/// A labelled node; leaves carry the index of their terminal in the sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    label: String,
    terminal_index: Option<usize>,
    children: Vec<Self>,
}

impl TreeNode {
    /// Create a nonterminal with no children
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            terminal_index: None,
            children: Vec::new(),
        }
    }

    /// Create a terminal leaf
    pub fn terminal(label: impl Into<String>, index: usize) -> Self {
        Self {
            label: label.into(),
            terminal_index: Some(index),
            children: Vec::new(),
        }
    }

    /// Node label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Position of this leaf in the sentence, if it is a terminal
    pub const fn terminal_index(&self) -> Option<usize> {
        self.terminal_index
    }

    /// Child nodes in order
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Append a child
    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Terminal indices covered by this node, left to right
    pub fn terminal_indices(&self) -> Vec<usize> {
        match self.terminal_index {
            Some(index) => vec![index],
            None => self
                .children
                .iter()
                .flat_map(Self::terminal_indices)
                .collect(),
        }
    }

    fn pretty_into(&self, depth: usize, text: &mut String) {
        if self.terminal_index.is_some() {
            text.push(' ');
            text.push_str(&self.label);
            return;
        }
        if depth != 0 {
            text.push('\n');
        }
        text.push_str(&"  ".repeat(depth));
        text.push('(');
        text.push_str(&self.label);
        for child in &self.children {
            child.pretty_into(depth + 1, text);
        }
        text.push(')');
    }
}

/// A parse tree with a single root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: TreeNode,
}

impl Tree {
    /// Wrap an existing root node
    pub const fn new(root: TreeNode) -> Self {
        Self { root }
    }

    /// Parse bracketed text
    ///
    /// Each `(` is followed by a label; bare words inside brackets become
    /// terminals numbered from 0 in reading order.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced brackets, text outside the root, or
    /// input with no tree
    pub fn parse(text: &str) -> Result<Self> {
        let mut stack: Vec<TreeNode> = Vec::new();
        let mut root: Option<TreeNode> = None;
        let mut next_terminal = 0;
        let mut chars = text.char_indices().peekable();

        let is_delimiter = |c: char| c.is_whitespace() || c == '(' || c == ')';

        while let Some((offset, c)) = chars.next() {
            if c.is_whitespace() {
                continue;
            }
            if root.is_some() {
                return Err(invalid_input(&format!(
                    "unexpected {c:?} after the root closed at offset {offset}"
                )));
            }
            match c {
                '(' => {
                    let mut label = String::new();
                    while let Some(&(_, next)) = chars.peek() {
                        if is_delimiter(next) {
                            break;
                        }
                        label.push(next);
                        chars.next();
                    }
                    stack.push(TreeNode::new(label));
                }
                ')' => {
                    let node = stack.pop().ok_or_else(|| {
                        invalid_input(&format!("unmatched ')' at offset {offset}"))
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.add_child(node),
                        None => root = Some(node),
                    }
                }
                _ => {
                    let mut word = String::from(c);
                    while let Some(&(_, next)) = chars.peek() {
                        if is_delimiter(next) {
                            break;
                        }
                        word.push(next);
                        chars.next();
                    }
                    let parent = stack.last_mut().ok_or_else(|| {
                        invalid_input(&format!("word '{word}' outside brackets at offset {offset}"))
                    })?;
                    parent.add_child(TreeNode::terminal(word, next_terminal));
                    next_terminal += 1;
                }
            }
        }

        if !stack.is_empty() {
            return Err(invalid_input(&format!(
                "{} unclosed '(' at end of input",
                stack.len()
            )));
        }
        root.map(Self::new)
            .ok_or_else(|| invalid_input(&"no tree in input"))
    }

    /// Root node
    pub const fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Mutable root node
    pub const fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.root
    }

    /// Indented rendering with one nonterminal per line
    pub fn pretty(&self) -> String {
        let mut text = String::new();
        self.root.pretty_into(0, &mut text);
        text
    }
}
