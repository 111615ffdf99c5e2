//! Constituent head finding
//!
//! A reduced Collins head table. Each rule names a search direction and a
//! priority list of child categories; the first category with a matching
//! child wins. Noun phrases use their own procedure.

use coref_core::{DocumentGraph, NodeId};

use crate::Document;

#[derive(Clone, Copy)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

struct HeadRule {
    labels: &'static [&'static str],
    direction: Direction,
    priority: &'static [&'static str],
}

const RULES: &[HeadRule] = &[
    HeadRule {
        labels: &["S", "SQ", "SINV"],
        direction: Direction::LeftToRight,
        priority: &["TO", "IN", "VP", "S", "SBAR", "ADJP", "UCP", "NP"],
    },
    HeadRule {
        labels: &["SBAR", "SBARQ"],
        direction: Direction::LeftToRight,
        priority: &["WHNP", "WHPP", "WHADVP", "WHADJP", "IN", "DT", "S", "SQ", "SINV", "SBAR", "FRAG"],
    },
    HeadRule {
        labels: &["VP"],
        direction: Direction::LeftToRight,
        priority: &["TO", "VBD", "VBN", "MD", "VBZ", "VB", "VBG", "VBP", "VP", "ADJP", "NN", "NNS", "NP"],
    },
    HeadRule {
        labels: &["PP"],
        direction: Direction::LeftToRight,
        priority: &["IN", "TO", "VBG", "VBN", "RP", "FW"],
    },
    HeadRule {
        labels: &["ADJP"],
        direction: Direction::LeftToRight,
        priority: &["NNS", "QP", "NN", "$", "ADVP", "JJ", "VBN", "VBG", "ADJP", "JJR", "NP", "JJS", "DT", "RB"],
    },
    HeadRule {
        labels: &["ADVP"],
        direction: Direction::RightToLeft,
        priority: &["RB", "RBR", "RBS", "FW", "ADVP", "TO", "CD", "JJR", "JJ", "IN", "NP", "JJS", "NN"],
    },
    HeadRule {
        labels: &["WHNP"],
        direction: Direction::LeftToRight,
        priority: &["WDT", "WP", "WP$", "WHADJP", "WHPP", "WHNP"],
    },
    HeadRule {
        labels: &["QP"],
        direction: Direction::LeftToRight,
        priority: &["$", "IN", "NNS", "NN", "JJ", "RB", "DT", "CD", "QP", "JJR", "JJS"],
    },
];

const NOMINAL: &[&str] = &["NN", "NNP", "NNPS", "NNS", "NX", "NML", "POS", "JJR", "PRP"];

/// Strip function tags (`NP-SBJ` -> `NP`)
fn category(doc: &Document, id: NodeId) -> &str {
    let node = doc.node(id);
    let label = if node.is_word() { node.pos_str() } else { node.tag_str() };
    if label.starts_with('-') {
        return label;
    }
    label.split(['-', '=']).next().unwrap_or(label)
}

fn search(
    doc: &Document,
    children: &[NodeId],
    direction: Direction,
    wanted: &[&str],
) -> Option<NodeId> {
    let matches = |c: &&NodeId| wanted.contains(&category(doc, **c));
    match direction {
        Direction::LeftToRight => children.iter().find(matches).copied(),
        Direction::RightToLeft => children.iter().rev().find(matches).copied(),
    }
}

fn noun_phrase_head(doc: &Document, children: &[NodeId]) -> Option<NodeId> {
    let last = *children.last()?;
    if category(doc, last) == "POS" {
        return Some(last);
    }
    search(doc, children, Direction::RightToLeft, NOMINAL)
        .or_else(|| search(doc, children, Direction::LeftToRight, &["NP"]))
        .or_else(|| search(doc, children, Direction::RightToLeft, &["$", "ADJP", "PRN"]))
        .or_else(|| search(doc, children, Direction::RightToLeft, &["CD"]))
        .or_else(|| search(doc, children, Direction::RightToLeft, &["JJ", "JJS", "RB", "QP"]))
        .or(Some(last))
}

/// Child of `id` that carries its head
pub fn head_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    let children = doc.children_sorted(id);
    let first = *children.first()?;
    if children.len() == 1 {
        return Some(first);
    }

    let label = category(doc, id);
    if matches!(label, "NP" | "NML" | "NX") {
        return noun_phrase_head(doc, &children);
    }

    RULES
        .iter()
        .find(|rule| rule.labels.contains(&label))
        .and_then(|rule| {
            rule.priority
                .iter()
                .find_map(|wanted| search(doc, &children, rule.direction, &[*wanted]))
        })
        .or(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noun_phrase_rightmost_noun() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let np = doc.add_constituent(root, "NP");
        doc.add_word(np, "the", "DT");
        doc.add_word(np, "big", "JJ");
        doc.add_word(np, "house", "NN");
        doc.add_word(np, "today", "RB");
        doc.finish_sentence(root);
        let head = doc.head_word(np).unwrap();
        assert_eq!(doc.node(head).form, "house");
    }

    #[test]
    fn test_coordination_takes_first_conjunct() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let np = doc.add_constituent(root, "NP");
        let john = doc.add_constituent(np, "NP");
        doc.add_word(john, "John", "NNP");
        doc.add_word(np, "and", "CC");
        let mary = doc.add_constituent(np, "NP");
        doc.add_word(mary, "Mary", "NNP");
        doc.finish_sentence(root);
        let head = doc.head_word(np).unwrap();
        assert_eq!(doc.node(head).form, "John");
    }

    #[test]
    fn test_function_tags_are_ignored() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let pp = doc.add_constituent(root, "PP-LOC");
        doc.add_word(pp, "in", "IN");
        let np = doc.add_constituent(pp, "NP");
        doc.add_word(np, "Paris", "NNP");
        doc.finish_sentence(root);
        let head = doc.head_word(pp).unwrap();
        assert_eq!(doc.node(head).form, "in");
    }
}
