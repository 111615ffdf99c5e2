//! Built-in filters

use coref_core::{DocumentGraph, Language, NodeId};
use tracing::debug;

use crate::Filter;

/// Rejects interjections (by head POS or constituent tag)
#[derive(Debug, Clone, Default)]
pub struct InterjectionFilter;

impl Filter for InterjectionFilter {
    fn name(&self) -> &str {
        "InterjectionFilter"
    }

    fn filter(&self, graph: &dyn DocumentGraph, language: &Language, mention: NodeId, _prev: &[NodeId]) -> bool {
        let node = graph.node(mention);
        let head_pos = graph
            .head_word(mention)
            .map(|head| graph.node(head).pos_str())
            .unwrap_or("");
        let rejected = language.tags.is_interjection(head_pos)
            || language.tags.is_interjection_constituent(node.tag_str());
        if rejected {
            debug!(form = %node.form, id = %node.label, "Mention is interjection");
        }
        rejected
    }
}

/// Rejects mentions nested in an earlier mention with the same head word
///
/// Nested mentions next to a comma or coordinating conjunction survive, since
/// they are likely members of an enumeration or apposition.
#[derive(Debug, Clone)]
pub struct SameHeadFilter {
    name: &'static str,
    prev_comma: bool,
    end_comma: bool,
    next_comma: bool,
}

impl SameHeadFilter {
    pub fn new() -> Self {
        Self {
            name: "SameHeadFilter",
            prev_comma: true,
            end_comma: true,
            next_comma: true,
        }
    }

    /// CoNLL flavour: only the following word is checked
    pub fn conll() -> Self {
        Self {
            name: "ConllSameHeadFilter",
            prev_comma: false,
            end_comma: false,
            next_comma: true,
        }
    }
}

impl Default for SameHeadFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_separator(graph: &dyn DocumentGraph, language: &Language, word: NodeId) -> bool {
    let word = graph.node(word);
    language.tags.is_conjunction(word.pos_str()) || word.form == ","
}

impl Filter for SameHeadFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn filter(&self, graph: &dyn DocumentGraph, language: &Language, mention: NodeId, prev: &[NodeId]) -> bool {
        let node = graph.node(mention);
        let Some(root) = graph.root_of(mention) else {
            return false;
        };
        let Some(head) = graph.head_word(mention) else {
            return false;
        };
        let words = graph.sentence_words(root);
        let offset = graph.node(root).span.start;
        let start = node.span.start - offset;
        let end = node.span.end - offset;

        for &prev_mention in prev {
            if prev_mention == mention {
                continue;
            }
            let prev_node = graph.node(prev_mention);
            if graph.head_word(prev_mention) != Some(head) || !node.span.is_inside(&prev_node.span) {
                continue;
            }
            if node.form.contains(',') {
                return true;
            }
            if self.next_comma {
                if let Some(&next) = words.get(end + 1) {
                    if is_separator(graph, language, next)
                        && graph.node(next).span.is_inside(&prev_node.span)
                    {
                        debug!(prev = %prev_node.form, "Not filtered inside an enumeration or apposition");
                        continue;
                    }
                }
            }
            if self.end_comma {
                if let Some(&last) = words.get(end) {
                    if is_separator(graph, language, last) {
                        debug!(prev = %prev_node.form, "Not filtered inside an enumeration or apposition");
                        continue;
                    }
                }
            }
            // The first word of the sentence is never checked
            if self.prev_comma && start > 1 {
                if is_separator(graph, language, words[start - 1]) {
                    debug!(prev = %prev_node.form, "Not filtered inside an enumeration");
                    continue;
                }
            }
            debug!(
                form = %node.form,
                id = %node.label,
                prev = %prev_node.label,
                "Filtered: same head word as an enclosing mention"
            );
            return true;
        }
        false
    }
}

/// Rejects mentions annotated as pleonastic
#[derive(Debug, Clone, Default)]
pub struct PleonasticFilter;

impl Filter for PleonasticFilter {
    fn name(&self) -> &str {
        "PleonasticFilter"
    }

    fn filter(&self, graph: &dyn DocumentGraph, _language: &Language, mention: NodeId, _prev: &[NodeId]) -> bool {
        graph.node(mention).attrs.pleonastic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coref_graph::Document;

    #[test]
    fn test_interjection_filter() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let intj = doc.add_constituent(root, "INTJ");
        doc.add_word(intj, "Oh", "UH");
        let np = doc.add_constituent(root, "NP");
        let uh = doc.add_word(np, "well", "UH");
        let other = doc.add_constituent(root, "NP");
        doc.add_word(other, "cats", "NNS");
        doc.finish_sentence(root);

        let en = Language::english();
        assert!(InterjectionFilter.filter(&doc, &en, intj, &[]));
        assert!(InterjectionFilter.filter(&doc, &en, np, &[]));
        assert!(InterjectionFilter.filter(&doc, &en, uh, &[]));
        assert!(!InterjectionFilter.filter(&doc, &en, other, &[]));
    }

    /// (NP (NP (DT the) (NN president)) (PP (IN of) (NP (NNP France))))
    #[test]
    fn test_same_head_nested() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let outer = doc.add_constituent(root, "NP");
        let inner = doc.add_constituent(outer, "NP");
        doc.add_word(inner, "the", "DT");
        doc.add_word(inner, "president", "NN");
        let pp = doc.add_constituent(outer, "PP");
        doc.add_word(pp, "of", "IN");
        let france = doc.add_constituent(pp, "NP");
        doc.add_word(france, "France", "NNP");
        doc.finish_sentence(root);

        let en = Language::english();
        let filter = SameHeadFilter::new();
        assert!(filter.filter(&doc, &en, inner, &[outer]));
        assert!(!filter.filter(&doc, &en, france, &[outer, inner]));
        assert!(!filter.filter(&doc, &en, inner, &[]));
    }

    /// (NP (NP (NNP Paris)) (, ,) (NP (NNP Texas)))
    #[test]
    fn test_same_head_apposition_survives() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let outer = doc.add_constituent(root, "NP");
        let paris = doc.add_constituent(outer, "NP");
        doc.add_word(paris, "Paris", "NNP");
        doc.add_word(outer, ",", ",");
        let texas = doc.add_constituent(outer, "NP");
        doc.add_word(texas, "Texas", "NNP");
        doc.finish_sentence(root);

        let en = Language::english();
        // Outer head is Paris: the inner Paris is followed by a comma
        assert_eq!(doc.head_word(outer), doc.head_word(paris));
        assert!(!SameHeadFilter::new().filter(&doc, &en, paris, &[outer]));
        assert!(!SameHeadFilter::conll().filter(&doc, &en, paris, &[outer]));
    }

    #[test]
    fn test_pleonastic_filter() {
        let mut doc = Document::new("t");
        let root = doc.add_sentence();
        let np = doc.add_constituent(root, "NP");
        let it = doc.add_word(np, "It", "PRP");
        doc.finish_sentence(root);
        let en = Language::english();
        assert!(!PleonasticFilter.filter(&doc, &en, it, &[]));
        doc.node_mut(it).attrs.pleonastic = true;
        assert!(PleonasticFilter.filter(&doc, &en, it, &[]));
    }
}
