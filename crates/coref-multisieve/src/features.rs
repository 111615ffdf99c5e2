//! Mention characterization
//!
//! Fills the mention type and the agreement attributes sieves rely on.
//! Only unset slots are written, so explicit annotations always win.

use tracing::debug;

use coref_core::{
    Animacy, Attributes, DocumentGraph, Gender, Language, MentionType, NodeId, Number, Person, TagSet,
};

/// Coordination of at least two noun phrases
pub fn is_enumeration(graph: &dyn DocumentGraph, tags: &dyn TagSet, mention: NodeId) -> bool {
    let node = graph.node(mention);
    let tree = if node.children.is_empty() {
        match node.constituent.filter(|c| graph.node(*c).span == node.span) {
            Some(constituent) => constituent,
            None => return false,
        }
    } else {
        mention
    };
    if !tags.is_enumerable(graph.node(tree).tag_str()) {
        return false;
    }
    let children = graph.children_sorted(tree);
    let separated = children.iter().any(|c| {
        let child = graph.node(*c);
        tags.is_conjunction(child.pos_str()) || child.form == ","
    });
    let members = children
        .iter()
        .filter(|c| tags.is_enumerable(graph.node(**c).tag_str()))
        .count();
    separated && members >= 2
}

fn mention_type(
    graph: &dyn DocumentGraph,
    language: &Language,
    mention: NodeId,
    words: &[NodeId],
    head: NodeId,
) -> MentionType {
    let head = graph.node(head);
    let form = head.form.as_str();
    if is_enumeration(graph, language.tags.as_ref(), mention) {
        MentionType::Enumeration
    } else if words.len() == 1
        && (language.tags.is_pronoun(head.pos_str())
            || language.lexicon.is_pronoun(form)
            || language.lexicon.is_relative(form))
    {
        MentionType::Pronoun
    } else if language.tags.is_proper_noun(head.pos_str()) {
        MentionType::Proper
    } else {
        MentionType::Nominal
    }
}

/// Characterize one mention
pub fn characterize(graph: &mut dyn DocumentGraph, language: &Language, mention: NodeId) {
    let view: &dyn DocumentGraph = &*graph;
    let words = view.words(mention);
    let Some(head) = view.head_word(mention).or_else(|| words.last().copied()) else {
        return;
    };
    let kind = view
        .node(mention)
        .attrs
        .mention_type
        .unwrap_or_else(|| mention_type(view, language, mention, &words, head));

    let head_node = view.node(head);
    let form = head_node.form.clone();
    let pos = head_node.pos_str().to_string();
    let known: Attributes = head_node.attrs.clone();
    let ner = view
        .node(mention)
        .ner
        .clone()
        .or_else(|| head_node.head_of_ner.clone())
        .unwrap_or_default();

    let (tags, lexicon) = (language.tags.as_ref(), language.lexicon.as_ref());
    let pronoun = kind == MentionType::Pronoun;

    let gender = if known.gender != Gender::Unknown {
        known.gender
    } else if pronoun {
        lexicon.gender(&form)
    } else {
        Gender::Unknown
    };

    let number = if known.number != Number::Unknown {
        known.number
    } else if pronoun {
        lexicon.number(&form)
    } else if kind == MentionType::Enumeration || tags.is_plural_noun(&pos) {
        Number::Plural
    } else if tags.is_singular_noun(&pos) {
        Number::Singular
    } else {
        Number::Unknown
    };

    let person = if known.person != Person::Unknown {
        known.person
    } else if pronoun {
        lexicon.person(&form)
    } else {
        Person::Third
    };

    let animacy = if known.animacy != Animacy::Unknown {
        known.animacy
    } else if pronoun {
        lexicon.animacy(&form)
    } else if tags.is_person_ner(&ner) {
        Animacy::Animate
    } else if tags.is_organization_ner(&ner) || tags.is_location_ner(&ner) {
        Animacy::Inanimate
    } else {
        Animacy::Unknown
    };

    let node = graph.node_mut(mention);
    let attrs = &mut node.attrs;
    attrs.mention_type = Some(kind);
    if attrs.gender == Gender::Unknown {
        attrs.gender = gender;
    }
    if attrs.number == Number::Unknown {
        attrs.number = number;
    }
    if attrs.person == Person::Unknown {
        attrs.person = person;
    }
    if attrs.animacy == Animacy::Unknown {
        attrs.animacy = animacy;
    }
    debug!(
        form = %node.form,
        mention_type = ?kind,
        gender = ?node.attrs.gender,
        number = ?node.attrs.number,
        person = ?node.attrs.person,
        "Mention characterized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use coref_core::Span;
    use coref_graph::loader::load_tree;
    use coref_graph::Document;

    fn mention(doc: &Document, root: NodeId, start: usize, end: usize) -> NodeId {
        doc.nodes_with_span(root, Span::new(start, end))[0]
    }

    #[test]
    fn test_pronoun_and_proper() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (S (NP (NNP John)) (VP (VBD said) (SBAR (S (NP (PRP he)) (VP (VBD left)))))))").unwrap();
        let en = Language::english();
        let john = mention(&doc, root, 0, 0);
        let he = mention(&doc, root, 2, 2);
        characterize(&mut doc, &en, john);
        characterize(&mut doc, &en, he);

        let john = &doc.node(john).attrs;
        assert_eq!(john.mention_type, Some(MentionType::Proper));
        assert_eq!(john.person, Person::Third);
        assert_eq!(john.number, Number::Singular);
        assert_eq!(john.gender, Gender::Unknown);

        let he = &doc.node(he).attrs;
        assert_eq!(he.mention_type, Some(MentionType::Pronoun));
        assert_eq!(he.gender, Gender::Male);
        assert_eq!(he.number, Number::Singular);
        assert_eq!(he.person, Person::Third);
        assert_eq!(he.animacy, Animacy::Animate);
    }

    #[test]
    fn test_enumeration() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (S (NP (NP (NNP John)) (CC and) (NP (NNP Mary))) (VP (VBD came))))").unwrap();
        let en = Language::english();
        let both = mention(&doc, root, 0, 2);
        assert!(is_enumeration(&doc, en.tags.as_ref(), both));
        characterize(&mut doc, &en, both);
        assert_eq!(doc.node(both).attrs.mention_type, Some(MentionType::Enumeration));
        assert_eq!(doc.node(both).attrs.number, Number::Plural);

        let john = mention(&doc, root, 0, 0);
        assert!(!is_enumeration(&doc, en.tags.as_ref(), john));
    }

    #[test]
    fn test_annotations_win() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (S (NP (NNP Alex)) (VP (VBD left))))").unwrap();
        let en = Language::english();
        let alex = mention(&doc, root, 0, 0);
        doc.node_mut(alex).attrs.gender = Gender::Female;
        characterize(&mut doc, &en, alex);
        assert_eq!(doc.node(alex).attrs.gender, Gender::Female);
        assert_eq!(doc.node(alex).attrs.person, Person::Third);
    }

    #[test]
    fn test_animacy_from_named_entity() {
        let mut doc = Document::new("t");
        let root = load_tree(&mut doc, "(ROOT (S (NP (NNP Microsoft)) (VP (VBD grew))))").unwrap();
        let en = Language::english();
        let ne = doc.add_named_entity(root, Span::new(0, 0), "ORGANIZATION").unwrap();
        characterize(&mut doc, &en, ne);
        assert_eq!(doc.node(ne).attrs.animacy, Animacy::Inanimate);
        assert_eq!(doc.node(ne).attrs.mention_type, Some(MentionType::Proper));
    }
}
