//! String match sieves

use tracing::debug;

use coref_core::NodeId;

use super::{Sieve, SieveContext, SieveOptions};

fn string_options() -> SieveOptions {
    SieveOptions {
        no_pronoun_mention: true,
        incompatible_discourse: true,
        i_within_i: true,
        ..Default::default()
    }
}

/// Two non-pronominal mentions with the same text
#[derive(Debug, Clone)]
pub struct ExactStringMatch {
    options: SieveOptions,
}

impl ExactStringMatch {
    pub fn new() -> Self {
        Self {
            options: string_options(),
        }
    }
}

impl Default for ExactStringMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Sieve for ExactStringMatch {
    fn name(&self) -> &str {
        "ESM"
    }

    fn options(&self) -> &SieveOptions {
        &self.options
    }

    fn are_coreferent(&self, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
        if ctx.is_pronoun(candidate) {
            return false;
        }
        let form = ctx.form(mention);
        let matched = !form.is_empty() && form == ctx.form(candidate);
        if matched {
            debug!(form = %form, "LINK ACCEPTED: exact string match");
        }
        matched
    }
}

/// Two non-pronominal mentions whose text up to the head word matches
///
/// Drops post-modifiers: "the president of France" matches "the president".
#[derive(Debug, Clone)]
pub struct RelaxedStringMatch {
    options: SieveOptions,
}

impl RelaxedStringMatch {
    pub fn new() -> Self {
        Self {
            options: string_options(),
        }
    }
}

impl Default for RelaxedStringMatch {
    fn default() -> Self {
        Self::new()
    }
}

fn relaxed_form(ctx: &SieveContext<'_>, mention: NodeId) -> String {
    let words = ctx.graph.words(mention);
    let head = ctx.graph.head_word(mention);
    let end = head
        .and_then(|head| words.iter().position(|w| *w == head))
        .map_or(words.len(), |index| index + 1);
    words[..end]
        .iter()
        .map(|w| ctx.graph.node(*w).form.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Sieve for RelaxedStringMatch {
    fn name(&self) -> &str {
        "RSM"
    }

    fn options(&self) -> &SieveOptions {
        &self.options
    }

    fn are_coreferent(&self, ctx: &SieveContext<'_>, mention: NodeId, candidate: NodeId) -> bool {
        if ctx.is_pronoun(candidate) {
            return false;
        }
        let relaxed = relaxed_form(ctx, mention);
        let matched = !relaxed.is_empty() && relaxed == relaxed_form(ctx, candidate);
        if matched {
            debug!(form = %relaxed, "LINK ACCEPTED: relaxed string match");
        }
        matched
    }
}
