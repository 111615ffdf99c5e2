//! Rule registry
//!
//! Maps short names used in configuration to rule factories. The registry is
//! built once at startup and shared read-only; per-document processors are
//! built from it on demand.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use coref_core::{CorefError, Language, PipelineConfig, Result, RuleKind};
use coref_extractor::catchers::{ConstituentCatcher, GoldCatcher, NamedEntitiesCatcher, PronounCatcher};
use coref_extractor::filters::{InterjectionFilter, PleonasticFilter, SameHeadFilter};
use coref_extractor::{CandidateExtractor, Catcher, Diagnostics, Filter, Stage, Traversal, TraversalStrategy};

use crate::coreference::CoreferenceProcessor;
use crate::processor::MultiSieveProcessor;
use crate::purges::{InvalidPurge, NumericPurge, PleonasticPurge, Purge, PurgeStage, SingletonPurge};
use crate::sieves::{ExactStringMatch, PronounMatch, RelaxedStringMatch, Sieve, StrictHeadMatch};

/// Factory producing a fresh rule instance
pub type Factory<T> = Box<dyn Fn() -> Box<T> + Send + Sync>;

// ============================================================================
// Registry
// ============================================================================

/// Registry of available rules, one table per rule family
#[derive(Default)]
pub struct Registry {
    catchers: BTreeMap<String, Factory<dyn Catcher>>,
    filters: BTreeMap<String, Factory<dyn Filter>>,
    sieves: BTreeMap<String, Factory<dyn Sieve>>,
    purges: BTreeMap<String, Factory<dyn Purge>>,
    strategies: BTreeMap<String, Factory<dyn TraversalStrategy>>,
}

fn build<T: ?Sized>(table: &BTreeMap<String, Factory<T>>, kind: RuleKind, name: &str) -> Result<Box<T>> {
    table
        .get(name)
        .map(|factory| factory())
        .ok_or_else(|| CorefError::UnknownRule {
            kind,
            name: name.to_string(),
        })
}

fn build_all<T: ?Sized>(table: &BTreeMap<String, Factory<T>>, kind: RuleKind, names: &[String]) -> Result<Vec<Box<T>>> {
    names.iter().map(|name| build(table, kind, name)).collect()
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in rule
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_catcher("ConstituentCatcher", || Box::new(ConstituentCatcher::new()));
        registry.register_catcher("PermissiveConstituentCatcher", || Box::new(ConstituentCatcher::permissive()));
        registry.register_catcher("NamedEntitiesCatcher", || Box::new(NamedEntitiesCatcher));
        registry.register_catcher("PronounCatcher", || Box::new(PronounCatcher::new()));
        registry.register_catcher("PermissivePronounCatcher", || Box::new(PronounCatcher::permissive()));
        registry.register_catcher("GoldCatcher", || Box::new(GoldCatcher::new()));
        registry.register_catcher("GoldNSCatcher", || Box::new(GoldCatcher::non_singleton()));

        registry.register_filter("InterjectionFilter", || Box::new(InterjectionFilter));
        registry.register_filter("SameHeadFilter", || Box::new(SameHeadFilter::new()));
        registry.register_filter("ConllSameHeadFilter", || Box::new(SameHeadFilter::conll()));
        registry.register_filter("PleonasticFilter", || Box::new(PleonasticFilter));

        registry.register_strategy("breadth_first", || Box::new(Traversal::breadth_first()));
        registry.register_strategy("breadth_first_preference", || Box::new(Traversal::breadth_first_preference()));
        registry.register_strategy("breadth_first_subordinate", || Box::new(Traversal::breadth_first_subordinate()));
        registry.register_strategy("breadth_first_per_child", || Box::new(Traversal::breadth_first_per_child()));
        registry.register_strategy("breadth_first_per_child_subordinate", || {
            Box::new(Traversal::breadth_first_per_child_subordinate())
        });
        registry.register_strategy("deep_first", || Box::new(Traversal::deep_first()));
        registry.register_strategy("deep_first_subordinate", || Box::new(Traversal::deep_first_subordinate()));

        registry.register_sieve("ESM", || Box::new(ExactStringMatch::new()));
        registry.register_sieve("RSM", || Box::new(RelaxedStringMatch::new()));
        registry.register_sieve("SHM", || Box::new(StrictHeadMatch::new()));
        registry.register_sieve("PNM", || Box::new(PronounMatch::new()));
        registry.register_sieve("RPNM", || Box::new(PronounMatch::rules()));
        registry.register_sieve("FPNM", || Box::new(PronounMatch::forbid_possessives()));
        registry.register_sieve("APNM", || Box::new(PronounMatch::clause_first()));
        registry.register_sieve("AAPNM", || Box::new(PronounMatch::sentence_prefix()));

        registry.register_purge("SingletonPurge", || Box::new(SingletonPurge::default()));
        registry.register_purge("InvalidPurge", || Box::new(InvalidPurge));
        registry.register_purge("PleonasticPurge", || Box::new(PleonasticPurge));
        registry.register_purge("NumericPurge", || Box::new(NumericPurge));

        registry
    }

    pub fn register_catcher<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Catcher> + Send + Sync + 'static,
    {
        self.catchers.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_filter<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Filter> + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_sieve<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Sieve> + Send + Sync + 'static,
    {
        self.sieves.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_purge<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Purge> + Send + Sync + 'static,
    {
        self.purges.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_strategy<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn TraversalStrategy> + Send + Sync + 'static,
    {
        self.strategies.insert(name.to_string(), Box::new(factory));
    }

    pub fn catcher(&self, name: &str) -> Result<Box<dyn Catcher>> {
        build(&self.catchers, RuleKind::Catcher, name)
    }

    pub fn filter(&self, name: &str) -> Result<Box<dyn Filter>> {
        build(&self.filters, RuleKind::Filter, name)
    }

    pub fn sieve(&self, name: &str) -> Result<Box<dyn Sieve>> {
        build(&self.sieves, RuleKind::Sieve, name)
    }

    pub fn purge(&self, name: &str) -> Result<Box<dyn Purge>> {
        build(&self.purges, RuleKind::Purge, name)
    }

    pub fn strategy(&self, name: &str) -> Result<Box<dyn TraversalStrategy>> {
        build(&self.strategies, RuleKind::Strategy, name)
    }

    /// Registered names of a rule family, sorted
    pub fn names(&self, kind: RuleKind) -> Vec<&str> {
        let keys: Vec<&String> = match kind {
            RuleKind::Catcher => self.catchers.keys().collect(),
            RuleKind::Filter => self.filters.keys().collect(),
            RuleKind::Sieve => self.sieves.keys().collect(),
            RuleKind::Purge => self.purges.keys().collect(),
            RuleKind::Strategy => self.strategies.keys().collect(),
        };
        keys.into_iter().map(String::as_str).collect()
    }

    /// Resolve every configured name, failing on the first unknown one
    pub fn validate(&self, config: &PipelineConfig) -> Result<()> {
        self.strategy(&config.mention_extractor)?;
        self.strategy(&config.candidate_extractor)?;
        build_all(&self.catchers, RuleKind::Catcher, &config.mention_catchers)?;
        build_all(&self.filters, RuleKind::Filter, &config.mention_filters)?;
        build_all(&self.sieves, RuleKind::Sieve, &config.sieves)?;
        build_all(&self.purges, RuleKind::Purge, &config.mention_purges)?;
        info!(
            sieves = ?config.sieves,
            catchers = ?config.mention_catchers,
            filters = ?config.mention_filters,
            purges = ?config.mention_purges,
            "Pipeline configuration validated"
        );
        Ok(())
    }

    /// Build a fresh processor for one document
    pub fn processor(&self, config: &PipelineConfig, language: Arc<Language>) -> Result<CoreferenceProcessor> {
        let mut extractor = CandidateExtractor::new(
            language.clone(),
            self.strategy(&config.mention_extractor)?,
            self.strategy(&config.candidate_extractor)?,
        )
        .with_catchers(build_all(&self.catchers, RuleKind::Catcher, &config.mention_catchers)?)
        .with_filters(build_all(&self.filters, RuleKind::Filter, &config.mention_filters)?)
        .with_soft_filters(config.soft_filters)
        .with_gold_boundaries(config.gold_boundaries);

        if config.meta_info {
            let diagnostics = Diagnostics::new()
                .with_rules(Stage::Catch, &config.mention_catchers)
                .with_rules(Stage::Filter, &config.mention_filters)
                .with_rules(Stage::Purge, &config.mention_purges);
            extractor = extractor.with_diagnostics(diagnostics);
        }

        let sieves = MultiSieveProcessor::new(build_all(&self.sieves, RuleKind::Sieve, &config.sieves)?);
        let purges = PurgeStage::new(
            build_all(&self.purges, RuleKind::Purge, &config.mention_purges)?,
            config.soft_purges,
        );
        Ok(CoreferenceProcessor::new(language, extractor, sieves, purges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_builtin() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.names(RuleKind::Catcher).len(), 7);
        assert_eq!(registry.names(RuleKind::Filter).len(), 4);
        assert_eq!(registry.names(RuleKind::Strategy).len(), 7);
        assert_eq!(
            registry.names(RuleKind::Sieve),
            vec!["AAPNM", "APNM", "ESM", "FPNM", "PNM", "RPNM", "RSM", "SHM"]
        );
        assert_eq!(registry.names(RuleKind::Purge).len(), 4);
    }

    #[test]
    fn test_factories_build_named_rules() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.sieve("FPNM").unwrap().name(), "FPNM");
        assert_eq!(registry.catcher("GoldNSCatcher").unwrap().name(), "GoldNSCatcher");
        assert!(!registry.catcher("GoldCatcher").unwrap().unique());
        assert_eq!(registry.filter("ConllSameHeadFilter").unwrap().name(), "ConllSameHeadFilter");
        assert_eq!(registry.strategy("deep_first_subordinate").unwrap().name(), "deep_first_subordinate");
    }

    #[test]
    fn test_unknown_name_fails_validation() {
        let registry = Registry::with_defaults();
        let config = PipelineConfig {
            sieves: vec!["ESM".to_string(), "XYZ".to_string()],
            ..Default::default()
        };
        match registry.validate(&config) {
            Err(CorefError::UnknownRule { kind, name }) => {
                assert_eq!(kind, RuleKind::Sieve);
                assert_eq!(name, "XYZ");
            }
            other => panic!("expected unknown rule, got {other:?}"),
        }
        assert!(registry.processor(&config, Arc::new(Language::english())).is_err());
    }

    #[test]
    fn test_default_config_validates() {
        let registry = Registry::with_defaults();
        assert!(registry.validate(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_register_extends_registry() {
        let mut registry = Registry::new();
        assert!(registry.purge("SingletonPurge").is_err());
        registry.register_purge("SingletonPurge", || Box::new(SingletonPurge::new(3)));
        assert_eq!(registry.purge("SingletonPurge").unwrap().name(), "SingletonPurge");
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
