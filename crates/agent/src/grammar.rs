//! Deterministic, priority-ordered intent grammar.
//!
//! Rules are tried in a fixed order and the first match wins. Several rules
//! are prefix-compatible (every price-bounded search is also a generic
//! search), so the more specific ones come first:
//!
//! 1. search + price bound: `find <item> under $<n>`
//! 2. search + descriptive tag: `find organic <item>`
//! 3. search + trailing brand word: `find <item> [by] <brand>`
//! 4. generic search: `find <item>`
//! 5. add with count: `add <n> <item>`
//! 6. add: `add <item>`
//! 7. remove: `remove <item>`
//!
//! Anything else parses to [`Intent::none`].

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use smartcart_core::config::GrammarConfig;
use smartcart_core::domain::intent::{Intent, SearchFilters};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar vocabulary `{list}` must contain at least one word")]
    EmptyVocabulary { list: &'static str },
    #[error("grammar rule `{rule}` failed to compile: {source}")]
    Compile { rule: &'static str, source: regex::Error },
}

#[derive(Clone, Debug)]
pub struct IntentGrammar {
    price_search: Regex,
    tag_search: Regex,
    brand_search: Regex,
    search: Regex,
    counted_add: Regex,
    add: Regex,
    remove: Regex,
}

impl IntentGrammar {
    pub fn new(vocabulary: &GrammarConfig) -> Result<Self, GrammarError> {
        let search = alternation("search_verbs", &vocabulary.search_verbs)?;
        let bounds = alternation("price_bounds", &vocabulary.price_bounds)?;
        let tags = alternation("descriptive_tags", &vocabulary.descriptive_tags)?;
        let add = alternation("add_verbs", &vocabulary.add_verbs)?;
        let remove = alternation("remove_verbs", &vocabulary.remove_verbs)?;

        Ok(Self {
            price_search: compile(
                "price_search",
                &format!(r"^(?:{search})\s+(.+?)\s+(?:{bounds})\s+\$?(\d+(?:\.\d+)?)$"),
            )?,
            tag_search: compile("tag_search", &format!(r"^(?:{search})\s+({tags})\s+(.+)$"))?,
            brand_search: compile(
                "brand_search",
                &format!(r"^(?:{search})\s+(.+?)\s+(?:by\s+)?([a-z]+)$"),
            )?,
            search: compile("search", &format!(r"^(?:{search})\s+(.+)$"))?,
            counted_add: compile("counted_add", &format!(r"^(?:{add})\s+(\d+)\s+(.+)$"))?,
            add: compile("add", &format!(r"^(?:{add})\s+(.+)$"))?,
            remove: compile("remove", &format!(r"^(?:{remove})\s+(.+)$"))?,
        })
    }

    /// Parses one utterance. Total: unrecognised input yields [`Intent::none`].
    pub fn parse(&self, text: &str) -> Intent {
        let normalized = text.trim().to_lowercase();
        let (rule, intent) = self.match_rules(&normalized);

        debug!(
            event_name = "agent.grammar.parsed",
            rule,
            action = %intent.action,
            "utterance parsed by local grammar"
        );
        intent
    }

    fn match_rules(&self, text: &str) -> (&'static str, Intent) {
        if let Some(captures) = self.price_search.captures(text) {
            let filters = Decimal::from_str(&captures[2]).ok().map(SearchFilters::with_max_price);
            return ("price_search", Intent::search(captures[1].trim(), filters));
        }

        if let Some(captures) = self.tag_search.captures(text) {
            let tag = SearchFilters::with_tag(captures[1].split_whitespace().collect::<Vec<_>>().join(" "));
            return ("tag_search", Intent::search(captures[2].trim(), Some(tag)));
        }

        if let Some(captures) = self.brand_search.captures(text) {
            let brand = SearchFilters::with_brand(captures[2].trim());
            return ("brand_search", Intent::search(captures[1].trim(), Some(brand)));
        }

        if let Some(captures) = self.search.captures(text) {
            return ("search", Intent::search(captures[1].trim(), None));
        }

        if let Some(captures) = self.counted_add.captures(text) {
            let quantity = captures[1].parse::<u32>().ok().filter(|count| *count > 0).unwrap_or(1);
            return ("counted_add", Intent::add(captures[2].trim(), quantity));
        }

        if let Some(captures) = self.add.captures(text) {
            return ("add", Intent::add(captures[1].trim(), 1));
        }

        if let Some(captures) = self.remove.captures(text) {
            return ("remove", Intent::remove(captures[1].trim()));
        }

        ("none", Intent::none())
    }
}

/// `a|b|show\s+me` from a word list, escaped and lower-cased.
fn alternation(list: &'static str, words: &[String]) -> Result<String, GrammarError> {
    let branches = words
        .iter()
        .map(|word| {
            word.split_whitespace()
                .map(|part| regex::escape(&part.to_lowercase()))
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|branch| !branch.is_empty())
        .collect::<Vec<_>>();

    if branches.is_empty() {
        return Err(GrammarError::EmptyVocabulary { list });
    }
    Ok(branches.join("|"))
}

fn compile(rule: &'static str, pattern: &str) -> Result<Regex, GrammarError> {
    Regex::new(pattern).map_err(|source| GrammarError::Compile { rule, source })
}
