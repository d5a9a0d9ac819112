use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smartcart_core::catalog::CatalogIndex;
use smartcart_core::domain::cart::{CartChange, CartMutator};
use smartcart_core::domain::intent::{Intent, IntentAction};
use smartcart_core::domain::product::{Product, SimilarityResult};
use smartcart_core::recommendations::{RecommendationEngine, DEFAULT_RECOMMENDATION_LIMIT};
use smartcart_core::search::SearchEngine;
use tracing::{debug, info};

use crate::resolver::{IntentOrigin, IntentResolver};

/// One speech-to-text update. Interim results arrive with `is_final = false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEvent {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: true }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: false }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Interim or blank transcript; nothing was resolved.
    Ignored,
    /// The utterance resolved to no actionable command.
    NoAction { intent: Intent, origin: IntentOrigin },
    CartUpdated {
        intent: Intent,
        origin: IntentOrigin,
        change: CartChange,
        recommendations: Vec<SimilarityResult>,
    },
    SearchCompleted {
        intent: Intent,
        origin: IntentOrigin,
        results: Vec<Product>,
        recommendations: Vec<SimilarityResult>,
    },
}

/// Drives a single voice turn from final transcript to cart or search result.
pub struct VoiceRuntime {
    resolver: IntentResolver,
    catalog: Arc<CatalogIndex>,
    search: SearchEngine,
    recommendations: RecommendationEngine,
    recommendation_limit: usize,
}

impl VoiceRuntime {
    pub fn new(
        resolver: IntentResolver,
        catalog: Arc<CatalogIndex>,
        search: SearchEngine,
        recommendations: RecommendationEngine,
    ) -> Self {
        Self {
            resolver,
            catalog,
            search,
            recommendations,
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn with_recommendation_limit(mut self, limit: usize) -> Self {
        self.recommendation_limit = limit;
        self
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub async fn handle_transcript(
        &self,
        event: &TranscriptEvent,
        cart: &mut dyn CartMutator,
    ) -> TurnOutcome {
        if !event.is_final || event.text.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let (intent, origin) = self.resolver.resolve_with_origin(&event.text).await;
        let Some(item) = intent.actionable_item().map(str::to_owned) else {
            debug!(event_name = "agent.runtime.no_action", origin = ?origin, "utterance not actionable");
            return TurnOutcome::NoAction { intent, origin };
        };

        match intent.action {
            IntentAction::Add => {
                let change = cart.add_item(&item, intent.quantity);
                let recommendations = self.recommendations.recommend_for_cart(
                    cart.items(),
                    &self.catalog,
                    self.recommendation_limit,
                );
                info!(event_name = "agent.runtime.cart_added", item = %item, quantity = intent.quantity, "item added");
                TurnOutcome::CartUpdated { intent, origin, change, recommendations }
            }
            IntentAction::Remove => {
                let change = cart.remove_item(&item);
                info!(event_name = "agent.runtime.cart_removed", item = %item, "items removed");
                TurnOutcome::CartUpdated { intent, origin, change, recommendations: Vec::new() }
            }
            IntentAction::Search => {
                let results = self.search.query(&self.catalog, Some(&item), intent.filters.as_ref());
                let recommendations = self.recommendations.recommend_for_query(
                    &item,
                    &results,
                    &self.catalog,
                    self.recommendation_limit,
                );
                info!(
                    event_name = "agent.runtime.search",
                    item = %item,
                    result_count = results.len(),
                    "search completed"
                );
                TurnOutcome::SearchCompleted { intent, origin, results, recommendations }
            }
            IntentAction::None => TurnOutcome::NoAction { intent, origin },
        }
    }
}
