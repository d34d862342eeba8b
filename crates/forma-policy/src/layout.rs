//! Layout selection.
//!
//! Picks the single best active layout for a screen context. Candidates are
//! ranked into tiers, most specific first:
//! 1. entity kind and category both set and both match
//! 2. entity kind matches, category unset
//! 3. entity category matches, kind unset
//! 4. unfiltered layout marked default
//! 5. any other active layout for the screen type
//!
//! Within a tier a default layout beats a non-default one, then the lowest
//! id wins. Finding nothing is a normal outcome: the caller renders its
//! standard field set.

use forma_core::config::{FormLayout, ScreenType};
use forma_core::resolved::{ConfigurationAmbiguity, MatchTier};

/// A selected layout and how it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSelection<'a> {
    pub layout: &'a FormLayout,
    pub tier: MatchTier,
    /// Set when several layouts were equally good at the winning tier.
    pub ambiguity: Option<ConfigurationAmbiguity>,
}

/// Selects a layout from a tenant's candidate set.
pub struct LayoutSelector<'a> {
    candidates: &'a [FormLayout],
}

impl<'a> LayoutSelector<'a> {
    pub fn new(candidates: &'a [FormLayout]) -> Self {
        Self { candidates }
    }

    /// Tier a candidate falls into for the requested filters.
    pub fn tier(
        layout: &FormLayout,
        entity_kind: Option<&str>,
        entity_category: Option<&str>,
    ) -> MatchTier {
        let kind = layout.entity_kind.as_deref();
        let category = layout.entity_category.as_deref();
        match (kind, category) {
            (Some(k), Some(c)) if Some(k) == entity_kind && Some(c) == entity_category => {
                MatchTier::KindAndCategory
            }
            (Some(k), None) if Some(k) == entity_kind => MatchTier::KindOnly,
            (None, Some(c)) if Some(c) == entity_category => MatchTier::CategoryOnly,
            (None, None) if layout.is_default => MatchTier::Default,
            _ => MatchTier::Fallback,
        }
    }

    /// Select the best layout, or `None` when no active layout targets the
    /// screen type.
    pub fn select(
        &self,
        screen_type: ScreenType,
        entity_kind: Option<&str>,
        entity_category: Option<&str>,
    ) -> Option<LayoutSelection<'a>> {
        let mut ranked: Vec<(MatchTier, bool, &'a FormLayout)> = self
            .candidates
            .iter()
            .filter(|l| l.is_active && l.screen_type == screen_type)
            .map(|l| (Self::tier(l, entity_kind, entity_category), !l.is_default, l))
            .collect();

        if ranked.is_empty() {
            tracing::debug!(
                screen_type = %screen_type,
                "No active layout configured for screen type"
            );
            return None;
        }

        // Stable sort keeps snapshot order for duplicate ids.
        ranked.sort_by(|a, b| (a.0, a.1, &a.2.id).cmp(&(b.0, b.1, &b.2.id)));

        let (tier, not_default, chosen) = ranked[0];
        let others: Vec<String> = ranked[1..]
            .iter()
            .take_while(|(t, nd, _)| *t == tier && *nd == not_default)
            .map(|(_, _, l)| l.id.clone())
            .collect();

        let ambiguity = if others.is_empty() || tier == MatchTier::Fallback {
            None
        } else {
            tracing::warn!(
                screen_type = %screen_type,
                tier = ?tier,
                chosen = %chosen.id,
                others = ?others,
                "Configuration ambiguity: several layouts match equally, using the lowest id"
            );
            Some(ConfigurationAmbiguity::LayoutTie {
                tier,
                chosen: chosen.id.clone(),
                others,
            })
        };

        tracing::debug!(
            screen_type = %screen_type,
            layout_id = %chosen.id,
            tier = ?tier,
            "Selected form layout"
        );

        Some(LayoutSelection {
            layout: chosen,
            tier,
            ambiguity,
        })
    }
}
