//! Discount and lowest-price derivation for storefront listings.
//!
//! A listing without usable prices is [`PriceDisplay::Unavailable`] ("N/A" to the
//! reader) rather than an all-zero record, so "no data" is never reported as the
//! lowest price.

use serde::Serialize;

use crate::catalog::{
    GameCatalogPreviewResponse, GameCatalogResponse, GameDrm, GameResponse, GameStore,
};

/// Regular, current and all-time lowest price of one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceInfo {
    pub regular: i64,
    pub current: i64,
    pub lowest: i64,
}

/// Display flags derived from a [`PriceInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub initial_price: i64,
    pub final_price: i64,
    pub lowest_price: i64,
    pub is_discounted: bool,
    /// Rounded percentage off the regular price; only set for discounted listings
    /// with a positive regular price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<i64>,
    pub is_lowest: bool,
}

impl PriceInfo {
    pub fn new(regular: i64, current: i64, lowest: i64) -> Self {
        Self {
            regular,
            current,
            lowest,
        }
    }

    /// Build from nullable listing prices. Needs both regular and current; a
    /// missing lowest falls back to the current price.
    pub fn from_parts(regular: Option<i64>, current: Option<i64>, lowest: Option<i64>) -> Option<Self> {
        let (regular, current) = (regular?, current?);
        Some(Self::new(regular, current, lowest.unwrap_or(current)))
    }

    pub fn is_discounted(&self) -> bool {
        self.current < self.regular
    }

    pub fn is_lowest(&self) -> bool {
        self.current == self.lowest
    }

    pub fn discount_percent(&self) -> Option<i64> {
        if self.regular <= 0 || !self.is_discounted() {
            return None;
        }
        let off = (self.regular - self.current) as f64 / self.regular as f64 * 100.0;
        Some(off.round() as i64)
    }

    pub fn summarize(&self) -> PriceSummary {
        PriceSummary {
            initial_price: self.regular,
            final_price: self.current,
            lowest_price: self.lowest,
            is_discounted: self.is_discounted(),
            discount_percent: self.discount_percent(),
            is_lowest: self.is_lowest(),
        }
    }
}

/// What a storefront link shows: a derived summary, or nothing to derive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PriceDisplay {
    Unavailable,
    Listed(PriceSummary),
}

impl PriceDisplay {
    pub fn from_price(price: Option<PriceInfo>) -> Self {
        match price {
            Some(info) => PriceDisplay::Listed(info.summarize()),
            None => PriceDisplay::Unavailable,
        }
    }
}

impl GameCatalogResponse {
    pub fn price_info(&self) -> Option<PriceInfo> {
        PriceInfo::from_parts(self.regular_price, self.current_price, self.lowest_price)
    }
}

impl GameCatalogPreviewResponse {
    pub fn price_info(&self) -> Option<PriceInfo> {
        PriceInfo::from_parts(self.regular_price, self.current_price, self.lowest_price)
    }
}

/// One storefront link on the game page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePrice {
    pub catalog_id: i64,
    pub store: GameStore,
    pub drm: GameDrm,
    pub url: String,
    pub price: PriceDisplay,
}

/// Storefront links of a game, in listing order.
pub fn store_prices(game: &GameResponse) -> Vec<StorePrice> {
    game.game_catalog
        .iter()
        .map(|entry| StorePrice {
            catalog_id: entry.id,
            store: entry.store,
            drm: entry.drm,
            url: entry.url.clone(),
            price: PriceDisplay::from_price(entry.price_info()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discounted_listing_at_lowest_price() {
        let summary = PriceInfo::new(10_000, 8_000, 8_000).summarize();
        assert!(summary.is_discounted);
        assert_eq!(summary.discount_percent, Some(20));
        assert!(summary.is_lowest);
        assert_eq!(summary.initial_price, 10_000);
        assert_eq!(summary.final_price, 8_000);
    }

    #[test]
    fn full_price_listing_above_lowest() {
        let info = PriceInfo::new(64_800, 64_800, 38_880);
        assert!(!info.is_discounted());
        assert_eq!(info.discount_percent(), None);
        assert!(!info.is_lowest());
    }

    #[test]
    fn discount_percent_rounds_half_up() {
        // 12.5% off
        assert_eq!(PriceInfo::new(8_000, 7_000, 7_000).discount_percent(), Some(13));
        // 33.33% off
        assert_eq!(PriceInfo::new(30_000, 20_000, 20_000).discount_percent(), Some(33));
        // 66.67% off
        assert_eq!(PriceInfo::new(3, 1, 1).discount_percent(), Some(67));
    }

    #[test]
    fn discount_flags_follow_current_vs_regular_for_many_prices() {
        for regular in [1_i64, 990, 10_000, 64_800] {
            for current in [0_i64, 1, 500, 990, 10_000, 70_000] {
                let info = PriceInfo::new(regular, current, current);
                assert_eq!(info.is_discounted(), current < regular, "{regular}/{current}");
                let expected = ((regular - current) as f64 / regular as f64 * 100.0).round() as i64;
                match info.discount_percent() {
                    Some(p) => assert_eq!(p, expected),
                    None => assert!(current >= regular),
                }
                assert!(info.is_lowest());
            }
        }
    }

    #[test]
    fn zero_regular_price_never_yields_a_percentage() {
        let info = PriceInfo::new(0, 0, 0);
        assert!(!info.is_discounted());
        assert_eq!(info.discount_percent(), None);
    }

    #[test]
    fn missing_prices_are_unavailable() {
        assert_eq!(PriceInfo::from_parts(None, None, None), None);
        assert_eq!(PriceInfo::from_parts(Some(1_000), None, Some(500)), None);
        assert_eq!(PriceDisplay::from_price(None), PriceDisplay::Unavailable);
    }

    #[test]
    fn missing_lowest_falls_back_to_current() {
        let info = PriceInfo::from_parts(Some(10_000), Some(9_000), None).unwrap();
        assert_eq!(info.lowest, 9_000);
        assert!(info.is_lowest());
    }

    #[test]
    fn display_serializes_with_status_tag() {
        let listed = PriceDisplay::from_price(Some(PriceInfo::new(10_000, 8_000, 8_000)));
        assert_eq!(
            serde_json::to_value(listed).unwrap(),
            json!({
                "status": "listed",
                "initialPrice": 10000,
                "finalPrice": 8000,
                "lowestPrice": 8000,
                "isDiscounted": true,
                "discountPercent": 20,
                "isLowest": true
            })
        );
        assert_eq!(
            serde_json::to_value(PriceDisplay::Unavailable).unwrap(),
            json!({"status": "unavailable"})
        );
    }
}
