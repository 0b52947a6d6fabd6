use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

/// Price record kind.
///
/// Resolution prefers, in order: sale, wholesale, retail, regular. The
/// order is a deliberate business priority, not an artifact of sorting the
/// type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Regular,
    Retail,
    Wholesale,
    Sale,
}

text_enum!(PriceType, UnknownPriceType, "price type", {
    Regular => "regular",
    Retail => "retail",
    Wholesale => "wholesale",
    Sale => "sale",
});

impl PriceType {
    /// Resolution priority; higher wins when several records are in-window.
    pub fn priority(&self) -> u8 {
        match self {
            PriceType::Sale => 3,
            PriceType::Wholesale => 2,
            PriceType::Retail => 1,
            PriceType::Regular => 0,
        }
    }
}

/// A single, immutable pricing row. Upserts never modify an existing row;
/// superseded records stay behind with `is_active = false` as history.
///
/// At most one record per (product_id, price_type) is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub base_price: Decimal,
    pub currency: String,
    pub cost_price: Option<Decimal>,
    /// Advisory only; never recomputed from base/cost price here.
    pub margin_percent: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub price_type: PriceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Whether this record's validity window contains `as_of`.
    ///
    /// Exactly three shapes qualify: a closed window containing `as_of`,
    /// no bounds at all, or an open-ended window that has started. A record
    /// with only `valid_to` set never qualifies.
    pub fn window_contains(&self, as_of: DateTime<Utc>) -> bool {
        match (self.valid_from, self.valid_to) {
            (Some(from), Some(to)) => from <= as_of && to >= as_of,
            (None, None) => true,
            (Some(from), None) => from <= as_of,
            (None, Some(_)) => false,
        }
    }
}

/// Pick the applicable price among `records` at `as_of`: active, in-window,
/// highest price-type priority. Ties inside one price type cannot happen
/// while the single-active invariant holds, but if they ever did the newest
/// record wins, keeping resolution deterministic.
pub fn pick_current(records: Vec<PriceRecord>, as_of: DateTime<Utc>) -> Option<PriceRecord> {
    records
        .into_iter()
        .filter(|r| r.is_active && r.window_contains(as_of))
        .max_by_key(|r| (r.price_type.priority(), r.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn record(
        price_type: PriceType,
        valid_from: Option<DateTime<Utc>>,
        valid_to: Option<DateTime<Utc>>,
        is_active: bool,
    ) -> PriceRecord {
        PriceRecord {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            base_price: Decimal::new(100_000, 2),
            currency: "CZK".to_string(),
            cost_price: None,
            margin_percent: None,
            sale_price: None,
            valid_from,
            valid_to,
            is_active,
            price_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_known_price_types_and_rejects_unknown() {
        assert_eq!("regular".parse::<PriceType>().unwrap(), PriceType::Regular);
        assert_eq!("sale".parse::<PriceType>().unwrap(), PriceType::Sale);
        assert_eq!("wholesale".parse::<PriceType>().unwrap(), PriceType::Wholesale);
        assert_eq!("retail".parse::<PriceType>().unwrap(), PriceType::Retail);
        assert!("discount".parse::<PriceType>().is_err());
        assert!("Sale".parse::<PriceType>().is_err());
    }

    #[test]
    fn sale_outranks_every_other_type() {
        assert!(PriceType::Sale.priority() > PriceType::Wholesale.priority());
        assert!(PriceType::Wholesale.priority() > PriceType::Retail.priority());
        assert!(PriceType::Retail.priority() > PriceType::Regular.priority());
    }

    #[test]
    fn window_shapes() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        // (a) closed window containing as_of
        assert!(record(PriceType::Regular, Some(now - hour), Some(now + hour), true)
            .window_contains(now));
        // (b) no bounds: always valid
        assert!(record(PriceType::Regular, None, None, true).window_contains(now));
        // (c) open-ended, started
        assert!(record(PriceType::Regular, Some(now - hour), None, true).window_contains(now));

        // closed window in the past / future
        assert!(!record(PriceType::Regular, Some(now - hour - hour), Some(now - hour), true)
            .window_contains(now));
        assert!(!record(PriceType::Regular, Some(now + hour), Some(now + hour + hour), true)
            .window_contains(now));
        // not yet started
        assert!(!record(PriceType::Regular, Some(now + hour), None, true).window_contains(now));
        // only an end bound never qualifies
        assert!(!record(PriceType::Regular, None, Some(now + hour), true).window_contains(now));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let r = record(PriceType::Regular, Some(now), Some(now), true);
        assert!(r.window_contains(now));
    }

    #[test]
    fn resolution_returns_none_without_candidates() {
        let now = Utc::now();
        let expired = record(
            PriceType::Sale,
            Some(now - Duration::hours(2)),
            Some(now - Duration::hours(1)),
            true,
        );
        let inactive = record(PriceType::Regular, None, None, false);
        assert!(pick_current(vec![expired, inactive], now).is_none());
        assert!(pick_current(vec![], now).is_none());
    }

    #[test]
    fn resolution_returns_sole_candidate() {
        let now = Utc::now();
        let regular = record(PriceType::Regular, None, None, true);
        let picked = pick_current(vec![regular.clone()], now).unwrap();
        assert_eq!(picked.id, regular.id);
    }

    #[test]
    fn sale_price_wins_over_open_ended_regular() {
        // Record A: regular, unbounded; record B: sale, in a 2h window.
        let now = Utc::now();
        let regular = record(PriceType::Regular, None, None, true);
        let sale = record(
            PriceType::Sale,
            Some(now - Duration::hours(1)),
            Some(now + Duration::hours(1)),
            true,
        );

        let picked = pick_current(vec![regular.clone(), sale.clone()], now).unwrap();
        assert_eq!(picked.id, sale.id);

        // Once the sale window lapses the regular price applies again.
        let later = now + Duration::hours(2);
        let picked = pick_current(vec![regular.clone(), sale], later).unwrap();
        assert_eq!(picked.id, regular.id);
    }

    #[test]
    fn wholesale_beats_retail_and_regular() {
        let now = Utc::now();
        let regular = record(PriceType::Regular, None, None, true);
        let retail = record(PriceType::Retail, None, None, true);
        let wholesale = record(PriceType::Wholesale, None, None, true);

        let picked = pick_current(vec![regular, retail, wholesale.clone()], now).unwrap();
        assert_eq!(picked.id, wholesale.id);
    }
}
