//! # Daily Closing
//!
//! End-of-day cash reconciliation: what was sold, how it was paid, who gave
//! discounts and refunds, and whether the drawer matches.
//!
//! ## Reconciliation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      compute_daily_closing                              │
//! │                                                                         │
//! │  orders ──► keep created_at ∈ [00:00:00.000, 23:59:59.999] local       │
//! │                 │                                                       │
//! │                 ├──► sales_by_method  (8 known + any unknown bucket)    │
//! │                 ├──► discounts_by_user / refunds_by_user / activity     │
//! │                 └──► cash_refunds                                       │
//! │                                                                         │
//! │  expected = opening + cash sales − cash refunds                         │
//! │  counted  = Σ denomination × count                                      │
//! │  variance = counted − expected                                          │
//! │                                                                         │
//! │     |v| < 0.01  → Balanced (CUADRA)                                     │
//! │     |v| ≤ 5.00  → Minor    (MENOR)    warn, close allowed               │
//! │     otherwise   → Review   (REVISAR)  close needs confirmation          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closing State
//! ```text
//! Open (computed, not persisted) ──close()──► Closed { closed_at, closed_by }
//! ```
//! A closed record is never mutated. Closing the same date again means
//! computing a fresh `DailyClosing`; the data store upserts it by date.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::Order;
use crate::types::{PaymentMethod, User};

/// Key used for orders that carry no operator.
pub const UNASSIGNED_USER_ID: &str = "unassigned";

const FALLBACK_USER_NAME: &str = "Usuario";
const DEFAULT_DISCOUNT_REASON: &str = "Descuento manual";
const DEFAULT_REFUND_REASON: &str = "Sin especificar";

/// Below one cent the drawer balances.
const BALANCED_LIMIT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// Up to five Balboas the variance is minor.
const MINOR_LIMIT: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

// =============================================================================
// Cash Count
// =============================================================================

/// Coins and bills in the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Denomination {
    Cent1,
    Cent5,
    Cent10,
    Cent25,
    Cent50,
    Coin1,
    Bill1,
    Bill5,
    Bill10,
    Bill20,
    Bill50,
    Bill100,
}

impl Denomination {
    pub const COINS: [Denomination; 6] = [
        Denomination::Cent1,
        Denomination::Cent5,
        Denomination::Cent10,
        Denomination::Cent25,
        Denomination::Cent50,
        Denomination::Coin1,
    ];

    pub const BILLS: [Denomination; 6] = [
        Denomination::Bill1,
        Denomination::Bill5,
        Denomination::Bill10,
        Denomination::Bill20,
        Denomination::Bill50,
        Denomination::Bill100,
    ];

    pub fn value(&self) -> Money {
        match self {
            Denomination::Cent1 => Money::from_cents(1),
            Denomination::Cent5 => Money::from_cents(5),
            Denomination::Cent10 => Money::from_cents(10),
            Denomination::Cent25 => Money::from_cents(25),
            Denomination::Cent50 => Money::from_cents(50),
            Denomination::Coin1 | Denomination::Bill1 => Money::from_units(1),
            Denomination::Bill5 => Money::from_units(5),
            Denomination::Bill10 => Money::from_units(10),
            Denomination::Bill20 => Money::from_units(20),
            Denomination::Bill50 => Money::from_units(50),
            Denomination::Bill100 => Money::from_units(100),
        }
    }

    pub fn is_coin(&self) -> bool {
        Self::COINS.contains(self)
    }
}

/// The physical count entered by the cashier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashCount {
    #[serde(default)]
    #[ts(type = "Record<string, number>")]
    pub counts: BTreeMap<Denomination, u32>,
}

impl CashCount {
    pub fn new() -> Self {
        CashCount::default()
    }

    /// Builder form of [`CashCount::set`].
    pub fn with(mut self, denomination: Denomination, count: u32) -> Self {
        self.set(denomination, count);
        self
    }

    /// Sets the count for one denomination; 0 removes it.
    pub fn set(&mut self, denomination: Denomination, count: u32) {
        if count == 0 {
            self.counts.remove(&denomination);
        } else {
            self.counts.insert(denomination, count);
        }
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    /// Σ denomination × count.
    pub fn total(&self) -> Money {
        self.counts
            .iter()
            .map(|(denomination, &count)| denomination.value() * count)
            .sum()
    }

    pub fn coins_total(&self) -> Money {
        self.counts
            .iter()
            .filter(|(d, _)| d.is_coin())
            .map(|(d, &count)| d.value() * count)
            .sum()
    }

    pub fn bills_total(&self) -> Money {
        self.total() - self.coins_total()
    }
}

// =============================================================================
// Variance
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VarianceStatus {
    Balanced,
    Minor,
    Review,
}

impl VarianceStatus {
    pub fn classify(variance: Money) -> Self {
        let magnitude = variance.amount().abs();
        if magnitude < BALANCED_LIMIT {
            VarianceStatus::Balanced
        } else if magnitude <= MINOR_LIMIT {
            VarianceStatus::Minor
        } else {
            VarianceStatus::Review
        }
    }

    /// Word printed next to the difference on the closing report.
    pub fn label(&self) -> &'static str {
        match self {
            VarianceStatus::Balanced => "CUADRA",
            VarianceStatus::Minor => "MENOR",
            VarianceStatus::Review => "REVISAR",
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, VarianceStatus::Review)
    }
}

// =============================================================================
// Per-User Attribution
// =============================================================================

/// One discounted or refunded order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttributionDetail {
    pub order_number: u64,
    pub amount: Money,
    pub reason: String,
}

/// Discounts (or refunds) given by one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserAttribution {
    pub user_id: String,
    pub user_name: String,
    pub total: Money,
    pub count: u32,
    pub details: Vec<AttributionDetail>,
}

impl UserAttribution {
    fn new(user_id: &str, user_name: &str) -> Self {
        UserAttribution {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            total: Money::zero(),
            count: 0,
            details: Vec::new(),
        }
    }

    fn push(&mut self, order_number: u64, amount: Money, reason: String) {
        self.total += amount;
        self.count += 1;
        self.details.push(AttributionDetail {
            order_number,
            amount,
            reason,
        });
    }
}

/// Everything one operator rang up during the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserActivity {
    pub user_id: String,
    pub user_name: String,
    pub orders: u32,
    pub sales: Money,
    pub discounts: Money,
    pub refunds: Money,
}

/// Keeps per-user entries in first-seen order so output is stable.
struct UserLedger<T> {
    index: BTreeMap<String, usize>,
    entries: Vec<T>,
}

impl<T> UserLedger<T> {
    fn new() -> Self {
        UserLedger {
            index: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, user_id: &str, create: impl FnOnce() -> T) -> &mut T {
        let position = match self.index.get(user_id) {
            Some(&position) => position,
            None => {
                self.entries.push(create());
                self.index.insert(user_id.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }

    fn into_entries(self) -> Vec<T> {
        self.entries
    }
}

// =============================================================================
// Daily Closing Report
// =============================================================================

/// The computed figures for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClosingReport {
    pub date: NaiveDate,

    pub order_count: u32,

    /// Every known method (zero when unused) plus any unknown method seen.
    pub sales_by_method: BTreeMap<PaymentMethod, Money>,

    pub total_sales: Money,
    pub total_discounts: Money,
    pub total_refunds: Money,
    pub net_sales: Money,

    pub opening_balance: Money,
    pub cash_sales: Money,
    pub cash_refunds: Money,
    pub expected_cash: Money,
    pub counted_cash: Money,
    pub variance: Money,
    pub variance_status: VarianceStatus,

    pub discounts_by_user: Vec<UserAttribution>,
    pub refunds_by_user: Vec<UserAttribution>,
    pub activity_by_user: Vec<UserActivity>,

    /// Raw payment-method values outside the known set, for follow-up.
    #[serde(default)]
    pub unknown_methods: Vec<String>,
}

/// First and last instant (`00:00:00.000`, `23:59:59.999`) of `date` in
/// the store's local offset, as UTC.
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(chrono::NaiveTime::MIN);
    let start = offset
        .from_local_datetime(&local_midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local_midnight));
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Computes the reconciliation report for `date`.
///
/// Pure: identical inputs always give an identical report, whatever order
/// the orders arrive in.
pub fn compute_daily_closing(
    orders: &[Order],
    date: NaiveDate,
    utc_offset: FixedOffset,
    opening_balance: Money,
    cash_count: &CashCount,
    users: &[User],
) -> DailyClosingReport {
    let (start, end) = day_bounds(date, utc_offset);
    let next_day = end + Duration::milliseconds(1);

    let mut day_orders: Vec<&Order> = orders
        .iter()
        .filter(|o| o.created_at >= start && o.created_at < next_day)
        .collect();
    day_orders.sort_by(|a, b| {
        (a.created_at, a.order_number, &a.id).cmp(&(b.created_at, b.order_number, &b.id))
    });

    let mut sales_by_method: BTreeMap<PaymentMethod, Money> = PaymentMethod::known()
        .into_iter()
        .map(|method| (method, Money::zero()))
        .collect();
    let mut unknown_methods: Vec<String> = Vec::new();

    let mut discounts = UserLedger::new();
    let mut refunds = UserLedger::new();
    let mut activity = UserLedger::new();
    let mut cash_refunds = Money::zero();

    for order in &day_orders {
        let method = &order.payment.method;
        if !method.is_known() && !unknown_methods.iter().any(|m| m == method.as_str()) {
            unknown_methods.push(method.as_str().to_string());
        }
        *sales_by_method.entry(method.clone()).or_default() += order.total;

        let user_id = order.user_id.as_deref().unwrap_or(UNASSIGNED_USER_ID);
        let user_name = resolve_user_name(order, user_id, users);

        let user = activity.entry(user_id, || UserActivity {
            user_id: user_id.to_string(),
            user_name: user_name.clone(),
            orders: 0,
            sales: Money::zero(),
            discounts: Money::zero(),
            refunds: Money::zero(),
        });
        user.orders += 1;
        user.sales += order.total;

        if order.discount_amount.is_positive() {
            user.discounts += order.discount_amount;
            let reason = order
                .discount_reason
                .clone()
                .unwrap_or_else(|| DEFAULT_DISCOUNT_REASON.to_string());
            discounts
                .entry(user_id, || UserAttribution::new(user_id, &user_name))
                .push(order.order_number, order.discount_amount, reason);
        }

        if let Some(refund_amount) = order.refund_amount() {
            user.refunds += refund_amount;
            let reason = order
                .refund
                .as_ref()
                .and_then(|r| r.reason.clone())
                .unwrap_or_else(|| DEFAULT_REFUND_REASON.to_string());
            refunds
                .entry(user_id, || UserAttribution::new(user_id, &user_name))
                .push(order.order_number, refund_amount, reason);
            if *method == PaymentMethod::Cash {
                cash_refunds += refund_amount;
            }
        }
    }

    let discounts_by_user = discounts.into_entries();
    let refunds_by_user = refunds.into_entries();

    let total_sales: Money = sales_by_method.values().sum();
    let total_discounts: Money = discounts_by_user.iter().map(|u| u.total).sum();
    let total_refunds: Money = refunds_by_user.iter().map(|u| u.total).sum();
    let cash_sales = sales_by_method
        .get(&PaymentMethod::Cash)
        .copied()
        .unwrap_or_default();
    let expected_cash = opening_balance + cash_sales - cash_refunds;
    let counted_cash = cash_count.total();
    let variance = counted_cash - expected_cash;

    DailyClosingReport {
        date,
        order_count: day_orders.len() as u32,
        sales_by_method,
        total_sales,
        total_discounts,
        total_refunds,
        net_sales: total_sales - total_refunds,
        opening_balance,
        cash_sales,
        cash_refunds,
        expected_cash,
        counted_cash,
        variance,
        variance_status: VarianceStatus::classify(variance),
        discounts_by_user,
        refunds_by_user,
        activity_by_user: activity.into_entries(),
        unknown_methods,
    }
}

fn resolve_user_name(order: &Order, user_id: &str, users: &[User]) -> String {
    order
        .user_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            users
                .iter()
                .find(|u| u.id == user_id)
                .map(|u| u.name.clone())
        })
        .unwrap_or_else(|| FALLBACK_USER_NAME.to_string())
}

// =============================================================================
// Daily Closing Record
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClosingState {
    Open,
    Closed {
        closed_at: DateTime<Utc>,
        closed_by: String,
    },
}

/// One day's closing: the computed report plus what the cashier entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClosing {
    pub report: DailyClosingReport,
    pub cash_count: CashCount,
    #[serde(default)]
    pub notes: Option<String>,
    pub state: ClosingState,
}

impl DailyClosing {
    pub fn open(report: DailyClosingReport, cash_count: CashCount, notes: Option<String>) -> Self {
        DailyClosing {
            report,
            cash_count,
            notes: notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            state: ClosingState::Open,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.report.date
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ClosingState::Closed { .. })
    }

    /// Closes the day.
    ///
    /// ## Errors
    /// - `ClosingAlreadyClosed` for a record that is already closed
    /// - `VarianceConfirmationRequired` for a `Review` variance when the
    ///   operator has not confirmed it
    pub fn close(
        &mut self,
        closed_by: &str,
        closed_at: DateTime<Utc>,
        variance_confirmed: bool,
    ) -> CoreResult<()> {
        if self.is_closed() {
            return Err(CoreError::ClosingAlreadyClosed {
                date: self.date().to_string(),
            });
        }
        if self.report.variance_status.requires_confirmation() && !variance_confirmed {
            return Err(CoreError::VarianceConfirmationRequired {
                variance: self.report.variance.to_string(),
            });
        }
        self.state = ClosingState::Closed {
            closed_at,
            closed_by: closed_by.to_string(),
        };
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
