//! # Domain Types
//!
//! Catalog, customer, operator, payment and settings types shared by the
//! ticket calculator and the reconciliation engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  pricing_mode   │   │  name, phone    │   │  method         │       │
//! │  │  price          │   │  cédula / RUC   │   │  amount         │       │
//! │  │  express_price  │   │  address        │   │  tendered/change│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ServiceSettings │   │  PaymentMethod  │   │   StoreInfo     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  tax_rate       │   │  cash, card,    │   │  receipt header │       │
//! │  │  lead times     │   │  yappy, ach ... │   │  name, RUC-DV   │       │
//! │  └─────────────────┘   │  Other(String)  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};

// =============================================================================
// Catalog
// =============================================================================

/// How a product is charged at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PricingMode {
    /// Flat price per piece (shirts, comforters, delivery).
    Quantity,
    /// Price per kilogram, entered bag by bag.
    Weight,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Quantity => write!(f, "quantity"),
            PricingMode::Weight => write!(f, "weight"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A service or item in the catalog.
///
/// Prices are tax-exclusive. Tax is added once, on the ticket, never per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown on the tile and on the receipt.
    pub name: String,

    /// Catalog section (Lavandería, Tintorería, Delivery ...).
    #[serde(default)]
    pub section_id: Option<String>,

    pub pricing_mode: PricingMode,

    /// Base price, per piece or per kg depending on `pricing_mode`.
    pub price: Money,

    /// Price used when the ticket is marked express.
    #[serde(default)]
    pub express_price: Option<Money>,

    #[serde(default = "default_true")]
    pub taxable: bool,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl Product {
    /// Creates an active, taxable product with no express price.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pricing_mode: PricingMode,
        price: Money,
    ) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            section_id: None,
            pricing_mode,
            price,
            express_price: None,
            taxable: true,
            active: true,
        }
    }

    pub fn with_express_price(mut self, price: Money) -> Self {
        self.express_price = Some(price);
        self
    }

    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    pub fn non_taxable(mut self) -> Self {
        self.taxable = false;
        self
    }

    /// Price charged on a new line: the express price when the ticket is
    /// express and one is set, otherwise the base price.
    pub fn unit_price(&self, is_express: bool) -> Money {
        match (is_express, self.express_price) {
            (true, Some(express)) => express,
            _ => self.price,
        }
    }

    /// Tax-inclusive price shown to the cashier on the product tile.
    ///
    /// Presentation only: the ticket still taxes its post-discount subtotal.
    pub fn display_price(&self, is_express: bool, tax_rate: TaxRate) -> Money {
        let unit = self.unit_price(is_express);
        if self.taxable {
            unit + unit.calculate_tax(tax_rate)
        } else {
            unit
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

fn default_country_code() -> String {
    "+507".to_string()
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_country_code")]
    pub phone_country_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Panamanian cédula, e.g. `8-123-4567`.
    #[serde(default)]
    pub national_id: Option<String>,
    /// Tax id for business customers, with its check digit in `dv`.
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub dv: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Customer {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Customer {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_country_code: default_country_code(),
            phone: None,
            national_id: None,
            ruc: None,
            dv: None,
            address: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// "First Last", without trailing space when there is no last name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Phone with its country code, e.g. `+507 61234567`.
    pub fn phone_display(&self) -> Option<String> {
        self.phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!("{} {}", self.phone_country_code, p.trim()))
    }
}

// =============================================================================
// Operator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    #[default]
    Operator,
    Admin,
}

/// A staff member who rings up orders and closes the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        User {
            id: id.into(),
            name: name.into(),
            role: UserRole::Operator,
        }
    }
}

// =============================================================================
// Service Settings
// =============================================================================

fn default_completion_days() -> u32 {
    1
}

fn default_express_days() -> u32 {
    0
}

/// Store-wide service settings, read-only to the calculator.
///
/// Every field falls back to its default when absent, so a store that never
/// configured anything still prices tickets: 7% ITBMS, next-day regular
/// service, same-day express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceSettings {
    #[serde(default)]
    pub tax_rate: TaxRate,

    #[serde(default = "default_completion_days")]
    pub default_completion_days: u32,

    #[serde(default = "default_express_days")]
    pub express_completion_days: u32,
}

impl ServiceSettings {
    /// Lead time in days for the given service level.
    pub fn completion_days(&self, is_express: bool) -> u32 {
        if is_express {
            self.express_completion_days
        } else {
            self.default_completion_days
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            tax_rate: TaxRate::default(),
            default_completion_days: default_completion_days(),
            express_completion_days: default_express_days(),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an order was paid.
///
/// ## Unknown Methods
/// Values outside the known set come back from the data store as
/// `Other(raw)`. They are kept, bucketed and printed under their raw name so
/// that no sale ever disappears from the daily totals.
///
/// Serialized as a plain lowercase string (`"cash"`, `"gift_card"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Yappy mobile wallet.
    Yappy,
    /// Bank transfer.
    Ach,
    Check,
    /// On-account, invoiced later.
    Invoice,
    /// Paid when the customer picks up.
    Pickup,
    GiftCard,
    Other(String),
}

impl PaymentMethod {
    /// The eight methods every closing report lists, in print order.
    pub fn known() -> [PaymentMethod; 8] {
        [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::Yappy,
            PaymentMethod::Ach,
            PaymentMethod::Check,
            PaymentMethod::Invoice,
            PaymentMethod::Pickup,
            PaymentMethod::GiftCard,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Yappy => "yappy",
            PaymentMethod::Ach => "ach",
            PaymentMethod::Check => "check",
            PaymentMethod::Invoice => "invoice",
            PaymentMethod::Pickup => "pickup",
            PaymentMethod::GiftCard => "gift_card",
            PaymentMethod::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PaymentMethod::Other(_))
    }

    /// Label printed on customer receipts.
    pub fn receipt_label(&self) -> &str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
            PaymentMethod::Yappy => "Yappy",
            PaymentMethod::Ach => "ACH",
            PaymentMethod::Check => "Cheque",
            PaymentMethod::Invoice => "Factura a Crédito",
            PaymentMethod::Pickup => "Pago en Recogida",
            PaymentMethod::GiftCard => "Tarjeta Regalo",
            PaymentMethod::Other(raw) => raw,
        }
    }

    /// Label printed on the daily closing report.
    pub fn report_label(&self) -> &str {
        match self {
            PaymentMethod::Ach => "ACH/Banco",
            PaymentMethod::Invoice => "Factura Crédito",
            other => other.receipt_label(),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "yappy" => PaymentMethod::Yappy,
            "ach" => PaymentMethod::Ach,
            "check" => PaymentMethod::Check,
            "invoice" => PaymentMethod::Invoice,
            "pickup" => PaymentMethod::Pickup,
            "gift_card" => PaymentMethod::GiftCard,
            // Missing method on a legacy order means cash
            "" => PaymentMethod::Cash,
            _ => PaymentMethod::Other(raw.trim().to_string()),
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(raw: String) -> Self {
        PaymentMethod::from(raw.as_str())
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// The payment captured when a ticket is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    #[serde(default)]
    #[ts(type = "string")]
    pub method: PaymentMethod,

    pub amount: Money,

    /// Cash handed over by the customer (cash only).
    #[serde(default)]
    pub cash_tendered: Option<Money>,

    /// Change returned (cash only).
    #[serde(default)]
    pub change: Option<Money>,

    /// Card voucher, Yappy confirmation, check number...
    #[serde(default)]
    pub reference: Option<String>,
}

impl Payment {
    /// A non-cash payment for exactly `amount`.
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        Payment {
            method,
            amount,
            cash_tendered: None,
            change: None,
            reference: None,
        }
    }

    /// A cash payment, computing change.
    ///
    /// ## Errors
    /// `InvalidPayment` when the tendered cash does not cover the total.
    /// Comparison is on the printed (rounded) amounts, so tendering B/10.70
    /// for a B/10.695 total is enough.
    pub fn cash(total: Money, tendered: Money) -> CoreResult<Self> {
        if tendered.rounded() < total.rounded() {
            return Err(CoreError::InvalidPayment {
                reason: format!("tendered {} does not cover total {}", tendered, total),
            });
        }
        let change = Money::new(tendered.rounded() - total.rounded());
        Ok(Payment {
            method: PaymentMethod::Cash,
            amount: total,
            cash_tendered: Some(tendered),
            change: Some(change),
            reference: None,
        })
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// =============================================================================
// Store Identity
// =============================================================================

fn default_store_name() -> String {
    "WASH & FOLD".to_string()
}

/// Business identity printed at the top of receipts and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreInfo {
    #[serde(default = "default_store_name")]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub dv: Option<String>,
}

impl StoreInfo {
    /// `155-1234-56789-12` (RUC then DV), when a RUC is set.
    pub fn tax_id(&self) -> Option<String> {
        let ruc = self.ruc.as_deref().filter(|r| !r.trim().is_empty())?;
        Some(match self.dv.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(dv) => format!("{}-{}", ruc.trim(), dv.trim()),
            None => ruc.trim().to_string(),
        })
    }
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: default_store_name(),
            address: None,
            phone: None,
            ruc: None,
            dv: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> Product {
        Product::new("p-shirt", "Camisa", PricingMode::Quantity, Money::from_cents(200))
            .with_express_price(Money::from_cents(300))
    }

    #[test]
    fn test_unit_price_prefers_express_when_set() {
        let p = shirt();
        assert_eq!(p.unit_price(false), Money::from_cents(200));
        assert_eq!(p.unit_price(true), Money::from_cents(300));

        let no_express = Product::new("p", "Toalla", PricingMode::Quantity, Money::from_cents(150));
        assert_eq!(no_express.unit_price(true), Money::from_cents(150));
    }

    #[test]
    fn test_display_price_includes_tax_only_when_taxable() {
        let p = shirt();
        assert_eq!(p.display_price(false, TaxRate::ITBMS), Money::from_cents(214));
        assert_eq!(
            p.non_taxable().display_price(true, TaxRate::ITBMS),
            Money::from_cents(300)
        );
    }

    #[test]
    fn test_product_defaults_from_json() {
        let json = r#"{"id":"p1","name":"Lavado","pricing_mode":"weight","price":1.5}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert!(p.taxable);
        assert!(p.active);
        assert_eq!(p.express_price, None);
        assert_eq!(p.pricing_mode, PricingMode::Weight);
    }

    #[test]
    fn test_settings_fall_back_to_defaults() {
        let settings: ServiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ServiceSettings::default());
        assert_eq!(settings.tax_rate.bps(), 700);
        assert_eq!(settings.completion_days(false), 1);
        assert_eq!(settings.completion_days(true), 0);
    }

    #[test]
    fn test_payment_method_preserves_unknown_values() {
        assert_eq!(PaymentMethod::from("gift_card"), PaymentMethod::GiftCard);
        assert_eq!(PaymentMethod::from("CASH"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::from(""), PaymentMethod::Cash);

        let crypto = PaymentMethod::from("crypto");
        assert_eq!(crypto, PaymentMethod::Other("crypto".to_string()));
        assert!(!crypto.is_known());

        let json = serde_json::to_string(&crypto).unwrap();
        assert_eq!(json, "\"crypto\"");
        let back: PaymentMethod = serde_json::from_str("\"yappy\"").unwrap();
        assert_eq!(back, PaymentMethod::Yappy);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Ach.receipt_label(), "ACH");
        assert_eq!(PaymentMethod::Ach.report_label(), "ACH/Banco");
        assert_eq!(PaymentMethod::Invoice.report_label(), "Factura Crédito");
        assert_eq!(PaymentMethod::Cash.report_label(), "Efectivo");
    }

    #[test]
    fn test_cash_payment_change() {
        let payment = Payment::cash(Money::from_cents(1070), Money::from_units(20)).unwrap();
        assert_eq!(payment.change, Some(Money::from_cents(930)));
        assert_eq!(payment.method, PaymentMethod::Cash);

        let short = Payment::cash(Money::from_cents(1070), Money::from_units(10));
        assert!(matches!(short, Err(CoreError::InvalidPayment { .. })));
    }

    #[test]
    fn test_customer_display() {
        let c = Customer::new("c1", "Ana", "").with_phone("61234567");
        assert_eq!(c.display_name(), "Ana");
        assert_eq!(c.phone_display().as_deref(), Some("+507 61234567"));
    }

    #[test]
    fn test_store_tax_id() {
        let mut store = StoreInfo::default();
        assert_eq!(store.tax_id(), None);
        store.ruc = Some("155-123-456".to_string());
        store.dv = Some("12".to_string());
        assert_eq!(store.tax_id().as_deref(), Some("155-123-456-12"));
    }
}
