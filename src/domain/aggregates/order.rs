//! Order Confirmation
//!
//! The record sent to the customer once payment completes. Built from cart
//! lines, validated, checked against the settled payment, then rendered into
//! a templated email request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use validator::Validate;

use crate::domain::aggregates::cart::{Cart, LineItem};
use crate::domain::ports::{PaymentRecord, TemplatedEmail};
use crate::domain::value_objects::{round_cents, Locale, Money};

pub const CONFIRMATION_TEMPLATE: &str = "order-confirmation";
/// Payment metadata key carrying the payer's email address.
pub const CUSTOMER_EMAIL_KEY: &str = "customer_email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentMismatch {
    #[error("payment has not succeeded")]
    NotSucceeded,
    #[error("paid amount differs from the order total")]
    Amount,
    #[error("paid currency differs from the order currency")]
    Currency,
    #[error("recipient is not the payer")]
    Recipient,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub street1: String,
    #[serde(default)]
    pub street2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 2, max = 16))]
    pub zip: String,
    #[validate(length(equal = 2))]
    pub country: String,
}

/// One itemized row of the confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub summary: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&LineItem> for OrderLine {
    fn from(line: &LineItem) -> Self {
        Self {
            name: line.name.clone(),
            summary: line.summary.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            line_total: line.line_total().amount(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OrderConfirmation {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub email: String,
    #[validate]
    pub shipping_address: Address,
    #[validate(length(min = 1))]
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[serde(default)]
    pub locale: Locale,
}

impl OrderConfirmation {
    pub fn from_lines(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        shipping_address: Address,
        lines: &[LineItem],
        currency: &str,
    ) -> Self {
        let lines: Vec<OrderLine> = lines.iter().map(OrderLine::from).collect();
        let total = round_cents(lines.iter().map(|l| l.line_total).sum());
        Self {
            customer_name: customer_name.into(),
            email: email.into(),
            shipping_address,
            lines,
            total,
            currency: currency.to_uppercase(),
            locale: Locale::default(),
        }
    }

    pub fn from_cart(customer_name: impl Into<String>, email: impl Into<String>, shipping_address: Address, cart: &Cart) -> Self {
        Self::from_lines(customer_name, email, shipping_address, cart.lines(), cart.currency())
    }

    /// Checks that `payment` settled this order for this recipient.
    pub fn verify_payment(&self, payment: &PaymentRecord) -> Result<(), PaymentMismatch> {
        if !payment.succeeded() {
            return Err(PaymentMismatch::NotSucceeded);
        }
        if !payment.currency.eq_ignore_ascii_case(&self.currency) {
            return Err(PaymentMismatch::Currency);
        }
        if Money::new(self.total, &self.currency).minor_units() != Some(payment.amount) {
            return Err(PaymentMismatch::Amount);
        }
        match payment.metadata.get(CUSTOMER_EMAIL_KEY) {
            Some(payer) if payer.trim().eq_ignore_ascii_case(self.email.trim()) => Ok(()),
            _ => Err(PaymentMismatch::Recipient),
        }
    }

    pub fn subject(&self) -> &'static str {
        match self.locale {
            Locale::De => "Deine Bestellung ist eingegangen",
            Locale::En => "We received your order",
        }
    }

    pub fn to_email(&self, from: &str) -> TemplatedEmail {
        TemplatedEmail {
            from: from.to_string(),
            to: self.email.clone(),
            subject: self.subject().to_string(),
            template: CONFIRMATION_TEMPLATE.to_string(),
            data: json!({
                "customer_name": self.customer_name,
                "shipping_address": self.shipping_address,
                "lines": self.lines,
                "total": self.total,
                "currency": self.currency,
            }),
        }
    }
}
