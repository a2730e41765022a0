//! Canonical signing payloads for each mandate kind.
//!
//! | Kind    | Fields, in order                                                                                     |
//! |---------|------------------------------------------------------------------------------------------------------|
//! | intent  | `mandate_id, subject, mandate_type, scope (","-joined), requested_amount or "", expires_at`           |
//! | cart    | `mandate_id, subject, items, subtotal_minor, taxes_minor, currency, merchant_domain, expires_at`      |
//! | payment | `mandate_id, subject, amount_minor, token, chain, destination, audit_hash`                            |
//!
//! Fields are joined with `|`. Cart items are sorted by `(id, name)` and
//! rendered `id:name:quantity:price_minor`, joined with `,`. Presence and
//! modality signals are not part of the payment payload; the chain verifier
//! binds them against configured value sets.

use vouch::canonical::{Canonicalize, join_fields};

use crate::types::{CartMandate, IntentMandate, LineItem, PaymentMandate};

impl Canonicalize for IntentMandate {
    fn canonical_payload(&self) -> String {
        let base = &self.base;
        join_fields([
            base.mandate_id.clone(),
            base.subject.clone(),
            base.mandate_type.to_string(),
            self.scope.join(","),
            self.requested_amount
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
            base.expires_at.to_string(),
        ])
    }
}

fn render_items(items: &[LineItem]) -> String {
    let mut sorted: Vec<&LineItem> = items.iter().collect();
    sorted.sort_by(|a, b| (&a.id, &a.name).cmp(&(&b.id, &b.name)));
    sorted
        .iter()
        .map(|item| format!("{}:{}:{}:{}", item.id, item.name, item.quantity, item.price_minor))
        .collect::<Vec<_>>()
        .join(",")
}

impl Canonicalize for CartMandate {
    fn canonical_payload(&self) -> String {
        let base = &self.base;
        join_fields([
            base.mandate_id.clone(),
            base.subject.clone(),
            render_items(&self.line_items),
            self.subtotal_minor.to_string(),
            self.taxes_minor.to_string(),
            self.currency.clone(),
            self.merchant_domain.clone(),
            base.expires_at.to_string(),
        ])
    }
}

impl Canonicalize for PaymentMandate {
    fn canonical_payload(&self) -> String {
        let base = &self.base;
        let amount = self.amount_minor.to_string();
        join_fields([
            base.mandate_id.as_str(),
            base.subject.as_str(),
            amount.as_str(),
            self.token.as_str(),
            self.chain.as_str(),
            self.destination.as_str(),
            self.audit_hash.as_str(),
        ])
    }
}
