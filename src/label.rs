use std::collections::HashMap;

use serde::Serialize;

use crate::limits::MAX_MASK_LEN;
use crate::model::{Decoration, Interval, PaymentStatus, ResourceId};

/// Supplies display metadata for a booking. Consulted only when composing bar text.
pub trait DecorationProvider {
    fn decoration(&self, interval: &Interval) -> Decoration;
}

/// Uses the decoration carried on the booking itself.
pub struct Embedded;

impl DecorationProvider for Embedded {
    fn decoration(&self, interval: &Interval) -> Decoration {
        interval.decoration.clone()
    }
}

/// Fills in per-night price and stay total from a room price list when the booking has none.
pub struct NightlyRates {
    rates: HashMap<ResourceId, u64>,
}

impl NightlyRates {
    pub fn new(rates: HashMap<ResourceId, u64>) -> Self {
        Self { rates }
    }
}

impl DecorationProvider for NightlyRates {
    fn decoration(&self, interval: &Interval) -> Decoration {
        let mut deco = interval.decoration.clone();
        let price = deco
            .price_per_night
            .or_else(|| self.rates.get(&interval.resource_id).copied());
        deco.price_per_night = price;
        if deco.total_amount.is_none()
            && let Some(p) = price
            && interval.nights() > 0
        {
            deco.total_amount = Some(p.saturating_mul(interval.nights() as u64));
        }
        deco
    }
}

/// Text for one booking bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarLabel {
    pub title: String,
    pub subtitle: Option<String>,
}

/// Mask a guest name to the form "K*****i, J." for privacy mode.
pub fn obscure_guest_name(name: &str) -> String {
    fn mask(word: &str) -> String {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() <= 2 {
            return word.to_string();
        }
        let stars = "*".repeat((chars.len() - 2).min(MAX_MASK_LEN));
        format!("{}{}{}", chars[0], stars, chars[chars.len() - 1])
    }

    if let Some((last, first)) = name.split_once(',') {
        let initial = first.trim().chars().next().map(String::from).unwrap_or_default();
        return format!("{}, {}.", mask(last.trim()), initial);
    }
    if name.chars().count() > 3 {
        return mask(name);
    }
    name.to_string()
}

/// Compose bar text. `privacy_mode` masks every guest name; a booking's own
/// `private` flag masks just that one.
pub fn compose_label(interval: &Interval, deco: &Decoration, privacy_mode: bool) -> BarLabel {
    let guest = deco
        .guest_label
        .clone()
        .unwrap_or_else(|| interval.id.to_string());
    let mut title = if privacy_mode || deco.private {
        format!("{} (private)", obscure_guest_name(&guest))
    } else {
        guest
    };
    if deco.vip {
        title.insert_str(0, "VIP ");
    }
    if let Some(pax) = deco.pax {
        title.push_str(&format!(" ({pax} pax)"));
    }

    let mut parts = Vec::new();
    match (deco.price_per_night, deco.total_amount) {
        (Some(p), Some(t)) if p > 0 && t > 0 => parts.push(format!("{p}/night · {t}")),
        (Some(p), _) if p > 0 => parts.push(format!("{p}/night")),
        _ => {}
    }
    match deco.payment {
        Some(PaymentStatus::Unpaid) => parts.push("unpaid".to_string()),
        Some(PaymentStatus::Partial) => parts.push("part-paid".to_string()),
        Some(PaymentStatus::Paid) | None => {}
    }
    let subtitle = if parts.is_empty() { None } else { Some(parts.join(" · ")) };
    BarLabel { title, subtitle }
}
