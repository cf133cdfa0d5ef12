use crate::availability::{nights, total_price, Selection};
use crate::config::Room;
use crate::isodate::format_date;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PaymentPlan {
    Full,
    Downpayment,
}

#[derive(Debug, Error)]
pub(crate) enum QuoteError {
    #[error("select check-in and check-out dates first")]
    IncompleteRange,
    #[error("at least one guest is required")]
    NoGuests,
    #[error("{room} sleeps at most {capacity} guests")]
    OverCapacity { room: String, capacity: u8 },
    #[error("failed to format stay dates")]
    Format(#[from] time::error::Format),
}

/// The priced stay for a completed selection
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct BookingQuote {
    room_id: String,
    room_name: String,
    check_in: String,
    check_out: String,
    guests: u8,
    nights: u32,
    price_per_night: u64,
    total: u64,
    downpayment_percent: u8,
}

impl BookingQuote {
    pub(crate) fn new(
        room: &Room,
        selection: Selection,
        guests: u8,
        downpayment_percent: u8,
    ) -> Result<BookingQuote, QuoteError> {
        let (Some(check_in), Some(check_out)) = (selection.check_in(), selection.check_out())
        else {
            return Err(QuoteError::IncompleteRange);
        };
        if guests == 0 {
            return Err(QuoteError::NoGuests);
        }
        if guests > room.capacity {
            return Err(QuoteError::OverCapacity {
                room: room.name.clone(),
                capacity: room.capacity,
            });
        }
        Ok(BookingQuote {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            check_in: format_date(check_in)?,
            check_out: format_date(check_out)?,
            guests,
            nights: nights(selection),
            price_per_night: room.price_per_night,
            total: total_price(selection, room.price_per_night),
            downpayment_percent,
        })
    }

    pub(crate) fn nights(&self) -> u32 {
        self.nights
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    pub(crate) fn downpayment_percent(&self) -> u8 {
        self.downpayment_percent
    }

    /// The share of the total due up front, rounded half up to the peso
    pub(crate) fn downpayment_amount(&self) -> u64 {
        let scaled = self
            .total
            .saturating_mul(u64::from(self.downpayment_percent));
        scaled.saturating_add(50) / 100
    }

    pub(crate) fn remaining_amount(&self) -> u64 {
        self.total.saturating_sub(self.downpayment_amount())
    }

    pub(crate) fn amount_due_now(&self, plan: PaymentPlan) -> u64 {
        match plan {
            PaymentPlan::Full => self.total,
            PaymentPlan::Downpayment => self.downpayment_amount(),
        }
    }

    pub(crate) fn balance_after(&self, plan: PaymentPlan) -> u64 {
        match plan {
            PaymentPlan::Full => 0,
            PaymentPlan::Downpayment => self.remaining_amount(),
        }
    }

    pub(crate) fn handoff(&self, plan: PaymentPlan) -> BookingHandoff {
        BookingHandoff {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            check_in: self.check_in.clone(),
            check_out: self.check_out.clone(),
            guests: self.guests,
            nights: self.nights,
            price_per_night: self.price_per_night,
            total_price: self.total,
            payment_type: plan,
            amount_to_pay: self.amount_due_now(plan),
            remaining_amount: self.balance_after(plan),
        }
    }
}

/// A confirmed selection as passed on to guest-details collection and
/// payment
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookingHandoff {
    pub(crate) room_id: String,
    pub(crate) room_name: String,
    pub(crate) check_in: String,
    pub(crate) check_out: String,
    pub(crate) guests: u8,
    pub(crate) nights: u32,
    pub(crate) price_per_night: u64,
    pub(crate) total_price: u64,
    pub(crate) payment_type: PaymentPlan,
    pub(crate) amount_to_pay: u64,
    pub(crate) remaining_amount: u64,
}

/// Formats a peso amount with thousands separators, e.g. `₱12,500`
pub(crate) fn pesos(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    out.push('₱');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
