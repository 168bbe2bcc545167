use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

use crate::notify::BookingReceipt;

/// The confirmation artifact handed to the delivery channel.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationDocument {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ConfirmationDocument {
    pub fn render(receipt: &BookingReceipt) -> Self {
        let booking = &receipt.booking;
        let context = &receipt.context;
        let fees = &receipt.breakdown;
        let currency = booking.currency.as_str();

        let mut body = String::new();
        let _ = writeln!(body, "Hi {},", context.buyer_name);
        let _ = writeln!(body);
        let _ = writeln!(
            body,
            "Your booking for {} with {} is confirmed.",
            context.event_title, context.vendor_name
        );
        let _ = writeln!(body);
        let _ = writeln!(body, "Booking: {}", booking.id);
        let _ = writeln!(body, "Order:   {}", booking.order_ref);
        if let Some(payment_ref) = &booking.payment_ref {
            let _ = writeln!(body, "Payment: {}", payment_ref);
        }
        let _ = writeln!(body);

        for ticket in &receipt.tickets {
            let label = format!(
                "{} x {} @ {:.2}",
                ticket.ticket_name, ticket.quantity, ticket.unit_price
            );
            line(&mut body, &label, currency, ticket.line_total());
        }
        let _ = writeln!(body);

        line(&mut body, "Base amount", currency, fees.amount);
        line(&mut body, "Convenience fee", currency, fees.convenience_fee);
        line(&mut body, "CGST", currency, fees.cgst);
        line(&mut body, "SGST", currency, fees.sgst);
        line(&mut body, "Total GST", currency, fees.total_gst);
        line(&mut body, "Amount paid", currency, fees.amount_with_tax);

        Self {
            to: context.buyer_email.clone(),
            subject: format!("Booking confirmed: {}", context.event_title),
            body,
        }
    }
}

fn line(body: &mut String, label: &str, currency: &str, value: Decimal) {
    let _ = writeln!(body, "{:<32}{} {:.2}", label, currency, value);
}
