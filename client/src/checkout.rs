//! Cart pricing and the simulated purchase that turns a cart into tickets.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::models::{CartItem, NewNotification, Ticket, TicketStatus};
use crate::store::ClientStore;

const PLATFORM_FEE_PERCENT: u32 = 2;

const PROMO_CODES: &[(&str, u32)] = &[
    ("STUDENT10", 10),
    ("FIRST20", 20),
    ("CAMPUS15", 15),
    ("WELCOME25", 25),
];

const ORGANIZER_CONTACT: &str = "+91 98765 43210";
const ORGANIZER_EMAIL: &str = "events@college.edu";
const TICKET_TYPE: &str = "Regular";

const QR_SVG: &str = r##"<svg width="100" height="100" xmlns="http://www.w3.org/2000/svg"><rect width="100" height="100" fill="#000"/><rect x="10" y="10" width="80" height="80" fill="#fff"/><rect x="20" y="20" width="60" height="60" fill="#000"/></svg>"##;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    pub code: String,
    pub percent: u32,
}

impl PromoCode {
    /// Case-insensitive lookup of a known code.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim().to_uppercase();
        PROMO_CODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, percent)| Self {
                code,
                percent: *percent,
            })
    }
}

fn percent_of(amount: Decimal, percent: u32) -> Decimal {
    (amount * Decimal::from(percent) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub tickets: u32,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl CartSummary {
    pub fn compute(cart: &[CartItem], promo: Option<&PromoCode>) -> Self {
        let subtotal: Decimal = cart.iter().map(CartItem::line_total).sum();
        let platform_fee = percent_of(subtotal, PLATFORM_FEE_PERCENT);
        let discount = promo.map_or(Decimal::ZERO, |p| percent_of(subtotal, p.percent));

        Self {
            tickets: cart.iter().map(|item| item.quantity).sum(),
            subtotal,
            platform_fee,
            discount,
            total: subtotal + platform_fee - discount,
        }
    }
}

/// Looks up `input` and tells the user whether it applied.
pub fn apply_promo_code(store: &mut ClientStore, input: &str) -> Option<PromoCode> {
    match PromoCode::parse(input) {
        Some(promo) => {
            let saved = CartSummary::compute(store.cart(), Some(&promo)).discount;
            store.add_notification(NewNotification::success(
                "Promo Code Applied!",
                format!("You saved ₹{saved} with code {}", promo.code),
            ));
            Some(promo)
        }
        None => {
            store.add_notification(NewNotification::error(
                "Invalid Promo Code",
                "Please check your promo code and try again.",
            ));
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_number: String,
    pub summary: CartSummary,
    pub ticket_ids: Vec<String>,
}

fn seat_number(rng: &mut impl Rng) -> String {
    let row = char::from(rng.gen_range(b'A'..=b'Z'));
    let seat = rng.gen_range(1..=100);
    format!("{row}-{seat}")
}

fn qr_payload() -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(QR_SVG))
}

/// Issues one ticket per purchased unit, empties the cart and confirms the
/// order with a notification. Payment is simulated.
pub fn checkout(
    store: &mut ClientStore,
    promo: Option<&PromoCode>,
    payment_method: &str,
) -> Order {
    let summary = CartSummary::compute(store.cart(), promo);
    let now = Utc::now();
    let millis = now.timestamp_millis();
    let order_number = format!("ORD{millis}");
    let purchase_date = now.format("%B %-d, %Y").to_string();
    let qr_code = qr_payload();
    let mut rng = rand::thread_rng();

    let mut tickets = Vec::new();
    for item in store.cart() {
        for _ in 0..item.quantity {
            tickets.push(Ticket {
                id: format!("TKT{millis}{}", tickets.len()),
                event_id: item.event_id,
                title: item.title.clone(),
                category: item.category.clone(),
                date: item.date.clone(),
                time: item.time.clone(),
                location: item.location.clone(),
                building: item.building.clone(),
                room: item.room.clone(),
                price: item.price,
                purchase_date: purchase_date.clone(),
                status: TicketStatus::Confirmed,
                image: item.image.clone(),
                organizer: item.organizer.clone(),
                organizer_contact: ORGANIZER_CONTACT.to_string(),
                organizer_email: ORGANIZER_EMAIL.to_string(),
                qr_code: qr_code.clone(),
                seat_number: seat_number(&mut rng),
                ticket_type: TICKET_TYPE.to_string(),
                order_number: order_number.clone(),
                payment_method: payment_method.to_string(),
                refundable: true,
                transferable: true,
                description: format!("Ticket for {}", item.title),
                quantity: 1,
                rating: None,
                feedback: None,
                cancellation_reason: None,
                refund_amount: None,
                refund_status: None,
            });
        }
    }

    let ticket_ids = tickets.iter().map(|t| t.id.clone()).collect();
    for ticket in tickets {
        store.add_ticket(ticket);
    }
    store.clear_cart();
    store.add_notification(NewNotification::success(
        "Order Confirmed!",
        "Your tickets have been booked successfully. Check your email for details.",
    ));

    info!(order = %order_number, total = %summary.total, "order confirmed");

    Order {
        order_number,
        summary,
        ticket_ids,
    }
}
