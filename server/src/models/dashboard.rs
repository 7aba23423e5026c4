use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregates shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: i64,
    pub total_registrations: i64,
    /// Sum of `total_amount` over confirmed registrations.
    pub total_revenue: Decimal,
    /// Events dated today or later.
    pub upcoming_events: i64,
}
