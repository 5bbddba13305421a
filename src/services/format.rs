//! Display helpers shared by every front end

use chrono::{DateTime, Utc};

/// `FREE` for zero or negative prices, otherwise rupees with two decimals
pub fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "FREE".to_string()
    } else {
        format!("₹ {:.2}", price)
    }
}

/// `December 1, 2024`, or `December 1, 2024 at 10:05:00 AM` with time
pub fn format_date(date: &DateTime<Utc>, with_time: bool) -> String {
    if with_time {
        date.format("%B %-d, %Y at %-I:%M:%S %p").to_string()
    } else {
        date.format("%B %-d, %Y").to_string()
    }
}

/// Public URL of a cover image stored under `base_url`
pub fn image_url(base_url: &str, image_name: &str) -> String {
    format!("{}{}", base_url, urlencoding::encode(image_name))
}
