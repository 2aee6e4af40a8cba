//! Temperature unit conversion.
//!
//! Pure functions, no I/O. Fahrenheit is always derived from celsius at the
//! point of use; nothing in the crate stores a fahrenheit value that could
//! drift from its celsius source.

/// Convert a celsius temperature to fahrenheit.
pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Round to one decimal place for display.
pub fn round_display(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Both units of a celsius value, rounded to one decimal for display.
pub fn celsius_to_display(celsius: f64) -> (f64, f64) {
    (round_display(celsius), round_display(to_fahrenheit(celsius)))
}
