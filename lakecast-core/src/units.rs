//! Unit conversions applied while assembling current conditions.
//!
//! Both functions are total: an absent reading stays absent.

const MPS_TO_MPH: f64 = 2.237;

pub fn celsius_to_fahrenheit(celsius: Option<f64>) -> Option<f64> {
    celsius.map(|c| c * 9.0 / 5.0 + 32.0)
}

pub fn meters_per_second_to_mph(speed: Option<f64>) -> Option<f64> {
    speed.map(|v| v * MPS_TO_MPH)
}
