//! Cache-duration policy for the card responses.
//!
//! Downstream CDNs key off `Cache-Control`, so the effective max-age is always
//! kept inside a fixed window regardless of what the request asks for. A
//! numeric `CACHE_SECONDS` value from the environment (captured once at
//! startup) overrides the clamped result outright.

pub const TWELVE_HOURS: u32 = 43_200;
pub const ONE_DAY: u32 = 86_400;
pub const TWO_DAY: u32 = 172_800;

/// Default card cache duration when the request does not ask for one.
pub const CARD_CACHE_SECONDS: u32 = TWELVE_HOURS;
/// Error cards are cached much shorter so transient upstream failures clear.
pub const ERROR_CACHE_SECONDS: u32 = 600;

/// Resolve the effective cache duration for a successful card response.
pub fn resolve_cache_seconds(requested: Option<&str>, env_override: Option<u32>) -> u32 {
    let clamped = match requested.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) => n.clamp(i64::from(TWELVE_HOURS), i64::from(TWO_DAY)) as u32,
        None => CARD_CACHE_SECONDS,
    };
    env_override.unwrap_or(clamped)
}

pub fn success_cache_control(seconds: u32) -> String {
    format!("max-age={seconds}, s-maxage={seconds}, stale-while-revalidate={ONE_DAY}")
}

pub fn error_cache_control() -> String {
    format!(
        "max-age={}, s-maxage={}, stale-while-revalidate={ONE_DAY}",
        ERROR_CACHE_SECONDS / 2,
        ERROR_CACHE_SECONDS
    )
}
