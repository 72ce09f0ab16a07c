//! Typed coercion of raw query-string values.
//!
//! Every display option arrives as an optional string; the coercion rules are
//! deliberately strict so malformed input falls back to a defined default
//! instead of leaking through to the renderer.

use std::collections::HashMap;

/// `"true"` is true, `"false"` is false, anything else (including absent) is
/// treated as unset. Matching is case-sensitive.
pub fn parse_boolean_opt(value: Option<&str>) -> Option<bool> {
    match value {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Same as [`parse_boolean_opt`] but collapses "unset" to false.
pub fn parse_boolean(value: Option<&str>) -> bool {
    parse_boolean_opt(value).unwrap_or(false)
}

/// Comma-separated list into trimmed, non-empty items. Absent input yields an
/// empty vec.
pub fn parse_array(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_u32(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

pub fn parse_f32(value: Option<&str>) -> Option<f32> {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|f: &f32| f.is_finite())
}

/// All card options recognised on the query string, bound up front so the
/// error path always has valid theme context even when a later stage fails.
#[derive(Debug, Clone, Default)]
pub struct CardParams {
    pub username: Option<String>,
    pub hide: Vec<String>,
    pub hide_title: bool,
    pub hide_border: bool,
    pub card_width: Option<u32>,
    pub hide_rank: bool,
    pub show_icons: bool,
    pub include_all_commits: bool,
    pub line_height: Option<u32>,
    pub title_color: Option<String>,
    pub ring_color: Option<String>,
    pub icon_color: Option<String>,
    pub text_color: Option<String>,
    pub text_bold: Option<bool>,
    pub bg_color: Option<String>,
    pub theme: Option<String>,
    pub cache_seconds: Option<String>,
    pub exclude_repo: Vec<String>,
    pub custom_title: Option<String>,
    pub locale: Option<String>,
    pub disable_animations: bool,
    pub border_radius: Option<f32>,
    pub number_format: Option<String>,
    pub border_color: Option<String>,
    pub rank_icon: Option<String>,
    pub show: Vec<String>,
}

impl CardParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let get = |key: &str| query.get(key).map(String::as_str);
        let owned = |key: &str| {
            get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        Self {
            username: owned("username"),
            hide: parse_array(get("hide")),
            hide_title: parse_boolean(get("hide_title")),
            hide_border: parse_boolean(get("hide_border")),
            card_width: parse_u32(get("card_width")),
            hide_rank: parse_boolean(get("hide_rank")),
            show_icons: parse_boolean(get("show_icons")),
            include_all_commits: parse_boolean(get("include_all_commits")),
            line_height: parse_u32(get("line_height")),
            title_color: owned("title_color"),
            ring_color: owned("ring_color"),
            icon_color: owned("icon_color"),
            text_color: owned("text_color"),
            text_bold: parse_boolean_opt(get("text_bold")),
            bg_color: owned("bg_color"),
            theme: owned("theme"),
            cache_seconds: owned("cache_seconds"),
            exclude_repo: parse_array(get("exclude_repo")),
            custom_title: owned("custom_title"),
            locale: owned("locale").map(|l| l.to_lowercase()),
            disable_animations: parse_boolean(get("disable_animations")),
            border_radius: parse_f32(get("border_radius")),
            number_format: owned("number_format"),
            border_color: owned("border_color"),
            rank_icon: owned("rank_icon"),
            show: parse_array(get("show")),
        }
    }

    /// Whether the `show` list requests the given optional stat.
    pub fn shows(&self, field: &str) -> bool {
        self.show.iter().any(|item| item == field)
    }
}
