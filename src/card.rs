//! SVG card rendering.
//!
//! Layout constants mirror the upstream card proportions: a 450px-wide body,
//! 25px stat rows, and a rank ring pinned to the right edge.

use chrono::{Datelike, Utc};

use crate::params::CardParams;
use crate::stats::Stats;

const DEFAULT_WIDTH: u32 = 450;
const MIN_WIDTH: u32 = 287;
const DEFAULT_LINE_HEIGHT: u32 = 25;
const MAX_LINE_HEIGHT: u32 = 100;
const DEFAULT_BORDER_RADIUS: f32 = 4.5;
const RANK_RING_RADIUS: f32 = 40.0;

pub struct ThemeColors {
    pub title: &'static str,
    pub icon: &'static str,
    pub text: &'static str,
    pub bg: &'static str,
    pub border: &'static str,
}

/// Built-in palettes. Unknown names fall back to `default`.
pub fn theme_colors(name: &str) -> &'static ThemeColors {
    match name {
        "dark" => &ThemeColors {
            title: "#ffffff",
            icon: "#79ff97",
            text: "#9f9f9f",
            bg: "#151515",
            border: "#e4e2e2",
        },
        "radical" => &ThemeColors {
            title: "#fe428e",
            icon: "#f8d847",
            text: "#a9fef7",
            bg: "#141321",
            border: "#e4e2e2",
        },
        "merko" => &ThemeColors {
            title: "#abd200",
            icon: "#b7d364",
            text: "#68b587",
            bg: "#0a0f0b",
            border: "#e4e2e2",
        },
        "gruvbox" => &ThemeColors {
            title: "#fabd2f",
            icon: "#fe8019",
            text: "#8ec07c",
            bg: "#282828",
            border: "#e4e2e2",
        },
        "tokyonight" => &ThemeColors {
            title: "#70a5fd",
            icon: "#bf91f3",
            text: "#38bdae",
            bg: "#1a1b27",
            border: "#e4e2e2",
        },
        "onedark" => &ThemeColors {
            title: "#e4bf7a",
            icon: "#8eb573",
            text: "#df6d74",
            bg: "#282c34",
            border: "#e4e2e2",
        },
        "dracula" => &ThemeColors {
            title: "#ff6e96",
            icon: "#79dafa",
            text: "#f8f8f2",
            bg: "#282a36",
            border: "#e4e2e2",
        },
        "transparent" => &ThemeColors {
            title: "#006aff",
            icon: "#0579c3",
            text: "#417e87",
            bg: "#ffffff00",
            border: "#e4e2e2",
        },
        _ => &ThemeColors {
            title: "#2f80ed",
            icon: "#4c71f2",
            text: "#434d58",
            bg: "#fffefe",
            border: "#e4e2e2",
        },
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Accepts `rgb`, `rgba`, `rrggbb` and `rrggbbaa` hex, with or without a
/// leading `#`. Anything else is discarded so invalid input cannot break the
/// SVG.
fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    let valid_len = matches!(hex.len(), 3 | 4 | 6 | 8);
    if valid_len && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_lowercase()))
    } else {
        None
    }
}

fn pick_color(override_value: Option<&str>, fallback: &str) -> String {
    override_value
        .and_then(normalize_color)
        .unwrap_or_else(|| fallback.to_string())
}

/// Compact "6.5k" form used unless `number_format=long` is requested.
fn format_value(n: u64, short: bool) -> String {
    if short && n > 999 {
        let k = n as f64 / 1000.0;
        let rounded = (k * 10.0).round() / 10.0;
        if (rounded - rounded.trunc()).abs() < f64::EPSILON {
            format!("{}k", rounded.trunc() as u64)
        } else {
            format!("{rounded:.1}k")
        }
    } else {
        n.to_string()
    }
}

fn card_title(name: &str, locale: Option<&str>) -> String {
    match locale.unwrap_or("en") {
        "de" => format!("GitHub-Statistiken von {name}"),
        "es" => format!("Estadísticas de GitHub de {name}"),
        "fr" => format!("Statistiques GitHub de {name}"),
        "it" => format!("Statistiche GitHub di {name}"),
        "pt-br" | "pt-pt" => format!("Estatísticas do GitHub de {name}"),
        "ja" => format!("{name}のGitHub統計"),
        "cn" => format!("{name}的GitHub统计数据"),
        "kr" => format!("{name}의 GitHub 통계"),
        "ru" => format!("Статистика GitHub пользователя {name}"),
        _ => format!("{name}'s GitHub Stats"),
    }
}

struct Row {
    id: &'static str,
    label: String,
    value: String,
    icon: &'static str,
}

// Octicon path data, 16x16 viewBox.
const ICON_STAR: &str = "M8 .25a.75.75 0 01.673.418l1.882 3.815 4.21.612a.75.75 0 01.416 1.279l-3.046 2.97.719 4.192a.75.75 0 01-1.088.791L8 12.347l-3.766 1.98a.75.75 0 01-1.088-.79l.72-4.194L.818 6.374a.75.75 0 01.416-1.28l4.21-.611L7.327.668A.75.75 0 018 .25z";
const ICON_COMMITS: &str = "M1.643 3.143L.427 1.927A.25.25 0 000 2.104V5.75c0 .138.112.25.25.25h3.646a.25.25 0 00.177-.427L2.715 4.215a6.5 6.5 0 11-1.18 4.458.75.75 0 10-1.493.154 8.001 8.001 0 101.6-5.684zM7.75 4a.75.75 0 01.75.75v2.992l2.028.812a.75.75 0 01-.557 1.392l-2.5-1A.75.75 0 017 8.25v-3.5A.75.75 0 017.75 4z";
const ICON_PRS: &str = "M7.177 3.073L9.573.677A.25.25 0 0110 .854v4.792a.25.25 0 01-.427.177L7.177 3.427a.25.25 0 010-.354zM3.75 2.5a.75.75 0 100 1.5.75.75 0 000-1.5zm-2.25.75a2.25 2.25 0 113 2.122v5.256a2.251 2.251 0 11-1.5 0V5.372A2.25 2.25 0 011.5 3.25zM11 2.5h-1V4h1a1 1 0 011 1v5.628a2.251 2.251 0 101.5 0V5A2.5 2.5 0 0011 2.5zm1 10.25a.75.75 0 111.5 0 .75.75 0 01-1.5 0zM3.75 12a.75.75 0 100 1.5.75.75 0 000-1.5z";
const ICON_PRS_MERGED: &str = "M5.45 5.154A4.25 4.25 0 009.25 7.5h1.378a2.251 2.251 0 110 1.5H9.25A5.734 5.734 0 015 7.123v3.505a2.25 2.25 0 11-1.5 0V5.372a2.25 2.25 0 111.95-.218zM4.25 13.5a.75.75 0 100-1.5.75.75 0 000 1.5zm8.5-4.5a.75.75 0 100-1.5.75.75 0 000 1.5z";
const ICON_ISSUES: &str = "M8 9.5a1.5 1.5 0 100-3 1.5 1.5 0 000 3zM8 0a8 8 0 100 16A8 8 0 008 0zM1.5 8a6.5 6.5 0 1113 0 6.5 6.5 0 01-13 0z";
const ICON_CONTRIBS: &str = "M2 2.5A2.5 2.5 0 014.5 0h8.75a.75.75 0 01.75.75v12.5a.75.75 0 01-.75.75h-2.5a.75.75 0 110-1.5h1.75v-2h-8a1 1 0 00-.714 1.7.75.75 0 01-1.072 1.05A2.495 2.495 0 012 11.5v-9zm10.5-1V9h-8c-.356 0-.694.074-1 .208V2.5a1 1 0 011-1h8zM5 12.25v3.25a.25.25 0 00.4.2l1.45-1.087a.25.25 0 01.3 0L8.6 15.7a.25.25 0 00.4-.2v-3.25a.25.25 0 00-.25-.25h-3.5a.25.25 0 00-.25.25z";
const ICON_DISCUSSIONS: &str = "M1.5 2.75a.25.25 0 01.25-.25h8.5a.25.25 0 01.25.25v5.5a.25.25 0 01-.25.25h-3.5a.75.75 0 00-.53.22L3.5 11.44V9.25a.75.75 0 00-.75-.75h-1a.25.25 0 01-.25-.25v-5.5zM1.75 1A1.75 1.75 0 000 2.75v5.5C0 9.216.784 10 1.75 10H2v1.543a1.457 1.457 0 002.487 1.03L7.061 10h3.189A1.75 1.75 0 0012 8.25v-5.5A1.75 1.75 0 0010.25 1h-8.5z";
const ICON_ANSWERED: &str = "M0 8a8 8 0 1116 0A8 8 0 010 8zm11.78-1.72a.75.75 0 00-1.06-1.06L6.75 9.19 5.28 7.72a.75.75 0 00-1.06 1.06l2 2a.75.75 0 001.06 0l4.5-4.5z";

fn build_rows(stats: &Stats, params: &CardParams, short: bool) -> Vec<Row> {
    let hidden = |id: &str| params.hide.iter().any(|h| h == id);
    let year = Utc::now().year();

    let commits_label = if params.include_all_commits {
        "Total Commits".to_string()
    } else {
        format!("Total Commits ({year})")
    };

    let mut rows = Vec::new();
    if !hidden("stars") {
        rows.push(Row {
            id: "stars",
            label: "Total Stars Earned".to_string(),
            value: format_value(stats.total_stars, short),
            icon: ICON_STAR,
        });
    }
    if !hidden("commits") {
        rows.push(Row {
            id: "commits",
            label: commits_label,
            value: format_value(stats.total_commits, short),
            icon: ICON_COMMITS,
        });
    }
    if !hidden("prs") {
        rows.push(Row {
            id: "prs",
            label: "Total PRs".to_string(),
            value: format_value(stats.total_prs, short),
            icon: ICON_PRS,
        });
    }
    if params.shows("prs_merged") {
        rows.push(Row {
            id: "prs_merged",
            label: "Total PRs Merged".to_string(),
            value: format_value(stats.total_prs_merged, short),
            icon: ICON_PRS_MERGED,
        });
    }
    if params.shows("prs_merged_percentage") {
        rows.push(Row {
            id: "prs_merged_percentage",
            label: "Merged PRs Percentage".to_string(),
            value: format!("{:.0}%", stats.merged_prs_percentage),
            icon: ICON_PRS_MERGED,
        });
    }
    if !hidden("issues") {
        rows.push(Row {
            id: "issues",
            label: "Total Issues".to_string(),
            value: format_value(stats.total_issues, short),
            icon: ICON_ISSUES,
        });
    }
    if params.shows("discussions_started") {
        rows.push(Row {
            id: "discussions_started",
            label: "Total Discussions Started".to_string(),
            value: format_value(stats.total_discussions_started, short),
            icon: ICON_DISCUSSIONS,
        });
    }
    if params.shows("discussions_answered") {
        rows.push(Row {
            id: "discussions_answered",
            label: "Total Discussions Answered".to_string(),
            value: format_value(stats.total_discussions_answered, short),
            icon: ICON_ANSWERED,
        });
    }
    if !hidden("contribs") {
        rows.push(Row {
            id: "contribs",
            label: "Contributed to (last year)".to_string(),
            value: format_value(stats.contributed_to, short),
            icon: ICON_CONTRIBS,
        });
    }

    rows
}

fn render_rank_ring(stats: &Stats, params: &CardParams, ring_color: &str, title_color: &str) -> String {
    let circumference = 2.0 * std::f64::consts::PI * f64::from(RANK_RING_RADIUS);
    let progress = (100.0 - stats.rank.percentile) / 100.0;
    let offset = circumference * (1.0 - progress);

    let (display, font_size) = if params.rank_icon.as_deref() == Some("percentile") {
        (format!("{:.0}%", stats.rank.percentile), 20)
    } else {
        (stats.rank.level.to_string(), 24)
    };

    format!(
        r##"<g class="rank-circle-group" data-testid="rank-circle">
    <circle class="rank-circle-rim" cx="0" cy="0" r="{RANK_RING_RADIUS}" fill="none" stroke="{ring_color}" stroke-opacity="0.2" stroke-width="6"/>
    <circle class="rank-circle" cx="0" cy="0" r="{RANK_RING_RADIUS}" fill="none" stroke="{ring_color}" stroke-width="6" stroke-linecap="round"
        stroke-dasharray="{circumference:.2}" stroke-dashoffset="{offset:.2}" transform="rotate(-90)"/>
    <text class="rank-text" x="0" y="0" fill="{title_color}" font-size="{font_size}" font-weight="700" text-anchor="middle" dominant-baseline="central">{display}</text>
</g>"##
    )
}

/// Render the stats card. All dynamic text is escaped, so the output is
/// well-formed XML for any input.
pub fn render_stats_card(stats: &Stats, params: &CardParams) -> String {
    let theme = theme_colors(params.theme.as_deref().unwrap_or("default"));
    let title_color = pick_color(params.title_color.as_deref(), theme.title);
    let icon_color = pick_color(params.icon_color.as_deref(), theme.icon);
    let text_color = pick_color(params.text_color.as_deref(), theme.text);
    let bg_color = pick_color(params.bg_color.as_deref(), theme.bg);
    let border_color = pick_color(params.border_color.as_deref(), theme.border);
    let ring_color = pick_color(params.ring_color.as_deref(), &title_color);

    let short = params
        .number_format
        .as_deref()
        .map(|f| !f.eq_ignore_ascii_case("long"))
        .unwrap_or(true);
    let rows = build_rows(stats, params, short);

    // Row height is user-controlled; bound it so the height math cannot
    // overflow and the card stays a card.
    let line_height = params
        .line_height
        .unwrap_or(DEFAULT_LINE_HEIGHT)
        .min(MAX_LINE_HEIGHT);
    let width = params.card_width.unwrap_or(DEFAULT_WIDTH).max(MIN_WIDTH);
    let border_radius = params.border_radius.unwrap_or(DEFAULT_BORDER_RADIUS);
    let font_weight = if params.text_bold.unwrap_or(true) { 700 } else { 400 };

    let body_offset = if params.hide_title { 25 } else { 55 };
    let mut height = body_offset + (rows.len() as u32 + 1) * line_height;
    if !params.hide_rank {
        height = height.max(195);
    }

    let title = params
        .custom_title
        .clone()
        .unwrap_or_else(|| card_title(&stats.name, params.locale.as_deref()));

    let title_element = if params.hide_title {
        String::new()
    } else {
        format!(
            r#"<text x="25" y="35" class="header" data-testid="header">{}</text>"#,
            escape_xml(&title)
        )
    };

    let value_x = if params.show_icons { 220 } else { 200 };
    let label_x = if params.show_icons { 25 } else { 0 };
    let mut row_elements = String::new();
    for (i, row) in rows.iter().enumerate() {
        let y = i as u32 * line_height;
        let delay = 450 + i * 150;
        let icon = if params.show_icons {
            format!(
                r#"<svg class="icon" viewBox="0 0 16 16" width="16" height="16"><path fill-rule="evenodd" d="{}"/></svg>"#,
                row.icon
            )
        } else {
            String::new()
        };
        row_elements.push_str(&format!(
            r#"        <g class="stagger" style="animation-delay: {delay}ms" transform="translate(25, {y})" data-testid="{id}">
            {icon}<text class="stat" x="{label_x}" y="12.5">{label}:</text>
            <text class="stat" x="{value_x}" y="12.5">{value}</text>
        </g>
"#,
            id = row.id,
            label = escape_xml(&row.label),
            value = escape_xml(&row.value),
        ));
    }

    let rank_element = if params.hide_rank {
        String::new()
    } else {
        let ring = render_rank_ring(stats, params, &ring_color, &title_color);
        let cx = width.saturating_sub(100);
        let cy = height / 2;
        format!(r#"<g transform="translate({cx}, {cy})">{ring}</g>"#)
    };

    let animations = if params.disable_animations {
        String::new()
    } else {
        r#"
        .stagger { opacity: 0; animation: fadeInAnimation 0.3s ease-in-out forwards; }
        .rank-circle { animation: scaleInAnimation 0.3s ease-in-out forwards; }
        @keyframes fadeInAnimation {
            from { opacity: 0; }
            to { opacity: 1; }
        }
        @keyframes scaleInAnimation {
            from { transform: rotate(-90deg) scale(0); }
            to { transform: rotate(-90deg) scale(1); }
        }"#
        .to_string()
    };

    let border_opacity = if params.hide_border { 0 } else { 1 };

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" fill="none" role="img" aria-label="{aria}">
    <style>
        .header {{ font: 600 18px 'Segoe UI', Ubuntu, Sans-Serif; fill: {title_color}; }}
        .stat {{ font: {font_weight} 14px 'Segoe UI', Ubuntu, Sans-Serif; fill: {text_color}; }}
        .icon {{ fill: {icon_color}; }}
        .rank-text {{ font-family: 'Segoe UI', Ubuntu, Sans-Serif; }}{animations}
    </style>
    <rect x="0.5" y="0.5" rx="{border_radius}" width="{rect_w}" height="{rect_h}" fill="{bg_color}" stroke="{border_color}" stroke-opacity="{border_opacity}"/>
    {title_element}
    <g transform="translate(0, {body_offset})">
{row_elements}    </g>
    {rank_element}
</svg>
"#,
        aria = escape_xml(&title),
        rect_w = width - 1,
        rect_h = height - 1,
    )
}

/// Fixed-size error card. Reuses whatever color parameters were bound so the
/// failure presentation matches the requested theme.
pub fn render_error(message: &str, secondary: &str, params: &CardParams) -> String {
    let theme = theme_colors(params.theme.as_deref().unwrap_or("default"));
    let title_color = pick_color(params.title_color.as_deref(), theme.title);
    let text_color = pick_color(params.text_color.as_deref(), theme.text);
    let bg_color = pick_color(params.bg_color.as_deref(), theme.bg);
    let border_color = pick_color(params.border_color.as_deref(), theme.border);

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="576" height="120" viewBox="0 0 576 120" fill="none" role="img" aria-label="Something went wrong">
    <style>
        .text {{ font: 600 16px 'Segoe UI', Ubuntu, Sans-Serif; fill: {title_color}; }}
        .small {{ font: 600 12px 'Segoe UI', Ubuntu, Sans-Serif; fill: {text_color}; }}
        .gray {{ fill: #858585; }}
    </style>
    <rect x="0.5" y="0.5" rx="4.5" width="575" height="119" fill="{bg_color}" stroke="{border_color}"/>
    <text x="25" y="45" class="text">Something went wrong!</text>
    <text x="25" y="75" class="small" data-testid="message">{message}</text>
    <text x="25" y="95" class="small gray">{secondary}</text>
</svg>
"#,
        message = escape_xml(message),
        secondary = escape_xml(secondary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_stats() -> Stats {
        Stats {
            name: "The Octocat".to_string(),
            total_stars: 6520,
            total_commits: 430,
            total_prs: 91,
            total_prs_merged: 80,
            merged_prs_percentage: 87.9,
            total_issues: 28,
            total_discussions_started: 4,
            total_discussions_answered: 2,
            contributed_to: 12,
            followers: 300,
            ..Default::default()
        }
    }

    fn params_from(pairs: &[(&str, &str)]) -> CardParams {
        let query: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CardParams::from_query(&query)
    }

    #[test]
    fn card_contains_title_and_stats() {
        let svg = render_stats_card(&sample_stats(), &CardParams::default());
        assert!(svg.contains("The Octocat&#x27;s GitHub Stats") || svg.contains("The Octocat's GitHub Stats"));
        assert!(svg.contains("Total Stars Earned"));
        assert!(svg.contains("6.5k"));
        assert!(svg.contains("Total PRs"));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn long_number_format_disables_k_suffix() {
        let params = params_from(&[("number_format", "long")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains(">6520<"));
        assert!(!svg.contains("6.5k"));
    }

    #[test]
    fn hide_list_removes_rows() {
        let params = params_from(&[("hide", "stars,issues")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(!svg.contains("Total Stars Earned"));
        assert!(!svg.contains("Total Issues"));
        assert!(svg.contains("Total Commits"));
    }

    #[test]
    fn show_list_adds_optional_rows() {
        let params = params_from(&[("show", "prs_merged,discussions_started")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains("Total PRs Merged"));
        assert!(svg.contains("Total Discussions Started"));
        assert!(!svg.contains("Total Discussions Answered"));
    }

    #[test]
    fn custom_title_overrides_localized_title() {
        let params = params_from(&[("custom_title", "My <Stats>")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains("My &lt;Stats&gt;"));
    }

    #[test]
    fn localized_title() {
        let params = params_from(&[("locale", "de")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains("GitHub-Statistiken von The Octocat"));
    }

    #[test]
    fn hide_rank_drops_the_ring() {
        let with_rank = render_stats_card(&sample_stats(), &CardParams::default());
        assert!(with_rank.contains(r#"data-testid="rank-circle""#));
        let params = params_from(&[("hide_rank", "true")]);
        let without = render_stats_card(&sample_stats(), &params);
        assert!(!without.contains(r#"data-testid="rank-circle""#));
    }

    #[test]
    fn disable_animations_strips_keyframes() {
        let params = params_from(&[("disable_animations", "true")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(!svg.contains("@keyframes"));
        let animated = render_stats_card(&sample_stats(), &CardParams::default());
        assert!(animated.contains("@keyframes"));
    }

    #[test]
    fn color_overrides_must_be_hex() {
        let params = params_from(&[("title_color", "ff6e96"), ("bg_color", "not-a-color")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains("#ff6e96"));
        assert!(svg.contains("#fffefe"));
        assert!(!svg.contains("not-a-color"));
    }

    #[test]
    fn theme_lookup_falls_back_to_default() {
        assert_eq!(theme_colors("dark").bg, "#151515");
        assert_eq!(theme_colors("no-such-theme").bg, "#fffefe");
    }

    #[test]
    fn huge_line_height_is_bounded() {
        let params = params_from(&[("line_height", "4294967295")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.starts_with("<svg"));
        // 5 default rows at the 100px cap under a 55px header.
        assert!(svg.contains(r#"height="655""#));
    }

    #[test]
    fn non_finite_border_radius_falls_back() {
        let params = params_from(&[("border_radius", "NaN")]);
        let svg = render_stats_card(&sample_stats(), &params);
        assert!(svg.contains(r#"rx="4.5""#));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(999, true), "999");
        assert_eq!(format_value(1000, true), "1k");
        assert_eq!(format_value(6520, true), "6.5k");
        assert_eq!(format_value(6520, false), "6520");
    }

    #[test]
    fn error_card_escapes_message() {
        let svg = render_error("boom <&> bang", "try later", &CardParams::default());
        assert!(svg.contains("Something went wrong!"));
        assert!(svg.contains("boom &lt;&amp;&gt; bang"));
        assert!(svg.contains("try later"));
        assert!(!svg.contains("<&>"));
    }
}
