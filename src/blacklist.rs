//! Usernames for which card generation is refused.

const BLACKLIST: &[&str] = &["renovate-bot", "technote-space", "sw-yx"];

pub fn is_blacklisted(username: &str) -> bool {
    BLACKLIST.contains(&username)
}
