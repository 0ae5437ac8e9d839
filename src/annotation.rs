//! Field annotation grammar.
//!
//! `key` or `key!` names the source key (`!` marks the field required),
//! `<-` embeds the field, anything else leaves the field alone.
use once_cell::sync::Lazy;
use regex::Regex;

/// Token that hands a field the parent's whole source value.
pub const EMBED: &str = "<-";

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[a-zA-Z0-9][a-zA-Z0-9_-]*)(?P<required>!)?$").expect("valid key pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Key { key: String, required: bool },
    Embed,
    Skip,
}

pub fn parse(raw: &str) -> Annotation {
    if raw == EMBED {
        return Annotation::Embed;
    }
    match KEY_PATTERN.captures(raw) {
        Some(caps) => Annotation::Key {
            key: caps["key"].to_owned(),
            required: caps.name("required").is_some(),
        },
        None => Annotation::Skip,
    }
}
