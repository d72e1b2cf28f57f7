//! Parsing of CSS-selector-like tag strings such as `div#main.card.active`.

/// Tag name used when the selector carries only an id and/or classes.
pub const DEFAULT_TAG: &str = "div";

/// Result of parsing a selector-like tag string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Element tag name, `div` when omitted.
    pub tag_name: String,
    /// The first `#id` token, if present.
    pub id: Option<String>,
    /// Every `.class` token in order of appearance.
    pub classes: Vec<String>,
}

impl Selector {
    /// Returns the classes joined by single spaces, or `None` if there are none.
    #[must_use]
    pub fn class_list(&self) -> Option<String> {
        if self.classes.is_empty() {
            None
        } else {
            Some(self.classes.join(" "))
        }
    }
}

/// Parses a tag string into tag name, id and classes.
///
/// Never fails. An id token runs from `#` to the next `.`, a class token from
/// `.` to the next `.` or `#`. With several `#` tokens only the first counts.
#[must_use]
pub fn parse_tag(tag: &str) -> Selector {
    let id = find_id(tag);
    let classes = find_classes(tag);

    let without_id = strip_first_id(tag);
    let tag_name = strip_classes(&without_id);
    let tag_name = if tag_name.is_empty() {
        DEFAULT_TAG.to_string()
    } else {
        tag_name
    };

    Selector {
        tag_name,
        id,
        classes,
    }
}

/// First `#` followed by at least one character other than `.`.
fn find_id(tag: &str) -> Option<String> {
    tag.match_indices('#').find_map(|(index, _)| {
        let rest = &tag[index + 1..];
        let end = rest.find('.').unwrap_or(rest.len());
        (end > 0).then(|| rest[..end].to_string())
    })
}

fn find_classes(tag: &str) -> Vec<String> {
    let mut classes = Vec::new();
    let mut rest = tag;
    while let Some(dot) = rest.find('.') {
        rest = &rest[dot + 1..];
        let end = rest.find(['.', '#']).unwrap_or(rest.len());
        if end > 0 {
            classes.push(rest[..end].to_string());
            rest = &rest[end..];
        }
    }
    classes
}

/// Removes the first `#` and everything up to the next `.`.
fn strip_first_id(tag: &str) -> String {
    tag.find('#').map_or_else(
        || tag.to_string(),
        |start| {
            let end = tag[start..].find('.').map_or(tag.len(), |offset| start + offset);
            format!("{}{}", &tag[..start], &tag[end..])
        },
    )
}

/// Removes every `.` together with what follows it up to the next `#`.
fn strip_classes(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut rest = tag;
    while let Some(dot) = rest.find('.') {
        out.push_str(&rest[..dot]);
        let after = &rest[dot..];
        rest = after.find('#').map_or("", |hash| &after[hash..]);
    }
    out.push_str(rest);
    out
}
