//! Identifier helpers shared by builders and renderers.

/// Controller name substituted when a controller is asked for with an empty name.
pub const FALLBACK_CONTROLLER_NAME: &str = "TestController";

const CONTROLLER_SUFFIX: &str = "Controller";

/// Convert a snake_case string to PascalCase
///
/// # Example
///
/// ```rust
/// use schemaforge::components::naming::to_pascal_case;
/// assert_eq!(to_pascal_case("user_profile"), "UserProfile");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == ' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a snake_case string to camelCase (`first_name` -> `firstName`).
pub fn to_lower_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Split PascalCase / camelCase / snake_case into lowercase words.
///
/// Acronyms stay together: `HTTPServer` -> `["http", "server"]`.
fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `UserProfile` -> `user_profile`
pub fn to_snake_case(s: &str) -> String {
    words(s).join("_")
}

/// `UserProfile` -> `user-profile`
pub fn to_kebab_case(s: &str) -> String {
    words(s).join("-")
}

/// Naive English singular for table names (`people` stays `people`).
pub fn singular(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ies") && lower.len() > 3 {
        let y = if word.ends_with("IES") { "Y" } else { "y" };
        return format!("{}{y}", &word[..word.len() - 3]);
    }
    if lower.ends_with("sses") || lower.ends_with("xes") || lower.ends_with("ches") || lower.ends_with("shes") {
        return word[..word.len() - 2].to_string();
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && lower.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Derive a route token from a controller name.
///
/// Removes the `Controller` suffix and converts the rest to a dash-delimited
/// lowercase token. An empty name uses `fallback` instead of failing.
///
/// ```rust
/// use schemaforge::components::naming::{create_route_name, FALLBACK_CONTROLLER_NAME};
/// assert_eq!(create_route_name("PeopleController", FALLBACK_CONTROLLER_NAME), "people");
/// assert_eq!(create_route_name("", FALLBACK_CONTROLLER_NAME), "test");
/// ```
pub fn create_route_name(name: &str, fallback: &str) -> String {
    let name = name.trim();
    // Qualified names: keep the last path segment only.
    let name = name
        .rsplit(|c: char| c == ':' || c == '\\')
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let name = if name.is_empty() { fallback } else { name };
    let stem = name.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(name);
    let stem = if stem.is_empty() { name } else { stem };
    to_kebab_case(stem)
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn",
];

/// Keywords that cannot be raw identifiers.
const RESERVED_PATH_KEYWORDS: &[&str] = &["crate", "self", "super"];

/// Make `name` usable as a Rust field identifier.
pub fn sanitize_field_name(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() || s == "_" {
        s = "_field".to_string();
    }
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if RESERVED_PATH_KEYWORDS.contains(&s.as_str()) {
        format!("{s}_")
    } else if KEYWORDS.contains(&s.as_str()) {
        format!("r#{s}")
    } else {
        s
    }
}

/// Split a `::` or `\` separated namespace into its segments.
pub fn namespace_segments(namespace: &str) -> Vec<&str> {
    namespace
        .split("::")
        .flat_map(|s| s.split('\\'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Join a namespace and a class name into a qualified path.
pub fn qualify(namespace: &str, class: &str) -> String {
    let segments = namespace_segments(namespace);
    if segments.is_empty() {
        class.to_string()
    } else {
        format!("{}::{class}", segments.join("::"))
    }
}
