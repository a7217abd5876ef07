//! Route templates and canonical resource paths
//!
//! The router and the `Location` headers share these templates, so a created
//! resource's location always points at a route that exists.

/// Single camp (`GET /api/camps/{moniker}`)
pub const CAMP_ROUTE: &str = "/api/camps/:moniker";

/// Single talk (`GET /api/camps/{moniker}/talks/{id}`)
pub const TALK_ROUTE: &str = "/api/camps/:moniker/talks/:id";

/// Whether `value` can fill a route parameter
///
/// Blank values and values containing control characters cannot.
pub fn is_routable(value: &str) -> bool {
    !value.trim().is_empty() && !value.chars().any(char::is_control)
}

/// Substitute `:name` segments of `template` with percent-encoded values
///
/// Returns `None` if a value is not routable or a parameter has no value.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> Option<String> {
    let mut path = String::with_capacity(template.len());

    for segment in template.split('/').skip(1) {
        path.push('/');
        match segment.strip_prefix(':') {
            Some(name) => {
                let (_, value) = values.iter().find(|(key, _)| *key == name)?;
                if !is_routable(value) {
                    return None;
                }
                path.push_str(&urlencoding::encode(value));
            }
            None => path.push_str(segment),
        }
    }

    Some(path)
}

/// Canonical path of a camp
pub fn camp_path(moniker: &str) -> Option<String> {
    fill_template(CAMP_ROUTE, &[("moniker", moniker)])
}

/// Canonical path of a talk
pub fn talk_path(moniker: &str, talk_id: i64) -> Option<String> {
    let id = talk_id.to_string();
    fill_template(TALK_ROUTE, &[("moniker", moniker), ("id", &id)])
}
