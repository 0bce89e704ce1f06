//! Excluded-package matching.
//!
//! Package identifiers use the `namespace:name` convention while bundle paths
//! spell the same package as `packages/namespace_name/...`. Matching is a
//! plain substring test of `packages/<normalized>` against the path, not a
//! structured path-segment comparison, so `acme:ui` also excludes
//! `packages/acme_ui-extra/`.

/// `acme:ui` -> `acme_ui`. Only the first `:` is replaced.
pub fn normalize_package_name(name: &str) -> String {
    name.replacen(':', "_", 1)
}

/// Returns `true` when `path_in_bundle` lies inside any of `excluded`.
pub fn is_excluded_package<S: AsRef<str>>(excluded: &[S], path_in_bundle: &str) -> bool {
    if path_in_bundle.is_empty() {
        return false;
    }
    excluded.iter().any(|name| {
        let needle = format!("packages/{}", normalize_package_name(name.as_ref()));
        path_in_bundle.contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_first_colon_only() {
        assert_eq!(normalize_package_name("my:pkg"), "my_pkg");
        assert_eq!(normalize_package_name("a:b:c"), "a_b:c");
        assert_eq!(normalize_package_name("plain"), "plain");
    }

    #[test]
    fn matches_by_substring() {
        let excluded = ["my:pkg"];
        assert!(is_excluded_package(&excluded, "packages/my_pkg/x.css"));
        assert!(is_excluded_package(&excluded, "app/packages/my_pkg-extra/y.css"));
        assert!(!is_excluded_package(&excluded, "packages/other/x.css"));
        assert!(!is_excluded_package(&excluded, ""));
        assert!(!is_excluded_package::<&str>(&[], "packages/my_pkg/x.css"));
    }
}
