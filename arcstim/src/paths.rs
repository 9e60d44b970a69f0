//! Path helpers for document-relative image references.

use std::path::{Component, Path};

/// Express `path` relative to `base`, with `/` separators.
///
/// Both paths are expected to be absolute. Paths outside `base` climb out
/// with `..` segments instead of failing.
pub fn relative_to(path: &Path, base: &Path) -> String {
    if let Ok(rest) = path.strip_prefix(base) {
        return join_components(rest.components());
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    segments.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    segments.join("/")
}

fn join_components<'a>(components: impl Iterator<Item = Component<'a>>) -> String {
    components
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
