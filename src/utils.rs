use std::path::{Path, PathBuf};

pub const JSON_EXT: &str = ".json";

/// Assemble a cluster endpoint URL from a base URI, path segments and query
/// parameters. Empty segments are dropped, parameters keep their order and
/// are emitted verbatim.
pub fn make_url(uri: &str, segments: &[&str], params: &[(&str, &str)]) -> String {
    let mut url = String::from(uri);
    if !url.ends_with('/') {
        url.push('/');
    }

    let path = segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("/");
    url.push_str(&path);

    if !params.is_empty() {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        url.push('?');
        url.push_str(&query);
    }
    url
}

/// Build the local file path for a dumped mapping or document set:
/// `dir/componentA.componentB<ext>`. Empty components are dropped and stray
/// dots trimmed so the pieces join cleanly. Does not touch the filesystem.
pub fn make_file_path(dir: &Path, components: &[&str], ext: &str) -> PathBuf {
    let name = components
        .iter()
        .filter(|component| !component.is_empty())
        .map(|component| component.trim_matches('.'))
        .collect::<Vec<_>>()
        .join(".");
    dir.join(format!("{}{}", name, ext))
}
