//! Repository reference parsing.
//!
//! Parses `repo[:tag]` names into their components. Unlike a full OCI
//! reference parser there is no registry or digest handling here: the
//! repository index keys bindings by plain repository name and tag.

/// Tag assumed when a delete request names a bare repository.
pub const DEFAULT_TAG: &str = "latest";

/// Split a name into repository and tag.
///
/// The colon only counts as a tag separator after the last slash, so
/// `registry:5000/repo` parses as a bare repository. The tag is returned
/// empty when absent; callers decide whether to apply [`DEFAULT_TAG`].
pub fn parse_repository_tag(name: &str) -> (String, String) {
    if let Some(colon) = name.rfind(':') {
        let after = &name[colon + 1..];
        if !after.contains('/') {
            return (name[..colon].to_string(), after.to_string());
        }
    }
    (name.to_string(), String::new())
}

/// Render a `(repo, tag)` pair back into a display reference.
pub fn image_reference(repo: &str, tag: &str) -> String {
    if tag.is_empty() {
        repo.to_string()
    } else {
        format!("{repo}:{tag}")
    }
}
