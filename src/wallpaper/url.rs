//! `file://` URLs for listed images.
//!
//! Each path segment is percent-encoded on its own so separators survive.

use std::path::{Component, Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Relative paths are resolved against the working directory first.
pub fn display_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut url = String::from(FILE_SCHEME);
    for component in absolute.components() {
        match component {
            Component::RootDir => {}
            Component::Normal(segment) => {
                url.push('/');
                url.push_str(&urlencoding::encode(&segment.to_string_lossy()));
            }
            Component::CurDir => url.push_str("/."),
            Component::ParentDir => url.push_str("/.."),
            Component::Prefix(prefix) => {
                url.push('/');
                url.push_str(&urlencoding::encode(&prefix.as_os_str().to_string_lossy()));
            }
        }
    }
    if url.len() == FILE_SCHEME.len() {
        url.push('/');
    }
    url
}

/// Inverse of [`display_url`]. `None` for other schemes or invalid escapes.
pub fn path_from_display_url(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix(FILE_SCHEME)?;
    let mut path = PathBuf::from("/");
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        path.push(urlencoding::decode(segment).ok()?.as_ref());
    }
    Some(path)
}
