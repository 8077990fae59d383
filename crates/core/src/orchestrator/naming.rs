//! Mapping image URLs to local file names.

use std::path::{Path, PathBuf};

/// Returns the last path segment of `url`, without query or fragment.
///
/// Returns `None` when there is no usable segment (e.g. the URL ends in
/// `/`), or when the segment would refer to a directory (`.` or `..`).
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let url = url.split_once('#').map_or(url, |(head, _)| head);
    let url = url.split_once('?').map_or(url, |(head, _)| head);

    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |slash| &rest[slash..]),
        None => url,
    };

    match path.rsplit('/').next() {
        Some("") | Some(".") | Some("..") | None => None,
        Some(name) => Some(name),
    }
}

/// Where the image at `url` is saved inside `download_dir`.
pub fn destination_for(download_dir: &Path, url: &str) -> Option<PathBuf> {
    file_name_from_url(url).map(|name| download_dir.join(name))
}
