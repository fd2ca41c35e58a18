//! Response models for the disk resources API.

use serde::Deserialize;

/// Body of `GET /resources/upload?path=...` - the short-lived write target.
#[derive(Debug, Deserialize)]
pub struct UploadTarget {
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub templated: Option<bool>,
}

/// Resource metadata returned by `GET /resources?path=...`.
///
/// Folders have no `size`, and the field can lag behind a fresh upload,
/// so it stays optional.
#[derive(Debug, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_target_parses_href() {
        let json = r#"{"href": "https://uploader.example/upload/abc", "method": "PUT", "templated": false}"#;
        let target: UploadTarget = serde_json::from_str(json).unwrap();
        assert_eq!(target.href, "https://uploader.example/upload/abc");
        assert_eq!(target.method.as_deref(), Some("PUT"));
    }

    #[test]
    fn upload_target_requires_href() {
        let json = r#"{"method": "PUT"}"#;
        assert!(serde_json::from_str::<UploadTarget>(json).is_err());
    }

    #[test]
    fn metadata_size_is_optional() {
        let file: ResourceMetadata =
            serde_json::from_str(r#"{"name": "hello.jpg", "type": "file", "size": 1234}"#).unwrap();
        assert_eq!(file.size, Some(1234));

        let folder: ResourceMetadata =
            serde_json::from_str(r#"{"name": "cats", "type": "dir"}"#).unwrap();
        assert_eq!(folder.size, None);
        assert_eq!(folder.kind.as_deref(), Some("dir"));
    }
}
