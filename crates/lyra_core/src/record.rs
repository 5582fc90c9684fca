use serde::{Deserialize, Serialize};

/// The served unit: one normalized build of one repository.
///
/// Field order is significant; clients of the retired upstream API compare
/// responses field-for-field, so serialization must emit
/// `id, name, branch, commit, tag, version, size_mb, image` in that order,
/// with `build_date` appearing last and only while it is still carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: u64,
    pub name: String,
    pub branch: String,
    pub commit: String,
    pub tag: String,
    pub version: String,
    pub size_mb: Option<serde_json::Number>,
    /// Monolith-relative artifact path while the dataset is being built;
    /// rewritten to the public download URL when the dataset is assembled.
    pub image: String,
    /// Used only to pick winners during index construction; stripped from
    /// every record before the dataset is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            id: 11888,
            name: "ReproNim/reproin".into(),
            branch: "master".into(),
            commit: "7def9299ea40bd191efb5b3ab5f3bdc3c2c4b62d".into(),
            tag: "latest".into(),
            version: "361dd7824960bb8eb43b699f90b977cf".into(),
            size_mb: Some(1332.into()),
            image: "ReproNim/reproin/7def9299/361dd782/361dd782.sif".into(),
            build_date: None,
        }
    }

    #[test]
    fn serialized_field_order_is_stable() {
        let json = serde_json::to_string(&record()).unwrap();
        let mut last = 0;
        for key in ["\"id\"", "\"name\"", "\"branch\"", "\"commit\"", "\"tag\"", "\"version\"", "\"size_mb\"", "\"image\""] {
            let pos = json.find(key).unwrap_or_else(|| panic!("{key} missing from {json}"));
            assert!(pos > last || last == 0, "{key} out of order in {json}");
            last = pos;
        }
    }

    #[test]
    fn build_date_is_omitted_once_stripped() {
        let mut rec = record();
        rec.build_date = Some("2021-04-12T12:26:14.487Z".into());
        assert!(serde_json::to_string(&rec).unwrap().contains("build_date"));
        rec.build_date = None;
        assert!(!serde_json::to_string(&rec).unwrap().contains("build_date"));
    }
}
