//! Image metadata labels
//!
//! Every built image carries the label-schema set below. The
//! `org.label-schema.vcs-ref` label is read back by the registries to
//! decide whether a published image is stale.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use workerflow_core::{CommitRef, Flavor};

pub const SCHEMA_VERSION_LABEL: &str = "schema-version";
pub const BUILD_DATE_LABEL: &str = "org.label-schema.build-date";
pub const NAME_LABEL: &str = "org.label-schema.name";
pub const DESCRIPTION_LABEL: &str = "org.label-schema.description";
pub const VCS_REF_LABEL: &str = "org.label-schema.vcs-ref";
pub const VERSION_LABEL: &str = "org.label-schema.version";

pub const SCHEMA_VERSION: &str = "1.0";

/// Maximum description length, in characters.
const DESCRIPTION_MAX_CHARS: usize = 100;

/// Label set stamped on the image of `worker_name` built at `commit`.
pub fn image_labels(
    worker_name: &str,
    flavor: &Flavor,
    commit: &CommitRef,
    build_date: DateTime<Utc>,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (SCHEMA_VERSION_LABEL.to_string(), SCHEMA_VERSION.to_string()),
        (
            BUILD_DATE_LABEL.to_string(),
            build_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (NAME_LABEL.to_string(), worker_name.to_string()),
        (
            DESCRIPTION_LABEL.to_string(),
            label_description(&flavor.description),
        ),
        (VCS_REF_LABEL.to_string(), commit.to_string()),
        (VERSION_LABEL.to_string(), flavor.version.clone()),
    ])
}

/// Truncate to 100 characters, then double single quotes.
pub fn label_description(description: &str) -> String {
    description
        .chars()
        .take(DESCRIPTION_MAX_CHARS)
        .collect::<String>()
        .replace('\'', "''")
}
