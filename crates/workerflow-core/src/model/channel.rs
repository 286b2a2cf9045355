//! Tag scheme

use super::flavor::Flavor;

/// Rolling tag used outside stable mode.
pub const DEVEL_TAG: &str = "devel";

/// Which tags a run publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseChannel {
    /// Every push goes to the `devel` tag.
    #[default]
    Devel,
    /// Push the flavor version plus a floating major tag.
    Stable,
}

impl ReleaseChannel {
    pub fn from_stable_flag(stable: bool) -> Self {
        if stable { Self::Stable } else { Self::Devel }
    }

    /// Tag used for the previous-build lookup and push verification.
    pub fn primary_tag(&self, flavor: &Flavor) -> String {
        match self {
            Self::Devel => DEVEL_TAG.to_string(),
            Self::Stable => flavor.version.clone(),
        }
    }

    /// Every tag to push, primary first.
    ///
    /// In stable mode a version containing `.` also yields the text before
    /// the first `.` (`3.2.1` -> `3.2.1`, `3`). An empty major part yields
    /// no extra tag.
    pub fn publish_tags(&self, flavor: &Flavor) -> Vec<String> {
        let primary = self.primary_tag(flavor);
        let mut tags = vec![primary.clone()];
        if let Self::Stable = self
            && let Some((major, _)) = primary.split_once('.')
            && !major.is_empty()
        {
            tags.push(major.to_string());
        }
        tags
    }
}
