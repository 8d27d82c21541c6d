//! Checkpoint discovery.

use std::path::Path;

use common::file_utils::files_with_suffix;

use super::Error;

/// File name suffix of a noisy checkpoint render.
const NOISY_SUFFIX: &str = "spp.hdr.exr";

/// The sample-count checkpoints of one scene, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSet {
    pub scene: String,
    pub sample_counts: Vec<u32>,
}

impl CheckpointSet {
    /// Sorts and deduplicates `sample_counts`.
    pub fn new(scene: impl Into<String>, mut sample_counts: Vec<u32>) -> Self {
        sample_counts.sort_unstable();
        sample_counts.dedup();
        Self {
            scene: scene.into(),
            sample_counts,
        }
    }

    /// Scans `dir` for `<scene>_<NNNNNN>spp.hdr.exr` files.
    ///
    /// The scene is taken from the last file in name order; files of other
    /// scenes are ignored.
    pub fn discover(dir: &Path) -> Result<Self, Error> {
        let files = files_with_suffix(dir, NOISY_SUFFIX).map_err(|source| Error::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let parsed: Vec<(&str, u32)> = files
            .iter()
            .filter_map(|path| path.file_name()?.to_str())
            .filter_map(parse_file_name)
            .collect();

        let Some(&(scene, _)) = parsed.last() else {
            return Err(Error::NoCheckpoints(dir.to_path_buf()));
        };

        let sample_counts = parsed
            .iter()
            .filter(|(s, _)| *s == scene)
            .map(|&(_, spp)| spp)
            .collect();
        let set = Self::new(scene, sample_counts);

        tracing::info!(
            scene = %set.scene,
            checkpoints = ?set.sample_counts,
            dir = %dir.display(),
            "Discovered checkpoints"
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.sample_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_counts.is_empty()
    }

    /// Highest sample count; its noisy render is the quality reference.
    pub fn reference_spp(&self) -> Option<u32> {
        self.sample_counts.last().copied()
    }

    pub fn contains(&self, spp: u32) -> bool {
        self.sample_counts.binary_search(&spp).is_ok()
    }
}

/// Splits `<scene>_<digits>spp.hdr.exr` into scene and sample count.
pub fn parse_file_name(name: &str) -> Option<(&str, u32)> {
    let stem = name.strip_suffix(NOISY_SUFFIX)?;
    let (scene, digits) = stem.rsplit_once('_')?;
    if scene.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((scene, digits.parse().ok()?))
}
