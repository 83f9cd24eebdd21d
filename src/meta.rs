use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::content::ContentGenerator;

/// Audio at or above this length makes a long-form video.
pub const LONG_FORM_SECONDS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoForm {
    Short,
    Long,
}

impl VideoForm {
    pub fn from_duration(seconds: f64) -> Self {
        if seconds >= LONG_FORM_SECONDS {
            VideoForm::Long
        } else {
            VideoForm::Short
        }
    }
}

impl fmt::Display for VideoForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoForm::Short => write!(f, "short"),
            VideoForm::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl VideoDetails {
    /// Generates title, description and tags for one post, then adds `default_tags`.
    pub fn generate(
        generator: &ContentGenerator,
        subreddit: &str,
        post_title: &str,
        post_content: &str,
        default_tags: &[String],
    ) -> Self {
        let mut details = VideoDetails {
            title: generator.generate_title(subreddit, post_title, post_content),
            description: generator.generate_description(subreddit, post_title, post_content),
            tags: generator.generate_tags(subreddit, post_title, post_content),
        };
        details.merge_tags(default_tags);
        details
    }

    /// Appends every tag in `defaults` not already present.
    pub fn merge_tags(&mut self, defaults: &[String]) {
        for tag in defaults {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
    }
}

/// Metadata record stored next to each rendered video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub name: String,
    pub form: VideoForm,
    pub duration: f64,
    pub uploaded: bool,
    pub url: String,
    pub video: VideoDetails,
}

fn strip_newline(s: &mut String) {
    if s.ends_with('\n') {
        s.pop();
    }
}

impl VideoMeta {
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.name))
    }

    /// Writes `<dir>/<name>.json` and returns its path.
    pub fn write(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = self.path_in(dir);
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data)?;
        info!("Wrote video metadata to {}", path.display());
        Ok(path)
    }

    /// Reads a record and appends any `default_tags` it does not already carry.
    pub fn load(path: &Path, default_tags: &[String]) -> anyhow::Result<Self> {
        if !path.exists() {
            error!("File '{}' does not exist", path.display());
            anyhow::bail!("metadata file '{}' does not exist", path.display());
        }
        let data = fs::read_to_string(path)?;
        let mut meta: VideoMeta = serde_json::from_str(&data)?;

        strip_newline(&mut meta.name);
        strip_newline(&mut meta.url);
        strip_newline(&mut meta.video.title);
        strip_newline(&mut meta.video.description);

        meta.video.merge_tags(default_tags);
        Ok(meta)
    }
}
