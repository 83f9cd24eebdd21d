use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(about = "Generate titles, descriptions and tags for reddit story videos")]
pub struct Args {
    #[clap(long, default_value = "./config/config.json")]
    pub config: PathBuf,

    /// Model file; defaults to $LLM_PATH.
    #[clap(long)]
    pub model: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Title(PostArgs),
    Description(PostArgs),
    Keywords(PostArgs),
    Tags(PostArgs),
    Story {
        #[clap(long)]
        theme: String,

        #[clap(long, default_value = "short")]
        length: String,
    },
    /// Generate title, description and tags and write the metadata record.
    Meta {
        #[clap(flatten)]
        post: PostArgs,

        /// Narration length in seconds.
        #[clap(long)]
        duration: f64,

        #[clap(long)]
        name: Option<String>,

        #[clap(long, default_value = "")]
        url: String,

        #[clap(long)]
        uploaded: bool,

        /// Defaults to $OUTPUT_DIR.
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct PostArgs {
    #[clap(long, default_value = "AITAH")]
    pub subreddit: String,

    #[clap(long)]
    pub title: String,

    #[clap(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    #[clap(long)]
    pub content_file: Option<PathBuf>,
}

impl PostArgs {
    pub fn content(&self) -> anyhow::Result<String> {
        match (&self.content, &self.content_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => Ok(fs::read_to_string(path)?),
            (None, None) => Ok(String::new()),
        }
    }
}
