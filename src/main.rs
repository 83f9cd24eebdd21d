use clap::Parser;
use tracing::info;

use redditstories_llm::ContentGenerator;
use redditstories_llm::args::{Args, Command};
use redditstories_llm::config::{self, Config};
use redditstories_llm::llm::default_backend;
use redditstories_llm::meta::{VideoDetails, VideoForm, VideoMeta};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let model_path = args.model.clone().unwrap_or_else(config::llm_path);
    info!("Using model {}", model_path.display());

    let params = config.model_parameters(model_path)?;
    let generator = ContentGenerator::new(default_backend(), params)
        .with_title_attempts(config.title_max_attempts)
        .with_max_tags(config.max_tags);

    match args.command {
        Command::Title(post) => {
            println!("{}", generator.generate_title(&post.subreddit, &post.title, &post.content()?));
        }
        Command::Description(post) => {
            println!(
                "{}",
                generator.generate_description(&post.subreddit, &post.title, &post.content()?)
            );
        }
        Command::Keywords(post) => {
            println!(
                "{}",
                generator.generate_keywords(&post.subreddit, &post.title, &post.content()?)
            );
        }
        Command::Tags(post) => {
            let tags = generator.generate_tags(&post.subreddit, &post.title, &post.content()?);
            println!("{}", tags.join(", "));
        }
        Command::Story { theme, length } => {
            println!("{}", generator.generate_story(&theme, &length));
        }
        Command::Meta {
            post,
            duration,
            name,
            url,
            uploaded,
            output_dir,
        } => {
            let content = post.content()?;
            let name = name
                .unwrap_or_else(|| chrono::Local::now().format("%m-%d-%Y_%H-%M-%S").to_string());
            let form = VideoForm::from_duration(duration);
            info!("Generating {} form metadata '{}'", form, name);

            let meta = VideoMeta {
                name,
                form,
                duration,
                uploaded,
                url,
                video: VideoDetails::generate(
                    &generator,
                    &post.subreddit,
                    &post.title,
                    &content,
                    &config.video_tags,
                ),
            };
            let dir = output_dir.unwrap_or_else(config::output_dir);
            let path = meta.write(&dir)?;
            println!("{}", path.display());
        }
    }

    info!("Process complete.");
    Ok(())
}
