use std::cell::RefCell;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::error::{Artifact, GenerationError, or_fallback};
use crate::llm::backend::{ChatMessage, ModelBackend};
use crate::llm::params::ModelParameters;
use crate::llm::seed::{SEED_DIGITS, random_seed_with};
use crate::llm::session::ModelSession;
use crate::pos::{HeuristicTagger, PosTagger};
use crate::prompts;
use crate::tags::{DEFAULT_MAX_TAGS, extract_tags};

/// Titles must be strictly shorter than this many characters.
pub const TITLE_MAX_CHARS: usize = 100;
pub const DEFAULT_TITLE_ATTEMPTS: usize = 5;

/// Produces video text for a post, one model session per task.
pub struct ContentGenerator {
    backend: Arc<dyn ModelBackend>,
    defaults: ModelParameters,
    tagger: Box<dyn PosTagger>,
    title_attempts: usize,
    max_tags: usize,
    rng: RefCell<StdRng>,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn ModelBackend>, defaults: ModelParameters) -> Self {
        Self {
            backend,
            defaults,
            tagger: Box::new(HeuristicTagger::new()),
            title_attempts: DEFAULT_TITLE_ATTEMPTS,
            max_tags: DEFAULT_MAX_TAGS,
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn with_tagger(mut self, tagger: Box<dyn PosTagger>) -> Self {
        self.tagger = tagger;
        self
    }

    /// At least one attempt is always made.
    pub fn with_title_attempts(mut self, attempts: usize) -> Self {
        self.title_attempts = attempts.max(1);
        self
    }

    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags;
        self
    }

    /// Makes title seeds reproducible.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        *self.rng.borrow_mut() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn defaults(&self) -> &ModelParameters {
        &self.defaults
    }

    fn next_seed(&self) -> u32 {
        random_seed_with(&mut *self.rng.borrow_mut(), SEED_DIGITS)
    }

    /// Runs `prompt` through a fresh session and returns the validated text.
    fn run(&self, prompt: String, seed: Option<u32>) -> Artifact {
        let prompt_chars = prompt.chars().count() as u32;
        let mut session = ModelSession::new(Arc::clone(&self.backend), self.defaults.clone());
        session.set_param(
            "ctx_size",
            self.defaults.load.ctx_size.saturating_add(prompt_chars),
        )?;
        if let Some(seed) = seed {
            info!("Seed: {}", seed);
            session.set_param("seed", seed)?;
        }
        session.load()?;
        let text = session.complete(&[ChatMessage::user(prompt)]);
        session.release();
        text
    }

    pub fn try_generate_title(&self, subreddit: &str, post_title: &str, post_content: &str) -> Artifact {
        let mut candidate = String::new();
        for attempt in 1..=self.title_attempts {
            let prompt = prompts::title(subreddit, post_title, post_content);
            let title = self.run(prompt, Some(self.next_seed()))?;
            info!("Video title: {}", title);

            let len = title.chars().count();
            if len < TITLE_MAX_CHARS {
                return Ok(title);
            }
            warn!(
                "Video title is too long ({} chars, attempt {}/{}), regenerating",
                len, attempt, self.title_attempts
            );
            candidate = title;
        }
        let title = truncate_title(&candidate, TITLE_MAX_CHARS);
        if title.is_empty() {
            return Err(GenerationError::NoResponse);
        }
        warn!("Giving up on regeneration, truncated title to: {}", title);
        Ok(title)
    }

    pub fn try_generate_description(
        &self,
        _subreddit: &str,
        post_title: &str,
        post_content: &str,
    ) -> Artifact {
        let description = self.run(prompts::description(post_title, post_content), None)?;
        info!("Video description: {}", description);
        Ok(description)
    }

    pub fn try_generate_keywords(
        &self,
        _subreddit: &str,
        post_title: &str,
        post_content: &str,
    ) -> Artifact {
        let keywords = self.run(prompts::keywords(post_title, post_content), None)?;
        info!("Video keywords: {}", keywords);
        Ok(keywords)
    }

    pub fn try_generate_tags(
        &self,
        subreddit: &str,
        post_title: &str,
        post_content: &str,
    ) -> Result<Vec<String>, GenerationError> {
        let keywords = self.try_generate_keywords(subreddit, post_title, post_content)?;
        let tags = extract_tags(self.tagger.as_ref(), &keywords, self.max_tags);
        info!("Video tags: {:?}", tags);
        Ok(tags)
    }

    pub fn try_generate_story(&self, theme: &str, length: &str) -> Artifact {
        let story = self.run(prompts::story(theme, length), None)?;
        info!("Story: {}", story);
        Ok(story)
    }

    pub fn generate_title(&self, subreddit: &str, post_title: &str, post_content: &str) -> String {
        or_fallback(self.try_generate_title(subreddit, post_title, post_content))
    }

    pub fn generate_description(&self, subreddit: &str, post_title: &str, post_content: &str) -> String {
        or_fallback(self.try_generate_description(subreddit, post_title, post_content))
    }

    pub fn generate_keywords(&self, subreddit: &str, post_title: &str, post_content: &str) -> String {
        or_fallback(self.try_generate_keywords(subreddit, post_title, post_content))
    }

    /// Empty when no keywords could be generated.
    pub fn generate_tags(&self, subreddit: &str, post_title: &str, post_content: &str) -> Vec<String> {
        self.try_generate_tags(subreddit, post_title, post_content)
            .unwrap_or_else(|e| {
                warn!("No tags generated: {}", e);
                Vec::new()
            })
    }

    pub fn generate_story(&self, theme: &str, length: &str) -> String {
        or_fallback(self.try_generate_story(theme, length))
    }
}

/// Cuts `title` to fewer than `limit` characters, preferring a word boundary.
pub fn truncate_title(title: &str, limit: usize) -> String {
    let keep = limit.saturating_sub(1);
    if title.chars().count() <= keep {
        return title.to_string();
    }
    let cut: String = title.chars().take(keep).collect();
    let next_is_space = title.chars().nth(keep).is_some_and(char::is_whitespace);
    let trimmed = if next_is_space {
        cut.as_str()
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(i) if i >= cut.len() / 2 => &cut[..i],
            _ => cut.as_str(),
        }
    };
    let tidy =
        trimmed.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'));
    if tidy.is_empty() {
        cut.trim_end().to_string()
    } else {
        tidy.to_string()
    }
}
