//! Instruction templates for each generation task.

pub fn title(subreddit: &str, post_title: &str, post_content: &str) -> String {
    format!(
        "Create a short and Search Engine Optimised video title based on the subreddit '{}', post title '{}', and post content '{}'. The title must be engaging. It **HAS TO BE UNDER 100 characters in length**. Respond with ONLY one title and no additional text.",
        subreddit, post_title, post_content
    )
}

pub fn description(post_title: &str, post_content: &str) -> String {
    format!(
        "Create a Search Engine Optimized description for story named '{}' and the story '{}'. Respond ONLY with the video description and nothing else. Do not include a title.",
        post_title, post_content
    )
}

pub fn keywords(post_title: &str, post_content: &str) -> String {
    format!(
        "Create Search Engine Optimized, YouTube Search Algorithm optimized, keywords from story with title '{}' and the story '{}'. Respond ONLY with the keywords in one line, separated by commas. Include keywords related to Reddit YouTube videos and the title. Generate AT LEAST 200 keywords. Do not respond with anything else.",
        post_title, post_content
    )
}

pub fn story(theme: &str, length: &str) -> String {
    format!("Create a story \"{}\". Make the story {}", theme, length)
}
