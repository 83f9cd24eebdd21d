use std::collections::HashMap;

use crate::pos::PosTagger;

pub const DEFAULT_MAX_TAGS: usize = 50;

/// Most frequent nouns and proper nouns in `text`, top `max` first, alphabetic
/// tokens only.
///
/// Ties keep first-seen order. The alphabetic filter runs after the cut, so the
/// result can be shorter than `max`.
pub fn extract_tags(tagger: &dyn PosTagger, text: &str, max: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in tagger.tag(text).into_iter().filter(|t| t.pos.is_noun()) {
        match index.get(&token.text) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.text.clone(), counts.len());
                counts.push((token.text, 1));
            }
        }
    }

    // stable sort keeps insertion order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max)
        .map(|(tag, _)| tag)
        .filter(|tag| is_alphabetic(tag))
        .collect()
}

fn is_alphabetic(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}
