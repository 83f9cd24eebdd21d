use regex::Regex;

/// Universal part-of-speech tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Noun,
    Propn,
    Verb,
    Aux,
    Adj,
    Adv,
    Pron,
    Det,
    Adp,
    Cconj,
    Sconj,
    Part,
    Intj,
    Num,
    Punct,
}

impl Pos {
    pub fn is_noun(&self) -> bool {
        matches!(self, Pos::Noun | Pos::Propn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: Pos,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, pos: Pos) -> Self {
        Self {
            text: text.into(),
            pos,
        }
    }
}

pub trait PosTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "every", "each", "some", "any", "no",
    "all", "both", "either", "neither", "another", "such", "what", "which",
];
const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him", "his",
    "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us", "our", "ours",
    "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom", "whose",
    "someone", "something", "everyone", "everything", "nobody", "nothing", "anyone", "anything",
];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "of", "for", "with", "by", "from", "into", "onto", "about", "after",
    "before", "over", "under", "between", "through", "during", "without", "against", "among",
    "around", "behind", "below", "above", "across", "toward", "towards", "upon", "within", "like",
];
const COORDINATORS: &[&str] = &["and", "or", "but", "nor", "yet", "so", "plus"];
const SUBORDINATORS: &[&str] = &[
    "if", "because", "while", "although", "though", "when", "where", "whether", "unless", "since",
    "than", "until", "whereas", "once",
];
const AUXILIARIES: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];
const PARTICLES: &[&str] = &["not", "to", "n't", "'s"];
const INTERJECTIONS: &[&str] = &["oh", "wow", "hey", "yes", "ok", "okay", "omg", "lol", "please"];
const ADVERBS: &[&str] = &[
    "very", "too", "also", "just", "really", "never", "always", "often", "here", "there", "now",
    "then", "again", "still", "already", "soon", "ever", "even", "almost", "quite", "maybe",
    "perhaps", "together", "away", "back", "up", "down", "out", "off",
];
const VERBS: &[&str] = &[
    "get", "got", "go", "went", "gone", "make", "made", "take", "took", "say", "said", "know",
    "knew", "think", "thought", "see", "saw", "seen", "want", "come", "came", "find", "found",
    "give", "gave", "tell", "told", "run", "ran", "feel", "felt", "become", "became", "leave",
    "left", "keep", "kept", "let", "put", "begin", "began", "seem", "help", "show", "hear",
    "heard", "play", "move", "live", "believe", "bring", "brought", "happen", "write", "wrote",
    "sit", "sat", "stand", "stood", "lose", "lost", "pay", "paid", "meet", "met", "watch",
    "woke", "wake", "ask", "try", "call", "work", "need", "love", "hate", "use",
];
const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "ical", "less", "ish"];

/// Rule based tagger: closed-class word lists, suffix rules, capitalisation for
/// proper nouns, and noun as the open-class default.
pub struct HeuristicTagger {
    token_re: Regex,
}

impl HeuristicTagger {
    pub fn new() -> Self {
        let token_re =
            Regex::new(r"\p{L}[\p{L}\p{M}]*(?:['’-]\p{L}+)*|\p{N}+(?:[.,]\p{N}+)*|[^\s\p{L}\p{N}]")
                .unwrap();
        Self { token_re }
    }

    fn classify(word: &str) -> Pos {
        let first = match word.chars().next() {
            Some(c) => c,
            None => return Pos::Punct,
        };
        if first.is_numeric() {
            return Pos::Num;
        }
        if !first.is_alphabetic() {
            return Pos::Punct;
        }

        let lower = word.to_lowercase();
        let lower = lower.as_str();
        let lists: [(&[&str], Pos); 10] = [
            (DETERMINERS, Pos::Det),
            (PRONOUNS, Pos::Pron),
            (ADPOSITIONS, Pos::Adp),
            (COORDINATORS, Pos::Cconj),
            (SUBORDINATORS, Pos::Sconj),
            (AUXILIARIES, Pos::Aux),
            (PARTICLES, Pos::Part),
            (INTERJECTIONS, Pos::Intj),
            (ADVERBS, Pos::Adv),
            (VERBS, Pos::Verb),
        ];
        if let Some((_, pos)) = lists.iter().find(|(words, _)| words.contains(&lower)) {
            return *pos;
        }

        if first.is_uppercase() {
            return Pos::Propn;
        }

        let len = lower.chars().count();
        if len > 4 && lower.ends_with("ly") {
            return Pos::Adv;
        }
        if len > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return Pos::Adj;
        }
        if len > 5 && (lower.ends_with("ing") || lower.ends_with("ed")) {
            return Pos::Verb;
        }
        Pos::Noun
    }
}

impl Default for HeuristicTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PosTagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        self.token_re
            .find_iter(text)
            .map(|m| TaggedToken::new(m.as_str(), Self::classify(m.as_str())))
            .collect()
    }
}
