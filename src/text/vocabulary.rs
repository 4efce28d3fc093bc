//! Descriptive Vocabulary
//!
//! Word lists shared by the boundary detector, filters, classifier, quality
//! scorer and the rule-based engines. All lists are lowercase.

use crate::types::DescriptionType;

pub const COLOR: &[&str] = &[
    "red", "crimson", "scarlet", "blue", "azure", "green", "emerald", "yellow", "golden", "gold",
    "amber", "orange", "purple", "violet", "black", "white", "grey", "gray", "silver", "brown",
    "pale", "dark", "bright", "pink", "ivory", "ochre", "russet", "copper", "bronze", "rosy",
    "ashen", "sable", "indigo", "colour", "color", "colours", "colors", "hue", "tint",
];

pub const LIGHTING: &[&str] = &[
    "light", "lights", "shadow", "shadows", "shade", "glow", "glowed", "glowing", "gleam",
    "gleamed", "gleaming", "glimmer", "glimmered", "shimmer", "shimmered", "shimmering",
    "sunlight", "moonlight", "starlight", "candlelight", "lamplight", "firelight", "dusk", "dawn",
    "twilight", "gloom", "dim", "darkness", "radiance", "sparkle", "sparkled", "flicker",
    "flickered", "flickering", "lit", "shining", "shone", "blaze", "blazed", "haze", "glare",
    "luminous", "sunset", "sunrise", "rays",
];

pub const TEXTURE: &[&str] = &[
    "rough", "smooth", "soft", "coarse", "velvet", "silken", "silk", "worn", "cracked", "polished",
    "rusty", "mossy", "damp", "wet", "dry", "dusty", "jagged", "brittle", "glossy", "wooden",
    "stone", "marble", "iron", "woven", "moss", "ivy", "crumbling", "weathered", "gnarled",
    "tangled", "frayed", "carved",
];

pub const SCALE: &[&str] = &[
    "vast", "huge", "enormous", "immense", "tiny", "small", "tall", "towering", "narrow", "wide",
    "broad", "massive", "colossal", "endless", "deep", "high", "low", "long", "little", "great",
    "giant", "slender", "low-ceilinged", "boundless", "sprawling",
];

pub const SPATIAL_PREPOSITIONS: &[&str] = &[
    "above", "below", "beneath", "beyond", "behind", "across", "along", "around", "between",
    "near", "over", "under", "inside", "outside", "within", "against", "among", "through", "upon",
    "beside", "amid", "atop", "toward", "towards", "overhead", "underneath", "opposite",
];

pub const DESCRIPTIVE_VERBS: &[&str] = &[
    "stood", "lay", "stretched", "rose", "hung", "covered", "surrounded", "loomed", "spread",
    "sprawled", "towered", "lined", "framed", "filled", "crowned", "nestled", "wound", "dotted",
    "sat", "stands", "lies", "rises", "hangs", "stretches", "seemed", "appeared", "resembled",
    "wore", "clung", "rested", "reached", "ran", "curled", "drifted", "hovered", "fell",
];

/// Sentence-initial phrases that signal the narration has moved on
pub const NARRATIVE_SHIFT: &[&str] = &[
    "suddenly",
    "then",
    "meanwhile",
    "later",
    "afterwards",
    "after that",
    "at that moment",
    "the next day",
    "the next morning",
    "next morning",
    "just then",
    "all at once",
    "soon after",
    "moments later",
    "hours later",
    "in the end",
];

pub const SPEECH_VERBS: &[&str] = &[
    "said", "asked", "replied", "answered", "whispered", "shouted", "cried", "muttered",
    "exclaimed", "called", "yelled", "murmured", "added", "insisted", "snapped", "demanded",
    "continued", "retorted", "stammered",
];

pub const LOCATION_INDICATORS: &[&str] = &[
    "room", "hall", "house", "castle", "forest", "wood", "woods", "field", "fields", "valley",
    "mountain", "mountains", "hill", "hills", "river", "lake", "sea", "shore", "street", "road",
    "path", "village", "town", "city", "garden", "courtyard", "chamber", "corridor", "tower",
    "bridge", "square", "meadow", "cliff", "cliffs", "cave", "church", "cathedral", "palace",
    "ceiling", "walls", "wall", "floor", "window", "windows", "horizon", "landscape", "plain",
    "desert", "harbor", "harbour", "kitchen", "library", "cellar", "attic", "estate", "ruins",
    "gate", "coast", "island", "marsh", "orchard", "roof", "roofs", "stairs", "staircase",
];

pub const CHARACTER_INDICATORS: &[&str] = &[
    "face", "eyes", "hair", "beard", "brow", "cheeks", "lips", "mouth", "nose", "shoulders",
    "hands", "fingers", "figure", "features", "skin", "complexion", "smile", "gaze", "expression",
    "dressed", "coat", "cloak", "dress", "gown", "man", "woman", "girl", "boy", "stranger",
    "he", "she", "his", "her", "himself", "herself", "forehead", "chin", "voice", "wrinkled",
];

pub const ATMOSPHERE_INDICATORS: &[&str] = &[
    "air", "silence", "mist", "fog", "smell", "scent", "odor", "odour", "stillness", "quiet",
    "calm", "mood", "rain", "wind", "breeze", "cold", "warmth", "chill", "storm", "thunder",
    "eerie", "peaceful", "melancholy", "dread", "heavy", "oppressive", "fragrance", "sound",
    "echo", "echoed", "hush", "damp", "smoke", "frost", "snow",
];

pub const OBJECT_INDICATORS: &[&str] = &[
    "sword", "table", "chair", "box", "chest", "book", "letter", "ring", "lamp", "candle", "clock",
    "mirror", "cup", "goblet", "vase", "painting", "portrait", "carpet", "bed", "key", "knife",
    "bottle", "jar", "basket", "statue", "chandelier", "desk", "shelf", "shelves", "blade", "hilt",
    "crown", "necklace", "carving", "cabinet", "tapestry", "locket", "dagger", "shield",
];

pub const ACTION_INDICATORS: &[&str] = &[
    "ran", "rushed", "leapt", "leaped", "jumped", "struck", "fought", "grabbed", "threw", "raced",
    "charged", "galloped", "swung", "dashed", "climbed", "fled", "chased", "hurled", "crashed",
    "rolled", "sprinted", "lunged", "slammed", "tumbled",
];

pub const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "his", "her", "its", "their", "my", "our",
    "your", "every", "each", "some",
];

pub const SUBORDINATORS: &[&str] = &[
    "which", "that", "where", "while", "whose", "whom", "when", "although", "though", "because",
    "as", "until", "whereas",
];

/// Capitalized words that never start an entity mention
pub const ENTITY_STOPWORDS: &[&str] = &[
    "i", "the", "a", "an", "he", "she", "it", "we", "they", "his", "her", "its", "their", "my",
    "our", "but", "and", "or", "then", "there", "here", "when", "where", "what", "who", "why",
    "how", "this", "that", "these", "those", "in", "on", "at", "of", "to", "for", "with", "as",
    "by", "from", "oh", "yes", "no", "not", "mr", "mrs", "ms", "dr", "sir", "lady", "lord",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ish", "ive", "less", "able", "ible", "ical", "esque", "ened",
];

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ness", "ment", "ity", "ance", "ence", "hood", "ship", "dom", "ure",
];

const NON_ADVERB_LY: &[&str] = &[
    "only", "family", "early", "holy", "lily", "belly", "jelly", "fly", "reply", "supply", "ugly",
    "silly", "daily", "lonely", "lovely", "friendly", "ly",
];

/// Lowercase alphabetic tokens (apostrophes and inner hyphens kept)
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
        .map(|w| w.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn contains(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}

/// Number of tokens found in `list`
pub fn count_hits(tokens: &[String], list: &[&str]) -> usize {
    tokens.iter().filter(|t| contains(list, t)).count()
}

/// Whether any token is in `list`
pub fn any_hit(tokens: &[String], list: &[&str]) -> bool {
    tokens.iter().any(|t| contains(list, t))
}

/// Color, lighting, texture or scale vocabulary
pub fn is_visual(word: &str) -> bool {
    contains(COLOR, word) || contains(LIGHTING, word) || contains(TEXTURE, word) || contains(SCALE, word)
}

/// Adjective by vocabulary or derivational suffix
pub fn is_adjective_like(word: &str) -> bool {
    if is_visual(word) {
        return true;
    }
    word.len() > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s))
}

/// Manner adverb ending in -ly
pub fn is_adverb(word: &str) -> bool {
    word.len() > 4 && word.ends_with("ly") && !contains(NON_ADVERB_LY, word)
}

/// Noun by derivational suffix or concrete indicator vocabulary
pub fn is_noun_like(word: &str) -> bool {
    if contains(LOCATION_INDICATORS, word) || contains(OBJECT_INDICATORS, word) {
        return true;
    }
    word.len() > 4 && NOUN_SUFFIXES.iter().any(|s| word.ends_with(s))
}

/// Indicator vocabulary for a description type
pub fn indicators(description_type: DescriptionType) -> &'static [&'static str] {
    match description_type {
        DescriptionType::Location => LOCATION_INDICATORS,
        DescriptionType::Character => CHARACTER_INDICATORS,
        DescriptionType::Atmosphere => ATMOSPHERE_INDICATORS,
        DescriptionType::Object => OBJECT_INDICATORS,
        DescriptionType::Action => ACTION_INDICATORS,
    }
}

/// Whether the lowercase sentence starts with a narrative-shift phrase
pub fn starts_with_shift(lower: &str) -> bool {
    let trimmed = lower.trim_start_matches(|c: char| !c.is_alphabetic());
    NARRATIVE_SHIFT.iter().any(|phrase| {
        trimmed.starts_with(phrase)
            && trimmed[phrase.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphabetic())
    })
}
