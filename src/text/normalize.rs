//! Text canonicalization for intent matching.
//!
//! Classification accuracy depends on stripping everything that carries no
//! intent signal: quoted free-form arguments, numbers, the wake word, video
//! URLs, accents, punctuation. The pipeline order is binding; later steps
//! assume earlier removals.

use crate::text::find_quoted_span;
use regex::Regex;
use std::sync::LazyLock;

/// Video URL pattern across the accepted hosting domains and path shapes.
/// Group 6 captures the 11-character video id.
pub(crate) static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%?]{11})",
    )
    .expect("video url pattern is valid")
});

pub(crate) static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// The configurable short name the bot answers to.
///
/// Matching tolerates repeated-letter elongation ("eri", "eriii", "eeerii")
/// when the word appears as a standalone token at the start, end, or interior
/// of the text.
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
    token_re: Regex,
}

impl WakeWord {
    pub fn new(word: &str) -> Self {
        let word = word.to_lowercase();
        let elongated: String = word
            .chars()
            .map(|c| format!("{}+", regex::escape(&c.to_string())))
            .collect();
        let pattern = format!(r"(^{elongated}\s+)|(\s+{elongated}$)|(\s+{elongated}\s+)");
        let token_re = Regex::new(&pattern).expect("wake word pattern is valid");
        Self { word, token_re }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether the given raw text addresses the bot by name. Used by
    /// transports to gate which messages reach the classifier.
    pub fn is_addressed(&self, text: &str) -> bool {
        self.token_re.is_match(&text.to_lowercase())
    }

    /// Remove every standalone wake-word token from already-lowercased text.
    fn strip(&self, text: &str) -> String {
        self.token_re.replace_all(text, "").into_owned()
    }
}

/// Canonicalizes raw message text for nearest-neighbor matching.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    wake: WakeWord,
}

impl TextNormalizer {
    pub fn new(wake: WakeWord) -> Self {
        Self { wake }
    }

    pub fn wake_word(&self) -> &WakeWord {
        &self.wake
    }

    /// Apply the full normalization pipeline. Idempotent: a second pass over
    /// the output is a no-op.
    pub fn normalize(&self, text: &str) -> String {
        let text = ascii_fold(&text.to_lowercase());

        let text = match find_quoted_span(&text) {
            Some((range, _)) => {
                let mut stripped = String::with_capacity(text.len());
                stripped.push_str(&text[..range.start]);
                stripped.push_str(&text[range.end..]);
                stripped
            }
            None => text,
        };

        let text = DIGIT_RUN_RE.replace_all(&text, "");
        let text = self.wake.strip(&text);
        let text = VIDEO_URL_RE.replace_all(&text, "");

        text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
    }
}

/// Fold accented Latin characters to their ASCII base letter. Covers the
/// Latin-1 range the lexicon actually uses; anything else passes through.
/// Inverted question/exclamation marks are dropped outright so a following
/// wake word still sits at a token boundary.
fn ascii_fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => out.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'ñ' => out.push('n'),
            'ç' => out.push('c'),
            '¿' | '¡' => {}
            other => out.push(other),
        }
    }
    out
}
