//! Argument extraction from raw (un-normalized) message content.

use crate::text::find_quoted_span;
use crate::text::normalize::{DIGIT_RUN_RE, VIDEO_URL_RE};

/// Arguments pulled out of one message: an optional quoted string, an
/// optional integer, and an optional video URL. Derived per-message, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    /// Content of the first pair of matching quote characters, if any.
    pub string: Option<String>,
    /// First run of digits anywhere in the text. Known quirk: a digit run
    /// inside the quoted string still counts; quoted spans are not excluded.
    pub number: Option<i64>,
    /// First video URL, canonicalized to `http://www.youtube.com/watch?v=<id>`.
    pub url: Option<String>,
}

impl ParsedArguments {
    /// Extract arguments from message content. The transport has already
    /// stripped the bot's self-mention.
    pub fn extract(content: &str) -> Self {
        let string = find_quoted_span(content).map(|(_, inner)| inner.to_string());

        let number = DIGIT_RUN_RE
            .find(content)
            .and_then(|m| m.as_str().parse::<i64>().ok());

        let url = VIDEO_URL_RE.captures(content).map(|caps| {
            let id = caps.get(6).map(|m| m.as_str()).unwrap_or_default();
            format!("http://www.youtube.com/watch?v={id}")
        });

        Self {
            string,
            number,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ParsedArguments;

    #[test]
    fn extracts_quoted_string() {
        let args = ParsedArguments::extract(r#"Eri busca "Bohemian Rhapsody""#);
        assert_eq!(args.string.as_deref(), Some("Bohemian Rhapsody"));
        assert_eq!(args.number, None);
        assert_eq!(args.url, None);
    }

    #[test]
    fn extracts_first_number() {
        let args = ParsedArguments::extract("pon la 3 eri");
        assert_eq!(args.number, Some(3));
        assert_eq!(args.string, None);
    }

    #[test]
    fn extracts_and_canonicalizes_short_url() {
        let args = ParsedArguments::extract("Eri reproduce https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(
            args.url.as_deref(),
            Some("http://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn extracts_watch_and_embed_urls() {
        let args =
            ParsedArguments::extract("mira https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10");
        assert_eq!(
            args.url.as_deref(),
            Some("http://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );

        let args = ParsedArguments::extract("pon youtube.com/embed/dQw4w9WgXcQ");
        assert_eq!(
            args.url.as_deref(),
            Some("http://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn digit_run_inside_quotes_still_counts() {
        // Documented quirk: the number scan does not exclude quoted spans.
        let args = ParsedArguments::extract(r#"busca "Blink 182""#);
        assert_eq!(args.string.as_deref(), Some("Blink 182"));
        assert_eq!(args.number, Some(182));
    }

    #[test]
    fn all_absent_when_nothing_matches() {
        assert_eq!(
            ParsedArguments::extract("hola eri"),
            ParsedArguments::default()
        );
    }

    #[test]
    fn combined_arguments() {
        let args = ParsedArguments::extract(
            r#"eri programa un recordatorio "Comprar leche" en 10 minutos"#,
        );
        assert_eq!(args.string.as_deref(), Some("Comprar leche"));
        assert_eq!(args.number, Some(10));
        assert_eq!(args.url, None);
    }
}
