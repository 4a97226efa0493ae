//! Speech synthesis.
//!
//! [`SpeechSynthesizer`] is the seam between the batch runner and whatever
//! service turns text into audio. [`GoogleTts`] talks to the Google Translate
//! speech endpoint (the same RPC the Python `gTTS` package uses) and returns
//! MP3 bytes.

use std::future::Future;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{REFERER, USER_AGENT};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::SynthesisError;

/// Default host for the Google Translate speech RPC.
pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com";

/// Longest piece of text the endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 100;

const BATCHEXECUTE_PATH: &str = "/_/TranslateWebserverUi/data/batchexecute";
const RPC_ID: &str = "jQ1olc";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";
const REFERER_URL: &str = "http://translate.google.com/";

/// Language codes the Google Translate voice accepts, in the casing the
/// endpoint expects.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et",
    "eu", "fi", "fr", "fr-CA", "gl", "gu", "ha", "hi", "hr", "hu", "id", "is", "it", "iw", "ja",
    "jw", "km", "kn", "ko", "la", "lt", "lv", "ml", "mr", "ms", "my", "ne", "nl", "no", "pa",
    "pl", "pt", "pt-PT", "ro", "ru", "si", "sk", "sq", "sr", "su", "sv", "sw", "ta", "te", "th",
    "tl", "tr", "uk", "ur", "vi", "yue", "zh", "zh-CN", "zh-TW",
];

/// Retired regional codes and the code each one is sent as.
const DEPRECATED_LANGUAGES: &[(&str, &str)] = &[
    ("en-au", "en"),
    ("en-ca", "en"),
    ("en-gb", "en"),
    ("en-gh", "en"),
    ("en-ie", "en"),
    ("en-in", "en"),
    ("en-ng", "en"),
    ("en-nz", "en"),
    ("en-ph", "en"),
    ("en-tz", "en"),
    ("en-uk", "en"),
    ("en-us", "en"),
    ("en-za", "en"),
    ("es-es", "es"),
    ("es-us", "es"),
    ("fr-fr", "fr"),
    ("pt-br", "pt"),
];

/// Maps `code` to the form sent to the endpoint.
///
/// Matching ignores case, and retired regional codes fall back to their
/// base language (`en-us` becomes `en`, `zh-cn` becomes `zh-CN`). Returns
/// `None` for codes outside [`SUPPORTED_LANGUAGES`].
pub fn resolve_language(code: &str) -> Option<&'static str> {
    let code = DEPRECATED_LANGUAGES
        .iter()
        .find(|(old, _)| old.eq_ignore_ascii_case(code))
        .map_or(code, |(_, fallback)| *fallback);
    SUPPORTED_LANGUAGES
        .iter()
        .find(|supported| supported.eq_ignore_ascii_case(code))
        .copied()
}

/// Returns `true` if `code` resolves to a supported language.
pub fn is_supported_language(code: &str) -> bool {
    resolve_language(code).is_some()
}

/// A service that converts text into encoded audio.
///
/// ## Examples
///
/// ```
/// use narrate_lib::{SpeechSynthesizer, SynthesisError};
///
/// struct Silence;
///
/// impl SpeechSynthesizer for Silence {
///     async fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>, SynthesisError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` in `language` and returns the encoded audio.
    ///
    /// ## Errors
    ///
    /// Returns a [`SynthesisError`] describing why the provider could not
    /// produce audio.
    fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> impl Future<Output = Result<Vec<u8>, SynthesisError>> + Send;
}

/// Synthesizes `text` and writes the audio to `output`, replacing any
/// existing file. Missing parent directories are created.
pub async fn synthesize_to_file<S: SpeechSynthesizer>(
    synthesizer: &S,
    text: &str,
    language: &str,
    output: &Path,
) -> Result<PathBuf, SynthesisError> {
    let audio = synthesizer.synthesize(text, language).await?;

    let write_err = |source| SynthesisError::Write {
        path: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(output, &audio).await.map_err(write_err)?;

    info!(path = %output.display(), bytes = audio.len(), "generated voice track");
    Ok(output.to_path_buf())
}

/// Google Translate text-to-speech provider.
///
/// Long text is split into chunks of at most [`MAX_CHUNK_CHARS`] characters;
/// each chunk is one request and the MP3 payloads are concatenated in order.
///
/// ## Examples
///
/// ```no_run
/// use narrate_lib::{GoogleTts, SpeechSynthesizer};
///
/// # async fn example() -> Result<(), narrate_lib::SynthesisError> {
/// let tts = GoogleTts::new();
/// let mp3 = tts.synthesize("Buna dimineata", "ro").await?;
/// std::fs::write("greeting.mp3", mp3).unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: Client,
    endpoint: String,
    check_language: bool,
}

impl Default for GoogleTts {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTts {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            check_language: true,
        }
    }

    /// Points the provider at a different host, e.g. a regional domain or a
    /// mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Enables or disables the local language table check.
    ///
    /// With the check off, unknown codes are sent as-is and the provider
    /// decides.
    #[must_use]
    pub fn with_language_check(mut self, enabled: bool) -> Self {
        self.check_language = enabled;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_chunk(&self, chunk: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}{BATCHEXECUTE_PATH}", self.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(REFERER, REFERER_URL)
            .form(&[("f.req", package_rpc(chunk, language))])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        extract_audio(&body)
    }
}

impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        let language = match resolve_language(language) {
            Some(resolved) => {
                if resolved != language {
                    debug!(requested = language, resolved, "normalized language code");
                }
                resolved
            }
            None if self.check_language => {
                return Err(SynthesisError::UnsupportedLanguage {
                    language: language.to_string(),
                });
            }
            None => language,
        };

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                chunk = idx + 1,
                chunks = chunks.len(),
                language,
                chars = chunk.chars().count(),
                "requesting speech"
            );
            audio.extend(self.request_chunk(chunk, language).await?);
        }
        Ok(audio)
    }
}

/// Builds the `f.req` payload for one chunk.
fn package_rpc(text: &str, language: &str) -> String {
    let parameter = json!([text, language, null, "null"]).to_string();
    json!([[[RPC_ID, parameter, null, "generic"]]]).to_string()
}

/// Pulls the base64 audio out of a batchexecute response.
///
/// The body is a sequence of length-prefixed JSON lines; the one we want
/// contains an entry `["wrb.fr", "jQ1olc", "[\"<base64>\"]", ...]`.
fn extract_audio(body: &str) -> Result<Vec<u8>, SynthesisError> {
    for line in body.lines().map(str::trim) {
        if !line.starts_with('[') || !line.contains(RPC_ID) {
            continue;
        }
        let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        for entry in entries.iter().filter_map(Value::as_array) {
            if entry.get(1).and_then(Value::as_str) != Some(RPC_ID) {
                continue;
            }
            let Some(payload) = entry.get(2).and_then(Value::as_str) else {
                continue;
            };
            let Ok(Value::Array(parts)) = serde_json::from_str::<Value>(payload) else {
                continue;
            };
            if let Some(encoded) = parts.first().and_then(Value::as_str) {
                return Ok(STANDARD.decode(encoded)?);
            }
        }
    }
    Err(SynthesisError::NoAudio)
}

/// Marks that always end a clause.
const CLAUSE_MARKS: &[char] = &['?', '!', ';', '…', '。', '！', '？', '；', '、', '，', '：'];

/// Marks that end a clause only when followed by whitespace, so `3.14`,
/// `10:30` and `1,000` stay whole.
const SPACED_CLAUSE_MARKS: &[char] = &['.', ',', ':'];

/// Splits `text` into whitespace-normalized chunks of at most `max_chars`
/// characters.
///
/// Text is first cut after sentence and clause punctuation. Clauses longer
/// than `max_chars` are packed word by word, and words longer than the limit
/// are hard-split. Clauses with no letters or digits are dropped, so
/// punctuation-only text yields no chunks.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    split_clauses(text)
        .into_iter()
        .filter(|clause| clause.chars().any(char::is_alphanumeric))
        .flat_map(|clause| pack_words(clause, max_chars))
        .collect()
}

fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let ends_clause = CLAUSE_MARKS.contains(&c)
            || (SPACED_CLAUSE_MARKS.contains(&c)
                && chars.peek().is_none_or(|(_, next)| next.is_whitespace()));
        if ends_clause {
            let end = idx + c.len_utf8();
            clauses.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        clauses.push(&text[start..]);
    }
    clauses
}

fn pack_words(clause: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in clause.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
