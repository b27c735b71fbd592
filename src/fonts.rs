// report-pdf: Font resolution with ordered fallback sources

use crate::config::FontSources;
use crate::error::{FontAttempt, ReportError, Result};
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// Upper bound for a single font download
const MAX_FONT_BYTES: u64 = 32 * 1024 * 1024;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Leading bytes of TrueType, OpenType and collection files
const SFNT_SIGNATURES: [[u8; 4]; 4] = [[0, 1, 0, 0], *b"true", *b"OTTO", *b"ttcf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontVariant {
    Regular,
    Bold,
}

impl fmt::Display for FontVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontVariant::Regular => write!(f, "regular"),
            FontVariant::Bold => write!(f, "bold"),
        }
    }
}

/// Both typefaces the report needs. Rendering never starts without them.
#[derive(Clone)]
pub struct ResolvedFonts {
    pub regular: Vec<u8>,
    pub bold: Vec<u8>,
}

impl fmt::Debug for ResolvedFonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFonts")
            .field("regular_len", &self.regular.len())
            .field("bold_len", &self.bold.len())
            .finish()
    }
}

/// Raw result of fetching one source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fetches a font source. Errors are transport failures (DNS, timeout, missing file).
pub trait FontTransport: Sync {
    fn fetch(&self, source: &str) -> std::result::Result<FetchResponse, String>;
}

// ============================================================================
// Default Transport
// ============================================================================

/// http(s) sources go through ureq, everything else is read from disk.
pub struct SourceTransport {
    agent: ureq::Agent,
}

impl SourceTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build(),
        }
    }
}

impl Default for SourceTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FontTransport for SourceTransport {
    fn fetch(&self, source: &str) -> std::result::Result<FetchResponse, String> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = match self.agent.get(source).call() {
                Ok(response) => response,
                Err(ureq::Error::Status(status, _)) => {
                    return Ok(FetchResponse {
                        status,
                        body: Vec::new(),
                    })
                }
                Err(e) => return Err(format!("Failed to fetch URL: {}", e)),
            };

            let status = response.status();
            let mut body = Vec::new();
            response
                .into_reader()
                .take(MAX_FONT_BYTES)
                .read_to_end(&mut body)
                .map_err(|e| format!("Failed to read response: {}", e))?;
            Ok(FetchResponse { status, body })
        } else {
            let body = std::fs::read(source).map_err(|e| e.to_string())?;
            Ok(FetchResponse { status: 200, body })
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

pub struct FontResolver<T> {
    transport: T,
}

impl<T: FontTransport> FontResolver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Try each source in order; the first valid payload of at least
    /// `min_bytes` wins.
    pub fn resolve(&self, variant: FontVariant, sources: &[String], min_bytes: usize) -> Result<Vec<u8>> {
        let mut attempts = Vec::new();

        for source in sources {
            let outcome = self
                .transport
                .fetch(source)
                .and_then(|response| check_payload(response, min_bytes));

            match outcome {
                Ok(bytes) => {
                    log::info!("Loaded {} font from {} ({} bytes)", variant, source, bytes.len());
                    return Ok(bytes);
                }
                Err(reason) => {
                    log::warn!("{} font source {} failed: {}", variant, source, reason);
                    attempts.push(FontAttempt {
                        source: source.clone(),
                        reason,
                    });
                }
            }
        }

        Err(ReportError::FontUnavailable {
            variant: variant.to_string(),
            attempts,
        })
    }

    /// Resolve both variants; they are independent, so they run side by side.
    pub fn resolve_all(&self, sources: &FontSources) -> Result<ResolvedFonts> {
        std::thread::scope(|scope| {
            let bold = scope.spawn(|| self.resolve(FontVariant::Bold, &sources.bold, sources.min_bytes));
            let regular = self.resolve(FontVariant::Regular, &sources.regular, sources.min_bytes);
            let bold = bold.join().unwrap_or_else(|_| {
                Err(ReportError::FontUnavailable {
                    variant: FontVariant::Bold.to_string(),
                    attempts: vec![FontAttempt {
                        source: "resolver thread".to_string(),
                        reason: "panicked".to_string(),
                    }],
                })
            });

            Ok(ResolvedFonts {
                regular: regular?,
                bold: bold?,
            })
        })
    }
}

fn check_payload(response: FetchResponse, min_bytes: usize) -> std::result::Result<Vec<u8>, String> {
    if !(200..300).contains(&response.status) {
        return Err(format!("HTTP {}", response.status));
    }
    if response.body.len() < min_bytes {
        return Err(format!("payload too small ({} bytes)", response.body.len()));
    }
    let signature = response.body.get(..4).unwrap_or_default();
    if !SFNT_SIGNATURES.iter().any(|s| s == signature) {
        return Err("payload is not a font file".to_string());
    }
    Ok(response.body)
}
