//! Command triggers compiled to anchored patterns.
//!
//! A trigger like `"turn on {$x: Item}"` splits into literal words and
//! placeholders. Words are lowercased and escaped; placeholders become
//! lazy capture groups; the pieces are joined by whitespace runs and
//! anchored at both ends. Zero-placeholder triggers skip the regex
//! entirely and compare against the normalized literal.
//!
//! Functions here report failures as bare messages; the parser owns
//! positions and wraps them.

use regex::Regex;

use crate::defs::Param;

/// Lowercases and collapses runs of whitespace to single spaces.
#[must_use]
pub fn normalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A syntactic piece of a trigger string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerPiece {
    /// Literal text between placeholders; may hold several words.
    Literal(String),
    /// The text between `{` and `}`, still to be parsed as `$name: Type`.
    Placeholder(String),
}

/// Splits a trigger into literals and placeholders. Placeholders do
/// not nest.
///
/// # Errors
///
/// Returns a message when a `{` is never closed or a stray `}` appears.
pub fn split_trigger(source: &str) -> Result<Vec<TriggerPiece>, String> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if !literal.is_empty() {
                    pieces.push(TriggerPiece::Literal(std::mem::take(&mut literal)));
                }
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err("parameters in a command trigger do not nest".to_string());
                        }
                        Some(c) => inner.push(c),
                        None => {
                            return Err(
                                "unterminated parameter in command trigger".to_string()
                            );
                        }
                    }
                }
                pieces.push(TriggerPiece::Placeholder(inner));
            }
            '}' => return Err("unmatched `}` in command trigger".to_string()),
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        pieces.push(TriggerPiece::Literal(literal));
    }
    Ok(pieces)
}

/// One token of the pattern under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// A single lowercased literal word.
    Word(String),
    /// A placeholder capture.
    Capture,
}

/// A trigger ready for dispatch.
#[derive(Clone, Debug)]
pub struct CompiledTrigger {
    /// The author's trigger text, kept for the serializer.
    pub source: String,
    pub regex: Regex,
    /// Set for zero-placeholder triggers: the normalized literal the
    /// whole input must equal.
    pub exact: Option<String>,
    pub params: Vec<Param>,
}

impl CompiledTrigger {
    /// Builds the pattern from prepared segments. `params` must have
    /// one entry per [`Segment::Capture`], in order.
    ///
    /// # Errors
    ///
    /// Returns a message when the assembled pattern fails to compile.
    pub fn assemble(
        source: &str,
        segments: &[Segment],
        params: Vec<Param>,
    ) -> Result<Self, String> {
        let mut parts = Vec::with_capacity(segments.len());
        let mut words = Vec::new();
        for segment in segments {
            match segment {
                Segment::Word(word) => {
                    parts.push(regex::escape(word));
                    words.push(word.clone());
                }
                Segment::Capture => parts.push("(.+?)".to_string()),
            }
        }
        let pattern = format!("^{}$", parts.join(r"\s+"));
        let regex = Regex::new(&pattern)
            .map_err(|e| format!("cannot compile command trigger: {e}"))?;
        let exact = if params.is_empty() {
            Some(words.join(" "))
        } else {
            None
        };
        Ok(Self {
            source: source.to_string(),
            regex,
            exact,
            params,
        })
    }

    /// Matches already-normalized input. Returns the placeholder
    /// captures in order, empty for an exact-literal hit.
    #[must_use]
    pub fn match_input(&self, input: &str) -> Option<Vec<String>> {
        if let Some(exact) = &self.exact {
            return (input == exact).then(Vec::new);
        }
        let caps = self.regex.captures(input)?;
        let mut out = Vec::with_capacity(self.params.len());
        for i in 1..=self.params.len() {
            out.push(caps.get(i).map_or_else(String::new, |m| m.as_str().to_string()));
        }
        Some(out)
    }
}
