//! Command dispatch and typed argument conversion.
//!
//! Normalized input runs against every eligible trigger in declaration
//! order: top-level commands first, then commands registered during
//! the current turn, in registration order. The first trigger that
//! matches owns the input. Its captures convert positionally into the
//! declared parameter values; a capture that fails to convert fails
//! the whole command, and later triggers are not consulted.
//!
//! Compiled triggers only fold case and whitespace; the stop-word list
//! and punctuation rules live here. Each trigger is therefore re-built
//! under the matcher's own configuration before its first scan, so
//! `"read the walls"` and the input `read walls` meet on equal terms.

#![allow(clippy::cast_possible_truncation)]

use fabula_foundation::{CommandId, TypeId, Value};
use fabula_language::Definitions;
use fabula_language::command::{CompiledTrigger, Segment, TriggerPiece, split_trigger};
use fabula_storage::World;

use crate::input::{MatchConfig, content_words, normalize};
use crate::responses::{Responses, fill};
use crate::wordmap::{Resolution, WordMap};

/// Where one line of input ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A trigger matched and every argument converted.
    Run {
        /// The winning command.
        command: CommandId,
        /// One value per declared parameter, in order.
        args: Vec<Value>,
    },
    /// A trigger matched but an argument did not convert; the message
    /// is ready to show the player.
    Fail(String),
    /// No trigger matched.
    NoMatch,
}

/// A trigger re-resolved under one matcher's configuration, remembered
/// with the author text it was built from.
#[derive(Clone, Debug)]
struct ScanEntry {
    source: String,
    trigger: CompiledTrigger,
}

/// Per-command scan patterns, filled lazily on first use.
#[derive(Clone, Debug, Default)]
struct ScanCache {
    entries: Vec<Option<ScanEntry>>,
}

impl ScanCache {
    /// The scan pattern for one command, rebuilt when the stored source
    /// no longer matches the compiled trigger's.
    fn pattern<'a>(
        &'a mut self,
        id: CommandId,
        compiled: &'a CompiledTrigger,
        config: &MatchConfig,
    ) -> &'a CompiledTrigger {
        let index = id.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        let stale = match &self.entries[index] {
            Some(entry) => entry.source != compiled.source,
            None => true,
        };
        if stale {
            self.entries[index] = Some(ScanEntry {
                source: compiled.source.clone(),
                trigger: refilter(compiled, config),
            });
        }
        self.entries[index]
            .as_ref()
            .map_or(compiled, |entry| &entry.trigger)
    }
}

/// Rebuilds a trigger with the configured stop words and punctuation
/// removed from its literal words, mirroring input normalization.
fn refilter(compiled: &CompiledTrigger, config: &MatchConfig) -> CompiledTrigger {
    let Ok(pieces) = split_trigger(&compiled.source) else {
        return compiled.clone();
    };
    let mut segments = Vec::new();
    for piece in &pieces {
        match piece {
            TriggerPiece::Literal(text) => {
                for word in content_words(text, config) {
                    segments.push(Segment::Word(word));
                }
            }
            TriggerPiece::Placeholder(_) => segments.push(Segment::Capture),
        }
    }
    CompiledTrigger::assemble(&compiled.source, &segments, compiled.params.clone())
        .unwrap_or_else(|_| compiled.clone())
}

/// Matches player input against compiled command triggers.
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    config: MatchConfig,
    responses: Responses,
    words: WordMap,
    scan: ScanCache,
}

impl Matcher {
    /// Creates a matcher with the given normalization and wording.
    #[must_use]
    pub fn new(config: MatchConfig, responses: Responses) -> Self {
        Self {
            config,
            responses,
            words: WordMap::new(),
            scan: ScanCache::default(),
        }
    }

    /// The active normalization settings.
    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// The active message templates.
    #[must_use]
    pub fn responses(&self) -> &Responses {
        &self.responses
    }

    /// Runs one line of raw input against the eligible triggers.
    pub fn dispatch(&mut self, raw: &str, defs: &Definitions, world: &mut World) -> Dispatch {
        let input = normalize(raw, &self.config);
        if input.is_empty() {
            return Dispatch::NoMatch;
        }
        let mut order: Vec<CommandId> = Vec::new();
        for (index, command) in defs.commands.iter().enumerate() {
            if command.top_level {
                order.push(CommandId::from_raw(index as u32));
            }
        }
        order.extend(world.registered_commands.iter().copied());

        for id in order {
            let Some(command) = defs.command(id) else {
                continue;
            };
            let Some(captures) = self
                .scan
                .pattern(id, &command.trigger, &self.config)
                .match_input(&input)
            else {
                continue;
            };
            let mut args = Vec::with_capacity(captures.len());
            for (capture, param) in captures.iter().zip(&command.trigger.params) {
                match self.convert(capture, param.ty, world) {
                    Ok(value) => args.push(value),
                    Err(message) => return Dispatch::Fail(message),
                }
            }
            return Dispatch::Run { command: id, args };
        }
        Dispatch::NoMatch
    }

    /// Converts one capture to its parameter's type.
    fn convert(&mut self, text: &str, ty: TypeId, world: &mut World) -> Result<Value, String> {
        if world.types.is_enum(ty) {
            return world
                .types
                .enum_ordinal_ci(ty, text)
                .map(Value::new)
                .ok_or_else(|| fill(&self.responses.bad_value, text));
        }
        if ty == TypeId::ITEM {
            self.resolve_item(text, world)
        } else if ty == TypeId::STRING {
            Ok(world.interner.intern(text).to_value())
        } else if ty == TypeId::INT {
            text.parse::<i64>()
                .map(Value::new)
                .map_err(|_| fill(&self.responses.bad_value, text))
        } else if ty == TypeId::BOOL {
            match text {
                "false" | "no" | "0" => Ok(Value::FALSE),
                "true" | "yes" | "1" => Ok(Value::TRUE),
                _ => Err(fill(&self.responses.bad_value, text)),
            }
        } else {
            Err(fill(&self.responses.bad_value, text))
        }
    }

    fn resolve_item(&mut self, text: &str, world: &World) -> Result<Value, String> {
        match self.words.resolve(text, world, &self.config) {
            Resolution::Unique(item) => Ok(item.to_value()),
            Resolution::NotFound => Err(fill(&self.responses.cant_find, text)),
            Resolution::Ambiguous(items) => {
                let names: Vec<&str> =
                    items.iter().map(|&item| world.display_name(item)).collect();
                Err(fill(&self.responses.which, &names.join(", ")))
            }
        }
    }
}
