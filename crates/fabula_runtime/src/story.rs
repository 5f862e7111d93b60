//! One loaded story and its turn cycle.
//!
//! A [`Story`] owns the compiled definitions, the world state, and the
//! input matcher. Hosts drive it with three calls: load once, feed
//! player lines to [`Story::command`], and read the messages each call
//! returns. Loading runs every `game` block and then opens turn one;
//! each successful command runs to completion and closes its turn,
//! which clears that turn's registered commands and reruns the `turn`
//! blocks. Failed input produces one message and leaves the turn open.

use std::path::Path;

use fabula_foundation::{Error, Result};
use fabula_language::{
    Cx, Definitions, FileProvider, MemoryProvider, SourceProvider, advance_turn, export_source,
    parse, run_function,
};
use fabula_parser::{Dispatch, MatchConfig, Matcher, Responses};
use fabula_storage::World;

/// Entry name used for single-source stories.
const ENTRY: &str = "story.fab";

/// A compiled, running story.
pub struct Story {
    defs: Definitions,
    world: World,
    matcher: Matcher,
    warnings: Vec<String>,
}

impl Story {
    /// Loads a story from a file, resolving includes relative to its
    /// directory. Seed 0, default matching and wording.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when a source cannot be read, or the first
    /// compile error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let entry = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::io(path.display().to_string(), "not a file name"))?;
        let mut provider = FileProvider::new(root);
        Self::load_with(
            &mut provider,
            entry,
            0,
            MatchConfig::default(),
            Responses::default(),
        )
    }

    /// Loads a story from a single in-memory source.
    ///
    /// # Errors
    ///
    /// Returns the first compile error.
    pub fn load_str(source: &str) -> Result<Self> {
        let mut provider = MemoryProvider::new();
        provider.insert(ENTRY, source);
        Self::load_with(
            &mut provider,
            ENTRY,
            0,
            MatchConfig::default(),
            Responses::default(),
        )
    }

    /// Loads a story with an explicit seed, matching configuration, and
    /// response wording.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when a source cannot be read, or the first
    /// compile error.
    pub fn load_with(
        provider: &mut dyn SourceProvider,
        entry: &str,
        seed: u64,
        config: MatchConfig,
        responses: Responses,
    ) -> Result<Self> {
        let mut world = World::new(seed);
        let (defs, warnings) = parse(provider, entry, &mut world)?;
        let mut cx = Cx {
            defs: &defs,
            world: &mut world,
        };
        for block in &defs.game_blocks {
            run_function(&mut cx, *block, &[]);
        }
        advance_turn(&mut cx);
        Ok(Self {
            defs,
            world,
            matcher: Matcher::new(config, responses),
            warnings,
        })
    }

    /// Runs one line of player input and returns the messages it
    /// produced. A matched command runs to completion and its turn
    /// closes; failed or unmatched input reports one message and the
    /// turn stays open.
    pub fn command(&mut self, input: &str) -> Vec<String> {
        match self.matcher.dispatch(input, &self.defs, &mut self.world) {
            Dispatch::Run { command, args } => {
                if let Some(body) = self.defs.command(command).map(|c| c.body) {
                    let mut cx = Cx {
                        defs: &self.defs,
                        world: &mut self.world,
                    };
                    run_function(&mut cx, body, &args);
                    advance_turn(&mut cx);
                }
            }
            Dispatch::Fail(message) => self.world.say(message),
            Dispatch::NoMatch => {
                let message = self.matcher.responses().no_match.clone();
                self.world.say(message);
            }
        }
        self.world.drain_output()
    }

    /// Closes the current turn without running a command, as the
    /// `tick` intrinsic does, and returns the turn blocks' messages.
    pub fn tick(&mut self) -> Vec<String> {
        let mut cx = Cx {
            defs: &self.defs,
            world: &mut self.world,
        };
        advance_turn(&mut cx);
        self.world.drain_output()
    }

    /// Drains messages produced outside [`Story::command`], such as the
    /// output of `game` blocks and the first turn's init blocks.
    pub fn output(&mut self) -> Vec<String> {
        self.world.drain_output()
    }

    /// Regenerates loadable source text for the current state.
    #[must_use]
    pub fn export(&self) -> String {
        export_source(&self.defs, &self.world)
    }

    /// Writes the regenerated source to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be written.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.export())
            .map_err(|err| Error::io(path.display().to_string(), err.to_string()))
    }

    /// Advisory warnings gathered while compiling.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The live world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for hosts that poke state directly.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The compiled definitions.
    #[must_use]
    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    /// The current turn number. Turn 1 is the first playable turn.
    #[must_use]
    pub fn turn(&self) -> u64 {
        self.world.turn
    }
}
