//! Per-turn noun index for item resolution.
//!
//! Each item contributes one entry derived from its display name: a
//! noun (the last content word, or the first under `noun_first`) plus
//! the remaining words as adjectives. Entries sharing a noun form a
//! singly-linked chain in declaration order, so ambiguity reports list
//! candidates the way the author wrote them down. The index is rebuilt
//! lazily on first use each turn, because scripts can rename items
//! mid-turn through the `name` property.

#![allow(clippy::cast_possible_truncation)]

use std::collections::{HashMap, HashSet};

use fabula_foundation::ItemId;
use fabula_storage::World;

use crate::input::{MatchConfig, content_words};

/// One item's words, threaded into its noun's chain.
#[derive(Clone, Debug)]
struct WordEntry {
    item: ItemId,
    adjectives: HashSet<String>,
    next: Option<usize>,
}

/// Outcome of resolving a noun phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one item fits the phrase.
    Unique(ItemId),
    /// No item owns the noun, or none carries all the adjectives.
    NotFound,
    /// Several items fit; candidates in declaration order.
    Ambiguous(Vec<ItemId>),
}

/// Noun-to-candidate index, valid for a single turn.
#[derive(Clone, Debug, Default)]
pub struct WordMap {
    entries: Vec<WordEntry>,
    heads: HashMap<String, usize>,
    built_turn: Option<u64>,
}

impl WordMap {
    /// Creates an empty index. The first resolve builds it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a noun phrase such as "red ball" to an item. Candidates
    /// share the phrase's noun and carry every adjective the phrase
    /// names; extra adjectives on the item are fine.
    pub fn resolve(&mut self, phrase: &str, world: &World, config: &MatchConfig) -> Resolution {
        self.ensure_built(world, config);
        let words = content_words(phrase, config);
        let Some((noun, adjectives)) = split_phrase(&words, config) else {
            return Resolution::NotFound;
        };
        let mut candidates = Vec::new();
        let mut cursor = self.heads.get(noun).copied();
        while let Some(index) = cursor {
            let entry = &self.entries[index];
            if adjectives.iter().all(|adj| entry.adjectives.contains(adj.as_str())) {
                candidates.push(entry.item);
            }
            cursor = entry.next;
        }
        match candidates.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Unique(candidates[0]),
            _ => Resolution::Ambiguous(candidates),
        }
    }

    /// Rebuilds the index when the cached copy belongs to an earlier
    /// turn. Items whose display name is all stop words get no entry.
    fn ensure_built(&mut self, world: &World, config: &MatchConfig) {
        if self.built_turn == Some(world.turn) {
            return;
        }
        self.entries.clear();
        self.heads.clear();
        let mut tails: HashMap<String, usize> = HashMap::new();
        for raw in 1..world.items.len() {
            let item = ItemId::from_raw(raw as u32);
            let words = content_words(world.display_name(item), config);
            let Some((noun, adjectives)) = split_phrase(&words, config) else {
                continue;
            };
            let index = self.entries.len();
            self.entries.push(WordEntry {
                item,
                adjectives: adjectives.iter().cloned().collect(),
                next: None,
            });
            match tails.insert(noun.to_string(), index) {
                Some(prev) => self.entries[prev].next = Some(index),
                None => {
                    self.heads.insert(noun.to_string(), index);
                }
            }
        }
        self.built_turn = Some(world.turn);
    }
}

/// Splits content words into the noun and its adjectives.
fn split_phrase<'a>(
    words: &'a [String],
    config: &MatchConfig,
) -> Option<(&'a str, &'a [String])> {
    let (noun, adjectives) = if config.noun_first {
        words.split_first()?
    } else {
        words.split_last()?
    };
    Some((noun.as_str(), adjectives))
}
