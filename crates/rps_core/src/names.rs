//! Display names for agents.
//!
//! Each kind draws from its own fixed pool. Once a pool is exhausted the
//! allocator appends a numeric suffix (`Granite-2`, `Granite-3`, ...) to a
//! randomly chosen base name, so names stay unique per kind for the whole
//! session, dead agents included.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;

use crate::kind::Kind;
use crate::rng::{seeded_names, SimRng};

const ROCK_NAMES: &[&str] = &[
    "Boulder", "Granite", "Obsidian", "Flint", "Slate", "Marble", "Basalt", "Quartz", "Pebble",
    "Stone", "Cliff", "Rocky", "Crusher", "Titan", "Golem", "Brick", "Cobble", "Gravel", "Shale",
    "Pumice", "Onyx", "Jade", "Ruby", "Diamond", "Emerald", "Topaz", "Opal", "Amber", "Crystal",
    "Gem", "Spike", "Crag", "Mesa", "Canyon", "Ridge", "Peak", "Summit", "Monolith", "Megalith",
    "Dolmen",
];

const PAPER_NAMES: &[&str] = &[
    "Scroll", "Parchment", "Manuscript", "Document", "Letter", "Note", "Page", "Sheet", "Papyrus",
    "Vellum", "Folio", "Leaflet", "Pamphlet", "Flyer", "Poster", "Banner", "Card", "Ticket",
    "Receipt", "Invoice", "Contract", "Treaty", "Charter", "Deed", "Certificate", "Diploma",
    "License", "Permit", "Warrant", "Writ", "Summons", "Subpoena", "Origami", "Confetti", "Tissue",
    "Napkin", "Towel", "Wrapper", "Envelope", "Label",
];

const SCISSORS_NAMES: &[&str] = &[
    "Blade", "Shear", "Clipper", "Cutter", "Slicer", "Snipper", "Trimmer", "Razor", "Knife",
    "Dagger", "Sword", "Saber", "Scimitar", "Katana", "Rapier", "Cutlass", "Machete", "Cleaver",
    "Scalpel", "Shiv", "Stiletto", "Dirk", "Tanto", "Wakizashi", "Excalibur", "Masamune",
    "Kusanagi", "Durandal", "Joyeuse", "Tyrfing", "Gram", "Naegling", "Snip", "Slash", "Cut",
    "Chop", "Slice", "Dice", "Mince", "Julienne",
];

/// Base name pool for `kind`.
#[must_use]
pub const fn pool(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Rock => ROCK_NAMES,
        Kind::Paper => PAPER_NAMES,
        Kind::Scissors => SCISSORS_NAMES,
    }
}

/// Hands out unique names per kind.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    rng: SimRng,
    used: [BTreeSet<String>; 3],
}

impl NameAllocator {
    /// Create an allocator whose picks derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: seeded_names(seed),
            used: Default::default(),
        }
    }

    /// Allocate a name for a new agent of `kind`.
    pub fn allocate(&mut self, kind: Kind) -> String {
        let pool = pool(kind);
        let used = &mut self.used[kind.index()];

        let available: Vec<&str> = pool
            .iter()
            .copied()
            .filter(|name| !used.contains(*name))
            .collect();

        let name = match available.choose(&mut self.rng) {
            Some(name) => (*name).to_string(),
            None => {
                // Pools are non-empty, so a base is always found
                let base = pool.choose(&mut self.rng).copied().unwrap_or("Agent");
                let mut counter = 2u32;
                while used.contains(&format!("{base}-{counter}")) {
                    counter += 1;
                }
                format!("{base}-{counter}")
            }
        };

        used.insert(name.clone());
        name
    }

    /// Number of names handed out for `kind`.
    #[must_use]
    pub fn allocated(&self, kind: Kind) -> usize {
        self.used[kind.index()].len()
    }
}
