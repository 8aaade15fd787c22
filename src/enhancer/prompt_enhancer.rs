//! Prompt Enhancer - rule-based enhancement logic
//!
//! Inspects a raw interior-design prompt, detects which design attributes
//! are missing and appends default clauses for them:
//! - room type (inferred from sleep / cooking / work hints)
//! - style (inferred from cozy / clean / luxury hints)
//! - materials, lighting, camera perspective
//! - fixed quality boosters

use std::sync::{Arc, LazyLock};

use rand::Rng;
use regex::Regex;

use super::tables::{mentions_any, KnowledgeTables};

/// Words that signal the user already named some kind of space
pub const GENERIC_SPACE_WORDS: &[&str] = &["room", "space", "area"];

/// Room hint groups, checked in order; the first group with a hit wins
pub const ROOM_HINTS: &[(&[&str], &str)] = &[
    (&["sleep", "bed", "rest", "night"], "bedroom"),
    (&["cook", "dining", "eat", "food"], "kitchen"),
    (&["work", "desk", "study"], "home office"),
];

/// Room clause used when no hint group matches
pub const FALLBACK_ROOM: &str = "living space";

/// Words that signal the user is already describing a style loosely
pub const STYLE_INDICATORS: &[&str] = &["modern", "contemporary", "style", "design", "aesthetic"];

/// Style hint groups, checked in order; the first group with a hit wins
pub const STYLE_HINTS: &[(&[&str], &str)] = &[
    (&["cozy", "warm", "natural", "wood"], "with a rustic style"),
    (
        &["clean", "simple", "uncluttered"],
        "with a minimalist style",
    ),
    (
        &["luxury", "elegant", "sophisticated"],
        "with an elegant style",
    ),
];

pub const MATERIALS_CLAUSE: &str = "with quality materials";
pub const LIGHTING_CLAUSE: &str = "with beautiful lighting";

/// Words that signal a camera position is already given
pub const PERSPECTIVE_WORDS: &[&str] = &["view", "angle", "perspective", "looking"];

/// Camera positions, one is drawn at random when none is given
pub const PERSPECTIVES: [&str; 4] = [
    "wide-angle view",
    "corner perspective",
    "viewed from the doorway",
    "looking toward the windows",
];

/// Closing clause appended to every prompt
pub const QUALITY_BOOSTERS: &str = "High quality interior design, professional photography, interior design magazine, detailed textures, 8k resolution";

const CLAUSE_SEPARATOR: &str = ". ";

static PERIOD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

fn contains_any_word(lowered: &str, words: &[&str]) -> bool {
    words.iter().any(|word| lowered.contains(word))
}

fn first_matching_hint(lowered: &str, groups: &[(&[&str], &'static str)]) -> Option<&'static str> {
    groups
        .iter()
        .find(|(words, _)| contains_any_word(lowered, words))
        .map(|(_, clause)| *clause)
}

/// Room clause to append, if any
pub fn infer_room_type(lowered: &str, tables: &KnowledgeTables) -> Option<&'static str> {
    if mentions_any(lowered, &tables.room_types) {
        return None;
    }
    if contains_any_word(lowered, GENERIC_SPACE_WORDS) {
        return None;
    }
    Some(first_matching_hint(lowered, ROOM_HINTS).unwrap_or(FALLBACK_ROOM))
}

/// Style clause to append, if any. `None` also when no hint matches.
pub fn infer_style(lowered: &str, tables: &KnowledgeTables) -> Option<&'static str> {
    if mentions_any(lowered, &tables.styles) {
        return None;
    }
    if contains_any_word(lowered, STYLE_INDICATORS) {
        return None;
    }
    first_matching_hint(lowered, STYLE_HINTS)
}

pub fn needs_materials(lowered: &str, tables: &KnowledgeTables) -> bool {
    !mentions_any(lowered, &tables.materials) && !lowered.contains("material")
}

// "light" also matches "lighter", "flashlight" and the like.
pub fn needs_lighting(lowered: &str, tables: &KnowledgeTables) -> bool {
    !mentions_any(lowered, &tables.lighting) && !lowered.contains("light")
}

pub fn needs_perspective(lowered: &str) -> bool {
    !contains_any_word(lowered, PERSPECTIVE_WORDS)
}

/// Draw one perspective phrase uniformly
pub fn pick_perspective<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PERSPECTIVES[rng.gen_range(0..PERSPECTIVES.len())]
}

/// Join clauses with ". " and collapse runs of periods
pub fn join_clauses(parts: &[&str]) -> String {
    let joined = parts.join(CLAUSE_SEPARATOR);
    PERIOD_RUN.replace_all(&joined, ".").into_owned()
}

/// Enhance a raw prompt against the given tables.
///
/// Every check runs against the lower-cased raw prompt. The only
/// non-deterministic step is the perspective draw from `rng`.
pub fn enhance_prompt<R: Rng + ?Sized>(
    raw_prompt: &str,
    tables: &KnowledgeTables,
    rng: &mut R,
) -> String {
    let lowered = raw_prompt.to_lowercase();
    let mut parts: Vec<&str> = vec![lowered.as_str()];

    if let Some(room) = infer_room_type(&lowered, tables) {
        parts.push(room);
    }

    if let Some(style) = infer_style(&lowered, tables) {
        parts.push(style);
    }

    if needs_materials(&lowered, tables) {
        parts.push(MATERIALS_CLAUSE);
    }

    if needs_lighting(&lowered, tables) {
        parts.push(LIGHTING_CLAUSE);
    }

    if needs_perspective(&lowered) {
        parts.push(pick_perspective(rng));
    }

    parts.push(QUALITY_BOOSTERS);

    join_clauses(&parts)
}

/// Prompt Enhancer bound to a set of knowledge tables
#[derive(Debug, Clone)]
pub struct PromptEnhancer {
    tables: Arc<KnowledgeTables>,
}

impl PromptEnhancer {
    /// Create an enhancer over the given tables
    pub fn new(tables: Arc<KnowledgeTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &Arc<KnowledgeTables> {
        &self.tables
    }

    /// Enhance using the thread-local generator for the perspective draw
    pub fn enhance(&self, raw_prompt: &str) -> String {
        self.enhance_with_rng(raw_prompt, &mut rand::thread_rng())
    }

    /// Enhance with an explicit generator, for reproducible output
    pub fn enhance_with_rng<R: Rng + ?Sized>(&self, raw_prompt: &str, rng: &mut R) -> String {
        enhance_prompt(raw_prompt, &self.tables, rng)
    }
}

impl Default for PromptEnhancer {
    fn default() -> Self {
        Self::new(KnowledgeTables::shared())
    }
}
