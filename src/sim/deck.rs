//! Deck construction
//!
//! Picks unique icons from the pool, pairs them up and shuffles the board.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::{GRID_MAX, GRID_MIN, IMAGE_COUNT};
use crate::error::SetupError;

/// One entry of the icon pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub id: String,
    pub label: String,
    /// Image reference (path, URL or glyph)
    pub image: String,
}

impl Icon {
    pub fn new(id: impl Into<String>, label: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            image: image.into(),
        }
    }

    /// The identity two cards must share to match
    pub fn pair_key(&self) -> PairKey {
        PairKey(self.id.clone())
    }
}

/// Identity token shared by exactly two cards of a deck
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey(pub String);

/// Read-only list of icons the deck is drawn from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconPool {
    icons: Vec<Icon>,
}

impl Default for IconPool {
    fn default() -> Self {
        Self::numbered(IMAGE_COUNT)
    }
}

impl IconPool {
    pub fn new(icons: Vec<Icon>) -> Self {
        Self { icons }
    }

    /// Numbered card images (`assets/img/cards/{i}.png`)
    pub fn numbered(count: usize) -> Self {
        let icons = (0..count)
            .map(|i| {
                Icon::new(
                    format!("img-{i}"),
                    format!("Image {i}"),
                    format!("assets/img/cards/{i}.png"),
                )
            })
            .collect();
        Self { icons }
    }

    /// Emoji deck
    pub fn emoji() -> Self {
        const EMOJI: [(&str, &str); 18] = [
            ("🐶", "Dog"),
            ("🐱", "Cat"),
            ("🐭", "Mouse"),
            ("🐰", "Bunny"),
            ("🐼", "Panda"),
            ("🐸", "Frog"),
            ("🐵", "Monkey"),
            ("🐔", "Rooster"),
            ("🐤", "Chick"),
            ("🐙", "Octopus"),
            ("🐠", "Fish"),
            ("🐟", "Tropical Fish"),
            ("🐬", "Dolphin"),
            ("🐳", "Whale"),
            ("🌸", "Blossom"),
            ("🌻", "Sunflower"),
            ("🍓", "Strawberry"),
            ("🍉", "Watermelon"),
        ];
        let icons = EMOJI
            .iter()
            .enumerate()
            .map(|(i, (glyph, label))| Icon::new(format!("emoji-{}", i + 1), *label, *glyph))
            .collect();
        Self { icons }
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

/// A validated board size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub columns: u32,
}

impl GridSize {
    /// Total number of cells (also the best-score key)
    pub fn slots(&self) -> u32 {
        self.rows * self.columns
    }

    pub fn pairs(&self) -> u32 {
        self.slots() / 2
    }

    pub fn has_filler(&self) -> bool {
        self.slots() % 2 != 0
    }
}

/// Check the grid against the allowed range and the icon pool size
pub fn validate_grid(rows: u32, columns: u32, available: usize) -> Result<GridSize, SetupError> {
    let range = GRID_MIN..=GRID_MAX;
    if !range.contains(&rows) || !range.contains(&columns) {
        return Err(SetupError::GridOutOfRange { rows, columns });
    }
    let grid = GridSize { rows, columns };
    let needed = grid.pairs() as usize;
    if needed < 1 {
        return Err(SetupError::NoPairs { rows, columns });
    }
    if needed > available {
        return Err(SetupError::NotEnoughIcons { needed, available });
    }
    Ok(grid)
}

/// A cell of the built deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckSlot {
    Card(Icon),
    /// Placeholder for the odd cell; never selectable
    Filler,
}

impl DeckSlot {
    pub fn pair_key(&self) -> Option<PairKey> {
        match self {
            DeckSlot::Card(icon) => Some(icon.pair_key()),
            DeckSlot::Filler => None,
        }
    }
}

/// Return a uniformly shuffled copy of `items`
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy
}

/// Build a shuffled, paired deck for the given grid
pub fn build_deck<R: Rng + ?Sized>(
    rows: u32,
    columns: u32,
    pool: &IconPool,
    rng: &mut R,
) -> Result<Vec<DeckSlot>, SetupError> {
    let grid = validate_grid(rows, columns, pool.len())?;
    let pairs = grid.pairs() as usize;

    let mut picked = shuffle(pool.icons(), rng);
    picked.truncate(pairs);

    let mut deck = Vec::with_capacity(grid.slots() as usize);
    for icon in picked {
        deck.push(DeckSlot::Card(icon.clone()));
        deck.push(DeckSlot::Card(icon));
    }
    if grid.has_filler() {
        deck.push(DeckSlot::Filler);
    }

    deck.shuffle(rng);
    log::debug!(
        "Built {}x{} deck: {} pairs{}",
        rows,
        columns,
        pairs,
        if grid.has_filler() { " + filler" } else { "" }
    );
    Ok(deck)
}
