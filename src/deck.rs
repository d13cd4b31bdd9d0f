use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::shuffle::shuffle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("cannot draw {pairs} distinct images from a pool of {pool_size}")]
    PoolTooSmall { pool_size: usize, pairs: usize },
    #[error("a deck needs at least one pair")]
    NoPairs,
}

/// One image in the asset pool, numbered from 1 like the files on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageId(u16);

impl ImageId {
    pub const fn new(number: u16) -> Self {
        ImageId(number)
    }

    pub fn number(self) -> u16 {
        self.0
    }

    pub fn asset_path(self, config: &GameConfig) -> String {
        format!("{}/{}.{}", config.asset_dir, self.0, config.image_extension)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    Hidden,
    Flipped,
    Matched,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub image: ImageId,
    pub status: CardStatus,
}

impl Card {
    pub fn hidden(image: ImageId) -> Self {
        Card {
            image,
            status: CardStatus::Hidden,
        }
    }

    pub fn is_face_up(&self) -> bool {
        self.status != CardStatus::Hidden
    }

    pub fn is_matched(&self) -> bool {
        self.status == CardStatus::Matched
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Draws `config.pairs` distinct images from the pool, doubles them and
    /// shuffles the result. All cards start face-down.
    pub fn build<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self, DeckError> {
        let images = draw_pairs(config.pool_size, config.pairs, rng)?;
        Ok(Self::from_images(images))
    }

    /// Lays out a deck in the given order without shuffling.
    pub fn from_images(images: impl IntoIterator<Item = ImageId>) -> Self {
        Deck {
            cards: images.into_iter().map(Card::hidden).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn image_counts(&self) -> BTreeMap<ImageId, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(card.image).or_insert(0) += 1;
        }
        counts
    }

    /// True when the deck holds exactly `pairs` distinct images, each twice.
    pub fn is_well_formed(&self, pairs: usize) -> bool {
        let counts = self.image_counts();
        self.cards.len() == pairs * 2 && counts.len() == pairs && counts.values().all(|&n| n == 2)
    }

    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(Card::is_matched)
    }
}

/// Picks `pairs` images uniformly without replacement, duplicates each and
/// shuffles the doubled sequence.
pub fn draw_pairs<R: Rng + ?Sized>(
    pool_size: usize,
    pairs: usize,
    rng: &mut R,
) -> Result<Vec<ImageId>, DeckError> {
    if pairs == 0 {
        return Err(DeckError::NoPairs);
    }
    if pairs > pool_size || pool_size > u16::MAX as usize {
        return Err(DeckError::PoolTooSmall { pool_size, pairs });
    }

    let mut pool: Vec<ImageId> = (1..=pool_size as u16).map(ImageId::new).collect();
    shuffle(&mut pool, rng);
    pool.truncate(pairs);

    let mut doubled: Vec<ImageId> = pool.iter().flat_map(|&image| [image, image]).collect();
    shuffle(&mut doubled, rng);
    Ok(doubled)
}
