//! Multi-deck shoe with a draw stack, discard pile and cut-card penetration.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{Card, Error};

pub const CARDS_PER_DECK: usize = 52;
pub const MAX_DECKS: u8 = 8;

#[derive(Debug, Clone)]
pub struct Shoe {
    num_decks: u8,
    penetration: f64,
    /// Top of the shoe is the end of the vector.
    cards: Vec<Card>,
    discard: Vec<Card>,
    total: usize,
    shuffle_point: usize,
    generation: u64,
    rng: ChaCha8Rng,
}

impl Shoe {
    pub fn new(num_decks: u8, penetration: f64) -> Result<Self, Error> {
        Self::build(num_decks, penetration, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(num_decks: u8, penetration: f64, seed: u64) -> Result<Self, Error> {
        Self::build(num_decks, penetration, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Shoe made of an arbitrary card list, for drills. The list is shuffled.
    pub fn from_cards(cards: Vec<Card>, penetration: f64, seed: u64) -> Result<Self, Error> {
        validate_penetration(penetration)?;
        let total = cards.len();
        let mut shoe = Self {
            num_decks: total.div_ceil(CARDS_PER_DECK) as u8,
            penetration,
            cards,
            discard: Vec::new(),
            total,
            shuffle_point: shuffle_point(total, penetration),
            generation: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        shoe.shuffle();
        Ok(shoe)
    }

    fn build(num_decks: u8, penetration: f64, rng: ChaCha8Rng) -> Result<Self, Error> {
        if num_decks == 0 || num_decks > MAX_DECKS {
            return Err(Error::InvalidShoe(format!(
                "deck count must be between 1 and {MAX_DECKS}, got {num_decks}"
            )));
        }
        validate_penetration(penetration)?;

        let mut cards = Vec::with_capacity(CARDS_PER_DECK * num_decks as usize);
        for _ in 0..num_decks {
            cards.extend(Card::deck());
        }
        let total = cards.len();
        let mut shoe = Self {
            num_decks,
            penetration,
            cards,
            discard: Vec::new(),
            total,
            shuffle_point: shuffle_point(total, penetration),
            generation: 0,
            rng,
        };
        shoe.shuffle();
        Ok(shoe)
    }

    /// Recombines the discard pile with the draw stack and shuffles once.
    pub fn shuffle(&mut self) {
        self.cards.append(&mut self.discard);
        self.cards.shuffle(&mut self.rng);
        self.generation += 1;
        log::debug!(
            "shoe shuffled: {} cards, shuffle point {}, generation {}",
            self.cards.len(),
            self.shuffle_point,
            self.generation
        );
    }

    pub fn draw(&mut self) -> Result<Card, Error> {
        if self.cards.is_empty() {
            log::warn!("draw stack empty, forcing reshuffle");
            self.shuffle();
        }
        let card = self.cards.pop().ok_or(Error::ShoeExhausted)?;
        self.discard.push(card);
        Ok(card)
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.cards.len() <= self.shuffle_point
    }

    /// Moves `next` to the top of the draw stack so they come out in order.
    pub fn stack_next(&mut self, next: &[Card]) -> Result<(), Error> {
        let mut pulled = Vec::with_capacity(next.len());
        for card in next {
            if let Some(pos) = self.cards.iter().position(|c| c == card) {
                pulled.push(self.cards.remove(pos));
            } else if let Some(pos) = self.discard.iter().position(|c| c == card) {
                pulled.push(self.discard.remove(pos));
            } else {
                // put back what was already pulled before failing
                self.cards.extend(pulled);
                return Err(Error::CardNotInShoe(*card));
            }
        }
        self.cards.extend(pulled.into_iter().rev());
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn discarded(&self) -> usize {
        self.discard.len()
    }

    pub fn total_cards(&self) -> usize {
        self.total
    }

    pub fn cards_dealt(&self) -> usize {
        self.total - self.cards.len()
    }

    pub fn num_decks(&self) -> u8 {
        self.num_decks
    }

    pub fn shuffle_point(&self) -> usize {
        self.shuffle_point
    }

    pub fn penetration(&self) -> f64 {
        self.penetration
    }

    /// Fraction of the shoe dealt since the last shuffle.
    pub fn penetration_progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.cards_dealt() as f64 / self.total as f64
    }

    pub fn decks_remaining(&self) -> f64 {
        self.cards.len() as f64 / CARDS_PER_DECK as f64
    }

    /// Incremented on every shuffle, forced or not.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn validate_penetration(penetration: f64) -> Result<(), Error> {
    if !(penetration > 0.0 && penetration <= 1.0) {
        return Err(Error::InvalidShoe(format!(
            "penetration must be in (0, 1], got {penetration}"
        )));
    }
    Ok(())
}

fn shuffle_point(total: usize, penetration: f64) -> usize {
    (total as f64 * (1.0 - penetration)).floor() as usize
}
