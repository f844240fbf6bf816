//! Draws unique, well-formed user candidates.
//!
//! A [`CandidateSource`] proposes raw values; [`RecordGenerator`] keeps
//! drawing until a candidate passes field validation and collides with
//! nothing in the [`DuplicateIndex`], then claims its email and username.

use fake::faker::internet::en::{Password, SafeEmail, Username};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::users::index::DuplicateIndex;
use crate::users::repo_types::Candidate;
use crate::validation::{join_errors, SECRET_MIN};

/// Draws allowed for a single record before the run gives up.
pub const MAX_ATTEMPTS_PER_RECORD: usize = 1_000;

/// Longest plaintext password drawn, inclusive.
const SECRET_MAX: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("no unique, valid user found after {attempts} attempts")]
    Exhausted { attempts: usize },
}

/// Anything that can propose a raw candidate.
pub trait CandidateSource {
    fn draw(&mut self) -> Candidate;
}

/// Faker-backed source of plausible names, emails and passwords.
pub struct FakerSource<R: Rng> {
    rng: R,
}

impl FakerSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FakerSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> CandidateSource for FakerSource<R> {
    fn draw(&mut self) -> Candidate {
        let rng = &mut self.rng;
        let email: String = SafeEmail().fake_with_rng(rng);
        Candidate {
            first_name: FirstName().fake_with_rng(rng),
            last_name: LastName().fake_with_rng(rng),
            email: email.trim().to_lowercase(),
            username: Username().fake_with_rng(rng),
            password: Password(SECRET_MIN..SECRET_MAX + 1).fake_with_rng(rng),
        }
    }
}

pub struct RecordGenerator<S> {
    source: S,
    max_attempts: usize,
}

impl<S: CandidateSource> RecordGenerator<S> {
    pub fn new(source: S) -> Self {
        Self::with_max_attempts(source, MAX_ATTEMPTS_PER_RECORD)
    }

    pub fn with_max_attempts(source: S, max_attempts: usize) -> Self {
        Self {
            source,
            max_attempts,
        }
    }

    /// Returns the first candidate that validates and is absent from
    /// `index`, after registering it there.
    pub fn generate(&mut self, index: &mut DuplicateIndex) -> Result<Candidate, GenerationError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.draw();

            if let Err(errors) = candidate.validate() {
                debug!(attempt, errors = %join_errors(&errors), "candidate failed validation; redrawing");
                continue;
            }

            if !index.admits(&candidate) {
                debug!(attempt, email = %candidate.email, username = %candidate.username, "candidate collides; redrawing");
                continue;
            }

            index.register(&candidate);
            return Ok(candidate);
        }

        Err(GenerationError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;

    /// Replays a fixed list of candidates, then repeats the last one.
    pub(crate) struct Scripted(pub(crate) VecDeque<Candidate>);

    impl CandidateSource for Scripted {
        fn draw(&mut self) -> Candidate {
            if self.0.len() > 1 {
                self.0.pop_front().unwrap()
            } else {
                self.0.front().cloned().unwrap()
            }
        }
    }

    pub(crate) fn candidate(email: &str, username: &str) -> Candidate {
        Candidate {
            first_name: "Alan".into(),
            last_name: "Turing".into(),
            email: email.into(),
            username: username.into(),
            password: "enigma-machine".into(),
        }
    }

    #[test]
    fn faker_candidates_are_well_formed() {
        let mut source = FakerSource::seeded(7);
        for _ in 0..200 {
            let c = source.draw();
            assert!(c.password.chars().count() >= SECRET_MIN);
            assert_eq!(c.email, c.email.to_lowercase());
        }
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let mut a = FakerSource::seeded(42);
        let mut b = FakerSource::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn redraws_on_collision_and_registers_winner() {
        let mut index: DuplicateIndex = [("taken@x.com".to_string(), "taken".to_string())]
            .into_iter()
            .collect();
        let source = Scripted(VecDeque::from([
            candidate("taken@x.com", "free"),
            candidate("free@x.com", "taken"),
            candidate("free@x.com", "free"),
        ]));
        let mut generator = RecordGenerator::new(source);

        let got = generator.generate(&mut index).expect("unique candidate");
        assert_eq!(got.email, "free@x.com");
        assert!(index.contains_email("free@x.com"));
        assert!(index.contains_username("free"));
    }

    #[test]
    fn malformed_candidates_are_redrawn_not_fatal() {
        let mut index = DuplicateIndex::default();
        let source = Scripted(VecDeque::from([
            candidate("no-at-sign", "first"),
            candidate("ok@x.com", "second"),
        ]));
        let got = RecordGenerator::new(source)
            .generate(&mut index)
            .expect("second draw is valid");
        assert_eq!(got.username, "second");
        assert!(!index.contains_username("first"));
    }

    #[test]
    fn exhausted_value_space_is_an_error() {
        let mut index: DuplicateIndex = [("only@x.com".to_string(), "only".to_string())]
            .into_iter()
            .collect();
        let source = Scripted(VecDeque::from([candidate("only@x.com", "only")]));
        let err = RecordGenerator::with_max_attempts(source, 25)
            .generate(&mut index)
            .unwrap_err();
        assert_eq!(err, GenerationError::Exhausted { attempts: 25 });
    }

    #[test]
    fn never_emits_an_existing_email() {
        let mut index: DuplicateIndex = [("a@x.com".to_string(), "existing".to_string())]
            .into_iter()
            .collect();

        // Every third draw proposes the stored address.
        let mut script = VecDeque::new();
        for i in 0..1500 {
            if i % 3 == 0 {
                script.push_back(candidate("a@x.com", &format!("user{i}")));
            } else {
                script.push_back(candidate(&format!("u{i}@x.com"), &format!("user{i}")));
            }
        }
        let mut generator = RecordGenerator::new(Scripted(script));

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let c = generator.generate(&mut index).expect("candidate");
            assert_ne!(c.email, "a@x.com");
            assert!(seen.insert(c.email));
        }
    }

    #[test]
    fn faker_batch_has_no_duplicates() {
        let mut index = DuplicateIndex::default();
        let mut generator = RecordGenerator::new(FakerSource::seeded(1));
        let mut emails = HashSet::new();
        let mut usernames = HashSet::new();
        for _ in 0..200 {
            let c = generator.generate(&mut index).expect("candidate");
            assert!(emails.insert(c.email));
            assert!(usernames.insert(c.username));
        }
    }
}
