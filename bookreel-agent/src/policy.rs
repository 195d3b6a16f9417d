//! Conversation state machine.
//!
//! ```text
//! Start ──greet──▶ AwaitingCategory ──category──▶ AwaitingGenre(c) ──genre──▶ Responding
//!                        │  ▲                           │  ▲                      │
//!                        └──┘ re-prompt                 └──┘ unrecognized genre   │
//!                                                                                 ▼
//!                                         AwaitingCategory (FollowUp::Offer) or Done
//! ```
//!
//! Unrecognized input is retried at most `max_attempts` times in a row per
//! state before the conversation restarts from the greeting.

use crate::extraction::Extraction;
use crate::instructions::Line;
use bookreel_core::{Category, Command};
use serde::{Deserialize, Serialize};

/// What happens after a recommendation has been spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    /// Offer another recommendation and wait for a new category.
    #[default]
    Offer,
    /// End the exchange; later turns get a closing line.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOptions {
    /// Consecutive unrecognized inputs tolerated in one state.
    pub max_attempts: u32,
    pub follow_up: FollowUp,
    /// Translate fixed lines when the user speaks another language.
    pub mirror_language: bool,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self { max_attempts: 3, follow_up: FollowUp::Offer, mirror_language: true }
    }
}

impl PolicyOptions {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }

    #[must_use]
    pub fn with_mirror_language(mut self, mirror_language: bool) -> Self {
        self.mirror_language = mirror_language;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyState {
    Start,
    AwaitingCategory { attempts: u32 },
    AwaitingGenre { category: Category, attempts: u32 },
    Responding { command: Command },
    Done,
}

impl PolicyState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AwaitingCategory { .. } => "awaiting_category",
            Self::AwaitingGenre { .. } => "awaiting_genre",
            Self::Responding { .. } => "responding",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Say(Line),
    Lookup(Command),
}

#[derive(Debug, Clone)]
pub struct Policy {
    options: PolicyOptions,
    state: PolicyState,
}

impl Policy {
    pub fn new(options: PolicyOptions) -> Self {
        Self { options, state: PolicyState::Start }
    }

    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    pub fn options(&self) -> &PolicyOptions {
        &self.options
    }

    /// Opening turn. Always lands in AwaitingCategory.
    pub fn greet(&mut self) -> Line {
        self.transition(PolicyState::AwaitingCategory { attempts: 0 });
        Line::Greeting
    }

    /// Handle one user turn. `None` means nothing usable was extracted.
    pub fn on_input(&mut self, input: Option<&Extraction>) -> Action {
        match self.state.clone() {
            PolicyState::Start | PolicyState::Responding { .. } => {
                self.transition(PolicyState::AwaitingCategory { attempts: 0 });
                self.on_input(input)
            }
            PolicyState::AwaitingCategory { attempts } => self.awaiting_category(attempts, input),
            PolicyState::AwaitingGenre { category, attempts } => {
                self.awaiting_genre(category, attempts, input)
            }
            PolicyState::Done => Action::Say(Line::Closing),
        }
    }

    fn awaiting_category(&mut self, attempts: u32, input: Option<&Extraction>) -> Action {
        let Some(extraction) = input else {
            return self.retry_category(attempts);
        };
        let Some(category) = extraction.category() else {
            return self.retry_category(attempts);
        };

        if extraction.mentions_genre() {
            return self.awaiting_genre(category, 0, Some(extraction));
        }

        self.transition(PolicyState::AwaitingGenre { category, attempts: 0 });
        Action::Say(Line::AskGenre(category))
    }

    fn awaiting_genre(
        &mut self,
        category: Category,
        attempts: u32,
        input: Option<&Extraction>,
    ) -> Action {
        // The user may switch category while answering.
        let category = input.and_then(Extraction::category).unwrap_or(category);
        if input.is_some_and(|e| e.category().is_some() && !e.mentions_genre()) {
            self.transition(PolicyState::AwaitingGenre { category, attempts });
            return Action::Say(Line::AskGenre(category));
        }

        match input.and_then(Extraction::recognized_genre) {
            Some(genre) => {
                let command = Command::new(category, genre);
                self.transition(PolicyState::Responding { command: command.clone() });
                Action::Lookup(command)
            }
            None => {
                let attempts = attempts + 1;
                if attempts >= self.options.max_attempts {
                    return self.restart();
                }
                self.transition(PolicyState::AwaitingGenre { category, attempts });
                Action::Say(Line::UnrecognizedGenre)
            }
        }
    }

    fn retry_category(&mut self, attempts: u32) -> Action {
        let attempts = attempts + 1;
        if attempts >= self.options.max_attempts {
            return self.restart();
        }
        self.transition(PolicyState::AwaitingCategory { attempts });
        Action::Say(Line::CategoryReprompt)
    }

    fn restart(&mut self) -> Action {
        tracing::info!(max_attempts = self.options.max_attempts, "retries exhausted, restarting");
        self.transition(PolicyState::AwaitingCategory { attempts: 0 });
        Action::Say(Line::Restart)
    }

    /// The lookup for the current Responding state succeeded. Returns the line
    /// to append after the titles, if any.
    pub fn on_lookup_complete(&mut self) -> Option<Line> {
        if !matches!(self.state, PolicyState::Responding { .. }) {
            return None;
        }
        match self.options.follow_up {
            FollowUp::Offer => {
                self.transition(PolicyState::AwaitingCategory { attempts: 0 });
                Some(Line::FollowUp)
            }
            FollowUp::Stop => {
                self.transition(PolicyState::Done);
                None
            }
        }
    }

    /// The lookup failed; go back to asking for a genre in the same category.
    pub fn on_lookup_failed(&mut self) {
        if let PolicyState::Responding { command } = &self.state {
            let category = command.category();
            self.transition(PolicyState::AwaitingGenre { category, attempts: 0 });
        }
    }

    fn transition(&mut self, next: PolicyState) {
        if self.state.name() != next.name() {
            tracing::debug!(from = self.state.name(), to = next.name(), "policy transition");
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::CategoryChoice;
    use bookreel_core::Genre;

    fn heard(category: CategoryChoice, genre: Option<&str>, recognized: bool) -> Extraction {
        Extraction {
            category,
            genre: genre.map(str::to_string),
            genre_recognized: recognized,
            language: Some("en".into()),
        }
    }

    fn greeted() -> Policy {
        let mut policy = Policy::new(PolicyOptions::default());
        assert_eq!(policy.greet(), Line::Greeting);
        policy
    }

    #[test]
    fn book_then_genre_dispatches_book_command() {
        let mut policy = greeted();
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Book, None, false))),
            Action::Say(Line::AskGenre(Category::Book))
        );
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::None, Some("science fiction"), true))),
            Action::Lookup(Command::new(Category::Book, "science fiction"))
        );
        assert!(matches!(policy.state(), PolicyState::Responding { .. }));
    }

    #[test]
    fn category_and_genre_in_one_turn() {
        let mut policy = greeted();
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Movie, Some("noir"), true))),
            Action::Lookup(Command::new(Category::Movie, "noir"))
        );
    }

    #[test]
    fn unrecognized_genre_says_fallback_and_stays() {
        let mut policy = greeted();
        policy.on_input(Some(&heard(CategoryChoice::Movie, None, false)));
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::None, Some("blorp"), false))),
            Action::Say(Line::UnrecognizedGenre)
        );
        assert_eq!(
            policy.state(),
            &PolicyState::AwaitingGenre { category: Category::Movie, attempts: 1 }
        );
    }

    #[test]
    fn unknown_category_reprompts_then_restarts() {
        let mut policy = greeted();
        let nothing = heard(CategoryChoice::None, None, false);
        assert_eq!(policy.on_input(Some(&nothing)), Action::Say(Line::CategoryReprompt));
        assert_eq!(policy.on_input(None), Action::Say(Line::CategoryReprompt));
        assert_eq!(policy.on_input(Some(&nothing)), Action::Say(Line::Restart));
        assert_eq!(policy.state(), &PolicyState::AwaitingCategory { attempts: 0 });
    }

    #[test]
    fn genre_retries_are_bounded() {
        let mut policy = Policy::new(PolicyOptions::default().with_max_attempts(2));
        policy.greet();
        policy.on_input(Some(&heard(CategoryChoice::Book, None, false)));
        assert_eq!(policy.on_input(None), Action::Say(Line::UnrecognizedGenre));
        assert_eq!(policy.on_input(None), Action::Say(Line::Restart));
        assert_eq!(policy.state(), &PolicyState::AwaitingCategory { attempts: 0 });
    }

    #[test]
    fn switching_category_while_choosing_genre() {
        let mut policy = greeted();
        policy.on_input(Some(&heard(CategoryChoice::Book, None, false)));
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Movie, Some("horror"), true))),
            Action::Lookup(Command::new(Category::Movie, Genre::new("horror")))
        );
    }

    #[test]
    fn follow_up_offer_returns_to_category() {
        let mut policy = greeted();
        policy.on_input(Some(&heard(CategoryChoice::Movie, Some("noir"), true)));
        assert_eq!(policy.on_lookup_complete(), Some(Line::FollowUp));
        assert_eq!(policy.state(), &PolicyState::AwaitingCategory { attempts: 0 });
    }

    #[test]
    fn follow_up_stop_ends_in_done() {
        let mut policy = Policy::new(PolicyOptions::default().with_follow_up(FollowUp::Stop));
        policy.greet();
        policy.on_input(Some(&heard(CategoryChoice::Movie, Some("noir"), true)));
        assert_eq!(policy.on_lookup_complete(), None);
        assert_eq!(policy.state(), &PolicyState::Done);
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Book, Some("fantasy"), true))),
            Action::Say(Line::Closing)
        );
    }

    #[test]
    fn repeating_category_asks_for_genre_again() {
        let mut policy = greeted();
        policy.on_input(Some(&heard(CategoryChoice::Book, None, false)));
        policy.on_input(None);
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Book, None, false))),
            Action::Say(Line::AskGenre(Category::Book))
        );
        assert_eq!(
            policy.state(),
            &PolicyState::AwaitingGenre { category: Category::Book, attempts: 1 }
        );
    }

    #[test]
    fn lookup_failure_returns_to_genre() {
        let mut policy = greeted();
        policy.on_input(Some(&heard(CategoryChoice::Book, Some("fantasy"), true)));
        policy.on_lookup_failed();
        assert_eq!(
            policy.state(),
            &PolicyState::AwaitingGenre { category: Category::Book, attempts: 0 }
        );
    }

    #[test]
    fn input_before_greeting_is_treated_as_category_answer() {
        let mut policy = Policy::new(PolicyOptions::default());
        assert_eq!(
            policy.on_input(Some(&heard(CategoryChoice::Book, None, false))),
            Action::Say(Line::AskGenre(Category::Book))
        );
    }

    #[test]
    fn max_attempts_never_below_one() {
        assert_eq!(PolicyOptions::default().with_max_attempts(0).max_attempts, 1);
    }
}
