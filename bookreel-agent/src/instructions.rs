//! Fixed text the assistant speaks or sends to the model.

use bookreel_core::Category;

/// System instructions for every model call the recommender makes.
pub const RECOMMENDER_INSTRUCTIONS: &str = "You are a friendly voice assistant that recommends \
books or movies based on genre. Start by asking the user whether they want a book or a movie \
recommendation. If they choose 'book', call the `recommend_books` tool. If they choose 'movie', \
call the `recommend_movies` tool. Then, ask them for the genre and pass it as a parameter to the \
appropriate tool. Respond to the user with the list of recommended items in a friendly tone. \
If the genre is not understood, say: 'Hmm, I'm not sure I recognize that genre. Could you try \
another?' Respond in the same language the user uses.";

/// Opening utterance requested from the session once it starts.
pub const GREETING: &str = "Hi there! Would you like a book or movie recommendation today?";

/// Spoken, alone, whenever a genre is not recognized.
pub const UNRECOGNIZED_GENRE: &str =
    "Hmm, I'm not sure I recognize that genre. Could you try another?";

pub const CATEGORY_REPROMPT: &str =
    "Sorry, I can help with books or movies. Which one would you like?";

pub const FOLLOW_UP: &str = "Would you like another book or movie recommendation?";

pub const RESTART: &str = "Let's start over. Would you like a book or movie recommendation?";

pub const CLOSING: &str = "Thanks for chatting! Enjoy your recommendations.";

pub fn ask_genre(category: Category) -> String {
    format!("Great, {}! What genre are you in the mood for?", category.noun())
}

/// A line the policy wants spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Greeting,
    AskGenre(Category),
    CategoryReprompt,
    UnrecognizedGenre,
    FollowUp,
    Restart,
    Closing,
}

impl Line {
    pub fn text(&self) -> String {
        match self {
            Self::Greeting => GREETING.to_string(),
            Self::AskGenre(category) => ask_genre(*category),
            Self::CategoryReprompt => CATEGORY_REPROMPT.to_string(),
            Self::UnrecognizedGenre => UNRECOGNIZED_GENRE.to_string(),
            Self::FollowUp => FOLLOW_UP.to_string(),
            Self::Restart => RESTART.to_string(),
            Self::Closing => CLOSING.to_string(),
        }
    }
}
