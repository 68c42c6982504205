use std::{fmt, hash::Hash};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(StoryId);

/// Items addressable by a stable identity inside an ordered collection.
pub trait Keyed {
    type Key: Copy + Eq + Hash + fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Items that can be matched against a search term.
pub trait Titled {
    fn title(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub url: String,
    pub author: String,
    pub comment_count: u32,
    pub score: i64,
}

impl Keyed for Story {
    type Key = StoryId;

    fn key(&self) -> StoryId {
        self.id
    }
}

impl Titled for Story {
    fn title(&self) -> &str {
        &self.title
    }
}

/// The two stories served by the simulated source.
pub fn initial_stories() -> Vec<Story> {
    vec![
        Story {
            id: StoryId(0),
            title: "React".into(),
            url: "https://reactjs.org/".into(),
            author: "Jordan Walke".into(),
            comment_count: 3,
            score: 4,
        },
        Story {
            id: StoryId(1),
            title: "Redux".into(),
            url: "https://redux.js.org/".into(),
            author: "Dan Abramov, Andrew Clark".into(),
            comment_count: 2,
            score: 5,
        },
    ]
}
