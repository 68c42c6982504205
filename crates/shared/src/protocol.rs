use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Story, StoryId};

/// Discriminant of a load state, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl LoadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub search_term: String,
    pub visible: Vec<Story>,
    pub phase: LoadPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<StoryHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub num_comments: Option<u32>,
    #[serde(default)]
    pub points: Option<i64>,
}

impl StoryHit {
    /// Converts a search hit into a story, skipping hits that cannot be
    /// listed (no title or a non-numeric id).
    pub fn into_story(self) -> Option<Story> {
        let id = self.object_id.trim().parse::<i64>().ok()?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        Some(Story {
            id: StoryId(id),
            title,
            url: self.url.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            comment_count: self.num_comments.unwrap_or(0),
            score: self.points.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_search_hits_and_skips_untitled() {
        let raw = r#"{
            "hits": [
                {"objectID": "42", "title": "Rust 2.0", "url": "https://example.com", "author": "ferris", "num_comments": 7, "points": 99},
                {"objectID": "43", "title": null, "author": "ghost"},
                {"objectID": "44", "title": "Ask HN: anything", "url": null}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(raw).expect("decode");
        let stories: Vec<Story> = response
            .hits
            .into_iter()
            .filter_map(StoryHit::into_story)
            .collect();

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, StoryId(42));
        assert_eq!(stories[0].comment_count, 7);
        assert_eq!(stories[0].score, 99);
        assert_eq!(stories[1].url, "");
        assert_eq!(stories[1].author, "");
    }

    #[test]
    fn phase_serializes_snake_case() {
        let encoded = serde_json::to_string(&LoadPhase::Loading).expect("encode");
        assert_eq!(encoded, "\"loading\"");
        assert!(LoadPhase::Error.is_terminal());
        assert!(!LoadPhase::Loading.is_terminal());
    }
}
