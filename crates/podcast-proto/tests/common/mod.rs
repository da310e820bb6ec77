//! Fakes shared by the integration tests.
#![allow(dead_code)]

use podcast_proto::episode::Episode;
use podcast_proto::error::PlaybackError;
use podcast_proto::player::{AudioSink, PlayerState, PlayerSurface, PlayerView};

/// Records every source it is pointed at; optionally rejects playback.
#[derive(Debug, Default)]
pub struct FakeAudio {
    pub sources: Vec<String>,
    pub pauses: usize,
    pub stops: usize,
    pub reject_with: Option<String>,
}

impl AudioSink for FakeAudio {
    async fn play(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.sources.push(url.to_string());
        match &self.reject_with {
            Some(reason) => Err(PlaybackError::new(reason.clone())),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub views: Vec<PlayerView>,
    pub warnings: Vec<String>,
}

impl RecordingSurface {
    pub fn last(&self) -> &PlayerView {
        self.views.last().expect("nothing rendered yet")
    }
}

impl PlayerSurface for RecordingSurface {
    fn render(&mut self, view: &PlayerView) {
        self.views.push(view.clone());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

pub type TestPlayer = PlayerState<FakeAudio, RecordingSurface>;

pub fn player() -> TestPlayer {
    PlayerState::new(FakeAudio::default(), RecordingSurface::default())
}

pub fn rejecting_player(reason: &str) -> TestPlayer {
    let audio = FakeAudio {
        reject_with: Some(reason.to_string()),
        ..FakeAudio::default()
    };
    PlayerState::new(audio, RecordingSurface::default())
}

pub fn episode(n: usize) -> Episode {
    Episode {
        title: format!("Episode {n}"),
        description: format!("Description of episode {n}"),
        published_at: format!("2024-01-{:02}", n + 1),
        audio_url: format!("https://cdn.example.com/ep{n}.mp3"),
        ..Episode::default()
    }
}

pub fn episodes(count: usize) -> Vec<Episode> {
    (0..count).map(episode).collect()
}

pub fn rss(items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Test show</title>
    {items}
  </channel>
</rss>"#
    )
}
