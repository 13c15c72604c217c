use super::*;
use super::template::{TemplateError, TemplateValues, render_template};
use super::tick::FALLBACK_COVER_URL;
use crate::config::DisplaySettings;
use crate::fusion::SnapshotStore;
use crate::mpris::{MediaSource, NoMedia};
use crate::status::{LocalMedia, TrackStatus};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

#[derive(Default)]
struct MemorySink {
    fields: HashMap<Field, String>,
    writes: usize,
}

impl Sink for MemorySink {
    fn write(&mut self, field: Field, value: &str) -> io::Result<()> {
        self.writes += 1;
        self.fields.insert(field, value.to_string());
        Ok(())
    }
}

impl MemorySink {
    fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

struct BrokenSink;

impl Sink for BrokenSink {
    fn write(&mut self, _field: Field, _value: &str) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

struct FixedMedia(LocalMedia);

impl MediaSource for FixedMedia {
    fn current_media(&self) -> Option<LocalMedia> {
        Some(self.0.clone())
    }
}

fn values() -> TemplateValues<'static> {
    TemplateValues {
        player_name: "Spotify",
        title: "Song",
        artist: "Band",
        album: "Record",
        duration: "3:20",
        position: "0:50",
        position_percent: "25",
    }
}

fn local_playing() -> LocalMedia {
    LocalMedia {
        player_name: Some("mpv".to_string()),
        title: Some("Local Song".to_string()),
        artist: Some("Local Band".to_string()),
        duration: Some(200.0.into()),
        position: Some(20.0.into()),
        position_percent: Some(10.0),
        state: Some("Playing".to_string()),
        ..LocalMedia::default()
    }
}

fn polled_playing() -> TrackStatus {
    TrackStatus {
        player_name: "Tuna".to_string(),
        title: "Remote Song".to_string(),
        artist: "Remote Band".to_string(),
        artists: vec!["Remote Band".to_string()],
        duration_sec: 200.0,
        progress_sec: 125.0,
        position_percent: 63,
        status: "playing".to_string(),
        ..TrackStatus::default()
    }
}

#[test]
fn template_substitutes_all_placeholders() {
    let out = render_template(
        "{player_name}: {title} - {artist} [{album}] {position}/{duration} {positionPercent}% {position_percent}",
        &values(),
    )
    .unwrap();
    assert_eq!(out, "Spotify: Song - Band [Record] 0:50/3:20 25% 25");
}

#[test]
fn template_handles_escaped_braces() {
    let out = render_template("{{{title}}} }}", &values()).unwrap();
    assert_eq!(out, "{Song} }");
}

#[test]
fn template_errors_are_typed() {
    assert_eq!(
        render_template("{nope}", &values()),
        Err(TemplateError::UnknownPlaceholder("nope".to_string()))
    );
    assert_eq!(
        render_template("{title:>10}", &values()),
        Err(TemplateError::FormatSpec("title:>10".to_string()))
    );
    assert_eq!(
        render_template("{title", &values()),
        Err(TemplateError::Unbalanced { brace: '{', index: 0 })
    );
    assert_eq!(
        render_template("a } b", &values()),
        Err(TemplateError::Unbalanced { brace: '}', index: 2 })
    );
    assert!(render_template("{}", &values()).is_err());
}

#[test]
fn file_sink_writes_one_file_per_field_and_skips_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FileSink::new(dir.path().join("fields")).unwrap();

    sink.write(Field::Title, "Song").unwrap();
    sink.write(Field::PositionPercent, "25").unwrap();
    let title_path = sink.path_for(Field::Title);
    assert_eq!(title_path.file_name().unwrap(), "title.txt");
    assert_eq!(std::fs::read_to_string(&title_path).unwrap(), "Song");
    assert_eq!(
        std::fs::read_to_string(sink.dir().join("positionPercent.txt")).unwrap(),
        "25"
    );

    // Same value: the file is left alone, even if someone else changed it.
    std::fs::write(&title_path, "tampered").unwrap();
    sink.write(Field::Title, "Song").unwrap();
    assert_eq!(std::fs::read_to_string(&title_path).unwrap(), "tampered");

    sink.write(Field::Title, "Next").unwrap();
    assert_eq!(std::fs::read_to_string(&title_path).unwrap(), "Next");
    assert!(!sink.dir().join("title.txt.tmp").exists());
}

#[test]
fn field_names_are_unique() {
    let mut names: Vec<_> = Field::ALL.iter().map(|f| f.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), Field::ALL.len());
}

#[test]
fn idle_tick_writes_placeholders_and_fallback_cover() {
    let store = Arc::new(SnapshotStore::new());
    let mut driver = TickDriver::new(Box::new(NoMedia), store, DisplaySettings::default());
    let mut sink = MemorySink::default();

    assert!(driver.tick(&mut sink).is_none());
    assert_eq!(sink.get(Field::PlayerName), Some("N/A"));
    assert_eq!(sink.get(Field::Title), Some("N/A"));
    assert_eq!(sink.get(Field::Artist), Some("N/A"));
    assert_eq!(sink.get(Field::Album), Some("N/A"));
    assert_eq!(sink.get(Field::Duration), Some("0:00"));
    assert_eq!(sink.get(Field::Position), Some("0:00"));
    assert_eq!(sink.get(Field::PositionPercent), Some("0"));
    assert_eq!(sink.get(Field::CoverUrl), Some(FALLBACK_COVER_URL));
    assert_eq!(sink.get(Field::Formatted), Some("N/A - N/A (0:00/0:00)"));
}

#[test]
fn idle_tick_prefers_configured_default_cover() {
    let display = DisplaySettings {
        default_cover_url: "https://img.example/none.png".to_string(),
        placeholder: "-".to_string(),
        ..DisplaySettings::default()
    };
    let mut driver = TickDriver::new(Box::new(NoMedia), Arc::new(SnapshotStore::new()), display);
    let mut sink = MemorySink::default();

    driver.tick(&mut sink);
    assert_eq!(sink.get(Field::CoverUrl), Some("https://img.example/none.png"));
    assert_eq!(sink.get(Field::Title), Some("-"));
}

#[test]
fn polled_status_renders_when_local_is_idle() {
    let store = Arc::new(SnapshotStore::new());
    store.write_polled(Some(polled_playing()));
    let mut driver = TickDriver::new(Box::new(NoMedia), store.clone(), DisplaySettings::default());
    let mut sink = MemorySink::default();

    let active = driver.tick(&mut sink).unwrap();
    assert_eq!(active.title, "Remote Song");
    assert_eq!(sink.get(Field::PlayerName), Some("Tuna"));
    assert_eq!(sink.get(Field::Position), Some("2:05"));
    assert_eq!(sink.get(Field::Duration), Some("3:20"));
    assert_eq!(sink.get(Field::PositionPercent), Some("63"));
    assert_eq!(sink.get(Field::Album), Some(""));
    assert_eq!(sink.get(Field::Formatted), Some("Remote Song - Remote Band (2:05/3:20)"));
    assert!(store.read_both().0.is_none());
}

#[test]
fn playing_local_media_wins_and_is_captured_into_the_store() {
    let store = Arc::new(SnapshotStore::new());
    store.write_polled(Some(polled_playing()));
    let mut driver = TickDriver::new(
        Box::new(FixedMedia(local_playing())),
        store.clone(),
        DisplaySettings::default(),
    );
    let mut sink = MemorySink::default();

    let active = driver.tick(&mut sink).unwrap();
    assert_eq!(active.title, "Local Song");
    assert_eq!(sink.get(Field::PlayerName), Some("mpv"));
    assert_eq!(sink.get(Field::PositionPercent), Some("10"));
    assert_eq!(store.read_both().0.unwrap().title, "Local Song");
}

#[test]
fn empty_artist_renders_placeholder() {
    let store = Arc::new(SnapshotStore::new());
    let mut status = polled_playing();
    status.artist.clear();
    status.artists.clear();
    store.write_polled(Some(status));
    let mut driver = TickDriver::new(Box::new(NoMedia), store, DisplaySettings::default());
    let mut sink = MemorySink::default();

    driver.tick(&mut sink);
    assert_eq!(sink.get(Field::Artist), Some("N/A"));
}

#[test]
fn broken_template_only_drops_formatted() {
    let display = DisplaySettings {
        template: "{title} {oops}".to_string(),
        ..DisplaySettings::default()
    };
    let store = Arc::new(SnapshotStore::new());
    store.write_polled(Some(polled_playing()));
    let mut driver = TickDriver::new(Box::new(NoMedia), store, display);
    let mut sink = MemorySink::default();

    assert!(driver.tick(&mut sink).is_some());
    assert_eq!(sink.get(Field::Title), Some("Remote Song"));
    assert!(sink.get(Field::Formatted).is_none());
    assert_eq!(sink.writes, Field::ALL.len() - 1);

    driver.set_display(DisplaySettings::default());
    driver.tick(&mut sink);
    assert_eq!(sink.get(Field::Formatted), Some("Remote Song - Remote Band (2:05/3:20)"));
}

#[test]
fn sink_errors_do_not_escape_the_tick() {
    let store = Arc::new(SnapshotStore::new());
    store.write_polled(Some(polled_playing()));
    let mut driver = TickDriver::new(Box::new(NoMedia), store, DisplaySettings::default());

    assert!(driver.tick(&mut BrokenSink).is_some());
    assert!(driver.tick(&mut BrokenSink).is_some());
}
