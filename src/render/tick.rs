use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DisplaySettings;
use crate::fusion::{SnapshotStore, select_active};
use crate::mpris::MediaSource;
use crate::status::{TrackStatus, format_mmss, normalize_local};

use super::sink::{Field, Sink};
use super::template::{TemplateError, TemplateValues, render_template};

/// Cover shown when neither the track nor the settings provide one.
pub const FALLBACK_COVER_URL: &str =
    "https://raw.githubusercontent.com/keifufu/WebNowPlaying-Redux-OBS/main/widgets/images/nocover.png";

/// One render pass per call: capture the local bridge, arbitrate, emit.
pub struct TickDriver {
    source: Box<dyn MediaSource>,
    store: Arc<SnapshotStore>,
    display: DisplaySettings,
    shown: Option<(String, String)>,
    sink_failing: bool,
    template_failing: bool,
}

impl TickDriver {
    pub fn new(source: Box<dyn MediaSource>, store: Arc<SnapshotStore>, display: DisplaySettings) -> Self {
        Self {
            source,
            store,
            display,
            shown: None,
            sink_failing: false,
            template_failing: false,
        }
    }

    pub fn set_display(&mut self, display: DisplaySettings) {
        self.display = display;
        self.template_failing = false;
    }

    pub fn set_source(&mut self, source: Box<dyn MediaSource>) {
        self.source = source;
    }

    /// Run one tick and return the record that was rendered, if any.
    ///
    /// Nothing here fails past the tick: sink errors are logged and a broken
    /// template only drops the `formatted` field.
    pub fn tick(&mut self, sink: &mut dyn Sink) -> Option<TrackStatus> {
        let local = normalize_local(self.source.current_media().as_ref());
        self.store.write_local(local);

        let (local, polled) = self.store.read_both();
        let active = select_active(local.as_ref(), polled.as_ref()).cloned();

        self.note_switch(active.as_ref());
        match &active {
            Some(status) => self.render_active(status, sink),
            None => self.render_idle(sink),
        }
        active
    }

    fn note_switch(&mut self, active: Option<&TrackStatus>) {
        let now = active.map(|s| (s.player_name.clone(), s.title.clone()));
        if now == self.shown {
            return;
        }
        match (&self.shown, &now) {
            (_, None) => info!("no active player; showing idle"),
            (Some((was, _)), Some((player, title))) if was == player => {
                debug!(player = %player, title = %title, "track changed");
            }
            (_, Some((player, title))) => info!(player = %player, title = %title, "active source"),
        }
        self.shown = now;
    }

    fn cover_or_default(&self, cover: &str) -> String {
        [cover, self.display.default_cover_url.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|c| !c.is_empty())
            .unwrap_or(FALLBACK_COVER_URL)
            .to_string()
    }

    fn or_placeholder<'a>(&'a self, value: &'a str) -> &'a str {
        if value.trim().is_empty() {
            &self.display.placeholder
        } else {
            value
        }
    }

    fn render_active(&mut self, status: &TrackStatus, sink: &mut dyn Sink) {
        let duration = format_mmss(status.duration_sec);
        let position = format_mmss(status.progress_sec);
        let percent = status.position_percent.to_string();
        let cover = self.cover_or_default(&status.cover_url);

        let values = TemplateValues {
            player_name: self.or_placeholder(&status.player_name),
            title: self.or_placeholder(&status.title),
            artist: self.or_placeholder(&status.artist),
            album: &status.album,
            duration: &duration,
            position: &position,
            position_percent: &percent,
        };
        let (fields, error) = build_fields(&self.display.template, &values, &cover);
        self.note_template(error);
        self.emit(sink, fields);
    }

    fn render_idle(&mut self, sink: &mut dyn Sink) {
        let placeholder = self.display.placeholder.clone();
        let cover = self.cover_or_default("");
        let values = TemplateValues {
            player_name: &placeholder,
            title: &placeholder,
            artist: &placeholder,
            album: &placeholder,
            duration: "0:00",
            position: "0:00",
            position_percent: "0",
        };
        let (fields, error) = build_fields(&self.display.template, &values, &cover);
        self.note_template(error);
        self.emit(sink, fields);
    }

    fn note_template(&mut self, error: Option<TemplateError>) {
        match error {
            Some(e) => {
                if !self.template_failing {
                    warn!(error = %e, template = %self.display.template, "display template failed; skipping formatted field");
                }
                self.template_failing = true;
            }
            None => self.template_failing = false,
        }
    }

    fn emit(&mut self, sink: &mut dyn Sink, fields: Vec<(Field, String)>) {
        let mut failed = false;
        for (field, value) in fields {
            if let Err(e) = sink.write(field, &value) {
                failed = true;
                if self.sink_failing {
                    debug!(field = field.as_str(), error = %e, "sink write failed");
                } else {
                    warn!(field = field.as_str(), error = %e, "sink write failed");
                }
            }
        }
        if self.sink_failing && !failed {
            info!("sink writes recovered");
        }
        self.sink_failing = failed;
    }
}

fn build_fields(
    template: &str,
    values: &TemplateValues<'_>,
    cover: &str,
) -> (Vec<(Field, String)>, Option<TemplateError>) {
    let mut fields = vec![
        (Field::PlayerName, values.player_name.to_string()),
        (Field::Title, values.title.to_string()),
        (Field::Artist, values.artist.to_string()),
        (Field::Album, values.album.to_string()),
        (Field::Duration, values.duration.to_string()),
        (Field::Position, values.position.to_string()),
        (Field::PositionPercent, values.position_percent.to_string()),
        (Field::CoverUrl, cover.to_string()),
    ];
    match render_template(template, values) {
        Ok(text) => {
            fields.push((Field::Formatted, text));
            (fields, None)
        }
        Err(e) => (fields, Some(e)),
    }
}
