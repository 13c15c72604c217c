use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A named output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PlayerName,
    Title,
    Artist,
    Album,
    Duration,
    Position,
    PositionPercent,
    CoverUrl,
    Formatted,
}

impl Field {
    #[cfg(test)]
    pub const ALL: [Field; 9] = [
        Field::PlayerName,
        Field::Title,
        Field::Artist,
        Field::Album,
        Field::Duration,
        Field::Position,
        Field::PositionPercent,
        Field::CoverUrl,
        Field::Formatted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::PlayerName => "playerName",
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Album => "album",
            Field::Duration => "duration",
            Field::Position => "position",
            Field::PositionPercent => "positionPercent",
            Field::CoverUrl => "coverUrl",
            Field::Formatted => "formatted",
        }
    }
}

/// Destination for rendered fields.
pub trait Sink {
    fn write(&mut self, field: Field, value: &str) -> io::Result<()>;
}

/// Writes each field to `<dir>/<field>.txt`.
///
/// A file is only rewritten when its value changes. Writes go through a
/// temporary file and a rename so readers never see a partial value.
pub struct FileSink {
    dir: PathBuf,
    written: HashMap<Field, String>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, field: Field) -> PathBuf {
        self.dir.join(format!("{}.txt", field.as_str()))
    }
}

impl Sink for FileSink {
    fn write(&mut self, field: Field, value: &str) -> io::Result<()> {
        if self.written.get(&field).is_some_and(|v| v == value) {
            return Ok(());
        }

        let path = self.path_for(field);
        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        self.written.insert(field, value.to_string());
        Ok(())
    }
}
