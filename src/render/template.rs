//! The `formatted` field template.
//!
//! Placeholders are `{name}`; `{{` and `}}` produce literal braces. Names are
//! matched exactly and format specs (`{title:>20}`) are not supported.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("format spec in {{{0}}} is not supported")]
    FormatSpec(String),
    #[error("unmatched '{brace}' at byte {index}")]
    Unbalanced { brace: char, index: usize },
}

/// Display values a template can reference.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub player_name: &'a str,
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub duration: &'a str,
    pub position: &'a str,
    pub position_percent: &'a str,
}

impl<'a> TemplateValues<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "player_name" => Some(self.player_name),
            "title" => Some(self.title),
            "artist" => Some(self.artist),
            "album" => Some(self.album),
            "duration" => Some(self.duration),
            "position" => Some(self.position),
            "positionPercent" | "position_percent" => Some(self.position_percent),
            _ => None,
        }
    }
}

pub fn render_template(template: &str, values: &TemplateValues<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => {
                            return Err(TemplateError::Unbalanced { brace: '{', index });
                        }
                        Some((_, ch)) => name.push(ch),
                    }
                }
                if name.contains([':', '!']) {
                    return Err(TemplateError::FormatSpec(name));
                }
                let value = values
                    .lookup(&name)
                    .ok_or(TemplateError::UnknownPlaceholder(name))?;
                out.push_str(value);
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_none() {
                    return Err(TemplateError::Unbalanced { brace: '}', index });
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
