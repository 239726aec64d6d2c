/// Scene text templates: parsing and `{slot}` interpolation.

use thiserror::Error;

/// Slots scene text may reference.
pub const KNOWN_SLOTS: &[&str] = &["player"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
    #[error("unknown template slot '{0}'")]
    UnknownSlot(String),
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Named value substituted at render time: `{player}`.
    Slot(String),
}

/// A parsed template — a sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string.
    ///
    /// Syntax:
    /// - `{name}` → `Slot`
    /// - `{{` / `}}` → literal brace
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                    }

                    let start = i + 1;
                    let mut end = start;
                    while end < len && chars[end] != '}' {
                        if chars[end] == '{' {
                            return Err(TemplateError::Parse(
                                "nested braces are not allowed".to_string(),
                            ));
                        }
                        end += 1;
                    }
                    if end == len {
                        return Err(TemplateError::Parse("unclosed brace".to_string()));
                    }

                    let name: String = chars[start..end].iter().collect();
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::Parse("empty braces".to_string()));
                    }
                    segments.push(Segment::Slot(name.to_string()));
                    i = end + 1;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(TemplateError::Parse(
                        "unmatched closing brace".to_string(),
                    ));
                }
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Slot names referenced by this template, in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fail if the template references a slot outside `KNOWN_SLOTS`.
    pub fn check_slots(&self) -> Result<(), TemplateError> {
        match self.slots().find(|name| !KNOWN_SLOTS.contains(name)) {
            Some(unknown) => Err(TemplateError::UnknownSlot(unknown.to_string())),
            None => Ok(()),
        }
    }

    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| TemplateError::UnknownSlot(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render scene text for a player.
pub fn interpolate(text: &str, player: &str) -> Result<String, TemplateError> {
    Template::parse(text)?.render(&[("player", player)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("The Sun is very busy today.").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Literal("The Sun is very busy today.".to_string())]
        );
    }

    #[test]
    fn parse_slot() {
        let t = Template::parse("Hi {player}, ready?").unwrap();
        assert_eq!(t.segments.len(), 3);
        assert_eq!(t.segments[1], Segment::Slot("player".to_string()));
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Template::parse("Bad {} here").is_err());
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
        assert!(Template::parse("Bad {unclosed here").is_err());
        assert!(Template::parse("Bad } here").is_err());
    }

    #[test]
    fn render_player_name() {
        assert_eq!(
            interpolate("Great job, {player}!", "Ada").unwrap(),
            "Great job, Ada!"
        );
    }

    #[test]
    fn unknown_slot_rejected() {
        let t = Template::parse("Hello {captain}").unwrap();
        assert_eq!(
            t.check_slots(),
            Err(TemplateError::UnknownSlot("captain".to_string()))
        );
        assert!(t.render(&[("player", "Ada")]).is_err());
    }
}
