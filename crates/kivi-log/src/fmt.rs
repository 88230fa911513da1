use compact_str::CompactString;

use termcolor::{ColorSpec, Color};

use crate::Level;

#[derive(Default, Clone, Debug)]
pub struct LogFmt {
    segments: Vec<SegmentSpec>,
}

impl LogFmt {

    /// The format used for a level until it is replaced: a bold, colored
    /// `[LEVEL]` tag followed by the message.
    pub fn for_level(level: Level) -> Self {
        let color = match level {
            Level::Error => Some(Color::Red),
            Level::Warn => Some(Color::Yellow),
            Level::Info => Some(Color::Green),
            Level::Debug => Some(Color::Cyan),
            Level::Trace => Some(Color::Magenta),
            Level::Always => None,
        };
        let mut fmt = Self::default();
        LogFmtBuilder::new(&mut fmt)
            .text("[", |spec| spec)
            .text(level.tag(), |spec| spec.with_color_spec(|c| {
                c.set_fg(color).set_bold(true);
            }))
            .text("] ", |spec| spec)
            .message(|spec| spec);
        fmt
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn clear(&mut self) {
        self.segments.clear();
    }
}

impl<'a> IntoIterator for &'a LogFmt {

    type Item = &'a SegmentSpec;
    type IntoIter = core::slice::Iter<'a, SegmentSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[derive(Default, Clone, Debug)]
pub struct LogSpec {
    pub color_spec: Option<ColorSpec>,
}

impl LogSpec {

    #[inline(always)]
    pub fn with_color_spec(mut self, mut f: impl FnMut(&mut ColorSpec)) -> Self {
        let color_spec = self.color_spec.insert(ColorSpec::new());
        f(color_spec);
        self
    }
}

#[derive(Clone, Debug)]
pub enum SegmentSpec {
    Message(LogSpec),
    Text(CompactString, LogSpec),
}

pub struct LogFmtBuilder<'a> {
    fmt: &'a mut LogFmt,
}

impl<'a> LogFmtBuilder<'a> {

    /// Starts a new format, discarding the segments `fmt` had.
    #[inline(always)]
    pub fn new(fmt: &'a mut LogFmt) -> Self {
        fmt.clear();
        Self {
            fmt,
        }
    }

    #[inline(always)]
    pub fn message(&mut self, mut f: impl FnMut(LogSpec) -> LogSpec) -> &mut Self {
        self.fmt.segments.push(SegmentSpec::Message(f(Default::default())));
        self
    }

    #[inline(always)]
    pub fn text(&mut self, text: &str, mut f: impl FnMut(LogSpec) -> LogSpec) -> &mut Self {
        self.fmt.segments.push(SegmentSpec::Text(CompactString::new(text), f(Default::default())));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_format_ends_with_message() {
        let fmt = LogFmt::for_level(Level::Warn);
        let segments: Vec<_> = fmt.into_iter().collect();
        assert_eq!(segments.len(), 4);
        assert!(matches!(segments[3], SegmentSpec::Message(_)));
        match segments[1] {
            SegmentSpec::Text(text, spec) => {
                assert_eq!(text.as_str(), "WARN");
                assert!(spec.color_spec.is_some());
            },
            SegmentSpec::Message(_) => panic!("expected level tag"),
        }
    }

    #[test]
    fn builder_replaces_previous_segments() {
        let mut fmt = LogFmt::for_level(Level::Info);
        LogFmtBuilder::new(&mut fmt).message(|spec| spec);
        assert_eq!(fmt.into_iter().count(), 1);
    }
}
