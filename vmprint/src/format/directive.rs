//! Parsing of a single `%` directive
//!
//! Grammar: `%[flags][width][.precision][length]conversion`, as in C.

use crate::types::{ForwardError, Result};

/// Largest width or precision accepted, matching C's `int` fields
const FIELD_MAX: usize = i32::MAX as usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    /// `-`
    pub left: bool,
    /// `+`
    pub plus: bool,
    /// ` `
    pub space: bool,
    /// `#`
    pub alt: bool,
    /// `0`
    pub zero: bool,
}

/// Width or precision as written in the directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Fixed(usize),
    /// `*`: taken from the next argument
    FromArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Length {
    Default,
    Char,
    Short,
    Long,
    LongLong,
    IntMax,
    Size,
    PtrDiff,
    LongDouble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Directive {
    /// Byte offset of the `%`
    pub offset: usize,
    /// Byte offset just past the conversion character
    pub end: usize,
    pub flags: Flags,
    pub width: Option<Field>,
    pub precision: Option<Field>,
    pub length: Length,
    pub conversion: u8,
}

impl Directive {
    /// Parse the directive whose `%` sits at `fmt[offset]`
    pub(crate) fn parse(fmt: &[u8], offset: usize) -> Result<Self> {
        let incomplete = ForwardError::IncompleteSpecifier { offset };
        let mut pos = offset + 1;

        let mut flags = Flags::default();
        while let Some(&c) = fmt.get(pos) {
            match c {
                b'-' => flags.left = true,
                b'+' => flags.plus = true,
                b' ' => flags.space = true,
                b'#' => flags.alt = true,
                b'0' => flags.zero = true,
                _ => break,
            }
            pos += 1;
        }

        let width = parse_field(fmt, &mut pos, offset)?;

        let precision = if fmt.get(pos) == Some(&b'.') {
            pos += 1;
            // A lone '.' means precision zero
            Some(parse_field(fmt, &mut pos, offset)?.unwrap_or(Field::Fixed(0)))
        } else {
            None
        };

        let length = match (fmt.get(pos), fmt.get(pos + 1)) {
            (Some(b'h'), Some(b'h')) => {
                pos += 2;
                Length::Char
            }
            (Some(b'l'), Some(b'l')) => {
                pos += 2;
                Length::LongLong
            }
            (Some(b'h'), _) => {
                pos += 1;
                Length::Short
            }
            (Some(b'l'), _) => {
                pos += 1;
                Length::Long
            }
            (Some(b'q'), _) => {
                pos += 1;
                Length::LongLong
            }
            (Some(b'j'), _) => {
                pos += 1;
                Length::IntMax
            }
            (Some(b'z'), _) => {
                pos += 1;
                Length::Size
            }
            (Some(b't'), _) => {
                pos += 1;
                Length::PtrDiff
            }
            (Some(b'L'), _) => {
                pos += 1;
                Length::LongDouble
            }
            _ => Length::Default,
        };

        let conversion = *fmt.get(pos).ok_or(incomplete)?;

        Ok(Self {
            offset,
            end: pos + 1,
            flags,
            width,
            precision,
            length,
            conversion,
        })
    }
}

fn parse_field(fmt: &[u8], pos: &mut usize, offset: usize) -> Result<Option<Field>> {
    if fmt.get(*pos) == Some(&b'*') {
        *pos += 1;
        return Ok(Some(Field::FromArg));
    }

    let start = *pos;
    let mut value: usize = 0;
    while let Some(&c) = fmt.get(*pos) {
        if !c.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(c - b'0')))
            .filter(|v| *v <= FIELD_MAX)
            .ok_or(ForwardError::FieldOverflow { offset })?;
        *pos += 1;
    }

    Ok((*pos > start).then_some(Field::Fixed(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let d = Directive::parse(b"%d", 0).unwrap();
        assert_eq!(d.conversion, b'd');
        assert_eq!(d.end, 2);
        assert_eq!(d.width, None);
        assert_eq!(d.precision, None);
        assert_eq!(d.length, Length::Default);
    }

    #[test]
    fn test_parse_full() {
        let d = Directive::parse(b"x=%-+#012.5llx;", 2).unwrap();
        assert!(d.flags.left && d.flags.plus && d.flags.alt && d.flags.zero);
        assert!(!d.flags.space);
        assert_eq!(d.width, Some(Field::Fixed(12)));
        assert_eq!(d.precision, Some(Field::Fixed(5)));
        assert_eq!(d.length, Length::LongLong);
        assert_eq!(d.conversion, b'x');
        assert_eq!(d.end, 14);
    }

    #[test]
    fn test_parse_star_and_lone_dot() {
        let d = Directive::parse(b"%*.*s", 0).unwrap();
        assert_eq!(d.width, Some(Field::FromArg));
        assert_eq!(d.precision, Some(Field::FromArg));

        let d = Directive::parse(b"%.f", 0).unwrap();
        assert_eq!(d.precision, Some(Field::Fixed(0)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Directive::parse(b"abc%", 3),
            Err(ForwardError::IncompleteSpecifier { offset: 3 })
        );
        assert_eq!(
            Directive::parse(b"%-08.3l", 0),
            Err(ForwardError::IncompleteSpecifier { offset: 0 })
        );
        assert_eq!(
            Directive::parse(b"%99999999999d", 0),
            Err(ForwardError::FieldOverflow { offset: 0 })
        );
    }
}
