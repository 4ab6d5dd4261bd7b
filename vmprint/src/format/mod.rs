//! printf-style formatting engine
//!
//! Every message is formatted twice: once into a [`Counter`] to learn its
//! exact length, then into a buffer reserved to that length plus the NUL
//! terminator. Both passes run the same code, so the second one never
//! outgrows the reservation.
//!
//! Directives are checked against the typed arguments they consume. Missing
//! arguments, mismatched types, `%n` and unknown conversions are errors.

mod directive;
mod numeric;

use crate::message::RenderedMessage;
use crate::types::{Arg, ForwardError, Result};
use directive::{Directive, Field};

/// Destination of formatted bytes
pub(crate) trait Output {
    fn put(&mut self, bytes: &[u8]);

    fn put_repeated(&mut self, byte: u8, count: usize);
}

/// Dry-run output: only counts
#[derive(Debug, Default)]
pub(crate) struct Counter(usize);

impl Output for Counter {
    fn put(&mut self, bytes: &[u8]) {
        self.0 = self.0.saturating_add(bytes.len());
    }

    fn put_repeated(&mut self, _byte: u8, count: usize) {
        self.0 = self.0.saturating_add(count);
    }
}

impl Output for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn put_repeated(&mut self, byte: u8, count: usize) {
        self.resize(self.len() + count, byte);
    }
}

/// Hands out arguments in order and remembers their index for errors
struct ArgCursor<'a, 'b> {
    args: &'b [Arg<'a>],
    next: usize,
}

impl<'a, 'b> ArgCursor<'a, 'b> {
    fn new(args: &'b [Arg<'a>]) -> Self {
        Self { args, next: 0 }
    }

    fn next(&mut self, conversion: u8) -> Result<(usize, Arg<'a>)> {
        let index = self.next;
        let arg = *self.args.get(index).ok_or(ForwardError::MissingArgument {
            index,
            conversion: char::from(conversion),
        })?;
        self.next += 1;
        Ok((index, arg))
    }

    /// Integer bits for `*`, `%d`, `%u`, `%c` and friends
    fn next_integer(&mut self, conversion: u8) -> Result<u64> {
        match self.next(conversion)? {
            (_, Arg::Int(v)) => Ok(v as u64),
            (_, Arg::UInt(v)) => Ok(v),
            (index, other) => Err(mismatch(index, conversion, &other)),
        }
    }
}

fn mismatch(index: usize, conversion: u8, found: &Arg<'_>) -> ForwardError {
    ForwardError::ArgumentMismatch {
        index,
        conversion: char::from(conversion),
        found: found.kind(),
    }
}

/// The format string as C sees it: everything before the first NUL
fn until_nul(fmt: &[u8]) -> &[u8] {
    match fmt.iter().position(|&b| b == 0) {
        Some(end) => &fmt[..end],
        None => fmt,
    }
}

/// Run the format string against `args`, writing into `out`
pub(crate) fn format_into<O: Output>(out: &mut O, fmt: &[u8], args: &[Arg<'_>]) -> Result<()> {
    let fmt = until_nul(fmt);
    let mut cursor = ArgCursor::new(args);
    let mut pos = 0;

    while pos < fmt.len() {
        let rest = &fmt[pos..];
        match rest.iter().position(|&b| b == b'%') {
            None => {
                out.put(rest);
                break;
            }
            Some(n) => {
                out.put(&rest[..n]);
                pos += n;
            }
        }

        let directive = Directive::parse(fmt, pos)?;
        pos = directive.end;
        write_directive(out, &directive, &mut cursor)?;
    }

    Ok(())
}

fn write_directive<O: Output>(
    out: &mut O,
    directive: &Directive,
    cursor: &mut ArgCursor<'_, '_>,
) -> Result<()> {
    let conversion = directive.conversion;
    let mut flags = directive.flags;

    if conversion == b'%' {
        out.put(b"%");
        return Ok(());
    }

    let width = match directive.width {
        Some(Field::Fixed(w)) => w,
        Some(Field::FromArg) => {
            let w = cursor.next_integer(conversion)? as i32;
            if w < 0 {
                flags.left = true;
            }
            w.unsigned_abs() as usize
        }
        None => 0,
    };
    let precision = match directive.precision {
        Some(Field::Fixed(p)) => Some(p),
        Some(Field::FromArg) => {
            let p = cursor.next_integer(conversion)? as i32;
            // A negative precision is taken as if it were omitted
            usize::try_from(p).ok()
        }
        None => None,
    };

    match conversion {
        b'd' | b'i' => {
            let bits = cursor.next_integer(conversion)? as i64;
            let value = numeric::signed_for_length(bits, directive.length);
            numeric::write_signed(out, value, flags, width, precision);
        }
        b'u' | b'o' | b'x' | b'X' => {
            let bits = cursor.next_integer(conversion)?;
            let value = numeric::unsigned_for_length(bits, directive.length);
            numeric::write_unsigned(out, value, conversion, flags, width, precision);
        }
        b'c' => {
            let byte = cursor.next_integer(conversion)? as u8;
            write_padded(out, &[byte], flags.left, width);
        }
        b's' => {
            let bytes = match cursor.next(conversion)? {
                (_, Arg::Str(s)) => until_nul(s),
                (index, other) => return Err(mismatch(index, conversion, &other)),
            };
            let bytes = match precision {
                Some(p) if p < bytes.len() => &bytes[..p],
                _ => bytes,
            };
            write_padded(out, bytes, flags.left, width);
        }
        b'p' => match cursor.next(conversion)? {
            (_, Arg::Ptr(address)) => {
                numeric::write_pointer(out, address, flags, width, precision);
            }
            (index, other) => return Err(mismatch(index, conversion, &other)),
        },
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' => match cursor.next(conversion)? {
            (_, Arg::Float(value)) => {
                numeric::write_float(out, value, conversion, flags, width, precision);
            }
            (index, other) => return Err(mismatch(index, conversion, &other)),
        },
        other => {
            return Err(ForwardError::UnsupportedConversion {
                offset: directive.offset,
                conversion: char::from(other),
            })
        }
    }

    Ok(())
}

fn write_padded<O: Output>(out: &mut O, bytes: &[u8], left: bool, width: usize) {
    let pad = width.saturating_sub(bytes.len());
    if left {
        out.put(bytes);
        out.put_repeated(b' ', pad);
    } else {
        out.put_repeated(b' ', pad);
        out.put(bytes);
    }
}

/// Dry run: the exact number of bytes `fmt` renders to, terminator excluded
pub fn measure(fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<usize> {
    let mut counter = Counter::default();
    format_into(&mut counter, fmt.as_ref(), args)?;
    Ok(counter.0)
}

/// Render `fmt` into an exactly-sized, NUL-terminated buffer
pub fn render(fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<RenderedMessage> {
    render_limited(fmt.as_ref(), args, None)
}

/// [`render`] with an optional cap on the rendered length
pub(crate) fn render_limited(
    fmt: &[u8],
    args: &[Arg<'_>],
    limit: Option<usize>,
) -> Result<RenderedMessage> {
    let len = measure(fmt, args)?;
    if let Some(limit) = limit {
        if len > limit {
            return Err(ForwardError::MessageTooLong { len, limit });
        }
    }

    let requested = len
        .checked_add(1)
        .ok_or(ForwardError::OutOfMemory { requested: usize::MAX })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(requested)
        .map_err(|_| ForwardError::OutOfMemory { requested })?;

    format_into(&mut buf, fmt, args)?;
    debug_assert_eq!(buf.len(), len, "second pass disagrees with the dry run");
    buf.push(0);

    Ok(RenderedMessage::from_terminated(buf))
}
