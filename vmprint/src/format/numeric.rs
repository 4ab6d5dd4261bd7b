//! Integer and floating-point conversions

use super::directive::{Flags, Length};
use super::Output;

/// Enough for a `u64` in octal (22 digits)
const DIGITS_MAX: usize = 24;

/// Fixed-size digit buffer, filled from the right
pub(crate) struct Digits {
    buf: [u8; DIGITS_MAX],
    start: usize,
}

impl Digits {
    pub(crate) fn new(mut value: u64, radix: u64, upper: bool) -> Self {
        let table: &[u8; 16] = if upper {
            b"0123456789ABCDEF"
        } else {
            b"0123456789abcdef"
        };
        let mut digits = Self {
            buf: [0; DIGITS_MAX],
            start: DIGITS_MAX,
        };
        loop {
            digits.start -= 1;
            digits.buf[digits.start] = table[(value % radix) as usize];
            value /= radix;
            if value == 0 {
                break;
            }
        }
        digits
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

/// Sign-extend or truncate to the width the length modifier names
pub(crate) fn signed_for_length(bits: i64, length: Length) -> i64 {
    match length {
        Length::Char => i64::from(bits as i8),
        Length::Short => i64::from(bits as i16),
        Length::Default => i64::from(bits as i32),
        _ => bits,
    }
}

pub(crate) fn unsigned_for_length(bits: u64, length: Length) -> u64 {
    match length {
        Length::Char => u64::from(bits as u8),
        Length::Short => u64::from(bits as u16),
        Length::Default => u64::from(bits as u32),
        _ => bits,
    }
}

/// A rendered number split into the parts padding cares about
pub(crate) struct Number<'a> {
    pub sign: &'a [u8],
    pub prefix: &'a [u8],
    /// Zeros required by the precision, between prefix and digits
    pub precision_zeros: usize,
    pub body: &'a [u8],
    /// Whether the `0` flag may pad this number
    pub zero_pad: bool,
}

impl Number<'_> {
    fn len(&self) -> usize {
        self.sign.len() + self.prefix.len() + self.precision_zeros + self.body.len()
    }

    pub(crate) fn emit<O: Output>(&self, out: &mut O, flags: Flags, width: usize) {
        let pad = width.saturating_sub(self.len());
        if flags.left {
            self.emit_parts(out, 0);
            out.put_repeated(b' ', pad);
        } else if flags.zero && self.zero_pad {
            self.emit_parts(out, pad);
        } else {
            out.put_repeated(b' ', pad);
            self.emit_parts(out, 0);
        }
    }

    fn emit_parts<O: Output>(&self, out: &mut O, zeros: usize) {
        out.put(self.sign);
        out.put(self.prefix);
        out.put_repeated(b'0', zeros + self.precision_zeros);
        out.put(self.body);
    }
}

fn sign_for(negative: bool, flags: Flags) -> &'static [u8] {
    if negative {
        b"-"
    } else if flags.plus {
        b"+"
    } else if flags.space {
        b" "
    } else {
        b""
    }
}

/// `%d` / `%i`
pub(crate) fn write_signed<O: Output>(
    out: &mut O,
    value: i64,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
) {
    let digits = Digits::new(value.unsigned_abs(), 10, false);
    let body = match precision {
        Some(0) if value == 0 => &[][..],
        _ => digits.as_bytes(),
    };
    Number {
        sign: sign_for(value < 0, flags),
        prefix: b"",
        precision_zeros: precision.map_or(0, |p| p.saturating_sub(body.len())),
        body,
        zero_pad: precision.is_none(),
    }
    .emit(out, flags, width);
}

/// `%u`, `%o`, `%x`, `%X` and the digits of `%p`
pub(crate) fn write_unsigned<O: Output>(
    out: &mut O,
    value: u64,
    conversion: u8,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
) {
    let (radix, upper) = match conversion {
        b'o' => (8, false),
        b'x' => (16, false),
        b'X' => (16, true),
        _ => (10, false),
    };
    let digits = Digits::new(value, radix, upper);
    let body = match precision {
        Some(0) if value == 0 => &[][..],
        _ => digits.as_bytes(),
    };
    let precision_zeros = precision.map_or(0, |p| p.saturating_sub(body.len()));

    let prefix: &[u8] = match conversion {
        b'o' if flags.alt && precision_zeros == 0 && body.first() != Some(&b'0') => b"0",
        b'x' if flags.alt && value != 0 => b"0x",
        b'X' if flags.alt && value != 0 => b"0X",
        _ => b"",
    };

    Number {
        sign: b"",
        prefix,
        precision_zeros,
        body,
        zero_pad: precision.is_none(),
    }
    .emit(out, flags, width);
}

/// `%p`: `(nil)` for zero, otherwise `0x` and lowercase hex
pub(crate) fn write_pointer<O: Output>(
    out: &mut O,
    value: usize,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
) {
    if value == 0 {
        Number {
            sign: b"",
            prefix: b"",
            precision_zeros: 0,
            body: b"(nil)",
            zero_pad: false,
        }
        .emit(out, flags, width);
        return;
    }

    let digits = Digits::new(value as u64, 16, false);
    let body = digits.as_bytes();
    Number {
        sign: sign_for(false, flags),
        prefix: b"0x",
        precision_zeros: precision.map_or(0, |p| p.saturating_sub(body.len())),
        body,
        zero_pad: precision.is_none(),
    }
    .emit(out, flags, width);
}

/// `%f %F %e %E %g %G`
pub(crate) fn write_float<O: Output>(
    out: &mut O,
    value: f64,
    conversion: u8,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
) {
    let upper = conversion.is_ascii_uppercase();
    let sign = sign_for(value.is_sign_negative(), flags);

    if !value.is_finite() {
        let body: &[u8] = match (value.is_nan(), upper) {
            (true, false) => b"nan",
            (true, true) => b"NAN",
            (false, false) => b"inf",
            (false, true) => b"INF",
        };
        Number {
            sign,
            prefix: b"",
            precision_zeros: 0,
            body,
            zero_pad: false,
        }
        .emit(out, flags, width);
        return;
    }

    let magnitude = value.abs();
    let precision = precision.unwrap_or(6);
    let mut body = match conversion.to_ascii_lowercase() {
        b'e' => exponential(magnitude, precision, flags.alt),
        b'g' => general(magnitude, precision, flags.alt),
        _ => fixed(magnitude, precision, flags.alt),
    };
    if upper {
        body.make_ascii_uppercase();
    }

    Number {
        sign,
        prefix: b"",
        precision_zeros: 0,
        body: body.as_bytes(),
        zero_pad: true,
    }
    .emit(out, flags, width);
}

fn fixed(magnitude: f64, precision: usize, alt: bool) -> String {
    let mut s = format!("{:.*}", precision, magnitude);
    if alt && precision == 0 {
        s.push('.');
    }
    s
}

/// Rust writes `1.5e3`; C wants `1.5e+03`
fn exponential(magnitude: f64, precision: usize, alt: bool) -> String {
    let (mantissa, exponent) = split_exponential(magnitude, precision);
    let mut s = mantissa;
    if alt && precision == 0 {
        s.push('.');
    }
    push_exponent(&mut s, exponent);
    s
}

fn general(magnitude: f64, precision: usize, alt: bool) -> String {
    let p = precision.max(1);
    let (mantissa, exponent) = split_exponential(magnitude, p - 1);

    let p = p as i64;
    let x = i64::from(exponent);
    if x < p && x >= -4 {
        let mut s = format!("{:.*}", (p - 1 - x) as usize, magnitude);
        if !alt {
            trim_fraction(&mut s);
        } else if !s.contains('.') {
            s.push('.');
        }
        s
    } else {
        let mut s = mantissa;
        if !alt {
            trim_fraction(&mut s);
        } else if !s.contains('.') {
            s.push('.');
        }
        push_exponent(&mut s, exponent);
        s
    }
}

fn split_exponential(magnitude: f64, precision: usize) -> (String, i32) {
    let s = format!("{:.*e}", precision, magnitude);
    match s.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_owned(), exponent.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn push_exponent(s: &mut String, exponent: i32) {
    use std::fmt::Write;

    let sign = if exponent < 0 { '-' } else { '+' };
    let _ = write!(s, "e{}{:02}", sign, exponent.unsigned_abs());
}

/// Drop trailing fractional zeros and a dangling decimal point
fn trim_fraction(s: &mut String) {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
}
