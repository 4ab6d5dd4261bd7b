//! Rendered output compared byte for byte against the C library's snprintf.
//!
//! Only glibc is used as the reference, other libcs spell `(nil)`, `inf`
//! and `nan` differently.
#![cfg(all(target_os = "linux", target_env = "gnu"))]

use std::ffi::{c_char, c_int, c_long, c_uint, c_ulong, c_void};

use vmprint::Arg;

macro_rules! check {
    ($fmt:literal $(, $c:expr => $arg:expr)* $(,)?) => {{
        let fmt = concat!($fmt, "\0");
        let mut buf = [0u8; 512];
        let n = unsafe {
            libc::snprintf(buf.as_mut_ptr().cast::<c_char>(), buf.len(), fmt.as_ptr().cast::<c_char>() $(, $c)*)
        };
        assert!(n >= 0 && (n as usize) < buf.len(), "reference failed for {:?}", $fmt);
        let expected = &buf[..n as usize];
        let rendered = vmprint::render($fmt, &[$($arg),*]).unwrap();
        assert_eq!(
            rendered.as_bytes(),
            expected,
            "format {:?}: got {:?}, snprintf gave {:?}",
            $fmt,
            rendered.to_string_lossy(),
            String::from_utf8_lossy(expected),
        );
        assert_eq!(vmprint::measure($fmt, &[$($arg),*]).unwrap(), n as usize);
    }};
}

fn cs(bytes: &'static [u8]) -> *const c_char {
    assert_eq!(bytes.last(), Some(&0));
    bytes.as_ptr().cast()
}

#[test]
fn literal_text() {
    check!("");
    check!("plain text");
    check!("100%% sure");
    check!("%%%%");
}

#[test]
fn signed_integers() {
    check!("%d apples", 7 as c_int => Arg::Int(7));
    check!("[%5d|%-5d|%05d|%+d|% d]",
        42 as c_int => Arg::Int(42),
        42 as c_int => Arg::Int(42),
        -42 as c_int => Arg::Int(-42),
        42 as c_int => Arg::Int(42),
        42 as c_int => Arg::Int(42));
    check!("%.3d|%.0d|%8.3d|%-8.3d|%08.3d",
        7 as c_int => Arg::Int(7),
        0 as c_int => Arg::Int(0),
        -7 as c_int => Arg::Int(-7),
        7 as c_int => Arg::Int(7),
        7 as c_int => Arg::Int(7));
    check!("%i %d", c_int::MIN => Arg::Int(i32::MIN as i64), c_int::MAX => Arg::Int(i32::MAX as i64));
    check!("%ld %lld %lli",
        -1234567890123 as c_long => Arg::Int(-1234567890123),
        i64::MIN => Arg::Int(i64::MIN),
        i64::MAX => Arg::Int(i64::MAX));
    check!("%hhd %hd", 300 as c_int => Arg::Int(300), 70000 as c_int => Arg::Int(70000));
}

#[test]
fn unsigned_integers() {
    check!("%u %lu", -1 as c_int => Arg::Int(-1), c_ulong::MAX => Arg::UInt(u64::MAX));
    check!("%x %X %#x %#X %o %#o",
        0xbeef as c_uint => Arg::UInt(0xbeef),
        0xbeef as c_uint => Arg::UInt(0xbeef),
        0xbeef as c_uint => Arg::UInt(0xbeef),
        0xbeef as c_uint => Arg::UInt(0xbeef),
        8 as c_uint => Arg::UInt(8),
        8 as c_uint => Arg::UInt(8));
    check!("%#x|%#o|%.0u|%#.0o", 0 as c_uint => Arg::UInt(0), 0 as c_uint => Arg::UInt(0),
        0 as c_uint => Arg::UInt(0), 0 as c_uint => Arg::UInt(0));
    check!("%08x|%-8X|%#010x|%.6o", 255 as c_uint => Arg::UInt(255), 255 as c_uint => Arg::UInt(255),
        255 as c_uint => Arg::UInt(255), 255 as c_uint => Arg::UInt(255));
    check!("%hhu %hu %hx", 258 as c_uint => Arg::UInt(258), 65537 as c_uint => Arg::UInt(65537),
        0x12345 as c_uint => Arg::UInt(0x12345));
    check!("%zu %jd %td",
        12345usize => Arg::UInt(12345),
        -7 as libc::intmax_t => Arg::Int(-7),
        -3 as libc::ptrdiff_t => Arg::Int(-3));
}

#[test]
fn characters_and_strings() {
    check!("%c%c%5c|%-3c|",
        b'o' as c_int => Arg::Int(b'o' as i64),
        b'k' as c_int => Arg::Int(b'k' as i64),
        b'x' as c_int => Arg::Int(b'x' as i64),
        b'y' as c_int => Arg::Int(b'y' as i64));
    check!("code=%d msg=%s", 500 as c_int => Arg::Int(500), cs(b"fail\0") => Arg::Str(b"fail"));
    check!("%s|%10s|%-10s|%.2s|%10.3s|%.0s|",
        cs(b"hello\0") => Arg::Str(b"hello"),
        cs(b"hello\0") => Arg::Str(b"hello"),
        cs(b"hello\0") => Arg::Str(b"hello"),
        cs(b"hello\0") => Arg::Str(b"hello"),
        cs(b"hello\0") => Arg::Str(b"hello"),
        cs(b"hello\0") => Arg::Str(b"hello"));
    check!("[%s]", cs(b"\0") => Arg::Str(b""));
}

#[test]
fn star_fields() {
    check!("%*d|%-*d|%*d|%.*s|%.*d",
        6 as c_int => Arg::Int(6),
        42 as c_int => Arg::Int(42),
        6 as c_int => Arg::Int(6),
        42 as c_int => Arg::Int(42),
        -6 as c_int => Arg::Int(-6),
        42 as c_int => Arg::Int(42),
        3 as c_int => Arg::Int(3),
        cs(b"abcdef\0") => Arg::Str(b"abcdef"),
        -1 as c_int => Arg::Int(-1),
        5 as c_int => Arg::Int(5));
}

#[test]
fn pointers() {
    check!("%p|%p|%20p|%-12p|",
        std::ptr::null::<c_void>() => Arg::Ptr(0),
        0xdead_beef_usize as *const c_void => Arg::Ptr(0xdead_beef),
        0x1234_usize as *const c_void => Arg::Ptr(0x1234),
        0x1234_usize as *const c_void => Arg::Ptr(0x1234));
}

#[test]
fn fixed_floats() {
    check!("%f %.2f %10.4f %-10.1f| %+.3f %08.3f",
        3.14159f64 => Arg::Float(3.14159),
        2.675f64 => Arg::Float(2.675),
        1e-5f64 => Arg::Float(1e-5),
        -12.5f64 => Arg::Float(-12.5),
        0.0f64 => Arg::Float(0.0),
        -0.5f64 => Arg::Float(-0.5));
    check!("%.0f %#.0f %.0f %F", 1e22f64 => Arg::Float(1e22), 3.0f64 => Arg::Float(3.0),
        0.25f64 => Arg::Float(0.25), 123.456f64 => Arg::Float(123.456));
    check!("%f % f %+f", -0.0f64 => Arg::Float(-0.0), 1.0f64 => Arg::Float(1.0), 1.0f64 => Arg::Float(1.0));
}

#[test]
fn exponential_floats() {
    check!("%e %.3E %.0e %#.0e %e",
        12345.678f64 => Arg::Float(12345.678),
        0.000123456f64 => Arg::Float(0.000123456),
        12345.678f64 => Arg::Float(12345.678),
        12345.678f64 => Arg::Float(12345.678),
        0.0f64 => Arg::Float(0.0));
    check!("%e %E %15.3e|%-15.2e|", 1e300f64 => Arg::Float(1e300), 1e-300f64 => Arg::Float(1e-300),
        -6.02e23f64 => Arg::Float(-6.02e23), 6.02e23f64 => Arg::Float(6.02e23));
}

#[test]
fn general_floats() {
    check!("%g %g %g %g %g %G",
        100000.0f64 => Arg::Float(100000.0),
        1e6f64 => Arg::Float(1e6),
        0.0001f64 => Arg::Float(0.0001),
        1e-5f64 => Arg::Float(1e-5),
        123456789.0f64 => Arg::Float(123456789.0),
        1.5e-7f64 => Arg::Float(1.5e-7));
    check!("%.3g %.10g %#g %g %.0g %#.3g",
        3.14159f64 => Arg::Float(3.14159),
        (1.0f64 / 3.0) => Arg::Float(1.0 / 3.0),
        1.0f64 => Arg::Float(1.0),
        0.0f64 => Arg::Float(0.0),
        260.0f64 => Arg::Float(260.0),
        0.5f64 => Arg::Float(0.5));
    check!("%10g|%-10g|%010g", 2.5f64 => Arg::Float(2.5), 2.5f64 => Arg::Float(2.5), -2.5f64 => Arg::Float(-2.5));
}

#[test]
fn non_finite_floats() {
    check!("%f %F %e %G %g",
        f64::INFINITY => Arg::Float(f64::INFINITY),
        f64::NEG_INFINITY => Arg::Float(f64::NEG_INFINITY),
        f64::NAN => Arg::Float(f64::NAN),
        f64::NAN => Arg::Float(f64::NAN),
        f64::INFINITY => Arg::Float(f64::INFINITY));
    check!("%8f|%-8f|%08f|%+f", f64::INFINITY => Arg::Float(f64::INFINITY),
        f64::NAN => Arg::Float(f64::NAN), f64::INFINITY => Arg::Float(f64::INFINITY),
        f64::INFINITY => Arg::Float(f64::INFINITY));
}

#[test]
fn long_float_modifier_is_ignored() {
    check!("%lf|%5.1lf", 1.5f64 => Arg::Float(1.5), 2.31f64 => Arg::Float(2.31));
}
