/*!
Field parsers for the supported slot types.

Each parser turns the raw bytes of one text field into a value of one type.
`None` is the shared failure sentinel: it covers non-UTF-8 bytes, malformed
literals and out-of-range values alike, without distinguishing between them.
Callers that want to treat out-of-range input differently from garbage have
no way to do so through this interface.

Parsing is strict. The whole field must be one literal of the target type
and no surrounding whitespace is accepted. Integers take an optional sign
and decimal digits. Booleans are exactly `true` or `false`. Floats use
standard syntax, including exponents, `inf` and `NaN`.
*/

use std::str;

macro_rules! parse_num {
    ($name:ident, $ty:ty) => {
        /// Parse one text field as this type. `None` on failure.
        #[inline]
        pub fn $name(field: &[u8]) -> Option<$ty> {
            str::from_utf8(field).ok()?.parse().ok()
        }
    };
}

parse_num!(parse_bool, bool);
parse_num!(parse_i8, i8);
parse_num!(parse_i16, i16);
parse_num!(parse_i32, i32);
parse_num!(parse_i64, i64);
parse_num!(parse_f32, f32);
parse_num!(parse_f64, f64);
