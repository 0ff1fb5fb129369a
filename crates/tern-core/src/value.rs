//! Tagged values
//!
//! A value is a 16-byte `Copy` pair of tag and payload. Primitive payloads
//! (nil, boolean, number, light userdata, light function) live inline;
//! collectable payloads are typed arena ids into the heap. The packed tag
//! byte uses bits 0-3 for the base kind, bits 4-5 for the sub-variant and
//! bit 6 for the collectable flag, so tag predicates cost one compare.

use crate::error::VmResult;
use crate::global::Global;
use crate::heap::{ClosureId, GcRef, ProtoId, StrId, TableId, ThreadId, UpvalId, UserdataId};
use crate::thread::ThreadState;

/// Native function callable from the runtime.
///
/// Receives the global state and the running thread; arguments sit on the
/// thread's stack between the frame base and `top`. Returns the number of
/// results it left on top of the stack.
pub type NativeFn = fn(&mut Global, &mut ThreadState) -> VmResult<i32>;

/// Packed tag bytes. Collectable kinds reuse the numbering of the header
/// tags in `tern-gc` so a value tag and an object header always agree.
pub mod tag {
    use tern_gc::kinds;

    /// Nil.
    pub const NIL: u8 = 0;
    /// Boolean.
    pub const BOOLEAN: u8 = 1;
    /// Light userdata: an opaque pointer-sized payload the runtime does not own.
    pub const LIGHT_USERDATA: u8 = 2;
    /// IEEE-754 double.
    pub const NUMBER: u8 = 3;
    /// Interned short string.
    pub const SHORT_STRING: u8 = kinds::SHORT_STRING;
    /// Long string, hashed lazily.
    pub const LONG_STRING: u8 = kinds::LONG_STRING;
    /// Table.
    pub const TABLE: u8 = kinds::TABLE;
    /// Interpreted closure.
    pub const CLOSURE: u8 = kinds::CLOSURE;
    /// Bare native function pointer (no upvalues, not collectable).
    pub const LIGHT_FUNCTION: u8 = kinds::FUNCTION | 1 << 4;
    /// Native closure with bound upvalues.
    pub const NATIVE_CLOSURE: u8 = kinds::NATIVE_CLOSURE;
    /// Full userdata.
    pub const USERDATA: u8 = kinds::USERDATA;
    /// Thread.
    pub const THREAD: u8 = kinds::THREAD;
    /// Function template.
    pub const PROTO: u8 = kinds::PROTO;
    /// Upvalue cell.
    pub const UPVALUE: u8 = kinds::UPVALUE;
    /// Reclaimed table key retaining its payload.
    pub const DEAD_KEY: u8 = kinds::DEAD_KEY;
    /// Set iff the payload is a heap object traced by the collector.
    pub const COLLECTABLE: u8 = 1 << 6;
}

/// Base kinds, ignoring sub-variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// Nil.
    Nil = 0,
    /// Boolean.
    Boolean = 1,
    /// Light userdata.
    LightUserdata = 2,
    /// Number.
    Number = 3,
    /// String (short or long).
    String = 4,
    /// Table.
    Table = 5,
    /// Function (closure, light function or native closure).
    Function = 6,
    /// Full userdata.
    Userdata = 7,
    /// Thread.
    Thread = 8,
    /// Function template.
    Proto = 9,
    /// Upvalue cell.
    Upvalue = 10,
    /// Dead table key.
    DeadKey = 11,
}

/// Kinds that can carry a per-base-type metatable.
pub const NUM_BASE_KINDS: usize = 9;

impl Kind {
    /// Human-readable kind name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Boolean => "boolean",
            Kind::LightUserdata | Kind::Userdata => "userdata",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Table => "table",
            Kind::Function => "function",
            Kind::Thread => "thread",
            Kind::Proto => "proto",
            Kind::Upvalue => "upvalue",
            Kind::DeadKey => "dead key",
        }
    }
}

/// A tagged runtime value.
#[derive(Debug, Clone, Copy, Default)]
pub enum Value {
    /// Nil.
    #[default]
    Nil,
    /// Boolean.
    Boolean(bool),
    /// IEEE-754 double.
    Number(f64),
    /// Opaque pointer bits owned by the host.
    LightUserdata(usize),
    /// Bare native function pointer.
    LightFunction(NativeFn),
    /// Interned short string.
    ShortStr(StrId),
    /// Long string.
    LongStr(StrId),
    /// Table.
    Table(TableId),
    /// Full userdata.
    Userdata(UserdataId),
    /// Thread.
    Thread(ThreadId),
    /// Function template.
    Proto(ProtoId),
    /// Interpreted closure.
    Closure(ClosureId),
    /// Native closure.
    NativeClosure(ClosureId),
    /// Upvalue cell.
    Upvalue(UpvalId),
    /// Key of a reclaimed entry; payload kept so iteration can step past it.
    DeadKey(GcRef),
}

impl Value {
    /// The packed tag byte: base kind, variant bits, collectable flag.
    pub fn raw_tag(&self) -> u8 {
        match self {
            Value::Nil => tag::NIL,
            Value::Boolean(_) => tag::BOOLEAN,
            Value::Number(_) => tag::NUMBER,
            Value::LightUserdata(_) => tag::LIGHT_USERDATA,
            Value::LightFunction(_) => tag::LIGHT_FUNCTION,
            Value::ShortStr(_) => tag::SHORT_STRING | tag::COLLECTABLE,
            Value::LongStr(_) => tag::LONG_STRING | tag::COLLECTABLE,
            Value::Table(_) => tag::TABLE | tag::COLLECTABLE,
            Value::Userdata(_) => tag::USERDATA | tag::COLLECTABLE,
            Value::Thread(_) => tag::THREAD | tag::COLLECTABLE,
            Value::Proto(_) => tag::PROTO | tag::COLLECTABLE,
            Value::Closure(_) => tag::CLOSURE | tag::COLLECTABLE,
            Value::NativeClosure(_) => tag::NATIVE_CLOSURE | tag::COLLECTABLE,
            Value::Upvalue(_) => tag::UPVALUE | tag::COLLECTABLE,
            Value::DeadKey(_) => tag::DEAD_KEY,
        }
    }

    /// The base kind, ignoring sub-variants.
    pub fn kind(&self) -> Kind {
        match self.raw_tag() & tern_gc::kinds::BASE_MASK {
            0 => Kind::Nil,
            1 => Kind::Boolean,
            2 => Kind::LightUserdata,
            3 => Kind::Number,
            4 => Kind::String,
            5 => Kind::Table,
            6 => Kind::Function,
            7 => Kind::Userdata,
            8 => Kind::Thread,
            9 => Kind::Proto,
            10 => Kind::Upvalue,
            _ => Kind::DeadKey,
        }
    }

    /// Kind name for error messages.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Two values are tag-equal iff their full tags match.
    #[inline]
    pub fn tag_eq(&self, other: &Value) -> bool {
        self.raw_tag() == other.raw_tag()
    }

    /// True iff the payload is a traced heap object.
    #[inline]
    pub fn is_collectable(&self) -> bool {
        self.raw_tag() & tag::COLLECTABLE != 0
    }

    /// True for `nil` and `false` only.
    #[inline]
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Nil test.
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Number test.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// String test (either variant).
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::ShortStr(_) | Value::LongStr(_))
    }

    /// Function test (any variant).
    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Value::Closure(_) | Value::LightFunction(_) | Value::NativeClosure(_)
        )
    }

    /// Numeric payload.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload.
    #[inline]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload (either variant).
    #[inline]
    pub fn as_str_id(&self) -> Option<StrId> {
        match self {
            Value::ShortStr(s) | Value::LongStr(s) => Some(*s),
            _ => None,
        }
    }

    /// Table payload.
    #[inline]
    pub fn as_table(&self) -> Option<TableId> {
        match self {
            Value::Table(t) => Some(*t),
            _ => None,
        }
    }

    /// The heap reference of a collectable value, or of a dead key's
    /// retained payload.
    pub fn gc_ref(&self) -> Option<GcRef> {
        match self {
            Value::ShortStr(s) | Value::LongStr(s) => Some(GcRef::Str(*s)),
            Value::Table(t) => Some(GcRef::Table(*t)),
            Value::Userdata(u) => Some(GcRef::Userdata(*u)),
            Value::Thread(t) => Some(GcRef::Thread(*t)),
            Value::Proto(p) => Some(GcRef::Proto(*p)),
            Value::Closure(c) | Value::NativeClosure(c) => Some(GcRef::Closure(*c)),
            Value::Upvalue(u) => Some(GcRef::Upvalue(*u)),
            Value::DeadKey(r) => Some(*r),
            _ => None,
        }
    }

    /// Copy tag and payload from `src`.
    #[inline]
    pub fn assign(&mut self, src: &Value) {
        *self = *src;
    }
}

/// Arithmetic operations over numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Floor division.
    IntDiv,
    /// Floored modulo.
    Mod,
    /// Exponentiation.
    Pow,
    /// Negation (ignores the second operand).
    Neg,
}

/// IEEE-754 arithmetic; division by zero and overflow follow the format,
/// modulo and floor division are floored.
pub fn arith(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::IntDiv => (a / b).floor(),
        ArithOp::Mod => a - (a / b).floor() * b,
        ArithOp::Pow => a.powf(b),
        ArithOp::Neg => -a,
    }
}

/// Value of an ASCII hex digit. The caller guarantees `c` is one.
pub fn hex_value(c: u8) -> u32 {
    if c.is_ascii_digit() {
        (c - b'0') as u32
    } else {
        (c.to_ascii_lowercase() - b'a' + 10) as u32
    }
}

/// Hexadecimal constant with optional fraction and binary exponent,
/// following the C99 `strtod` grammar. Returns the value and the byte
/// offset one past the last accepted character.
fn parse_hex_number(s: &[u8]) -> Option<(f64, usize)> {
    let mut i = 0;
    while i < s.len() && s[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut neg = false;
    if i < s.len() && (s[i] == b'-' || s[i] == b'+') {
        neg = s[i] == b'-';
        i += 1;
    }
    if !(i + 1 < s.len() && s[i] == b'0' && (s[i + 1] | 0x20) == b'x') {
        return None;
    }
    i += 2;
    let mut r = 0.0f64;
    let mut int_digits = 0;
    while i < s.len() && s[i].is_ascii_hexdigit() {
        r = r * 16.0 + hex_value(s[i]) as f64;
        int_digits += 1;
        i += 1;
    }
    let mut frac_digits = 0i32;
    if i < s.len() && s[i] == b'.' {
        i += 1;
        while i < s.len() && s[i].is_ascii_hexdigit() {
            r = r * 16.0 + hex_value(s[i]) as f64;
            frac_digits += 1;
            i += 1;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    let mut e = frac_digits * -4; // each fractional digit divides by 2^4
    let mut end = i;
    if i < s.len() && (s[i] | 0x20) == b'p' {
        let mut j = i + 1;
        let mut exp_neg = false;
        if j < s.len() && (s[j] == b'-' || s[j] == b'+') {
            exp_neg = s[j] == b'-';
            j += 1;
        }
        if j < s.len() && s[j].is_ascii_digit() {
            let mut exp = 0i32;
            while j < s.len() && s[j].is_ascii_digit() {
                exp = exp.saturating_mul(10).saturating_add((s[j] - b'0') as i32);
                j += 1;
            }
            e += if exp_neg { -exp } else { exp };
            end = j;
        }
        // no digit after 'p': the exponent marker is not part of the number
    }
    let v = r * (2.0f64).powi(e);
    Some((if neg { -v } else { v }, end))
}

/// Parse a numeral: decimal, or hexadecimal with `0x` prefix, optional
/// fraction and `p` binary exponent. Tolerates surrounding whitespace,
/// requires at least one digit, rejects `inf`/`nan` tokens, and fails if
/// anything but whitespace trails the number.
pub fn str_to_number(s: &str) -> Option<f64> {
    if s.bytes().any(|b| b == b'n' || b == b'N') {
        return None; // reject 'inf' and 'nan'
    }
    if s.bytes().any(|b| b == b'x' || b == b'X') {
        let (v, end) = parse_hex_number(s.as_bytes())?;
        if s.as_bytes()[end..].iter().all(u8::is_ascii_whitespace) {
            Some(v)
        } else {
            None
        }
    } else {
        let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
        if t.is_empty() { None } else { t.parse().ok() }
    }
}

/// Encode a count as a "floating byte" `(eeeeexxx)`: the value is
/// `(1xxx) * 2^(eeeee-1)` when `eeeee != 0`, else `xxx`. Used for compact
/// table-size statistics.
pub fn int_to_float_byte(mut x: u32) -> u32 {
    let mut e = 0; // exponent
    if x < 8 {
        return x;
    }
    while x >= 0x10 {
        x = (x + 1) >> 1;
        e += 1;
    }
    ((e + 1) << 3) | (x - 8)
}

/// Inverse of [`int_to_float_byte`].
pub fn float_byte_to_int(x: u32) -> u32 {
    let e = (x >> 3) & 0x1f;
    if e == 0 { x } else { ((x & 7) + 8) << (e - 1) }
}

/// Smallest `l` with `2^l >= x`.
pub fn ceil_log2(x: u32) -> u32 {
    #[rustfmt::skip]
    static LOG_2: [u8; 256] = [
        0,1,2,2,3,3,3,3,4,4,4,4,4,4,4,4,5,5,5,5,5,5,5,5,5,5,5,5,5,5,5,5,
        6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,6,
        7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
        7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
        8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,
        8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,
        8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,
        8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,8,
    ];
    let mut l = 0;
    let mut x = x.wrapping_sub(1);
    while x >= 256 {
        l += 8;
        x >>= 8;
    }
    l + LOG_2[x as usize] as u32
}

/// Maximum length of a chunk identifier, including the decoration.
pub const ID_SIZE: usize = 60;

fn first_n_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn last_n_chars(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if total <= n {
        return s;
    }
    match s.char_indices().nth(total - n) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

/// Produce a human-readable identifier for a chunk of source.
///
/// `=literal` yields the literal (right-truncated); `@filename` yields the
/// filename, `...`-prefixed when truncated on the left; anything else is
/// wrapped as `[string "first-line"]`, `...`-truncated.
pub fn chunk_id(source: &str, max: usize) -> String {
    const RETS: &str = "...";
    const PRE: &str = "[string \"";
    const POS: &str = "\"]";

    if let Some(rest) = source.strip_prefix('=') {
        // 'literal' source
        if rest.chars().count() < max {
            rest.to_string()
        } else {
            first_n_chars(rest, max - 1).to_string()
        }
    } else if let Some(rest) = source.strip_prefix('@') {
        // file name
        if rest.chars().count() < max {
            rest.to_string()
        } else {
            let keep = max.saturating_sub(RETS.len() + 1);
            format!("{}{}", RETS, last_n_chars(rest, keep))
        }
    } else {
        // string; format as [string "source"]
        let avail = max.saturating_sub(PRE.len() + RETS.len() + POS.len() + 1);
        let line = source.split('\n').next().unwrap_or("");
        let one_line = line.len() == source.len();
        if one_line && line.chars().count() < avail {
            format!("{}{}{}", PRE, line, POS)
        } else {
            format!("{}{}{}{}", PRE, first_n_chars(line, avail), RETS, POS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_exclusivity() {
        // exactly one base kind per value, and the collectable bit tracks
        // the kind class
        let vals = [
            Value::Nil,
            Value::Boolean(true),
            Value::Number(1.5),
            Value::LightUserdata(0xdead),
        ];
        for v in &vals {
            assert!(!v.is_collectable());
            assert_eq!(v.raw_tag() & 0x0f, v.kind() as u8);
        }
    }

    #[test]
    fn collectable_bit_tracks_kind() {
        use crate::heap::{GcRef, StrId, TableId};
        use tern_gc::Id;
        let s = Value::ShortStr(StrId::from_u32(0));
        assert!(s.is_collectable());
        assert_eq!(s.kind(), Kind::String);
        let t = Value::Table(TableId::from_u32(3));
        assert!(t.is_collectable());
        assert_eq!(t.kind(), Kind::Table);
        // a dead key retains its payload but is no longer collectable
        let d = Value::DeadKey(GcRef::Str(StrId::from_u32(0)));
        assert!(!d.is_collectable());
        assert_eq!(d.kind(), Kind::DeadKey);
        assert!(d.gc_ref().is_some());
    }

    #[test]
    fn falsey_values() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Boolean(false).is_falsey());
        assert!(!Value::Boolean(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
    }

    #[test]
    fn tag_equality_ignores_number_payload() {
        assert!(Value::Number(1.0).tag_eq(&Value::Number(2.0)));
        assert!(!Value::Number(1.0).tag_eq(&Value::Nil));
    }

    #[test]
    fn assign_copies_tag_and_payload() {
        let mut dst = Value::Nil;
        dst.assign(&Value::Number(7.0));
        assert_eq!(dst.as_number(), Some(7.0));
    }

    #[test]
    fn value_fits_two_words() {
        assert!(std::mem::size_of::<Value>() <= 16);
    }

    #[test]
    fn floor_mod_and_div() {
        assert_eq!(arith(ArithOp::Mod, 5.0, 3.0), 2.0);
        assert_eq!(arith(ArithOp::Mod, -5.0, 3.0), 1.0);
        assert_eq!(arith(ArithOp::Mod, 5.0, -3.0), -1.0);
        assert_eq!(arith(ArithOp::IntDiv, 7.0, 2.0), 3.0);
        assert_eq!(arith(ArithOp::IntDiv, -7.0, 2.0), -4.0);
        assert_eq!(arith(ArithOp::Neg, 2.5, 0.0), -2.5);
    }

    #[test]
    fn parse_decimal() {
        assert_eq!(str_to_number("42"), Some(42.0));
        assert_eq!(str_to_number("  3.5  "), Some(3.5));
        assert_eq!(str_to_number("-0.5e2"), Some(-50.0));
        assert_eq!(str_to_number(".5"), Some(0.5));
        assert_eq!(str_to_number(""), None);
        assert_eq!(str_to_number("  "), None);
        assert_eq!(str_to_number("10a"), None);
    }

    #[test]
    fn parse_rejects_inf_and_nan() {
        assert_eq!(str_to_number("inf"), None);
        assert_eq!(str_to_number("nan"), None);
        assert_eq!(str_to_number("-inf"), None);
    }

    #[test]
    fn parse_hex() {
        assert_eq!(str_to_number("0x10"), Some(16.0));
        assert_eq!(str_to_number("0X1p4"), Some(16.0));
        assert_eq!(str_to_number("0x.8"), Some(0.5));
        assert_eq!(str_to_number("0x1.8p1"), Some(3.0));
        assert_eq!(str_to_number("-0x2"), Some(-2.0));
        assert_eq!(str_to_number(" 0xA "), Some(10.0));
        assert_eq!(str_to_number("0x"), None);
        assert_eq!(str_to_number("0x1pz"), None); // trailing garbage
    }

    #[test]
    fn float_byte_round_trip() {
        for x in [0u32, 1, 7, 8, 15, 16, 100, 1000, 1 << 20] {
            let fb = int_to_float_byte(x);
            let back = float_byte_to_int(fb);
            // encoding rounds up within its precision
            assert!(back >= x, "{back} < {x}");
            assert!(fb < 256);
        }
        assert_eq!(float_byte_to_int(int_to_float_byte(5)), 5);
    }

    #[test]
    fn ceil_log2_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(256), 8);
        assert_eq!(ceil_log2(257), 9);
        assert_eq!(ceil_log2(1 << 30), 30);
    }

    #[test]
    fn chunk_ids() {
        assert_eq!(chunk_id("=stdin", ID_SIZE), "stdin");
        assert_eq!(chunk_id("@script.trn", ID_SIZE), "script.trn");
        assert_eq!(chunk_id("return 1", ID_SIZE), "[string \"return 1\"]");

        // long file names keep their tail
        let long = format!("@{}", "d/".repeat(64));
        let id = chunk_id(&long, ID_SIZE);
        assert!(id.starts_with("..."));
        assert!(id.len() <= ID_SIZE);

        // multi-line sources truncate at the first newline
        let id = chunk_id("local x = 1\nreturn x", ID_SIZE);
        assert_eq!(id, "[string \"local x = 1...\"]");
    }

    #[test]
    fn hex_digit_values() {
        assert_eq!(hex_value(b'0'), 0);
        assert_eq!(hex_value(b'9'), 9);
        assert_eq!(hex_value(b'a'), 10);
        assert_eq!(hex_value(b'F'), 15);
    }
}
