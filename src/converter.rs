use std::fmt;
use std::mem;

use memchr::memchr;
use tracing::warn;

use crate::arena::Arena;
use crate::layout::{RecordLayout, Slot, SlotType};
use crate::parse;

/// Converts raw delimited-text fields into typed record slots.
///
/// A converter is configured once, with at most one escape byte, and holds no
/// other state. It offers three operations to the scan:
///
/// * [`unescape`](TextConverter::unescape) produces a compacted copy of a
///   field with its escape bytes resolved;
/// * [`writer`](TextConverter::writer) builds a [`SlotWriter`] specialized
///   to one slot, to be cached and applied per row;
/// * [`write_slot`](TextConverter::write_slot) is the interpreted per-row
///   path, for columns where writer generation declined.
#[derive(Clone, Debug)]
pub struct TextConverter {
    escape: Option<u8>,
}

/// How a generated writer stores one parsed value at its slot offset.
trait StoreSlot {
    fn store(self, dst: &mut [u8]);
}

macro_rules! store_num {
    ($ty:ty) => {
        impl StoreSlot for $ty {
            #[inline]
            fn store(self, dst: &mut [u8]) {
                dst[..mem::size_of::<$ty>()]
                    .copy_from_slice(&self.to_ne_bytes());
            }
        }
    };
}

impl StoreSlot for bool {
    #[inline]
    fn store(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
}

store_num!(i8);
store_num!(i16);
store_num!(i32);
store_num!(i64);
store_num!(f32);
store_num!(f64);

impl TextConverter {
    /// Create a converter. `escape` is the configured escape byte, or `None`
    /// when no escaping is in effect.
    pub fn new(escape: Option<u8>) -> TextConverter {
        TextConverter { escape }
    }

    /// The configured escape byte, if any.
    pub fn escape(&self) -> Option<u8> {
        self.escape
    }

    /// Copy `src` into `dst`, resolving escapes.
    ///
    /// A lone escape byte is dropped and the byte after it is kept
    /// literally; a doubled escape collapses to one literal escape byte; an
    /// escape dangling at the end of the input is dropped. With no escape
    /// byte configured this is a plain copy.
    ///
    /// Returns the number of bytes written, which is never more than
    /// `src.len()`. This routine cannot fail.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than `src`.
    pub fn unescape_into(&self, src: &[u8], dst: &mut [u8]) -> usize {
        let escape = match self.escape {
            Some(escape) => escape,
            None => {
                dst[..src.len()].copy_from_slice(src);
                return src.len();
            }
        };
        // Bulk-copy everything up to the first escape byte; most fields
        // have none.
        let start = memchr(escape, src).unwrap_or(src.len());
        dst[..start].copy_from_slice(&src[..start]);
        let mut nout = start;
        let mut escaped = false;
        for &b in &src[start..] {
            escaped = b == escape && !escaped;
            if !escaped {
                dst[nout] = b;
                nout += 1;
            }
        }
        nout
    }

    /// Produce a compacted copy of `field` with its escapes resolved,
    /// allocated from `arena`.
    ///
    /// The source buffer is left untouched; the scan repoints its field at
    /// the returned slice. The copy lives as long as the arena.
    pub fn unescape<'a>(&self, field: &[u8], arena: &'a Arena) -> &'a [u8] {
        let dst = arena.alloc(field.len());
        let n = self.unescape_into(field, dst);
        &dst[..n]
    }

    /// Build a writer specialized to `slot` of `layout`, or decline.
    ///
    /// This runs once per column when a scan is planned; the returned writer
    /// is then applied to every row. The slot's parser is selected here, so
    /// the writer itself performs no type dispatch.
    ///
    /// Generation declines (returns `None`) for text slots while an escape
    /// byte is configured: the generated text path stores a view into the
    /// original field, which would be wrong for a field that still carries
    /// escape bytes. Declined columns go through
    /// [`write_slot`](TextConverter::write_slot) instead. A decline is an
    /// expected outcome, not an error; it is logged as a warning.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range for `layout`.
    pub fn writer(
        &self,
        layout: &RecordLayout,
        slot: usize,
    ) -> Option<SlotWriter> {
        let slot = layout.slot(slot);
        if slot.ty().is_text() && self.escape.is_some() {
            warn!(
                offset = slot.offset(),
                "declining slot writer: text slots with escaping in effect \
                 must take the interpreted path"
            );
            return None;
        }
        Some(match slot.ty() {
            SlotType::Bool => parse_writer(slot, parse::parse_bool),
            SlotType::Int8 => parse_writer(slot, parse::parse_i8),
            SlotType::Int16 => parse_writer(slot, parse::parse_i16),
            SlotType::Int32 => parse_writer(slot, parse::parse_i32),
            SlotType::Int64 => parse_writer(slot, parse::parse_i64),
            SlotType::Float32 => parse_writer(slot, parse::parse_f32),
            SlotType::Float64 => parse_writer(slot, parse::parse_f64),
            SlotType::Text => text_writer(slot),
        })
    }

    /// Parse `field` and store it into `slot` of `record`, dispatching on
    /// the slot type per call.
    ///
    /// This is the interpreted counterpart of a generated writer, with the
    /// same contract: an empty field stores a null and returns `true`; a
    /// field that parses stores the value and returns `true`; a field that
    /// does not parse stores a null and returns `false`. Unlike the
    /// generated text path, escaped text is supported here: the field is
    /// unescaped through `arena` and the slot's view points at the compacted
    /// copy, so the arena must stay alive for as long as the record is read.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range for `layout`.
    pub fn write_slot(
        &self,
        layout: &RecordLayout,
        slot: usize,
        record: &mut [u8],
        field: &[u8],
        arena: &Arena,
    ) -> bool {
        let slot = layout.slot(slot);
        if field.is_empty() {
            slot.set_null(record);
            return true;
        }
        match slot.ty() {
            SlotType::Text => {
                if self.escape.is_some() {
                    let unescaped = self.unescape(field, arena);
                    slot.store_text(record, unescaped);
                } else {
                    slot.store_text(record, field);
                }
                true
            }
            SlotType::Bool => {
                store_parsed(slot, record, parse::parse_bool(field))
            }
            SlotType::Int8 => {
                store_parsed(slot, record, parse::parse_i8(field))
            }
            SlotType::Int16 => {
                store_parsed(slot, record, parse::parse_i16(field))
            }
            SlotType::Int32 => {
                store_parsed(slot, record, parse::parse_i32(field))
            }
            SlotType::Int64 => {
                store_parsed(slot, record, parse::parse_i64(field))
            }
            SlotType::Float32 => {
                store_parsed(slot, record, parse::parse_f32(field))
            }
            SlotType::Float64 => {
                store_parsed(slot, record, parse::parse_f64(field))
            }
        }
    }
}

type WriteFn = Box<dyn Fn(&mut [u8], &[u8]) -> bool + Send + Sync + 'static>;

/// A function that parses one text field and stores the result into one slot
/// of a record.
///
/// Writers are built once per column by [`TextConverter::writer`] and applied
/// per row. A writer is immutable and holds no per-invocation state: it may
/// be shared across threads and invoked concurrently, as long as concurrent
/// invocations target disjoint records.
pub struct SlotWriter {
    run: WriteFn,
}

impl SlotWriter {
    /// Parse `field` and store it into this writer's slot of `record`.
    ///
    /// Exactly one of two things happens to the slot: it receives a value,
    /// or it is marked null. Returns `false` only when the field failed to
    /// parse (the slot is then null); an empty field is stored as a valid
    /// null and reported as success. Callers that must tell a valid null
    /// from a rejected field check the slot's null bit as well.
    ///
    /// `record` must be a zero-initialized buffer of at least the layout's
    /// record size.
    #[inline]
    pub fn write(&self, record: &mut [u8], field: &[u8]) -> bool {
        (self.run)(record, field)
    }
}

impl fmt::Debug for SlotWriter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SlotWriter").finish()
    }
}

/// Build a writer around the one parser chosen for a slot's type.
fn parse_writer<T, P>(slot: Slot, parse: P) -> SlotWriter
where
    T: StoreSlot + 'static,
    P: Fn(&[u8]) -> Option<T> + Send + Sync + 'static,
{
    SlotWriter {
        run: Box::new(move |record, field| {
            if field.is_empty() {
                slot.set_null(record);
                return true;
            }
            match parse(field) {
                Some(v) => {
                    v.store(&mut record[slot.offset()..]);
                    true
                }
                None => {
                    slot.set_null(record);
                    false
                }
            }
        }),
    }
}

/// Build a writer that stores a (pointer, length) view of the field. No
/// parsing occurs, so this writer cannot fail.
fn text_writer(slot: Slot) -> SlotWriter {
    SlotWriter {
        run: Box::new(move |record, field| {
            if field.is_empty() {
                slot.set_null(record);
                return true;
            }
            slot.store_text(record, field);
            true
        }),
    }
}

fn store_parsed<T: StoreSlot>(
    slot: Slot,
    record: &mut [u8],
    parsed: Option<T>,
) -> bool {
    match parsed {
        Some(v) => {
            v.store(&mut record[slot.offset()..]);
            true
        }
        None => {
            slot.set_null(record);
            false
        }
    }
}
