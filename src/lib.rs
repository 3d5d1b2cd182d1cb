/*!
Conversion of raw delimited-text fields into typed, fixed-layout record
slots.

This crate is the piece of a columnar scan that sits between "the input has
been split into fields" and "the record holds typed values." It has two jobs:

1. **Escape resolution.** When a delimiter byte can appear literally inside a
   field, it arrives escaped. [`TextConverter::unescape`] produces a compacted
   copy of a field with its escape bytes removed, allocating from a caller
   supplied [`Arena`].
2. **Slot writing.** [`TextConverter::writer`] builds, once per column at plan
   time, a [`SlotWriter`] specialized to one slot of a [`RecordLayout`]: a
   function that parses one text field and stores the result directly at the
   slot's byte offset, or marks the slot null. The specialization happens when
   the writer is built, not per row; the returned function contains a direct
   call to one type's parser and no dispatch of any kind.

Writer generation can decline (it returns `None`) when a case is unsupported,
most notably text slots while an escape byte is configured. Callers keep the
interpreted [`TextConverter::write_slot`] around as the fallback path for
declined columns; it handles every case, at the cost of per-row dispatch.

# Records and nulls

A record is a plain byte buffer described by a [`RecordLayout`]: a null bitmap
in the leading bytes, then each slot at a fixed, aligned offset. A zeroed
buffer reads as "no slot is null"; writers set a slot's null bit when a field
is empty (the null sentinel) or fails to parse. See [`RecordLayout`] for the
reading side.

# Example

```
use textconv::{RecordLayout, SlotType, TextConverter};

let layout = RecordLayout::new(&[SlotType::Int32, SlotType::Float64]);
let conv = TextConverter::new(None);

let id = conv.writer(&layout, 0).unwrap();
let score = conv.writer(&layout, 1).unwrap();

let mut record = layout.new_record();
assert!(id.write(&mut record, b"7"));
assert!(score.write(&mut record, b"0.5"));
assert_eq!(layout.slot(0).get_i32(&record), Some(7));
assert_eq!(layout.slot(1).get_f64(&record), Some(0.5));

// A field that does not parse leaves the slot null and reports failure.
assert!(!id.write(&mut record, b"7x"));
assert!(layout.slot(0).is_null(&record));

// An empty field is a valid null, not an error.
assert!(score.write(&mut record, b""));
assert_eq!(layout.slot(1).get_f64(&record), None);
```
*/

pub use crate::arena::Arena;
pub use crate::converter::{SlotWriter, TextConverter};
pub use crate::layout::{RecordLayout, Slot, SlotType};

mod arena;
mod converter;
mod layout;
pub mod parse;
