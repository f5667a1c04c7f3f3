//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Fixed-width primitives stored in sensor files.
use bytes::{Buf, BufMut};

use crate::schema::FieldValue;

/// A value with a fixed encoded width.
///
/// `read` is only called after the record codec has checked that the whole
/// record is available, so implementations never see a short buffer.
pub trait WireField: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Read one value from the front of `buf`.
    fn read<B: Buf>(buf: &mut B) -> Self;

    /// Append the encoded value to `buf`.
    fn write<B: BufMut>(&self, buf: &mut B);

    /// Append the value(s) in schema order, flattening arrays.
    fn push_values(&self, out: &mut Vec<FieldValue>);
}

impl WireField for bool {
    const WIDTH: usize = 1;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_u8() != 0
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Bool(*self));
    }
}

impl WireField for u8 {
    const WIDTH: usize = 1;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_u8()
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(*self);
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Unsigned(u64::from(*self)));
    }
}

impl WireField for u32 {
    const WIDTH: usize = 4;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_u32_le()
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(*self);
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Unsigned(u64::from(*self)));
    }
}

impl WireField for i16 {
    const WIDTH: usize = 2;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_i16_le()
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(*self);
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Signed(i64::from(*self)));
    }
}

impl WireField for i32 {
    const WIDTH: usize = 4;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_i32_le()
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32_le(*self);
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Signed(i64::from(*self)));
    }
}

impl WireField for i64 {
    const WIDTH: usize = 8;

    fn read<B: Buf>(buf: &mut B) -> Self {
        buf.get_i64_le()
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_i64_le(*self);
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        out.push(FieldValue::Signed(*self));
    }
}

/// Per-phase arrays are stored element after element.
impl<T: WireField, const N: usize> WireField for [T; N] {
    const WIDTH: usize = T::WIDTH * N;

    fn read<B: Buf>(buf: &mut B) -> Self {
        std::array::from_fn(|_| T::read(&mut *buf))
    }

    fn write<B: BufMut>(&self, buf: &mut B) {
        for item in self {
            item.write(buf);
        }
    }

    fn push_values(&self, out: &mut Vec<FieldValue>) {
        for item in self {
            item.push_values(out);
        }
    }
}
