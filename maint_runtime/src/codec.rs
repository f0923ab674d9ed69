//! Collection codec: fixed-layout binary records.
//!
//! File layout (all integers i32 LE, all amounts f32 LE):
//!   [count][counter?][record][record]...
//!
//! Text fields: [len][bytes + NUL]; len counts the NUL, 0 means absent.
//! Dates and timestamps: day, month, year (+ hour, minute, second);
//! year 0 means unset. Optional identifiers: 0 means unset.
//!
//! Decoding is strict: short input, unknown enum codes, negative lengths
//! and trailing bytes are all errors.

use thiserror::Error;

use maint_engine::domain::{
    Activity, Asset, AssetCategory, AssetState, CalendarDate, Department, MaintenanceType,
    Material, Order, OrderState, Priority, Specialty, Technician, TechnicianState, Timestamp,
};
use maint_engine::error::UnknownCode;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("truncated input: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("negative {what} {value} at offset {offset}")]
    Negative {
        what: &'static str,
        value: i32,
        offset: usize,
    },
    #[error("text at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
    #[error("{count} unexpected trailing bytes")]
    TrailingBytes { count: usize },
}

// ---------------------------------------------------------------------------
// Primitive writer / reader
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_text(&mut self, value: Option<&str>) {
        match value {
            None => self.put_i32(0),
            Some(text) => {
                let len = i32::try_from(text.len() + 1).unwrap_or(i32::MAX);
                self.put_i32(len);
                self.buf.extend_from_slice(text.as_bytes());
                self.buf.push(0);
            }
        }
    }

    pub fn put_date(&mut self, date: Option<CalendarDate>) {
        let d = date.unwrap_or(CalendarDate { day: 0, month: 0, year: 0 });
        self.put_i32(d.day);
        self.put_i32(d.month);
        self.put_i32(d.year);
    }

    pub fn put_timestamp(&mut self, ts: Option<Timestamp>) {
        let t = ts.unwrap_or(Timestamp {
            day: 0,
            month: 0,
            year: 0,
            hour: 0,
            minute: 0,
            second: 0,
        });
        for field in [t.day, t.month, t.year, t.hour, t.minute, t.second] {
            self.put_i32(field);
        }
    }

    pub fn put_optional_id(&mut self, id: Option<i32>) {
        self.put_i32(id.unwrap_or(0));
    }
}

pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(needed)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CodecError::Truncated {
                offset: self.pos,
                needed,
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_4(&mut self) -> Result<[u8; 4], CodecError> {
        let mut word = [0u8; 4];
        word.copy_from_slice(self.take(4)?);
        Ok(word)
    }

    pub fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take_4()?))
    }

    pub fn f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take_4()?))
    }

    /// A count or length; negative values are rejected.
    pub fn length(&mut self, what: &'static str) -> Result<usize, CodecError> {
        let offset = self.pos;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| CodecError::Negative { what, value, offset })
    }

    pub fn code<T: TryFrom<i32, Error = UnknownCode>>(&mut self) -> Result<T, CodecError> {
        Ok(T::try_from(self.i32()?)?)
    }

    pub fn text(&mut self) -> Result<Option<String>, CodecError> {
        let len = self.length("text length")?;
        if len == 0 {
            return Ok(None);
        }
        let offset = self.pos;
        let raw = self.take(len)?;
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        String::from_utf8(raw.to_vec())
            .map(Some)
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    pub fn date(&mut self) -> Result<Option<CalendarDate>, CodecError> {
        let date = CalendarDate {
            day: self.i32()?,
            month: self.i32()?,
            year: self.i32()?,
        };
        Ok((date.year != 0).then_some(date))
    }

    pub fn timestamp(&mut self) -> Result<Option<Timestamp>, CodecError> {
        let ts = Timestamp {
            day: self.i32()?,
            month: self.i32()?,
            year: self.i32()?,
            hour: self.i32()?,
            minute: self.i32()?,
            second: self.i32()?,
        };
        Ok((ts.year != 0).then_some(ts))
    }

    pub fn optional_id(&mut self) -> Result<Option<i32>, CodecError> {
        let id = self.i32()?;
        Ok((id != 0).then_some(id))
    }

    pub fn finish(self) -> Result<(), CodecError> {
        let count = self.bytes.len() - self.pos;
        if count > 0 {
            return Err(CodecError::TrailingBytes { count });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A record with a fixed binary layout inside its collection file.
pub trait BinaryRecord: Sized {
    /// Whether the file header carries a running counter after the count.
    const HAS_COUNTER: bool;

    fn encode(&self, out: &mut Encoder);
    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError>;
}

impl BinaryRecord for Department {
    const HAS_COUNTER: bool = false;

    fn encode(&self, out: &mut Encoder) {
        out.put_i32(self.id);
        out.put_i32(self.activity.code());
        out.put_text(self.name.as_deref());
        out.put_text(self.responsible.as_deref());
        out.put_text(self.contact.as_deref());
    }

    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            id: input.i32()?,
            activity: input.code::<Activity>()?,
            name: input.text()?,
            responsible: input.text()?,
            contact: input.text()?,
        })
    }
}

impl BinaryRecord for Asset {
    const HAS_COUNTER: bool = true;

    fn encode(&self, out: &mut Encoder) {
        out.put_i32(self.id);
        out.put_i32(self.category.code());
        out.put_i32(self.state.code());
        out.put_f32(self.unit_cost);
        out.put_f32(self.accrued_cost);
        out.put_i32(self.department_id);
        out.put_date(Some(self.acquired));
        out.put_date(self.decommissioned);
        out.put_i32(self.corrective_count);
        out.put_text(self.name.as_deref());
        out.put_text(self.location.as_deref());
    }

    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let id = input.i32()?;
        let category = input.code::<AssetCategory>()?;
        let state = input.code::<AssetState>()?;
        let unit_cost = input.f32()?;
        let accrued_cost = input.f32()?;
        let department_id = input.i32()?;
        let acquired = input
            .date()?
            .unwrap_or(CalendarDate { day: 0, month: 0, year: 0 });
        let decommissioned = input.date()?;
        let corrective_count = input.i32()?;
        Ok(Self {
            id,
            name: input.text()?,
            category,
            location: input.text()?,
            acquired,
            decommissioned,
            state,
            corrective_count,
            accrued_cost,
            unit_cost,
            department_id,
        })
    }
}

impl BinaryRecord for Technician {
    const HAS_COUNTER: bool = true;

    fn encode(&self, out: &mut Encoder) {
        out.put_i32(self.id);
        out.put_optional_id(self.order_id);
        out.put_i32(self.specialty.code());
        out.put_i32(self.state.code());
        out.put_text(self.name.as_deref());
    }

    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let id = input.i32()?;
        let order_id = input.optional_id()?;
        let specialty = input.code::<Specialty>()?;
        let state = input.code::<TechnicianState>()?;
        Ok(Self {
            id,
            name: input.text()?,
            specialty,
            state,
            order_id,
        })
    }
}

impl BinaryRecord for Order {
    const HAS_COUNTER: bool = true;

    fn encode(&self, out: &mut Encoder) {
        out.put_i32(self.id);
        out.put_i32(self.asset_id);
        out.put_i32(self.department_id);
        out.put_optional_id(self.technician_id);
        out.put_i32(self.kind.code());
        out.put_i32(self.priority.code());
        out.put_i32(self.state.code());
        out.put_timestamp(self.started);
        out.put_timestamp(self.ended);
    }

    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let id = input.i32()?;
        let asset_id = input.i32()?;
        let department_id = input.i32()?;
        let technician_id = input.optional_id()?;
        let kind = input.code::<MaintenanceType>()?;
        let priority = input.code::<Priority>()?;
        let state = input.code::<OrderState>()?;
        Ok(Self {
            id,
            asset_id,
            department_id,
            technician_id,
            state,
            priority,
            kind,
            started: input.timestamp()?,
            ended: input.timestamp()?,
        })
    }
}

impl BinaryRecord for Material {
    const HAS_COUNTER: bool = false;

    fn encode(&self, out: &mut Encoder) {
        out.put_i32(self.quantity);
        out.put_f32(self.unit_cost);
        out.put_i32(self.order_id);
        out.put_text(self.name.as_deref());
    }

    fn decode(input: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let quantity = input.i32()?;
        let unit_cost = input.f32()?;
        let order_id = input.i32()?;
        Ok(Self {
            name: input.text()?,
            unit_cost,
            quantity,
            order_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Whole collections
// ---------------------------------------------------------------------------

/// Decoded contents of one collection file.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionFile<T> {
    /// Stored running counter; `None` for collections without one.
    pub counter: Option<i32>,
    pub records: Vec<T>,
}

impl<T> CollectionFile<T> {
    pub fn empty() -> Self {
        Self {
            counter: None,
            records: Vec::new(),
        }
    }
}

pub fn encode_collection<T: BinaryRecord>(records: &[T], counter: i32) -> Vec<u8> {
    let mut out = Encoder::new();
    out.put_i32(i32::try_from(records.len()).unwrap_or(i32::MAX));
    if T::HAS_COUNTER {
        out.put_i32(counter);
    }
    for record in records {
        record.encode(&mut out);
    }
    out.into_bytes()
}

pub fn decode_collection<T: BinaryRecord>(bytes: &[u8]) -> Result<CollectionFile<T>, CodecError> {
    let mut input = Decoder::new(bytes);
    let count = input.length("record count")?;
    let counter = if T::HAS_COUNTER {
        Some(input.i32()?)
    } else {
        None
    };
    // Each record is at least four bytes; cap the reservation by what the
    // input could possibly hold.
    let mut records = Vec::with_capacity(count.min(bytes.len() / 4));
    for _ in 0..count {
        records.push(T::decode(&mut input)?);
    }
    input.finish()?;
    Ok(CollectionFile { counter, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_length_counts_terminator() {
        let mut out = Encoder::new();
        out.put_text(Some("Ops"));
        out.put_text(Some(""));
        out.put_text(None);
        let bytes = out.into_bytes();
        assert_eq!(&bytes[..4], &4i32.to_le_bytes());
        assert_eq!(&bytes[4..8], b"Ops\0");
        assert_eq!(&bytes[8..12], &1i32.to_le_bytes());

        let mut input = Decoder::new(&bytes);
        assert_eq!(input.text().unwrap(), Some("Ops".to_string()));
        assert_eq!(input.text().unwrap(), Some(String::new()));
        assert_eq!(input.text().unwrap(), None);
        input.finish().unwrap();
    }

    #[test]
    fn test_department_header_has_no_counter() {
        let bytes = encode_collection::<Department>(&[], 7);
        assert_eq!(bytes, 0i32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_order_header_has_counter() {
        let bytes = encode_collection::<Order>(&[], 3);
        let decoded = decode_collection::<Order>(&bytes).unwrap();
        assert_eq!(decoded.counter, Some(3));
        assert!(decoded.records.is_empty());
    }

    #[test]
    fn test_truncated_record_rejected() {
        let material = Material {
            name: Some("Bolt".into()),
            unit_cost: 0.5,
            quantity: 8,
            order_id: 10,
        };
        let bytes = encode_collection(&[material], 0);
        let err = decode_collection::<Material>(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let mut out = Encoder::new();
        out.put_i32(1);
        out.put_i32(10);
        out.put_i32(9);
        let err = decode_collection::<Department>(&out.into_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownCode(UnknownCode { code: 9, .. })));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_collection::<Material>(&[], 0);
        bytes.push(1);
        assert_eq!(
            decode_collection::<Material>(&bytes).unwrap_err(),
            CodecError::TrailingBytes { count: 1 }
        );
    }

    #[test]
    fn test_negative_count_rejected() {
        let bytes = (-1i32).to_le_bytes();
        assert!(matches!(
            decode_collection::<Material>(&bytes).unwrap_err(),
            CodecError::Negative { .. }
        ));
    }

    #[test]
    fn test_unset_timestamps_and_ids() {
        let order = Order {
            id: 10,
            asset_id: 11,
            department_id: 12,
            technician_id: None,
            state: OrderState::Pending,
            priority: Priority::Low,
            kind: MaintenanceType::Preventive,
            started: None,
            ended: None,
        };
        let decoded = decode_collection::<Order>(&encode_collection(&[order.clone()], 1)).unwrap();
        assert_eq!(decoded.records, vec![order]);
    }
}
