//! Left-to-right APDU scanner producing the flat typed-value list.

use crate::axdr::value::{DlmsDateTime, TypedValue, Value};
use crate::constants::{AXDR_MAX_NESTING, AXDR_MAX_STRING, AXDR_MAX_VALUES};

const TAG_ARRAY: u8 = 0x01;
const TAG_STRUCTURE: u8 = 0x02;
const TAG_U32: u8 = 0x06;
const TAG_OCTET_STRING: u8 = 0x09;
const TAG_DATE_TIME: u8 = 0x0C;
const TAG_U8: u8 = 0x0F;
const TAG_U16: u8 = 0x12;

/// Bytes following a date-time tag.
const DATE_TIME_LEN: usize = 12;

/// Statistics for a single parse run
#[derive(Debug, Default, Clone, Copy)]
pub struct ParserStats {
    pub bytes_consumed: usize,
    pub values_produced: usize,
    pub unknown_identifiers: u32,
    pub oversize_strings: u32,
}

/// A parsed DataNotification: the flat value list plus the top-level
/// date-time and long-invoke-and-priority id.
///
/// Parsing never fails hard; unknown tags are skipped one byte at a time
/// and counted, truncated operands end the scan early. Callers inspect
/// [`unknown_identifiers`] to judge how clean the APDU was.
///
/// [`unknown_identifiers`]: DataNotification::unknown_identifiers
#[derive(Debug, Clone)]
pub struct DataNotification {
    values: Vec<TypedValue>,
    date_time: DlmsDateTime,
    long_invoke_id: u32,
    stats: ParserStats,
}

impl DataNotification {
    /// Scan `apdu` into a typed value list.
    pub fn parse(apdu: &[u8]) -> Self {
        Parser::new().run(apdu)
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&TypedValue> {
        self.values.get(index)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn date_time(&self) -> &DlmsDateTime {
        &self.date_time
    }

    pub fn long_invoke_id(&self) -> u32 {
        self.long_invoke_id
    }

    /// Number of bytes skipped as unrecognized tags; 0 means clean.
    pub fn unknown_identifiers(&self) -> u32 {
        self.stats.unknown_identifiers
    }

    pub fn stats(&self) -> ParserStats {
        self.stats
    }
}

/// Parser state: the cursor plus the structure/array counter stacks.
///
/// The counter policy mirrors the meter's encoding: a scalar consumes one
/// slot of the innermost open structure; a structure-open consumes one
/// element of the innermost open array; a new structure or array only
/// pushes a stack level when the current top still has slots left.
struct Parser {
    structure_stack: [u8; AXDR_MAX_NESTING],
    array_stack: [u8; AXDR_MAX_NESTING],
    structure_top: usize,
    array_top: usize,
    notification: DataNotification,
}

impl Parser {
    fn new() -> Self {
        Self {
            structure_stack: [0; AXDR_MAX_NESTING],
            array_stack: [0; AXDR_MAX_NESTING],
            structure_top: 0,
            array_top: 0,
            notification: DataNotification {
                values: Vec::new(),
                date_time: DlmsDateTime::default(),
                long_invoke_id: 0,
                stats: ParserStats::default(),
            },
        }
    }

    fn run(mut self, data: &[u8]) -> DataNotification {
        let mut pos = 0usize;

        log::debug!("Parse APDU of {} bytes", data.len());

        while pos < data.len() {
            let identifier = data[pos];

            let next = match identifier {
                TAG_U8 if pos == 0 => self.parse_long_invoke_id(data, pos),
                TAG_DATE_TIME => self.parse_date_time(data, pos),
                TAG_STRUCTURE => self.open_structure(data, pos),
                TAG_ARRAY => self.open_array(data, pos),
                TAG_U16 => self.parse_scalar(data, pos, 2, |b| Value::U16(u16::from_be_bytes([b[0], b[1]]))),
                TAG_U32 => self.parse_scalar(data, pos, 4, |b| {
                    Value::U32(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
                }),
                TAG_U8 => self.parse_scalar(data, pos, 1, |b| Value::U8(b[0])),
                TAG_OCTET_STRING => self.parse_octet_string(data, pos),
                other => {
                    log::debug!("Unknown identifier 0x{other:02X} at offset {pos}, skipping");
                    self.notification.stats.unknown_identifiers += 1;
                    Some(pos + 1)
                }
            };

            match next {
                Some(p) => pos = p,
                // Truncated operands or an exhausted bound end the scan.
                None => break,
            }
        }

        self.notification.stats.bytes_consumed = pos;
        self.notification.stats.values_produced = self.notification.values.len();
        self.notification
    }

    fn parse_long_invoke_id(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        let bytes = data.get(pos + 1..pos + 5)?;
        self.notification.long_invoke_id =
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        log::debug!(
            "Long invoke and priority id: 0x{:08X}",
            self.notification.long_invoke_id
        );
        Some(pos + 5)
    }

    fn parse_date_time(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        let b = data.get(pos + 1..pos + 1 + DATE_TIME_LEN)?;
        self.notification.date_time = DlmsDateTime {
            year: u16::from_be_bytes([b[0], b[1]]),
            month: b[2],
            day: b[3],
            // b[4] is the weekday, unused
            hour: b[5],
            minute: b[6],
            second: b[7],
            // hundredths, deviation and clock status are passed over
        };
        log::debug!("Date and time: {}", self.notification.date_time);
        Some(pos + 1 + DATE_TIME_LEN)
    }

    fn open_structure(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        let field_count = *data.get(pos + 1)?;

        if self.structure_stack[self.structure_top] != 0 {
            self.structure_top += 1;
            if self.structure_top >= AXDR_MAX_NESTING {
                log::warn!("Structure nesting exceeds {AXDR_MAX_NESTING}, stopping parse");
                return None;
            }
        }
        self.structure_stack[self.structure_top] = field_count;

        // A structure opens one element of the enclosing array.
        if self.array_stack[self.array_top] > 0 {
            self.array_stack[self.array_top] -= 1;
        }

        Some(pos + 2)
    }

    fn open_array(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        let element_count = *data.get(pos + 1)?;

        if self.array_stack[self.array_top] != 0 {
            self.array_top += 1;
            if self.array_top >= AXDR_MAX_NESTING {
                log::warn!("Array nesting exceeds {AXDR_MAX_NESTING}, stopping parse");
                return None;
            }
        }
        self.array_stack[self.array_top] = element_count;

        Some(pos + 2)
    }

    fn parse_scalar(
        &mut self,
        data: &[u8],
        pos: usize,
        operand_len: usize,
        build: impl FnOnce(&[u8]) -> Value,
    ) -> Option<usize> {
        let operand = data.get(pos + 1..pos + 1 + operand_len)?;
        self.push_value(build(operand))?;
        self.consume_structure_slot();
        Some(pos + 1 + operand_len)
    }

    fn parse_octet_string(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        let length = *data.get(pos + 1)? as usize;
        let content = data.get(pos + 2..pos + 2 + length)?;

        if length > AXDR_MAX_STRING {
            // Value skipped, but it still consumed its structure slot.
            log::debug!("Octet string of {length} bytes exceeds cap, skipping value");
            self.notification.stats.oversize_strings += 1;
            self.consume_structure_slot();
            return Some(pos + 2 + length);
        }

        let string = if content.last() == Some(&0xFF) {
            // Logical-name style octets are rendered dotted-decimal.
            content
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(".")
        } else {
            content.iter().map(|&b| b as char).collect()
        };

        self.push_value(Value::OctetString(string))?;
        self.consume_structure_slot();
        Some(pos + 2 + length)
    }

    /// Append a typed value annotated with the current counter tops.
    /// Returns `None` when the value budget is exhausted.
    fn push_value(&mut self, value: Value) -> Option<()> {
        if self.notification.values.len() >= AXDR_MAX_VALUES {
            log::warn!("Value budget of {AXDR_MAX_VALUES} exhausted, stopping parse");
            return None;
        }
        self.notification.values.push(TypedValue {
            value,
            structure_ident: self.structure_stack[self.structure_top],
            array_ident: self.array_stack[self.array_top],
        });
        Some(())
    }

    fn consume_structure_slot(&mut self) {
        if self.structure_stack[self.structure_top] != 0 {
            self.structure_stack[self.structure_top] -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_invoke_id_only_at_offset_zero() {
        // 0x0F at offset 0 is the invoke id; inside a structure it is a u8.
        let apdu = [0x0F, 0x00, 0x02, 0x32, 0x24, 0x02, 0x02, 0x0F, 0x07, 0x12, 0x00, 0x28];
        let parsed = DataNotification::parse(&apdu);

        assert_eq!(parsed.long_invoke_id(), 0x0002_3224);
        assert_eq!(parsed.value_count(), 2);
        assert_eq!(parsed.values()[0].value, Value::U8(0x07));
        assert_eq!(parsed.values()[1].value, Value::U16(0x0028));
        assert_eq!(parsed.unknown_identifiers(), 0);
    }

    #[test]
    fn test_date_time_fields() {
        let apdu = [
            0x0C, 0x07, 0xE6, 0x0B, 0x0B, 0x05, 0x14, 0x25, 0x1E, 0xFF, 0x80, 0x00, 0x00,
        ];
        let parsed = DataNotification::parse(&apdu);
        let dt = parsed.date_time();

        assert_eq!(dt.year, 2022);
        assert_eq!(dt.month, 11);
        assert_eq!(dt.day, 11);
        assert_eq!(dt.hour, 20);
        assert_eq!(dt.minute, 37);
        assert_eq!(dt.second, 30);
    }

    #[test]
    fn test_dotted_octet_string() {
        // A 6-byte logical name ending in 0xFF renders dotted-decimal.
        let apdu = [
            0x02, 0x02, 0x09, 0x06, 0x01, 0x00, 0x01, 0x07, 0x00, 0xFF, 0x12, 0x00, 0x00,
        ];
        let parsed = DataNotification::parse(&apdu);

        assert_eq!(
            parsed.values()[0].value,
            Value::OctetString("1.0.1.7.0.255".into())
        );
    }

    #[test]
    fn test_plain_octet_string() {
        let apdu = [0x09, 0x04, b'a', b'b', b'c', b'd'];
        let parsed = DataNotification::parse(&apdu);
        assert_eq!(parsed.values()[0].value, Value::OctetString("abcd".into()));
    }

    #[test]
    fn test_oversize_string_skipped_but_slot_consumed() {
        let mut apdu = vec![0x02, 0x02, 0x09, 0x28];
        apdu.extend(std::iter::repeat(b'x').take(0x28));
        apdu.extend_from_slice(&[0x12, 0x00, 0x07]);

        let parsed = DataNotification::parse(&apdu);

        assert_eq!(parsed.value_count(), 1);
        assert_eq!(parsed.values()[0].value, Value::U16(7));
        // The u16 took the structure's second slot: the skipped string
        // consumed the first.
        assert_eq!(parsed.values()[0].structure_ident, 1);
        assert_eq!(parsed.stats().oversize_strings, 1);
    }

    #[test]
    fn test_unknown_identifiers_counted() {
        let apdu = [0x55, 0x56, 0x12, 0x00, 0x01, 0x57];
        let parsed = DataNotification::parse(&apdu);

        assert_eq!(parsed.unknown_identifiers(), 3);
        assert_eq!(parsed.value_count(), 1);
    }

    #[test]
    fn test_structure_counters_annotate_values() {
        // structure(2) { u16, u16 }: idents are the remaining counts.
        let apdu = [0x02, 0x02, 0x12, 0x00, 0x01, 0x12, 0x00, 0x02];
        let parsed = DataNotification::parse(&apdu);

        assert_eq!(parsed.values()[0].structure_ident, 2);
        assert_eq!(parsed.values()[1].structure_ident, 1);
    }

    #[test]
    fn test_structure_consumes_array_element() {
        // array(2) of structure(1): each structure-open decrements the array.
        let apdu = [
            0x01, 0x02, 0x02, 0x01, 0x12, 0x00, 0x01, 0x02, 0x01, 0x12, 0x00, 0x02,
        ];
        let parsed = DataNotification::parse(&apdu);

        assert_eq!(parsed.values()[0].array_ident, 1);
        assert_eq!(parsed.values()[1].array_ident, 0);
    }

    #[test]
    fn test_truncated_operand_stops_parse() {
        let apdu = [0x12, 0x00];
        let parsed = DataNotification::parse(&apdu);
        assert_eq!(parsed.value_count(), 0);
        assert_eq!(parsed.unknown_identifiers(), 0);
    }

    #[test]
    fn test_value_budget_bounds_parse() {
        let mut apdu = vec![0x00]; // unknown filler so offset 0 is not 0x0F
        for _ in 0..120 {
            apdu.extend_from_slice(&[0x0F, 0x01]);
        }
        let parsed = DataNotification::parse(&apdu);
        assert_eq!(parsed.value_count(), AXDR_MAX_VALUES);
    }

    #[test]
    fn test_deterministic() {
        let apdu = [
            0x02, 0x04, 0x12, 0x00, 0x28, 0x09, 0x06, 0x00, 0x08, 0x19, 0x09, 0x00, 0xFF, 0x0F,
            0x02, 0x12, 0x00, 0x00,
        ];
        let a = DataNotification::parse(&apdu);
        let b = DataNotification::parse(&apdu);
        assert_eq!(a.values(), b.values());
    }
}
