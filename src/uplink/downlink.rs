//! Decoding of operator settings received over the downlink.
//!
//! The stream is a sequence of `channel | type | value` entries. The type
//! byte fixes the value width, so decoding is type-driven and entries on
//! unknown channels are skipped without losing stream alignment.

use crate::config::AppConfig;
use nom::{
    bytes::complete::take,
    multi::many0,
    number::complete::{be_u32, u8 as be_u8},
    IResult,
};

const CHANNEL_MEASURE_INTERVAL: u8 = 0x0A;
const CHANNEL_SEND_DATA_TYPE: u8 = 0x0B;
const CHANNEL_DECRYPT_DATA: u8 = 0x0C;
const CHANNEL_AUTHENTICATION_KEY: u8 = 0x0D;
const CHANNEL_AES_KEY: u8 = 0x0E;
const CHANNEL_AES_IV: u8 = 0x0F;
const CHANNEL_CYCLE_TIMEOUT: u8 = 0x10;

const TYPE_U8: u8 = 1;
const TYPE_U32: u8 = 4;
const TYPE_BOOL: u8 = 6;
const TYPE_BYTE_ARRAY: u8 = 7;

const KEY_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingValue {
    U8(u8),
    U32(u32),
    Bool(bool),
    Bytes([u8; KEY_LEN]),
}

fn parse_entry(input: &[u8]) -> IResult<&[u8], (u8, SettingValue)> {
    let (input, channel) = be_u8(input)?;
    let (input, type_byte) = be_u8(input)?;

    let (input, value) = match type_byte {
        TYPE_U8 => {
            let (input, v) = be_u8(input)?;
            (input, SettingValue::U8(v))
        }
        TYPE_U32 => {
            let (input, v) = be_u32(input)?;
            (input, SettingValue::U32(v))
        }
        TYPE_BOOL => {
            let (input, v) = be_u8(input)?;
            (input, SettingValue::Bool(v == 1))
        }
        TYPE_BYTE_ARRAY => {
            let (input, bytes) = take(KEY_LEN)(input)?;
            let mut array = [0u8; KEY_LEN];
            array.copy_from_slice(bytes);
            (input, SettingValue::Bytes(array))
        }
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        }
    };

    Ok((input, (channel, value)))
}

/// Apply a received settings stream to `config`. Decoding stops at the
/// first malformed entry; the number of applied settings is returned.
pub fn apply_settings(data: &[u8], config: &mut AppConfig) -> usize {
    let entries = match many0(parse_entry)(data) {
        Ok((rest, entries)) => {
            if !rest.is_empty() {
                log::warn!("Trailing {} undecodable settings bytes ignored", rest.len());
            }
            entries
        }
        Err(_) => return 0,
    };

    let mut applied = 0;
    for (channel, value) in entries {
        let accepted = match (channel, &value) {
            (CHANNEL_MEASURE_INTERVAL, SettingValue::U32(v)) => {
                config.measure_interval_ms = *v as u64;
                true
            }
            (CHANNEL_CYCLE_TIMEOUT, SettingValue::U32(v)) => {
                config.cycle_timeout_ms = *v as u64;
                true
            }
            (CHANNEL_SEND_DATA_TYPE, SettingValue::U8(v)) => {
                config.send_data_type = (*v).into();
                true
            }
            (CHANNEL_DECRYPT_DATA, SettingValue::Bool(v)) => {
                config.decrypt_data = *v;
                true
            }
            (CHANNEL_AUTHENTICATION_KEY, SettingValue::Bytes(bytes)) => {
                // Slot 0 stays reserved for the per-APDU security byte.
                config.authentication_key[1..].copy_from_slice(bytes);
                true
            }
            (CHANNEL_AES_KEY, SettingValue::Bytes(bytes)) => {
                config.aes_key = *bytes;
                true
            }
            (CHANNEL_AES_IV, SettingValue::Bytes(bytes)) => {
                config.aes_iv = *bytes;
                true
            }
            _ => {
                log::debug!("Ignoring downlink entry on channel 0x{channel:02X}");
                false
            }
        };
        if accepted {
            applied += 1;
        }
    }

    if applied > 0 {
        log::info!("Applied {applied} downlink settings");
    }
    applied
}
