//! Captured wire and APDU vectors from a live LG450 push session.
#![allow(dead_code)] // not every test binary touches every vector

use dlms_gateway::util::hex::hex_to_bytes;

/// Four consecutive HDLC frames carrying one GBT transfer, 443 bytes as
/// read from the serial link.
pub fn hdlc_push_stream() -> Vec<u8> {
    hex_to_bytes(concat!(
        "7ea084ceff0313128be6e700e04000010000700f000232240c07e60b0b051425",
        "1eff800000020f010f020412002809060008190900ff0f021200000204120028",
        "09060008190900ff0f01120000020412000109060000600100ff0f0212000002",
        "0412000309060100010700ff0f02120000020412000309060100020700ff0f02",
        "120000b3f27e7ea07dceff0313d045e040000200006c02041200030906010101",
        "0800ff0f02120000020412000309060101020800ff0f02120000020412000309",
        "060101050800ff0f02120000020412000309060101060800ff0f021200000204",
        "12000309060101070800ff0f02120000020412000309060101080800ff0f0212",
        "0000c1957e7ea084ceff0313128be04000030000730204120003090601008207",
        "00ff0f021200000204120003090601001f0700ff0f0212000002041200030906",
        "0100330700ff0f02120000020412000309060100470700ff0f02120000090600",
        "08190900ff090836303232323939390600000000060000000006000000000600",
        "000000060000000066aa7e7ea02eceff03137e2de0c0000400001d0600000001",
        "06000000000600000000060000000012000012000012000061147e",
    ))
}

/// The 364-byte APDU reassembled from [`hdlc_push_stream`].
pub fn apdu_november() -> Vec<u8> {
    hex_to_bytes(concat!(
        "0f000232240c07e60b0b0514251eff800000020f010f02041200280906000819",
        "0900ff0f02120000020412002809060008190900ff0f01120000020412000109",
        "060000600100ff0f02120000020412000309060100010700ff0f021200000204",
        "12000309060100020700ff0f02120000020412000309060101010800ff0f0212",
        "0000020412000309060101020800ff0f02120000020412000309060101050800",
        "ff0f02120000020412000309060101060800ff0f021200000204120003090601",
        "01070800ff0f02120000020412000309060101080800ff0f0212000002041200",
        "0309060100820700ff0f021200000204120003090601001f0700ff0f02120000",
        "020412000309060100330700ff0f02120000020412000309060100470700ff0f",
        "0212000009060008190900ff0908363032323239393906000000000600000000",
        "0600000000060000000006000000000600000001060000000006000000000600",
        "000000120000120000120000",
    ))
}

/// A second captured APDU, read six weeks later, with live register
/// values.
pub fn apdu_december() -> Vec<u8> {
    hex_to_bytes(concat!(
        "0f00083d650c07e60c1a01011e23ff800000020f010f02041200280906000819",
        "0900ff0f02120000020412002809060008190900ff0f01120000020412000109",
        "060000600100ff0f02120000020412000309060100010700ff0f021200000204",
        "12000309060100020700ff0f02120000020412000309060101010800ff0f0212",
        "0000020412000309060101020800ff0f02120000020412000309060101050800",
        "ff0f02120000020412000309060101060800ff0f021200000204120003090601",
        "01070800ff0f02120000020412000309060101080800ff0f0212000002041200",
        "0309060100820700ff0f021200000204120003090601001f0700ff0f02120000",
        "020412000309060100330700ff0f02120000020412000309060100470700ff0f",
        "0212000009060008190900ff0908363032323239393906000000130600000000",
        "0600000095060000000006000000000600000001060000000006000000520600",
        "00000b12000b120000120000",
    ))
}
