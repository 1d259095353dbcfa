/*
 * This file is part of ms-platform.
 *
 * Copyright (C) 2025 ms-platform contributors
 *
 * ms-platform is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * ms-platform is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with ms-platform. If not, see <https://www.gnu.org/licenses/>.
 */

//! IPMI FRU product-info-area decoding
//!
//! Layout (IPMI Platform Management FRU Information Storage Definition v1.0):
//!
//! - Common header, 8 bytes. Byte 0 is the format version (`0x01`), byte 4
//!   the product-info-area offset in multiples of 8 bytes.
//! - Product info area: version, length (x8), language code, then a list of
//!   type/length prefixed fields. Bits 7:6 of the prefix are the encoding,
//!   bits 5:0 the byte count. `0xC1` terminates the list.
//!
//! Field order: manufacturer, product name, part/model number, version,
//! serial number, asset tag.

use platform_error::{PlatformError, Result};

const COMMON_HEADER_LEN: usize = 8;
const COMMON_HEADER_VERSION: u8 = 0x01;
const PRODUCT_AREA_OFFSET_BYTE: usize = 4;
const AREA_UNIT: usize = 8;
/// version, length and language precede the first field
const PRODUCT_AREA_PREAMBLE: usize = 3;
const END_OF_FIELDS: u8 = 0xC1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInfo {
    pub manufacturer: String,
    pub name: String,
    pub part_number: String,
    pub version: String,
    pub serial: String,
    pub asset_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldEncoding {
    Binary,
    BcdPlus,
    SixBitAscii,
    Text,
}

impl From<u8> for FieldEncoding {
    fn from(type_length: u8) -> Self {
        match type_length >> 6 {
            0b00 => FieldEncoding::Binary,
            0b01 => FieldEncoding::BcdPlus,
            0b10 => FieldEncoding::SixBitAscii,
            _ => FieldEncoding::Text,
        }
    }
}

fn decode_field(encoding: FieldEncoding, data: &[u8]) -> String {
    match encoding {
        // Latin-1 maps byte-for-byte onto the first 256 code points
        FieldEncoding::Text => data.iter().map(|&b| b as char).collect(),
        FieldEncoding::SixBitAscii => data
            .chunks(3)
            .flat_map(|chunk| {
                let word = chunk
                    .iter()
                    .enumerate()
                    .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));
                let chars = (chunk.len() * 8) / 6;
                (0..chars).map(move |i| (((word >> (6 * i)) & 0x3f) as u8 + 0x20) as char)
            })
            .collect(),
        FieldEncoding::BcdPlus => data
            .iter()
            .flat_map(|&b| [b >> 4, b & 0x0f])
            .map(|nibble| match nibble {
                0..=9 => (b'0' + nibble) as char,
                0x0a => ' ',
                0x0b => '-',
                0x0c => '.',
                _ => '?',
            })
            .collect(),
        FieldEncoding::Binary => data.iter().map(|b| format!("{:02x}", b)).collect(),
    }
}

/// Decode the product info area of a FRU EEPROM image
pub fn decode_product_info(blob: &[u8]) -> Result<ProductInfo> {
    if blob.len() < COMMON_HEADER_LEN {
        return Err(PlatformError::FruDecode(format!(
            "image too short: {} bytes",
            blob.len()
        )));
    }
    if blob[0] != COMMON_HEADER_VERSION {
        return Err(PlatformError::FruDecode(format!(
            "unsupported header version {:#x}",
            blob[0]
        )));
    }

    let area = usize::from(blob[PRODUCT_AREA_OFFSET_BYTE]) * AREA_UNIT;
    if area == 0 {
        return Err(PlatformError::FruDecode("no product info area".into()));
    }

    let mut pos = area + PRODUCT_AREA_PREAMBLE;
    let mut fields: Vec<String> = Vec::with_capacity(6);
    while fields.len() < 6 {
        let type_length = *blob.get(pos).ok_or_else(|| {
            PlatformError::FruDecode(format!("product area truncated at byte {}", pos))
        })?;
        if type_length == END_OF_FIELDS {
            break;
        }
        let len = usize::from(type_length & 0x3f);
        let data = blob.get(pos + 1..pos + 1 + len).ok_or_else(|| {
            PlatformError::FruDecode(format!("field at byte {} overruns image", pos))
        })?;
        fields.push(decode_field(FieldEncoding::from(type_length), data).trim().to_string());
        pos += 1 + len;
    }
    fields.resize(6, String::new());

    let mut it = fields.into_iter();
    let mut next = || it.next().unwrap_or_default();
    Ok(ProductInfo {
        manufacturer: next(),
        name: next(),
        part_number: next(),
        version: next(),
        serial: next(),
        asset_tag: next(),
    })
}

fn decode_with<F>(blob: Option<&[u8]>, pick: F) -> Option<String>
where
    F: FnOnce(ProductInfo) -> String,
{
    match decode_product_info(blob?) {
        Ok(info) => Some(pick(info)),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

pub fn fru_decode_product_name(blob: Option<&[u8]>) -> Option<String> {
    decode_with(blob, |info| info.name)
}

pub fn fru_decode_product_model(blob: Option<&[u8]>) -> Option<String> {
    decode_with(blob, |info| info.part_number)
}

pub fn fru_decode_product_serial(blob: Option<&[u8]>) -> Option<String> {
    decode_with(blob, |info| info.serial)
}

/// Fixture images for tests in this crate and in `tests/`
#[doc(hidden)]
pub mod test_image {
    /// Build a FRU image with a product area holding the given 8-bit text
    /// fields, in manufacturer, name, part number, version, serial, asset
    /// tag order
    pub fn build(fields: &[&str]) -> Vec<u8> {
        let mut area = vec![0x01, 0x00, 0x00];
        for field in fields {
            area.push(0xC0 | field.len() as u8);
            area.extend_from_slice(field.as_bytes());
        }
        area.push(0xC1);
        while area.len() % 8 != 7 {
            area.push(0x00);
        }
        area.push(0x00); // checksum, not verified
        area[1] = (area.len() / 8) as u8;

        let mut image = vec![0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let sum = image.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        image[7] = 0u8.wrapping_sub(sum);
        image.extend(area);
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_fields() {
        let image = test_image::build(&["DELTA", "DPS-1100FB", "DPS-1100FB A", "S1", "SN123456", ""]);
        let info = decode_product_info(&image).unwrap();
        assert_eq!(info.manufacturer, "DELTA");
        assert_eq!(info.name, "DPS-1100FB");
        assert_eq!(info.part_number, "DPS-1100FB A");
        assert_eq!(info.serial, "SN123456");
        assert_eq!(info.asset_tag, "");
    }

    #[test]
    fn test_missing_trailing_fields() {
        let image = test_image::build(&["DELTA", "DPS-1100AB"]);
        let info = decode_product_info(&image).unwrap();
        assert_eq!(info.name, "DPS-1100AB");
        assert_eq!(info.serial, "");
    }

    #[test]
    fn test_six_bit_ascii() {
        // "ABCD" packed: A=0x21 B=0x22 C=0x23 D=0x24
        let word: u32 = 0x21 | (0x22 << 6) | (0x23 << 12) | (0x24 << 18);
        let data = [word as u8, (word >> 8) as u8, (word >> 16) as u8];
        assert_eq!(decode_field(FieldEncoding::SixBitAscii, &data), "ABCD");
    }

    #[test]
    fn test_bcd_plus() {
        assert_eq!(decode_field(FieldEncoding::BcdPlus, &[0x12, 0xb3]), "12-3");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_product_info(&[0x01, 0x02]).is_err());
        assert!(decode_product_info(&[0xff; 16]).is_err());
        let mut image = test_image::build(&["DELTA"]);
        image[4] = 0;
        assert!(decode_product_info(&image).is_err());
        image[4] = 0x40;
        assert!(decode_product_info(&image).is_err());
    }

    #[test]
    fn test_decode_helpers_on_missing_blob() {
        assert_eq!(fru_decode_product_name(None), None);
        assert_eq!(fru_decode_product_model(Some(&[0x00u8][..])), None);
        let image = test_image::build(&["DELTA", "DPS-1100FB", "MODEL-X", "A0", "SERIAL-9"]);
        assert_eq!(fru_decode_product_model(Some(image.as_slice())).as_deref(), Some("MODEL-X"));
        assert_eq!(fru_decode_product_serial(Some(image.as_slice())).as_deref(), Some("SERIAL-9"));
    }
}
