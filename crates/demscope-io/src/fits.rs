//! Minimal FITS primary HDU reader and writer.
//!
//! Only what DEM products need: a primary header of 80-byte cards in
//! 2880-byte blocks followed by a big-endian data cube of up to three axes.
//! `NAXIS1` is the fastest varying axis (columns), then `NAXIS2` (rows), then
//! `NAXIS3` (planes).

use crate::error::ParseError;
use crate::Result;
use demscope_common::{KeyValueEntry, KeyValueMap};
use demscope_mesh::{PlaneLayout, RawGrid, VALIDITY_PLANE};

/// FITS logical record size.
pub const BLOCK_SIZE: usize = 2880;

/// Header card size.
pub const CARD_SIZE: usize = 80;

const UNIT_DELIMITERS: [char; 4] = ['(', ')', '[', ']'];

/// One header card.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCard {
    pub key: String,
    /// `None` for commentary cards (`COMMENT`, `HISTORY`, blank keys).
    pub value: Option<String>,
    pub comment: Option<String>,
}

impl HeaderCard {
    /// Card with a value.
    pub fn new(key: impl Into<String>, value: impl Into<String>, comment: Option<&str>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            comment: comment.map(str::to_string),
        }
    }

    fn parse(raw: &[u8]) -> Self {
        let text: String = raw
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
            .collect();
        let key = text.get(..8).unwrap_or(&text).trim_end().to_string();
        let rest = text.get(8..).unwrap_or("");

        match rest.strip_prefix("= ") {
            Some(field) => {
                let (value, comment) = split_value(field);
                Self { key, value, comment }
            }
            None => Self {
                key,
                value: None,
                comment: non_empty(rest),
            },
        }
    }

    fn to_record(&self) -> String {
        let mut line: String = self.key.chars().take(8).collect();
        while line.len() < 8 {
            line.push(' ');
        }

        match &self.value {
            Some(value) if is_literal(value) => {
                line.push_str(&format!("= {:>20}", value));
            }
            Some(value) => {
                let quoted = format!("'{:<8}'", value.replace('\'', "''"));
                line.push_str(&format!("= {:<20}", quoted));
            }
            None => {}
        }
        if let Some(comment) = &self.comment {
            if self.value.is_some() {
                line.push_str(" / ");
            }
            line.push_str(comment);
        }

        let mut record: String = line.chars().take(CARD_SIZE).collect();
        while record.len() < CARD_SIZE {
            record.push(' ');
        }
        record
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn is_literal(value: &str) -> bool {
    value == "T" || value == "F" || value.parse::<f64>().is_ok()
}

/// Split the value field of a card into value and comment.
fn split_value(field: &str) -> (Option<String>, Option<String>) {
    let trimmed = field.trim_start();

    if let Some(body) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut end = body.len();
        let mut chars = body.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    value.push('\'');
                    chars.next();
                    continue;
                }
                end = i + 1;
                break;
            }
            value.push(ch);
        }
        let comment = body[end..].split_once('/').and_then(|(_, c)| non_empty(c));
        return (Some(value.trim_end().to_string()), comment);
    }

    match trimmed.split_once('/') {
        Some((value, comment)) => (non_empty(value), non_empty(comment)),
        None => (non_empty(trimmed), None),
    }
}

/// Split a backplane declaration such as `Slope (radians)` into name and
/// unit. The unit is taken from the value, else from the comment.
fn split_name_unit(value: &str, comment: Option<&str>) -> (String, Option<String>) {
    let mut parts = value.split(UNIT_DELIMITERS);
    let name = parts.next().unwrap_or_default().to_string();
    let unit = parts
        .next()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| {
            comment
                .and_then(|c| c.split(UNIT_DELIMITERS).nth(1))
                .filter(|u| !u.trim().is_empty())
        })
        .map(str::to_string);
    (name, unit)
}

/// Parsed primary header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<HeaderCard>,
}

impl FitsHeader {
    /// Parse the primary header.
    ///
    /// Returns the header and the byte offset of the data unit.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cards = Vec::new();
        let mut offset = 0;

        loop {
            let raw = bytes
                .get(offset..offset + CARD_SIZE)
                .ok_or_else(|| ParseError::InvalidHeader("header ends without END card".to_string()))?;
            let card = HeaderCard::parse(raw);

            if offset == 0 && card.key != "SIMPLE" {
                return Err(ParseError::InvalidHeader("first keyword is not SIMPLE".to_string()));
            }
            offset += CARD_SIZE;

            if card.key == "END" {
                break;
            }
            if card.key.is_empty() && card.value.is_none() && card.comment.is_none() {
                continue;
            }
            cards.push(card);
        }

        let data_offset = offset.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        Ok((Self { cards }, data_offset))
    }

    pub fn cards(&self) -> &[HeaderCard] {
        &self.cards
    }

    /// Value of the first card with `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|c| c.key == key)
            .and_then(|c| c.value.as_deref())
    }

    /// Numeric value of `key`. Fortran `D` exponents are accepted.
    pub fn f64_value(&self, key: &str) -> Option<f64> {
        self.value(key)
            .and_then(|v| v.trim().replace(['D', 'd'], "E").parse().ok())
    }

    pub fn int_value(&self, key: &str) -> Option<i64> {
        let value = self.value(key)?;
        value
            .trim()
            .parse()
            .ok()
            .or_else(|| self.f64_value(key).map(|f| f as i64))
    }

    /// Every card with a value, first occurrence of each key wins.
    pub fn key_values(&self) -> KeyValueMap {
        self.cards
            .iter()
            .filter_map(|card| {
                card.value.as_ref().map(|value| KeyValueEntry {
                    key: card.key.clone(),
                    value: value.clone(),
                    comment: card.comment.clone(),
                })
            })
            .collect()
    }

    /// Derive the plane layout from `PLANEn` cards.
    ///
    /// A value starting with `X`, `Y` or `Z` names a coordinate plane, any
    /// other value declares a backplane. The plane index comes from the
    /// 1-based key suffix, falling back to order of appearance.
    pub fn plane_layout(&self, planes: usize) -> PlaneLayout {
        let mut layout = PlaneLayout::default();
        let plane_cards = self
            .cards
            .iter()
            .filter(|c| c.key.starts_with("PLANE"))
            .filter_map(|c| c.value.as_deref().map(|v| (c, v)));

        for (position, (card, value)) in plane_cards.enumerate() {
            let index = card.key["PLANE".len()..]
                .parse::<usize>()
                .ok()
                .filter(|&n| n >= 1)
                .map_or(position, |n| n - 1);

            match value.chars().next() {
                Some('X') => layout.x = Some(index),
                Some('Y') => layout.y = Some(index),
                Some('Z') => layout.z = Some(index),
                _ => {
                    let (name, unit) = split_name_unit(value, card.comment.as_deref());
                    layout = layout.with_backplane(index, name, unit.as_deref());
                }
            }
        }

        if planes > VALIDITY_PLANE {
            layout.validity = Some(VALIDITY_PLANE);
        }
        layout
    }

    fn axis(&self, n: usize) -> Result<usize> {
        let key = format!("NAXIS{n}");
        self.int_value(&key)
            .filter(|&v| v >= 0)
            .map(|v| v as usize)
            .ok_or_else(|| ParseError::InvalidHeader(format!("missing or invalid {key}")))
    }
}

/// A decoded structured grid together with its header.
#[derive(Debug, Clone)]
pub struct FitsGrid {
    pub header: FitsHeader,
    pub grid: RawGrid,
}

/// Decode the primary HDU of a FITS file into a grid.
pub fn read_grid(bytes: &[u8]) -> Result<FitsGrid> {
    let (header, offset) = FitsHeader::parse(bytes)?;

    let bitpix = header
        .int_value("BITPIX")
        .ok_or_else(|| ParseError::InvalidHeader("missing BITPIX".to_string()))?;
    let width = match bitpix {
        8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => return Err(ParseError::UnsupportedBitpix(other)),
    };

    let (cols, rows, planes) = match header.int_value("NAXIS") {
        Some(2) => (header.axis(1)?, header.axis(2)?, 1),
        Some(3) => (header.axis(1)?, header.axis(2)?, header.axis(3)?),
        Some(n) => return Err(ParseError::InvalidHeader(format!("expected NAXIS of 2 or 3, found {n}"))),
        None => return Err(ParseError::InvalidHeader("missing NAXIS".to_string())),
    };

    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(planes))
        .and_then(|n| n.checked_mul(width))
        .ok_or_else(|| {
            ParseError::InvalidHeader(format!("data size of {cols}x{rows}x{planes} samples overflows"))
        })?;
    let raw = offset
        .checked_add(expected)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(ParseError::Truncated {
            expected,
            actual: bytes.len().saturating_sub(offset),
        })?;

    let scale = header.f64_value("BSCALE").unwrap_or(1.0);
    let zero = header.f64_value("BZERO").unwrap_or(0.0);
    let data = decode_samples(raw, bitpix, scale, zero);

    let layout = header.plane_layout(planes);
    let grid = RawGrid::new(rows, cols, planes, data, layout)?;
    Ok(FitsGrid { header, grid })
}

fn decode_samples(raw: &[u8], bitpix: i64, scale: f64, zero: f64) -> Vec<f32> {
    let scaled = scale != 1.0 || zero != 0.0;
    let apply = |v: f64| (v * scale + zero) as f32;

    match bitpix {
        -32 => raw
            .chunks_exact(4)
            .map(|b| {
                let v = f32::from_be_bytes([b[0], b[1], b[2], b[3]]);
                if scaled {
                    apply(v as f64)
                } else {
                    v
                }
            })
            .collect(),
        -64 => raw
            .chunks_exact(8)
            .map(|b| apply(f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])))
            .collect(),
        8 => raw.iter().map(|&b| apply(b as f64)).collect(),
        16 => raw
            .chunks_exact(2)
            .map(|b| apply(i16::from_be_bytes([b[0], b[1]]) as f64))
            .collect(),
        32 => raw
            .chunks_exact(4)
            .map(|b| apply(i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64))
            .collect(),
        _ => raw
            .chunks_exact(8)
            .map(|b| apply(i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64))
            .collect(),
    }
}

fn is_structural(key: &str) -> bool {
    matches!(key, "SIMPLE" | "BITPIX" | "END" | "BSCALE" | "BZERO" | "EXTEND") || key.starts_with("NAXIS")
}

fn pad_block(out: &mut Vec<u8>, fill: u8) {
    let padded = out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    out.resize(padded, fill);
}

/// Encode a grid as a single-HDU FITS file with `BITPIX = -32`.
///
/// Structural keywords in `cards` are ignored; everything else is written
/// after the axis cards in order.
pub fn encode_grid(grid: &RawGrid, cards: &[HeaderCard]) -> Vec<u8> {
    let mut header = vec![
        HeaderCard::new("SIMPLE", "T", Some("conforms to FITS standard")),
        HeaderCard::new("BITPIX", "-32", Some("IEEE single precision")),
        HeaderCard::new("NAXIS", "3", None),
        HeaderCard::new("NAXIS1", grid.cols().to_string(), Some("columns")),
        HeaderCard::new("NAXIS2", grid.rows().to_string(), Some("rows")),
        HeaderCard::new("NAXIS3", grid.planes().to_string(), Some("planes")),
    ];
    header.extend(cards.iter().filter(|c| !is_structural(&c.key)).cloned());

    let mut out = Vec::with_capacity(BLOCK_SIZE * 2 + grid.data().len() * 4);
    for card in &header {
        out.extend_from_slice(card.to_record().as_bytes());
    }
    out.extend_from_slice(format!("{:<80}", "END").as_bytes());
    pad_block(&mut out, b' ');

    for value in grid.data() {
        out.extend_from_slice(&value.to_be_bytes());
    }
    pad_block(&mut out, 0);
    out
}
