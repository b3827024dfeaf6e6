//! Text encoding for PDF strings

use lopdf::{Object, StringFormat};

/// Turns a logical string into the string that is drawn
///
/// Right-to-left scripts need reordering (and for some scripts, contextual
/// forms) before they can be drawn glyph by glyph from left to right. The
/// shaper is applied to every title, heading and entry right before drawing.
pub trait TextShaper: Send + Sync {
    fn shape(&self, logical: &str) -> String;
}

/// Draws strings unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughShaper;

impl TextShaper for PassthroughShaper {
    fn shape(&self, logical: &str) -> String {
        logical.to_string()
    }
}

/// WinAnsi codes 0x80-0x9F and the characters they stand for
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// WinAnsi byte for `c`, if the encoding has one
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x00..=0x7F | 0xA0..=0xFF => Some(c as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|&&(ch, _)| ch == c)
            .map(|&(_, byte)| byte),
    }
}

/// Encode text as single-byte WinAnsi; characters without a code become `?`
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect()
}

/// A PDF text string for outlines and the Info dictionary
///
/// ASCII stays a literal string; anything else is written as UTF-16BE with a
/// byte order mark so viewers show it unchanged.
pub fn pdf_text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
