//! Fonts for index pages
//!
//! The built-in Helvetica draws single-byte WinAnsi codes and is measured from
//! a plain width table. A TrueType file is embedded as a composite font: text
//! is written as two-byte glyph ids (`Identity-H`), widths come from the
//! font's own horizontal metrics, and a ToUnicode map keeps the text
//! searchable. This is what lets Hebrew and other non-Latin titles show up.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use rustybuzz::ttf_parser::GlyphId;
use rustybuzz::Face;
use crate::error::{Error, Result};
use crate::pdf::text::to_win_ansi;

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 255;

/// Helvetica advance widths for characters 32-126 (1/1000 em)
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space to /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // : to @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [ to `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // { to ~
];

/// Width used for Helvetica characters above 126 without an entry below
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Code points per bfchar block; PDF readers accept at most 100
const CMAP_BLOCK: usize = 100;

const CMAP_HEADER: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
";

const CMAP_FOOTER: &str = "endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

#[derive(Debug, Clone)]
enum FontSource {
    /// One of the standard 14 fonts; nothing to embed
    Helvetica {
        /// Advance widths for codes FIRST_CHAR..=LAST_CHAR in 1/1000 em
        widths: Vec<u16>,
    },
    /// TrueType program embedded as a CIDFontType2 with FontFile2
    TrueType {
        base_font: String,
        data: Vec<u8>,
        units_per_em: f32,
        bbox: [i64; 4],
        cap_height: i64,
    },
}

/// Font used to draw and measure index text
#[derive(Debug, Clone)]
pub struct IndexFont {
    source: FontSource,
    /// Ascender in 1/1000 em
    ascent: f32,
    /// Descender in 1/1000 em (negative)
    descent: f32,
}

impl IndexFont {
    /// Standard Helvetica
    pub fn helvetica() -> Self {
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| match code {
                32..=126 => HELVETICA_ASCII_WIDTHS[(code - 32) as usize],
                0x91 | 0x92 | 0x82 => 222,
                0x93 | 0x94 | 0x84 => 333,
                0x95 => 350,
                0x85 | 0x89 | 0x97 | 0x99 => 1000,
                160 => 278,
                _ => HELVETICA_DEFAULT_WIDTH,
            })
            .collect();

        Self {
            source: FontSource::Helvetica { widths },
            ascent: 718.0,
            descent: -207.0,
        }
    }

    /// Load a TrueType font file
    ///
    /// Fails with [`Error::MissingFont`] when the file is absent or is not a
    /// font with TrueType outlines.
    pub fn load(path: &Path) -> Result<Self> {
        let missing = |reason: &str| Error::MissingFont {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if !path.is_file() {
            return Err(missing("file does not exist"));
        }

        let data = fs::read(path).map_err(|e| missing(&e.to_string()))?;

        let (units_per_em, ascent, descent, bbox, cap_height) = {
            let face = Face::from_slice(&data, 0)
                .ok_or_else(|| missing("not a TrueType or OpenType font"))?;

            if face.tables().glyf.is_none() {
                return Err(missing("font has no TrueType outlines"));
            }

            let units = face.units_per_em() as f32;
            let scale = |v: f32| v * 1000.0 / units;

            let rect = face.global_bounding_box();
            let bbox = [
                scale(rect.x_min as f32).round() as i64,
                scale(rect.y_min as f32).round() as i64,
                scale(rect.x_max as f32).round() as i64,
                scale(rect.y_max as f32).round() as i64,
            ];
            let ascent = scale(face.ascender() as f32);
            let cap_height = face
                .capital_height()
                .map(|h| scale(h as f32).round() as i64)
                .unwrap_or(ascent.round() as i64);

            (units, ascent, scale(face.descender() as f32), bbox, cap_height)
        };

        log::debug!("Loaded index font {}", path.display());

        Ok(Self {
            source: FontSource::TrueType {
                base_font: base_font_name(path),
                data,
                units_per_em,
                bbox,
                cap_height,
            },
            ascent,
            descent,
        })
    }

    /// Width of `text` in points when drawn at `font_size`
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = match &self.source {
            FontSource::Helvetica { widths } => to_win_ansi(text)
                .into_iter()
                .map(|byte| helvetica_width(widths, byte) as f32)
                .sum(),
            FontSource::TrueType {
                data, units_per_em, ..
            } => match Face::from_slice(data, 0) {
                Some(face) => {
                    let advance: f32 = text
                        .chars()
                        .map(|c| face.glyph_hor_advance(glyph_for(&face, c)).unwrap_or(0) as f32)
                        .sum();
                    advance * 1000.0 / units_per_em
                }
                None => 0.0,
            },
        };
        units * font_size / 1000.0
    }

    /// The string operand that shows `text` in this font
    ///
    /// Helvetica gets a literal WinAnsi string. An embedded TrueType font gets
    /// big-endian glyph ids; characters the font lacks map to glyph 0.
    pub fn encode(&self, text: &str) -> Object {
        match &self.source {
            FontSource::Helvetica { .. } => Object::String(to_win_ansi(text), StringFormat::Literal),
            FontSource::TrueType { data, .. } => {
                let bytes = match Face::from_slice(data, 0) {
                    Some(face) => text
                        .chars()
                        .flat_map(|c| glyph_for(&face, c).0.to_be_bytes())
                        .collect(),
                    None => Vec::new(),
                };
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    /// Distance above the baseline in points at `font_size`
    pub fn ascent(&self, font_size: f32) -> f32 {
        self.ascent * font_size / 1000.0
    }

    /// Distance below the baseline in points at `font_size` (negative)
    pub fn descent(&self, font_size: f32) -> f32 {
        self.descent * font_size / 1000.0
    }

    /// Add the font objects to `doc` and return the font dictionary id
    pub fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        match &self.source {
            FontSource::Helvetica { .. } => Ok(helvetica_font(doc)),
            FontSource::TrueType {
                base_font,
                data,
                units_per_em,
                bbox,
                cap_height,
            } => {
                let face = Face::from_slice(data, 0)
                    .ok_or_else(|| Error::General(format!("Cannot parse font {}", base_font)))?;

                let mut font_stream_dict = Dictionary::new();
                font_stream_dict.set("Length1", Object::Integer(data.len() as i64));
                let font_stream_id = doc.add_object(Stream::new(font_stream_dict, data.clone()));

                let mut font_descriptor = Dictionary::new();
                font_descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
                font_descriptor.set("FontName", Object::Name(base_font.as_bytes().to_vec()));
                font_descriptor.set("Flags", Object::Integer(4)); // Symbolic
                font_descriptor.set(
                    "FontBBox",
                    Object::Array(bbox.iter().map(|&v| Object::Integer(v)).collect()),
                );
                font_descriptor.set("ItalicAngle", Object::Integer(0));
                font_descriptor.set("Ascent", Object::Integer(self.ascent.round() as i64));
                font_descriptor.set("Descent", Object::Integer(self.descent.round() as i64));
                font_descriptor.set("CapHeight", Object::Integer(*cap_height));
                font_descriptor.set("StemV", Object::Integer(80));
                font_descriptor.set("FontFile2", Object::Reference(font_stream_id));
                let font_descriptor_id = doc.add_object(Object::Dictionary(font_descriptor));

                let mut system_info = Dictionary::new();
                system_info.set("Registry", Object::String(b"Adobe".to_vec(), StringFormat::Literal));
                system_info.set("Ordering", Object::String(b"Identity".to_vec(), StringFormat::Literal));
                system_info.set("Supplement", Object::Integer(0));

                let mut cid_font = Dictionary::new();
                cid_font.set("Type", Object::Name(b"Font".to_vec()));
                cid_font.set("Subtype", Object::Name(b"CIDFontType2".to_vec()));
                cid_font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
                cid_font.set("CIDSystemInfo", Object::Dictionary(system_info));
                cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
                cid_font.set("CIDToGIDMap", Object::Name(b"Identity".to_vec()));
                cid_font.set("DW", Object::Integer(1000));
                cid_font.set(
                    "W",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Array(glyph_widths(&face, *units_per_em)),
                    ]),
                );
                let cid_font_id = doc.add_object(Object::Dictionary(cid_font));

                let to_unicode = to_unicode_cmap(&unicode_map(&face));
                let to_unicode_id =
                    doc.add_object(Stream::new(Dictionary::new(), to_unicode.into_bytes()));

                let mut font = Dictionary::new();
                font.set("Type", Object::Name(b"Font".to_vec()));
                font.set("Subtype", Object::Name(b"Type0".to_vec()));
                font.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
                font.set("Encoding", Object::Name(b"Identity-H".to_vec()));
                font.set("DescendantFonts", Object::Array(vec![Object::Reference(cid_font_id)]));
                font.set("ToUnicode", Object::Reference(to_unicode_id));

                Ok(doc.add_object(Object::Dictionary(font)))
            }
        }
    }
}

/// Standard Helvetica with WinAnsiEncoding
pub fn helvetica_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

fn helvetica_width(widths: &[u16], code: u8) -> u16 {
    let code = code as u32;
    if code < FIRST_CHAR {
        return 0;
    }
    widths[(code - FIRST_CHAR) as usize]
}

fn glyph_for(face: &Face, c: char) -> GlyphId {
    face.glyph_index(c).unwrap_or(GlyphId(0))
}

/// Advance of every glyph in 1/1000 em, indexed by glyph id
fn glyph_widths(face: &Face, units_per_em: f32) -> Vec<Object> {
    (0..face.number_of_glyphs())
        .map(|gid| {
            let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0) as f32;
            Object::Integer((advance * 1000.0 / units_per_em).round() as i64)
        })
        .collect()
}

/// First Unicode character mapped to each glyph by the font's cmap
fn unicode_map(face: &Face) -> BTreeMap<u16, char> {
    let mut map = BTreeMap::new();

    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|code_point| {
                let glyph = subtable.glyph_index(code_point);
                if let (Some(c), Some(glyph)) = (char::from_u32(code_point), glyph) {
                    map.entry(glyph.0).or_insert(c);
                }
            });
        }
    }

    map
}

/// ToUnicode CMap from glyph ids to characters
fn to_unicode_cmap(map: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(CMAP_HEADER);
    let entries: Vec<(u16, char)> = map.iter().map(|(&gid, &c)| (gid, c)).collect();

    for block in entries.chunks(CMAP_BLOCK) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for &(gid, c) in block {
            let mut units = [0u16; 2];
            let target: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, target));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(CMAP_FOOTER);
    cmap
}

/// PostScript-safe font name from a file stem
fn base_font_name(path: &Path) -> String {
    let name: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if name.is_empty() {
        "IndexFont".to_string()
    } else {
        name
    }
}
