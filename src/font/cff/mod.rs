/*!
 * https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf
 *
 * See also:
 *  - https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf
 */

mod charset;
mod charstring;
mod consts;
mod dict;
mod encoding;
mod index;
mod number;
mod parse;

#[cfg(test)]
pub(crate) mod test_font;

pub use charset::{read_charset, CffCharset, CharsetRange};
pub use charstring::{subroutine_bias, CharstringLimits};
pub use consts::{NUM_STANDARD_STRINGS, STANDARD_STRINGS};
pub use dict::{read_dict, Dict};
pub use encoding::{read_encoding, CffEncoding, EncodingRange, EncodingSupplement};
pub use index::{read_index, CffIndex, CffIndexIterator};
pub use number::{decode_operand, OperandContext};
pub use parse::CffParser;

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    data_structures::Matrix,
    error::{DecodeError, DecodeResult},
    font::Glyph,
};

use self::{
    charstring::{CffCharStringInterpreter, CharstringContext, CharstringOutput},
    consts::{STANDARD_ENCODING, STANDARD_STRING_SIDS},
    dict::{PrivateDict, TopDict},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CffHeader {
    pub major: u8,
    pub minor: u8,
    pub header_size: u8,
    pub off_size: u8,
}

/// How a caller names a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphRef<'n> {
    /// Glyph index, i.e. position in the CharStrings INDEX
    Index(u16),
    Name(&'n str),
    /// Character code, resolved through the font's encoding
    Code(u8),
}

/// A parsed CFF font program
///
/// All INDEX structures borrow from the font buffer. Decoded glyphs are
/// cached by name, so a font may be shared between threads and glyphs decoded
/// concurrently.
#[derive(Debug)]
pub struct CffFont<'a> {
    buffer: &'a [u8],
    header: CffHeader,
    name_index: CffIndex<'a>,
    top_dict: TopDict,
    string_index: CffIndex<'a>,
    global_subr_index: CffIndex<'a>,
    charstring_index: CffIndex<'a>,
    private_dict: PrivateDict,
    local_subr_index: Option<CffIndex<'a>>,
    charset: CffCharset,
    encoding: CffEncoding,
    limits: CharstringLimits,
    cache: RwLock<HashMap<String, Arc<Glyph>>>,
}

impl<'a> CffFont<'a> {
    pub fn parse(buffer: &'a [u8]) -> DecodeResult<Self> {
        CffParser::new(buffer).parse()
    }

    pub fn with_limits(mut self, limits: CharstringLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> CharstringLimits {
        self.limits
    }

    pub fn header(&self) -> CffHeader {
        self.header
    }

    /// The PostScript name of the font, from the Name INDEX
    pub fn name(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name_index.get(0)?).ok()
    }

    pub fn full_name(&self) -> Option<&'a str> {
        self.string_for_sid(self.top_dict.full_name?).ok()
    }

    pub fn family_name(&self) -> Option<&'a str> {
        self.string_for_sid(self.top_dict.family_name?).ok()
    }

    pub fn font_matrix(&self) -> Matrix {
        Matrix::from_arr(self.top_dict.font_matrix)
    }

    pub fn font_bbox(&self) -> [f32; 4] {
        self.top_dict.font_b_box
    }

    pub fn italic_angle(&self) -> f32 {
        self.top_dict.italic_angle
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.top_dict.is_fixed_pitch
    }

    pub fn default_width_x(&self) -> f32 {
        self.private_dict.default_width_x
    }

    pub fn nominal_width_x(&self) -> f32 {
        self.private_dict.nominal_width_x
    }

    pub fn glyph_count(&self) -> usize {
        self.charstring_index.len()
    }

    pub fn charset(&self) -> &CffCharset {
        &self.charset
    }

    pub fn encoding(&self) -> &CffEncoding {
        &self.encoding
    }

    /// Resolve a SID against the standard strings, then the String INDEX
    pub fn string_for_sid(&self, sid: u16) -> DecodeResult<&'a str> {
        if sid < NUM_STANDARD_STRINGS {
            return Ok(STANDARD_STRINGS[sid as usize]);
        }

        self.string_index
            .get((sid - NUM_STANDARD_STRINGS) as usize)
            .and_then(|s| std::str::from_utf8(s).ok())
            .ok_or(DecodeError::InvalidStringId(sid))
    }

    pub fn sid_for_name(&self, name: &str) -> Option<u16> {
        if let Some(&sid) = STANDARD_STRING_SIDS.get(name) {
            return Some(sid);
        }

        self.string_index
            .iter()
            .position(|s| s == name.as_bytes())
            .and_then(|idx| u16::try_from(idx + NUM_STANDARD_STRINGS as usize).ok())
    }

    pub fn glyph_name(&self, glyph: u16) -> DecodeResult<&'a str> {
        if glyph as usize >= self.glyph_count() {
            return Err(DecodeError::UnknownGlyph);
        }

        let sid = self
            .charset
            .sid_for_glyph(glyph)
            .ok_or(DecodeError::UnknownGlyph)?;

        self.string_for_sid(sid)
    }

    pub fn glyph_names(&self) -> impl Iterator<Item = DecodeResult<&'a str>> + '_ {
        (0..self.glyph_count() as u16).map(move |glyph| self.glyph_name(glyph))
    }

    pub fn glyph_index(&self, glyph: GlyphRef) -> DecodeResult<u16> {
        let idx = match glyph {
            GlyphRef::Index(idx) => Some(idx),
            GlyphRef::Name(name) => self
                .sid_for_name(name)
                .and_then(|sid| self.charset.glyph_for_sid(sid)),
            GlyphRef::Code(code) => self.encoding.lookup(code, &self.charset),
        };

        match idx {
            Some(idx) if (idx as usize) < self.glyph_count() => Ok(idx),
            _ => Err(DecodeError::UnknownGlyph),
        }
    }

    /// Decode a glyph, or return it from the cache
    ///
    /// A glyph whose charstring fails to execute is not cached and the error
    /// is returned.
    pub fn decode_glyph(&self, glyph: GlyphRef) -> DecodeResult<Arc<Glyph>> {
        let idx = self.glyph_index(glyph)?;
        let name = self.glyph_name(idx)?;

        if let Some(glyph) = self.cached(name) {
            return Ok(glyph);
        }

        match self.build_glyph(idx, name) {
            (glyph, None) => Ok(self.insert(glyph)),
            (_, Some(err)) => Err(err),
        }
    }

    /// Decode a glyph, returning whatever outline was drawn before any error
    ///
    /// An unresolvable glyph reference yields an empty `.notdef` glyph with
    /// the default width.
    pub fn decode_glyph_lossy(&self, glyph: GlyphRef) -> (Arc<Glyph>, Option<DecodeError>) {
        let resolved = self
            .glyph_index(glyph)
            .and_then(|idx| Ok((idx, self.glyph_name(idx)?)));

        let (idx, name) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                let placeholder = Glyph::empty(STANDARD_STRINGS[0], self.default_width_x());
                return (Arc::new(placeholder), Some(err));
            }
        };

        if let Some(glyph) = self.cached(name) {
            return (glyph, None);
        }

        match self.build_glyph(idx, name) {
            (glyph, None) => (self.insert(glyph), None),
            (glyph, Some(err)) => {
                log::warn!("glyph {:?} decoded partially: {}", name, err);
                (Arc::new(glyph), Some(err))
            }
        }
    }

    fn cached(&self, name: &str) -> Option<Arc<Glyph>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn insert(&self, glyph: Glyph) -> Arc<Glyph> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);

        log::debug!("caching glyph {:?}", glyph.name);

        Arc::clone(
            cache
                .entry(glyph.name.clone())
                .or_insert_with(|| Arc::new(glyph)),
        )
    }

    fn build_glyph(&self, idx: u16, name: &str) -> (Glyph, Option<DecodeError>) {
        let (output, error) = self.run_charstring(idx);

        let mut glyph = Glyph {
            name: name.to_owned(),
            outline: output.outline,
            advance_width: output.width,
        };

        if error.is_some() {
            return (glyph, error);
        }

        if let Some(seac) = output.seac {
            if let Err(err) = self.compose_accented(&mut glyph, seac) {
                return (glyph, Some(err));
            }
        }

        (glyph, None)
    }

    /// Overlay the base character at the origin and the accent at
    /// `(adx, ady)`. Both are named by Standard Encoding codes
    fn compose_accented(&self, glyph: &mut Glyph, seac: charstring::Seac) -> DecodeResult<()> {
        log::debug!(
            "composing {:?} from codes {} and {}",
            glyph.name,
            seac.base,
            seac.accent
        );

        let base = self.seac_component(seac.base)?;
        let accent = self.seac_component(seac.accent)?;

        glyph.outline.append(&base.outline, Matrix::identity());
        glyph
            .outline
            .append(&accent.outline, Matrix::new_translation(seac.adx, seac.ady));

        Ok(())
    }

    fn seac_component(&self, code: u8) -> DecodeResult<CharstringOutput> {
        let idx = match STANDARD_ENCODING[code as usize] {
            0 => None,
            sid => self.charset.glyph_for_sid(sid),
        }
        .filter(|&idx| (idx as usize) < self.glyph_count())
        .ok_or(DecodeError::UnknownGlyph)?;

        let (output, error) = self.run_charstring(idx);

        if let Some(err) = error {
            return Err(err);
        }

        if output.seac.is_some() {
            return Err(DecodeError::RecursionLimitExceeded { depth: 2 });
        }

        Ok(output)
    }

    fn run_charstring(&self, idx: u16) -> (CharstringOutput, Option<DecodeError>) {
        let empty = CffIndex::empty(self.buffer);

        let context = CharstringContext {
            global_subrs: &self.global_subr_index,
            local_subrs: self.local_subr_index.as_ref().unwrap_or(&empty),
            default_width_x: self.private_dict.default_width_x,
            nominal_width_x: self.private_dict.nominal_width_x,
            limits: self.limits,
        };

        let charstring = match self.charstring_index.get(idx as usize) {
            Some(charstring) => charstring,
            None => {
                let output = CharstringOutput {
                    outline: Default::default(),
                    width: context.default_width_x,
                    seac: None,
                };
                return (output, Some(DecodeError::UnknownGlyph));
            }
        };

        CffCharStringInterpreter::new(charstring, context).evaluate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        font::cff::test_font::{charset_format0, dict_int, CharstringBuilder, FontBuilder},
        geometry::{PathOp, Point},
    };

    fn cs() -> CharstringBuilder {
        CharstringBuilder::new()
    }

    fn square(size: i32) -> CharstringBuilder {
        cs().nums(&[0, 0])
            .op(21)
            .num(size)
            .op(6)
            .num(size)
            .op(7)
            .num(-size)
            .op(6)
    }

    /// .notdef, A, acute, Aacute (seac of A and acute), plus a custom glyph
    fn accented_font() -> FontBuilder {
        FontBuilder::new("TestFont")
            .string("custom")
            .default_width_x(500)
            .nominal_width_x(400)
            .glyph(cs().op(14).build())
            .glyph(square(100).op(14).build())
            .glyph(
                cs().nums(&[0, 0])
                    .op(21)
                    .nums(&[10, 10])
                    .op(5)
                    .op(14)
                    .build(),
            )
            .glyph(cs().nums(&[200, 50, 150, 65, 194]).op(14).build())
            .glyph(cs().num(-200).op(14).build())
            .charset(charset_format0(&[34, 125, 171, 391]))
    }

    #[test]
    fn metadata() {
        let data = accented_font()
            .top_dict_ops(&[dict_int(391), vec![2], dict_int(391), vec![3]].concat())
            .build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(font.name(), Some("TestFont"));
        assert_eq!(font.full_name(), Some("custom"));
        assert_eq!(font.family_name(), Some("custom"));
        assert_eq!(font.glyph_count(), 5);
        assert_eq!(font.font_matrix(), Matrix::new(0.001, 0.0, 0.0, 0.001, 0.0, 0.0));
        assert_eq!(font.header().major, 1);
        assert_eq!(font.default_width_x(), 500.0);
        assert_eq!(font.nominal_width_x(), 400.0);
        assert_eq!(
            font.glyph_names().collect::<DecodeResult<Vec<_>>>().unwrap(),
            vec![".notdef", "A", "acute", "Aacute", "custom"]
        );
    }

    #[test]
    fn sid_resolution() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(font.string_for_sid(0), Ok(".notdef"));
        assert_eq!(font.string_for_sid(390), Ok("Semibold"));
        assert_eq!(font.string_for_sid(391), Ok("custom"));
        assert_eq!(font.string_for_sid(392), Err(DecodeError::InvalidStringId(392)));
        assert_eq!(font.sid_for_name("custom"), Some(391));
        assert_eq!(font.sid_for_name("A"), Some(34));
        assert_eq!(font.sid_for_name("missing"), None);
    }

    #[test]
    fn glyph_references() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(font.glyph_index(GlyphRef::Index(2)), Ok(2));
        assert_eq!(font.glyph_index(GlyphRef::Name("Aacute")), Ok(3));
        assert_eq!(font.glyph_index(GlyphRef::Name("custom")), Ok(4));
        assert_eq!(font.glyph_index(GlyphRef::Code(b'A')), Ok(1));
        assert_eq!(font.glyph_index(GlyphRef::Code(b'B')), Err(DecodeError::UnknownGlyph));
        assert_eq!(font.glyph_index(GlyphRef::Index(5)), Err(DecodeError::UnknownGlyph));
        assert_eq!(
            font.glyph_index(GlyphRef::Name("zcaron")),
            Err(DecodeError::UnknownGlyph)
        );
    }

    #[test]
    fn decodes_outline_and_width() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        let glyph = font.decode_glyph(GlyphRef::Name("A")).unwrap();
        assert_eq!(glyph.name, "A");
        assert_eq!(glyph.advance_width, 500.0);
        assert_eq!(glyph.outline.ops.len(), 5);
        assert_eq!(glyph.bounding_box().max(), Point::new(100.0, 100.0));

        let custom = font.decode_glyph(GlyphRef::Index(4)).unwrap();
        assert_eq!(custom.advance_width, 200.0);
        assert!(custom.outline.is_empty());

        let notdef = font.decode_glyph(GlyphRef::Index(0)).unwrap();
        assert_eq!(notdef.name, ".notdef");
        assert_eq!(notdef.advance_width, 500.0);
    }

    #[test]
    fn glyphs_are_cached_by_name() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        let by_name = font.decode_glyph(GlyphRef::Name("A")).unwrap();
        let by_index = font.decode_glyph(GlyphRef::Index(1)).unwrap();
        let by_code = font.decode_glyph(GlyphRef::Code(b'A')).unwrap();

        assert!(Arc::ptr_eq(&by_name, &by_index));
        assert!(Arc::ptr_eq(&by_name, &by_code));
    }

    #[test]
    fn seac_composes_base_and_accent() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        let glyph = font.decode_glyph(GlyphRef::Name("Aacute")).unwrap();

        assert_eq!(glyph.advance_width, 600.0);
        assert_eq!(
            glyph.outline.ops,
            vec![
                PathOp::MoveTo(Point::new(0.0, 0.0)),
                PathOp::LineTo(Point::new(100.0, 0.0)),
                PathOp::LineTo(Point::new(100.0, 100.0)),
                PathOp::LineTo(Point::new(0.0, 100.0)),
                PathOp::Close,
                PathOp::MoveTo(Point::new(50.0, 150.0)),
                PathOp::LineTo(Point::new(60.0, 160.0)),
                PathOp::Close,
            ]
        );
    }

    #[test]
    fn nested_seac_is_rejected() {
        // acute is itself an accented character
        let data = FontBuilder::new("Nested")
            .glyph(cs().op(14).build())
            .glyph(square(10).op(14).build())
            .glyph(cs().nums(&[0, 0, 65, 65]).op(14).build())
            .glyph(cs().nums(&[0, 0, 65, 194]).op(14).build())
            .charset(charset_format0(&[34, 125, 171]))
            .build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(
            font.decode_glyph(GlyphRef::Index(3)).unwrap_err(),
            DecodeError::RecursionLimitExceeded { depth: 2 }
        );
    }

    #[test]
    fn failed_glyphs_are_not_cached() {
        let data = FontBuilder::new("Broken")
            .glyph(cs().op(14).build())
            .glyph(cs().nums(&[0, 0]).op(21).nums(&[5, 5]).op(5).op(2).build())
            .build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(
            font.decode_glyph(GlyphRef::Index(1)).unwrap_err(),
            DecodeError::UnsupportedCharstringOperator { operator: 2 }
        );

        let (partial, error) = font.decode_glyph_lossy(GlyphRef::Index(1));
        assert_eq!(
            error,
            Some(DecodeError::UnsupportedCharstringOperator { operator: 2 })
        );
        assert_eq!(partial.outline.ops.len(), 3);
        assert_eq!(partial.name, "space");

        let (again, _) = font.decode_glyph_lossy(GlyphRef::Index(1));
        assert!(!Arc::ptr_eq(&partial, &again));
    }

    #[test]
    fn lossy_decode_of_unknown_glyph() {
        let data = FontBuilder::new("Small").glyph(cs().op(14).build()).build();
        let font = CffFont::parse(&data).unwrap();

        let (glyph, error) = font.decode_glyph_lossy(GlyphRef::Name("A"));

        assert_eq!(error, Some(DecodeError::UnknownGlyph));
        assert_eq!(glyph.name, ".notdef");
        assert!(glyph.outline.is_empty());
    }

    #[test]
    fn local_subrs_are_relative_to_private_dict() {
        let data = FontBuilder::new("Subrs")
            .glyph(cs().op(14).build())
            .glyph(cs().num(-107).op(10).op(14).build())
            .local_subr(square(20).op(11).build())
            .global_subr(cs().op(14).build())
            .build();
        let font = CffFont::parse(&data).unwrap();

        let glyph = font.decode_glyph(GlyphRef::Index(1)).unwrap();

        assert_eq!(glyph.bounding_box().max(), Point::new(20.0, 20.0));
    }

    #[test]
    fn limits_are_configurable() {
        let data = FontBuilder::new("Deep")
            .glyph(cs().op(14).build())
            .glyph(cs().num(-107).op(29).build())
            .global_subr(cs().num(-107).op(29).op(11).build())
            .build();
        let font = CffFont::parse(&data).unwrap().with_limits(CharstringLimits {
            max_call_depth: 5,
            ..CharstringLimits::default()
        });

        assert_eq!(font.limits().max_call_depth, 5);
        assert_eq!(
            font.decode_glyph(GlyphRef::Index(1)).unwrap_err(),
            DecodeError::RecursionLimitExceeded { depth: 6 }
        );
    }

    #[test]
    fn concurrent_decoding_shares_cache() {
        let data = accented_font().build();
        let font = CffFont::parse(&data).unwrap();

        let glyphs: Vec<Arc<Glyph>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| font.decode_glyph(GlyphRef::Name("Aacute")).unwrap()))
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let cached = font.decode_glyph(GlyphRef::Name("Aacute")).unwrap();
        assert!(glyphs.iter().all(|g| **g == *cached));
    }

    #[test]
    fn header_validation() {
        let mut data = accented_font().build();
        data[0] = 2;
        assert_eq!(
            CffFont::parse(&data).unwrap_err(),
            DecodeError::MalformedHeader
        );

        let mut data = accented_font().build();
        data[3] = 5;
        assert_eq!(
            CffFont::parse(&data).unwrap_err(),
            DecodeError::MalformedHeader
        );

        assert_eq!(
            CffFont::parse(&[1, 0]).unwrap_err(),
            DecodeError::MalformedHeader
        );
    }

    #[test]
    fn structural_errors() {
        let no_glyphs = FontBuilder::new("Empty").build();
        assert_eq!(
            CffFont::parse(&no_glyphs).unwrap_err(),
            DecodeError::MissingCharStrings
        );

        let cid = accented_font()
            .top_dict_ops(&[dict_int(391), dict_int(391), dict_int(0), vec![12, 30]].concat())
            .build();
        assert_eq!(
            CffFont::parse(&cid).unwrap_err(),
            DecodeError::UnsupportedFontKind
        );

        let type1 = accented_font()
            .top_dict_ops(&[dict_int(1), vec![12, 6]].concat())
            .build();
        assert_eq!(
            CffFont::parse(&type1).unwrap_err(),
            DecodeError::UnsupportedCharstringType(1)
        );

        let bad_charset = accented_font().charset(vec![7]).build();
        assert_eq!(
            CffFont::parse(&bad_charset).unwrap_err(),
            DecodeError::InvalidCharset { format: 7 }
        );
    }

    #[test]
    fn custom_encoding_with_supplement() {
        // format 0 with supplements: code 'x' -> glyph 1, supplement 'y' -> SID 125 (acute)
        let data = accented_font()
            .encoding(vec![0x80, 1, b'x', 1, b'y', 0, 125])
            .build();
        let font = CffFont::parse(&data).unwrap();

        assert_eq!(font.glyph_index(GlyphRef::Code(b'x')), Ok(1));
        assert_eq!(font.glyph_index(GlyphRef::Code(b'y')), Ok(2));
        assert_eq!(font.glyph_index(GlyphRef::Code(b'A')), Err(DecodeError::UnknownGlyph));
    }
}
