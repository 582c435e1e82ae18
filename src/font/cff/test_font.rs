//! Byte-level builders for small synthetic CFF fonts used in tests

/// Assembles a Type 2 charstring
#[derive(Debug, Clone, Default)]
pub(crate) struct CharstringBuilder {
    bytes: Vec<u8>,
}

impl CharstringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num(mut self, n: i32) -> Self {
        match n {
            -107..=107 => self.bytes.push((n + 139) as u8),
            108..=1131 => {
                let n = n - 108;
                self.bytes.push((n / 256 + 247) as u8);
                self.bytes.push((n % 256) as u8);
            }
            -1131..=-108 => {
                let n = -n - 108;
                self.bytes.push((n / 256 + 251) as u8);
                self.bytes.push((n % 256) as u8);
            }
            _ => {
                self.bytes.push(28);
                self.bytes.extend_from_slice(&(n as i16).to_be_bytes());
            }
        }

        self
    }

    pub fn nums(self, ns: &[i32]) -> Self {
        ns.iter().fold(self, |builder, &n| builder.num(n))
    }

    /// 16.16 fixed-point operand
    pub fn fixed(mut self, n: f32) -> Self {
        self.bytes.push(255);
        self.bytes
            .extend_from_slice(&((n * 65536.0) as i32).to_be_bytes());
        self
    }

    pub fn op(mut self, op: u8) -> Self {
        self.bytes.push(op);
        self
    }

    /// Two-byte operator `12 op`
    pub fn esc(mut self, op: u8) -> Self {
        self.bytes.extend_from_slice(&[12, op]);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// An INDEX holding `entries`, with the smallest offset size that fits
pub(crate) fn index_bytes(entries: &[&[u8]]) -> Vec<u8> {
    let mut out = (entries.len() as u16).to_be_bytes().to_vec();

    if entries.is_empty() {
        return out;
    }

    let last_offset = entries.iter().map(|e| e.len()).sum::<usize>() + 1;
    let offsize = match last_offset {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    };

    out.push(offsize as u8);

    let mut offset = 1u32;
    for entry in entries.iter().map(|e| e.len()).chain(std::iter::once(0)) {
        out.extend_from_slice(&offset.to_be_bytes()[4 - offsize..]);
        offset += entry as u32;
    }

    for entry in entries {
        out.extend_from_slice(entry);
    }

    out
}

/// A DICT integer operand in its shortest encoding
pub(crate) fn dict_int(n: i32) -> Vec<u8> {
    match n {
        -107..=107 => vec![(n + 139) as u8],
        108..=1131 => {
            let n = n - 108;
            vec![(n / 256 + 247) as u8, (n % 256) as u8]
        }
        -1131..=-108 => {
            let n = -n - 108;
            vec![(n / 256 + 251) as u8, (n % 256) as u8]
        }
        -32768..=32767 => {
            let [b1, b2] = (n as i16).to_be_bytes();
            vec![28, b1, b2]
        }
        _ => {
            let mut out = vec![29];
            out.extend_from_slice(&n.to_be_bytes());
            out
        }
    }
}

/// An offset operand in the fixed-width 5-byte encoding, so that a DICT's
/// length doesn't depend on the offsets it holds
fn dict_offset(n: usize) -> Vec<u8> {
    let mut out = vec![29];
    out.extend_from_slice(&(n as i32).to_be_bytes());
    out
}

/// A format 0 charset naming glyphs `1..` with `sids`
pub(crate) fn charset_format0(sids: &[u16]) -> Vec<u8> {
    let mut out = vec![0];
    for sid in sids {
        out.extend_from_slice(&sid.to_be_bytes());
    }
    out
}

/// Lays out a complete single-font CFF program:
///
/// header, Name INDEX, Top DICT INDEX, String INDEX, Global Subr INDEX,
/// CharStrings INDEX, charset, encoding, Private DICT, local Subrs INDEX
#[derive(Debug, Clone)]
pub(crate) struct FontBuilder {
    name: String,
    strings: Vec<String>,
    top_dict_ops: Vec<u8>,
    glyphs: Vec<Vec<u8>>,
    global_subrs: Vec<Vec<u8>>,
    local_subrs: Vec<Vec<u8>>,
    charset: Option<Vec<u8>>,
    encoding: Option<Vec<u8>>,
    default_width_x: i32,
    nominal_width_x: i32,
}

impl FontBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            strings: Vec::new(),
            top_dict_ops: Vec::new(),
            glyphs: Vec::new(),
            global_subrs: Vec::new(),
            local_subrs: Vec::new(),
            charset: None,
            encoding: None,
            default_width_x: 0,
            nominal_width_x: 0,
        }
    }

    /// Add a custom string; the first one gets SID 391
    pub fn string(mut self, s: &str) -> Self {
        self.strings.push(s.to_owned());
        self
    }

    /// Extra Top DICT data, written before the offsets
    pub fn top_dict_ops(mut self, ops: &[u8]) -> Self {
        self.top_dict_ops.extend_from_slice(ops);
        self
    }

    pub fn glyph(mut self, charstring: Vec<u8>) -> Self {
        self.glyphs.push(charstring);
        self
    }

    pub fn global_subr(mut self, charstring: Vec<u8>) -> Self {
        self.global_subrs.push(charstring);
        self
    }

    pub fn local_subr(mut self, charstring: Vec<u8>) -> Self {
        self.local_subrs.push(charstring);
        self
    }

    /// Raw charset data; without one the font uses ISOAdobe
    pub fn charset(mut self, data: Vec<u8>) -> Self {
        self.charset = Some(data);
        self
    }

    /// Raw encoding data; without one the font uses Standard Encoding
    pub fn encoding(mut self, data: Vec<u8>) -> Self {
        self.encoding = Some(data);
        self
    }

    pub fn default_width_x(mut self, width: i32) -> Self {
        self.default_width_x = width;
        self
    }

    pub fn nominal_width_x(mut self, width: i32) -> Self {
        self.nominal_width_x = width;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header = [1, 0, 4, 4];

        let name_index = index_bytes(&[self.name.as_bytes()]);
        let strings: Vec<&[u8]> = self.strings.iter().map(|s| s.as_bytes()).collect();
        let string_index = index_bytes(&strings);
        let global_subr_index = index_bytes(&as_slices(&self.global_subrs));
        let charstring_index = index_bytes(&as_slices(&self.glyphs));
        let local_subr_index = index_bytes(&as_slices(&self.local_subrs));

        let private_dict = self.private_dict();

        // the Top DICT's length is independent of the offsets it holds
        let top_dict_len = self.top_dict(&Layout::default()).len();
        let top_dict_index_len = index_bytes(&[&vec![0u8; top_dict_len]]).len();

        let mut layout = Layout::default();
        let mut cursor = header.len() + name_index.len() + top_dict_index_len;
        cursor += string_index.len() + global_subr_index.len();

        layout.char_strings = cursor;
        cursor += charstring_index.len();

        layout.charset = cursor;
        cursor += self.charset.as_ref().map_or(0, Vec::len);

        layout.encoding = cursor;
        cursor += self.encoding.as_ref().map_or(0, Vec::len);

        layout.private = cursor;
        layout.private_size = private_dict.len();

        let top_dict = self.top_dict(&layout);
        let top_dict_index = index_bytes(&[&top_dict]);
        debug_assert_eq!(top_dict_index.len(), top_dict_index_len);

        let mut out = header.to_vec();
        out.extend(name_index);
        out.extend(top_dict_index);
        out.extend(string_index);
        out.extend(global_subr_index);
        if !self.glyphs.is_empty() {
            out.extend(charstring_index);
        }
        out.extend(self.charset.iter().flatten());
        out.extend(self.encoding.iter().flatten());
        out.extend(private_dict);
        if !self.local_subrs.is_empty() {
            out.extend(local_subr_index);
        }

        out
    }

    fn top_dict(&self, layout: &Layout) -> Vec<u8> {
        let mut dict = self.top_dict_ops.clone();

        if !self.glyphs.is_empty() {
            dict.extend(dict_offset(layout.char_strings));
            dict.push(17);
        }

        if self.charset.is_some() {
            dict.extend(dict_offset(layout.charset));
            dict.push(15);
        }

        if self.encoding.is_some() {
            dict.extend(dict_offset(layout.encoding));
            dict.push(16);
        }

        dict.extend(dict_offset(layout.private_size));
        dict.extend(dict_offset(layout.private));
        dict.push(18);

        dict
    }

    /// Local subroutines directly follow the Private DICT
    fn private_dict(&self) -> Vec<u8> {
        let mut dict = dict_int(self.default_width_x);
        dict.push(20);
        dict.extend(dict_int(self.nominal_width_x));
        dict.push(21);

        if !self.local_subrs.is_empty() {
            let len = dict.len() + dict_offset(0).len() + 1;
            dict.extend(dict_offset(len));
            dict.push(19);
        }

        dict
    }
}

#[derive(Debug, Default)]
struct Layout {
    char_strings: usize,
    charset: usize,
    encoding: usize,
    private: usize,
    private_size: usize,
}

fn as_slices(entries: &[Vec<u8>]) -> Vec<&[u8]> {
    entries.iter().map(Vec::as_slice).collect()
}
