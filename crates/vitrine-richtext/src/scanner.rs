//! Lossless markup scanner.
//!
//! Splits rich-text markup into text runs, start tags, end tags and opaque
//! constructs (comments, doctypes, processing instructions). Every segment
//! keeps the exact source slice it came from, so a consumer that re-emits the
//! raw text of every segment reproduces the input byte for byte.
//!
//! This is deliberately not a full HTML tokenizer: character references are
//! not decoded and no tree is built. The rewriter only needs to recognise
//! tags and their attributes.

/// An attribute on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Raw (undecoded) value, `None` for a bare attribute.
    pub value: Option<String>,
}

/// A start tag with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Whether the tag ended in `/>`.
    pub self_closing: bool,
    /// Exact source text of the tag.
    pub raw: &'a str,
}

impl StartTag<'_> {
    /// Value of the first attribute with this (lowercase) name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }
}

/// One scanned piece of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Character data, including stray `<` that do not open a tag.
    Text(&'a str),
    /// `<name attr=value ...>`
    StartTag(StartTag<'a>),
    /// `</name>`
    EndTag {
        /// Lowercased tag name.
        name: String,
        /// Exact source text of the tag.
        raw: &'a str,
    },
    /// Comment, doctype or processing instruction, passed through untouched.
    Opaque(&'a str),
}

impl Segment<'_> {
    /// The exact source text of this segment.
    #[must_use]
    pub const fn raw(&self) -> &str {
        match self {
            Self::Text(raw) | Self::Opaque(raw) | Self::EndTag { raw, .. } => raw,
            Self::StartTag(tag) => tag.raw,
        }
    }
}

/// Scanner over a markup string.
#[derive(Debug)]
pub struct MarkupScanner<'a> {
    input: &'a str,
    current_pos: usize,
    text_start: usize,
    segments: Vec<Segment<'a>>,
}

impl<'a> MarkupScanner<'a> {
    /// Create a scanner over `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            current_pos: 0,
            text_start: 0,
            segments: Vec::new(),
        }
    }

    /// Scan the whole input.
    pub fn run(&mut self) {
        while let Some(offset) = self.input[self.current_pos..].find('<') {
            let lt = self.current_pos + offset;
            match self.scan_markup(lt) {
                Some((segment, end)) => {
                    self.flush_text(lt);
                    self.segments.push(segment);
                    self.current_pos = end;
                    self.text_start = end;
                }
                // Not markup: the '<' is character data.
                None => self.current_pos = lt + 1,
            }
        }
        self.flush_text(self.input.len());
        self.current_pos = self.input.len();
    }

    /// Consume the scanner and return the scanned segments.
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment<'a>> {
        self.segments
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            self.segments.push(Segment::Text(&self.input[self.text_start..end]));
        }
    }

    /// Try to scan a construct starting at the `<` at byte `lt`.
    ///
    /// Returns the segment and the byte offset just past it, or `None` if the
    /// `<` does not start markup (or the construct is unterminated).
    fn scan_markup(&self, lt: usize) -> Option<(Segment<'a>, usize)> {
        let rest = &self.input[lt + 1..];
        let next = rest.chars().next()?;

        if let Some(body) = rest.strip_prefix("!--") {
            let close = body.find("-->")?;
            let end = lt + 1 + 3 + close + 3;
            return Some((Segment::Opaque(&self.input[lt..end]), end));
        }
        if next == '!' || next == '?' {
            let close = rest.find('>')?;
            let end = lt + 1 + close + 1;
            return Some((Segment::Opaque(&self.input[lt..end]), end));
        }
        if next == '/' {
            let name_len = tag_name_len(&rest[1..]);
            if name_len == 0 {
                return None;
            }
            let close = rest.find('>')?;
            let end = lt + 1 + close + 1;
            let name = rest[1..=name_len].to_ascii_lowercase();
            return Some((
                Segment::EndTag {
                    name,
                    raw: &self.input[lt..end],
                },
                end,
            ));
        }
        if next.is_ascii_alphabetic() {
            return self.scan_start_tag(lt);
        }
        None
    }

    fn scan_start_tag(&self, lt: usize) -> Option<(Segment<'a>, usize)> {
        let bytes = self.input.as_bytes();
        let name_start = lt + 1;
        let name_end = name_start + tag_name_len(&self.input[name_start..]);
        let name = self.input[name_start..name_end].to_ascii_lowercase();

        let mut attributes = Vec::new();
        let mut pos = name_end;
        loop {
            pos = skip_whitespace(bytes, pos);
            match *bytes.get(pos)? {
                b'>' => {
                    let end = pos + 1;
                    let self_closing = pos > name_end && bytes[pos - 1] == b'/';
                    let tag = StartTag {
                        name,
                        attributes,
                        self_closing,
                        raw: &self.input[lt..end],
                    };
                    return Some((Segment::StartTag(tag), end));
                }
                b'/' => pos += 1,
                _ => {
                    let (attribute, next) = self.scan_attribute(pos)?;
                    attributes.push(attribute);
                    pos = next;
                }
            }
        }
    }

    /// Scan one attribute starting at `pos`; `None` if the input ends inside it.
    fn scan_attribute(&self, pos: usize) -> Option<(Attribute, usize)> {
        let bytes = self.input.as_bytes();
        let name_start = pos;
        let mut pos = pos;
        while let Some(&b) = bytes.get(pos) {
            if b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/') {
                break;
            }
            pos += 1;
        }
        // A lone '=' (or other delimiter) still consumes one byte.
        if pos == name_start {
            pos += 1;
        }
        let name = self.input[name_start..pos].to_ascii_lowercase();

        let after_name = skip_whitespace(bytes, pos);
        if bytes.get(after_name) != Some(&b'=') {
            return Some((Attribute { name, value: None }, pos));
        }

        let value_start = skip_whitespace(bytes, after_name + 1);
        match *bytes.get(value_start)? {
            quote @ (b'"' | b'\'') => {
                let close = self.input[value_start + 1..].find(char::from(quote))?;
                let value_end = value_start + 1 + close;
                let value = self.input[value_start + 1..value_end].to_string();
                Some((
                    Attribute {
                        name,
                        value: Some(value),
                    },
                    value_end + 1,
                ))
            }
            _ => {
                let mut end = value_start;
                while let Some(&b) = bytes.get(end) {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    end += 1;
                }
                let value = self.input[value_start..end].to_string();
                Some((
                    Attribute {
                        name,
                        value: Some(value),
                    },
                    end,
                ))
            }
        }
    }
}

/// Scan `input` into segments in one call.
#[must_use]
pub fn scan(input: &str) -> Vec<Segment<'_>> {
    let mut scanner = MarkupScanner::new(input);
    scanner.run();
    scanner.into_segments()
}

fn tag_name_len(s: &str) -> usize {
    if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return 0;
    }
    s.bytes()
        .take_while(|&b| !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>'))
        .count()
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}
