/// Renderer-agnostic representation of a parsed FB2 book.
///
/// All embedded resource references are resolved at parse time: the cover
/// image is the decoded bytes themselves, never an unresolved id, and no
/// raw markup is retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Heading of the first section that has one, if any.
    pub title: Option<String>,
    /// Decoded cover image bytes, if the cover reference resolved.
    pub cover_image: Option<Vec<u8>>,
    /// Top-level body sections in document order.
    pub sections: Vec<Section>,
}

/// One top-level section of the book body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub heading: Option<String>,
    /// Plain paragraph texts. Paragraphs with no text are omitted rather
    /// than represented as empty strings.
    pub paragraphs: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        self.paragraphs.push(text.into());
        self
    }
}
