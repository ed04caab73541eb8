//! DOCX body parser implementation.

use super::names::ArtifactNamer;
use super::numbering::NumberingMap;
use super::styles::StyleMap;
use super::{attr_value, bool_attr};
use crate::container::{Package, DOCUMENT_PART};
use crate::error::{Error, Result};
use crate::model::{
    Block, Cell, CropBox, Document, ImageReference, InlineImage, ListInfo, Paragraph, Row,
    SizeTransform, Table, TextRun, TextStyle,
};
use crate::relationships::{RelationshipTable, Relationships};
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";

/// Word tables have at most 63 columns.
const MAX_GRID_SPAN: u32 = 63;

/// Parser for the main document part.
pub struct DocxParser<'a> {
    relationships: &'a Relationships,
    media: &'a RelationshipTable,
    styles: StyleMap,
    numbering: NumberingMap,
}

impl<'a> DocxParser<'a> {
    /// Create a parser without style or numbering information.
    pub fn new(relationships: &'a Relationships, media: &'a RelationshipTable) -> Self {
        Self {
            relationships,
            media,
            styles: StyleMap::default(),
            numbering: NumberingMap::default(),
        }
    }

    /// Create a parser using the package's styles and numbering parts.
    ///
    /// Both parts are optional hints. A missing or malformed part leaves
    /// headings and lists undetected without failing the conversion.
    pub fn from_package(
        package: &Package,
        relationships: &'a Relationships,
        media: &'a RelationshipTable,
    ) -> Self {
        let styles = optional_part(package, STYLES_PART, StyleMap::parse);
        let numbering = optional_part(package, NUMBERING_PART, NumberingMap::parse);

        Self::new(relationships, media)
            .with_styles(styles)
            .with_numbering(numbering)
    }

    pub fn with_styles(mut self, styles: StyleMap) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_numbering(mut self, numbering: NumberingMap) -> Self {
        self.numbering = numbering;
        self
    }

    /// Parse the package's main document, including core metadata.
    pub fn parse(&self, package: &Package) -> Result<Document> {
        let xml = package.read_xml(DOCUMENT_PART)?;
        let mut doc = self.parse_body(&xml)?;
        doc.metadata = package.core_metadata();
        Ok(doc)
    }

    /// Parse document XML into the model.
    ///
    /// Fails with [`Error::Conversion`] when the XML is not well formed or has
    /// no `w:body`.
    pub fn parse_body(&self, xml: &str) -> Result<Document> {
        let mut reader = quick_xml::Reader::from_str(xml);
        // w:t content keeps its whitespace (xml:space="preserve")
        reader.config_mut().trim_text(false);

        let mut walker = BodyWalker::new(self);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => walker.open(e),
                Ok(Event::Empty(ref e)) => {
                    walker.open(e);
                    walker.close(e.name().as_ref());
                }
                Ok(Event::End(ref e)) => walker.close(e.name().as_ref()),
                Ok(Event::Text(ref e)) => {
                    if walker.in_text() {
                        let text = e.unescape().map_err(|err| Error::Conversion(err.to_string()))?;
                        walker.text(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if walker.in_text() {
                        walker.text(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Conversion(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        walker.finish()
    }
}

#[derive(Debug)]
struct TableState {
    table: Table,
    row: Option<Row>,
    cell: Option<Cell>,
}

#[derive(Debug, Default)]
struct PictureState {
    rel_id: Option<String>,
    crop: Option<CropBox>,
    transform: Option<SizeTransform>,
    in_blip_fill: bool,
    in_sp_pr: bool,
    in_xfrm: bool,
}

/// Event-driven state while walking the body.
struct BodyWalker<'p, 'a> {
    parser: &'p DocxParser<'a>,
    doc: Document,
    namer: ArtifactNamer,
    depth: usize,
    saw_body: bool,
    /// Nesting depth inside `mc:Fallback`, whose content duplicates `mc:Choice`
    fallback_depth: usize,
    paragraphs: Vec<Paragraph>,
    tables: Vec<TableState>,
    in_ppr: bool,
    in_num_pr: bool,
    in_rpr: bool,
    in_run: bool,
    in_text: bool,
    num_id: Option<String>,
    num_level: u8,
    run_style: TextStyle,
    run_text: String,
    hyperlinks: Vec<Option<String>>,
    picture: Option<PictureState>,
    drawing_alt: Option<String>,
}

impl<'p, 'a> BodyWalker<'p, 'a> {
    fn new(parser: &'p DocxParser<'a>) -> Self {
        Self {
            parser,
            doc: Document::new(),
            namer: ArtifactNamer::new(),
            depth: 0,
            saw_body: false,
            fallback_depth: 0,
            paragraphs: Vec::new(),
            tables: Vec::new(),
            in_ppr: false,
            in_num_pr: false,
            in_rpr: false,
            in_run: false,
            in_text: false,
            num_id: None,
            num_level: 0,
            run_style: TextStyle::default(),
            run_text: String::new(),
            hyperlinks: Vec::new(),
            picture: None,
            drawing_alt: None,
        }
    }

    fn in_text(&self) -> bool {
        self.in_text && self.fallback_depth == 0
    }

    fn text(&mut self, text: &str) {
        self.run_text.push_str(text);
    }

    fn open(&mut self, e: &BytesStart) {
        self.depth += 1;
        if self.fallback_depth > 0 {
            self.fallback_depth += 1;
            return;
        }

        match e.name().as_ref() {
            b"mc:Fallback" => self.fallback_depth = 1,
            b"w:body" => self.saw_body = true,

            // Paragraph structure
            b"w:p" => self.paragraphs.push(Paragraph::new()),
            b"w:pPr" => self.in_ppr = true,
            b"w:numPr" if self.in_ppr => self.in_num_pr = true,
            b"w:pStyle" if self.in_ppr => {
                if let (Some(id), Some(para)) = (attr_value(e, b"w:val"), self.paragraphs.last_mut())
                {
                    para.heading = self.parser.styles.heading_level(&id);
                    para.style_id = Some(id);
                }
            }
            b"w:outlineLvl" if self.in_ppr => {
                let level = attr_value(e, b"w:val").and_then(|v| v.parse::<u8>().ok());
                if let (Some(level), Some(para)) = (level, self.paragraphs.last_mut()) {
                    // Level 9 is "body text"
                    if level < 6 {
                        para.heading = crate::model::HeadingLevel::from_number(level + 1);
                    }
                }
            }
            b"w:ilvl" if self.in_num_pr => {
                self.num_level = attr_value(e, b"w:val")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
            }
            b"w:numId" if self.in_num_pr => self.num_id = attr_value(e, b"w:val"),

            // Runs
            b"w:r" => {
                self.in_run = true;
                self.run_style = TextStyle::default();
            }
            b"w:rPr" if self.in_run => self.in_rpr = true,
            b"w:t" if self.in_run => self.in_text = true,
            b"w:rStyle" if self.in_rpr => {
                if let Some(props) =
                    attr_value(e, b"w:val").and_then(|id| self.parser.styles.run_props(&id))
                {
                    props.apply_to(&mut self.run_style);
                }
            }
            b"w:b" if self.in_rpr => self.run_style.bold = bool_attr(e),
            b"w:i" if self.in_rpr => self.run_style.italic = bool_attr(e),
            b"w:strike" | b"w:dstrike" if self.in_rpr => {
                self.run_style.strikethrough = bool_attr(e)
            }
            b"w:u" if self.in_rpr => {
                self.run_style.underline = attr_value(e, b"w:val").as_deref() != Some("none");
            }
            b"w:vertAlign" if self.in_rpr => {
                let val = attr_value(e, b"w:val");
                self.run_style.superscript = val.as_deref() == Some("superscript");
                self.run_style.subscript = val.as_deref() == Some("subscript");
            }
            b"w:tab" if self.in_run => self.run_text.push('\t'),
            b"w:br" if self.in_run => {
                // Page and column breaks have no HTML counterpart
                if !matches!(attr_value(e, b"w:type").as_deref(), Some("page") | Some("column")) {
                    self.flush_run();
                    if let Some(para) = self.paragraphs.last_mut() {
                        para.push_break();
                    }
                }
            }
            b"w:cr" if self.in_run => {
                self.flush_run();
                if let Some(para) = self.paragraphs.last_mut() {
                    para.push_break();
                }
            }
            b"w:hyperlink" => {
                self.flush_run();
                let target = attr_value(e, b"r:id")
                    .and_then(|id| self.parser.relationships.hyperlink(&id).map(String::from))
                    .or_else(|| attr_value(e, b"w:anchor").map(|anchor| format!("#{anchor}")));
                self.hyperlinks.push(target);
            }

            // Tables
            b"w:tbl" => self.tables.push(TableState {
                table: Table::new(),
                row: None,
                cell: None,
            }),
            b"w:tr" => {
                if let Some(state) = self.tables.last_mut() {
                    state.row = Some(Row::default());
                }
            }
            b"w:tblHeader" => {
                if let Some(row) = self.tables.last_mut().and_then(|s| s.row.as_mut()) {
                    row.is_header = bool_attr(e);
                }
            }
            b"w:tc" => {
                if let Some(state) = self.tables.last_mut() {
                    state.cell = Some(Cell::new());
                }
            }
            b"w:gridSpan" => {
                if let Some(cell) = self.current_cell() {
                    cell.col_span = attr_value(e, b"w:val")
                        .and_then(|v| v.trim().parse::<u32>().ok())
                        .unwrap_or(1)
                        .clamp(1, MAX_GRID_SPAN);
                }
            }
            b"w:vMerge" => {
                let restart = attr_value(e, b"w:val").as_deref() == Some("restart");
                if let Some(cell) = self.current_cell() {
                    cell.merged_continuation = !restart;
                }
            }

            // DrawingML pictures
            b"w:drawing" => self.drawing_alt = None,
            b"wp:docPr" => {
                self.drawing_alt = non_empty(attr_value(e, b"descr"))
                    .or_else(|| non_empty(attr_value(e, b"title")));
            }
            b"pic:pic" => self.picture = Some(PictureState::default()),
            b"pic:blipFill" => {
                if let Some(pic) = self.picture.as_mut() {
                    pic.in_blip_fill = true;
                }
            }
            b"pic:spPr" => {
                if let Some(pic) = self.picture.as_mut() {
                    pic.in_sp_pr = true;
                }
            }
            b"a:blip" => {
                if let Some(pic) = self.picture.as_mut().filter(|p| p.in_blip_fill) {
                    pic.rel_id = attr_value(e, b"r:embed");
                }
            }
            b"a:srcRect" => {
                if let Some(pic) = self.picture.as_mut().filter(|p| p.in_blip_fill) {
                    pic.crop = Some(parse_src_rect(e));
                }
            }
            b"a:xfrm" => {
                if let Some(pic) = self.picture.as_mut().filter(|p| p.in_sp_pr) {
                    pic.in_xfrm = true;
                    pic.transform = Some(SizeTransform {
                        rotation: int_attr(e, b"rot"),
                        flip_h: flag_attr(e, b"flipH"),
                        flip_v: flag_attr(e, b"flipV"),
                        ..Default::default()
                    });
                }
            }
            b"a:off" => {
                if let Some(xfrm) = self.current_transform() {
                    xfrm.x = int_attr(e, b"x");
                    xfrm.y = int_attr(e, b"y");
                }
            }
            b"a:ext" => {
                if let Some(xfrm) = self.current_transform() {
                    xfrm.cx = int_attr(e, b"cx");
                    xfrm.cy = int_attr(e, b"cy");
                }
            }

            // VML pictures (legacy documents, embedded metafiles)
            b"v:shape" => self.drawing_alt = non_empty(attr_value(e, b"alt")),
            b"v:imagedata" => {
                if let Some(rel_id) = attr_value(e, b"r:id") {
                    let alt = non_empty(attr_value(e, b"o:title")).or_else(|| self.drawing_alt.clone());
                    self.push_image(ImageReference::new(rel_id), alt);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        self.depth = self.depth.saturating_sub(1);
        if self.fallback_depth > 0 {
            self.fallback_depth -= 1;
            return;
        }

        match name {
            b"w:t" => self.in_text = false,
            b"w:rPr" => self.in_rpr = false,
            b"w:r" => {
                self.flush_run();
                self.in_run = false;
                self.in_rpr = false;
            }
            b"w:numPr" => self.in_num_pr = false,
            b"w:pPr" => {
                self.in_ppr = false;
                self.in_num_pr = false;
                if let Some(num_id) = self.num_id.take() {
                    let level = std::mem::take(&mut self.num_level);
                    let list_type = self.parser.numbering.list_type(&num_id, level);
                    if let (Some(list_type), Some(para)) = (list_type, self.paragraphs.last_mut()) {
                        para.list_info = Some(ListInfo {
                            num_id,
                            list_type,
                            level,
                        });
                    }
                }
            }
            b"w:hyperlink" => {
                self.flush_run();
                self.hyperlinks.pop();
            }
            b"w:p" => {
                self.flush_run();
                if let Some(para) = self.paragraphs.pop() {
                    self.place_paragraph(para);
                }
            }
            b"w:tc" => {
                if let Some(state) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (state.cell.take(), state.row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(state) = self.tables.last_mut() {
                    if let Some(row) = state.row.take() {
                        state.table.add_row(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(state) = self.tables.pop() {
                    self.place_table(state.table);
                }
            }
            b"pic:blipFill" => {
                if let Some(pic) = self.picture.as_mut() {
                    pic.in_blip_fill = false;
                }
            }
            b"pic:spPr" => {
                if let Some(pic) = self.picture.as_mut() {
                    pic.in_sp_pr = false;
                }
            }
            b"a:xfrm" => {
                if let Some(pic) = self.picture.as_mut() {
                    pic.in_xfrm = false;
                }
            }
            b"pic:pic" => {
                if let Some(pic) = self.picture.take() {
                    match pic.rel_id {
                        Some(rel_id) => {
                            let reference = ImageReference {
                                crop: pic.crop,
                                transform: pic.transform,
                                ..ImageReference::new(rel_id)
                            };
                            let alt = self.drawing_alt.clone();
                            self.push_image(reference, alt);
                        }
                        None => debug!("picture without an embedded blip"),
                    }
                }
            }
            b"w:drawing" => self.drawing_alt = None,
            _ => {}
        }
    }

    fn finish(self) -> Result<Document> {
        if self.depth != 0 {
            return Err(Error::Conversion(
                "document ended inside an open element".to_string(),
            ));
        }
        if !self.saw_body {
            return Err(Error::Conversion(
                "document part has no w:body element".to_string(),
            ));
        }
        Ok(self.doc)
    }

    fn current_cell(&mut self) -> Option<&mut Cell> {
        self.tables.last_mut().and_then(|state| state.cell.as_mut())
    }

    fn current_transform(&mut self) -> Option<&mut SizeTransform> {
        self.picture
            .as_mut()
            .filter(|pic| pic.in_xfrm)
            .and_then(|pic| pic.transform.as_mut())
    }

    fn flush_run(&mut self) {
        if self.run_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.run_text);
        let hyperlink = self.hyperlinks.last().cloned().flatten();
        if let Some(para) = self.paragraphs.last_mut() {
            para.push_run(TextRun {
                text,
                style: self.run_style.clone(),
                hyperlink,
            });
        }
    }

    fn push_image(&mut self, mut reference: ImageReference, alt_text: Option<String>) {
        self.flush_run();
        reference.key = self
            .parser
            .media
            .basename(&reference.relationship_id)
            .map(|basename| self.namer.assign(basename));
        if let Some(para) = self.paragraphs.last_mut() {
            para.push_image(InlineImage {
                reference,
                alt_text,
            });
        }
    }

    fn place_paragraph(&mut self, para: Paragraph) {
        // Text box content nests inside the anchoring paragraph
        if let Some(outer) = self.paragraphs.last_mut() {
            if !para.content.is_empty() {
                outer.push_break();
                outer.content.extend(para.content);
            }
            return;
        }
        if let Some(state) = self.tables.last_mut() {
            if let Some(cell) = state.cell.as_mut() {
                cell.content.push(para);
            }
            return;
        }
        self.doc.add_block(Block::Paragraph(para));
    }

    fn place_table(&mut self, table: Table) {
        // Nested tables are flattened into the enclosing cell
        if let Some(cell) = self.current_cell() {
            cell.content.extend(
                table
                    .rows
                    .into_iter()
                    .flat_map(|row| row.cells)
                    .flat_map(|cell| cell.content),
            );
            return;
        }
        self.doc.add_block(Block::Table(table));
    }
}

/// Parse an optional auxiliary part, falling back to its default.
fn optional_part<T: Default>(package: &Package, name: &str, parse: fn(&str) -> Result<T>) -> T {
    if !package.exists(name) {
        return T::default();
    }
    match package.read_xml(name).and_then(|xml| parse(&xml)) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", name, e);
            T::default()
        }
    }
}

/// Read `a:srcRect` insets; missing attributes are zero.
fn parse_src_rect(e: &BytesStart) -> CropBox {
    let inset = |key: &[u8]| {
        attr_value(e, key)
            .and_then(|v| parse_percentage(&v))
            .unwrap_or(0)
    };
    CropBox::new(inset(b"l"), inset(b"r"), inset(b"t"), inset(b"b"))
}

/// Parse an `ST_Percentage`: integer thousandths of a percent, or a
/// `"12.5%"` string as written by strict OOXML.
fn parse_percentage(value: &str) -> Option<i64> {
    let value = value.trim();
    let parsed = match value.strip_suffix('%') {
        Some(pct) => (pct.trim().parse::<f64>().ok()? * 1000.0).round() as i64,
        None => value.parse::<i64>().ok()?,
    };
    Some(parsed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)))
}

fn int_attr(e: &BytesStart, key: &[u8]) -> i64 {
    attr_value(e, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn flag_attr(e: &BytesStart, key: &[u8]) -> bool {
    matches!(attr_value(e, key).as_deref(), Some("1") | Some("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
