//! Parsing of extinction-map result pages
//!
//! The remote pages are loosely formatted HTML. Everything that depends on their
//! layout lives in this module; the rest of the crate only sees [`StarRecord`]s.
//!
//! # Expected layout
//!
//! The page is parsed into a document and read back as lines: each table row
//! is one line of cells, other text is split at block elements, `<br>` and its
//! own line breaks. A star table is a header line naming at least an RA, a Dec
//! and an Av column, followed by one data row per star:
//!
//! ```text
//! Cool stars
//! RA(h)       Dec(deg)    Teff     Av
//! 5.27012     -69.50211   5900     0.41
//! 05:16:12.4  -69:30:07   6100     0.38
//! ```
//!
//! * RA is in hours and Dec in degrees, decimal or colon-separated sexagesimal.
//! * The temperature class comes from a `Teff`/`Class` column (kelvin or the words
//!   `cool`/`hot`), or from the nearest preceding caption naming cool or hot stars.
//! * A section ends at the first non-blank line whose RA column does not hold a
//!   coordinate. Rows with a readable RA but other unreadable fields are skipped.
//!
//! The page's own summary lines (`<Av> = ...` and
//! `Standard deviation of extinction values = ...`) are captured as a
//! [`ReportedSummary`] when present.

use crate::query::TemperatureClass;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

/// Effective temperature (K) at and above which a star counts as hot
pub const HOT_TEFF_MIN_K: f64 = 12_000.0;

/// Errors that can occur when reading a result page
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("No star table or extinction summary found in response (page format may have changed)")]
    MissingTable,

    #[error("Star table {table} has no temperature column and no cool/hot caption")]
    UnknownTemperatureClass { table: usize },

    #[error("Star {index} has a non-finite extinction value")]
    NonFiniteValue { index: usize },
}

/// One star from an extinction-map table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarRecord {
    /// Right ascension in hours
    pub ra_hours: f64,
    /// Declination in degrees
    pub dec_degrees: f64,
    /// Visual extinction Av in magnitudes
    pub extinction: f64,
    /// Temperature class of the star
    pub temperature_class: TemperatureClass,
}

/// Extinction statistics printed by the remote page itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedSummary {
    pub mean_extinction: f64,
    pub stdev_extinction: f64,
}

/// Everything extracted from one result page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedResponse {
    /// Stars from every table section, in page order
    pub records: Vec<StarRecord>,
    /// Summary lines, when the page printed both of them
    pub reported: Option<ReportedSummary>,
    /// Number of table headers found
    pub table_count: usize,
}

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());

const NUMBER: &str = r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)";
static REPORTED_MEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)<\s*a_?v\s*>\s*=\s*{NUMBER}")).unwrap());
static REPORTED_STDEV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)standard\s+deviation\s+of\s+extinction\s+values\s*=\s*{NUMBER}"
    ))
    .unwrap()
});

/// Elements that start and end a line of text
const BLOCK_ELEMENTS: &[&str] = &[
    "blockquote", "body", "caption", "center", "dd", "div", "dl", "dt", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "hr", "li", "ol", "p", "pre", "table", "title", "ul",
];

/// One line of a flattened page
#[derive(Debug, Clone, PartialEq)]
enum Line {
    /// Free text; cells are its whitespace-separated tokens
    Text(String),
    /// A table row, one entry per `td`/`th` cell
    Row(Vec<String>),
}

impl Line {
    fn cells(&self) -> Vec<&str> {
        match self {
            Line::Text(text) => text.split_whitespace().collect(),
            Line::Row(cells) => cells.iter().map(String::as_str).collect(),
        }
    }

    fn text(&self) -> String {
        match self {
            Line::Text(text) => text.trim().to_string(),
            Line::Row(cells) => cells.join(" "),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Line::Text(text) => text.trim().is_empty(),
            Line::Row(cells) => cells.iter().all(|c| c.is_empty()),
        }
    }
}

#[derive(Default)]
struct LineCollector {
    lines: Vec<Line>,
    current: String,
}

impl LineCollector {
    fn break_line(&mut self) {
        let text = std::mem::take(&mut self.current);
        if !text.trim().is_empty() {
            self.lines.push(Line::Text(text));
        }
    }

    fn push_text(&mut self, text: &str) {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            self.current.push_str(first);
        }
        for part in parts {
            self.break_line();
            self.current.push_str(part);
        }
    }

    fn push_row(&mut self, row: ElementRef) {
        self.break_line();
        let cells = row
            .select(&CELL_SELECTOR)
            .map(|cell| {
                cell.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        self.lines.push(Line::Row(cells));
    }

    fn walk(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    match child.value().name() {
                        "script" | "style" => {}
                        "br" => self.break_line(),
                        "tr" => self.push_row(child),
                        // An unescaped "<Av>" in the page parses as an element
                        "av" | "a_v" => {
                            self.current.push_str("<Av>");
                            self.walk(child);
                        }
                        name if BLOCK_ELEMENTS.contains(&name) => {
                            self.break_line();
                            self.walk(child);
                            self.break_line();
                        }
                        _ => self.walk(child),
                    }
                }
                _ => {}
            }
        }
    }
}

/// Flatten an HTML page into lines in document order
fn page_lines(html: &str) -> Vec<Line> {
    let document = Html::parse_document(html);
    let mut collector = LineCollector::default();
    collector.walk(document.root_element());
    collector.break_line();
    collector.lines
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Ra,
    Dec,
    Extinction,
    Class,
}

fn column_role(cell: &str) -> Option<Column> {
    let name: String = cell
        .split('[')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '_' | '-' | ' ' | '.' | '/'))
        .collect::<String>()
        .to_ascii_lowercase();

    match name.as_str() {
        "ra" | "rah" | "rahr" | "rahours" | "raj2000" | "ra2000" | "alpha" => Some(Column::Ra),
        "dec" | "decl" | "de" | "decdeg" | "decd" | "dej2000" | "decj2000" | "dec2000"
        | "delta" => Some(Column::Dec),
        "av" | "avmag" | "extinction" => Some(Column::Extinction),
        "teff" | "teffk" | "temp" | "tempk" | "class" | "type" => Some(Column::Class),
        _ => None,
    }
}

fn is_header_cell(cell: &str) -> bool {
    cell.chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "_()[]/.-".contains(c))
}

/// Column positions of one star table
#[derive(Debug, Clone, Copy, PartialEq)]
struct TableLayout {
    ra: usize,
    dec: usize,
    extinction: usize,
    class: Option<usize>,
}

impl TableLayout {
    fn from_header(line: &Line) -> Option<Self> {
        let mut cells = line.cells();
        if !cells.iter().all(|c| is_header_cell(c)) {
            return None;
        }

        // Unit annotations such as "(h)" or "[mag]" are their own tokens in
        // text headers and have no data column under them.
        if let Line::Text(_) = line {
            cells.retain(|c| !c.starts_with('(') && !c.starts_with('['));
        }

        let mut ra = None;
        let mut dec = None;
        let mut extinction = None;
        let mut class = None;
        for (index, cell) in cells.iter().enumerate() {
            let slot = match column_role(cell) {
                Some(Column::Ra) => &mut ra,
                Some(Column::Dec) => &mut dec,
                Some(Column::Extinction) => &mut extinction,
                Some(Column::Class) => &mut class,
                None => continue,
            };
            slot.get_or_insert(index);
        }

        Some(Self {
            ra: ra?,
            dec: dec?,
            extinction: extinction?,
            class,
        })
    }
}

/// Parse a decimal or colon-separated sexagesimal value
fn parse_angle(cell: &str) -> Option<f64> {
    if !cell.contains(':') {
        return cell.parse::<f64>().ok().filter(|v| v.is_finite());
    }

    let negative = cell.trim_start().starts_with('-');
    let mut value = 0.0;
    let mut scale = 1.0;
    let mut parts = 0;
    for part in cell.trim_start_matches(['-', '+']).split(':') {
        let component: f64 = part.parse().ok()?;
        if component < 0.0 {
            return None;
        }
        value += component / scale;
        scale *= 60.0;
        parts += 1;
    }
    if parts > 3 {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn parse_class(cell: &str) -> Option<TemperatureClass> {
    match cell.to_ascii_lowercase().as_str() {
        "cool" | "c" => Some(TemperatureClass::Cool),
        "hot" | "h" => Some(TemperatureClass::Hot),
        other => other
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(|teff| {
                if teff >= HOT_TEFF_MIN_K {
                    TemperatureClass::Hot
                } else {
                    TemperatureClass::Cool
                }
            }),
    }
}

enum Row {
    Star(StarRecord),
    /// RA column holds a coordinate but the rest could not be read
    Malformed,
    /// Needs a caption class that the section does not have
    Unclassified,
    /// Not a data row; ends the section
    End,
}

#[derive(Debug, Clone, Copy)]
struct Section {
    layout: TableLayout,
    caption_class: Option<TemperatureClass>,
    table: usize,
}

impl Section {
    fn parse_row(&self, cells: &[&str]) -> Row {
        let cell = |index: usize| cells.get(index).copied();

        let Some(ra_hours) = cell(self.layout.ra).and_then(parse_angle) else {
            return Row::End;
        };
        let dec = cell(self.layout.dec).and_then(parse_angle);
        let extinction = cell(self.layout.extinction)
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        let (Some(dec_degrees), Some(extinction)) = (dec, extinction) else {
            return Row::Malformed;
        };

        let temperature_class = match self.layout.class {
            Some(index) => match cell(index).and_then(parse_class) {
                Some(class) => class,
                None => return Row::Malformed,
            },
            None => match self.caption_class {
                Some(class) => class,
                None => return Row::Unclassified,
            },
        };

        Row::Star(StarRecord {
            ra_hours,
            dec_degrees,
            extinction,
            temperature_class,
        })
    }
}

fn caption_class(text: &str) -> Option<TemperatureClass> {
    let mut found = None;
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let class = if word.eq_ignore_ascii_case("cool") {
            TemperatureClass::Cool
        } else if word.eq_ignore_ascii_case("hot") {
            TemperatureClass::Hot
        } else {
            continue;
        };
        match found {
            None => found = Some(class),
            Some(previous) if previous != class => return None,
            Some(_) => {}
        }
    }
    found
}

fn reported_summary(text: &str) -> Option<ReportedSummary> {
    let capture = |re: &Regex| -> Option<f64> {
        re.captures_iter(text)
            .filter_map(|c| c[1].parse::<f64>().ok())
            .last()
    };
    Some(ReportedSummary {
        mean_extinction: capture(&*REPORTED_MEAN)?,
        stdev_extinction: capture(&*REPORTED_STDEV)?,
    })
}

/// Extract star records and summary lines from a raw result page
///
/// # Returns
///
/// * `Ok(ParsedResponse)` - Records from every star table (possibly none, when
///   the page says no stars were found or only prints a summary)
/// * `Err(ParseError::MissingTable)` - The page has neither a star table, a
///   summary nor a "no stars" notice
/// * `Err(ParseError::UnknownTemperatureClass)` - A table's stars cannot be
///   assigned a temperature class
pub fn parse_response(body: &str) -> Result<ParsedResponse, ParseError> {
    let lines = page_lines(body);
    let text = lines.iter().map(Line::text).collect::<Vec<_>>().join("\n");

    let mut parsed = ParsedResponse {
        reported: reported_summary(&text),
        ..Default::default()
    };
    let mut no_stars_notice = false;
    let mut caption: Option<TemperatureClass> = None;
    let mut section: Option<Section> = None;
    let mut skipped = 0usize;

    for line in lines.iter().filter(|line| !line.is_blank()) {
        if let Some(layout) = TableLayout::from_header(line) {
            parsed.table_count += 1;
            section = Some(Section {
                layout,
                caption_class: caption,
                table: parsed.table_count,
            });
            continue;
        }

        if let Some(current) = section {
            match current.parse_row(&line.cells()) {
                Row::Star(record) => {
                    parsed.records.push(record);
                    continue;
                }
                Row::Malformed => {
                    log::warn!(
                        "Skipping unreadable star row in table {}: {:?}",
                        current.table,
                        line.text()
                    );
                    skipped += 1;
                    continue;
                }
                Row::Unclassified => {
                    return Err(ParseError::UnknownTemperatureClass {
                        table: current.table,
                    });
                }
                Row::End => section = None,
            }
        }

        let text = line.text();
        if text.to_ascii_lowercase().contains("no stars") {
            no_stars_notice = true;
        }
        if let Some(class) = caption_class(&text) {
            caption = Some(class);
        }
    }

    if parsed.table_count == 0 && parsed.reported.is_none() && !no_stars_notice {
        return Err(ParseError::MissingTable);
    }

    log::debug!(
        "Parsed {} star records from {} table(s), {} skipped, summary {}",
        parsed.records.len(),
        parsed.table_count,
        skipped,
        if parsed.reported.is_some() { "present" } else { "absent" }
    );
    Ok(parsed)
}
