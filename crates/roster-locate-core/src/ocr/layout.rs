//! Tesseract TSV layout parsing
//!
//! The TSV output has one header line followed by one row per layout
//! element:
//!
//! ```text
//! level page_num block_num par_num line_num word_num left top width height conf text
//! ```
//!
//! Only the grouping numbers, geometry, confidence and text are kept. The
//! text column is everything after the eleventh tab and may be empty (page,
//! block and line rows carry no text). Unparsable numbers become zero rather
//! than rejecting the row.

use std::path::Path;

use crate::{
    error::{DetectError, DetectResult},
    model::{LineKey, TextFragment},
};

const COL_BLOCK: usize = 2;
const COL_PARAGRAPH: usize = 3;
const COL_LINE: usize = 4;
const COL_LEFT: usize = 6;
const COL_TOP: usize = 7;
const COL_WIDTH: usize = 8;
const COL_HEIGHT: usize = 9;
const COL_CONF: usize = 10;
const COLUMN_COUNT: usize = 12;

fn int_field(fields: &[&str], index: usize) -> i32 {
    fields
        .get(index)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn parse_row(row: &str) -> TextFragment {
    let fields: Vec<&str> = row.splitn(COLUMN_COUNT, '\t').collect();

    TextFragment {
        line: LineKey {
            block: int_field(&fields, COL_BLOCK),
            paragraph: int_field(&fields, COL_PARAGRAPH),
            line: int_field(&fields, COL_LINE),
        },
        left: int_field(&fields, COL_LEFT),
        top: int_field(&fields, COL_TOP),
        width: int_field(&fields, COL_WIDTH),
        height: int_field(&fields, COL_HEIGHT),
        confidence: fields
            .get(COL_CONF)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0.0),
        text: fields.get(COLUMN_COUNT - 1).copied().unwrap_or("").to_string(),
    }
}

/// Parses TSV text into fragments in document order
///
/// The first line is always treated as the header, whatever it contains.
/// Empty lines are skipped.
///
/// # Examples
///
/// ```
/// use roster_locate_core::ocr::layout::parse_tsv;
///
/// let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
///            5\t1\t1\t1\t1\t1\t10\t20\t30\t15\t96.5\tRank\n";
/// let fragments = parse_tsv(tsv);
/// assert_eq!(fragments.len(), 1);
/// assert_eq!(fragments[0].text, "Rank");
/// assert_eq!((fragments[0].left, fragments[0].top), (10, 20));
/// ```
pub fn parse_tsv(content: &str) -> Vec<TextFragment> {
    content
        .lines()
        .skip(1)
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(parse_row)
        .collect()
}

/// Reads and parses the layout file written by the OCR engine
///
/// Invalid UTF-8 is replaced rather than rejected; only an unreadable file
/// fails.
pub async fn read_layout(path: &Path) -> DetectResult<Vec<TextFragment>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DetectError::LayoutParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let fragments = parse_tsv(&String::from_utf8_lossy(&bytes));
    tracing::debug!("Parsed {} fragments from {:?}", fragments.len(), path);
    Ok(fragments)
}
