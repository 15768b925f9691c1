//! Builder for Tesseract TSV layouts
//!
//! Produces the twelve-column format written by `tesseract <img> <base> tsv`:
//! one header row, then one row per recognized element. Only word rows
//! (level 5) carry text.

/// Header row written by Tesseract 4 and 5
pub const TSV_HEADER: &str =
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

/// Incremental TSV layout builder
///
/// Words are appended to the current line; [`TsvBuilder::next_line`] and
/// [`TsvBuilder::next_block`] advance the layout keys.
///
/// ```
/// use roster_locate_test_utils::tsv::TsvBuilder;
///
/// let tsv = TsvBuilder::new()
///     .word(10, 20, 40, 12, "Rank")
///     .next_line()
///     .word(10, 40, 30, 12, "42分")
///     .build();
/// assert_eq!(tsv.lines().count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TsvBuilder {
    rows: Vec<String>,
    block: u32,
    paragraph: u32,
    line: u32,
    word: u32,
    crlf: bool,
}

impl Default for TsvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TsvBuilder {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            block: 1,
            paragraph: 1,
            line: 1,
            word: 0,
            crlf: false,
        }
    }

    /// Adds the level-1 page row Tesseract emits first
    pub fn page(mut self, width: i32, height: i32) -> Self {
        self.rows
            .push(format!("1\t1\t0\t0\t0\t0\t0\t0\t{width}\t{height}\t-1\t"));
        self
    }

    /// Adds a word with confidence 95 to the current line
    pub fn word(self, left: i32, top: i32, width: i32, height: i32, text: &str) -> Self {
        self.word_with_conf(left, top, width, height, 95.0, text)
    }

    pub fn word_with_conf(
        mut self,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        conf: f32,
        text: &str,
    ) -> Self {
        self.word += 1;
        self.rows.push(format!(
            "5\t1\t{}\t{}\t{}\t{}\t{left}\t{top}\t{width}\t{height}\t{conf}\t{text}",
            self.block, self.paragraph, self.line, self.word
        ));
        self
    }

    pub fn next_line(mut self) -> Self {
        self.line += 1;
        self.word = 0;
        self
    }

    pub fn next_block(mut self) -> Self {
        self.block += 1;
        self.paragraph = 1;
        self.line = 1;
        self.word = 0;
        self
    }

    /// Appends a row verbatim, for malformed-input tests
    pub fn raw(mut self, row: &str) -> Self {
        self.rows.push(row.to_string());
        self
    }

    /// Terminates rows with `\r\n` instead of `\n`
    pub fn crlf(mut self) -> Self {
        self.crlf = true;
        self
    }

    pub fn build(&self) -> String {
        let newline = if self.crlf { "\r\n" } else { "\n" };
        let mut out = String::from(TSV_HEADER);
        out.push_str(newline);
        for row in &self.rows {
            out.push_str(row);
            out.push_str(newline);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only() {
        assert_eq!(TsvBuilder::new().build(), format!("{TSV_HEADER}\n"));
    }

    #[test]
    fn test_word_keys_advance() {
        let tsv = TsvBuilder::new()
            .word(1, 2, 3, 4, "a")
            .word(5, 6, 7, 8, "b")
            .next_line()
            .word(9, 10, 11, 12, "c")
            .next_block()
            .word(0, 0, 1, 1, "d")
            .build();

        let rows: Vec<Vec<&str>> = tsv.lines().skip(1).map(|l| l.split('\t').collect()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[1][2..6], &["1", "1", "1", "2"]);
        assert_eq!(&rows[2][2..6], &["1", "1", "2", "1"]);
        assert_eq!(&rows[3][2..6], &["2", "1", "1", "1"]);
        assert!(rows.iter().all(|r| r.len() == 12));
    }

    #[test]
    fn test_crlf_rows() {
        let tsv = TsvBuilder::new().page(100, 50).crlf().build();
        assert!(tsv.ends_with("-1\t\r\n"));
        assert_eq!(tsv.matches("\r\n").count(), 2);
    }
}
