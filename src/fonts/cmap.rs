//! ToUnicode CMap generation.
//!
//! Maps the glyph codes of a CID font back to Unicode so readers can extract
//! text. Codes are grouped into `bfrange` blocks of consecutive codes; a block
//! never spans two high bytes.

/// A run of consecutive codes with one Unicode target per code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfRange {
    /// First code
    pub low: u16,
    /// Last code (inclusive)
    pub high: u16,
    /// UTF-16 code units for each code in the range
    pub targets: Vec<Vec<u16>>,
}

impl BfRange {
    /// Number of codes covered.
    pub fn len(&self) -> usize {
        (self.high - self.low) as usize + 1
    }

    /// Always false; a range covers at least one code.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// ToUnicode CMap for a CID font using 2-byte codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToUnicodeCMap {
    ranges: Vec<BfRange>,
}

fn utf16_units(text: &str) -> Vec<u16> {
    if text.is_empty() {
        return vec![0xFFFD];
    }
    text.encode_utf16().collect()
}

impl ToUnicodeCMap {
    /// Build from `(code, source text)` pairs in any order.
    ///
    /// Duplicate codes keep their first mapping.
    pub fn from_mappings<'a, I>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (u16, &'a str)>,
    {
        let mut sorted: Vec<(u16, &str)> = mappings.into_iter().collect();
        sorted.sort_by_key(|&(code, _)| code);
        sorted.dedup_by_key(|&mut (code, _)| code);

        let mut ranges: Vec<BfRange> = Vec::new();
        for (code, text) in sorted {
            match ranges.last_mut() {
                Some(range)
                    if range.high.checked_add(1) == Some(code)
                        && range.low & 0xFF00 == code & 0xFF00 =>
                {
                    range.high = code;
                    range.targets.push(utf16_units(text));
                },
                _ => ranges.push(BfRange {
                    low: code,
                    high: code,
                    targets: vec![utf16_units(text)],
                }),
            }
        }
        Self { ranges }
    }

    /// The `bfrange` blocks in code order.
    pub fn ranges(&self) -> &[BfRange] {
        &self.ranges
    }

    /// Total number of mapped codes.
    pub fn mapping_count(&self) -> usize {
        self.ranges.iter().map(BfRange::len).sum()
    }

    /// Render the CMap program.
    pub fn to_cmap_string(&self) -> String {
        let mut cmap = String::new();

        // CMap header
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo <<\n");
        cmap.push_str("  /Registry (Adobe)\n");
        cmap.push_str("  /Ordering (UCS)\n");
        cmap.push_str("  /Supplement 0\n");
        cmap.push_str(">> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        if !self.ranges.is_empty() {
            cmap.push_str(&format!("{} beginbfrange\n", self.ranges.len()));
            for range in &self.ranges {
                let targets: Vec<String> = range
                    .targets
                    .iter()
                    .map(|units| {
                        let hex: String = units.iter().map(|u| format!("{:04X}", u)).collect();
                        format!("<{}>", hex)
                    })
                    .collect();
                cmap.push_str(&format!(
                    "<{:04X}> <{:04X}> [{}]\n",
                    range.low,
                    range.high,
                    targets.join(" ")
                ));
            }
            cmap.push_str("endbfrange\n");
        }

        // CMap footer
        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}
