//! Disjoint annotated regions.
//!
//! [`merge_regions`] sweeps sorted regions and merges every run of
//! overlapping ones, per sequence, and per strand when stranded.

use log::info;
use std::io::Write;

use crate::error::GeneCovError;
use crate::interval::Position;
use crate::strand::{strand_or_dot, Strand};

/// A BED-style region: 0-based start, exclusive end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub strand: Option<Strand>,
}

impl Region {
    pub fn new(seqname: &str, start: Position, end: Position, strand: Option<Strand>) -> Self {
        Self {
            seqname: seqname.to_string(),
            start,
            end,
            strand,
        }
    }

    /// Write as a BED6 row with name `.` and score 0.
    pub fn write_bed<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GeneCovError> {
        writeln!(
            writer,
            "{}\t{}\t{}\t.\t0\t{}",
            self.seqname,
            self.start,
            self.end,
            strand_or_dot(self.strand)
        )?;
        Ok(())
    }
}

/// Merge regions into disjoint annotated regions, sorted by sequence (and
/// strand, when `stranded`) and start.
///
/// Regions merge when they overlap or are book-ended. In unstranded mode the
/// output strand is `None`.
pub fn merge_regions(mut regions: Vec<Region>, stranded: bool) -> Vec<Region> {
    if stranded {
        regions.sort_by(|a, b| {
            (&a.seqname, a.strand, a.start).cmp(&(&b.seqname, b.strand, b.start))
        });
    } else {
        regions.sort_by(|a, b| (&a.seqname, a.start).cmp(&(&b.seqname, b.start)));
    }

    let mut merged = Vec::new();
    let mut pending: Option<Region> = None;

    for region in regions {
        let strand = if stranded { region.strand } else { None };
        if let Some(current) = pending.as_mut() {
            if current.seqname == region.seqname
                && current.strand == strand
                && region.start <= current.end
            {
                current.end = current.end.max(region.end);
                continue;
            }
        }
        // new sequence, strand, or a gap: flush the pending region
        if let Some(done) = pending.replace(Region { strand, ..region }) {
            merged.push(done);
        }
    }
    if let Some(done) = pending {
        merged.push(done);
    }

    info!("merged into {} annotated regions", merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(seqname: &str, start: Position, end: Position, strand: Strand) -> Region {
        Region::new(seqname, start, end, Some(strand))
    }

    fn spans(regions: &[Region]) -> Vec<(&str, Position, Position, Option<Strand>)> {
        regions
            .iter()
            .map(|r| (r.seqname.as_str(), r.start, r.end, r.strand))
            .collect()
    }

    fn input() -> Vec<Region> {
        vec![
            region("chr2", 0, 10, Strand::Plus),
            region("chr1", 50, 80, Strand::Minus),
            region("chr1", 0, 20, Strand::Plus),
            region("chr1", 10, 30, Strand::Minus),
            region("chr1", 15, 25, Strand::Plus),
            region("chr1", 25, 40, Strand::Plus),
            region("chr1", 60, 70, Strand::Minus),
        ]
    }

    #[test]
    fn test_merge_stranded() {
        let merged = merge_regions(input(), true);
        assert_eq!(
            spans(&merged),
            vec![
                ("chr1", 0, 40, Some(Strand::Plus)),
                ("chr1", 10, 30, Some(Strand::Minus)),
                ("chr1", 50, 80, Some(Strand::Minus)),
                ("chr2", 0, 10, Some(Strand::Plus)),
            ]
        );
    }

    #[test]
    fn test_merge_unstranded() {
        let merged = merge_regions(input(), false);
        assert_eq!(
            spans(&merged),
            vec![
                ("chr1", 0, 40, None),
                ("chr1", 50, 80, None),
                ("chr2", 0, 10, None),
            ]
        );
        // disjoint and sorted per sequence
        for pair in merged.windows(2) {
            if pair[0].seqname == pair[1].seqname {
                assert!(pair[0].end < pair[1].start);
            }
        }
    }

    #[test]
    fn test_region_at_origin_is_kept() {
        let merged = merge_regions(vec![region("chr1", 0, 1, Strand::Plus)], true);
        assert_eq!(spans(&merged), vec![("chr1", 0, 1, Some(Strand::Plus))]);
        assert!(merge_regions(Vec::new(), true).is_empty());
    }

    #[test]
    fn test_write_bed() {
        let mut out = Vec::new();
        Region::new("chr1", 0, 40, None).write_bed(&mut out).unwrap();
        region("chr1", 5, 9, Strand::Minus).write_bed(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\t0\t40\t.\t0\t.\nchr1\t5\t9\t.\t0\t-\n"
        );
    }
}
