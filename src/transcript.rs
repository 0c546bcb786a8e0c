//! Transcript spans, introns and pre-mRNAs from exon records.
//!
//! Exon records are grouped by `transcript_id`. Every exon of a transcript
//! should share a sequence and strand; when they don't, a warning is logged and
//! the first exon's values are used. Coordinates stay 1-based and inclusive.

use indexmap::map::IndexMap;
use log::{debug, info, warn};
use std::io::Write;

use crate::error::GeneCovError;
use crate::gtf::{AnnotationRecord, Attributes, GENE_ID, TRANSCRIPT_ID};
use crate::interval::{Interval, Position};
use crate::region::Region;
use crate::strand::Strand;

/// A transcript assembled from its exon records.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub id: String,
    pub gene_id: Option<String>,
    pub seqname: String,
    pub strand: Strand,
    /// Minimum exon start (1-based).
    pub start: Position,
    /// Maximum exon end (1-based, inclusive).
    pub end: Position,
    /// Exons sorted by start.
    pub exons: Vec<Interval>,
    /// The source column and attributes of the first exon.
    pub source: String,
    pub attributes: Attributes,
}

impl Transcript {
    /// Assemble a transcript from its (non-empty) exon records.
    pub fn from_exons(id: &str, rows: &[AnnotationRecord]) -> Result<Self, GeneCovError> {
        let first = rows.first().ok_or(GeneCovError::EmptyIntervalSet)?;

        if rows
            .iter()
            .any(|r| r.seqname != first.seqname || r.strand != first.strand)
        {
            warn!(
                "{}. Using {}{}.",
                GeneCovError::InconsistentTranscript(id.to_string()),
                first.seqname,
                first.strand
            );
        }

        let mut exons = rows
            .iter()
            .map(|r| Interval::new(r.start, r.end))
            .collect::<Result<Vec<_>, _>>()?;
        exons.sort_unstable();

        let start = exons.iter().map(|e| e.start).min().unwrap_or(first.start);
        let end = exons.iter().map(|e| e.end).max().unwrap_or(first.end);

        Ok(Self {
            id: id.to_string(),
            gene_id: first.attribute(GENE_ID).map(|s| s.to_string()),
            seqname: first.seqname.clone(),
            strand: first.strand,
            start,
            end,
            exons,
            source: first.source.clone(),
            attributes: first.attributes.clone(),
        })
    }

    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    /// The gaps between consecutive exons, as 1-based closed intervals.
    ///
    /// Abutting exons produce no intron. Overlapping exons are an error.
    pub fn introns(&self) -> Result<Vec<Interval>, GeneCovError> {
        let mut introns = Vec::new();
        for pair in self.exons.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if left.end >= right.start {
                return Err(GeneCovError::OverlappingExons {
                    transcript: self.id.clone(),
                    end: left.end,
                    start: right.start,
                });
            }
            if left.end + 1 < right.start {
                introns.push(Interval::new(left.end + 1, right.start - 1)?);
            }
        }
        Ok(introns)
    }

    /// The transcript's intron records, copying source and attributes
    /// from its first exon.
    pub fn intron_records(&self) -> Result<Vec<AnnotationRecord>, GeneCovError> {
        Ok(self
            .introns()?
            .into_iter()
            .map(|intron| AnnotationRecord {
                seqname: self.seqname.clone(),
                source: self.source.clone(),
                feature: "intron".to_string(),
                start: intron.start,
                end: intron.end,
                score: ".".to_string(),
                strand: self.strand,
                frame: ".".to_string(),
                attributes: self.attributes.clone(),
            })
            .collect())
    }

    /// The transcript's span as a BED region (0-based, half-open).
    pub fn span(&self) -> Region {
        Region::new(&self.seqname, self.start - 1, self.end, Some(self.strand))
    }

    /// Write the span as a BED6 row named by the transcript.
    pub fn write_bed<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GeneCovError> {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t0\t{}",
            self.seqname,
            self.start - 1,
            self.end,
            self.id,
            self.strand
        )?;
        Ok(())
    }
}

/// Groups exon records by `transcript_id`, in order of first appearance.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    groups: IndexMap<String, Vec<AnnotationRecord>>,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exon record. Non-exon records are ignored; exons without a
    /// `transcript_id` are reported as [`GeneCovError::MissingAttribute`].
    pub fn add_record(&mut self, record: &AnnotationRecord) -> Result<(), GeneCovError> {
        if !record.is_exon() {
            return Ok(());
        }
        let id = record.require(TRANSCRIPT_ID)?;
        self.groups
            .entry(id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        let mut assembler = Self::new();
        let mut missing = 0;
        for record in records {
            match assembler.add_record(record) {
                Ok(()) => {}
                Err(GeneCovError::MissingAttribute(_)) => missing += 1,
                Err(e) => warn!("{}. Skipping exon.", e),
            }
        }
        if missing > 0 {
            debug!("{} exons without a transcript_id were skipped", missing);
        }
        assembler
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Assemble all transcripts.
    pub fn finalize(self) -> Result<Vec<Transcript>, GeneCovError> {
        let transcripts = self
            .groups
            .iter()
            .map(|(id, rows)| Transcript::from_exons(id, rows))
            .collect::<Result<Vec<_>, _>>()?;
        info!("assembled {} transcripts", transcripts.len());
        Ok(transcripts)
    }
}

/// Derive the intron records of all transcripts. Transcripts with
/// overlapping exons are logged and contribute no introns.
pub fn intron_records(transcripts: &[Transcript]) -> Vec<AnnotationRecord> {
    let mut introns = Vec::new();
    for transcript in transcripts {
        match transcript.intron_records() {
            Ok(mut records) => introns.append(&mut records),
            Err(e) => warn!("{}. Skipping transcript.", e),
        }
    }
    info!("derived {} introns", introns.len());
    introns
}

/// Exons and their derived introns, sorted by sequence and then start.
pub fn exons_with_introns(
    exons: &[AnnotationRecord],
    transcripts: &[Transcript],
) -> Vec<AnnotationRecord> {
    let mut rows = exons.to_vec();
    rows.extend(intron_records(transcripts));
    rows.sort_by(|a, b| (&a.seqname, a.start).cmp(&(&b.seqname, b.start)));
    rows
}

/// Key identifying a distinct unspliced form of a gene.
type PreMrnaKey = (String, String, Strand, Position, Position);

/// Builds one unspliced (pre-mRNA) exon record per distinct spliced span.
///
/// Names are `<gene_id>.pre-mrna.<k>`, where `k` counts from 1 within each gene.
#[derive(Debug, Default)]
pub struct PreMrnaBuilder {
    spans: IndexMap<PreMrnaKey, Vec<String>>,
    gene_counts: IndexMap<String, usize>,
}

impl PreMrnaBuilder {
    pub const SOURCE: &'static str = "genecov";

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transcript. Unspliced transcripts and those without a gene are ignored.
    pub fn add(&mut self, transcript: &Transcript) {
        if transcript.exon_count() <= 1 {
            return;
        }
        let Some(gene_id) = &transcript.gene_id else {
            return;
        };
        let key = (
            gene_id.clone(),
            transcript.seqname.clone(),
            transcript.strand,
            transcript.start,
            transcript.end,
        );
        let ids = self.spans.entry(key).or_default();
        if !ids.contains(&transcript.id) {
            ids.push(transcript.id.clone());
        }
    }

    fn next_name(&mut self, gene_id: &str) -> String {
        let k = self.gene_counts.entry(gene_id.to_string()).or_insert(0);
        *k += 1;
        format!("{}.pre-mrna.{:03}", gene_id, k)
    }

    /// Produce the pre-mRNA exon records.
    pub fn build(mut self) -> Vec<AnnotationRecord> {
        let spans = std::mem::take(&mut self.spans);
        let mut records = Vec::with_capacity(spans.len());
        for ((gene_id, seqname, strand, start, end), ids) in spans {
            let mut attributes = Attributes::new();
            attributes.insert(GENE_ID.to_string(), gene_id.clone());
            attributes.insert(TRANSCRIPT_ID.to_string(), self.next_name(&gene_id));
            attributes.insert("spliced_transcript_ids".to_string(), ids.join(","));
            records.push(AnnotationRecord {
                seqname,
                source: Self::SOURCE.to_string(),
                feature: "exon".to_string(),
                start,
                end,
                score: ".".to_string(),
                strand,
                frame: ".".to_string(),
                attributes,
            });
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtf::tests::records;

    fn transcripts(gtf: &str) -> Vec<Transcript> {
        TranscriptAssembler::from_records(&records(gtf))
            .finalize()
            .unwrap()
    }

    #[test]
    fn test_intron_between_exons() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t31\t40\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
",
        );
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].introns().unwrap(), vec![Interval::new(21, 30).unwrap()]);
        assert_eq!((txs[0].start, txs[0].end), (10, 40));
        assert_eq!(txs[0].exon_count(), 2);
    }

    #[test]
    fn test_abutting_exons_have_no_intron() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t21\t30\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
",
        );
        assert!(txs[0].introns().unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_exons_are_skipped() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t20\t30\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t100\t120\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\";
chr1\tsrc\texon\t140\t150\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T2\";
",
        );
        assert!(matches!(
            txs[0].introns(),
            Err(GeneCovError::OverlappingExons { end: 20, start: 20, .. })
        ));
        let introns = intron_records(&txs);
        assert_eq!(introns.len(), 1);
        assert_eq!(introns[0].feature, "intron");
        assert_eq!((introns[0].start, introns[0].end), (121, 139));
        assert_eq!(introns[0].strand, Strand::Minus);
        assert_eq!(introns[0].attribute(TRANSCRIPT_ID), Some("T2"));
    }

    #[test]
    fn test_exons_without_transcript_id_are_ignored() {
        let recs = records(
            "\
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t31\t40\t.\t+\t.\tgene_id \"G1\";
chr1\tsrc\tgene\t10\t40\t.\t+\t.\tgene_id \"G1\";
",
        );
        let assembler = TranscriptAssembler::from_records(&recs);
        assert_eq!(assembler.len(), 1);
        let txs = assembler.finalize().unwrap();
        assert_eq!(txs[0].exon_count(), 1);
        assert_eq!((txs[0].start, txs[0].end), (10, 20));
    }

    #[test]
    fn test_inconsistent_transcript_uses_first_exon() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr2\tsrc\texon\t40\t50\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T1\";
",
        );
        assert_eq!(txs[0].seqname, "chr1");
        assert_eq!(txs[0].strand, Strand::Plus);
        assert_eq!((txs[0].start, txs[0].end), (10, 50));
    }

    #[test]
    fn test_transcript_bed() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t10\t20\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t31\t40\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t5\t8\t.\t-\t.\tgene_id \"G1\";
",
        );
        let mut out = Vec::new();
        txs[0].write_bed(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\t9\t40\tT1\t0\t-\n");
        assert_eq!(txs[0].span(), Region::new("chr1", 9, 40, Some(Strand::Minus)));
    }

    #[test]
    fn test_exons_with_introns_sorted() {
        let recs = records(
            "\
chr2\tsrc\texon\t1\t5\t.\t+\t.\tgene_id \"G2\"; transcript_id \"T2\";
chr1\tsrc\texon\t50\t60\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
",
        );
        let txs = TranscriptAssembler::from_records(&recs).finalize().unwrap();
        let rows = exons_with_introns(&recs, &txs);
        let summary: Vec<_> = rows
            .iter()
            .map(|r| (r.seqname.as_str(), r.feature.as_str(), r.start, r.end))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("chr1", "exon", 10, 20),
                ("chr1", "intron", 21, 49),
                ("chr1", "exon", 50, 60),
                ("chr2", "exon", 1, 5),
            ]
        );
    }

    #[test]
    fn test_pre_mrna() {
        let txs = transcripts(
            "\
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t31\t40\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t10\t15\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";
chr1\tsrc\texon\t35\t40\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";
chr1\tsrc\texon\t10\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T3\";
chr1\tsrc\texon\t31\t60\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T3\";
chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T4\";
",
        );
        let mut builder = PreMrnaBuilder::new();
        for tx in &txs {
            builder.add(tx);
        }
        let pre = builder.build();
        assert_eq!(pre.len(), 2);

        assert_eq!((pre[0].start, pre[0].end), (10, 40));
        assert_eq!(pre[0].attribute(TRANSCRIPT_ID), Some("G1.pre-mrna.001"));
        assert_eq!(pre[0].attribute("spliced_transcript_ids"), Some("T1,T2"));

        assert_eq!((pre[1].start, pre[1].end), (10, 60));
        assert_eq!(pre[1].attribute(TRANSCRIPT_ID), Some("G1.pre-mrna.002"));

        let mut out = Vec::new();
        pre[1].write_gtf(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\tgenecov\texon\t10\t60\t.\t+\t.\tgene_id \"G1\"; \
             transcript_id \"G1.pre-mrna.002\"; spliced_transcript_ids \"T3\";\n"
        );
    }
}
