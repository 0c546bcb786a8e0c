//! Per-gene exon models.
//!
//! Exon records are accumulated per `gene_id` into a [`GeneBuilder`], then
//! finalized once into a read-only [`Gene`] whose exons are flattened into a
//! sorted, disjoint set of 0-based closed intervals.

use indexmap::map::IndexMap;
use log::{debug, info, warn};
use std::io::Write;

use crate::error::GeneCovError;
use crate::gtf::{AnnotationRecord, EXON, GENE_ID};
use crate::interval::{flatten, total_length, Interval, Position};
use crate::strand::Strand;

/// Exons of a gene that is still being built.
#[derive(Debug, Clone)]
pub struct GeneBuilder {
    id: String,
    seqname: String,
    strand: Strand,
    exons: Vec<Interval>,
}

impl GeneBuilder {
    /// Start a gene from its first exon record.
    pub fn new(id: &str, first: &AnnotationRecord) -> Self {
        Self {
            id: id.to_string(),
            seqname: first.seqname.clone(),
            strand: first.strand,
            exons: Vec::new(),
        }
    }

    /// Add an exon, converting it to 0-based closed coordinates.
    ///
    /// The gene keeps the sequence and strand of its first exon.
    pub fn add_exon(&mut self, record: &AnnotationRecord) -> Result<(), GeneCovError> {
        if record.seqname != self.seqname || record.strand != self.strand {
            warn!(
                "gene '{}' has an exon on {}{} but was started on {}{}",
                self.id, record.seqname, record.strand, self.seqname, self.strand
            );
        }
        self.exons.push(Interval::new(record.start - 1, record.end - 1)?);
        Ok(())
    }

    /// Flatten the exons, consuming the builder.
    pub fn finalize(self) -> Result<Gene, GeneCovError> {
        let exons = match flatten(self.exons) {
            Ok(exons) => exons,
            Err(GeneCovError::EmptyIntervalSet) => return Err(GeneCovError::EmptyGene(self.id)),
            Err(e) => return Err(e),
        };
        let length = total_length(&exons);
        Ok(Gene {
            id: self.id,
            seqname: self.seqname,
            strand: self.strand,
            exons,
            length,
        })
    }
}

/// A finalized gene: its exons are sorted, disjoint, 0-based closed intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    id: String,
    seqname: String,
    strand: Strand,
    exons: Vec<Interval>,
    length: Position,
}

impl Gene {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seqname(&self) -> &str {
        &self.seqname
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn exons(&self) -> &[Interval] {
        &self.exons
    }

    /// Total exonic length, i.e. the number of bases covered by the union of exons.
    pub fn length(&self) -> Position {
        self.length
    }
}

/// Genes keyed by `gene_id`, in order of first appearance.
#[derive(Debug, Default)]
pub struct GeneModels {
    builders: IndexMap<String, GeneBuilder>,
}

impl GeneModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exon record to its gene. Records without a `gene_id` are
    /// reported as [`GeneCovError::MissingAttribute`].
    pub fn add_record(&mut self, record: &AnnotationRecord) -> Result<(), GeneCovError> {
        let id = record.require(GENE_ID)?;
        if let Some(builder) = self.builders.get_mut(id) {
            return builder.add_exon(record);
        }
        let mut builder = GeneBuilder::new(id, record);
        builder.add_exon(record)?;
        self.builders.insert(id.to_string(), builder);
        Ok(())
    }

    /// Build models from exon records; non-exon records and exons without a
    /// `gene_id` are skipped.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        Self::from_features(records, EXON)
    }

    /// Build models from the records of one feature type, e.g. `CDS`, treating
    /// each record as an exon of its gene.
    pub fn from_features<'a, I>(records: I, feature: &str) -> Self
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        let mut models = Self::new();
        let mut missing = 0;
        for record in records.into_iter().filter(|r| r.feature == feature) {
            match models.add_record(record) {
                Ok(()) => {}
                Err(GeneCovError::MissingAttribute(_)) => missing += 1,
                Err(e) => warn!("{}. Skipping {}.", e, feature),
            }
        }
        if missing > 0 {
            debug!("{} {} records without a gene_id were skipped", missing, feature);
        }
        models
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Flatten every gene. A gene that fails to finalize is logged and dropped.
    pub fn finalize(self) -> Vec<Gene> {
        let mut genes = Vec::with_capacity(self.builders.len());
        for (_, builder) in self.builders {
            match builder.finalize() {
                Ok(gene) => genes.push(gene),
                Err(e) => warn!("{}. Skipping gene.", e),
            }
        }
        info!("built {} gene models", genes.len());
        genes
    }
}

/// Write `gene_id<TAB>length` for each gene.
pub fn write_gene_lengths<W: Write + ?Sized>(
    writer: &mut W,
    genes: &[Gene],
) -> Result<(), GeneCovError> {
    for gene in genes {
        writeln!(writer, "{}\t{}", gene.id(), gene.length())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtf::tests::records;

    #[test]
    fn test_gene_models_flatten_per_gene() {
        let recs = records(
            "\
chr1\tsrc\texon\t101\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t301\t400\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t151\t250\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";
chr2\tsrc\texon\t11\t20\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T3\";
chr2\tsrc\tCDS\t11\t20\t.\t-\t0\tgene_id \"G2\"; transcript_id \"T3\";
chr2\tsrc\texon\t11\t20\t.\t-\t.\ttranscript_id \"T4\";
",
        );
        let models = GeneModels::from_records(&recs);
        assert_eq!(models.len(), 2);

        let genes = models.finalize();
        assert_eq!(genes[0].id(), "G1");
        assert_eq!(
            genes[0].exons(),
            &[Interval::new(100, 249).unwrap(), Interval::new(300, 399).unwrap()]
        );
        assert_eq!(genes[0].length(), 250);
        assert_eq!(genes[0].strand(), Strand::Plus);

        assert_eq!(genes[1].id(), "G2");
        assert_eq!(genes[1].seqname(), "chr2");
        assert_eq!(genes[1].exons(), &[Interval::new(10, 19).unwrap()]);
        assert_eq!(genes[1].strand(), Strand::Minus);
    }

    #[test]
    fn test_gene_models_from_cds() {
        let recs = records(
            "\
chr1\tsrc\texon\t1\t100\t.\t+\t.\tgene_id \"G1\";
chr1\tsrc\tCDS\t11\t40\t.\t+\t0\tgene_id \"G1\";
chr1\tsrc\tCDS\t61\t70\t.\t+\t0\tgene_id \"G1\";
",
        );
        let genes = GeneModels::from_features(&recs, "CDS").finalize();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].length(), 40);
        let genes = GeneModels::from_records(&recs).finalize();
        assert_eq!(genes[0].length(), 100);
    }

    #[test]
    fn test_gene_keeps_first_exon_strand() {
        let recs = records(
            "\
chr1\tsrc\texon\t1\t10\t.\t-\t.\tgene_id \"G1\";
chr2\tsrc\texon\t21\t30\t.\t+\t.\tgene_id \"G1\";
",
        );
        let genes = GeneModels::from_records(&recs).finalize();
        assert_eq!(genes[0].seqname(), "chr1");
        assert_eq!(genes[0].strand(), Strand::Minus);
        assert_eq!(genes[0].length(), 20);
    }

    #[test]
    fn test_empty_gene() {
        let recs = records("chr1\tsrc\texon\t1\t10\t.\t+\t.\tgene_id \"G1\";\n");
        let builder = GeneBuilder::new("G0", &recs[0]);
        assert!(matches!(
            builder.finalize(),
            Err(GeneCovError::EmptyGene(id)) if id == "G0"
        ));
    }

    #[test]
    fn test_missing_gene_id() {
        let recs = records("chr1\tsrc\texon\t1\t10\t.\t+\t.\ttranscript_id \"T1\";\n");
        let mut models = GeneModels::new();
        assert!(models.add_record(&recs[0]).is_err());
        assert!(models.is_empty());
    }

    #[test]
    fn test_write_gene_lengths() {
        let recs = records(
            "\
chr1\tsrc\texon\t1\t10\t.\t+\t.\tgene_id \"G1\";
chr1\tsrc\texon\t5\t20\t.\t+\t.\tgene_id \"G1\";
chr1\tsrc\texon\t31\t40\t.\t+\t.\tgene_id \"G1\";
",
        );
        let genes = GeneModels::from_records(&recs).finalize();
        let mut out = Vec::new();
        write_gene_lengths(&mut out, &genes).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "G1\t30\n");
    }
}
