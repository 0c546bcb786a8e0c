//! Aggregate coverage profiles along transcripts.
//!
//! Each gene's flattened exons are laid end to end, 5' to 3' on the gene's
//! strand, and every base is assigned to one of `bins` equal slices of the
//! 0-100% transcript axis. A gene's read counts are binned, normalized to sum
//! to one, and added to a running total, which is normalized again once all
//! genes are in. Genes shorter than `min_length` bases, or with fewer than
//! `min_count` total counts, are left out.

use log::{debug, info, warn};
use ndarray::Array1;
use std::io::Write;

use crate::coverage::CountProvider;
use crate::error::GeneCovError;
use crate::gene::Gene;
use crate::interval::Position;
use crate::numeric::{bin_index, format_sci, normalize};

/// Settings for a coverage profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    /// Number of bins along the transcript.
    pub bins: usize,
    /// Only count reads on the gene's own strand.
    pub stranded: bool,
    /// Minimum exonic length of a gene, in bases.
    pub min_length: Position,
    /// Minimum total read count of a gene.
    pub min_count: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bins: 100,
            stranded: false,
            min_length: 1000,
            min_count: 25.0,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), GeneCovError> {
        if self.bins == 0 {
            return Err(GeneCovError::InvalidBins);
        }
        Ok(())
    }
}

/// Why a gene was left out of the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneSkip {
    TooShort(Position),
    TooFewCounts(f64),
}

/// Accumulates per-gene histograms into a running total.
///
/// Owns one scratch histogram, reset for every gene, and the total.
#[derive(Debug, Clone)]
pub struct CoverageAggregator {
    config: ProfileConfig,
    gene_bins: Array1<f64>,
    totals: Array1<f64>,
    genes_used: Vec<String>,
    genes_seen: usize,
}

impl CoverageAggregator {
    pub fn new(config: ProfileConfig) -> Result<Self, GeneCovError> {
        config.validate()?;
        Ok(Self {
            gene_bins: Array1::zeros(config.bins),
            totals: Array1::zeros(config.bins),
            genes_used: Vec::new(),
            genes_seen: 0,
            config,
        })
    }

    /// Bin one gene's raw counts into the scratch histogram.
    ///
    /// Exons with no coverage data add nothing, but still advance the
    /// position along the transcript.
    fn bin_gene<P>(&mut self, gene: &Gene, provider: &P) -> Result<(), GeneCovError>
    where
        P: CountProvider + ?Sized,
    {
        let length = gene.length();
        let strand_filter = self.config.stranded.then_some(gene.strand());

        self.gene_bins.fill(0.0);
        let mut offset: Position = 0;
        for exon in gene.exons() {
            let counts =
                provider.counts(gene.seqname(), exon.start, exon.end, strand_filter)?;
            if let Some(counts) = counts {
                for (v, &count) in counts.iter().enumerate() {
                    let idx = bin_index(
                        self.config.bins,
                        offset + v as Position,
                        length,
                        gene.strand(),
                    );
                    self.gene_bins[idx] += count as f64;
                }
            }
            offset += exon.len();
        }
        Ok(())
    }

    /// Add one gene to the profile, returning why it was skipped if it was.
    pub fn add_gene<P>(&mut self, gene: &Gene, provider: &P) -> Result<Option<GeneSkip>, GeneCovError>
    where
        P: CountProvider + ?Sized,
    {
        self.genes_seen += 1;
        if gene.length() < self.config.min_length {
            debug!("{}: too short ({} bases)", gene.id(), gene.length());
            return Ok(Some(GeneSkip::TooShort(gene.length())));
        }

        self.bin_gene(gene, provider)?;

        let total = self.gene_bins.sum();
        if total < self.config.min_count || normalize(&mut self.gene_bins).is_none() {
            debug!("{}: too few reads ({})", gene.id(), total);
            return Ok(Some(GeneSkip::TooFewCounts(total)));
        }
        self.totals += &self.gene_bins;
        self.genes_used.push(gene.id().to_string());
        debug!("{}: used ({} reads)", gene.id(), total);
        Ok(None)
    }

    /// Combine two partial profiles; `other`'s genes come after this one's.
    pub fn merge(mut self, other: Self) -> Self {
        self.totals += &other.totals;
        self.genes_used.extend(other.genes_used);
        self.genes_seen += other.genes_seen;
        self
    }

    /// Normalize the total into the final profile.
    pub fn finish(self) -> CoverageProfile {
        let mut density = self.totals;
        if normalize(&mut density).is_none() {
            warn!("no genes passed the length and count filters; the profile is empty");
        }
        info!("{}/{} genes used", self.genes_used.len(), self.genes_seen);
        CoverageProfile {
            density,
            genes_used: self.genes_used,
        }
    }
}

/// A normalized coverage profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageProfile {
    /// Fraction of coverage in each bin; sums to one unless no gene was used.
    pub density: Array1<f64>,
    /// Genes that contributed, in the order they were processed.
    pub genes_used: Vec<String>,
}

impl CoverageProfile {
    pub fn bins(&self) -> usize {
        self.density.len()
    }

    /// Position of bin `i` along the transcript, in percent.
    pub fn bin_percent(&self, i: usize) -> f64 {
        100.0 * i as f64 / self.bins() as f64
    }

    /// Write `<percent>\t<density>` rows, one per bin.
    pub fn write_tsv<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GeneCovError> {
        for (i, x) in self.density.iter().enumerate() {
            writeln!(writer, "{:.2}\t{}", self.bin_percent(i), format_sci(*x, 6))?;
        }
        Ok(())
    }

    /// Write the ids of the genes used, one per line.
    pub fn write_gene_list<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GeneCovError> {
        for id in &self.genes_used {
            writeln!(writer, "{}", id)?;
        }
        Ok(())
    }
}

/// Build a coverage profile over `genes`, one gene at a time.
pub fn aggregate<P>(
    genes: &[Gene],
    provider: &P,
    config: &ProfileConfig,
) -> Result<CoverageProfile, GeneCovError>
where
    P: CountProvider + ?Sized,
{
    let mut aggregator = CoverageAggregator::new(config.clone())?;
    for (i, gene) in genes.iter().enumerate() {
        debug!("({}/{}) {}", i, genes.len(), gene.id());
        aggregator.add_gene(gene, provider)?;
    }
    Ok(aggregator.finish())
}

/// Build a coverage profile over `genes` on the rayon thread pool.
///
/// Each worker folds its genes into a private aggregator; the partial
/// totals are then summed. Genes are listed in the same order as with
/// [`aggregate`].
#[cfg(feature = "parallel")]
pub fn aggregate_parallel<P>(
    genes: &[Gene],
    provider: &P,
    config: &ProfileConfig,
) -> Result<CoverageProfile, GeneCovError>
where
    P: CountProvider + Sync + ?Sized,
{
    use rayon::prelude::*;

    let empty = CoverageAggregator::new(config.clone())?;
    let aggregator = genes
        .par_iter()
        .try_fold(
            || empty.clone(),
            |mut acc, gene| {
                acc.add_gene(gene, provider)?;
                Ok::<_, GeneCovError>(acc)
            },
        )
        .try_reduce(|| empty.clone(), |a, b| Ok(a.merge(b)))?;
    Ok(aggregator.finish())
}
