//! Per-base read counts.
//!
//! The coverage profile only needs one thing from an alignment: the number of
//! reads covering each base of a range, optionally restricted to one strand.
//! That is the [`CountProvider`] trait. [`BedGraphCounts`] implements it
//! over bedGraph coverage tracks, e.g. from `bedtools genomecov -bga -split`,
//! with an optional second track for the minus strand.

use csv::ReaderBuilder;
use genomap::GenomeMap;
use log::info;
use serde::Deserialize;

use crate::error::GeneCovError;
use crate::file::InputFile;
use crate::interval::Position;
use crate::numeric::{search_sorted, SearchResult};
use crate::strand::Strand;

/// The integer type for per-base read counts.
pub type Count = u32;

/// A source of per-base read counts.
pub trait CountProvider {
    /// Counts for each base of the 0-based closed range `[start, end]`,
    /// `end - start + 1` values in all. `strand` restricts counting to reads on
    /// that strand; `None` counts all reads.
    ///
    /// `Ok(None)` means there is no coverage data for the range.
    fn counts(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        strand: Option<Strand>,
    ) -> Result<Option<Vec<Count>>, GeneCovError>;
}

/// Piecewise-constant coverage along one sequence: sorted, non-overlapping
/// half-open runs `[starts[i], ends[i])` with count `values[i]`.
#[derive(Debug, Default, Clone)]
pub struct CoverageTrack {
    starts: Vec<Position>,
    ends: Vec<Position>,
    values: Vec<Count>,
}

impl CoverageTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run. Runs must come in order and not overlap; empty runs
    /// and zero counts are dropped.
    pub fn push(
        &mut self,
        seqname: &str,
        start: Position,
        end: Position,
        value: Count,
    ) -> Result<(), GeneCovError> {
        if let Some(&last_end) = self.ends.last() {
            if start < last_end {
                return Err(GeneCovError::UnsortedCoverage(
                    seqname.to_string(),
                    start,
                    end,
                ));
            }
        }
        if start >= end || value == 0 {
            return Ok(());
        }
        self.starts.push(start);
        self.ends.push(end);
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Add this track's counts over the closed range `[start, end]` into
    /// `counts`, where `counts[0]` is position `start`.
    pub fn add_counts(&self, start: Position, end: Position, counts: &mut [Count]) {
        // first run that ends after `start`
        let first = match search_sorted(&self.ends, start) {
            SearchResult::Exact(idx) => idx + 1,
            SearchResult::LowerBound(_) => 0,
            SearchResult::LeftOf(idx) => idx,
            SearchResult::UpperBound(_) => return,
        };
        for i in first..self.starts.len() {
            if self.starts[i] > end {
                break;
            }
            let from = self.starts[i].max(start);
            let to = (self.ends[i] - 1).min(end);
            for pos in from..=to {
                let count = &mut counts[(pos - start) as usize];
                *count = count.saturating_add(self.values[i]);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct BedGraphEntry {
    chrom: String,
    start: Position,
    end: Position,
    value: Count,
}

/// Read a bedGraph file of integer coverage into per-sequence tracks.
///
/// `track` and `browser` lines and `#` comments are ignored. Entries must be
/// sorted by start within each sequence.
pub fn read_bedgraph(filepath: &str) -> Result<GenomeMap<CoverageTrack>, GeneCovError> {
    let input_file = InputFile::new(filepath);
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(input_file.reader()?);

    let mut tracks: GenomeMap<CoverageTrack> = GenomeMap::new();
    let mut entries = 0;
    for result in rdr.records() {
        let record = result?;
        if record
            .get(0)
            .map_or(false, |s| s.starts_with("track") || s.starts_with("browser"))
        {
            continue;
        }
        let entry: BedGraphEntry = record.deserialize(None)?;
        tracks
            .entry_or_default(&entry.chrom)
            .push(&entry.chrom, entry.start, entry.end, entry.value)?;
        entries += 1;
    }
    info!(
        "read {} coverage entries over {} sequences from {}",
        entries,
        tracks.len(),
        filepath
    );
    Ok(tracks)
}

/// Counts from bedGraph coverage tracks.
///
/// With only `tracks`, coverage is unstranded and strand-restricted queries
/// are an error. With `minus_tracks` too, `tracks` holds plus-strand coverage
/// and unstranded queries sum both.
pub struct BedGraphCounts {
    tracks: GenomeMap<CoverageTrack>,
    minus_tracks: Option<GenomeMap<CoverageTrack>>,
}

impl BedGraphCounts {
    pub fn new(
        tracks: GenomeMap<CoverageTrack>,
        minus_tracks: Option<GenomeMap<CoverageTrack>>,
    ) -> Self {
        Self {
            tracks,
            minus_tracks,
        }
    }

    /// Load unstranded coverage, or stranded coverage if `minus` is given.
    pub fn from_bedgraphs(filepath: &str, minus: Option<&str>) -> Result<Self, GeneCovError> {
        let tracks = read_bedgraph(filepath)?;
        let minus_tracks = minus.map(read_bedgraph).transpose()?;
        Ok(Self::new(tracks, minus_tracks))
    }

    pub fn is_stranded(&self) -> bool {
        self.minus_tracks.is_some()
    }
}

impl CountProvider for BedGraphCounts {
    fn counts(
        &self,
        seqname: &str,
        start: Position,
        end: Position,
        strand: Option<Strand>,
    ) -> Result<Option<Vec<Count>>, GeneCovError> {
        let sources = match (strand, &self.minus_tracks) {
            (None, None) | (Some(Strand::Plus), Some(_)) => vec![&self.tracks],
            (None, Some(minus)) => vec![&self.tracks, minus],
            (Some(Strand::Minus), Some(minus)) => vec![minus],
            (Some(_), None) => return Err(GeneCovError::NoStrandedCounts),
        };

        let mut counts = vec![0; (end - start + 1) as usize];
        let mut found = false;
        for tracks in sources {
            if let Some(track) = tracks.get(seqname) {
                track.add_counts(start, end, &mut counts);
                found = true;
            }
        }
        Ok(found.then_some(counts))
    }
}
