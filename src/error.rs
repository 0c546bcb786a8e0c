use std::io;
use thiserror::Error;

use crate::file::FileError;
use crate::interval::Position;

#[derive(Error, Debug)]
pub enum GeneCovError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("Tab-delimited parsing error: {0}")]
    ParsingError(#[from] csv::Error),
    #[error("GenomeMap Error: error updating GenomeMap")]
    GenomeMapError(#[from] genomap::GenomeMapError),
    #[error("Only {fields} fields found on line {line}")]
    MalformedRecord { line: u64, fields: usize },
    #[error("Bad coordinates on line {0}")]
    BadCoordinates(u64),
    #[error("Unsupported strand '{1}' on line {0}")]
    BadStrand(u64, String),
    #[error("Missing attribute '{0}'")]
    MissingAttribute(String),
    #[error("Transcript '{0}' has exons on different sequences or strands")]
    InconsistentTranscript(String),
    #[error("Transcript '{transcript}' has overlapping exons ending at {end} and starting at {start}")]
    OverlappingExons {
        transcript: String,
        end: Position,
        start: Position,
    },
    #[error("Cannot flatten an empty interval set")]
    EmptyIntervalSet,
    #[error("Gene '{0}' has no exons")]
    EmptyGene(String),
    #[error("Degenerate interval ({0}, {1})")]
    DegenerateInterval(Position, Position),
    #[error("Strand-specific counts requested, but no minus-strand coverage was loaded")]
    NoStrandedCounts,
    #[error("Number of bins must be positive")]
    InvalidBins,
    #[error("bedGraph entry {0}:{1}-{2} overlaps or precedes the previous entry")]
    UnsortedCoverage(String, Position, Position),
}
