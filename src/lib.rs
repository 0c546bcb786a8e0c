//! Gene interval models from GTF annotations, and aggregate read coverage
//! along transcripts.
//!
//! Exon records read with [`GtfReader`] can be grouped two ways:
//!
//!  - by gene, into [`Gene`] models whose exons are flattened into a sorted,
//!    disjoint set ([`GeneModels`]);
//!  - by transcript, into [`Transcript`] spans and introns
//!    ([`TranscriptAssembler`]).
//!
//! Transcript spans (or exons) can be merged into disjoint annotated regions
//! with [`merge_regions`], and gene models feed the coverage profile, which
//! averages each gene's read coverage over a 0-100% transcript axis.
//!
//! Here is an example which computes the average coverage profile of all
//! genes from a GTF file and a bedGraph of read coverage:
//!
//! ```no_run
//! use genecov::prelude::*;
//! let exons = read_exons("genes.gtf").expect("could not read GTF");
//! let genes = GeneModels::from_records(&exons).finalize();
//! let counts = BedGraphCounts::from_bedgraphs("coverage.bedGraph", None)
//!                  .expect("could not read bedGraph");
//!
//! let profile = aggregate(&genes, &counts, &ProfileConfig::default())
//!                  .expect("could not compute profile");
//!
//! for (i, density) in profile.density.iter().enumerate() {
//!     println!("{:.2}\t{}", profile.bin_percent(i), density);
//! }
//! ```
//!
//! Annotated regions are built from transcript spans:
//!
//! ```no_run
//! use genecov::prelude::*;
//! let exons = read_exons("genes.gtf").expect("could not read GTF");
//! let transcripts = TranscriptAssembler::from_records(&exons)
//!                       .finalize()
//!                       .expect("could not assemble transcripts");
//!
//! let spans = transcripts.iter().map(|t| t.span()).collect();
//! let regions = merge_regions(spans, true);
//! ```
//!
//! This example can be run on the command line with:
//!
//! ```bash
//! cargo run --features cli --example gene_lengths -- genes.gtf
//! ```

pub mod coverage;
pub mod error;
pub mod file;
pub mod gene;
pub mod gtf;
pub mod interval;
pub mod numeric;
pub mod profile;
pub mod region;
pub mod strand;
pub mod transcript;

pub use coverage::{BedGraphCounts, CountProvider};
pub use error::GeneCovError;
pub use gene::{Gene, GeneModels};
pub use gtf::{read_exons, AnnotationRecord, GtfReader};
pub use interval::{flatten, Interval, Position};
#[cfg(feature = "parallel")]
pub use profile::aggregate_parallel;
pub use profile::{aggregate, CoverageProfile, ProfileConfig};
pub use region::{merge_regions, Region};
pub use strand::Strand;
pub use transcript::{Transcript, TranscriptAssembler};

pub mod prelude {
    pub use crate::coverage::{BedGraphCounts, CountProvider};
    pub use crate::error::GeneCovError;
    pub use crate::gene::{Gene, GeneModels};
    pub use crate::gtf::{read_exons, AnnotationRecord, GtfReader};
    pub use crate::interval::{flatten, Interval, Position};
    #[cfg(feature = "parallel")]
    pub use crate::profile::aggregate_parallel;
    pub use crate::profile::{aggregate, CoverageProfile, ProfileConfig};
    pub use crate::region::{merge_regions, Region};
    pub use crate::strand::Strand;
    pub use crate::transcript::{Transcript, TranscriptAssembler};
}
