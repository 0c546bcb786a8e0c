use clap::{Parser, Subcommand};
use genecov::file::{InputFile, OutputFile};
use genecov::gene::write_gene_lengths;
use genecov::gtf::{read_features, write_exon_bed};
use genecov::prelude::*;
use genecov::transcript::{exons_with_introns, PreMrnaBuilder};
use std::io::Write;

const INFO: &str = "\
genecov: gene models and transcript coverage profiles from GTF annotations
usage: genecov [--help] <subcommand>

Subcommands:

  profile:       aggregate read coverage along transcripts.
  exons:         write exons as BED.
  introns:       write exons and their introns as GTF.
  transcripts:   write transcript extents as BED.
  annotated:     write disjoint annotated regions as BED.
  pre-mrna:      write the unspliced form of each spliced transcript as GTF.
  gene-lengths:  write the exonic length of each gene.

";

#[derive(Parser)]
#[clap(name = "genecov")]
#[clap(about = INFO)]
struct Cli {
    /// Log more; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the aggregate read coverage across transcripts.
    ///
    /// Each gene's exons are joined 5' to 3' and split into bins of equal
    /// relative length. A gene's coverage is normalized to sum to one, then
    /// averaged over all genes. The output is a TSV of:
    ///
    ///  - bin start, in percent of transcript length
    ///  - fraction of coverage in the bin
    ///
    /// Example:
    ///
    ///  $ genecov profile genes.gtf coverage.bedGraph -n 100 --min-length 1000
    Profile {
        /// the GTF annotation (`-` for standard input)
        #[arg(required = true)]
        gtf: String,
        /// a bedGraph of per-base read coverage (plus strand if --minus-bedgraph is set)
        #[arg(required = true)]
        bedgraph: String,
        /// a bedGraph of minus strand read coverage
        #[arg(long)]
        minus_bedgraph: Option<String>,
        /// number of bins
        #[arg(short, default_value_t = 100)]
        n: usize,
        /// only count reads on the gene's strand
        #[arg(short, long, default_value_t = false)]
        stranded: bool,
        /// minimum exonic gene length
        #[arg(long, default_value_t = 1000)]
        min_length: u64,
        /// minimum total read count of a gene
        #[arg(long, default_value_t = 25.0)]
        min_count: f64,
        /// write the ids of the genes used to this file
        #[arg(long)]
        gene_list: Option<String>,
        /// number of threads (0 uses all cores)
        #[cfg(feature = "parallel")]
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// the output file path (if not set, uses standard out)
        #[arg(long)]
        output: Option<String>,
    },
    /// Write each exon as a BED6 row named by its gene.
    Exons {
        #[arg(default_value = "-")]
        gtf: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Write the exons and the introns between them as GTF, sorted by position.
    Introns {
        #[arg(default_value = "-")]
        gtf: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Write the extent of each transcript as a BED6 row.
    Transcripts {
        #[arg(default_value = "-")]
        gtf: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Write disjoint regions covered by any transcript as BED.
    Annotated {
        #[arg(default_value = "-")]
        gtf: String,
        /// merge regions across strands
        #[arg(long, default_value_t = false)]
        unstranded: bool,
        /// merge exons rather than whole transcripts
        #[arg(long, default_value_t = false)]
        exons: bool,
        #[arg(long)]
        output: Option<String>,
    },
    /// Write one unspliced exon per distinct spliced transcript extent, as GTF.
    PreMrna {
        #[arg(default_value = "-")]
        gtf: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Write the total length of the union of each gene's exons.
    GeneLengths {
        #[arg(default_value = "-")]
        gtf: String,
        /// the feature type to measure, e.g. CDS
        #[arg(long, default_value = "exon")]
        feature: String,
        #[arg(long)]
        output: Option<String>,
    },
}

fn init_logger(debug: u8) {
    env_logger::Builder::new()
        .filter_level(match debug {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

/// Header lines of the input GTF, carried over to GTF output.
fn gtf_header(gtf: &str) -> Result<Option<Vec<String>>, GeneCovError> {
    let comments = InputFile::new(gtf).leading_comments("#")?;
    Ok((!comments.is_empty()).then_some(comments))
}

fn transcripts(exons: &[AnnotationRecord]) -> Result<Vec<Transcript>, GeneCovError> {
    TranscriptAssembler::from_records(exons).finalize()
}

#[allow(clippy::too_many_arguments)]
fn coverage_profile(
    gtf: &str,
    bedgraph: &str,
    minus_bedgraph: Option<&str>,
    config: ProfileConfig,
    gene_list: Option<&str>,
    threads: usize,
    output: Option<&str>,
) -> Result<(), GeneCovError> {
    config.validate()?;
    let exons = read_exons(gtf)?;
    let genes = GeneModels::from_records(&exons).finalize();
    let counts = BedGraphCounts::from_bedgraphs(bedgraph, minus_bedgraph)?;
    if config.stranded && !counts.is_stranded() {
        return Err(GeneCovError::NoStrandedCounts);
    }

    #[cfg(feature = "parallel")]
    let profile = {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| GeneCovError::IOError(std::io::Error::other(e)))?
            .install(|| aggregate_parallel(&genes, &counts, &config))?
    };
    #[cfg(not(feature = "parallel"))]
    let profile = {
        let _ = threads;
        aggregate(&genes, &counts, &config)?
    };

    let mut writer = OutputFile::new(output, None).writer()?;
    profile.write_tsv(&mut writer)?;
    writer.flush()?;

    if let Some(path) = gene_list {
        let mut writer = OutputFile::new(Some(path), None).writer()?;
        profile.write_gene_list(&mut writer)?;
        writer.flush()?;
    }
    Ok(())
}

fn run() -> Result<(), GeneCovError> {
    let cli = Cli::parse();
    init_logger(cli.debug);

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };

    match command {
        Commands::Profile {
            gtf,
            bedgraph,
            minus_bedgraph,
            n,
            stranded,
            min_length,
            min_count,
            gene_list,
            #[cfg(feature = "parallel")]
            threads,
            output,
        } => {
            #[cfg(not(feature = "parallel"))]
            let threads = 1;
            let config = ProfileConfig {
                bins: n,
                stranded,
                min_length,
                min_count,
            };
            coverage_profile(
                &gtf,
                &bedgraph,
                minus_bedgraph.as_deref(),
                config,
                gene_list.as_deref(),
                threads,
                output.as_deref(),
            )
        }
        Commands::Exons { gtf, output } => {
            let exons = read_exons(&gtf)?;
            let mut writer = OutputFile::new(output.as_deref(), None).writer()?;
            write_exon_bed(&mut writer, &exons)?;
            writer.flush()?;
            Ok(())
        }
        Commands::Introns { gtf, output } => {
            let exons = read_exons(&gtf)?;
            let rows = exons_with_introns(&exons, &transcripts(&exons)?);
            let mut writer = OutputFile::new(output.as_deref(), gtf_header(&gtf)?).writer()?;
            for row in &rows {
                row.write_gtf(&mut writer)?;
            }
            writer.flush()?;
            Ok(())
        }
        Commands::Transcripts { gtf, output } => {
            let exons = read_exons(&gtf)?;
            let mut writer = OutputFile::new(output.as_deref(), None).writer()?;
            for transcript in transcripts(&exons)? {
                transcript.write_bed(&mut writer)?;
            }
            writer.flush()?;
            Ok(())
        }
        Commands::Annotated {
            gtf,
            unstranded,
            exons: from_exons,
            output,
        } => {
            let exons = read_exons(&gtf)?;
            let spans: Vec<Region> = if from_exons {
                exons
                    .iter()
                    .map(|e| Region::new(&e.seqname, e.start - 1, e.end, Some(e.strand)))
                    .collect()
            } else {
                transcripts(&exons)?.iter().map(|t| t.span()).collect()
            };
            let mut writer = OutputFile::new(output.as_deref(), None).writer()?;
            for region in merge_regions(spans, !unstranded) {
                region.write_bed(&mut writer)?;
            }
            writer.flush()?;
            Ok(())
        }
        Commands::PreMrna { gtf, output } => {
            let exons = read_exons(&gtf)?;
            let mut builder = PreMrnaBuilder::new();
            for transcript in transcripts(&exons)? {
                builder.add(&transcript);
            }
            let mut writer = OutputFile::new(output.as_deref(), gtf_header(&gtf)?).writer()?;
            for record in builder.build() {
                record.write_gtf(&mut writer)?;
            }
            writer.flush()?;
            Ok(())
        }
        Commands::GeneLengths {
            gtf,
            feature,
            output,
        } => {
            let records = read_features(&gtf, &feature)?;
            let genes = GeneModels::from_features(&records, &feature).finalize();
            let mut writer = OutputFile::new(output.as_deref(), None).writer()?;
            write_gene_lengths(&mut writer, &genes)?;
            writer.flush()?;
            Ok(())
        }
    }
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
