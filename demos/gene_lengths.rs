use clap::Parser;
use genecov::prelude::*;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the GTF annotation
    #[clap(value_parser)]
    gtf: String,
}

fn main() -> Result<(), GeneCovError> {
    let args = Args::parse();
    let exons = read_exons(&args.gtf)?;
    let genes = GeneModels::from_records(&exons).finalize();

    for gene in &genes {
        println!("{}\t{}", gene.id(), gene.length());
    }

    Ok(())
}
