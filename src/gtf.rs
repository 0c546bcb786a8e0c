//! GTF annotation records: reading, attribute lookup, and writing.
//!
//! Records are streamed from any [`Read`] with [`GtfReader`], which is built on
//! the `csv` crate with quoting disabled, since GTF attribute values carry
//! literal double quotes. Lines that do not have the nine GTF columns, or have
//! unusable coordinates or strands, are logged and skipped.

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use indexmap::IndexMap;
use log::{info, warn};
use std::io::{Read, Write};

use crate::error::GeneCovError;
use crate::file::InputFile;
use crate::interval::Position;
use crate::strand::Strand;

pub const GENE_ID: &str = "gene_id";
pub const TRANSCRIPT_ID: &str = "transcript_id";
pub const EXON: &str = "exon";

const GTF_COLUMNS: usize = 9;

/// Attribute key/value pairs, in file order.
pub type Attributes = IndexMap<String, String>;

/// A single GTF line. Coordinates are 1-based and inclusive, as in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub seqname: String,
    pub source: String,
    pub feature: String,
    pub start: Position,
    pub end: Position,
    pub score: String,
    pub strand: Strand,
    pub frame: String,
    pub attributes: Attributes,
}

impl AnnotationRecord {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Look up an attribute that must be present.
    pub fn require(&self, key: &str) -> Result<&str, GeneCovError> {
        self.attribute(key)
            .ok_or_else(|| GeneCovError::MissingAttribute(key.to_string()))
    }

    pub fn is_exon(&self) -> bool {
        self.feature == EXON
    }

    /// Write this record as a GTF line.
    pub fn write_gtf<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), GeneCovError> {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.seqname,
            self.source,
            self.feature,
            self.start,
            self.end,
            self.score,
            self.strand,
            self.frame,
            format_attributes(&self.attributes)
        )?;
        Ok(())
    }
}

/// Parse a GTF attribute column of `key value;` or `key "value";` pairs.
pub fn parse_attributes(column: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for part in column.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let mut kv = part.splitn(2, char::is_whitespace);
        let key = kv.next().unwrap_or("").trim();
        let value = kv.next().unwrap_or("").trim();
        let value = value.strip_prefix('"').unwrap_or(value);
        let value = value.strip_suffix('"').unwrap_or(value);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), value.to_string());
    }
    attributes
}

/// Render attributes as `key "value"; key "value";`.
pub fn format_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{} \"{}\";", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_record(record: &StringRecord, line: u64) -> Result<AnnotationRecord, GeneCovError> {
    if record.len() < GTF_COLUMNS {
        return Err(GeneCovError::MalformedRecord {
            line,
            fields: record.len(),
        });
    }

    let position = |i: usize| -> Result<Position, GeneCovError> {
        record[i]
            .trim()
            .parse()
            .map_err(|_| GeneCovError::BadCoordinates(line))
    };
    let start = position(3)?;
    let end = position(4)?;
    if start == 0 || start > end {
        return Err(GeneCovError::BadCoordinates(line));
    }

    let strand = record[6]
        .parse::<Strand>()
        .map_err(|s| GeneCovError::BadStrand(line, s))?;

    Ok(AnnotationRecord {
        seqname: record[0].to_string(),
        source: record[1].to_string(),
        feature: record[2].to_string(),
        start,
        end,
        score: record[5].to_string(),
        strand,
        frame: record[7].to_string(),
        attributes: parse_attributes(&record[8]),
    })
}

/// A lazy reader of [`AnnotationRecord`]s.
///
/// Unusable lines are skipped with a warning and counted in
/// [`GtfReader::skipped`]; I/O errors end iteration with an `Err`.
pub struct GtfReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    skipped: usize,
}

impl<R: Read> GtfReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);
        Self {
            records: rdr.into_records(),
            skipped: 0,
        }
    }

    /// Number of lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl GtfReader<Box<dyn Read>> {
    /// Open a GTF file (possibly gzip-compressed, or `-` for standard input).
    pub fn from_path(filepath: &str) -> Result<Self, GeneCovError> {
        let reader: Box<dyn Read> = Box::new(InputFile::new(filepath).reader()?);
        Ok(Self::new(reader))
    }
}

impl<R: Read> Iterator for GtfReader<R> {
    type Item = Result<AnnotationRecord, GeneCovError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => match e.kind() {
                    csv::ErrorKind::Utf8 { pos, .. } => {
                        let line = pos.as_ref().map_or(0, |p| p.line());
                        warn!("Invalid UTF-8 on line {}. Skipping.", line);
                        self.skipped += 1;
                        continue;
                    }
                    _ => return Some(Err(e.into())),
                },
            };
            let line = record.position().map_or(0, |p| p.line());
            match parse_record(&record, line) {
                Ok(parsed) => return Some(Ok(parsed)),
                Err(e) => {
                    warn!("{}. Skipping.", e);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Read all records of one feature type (e.g. `exon` or `CDS`) from a GTF file.
pub fn read_features(
    filepath: &str,
    feature: &str,
) -> Result<Vec<AnnotationRecord>, GeneCovError> {
    let mut reader = GtfReader::from_path(filepath)?;
    let mut records = Vec::new();
    for record in reader.by_ref() {
        let record = record?;
        if record.feature == feature {
            records.push(record);
        }
    }
    info!(
        "parsed {} {} records from {} ({} lines skipped)",
        records.len(),
        feature,
        filepath,
        reader.skipped()
    );
    Ok(records)
}

/// Read all exon records from a GTF file.
pub fn read_exons(filepath: &str) -> Result<Vec<AnnotationRecord>, GeneCovError> {
    read_features(filepath, EXON)
}

/// Write exons as BED6 rows named by their gene.
///
/// Exons without a `gene_id` are skipped with a warning.
pub fn write_exon_bed<W: Write + ?Sized>(
    writer: &mut W,
    exons: &[AnnotationRecord],
) -> Result<(), GeneCovError> {
    for exon in exons {
        let gene_id = match exon.require(GENE_ID) {
            Ok(id) => id,
            Err(e) => {
                warn!("{} on exon {}:{}-{}. Skipping.", e, exon.seqname, exon.start, exon.end);
                continue;
            }
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t0\t{}",
            exon.seqname,
            exon.start - 1,
            exon.end,
            gene_id,
            exon.strand
        )?;
    }
    Ok(())
}
