//! Encapsulates plaintext and gzip-compressed file input and output.
//!
//! The [`InputFile`] and [`OutputFile`] abstractions are for working with
//! possibly gzip-compressed GTF, bedGraph and BED files. The path `-` reads
//! from standard input, and a missing output path writes to standard out.
//!
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::io::{self, BufWriter};
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

/// The path that stands for standard input.
pub const STDIN_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("Could not open '{0}': {1}")]
    OpenError(String, io::Error),
}

/// Check if a file is a gzipped by looking for the magic numbers
fn is_gzipped_file(file_path: &str) -> io::Result<bool> {
    let mut file = File::open(file_path)?;
    let mut buffer = [0; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1f, 0x8b]),
        // files shorter than the magic number can't be gzipped
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Represents an input file.
///
/// This abstracts how data is read in, allowing for plaintext, gzip-compressed
/// and standard input to be read through a common interface.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filepath: String,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - The path to the file, or `-` for standard input. Compression is
    /// detected from the file contents, not the extension.
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Whether this input is standard input.
    pub fn is_stdin(&self) -> bool {
        self.filepath == STDIN_PATH
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// If the file is gzip-compressed, this method will automatically handle the
    /// decompression. Standard input is always read as plaintext.
    ///
    /// # Returns
    ///
    /// A result containing a `BufReader<Box<dyn Read>>` on success, or a `FileError` on failure.
    ///
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, FileError> {
        if self.is_stdin() {
            return Ok(BufReader::new(Box::new(io::stdin())));
        }
        let file = File::open(&self.filepath)
            .map_err(|e| FileError::OpenError(self.filepath.clone(), e))?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Collect the leading lines starting with `comment`, with the prefix removed.
    /// For GTF files this is the `#!` header block.
    ///
    /// This re-opens the file, so it cannot be used on standard input.
    pub fn leading_comments(&self, comment: &str) -> Result<Vec<String>, FileError> {
        let mut comments = Vec::new();
        if self.is_stdin() {
            return Ok(comments);
        }
        for line in self.reader()?.lines() {
            let line = line?;
            match line.strip_prefix(comment) {
                Some(rest) => comments.push(rest.trim().to_string()),
                None => break,
            }
        }
        Ok(comments)
    }
}

/// Represents an output file.
///
/// This struct is used to handle operations on an output file, such as writing to the file.
/// This abstracts writing plaintext, gzip-compressed files and standard out.
pub struct OutputFile {
    pub filepath: Option<String>,
    pub header: Option<Vec<String>>,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - The path to the file. If the file extension is `.gz`,
    /// `OutputFile` will automatically write gzip-compressed output. `None` means
    /// standard out.
    /// * `header` - An optional vector of strings representing commented header lines to be written to the file.
    pub fn new(filepath: Option<&str>, header: Option<Vec<String>>) -> Self {
        Self {
            filepath: filepath.map(|s| s.to_string()),
            header,
        }
    }

    /// Opens the file and returns a writer.
    ///
    /// If the file path ends with ".gz", the file is treated as gzip-compressed, and the
    /// function will handle compression automatically. If a header is set, it will be written
    /// to the file.
    pub fn writer(&self) -> Result<Box<dyn Write>, FileError> {
        let mut writer: Box<dyn Write> = match &self.filepath {
            Some(outfile) if outfile.ends_with(".gz") => {
                let file = File::create(outfile)
                    .map_err(|e| FileError::OpenError(outfile.clone(), e))?;
                Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
            }
            Some(outfile) => {
                let file = File::create(outfile)
                    .map_err(|e| FileError::OpenError(outfile.clone(), e))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout())),
        };
        // write header if one is set
        if let Some(entries) = &self.header {
            for entry in entries {
                writeln!(writer, "#{}", entry)?;
            }
        }
        Ok(writer)
    }
}
