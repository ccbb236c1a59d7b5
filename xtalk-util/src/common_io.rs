#![allow(dead_code)]

use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Tokenized lines of a delimited text file plus an optional header
pub struct LinesOfWords {
    pub lines: Vec<Vec<Box<str>>>,
    pub header: Vec<Box<str>>,
}

///
/// Read every line of the input file into memory
///
/// * `input_file` - file name, either gzipped or not
///
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    let buf: Box<dyn BufRead> = open_buf_reader(input_file)?;
    let mut lines = vec![];
    for x in buf.lines() {
        lines.push(x?.into_boxed_str());
    }
    Ok(lines)
}

///
/// Write every line into the output file
///
/// * `lines` - things to write, one per line
/// * `output_file` - file name, either gzipped or not
///
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected write error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

///
/// Split each line of a delimited file into words; comment lines
/// (`#` or `%`) are skipped. Parsing runs in parallel, then the
/// original line order is restored.
///
/// * `input_file` - file name, either gzipped or not
/// * `delim` - field delimiter
/// * `with_header` - treat the first retained line as a header
///
pub fn read_lines_of_words(
    input_file: &str,
    delim: char,
    with_header: bool,
) -> anyhow::Result<LinesOfWords> {
    let buf: Box<dyn BufRead> = open_buf_reader(input_file)?;

    let lines_raw: Vec<Box<str>> = buf
        .lines()
        .map_while(Result::ok)
        .filter(|x| !(x.starts_with('#') || x.starts_with('%')))
        .map(|x| x.into_boxed_str())
        .collect();

    let tokenize = |line: &str| -> Vec<Box<str>> {
        line.split(delim)
            .map(|w| w.trim().to_string().into_boxed_str())
            .collect()
    };

    let (header, body) = if with_header {
        if lines_raw.is_empty() {
            anyhow::bail!("no header line in {}", input_file);
        }
        (tokenize(&lines_raw[0]), &lines_raw[1..])
    } else {
        (vec![], &lines_raw[..])
    };

    let mut lines: Vec<(usize, Vec<Box<str>>)> = body
        .iter()
        .enumerate()
        .par_bridge()
        .map(|(i, s)| (i, tokenize(s)))
        .collect();

    lines.sort_by_key(|&(i, _)| i);

    Ok(LinesOfWords {
        lines: lines.into_iter().map(|(_, x)| x).collect(),
        header,
    })
}

///
/// Open a file for reading and return a buffered reader. A `.gz`
/// extension switches to on-the-fly decompression.
///
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let input_file = File::open(input_file)?;
            let decoder = GzDecoder::new(input_file);
            Ok(Box::new(BufReader::new(decoder)))
        }
        _ => {
            let input_file = File::open(input_file)?;
            Ok(Box::new(BufReader::new(input_file)))
        }
    }
}

///
/// Open a file for writing and return a buffered writer. `stdout` and
/// `stderr` are understood literally; a `.gz` extension compresses.
///
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    if output_file.eq_ignore_ascii_case("stderr") {
        return Ok(Box::new(BufWriter::new(std::io::stderr())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

///
/// Create the parent directory of `file` if needed
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    let dir = path.parent().ok_or(anyhow::anyhow!("no parent"))?;
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

///
/// Take the basename of a file
///
pub fn basename(file: &str) -> anyhow::Result<Box<str>> {
    let path = Path::new(file);
    match path.file_stem().and_then(|x| x.to_str()) {
        Some(base) => Ok(base.to_string().into_boxed_str()),
        None => Err(anyhow::anyhow!("no file stem in {}", file)),
    }
}

///
/// Take the extension of a file
///
pub fn extension(file: &str) -> anyhow::Result<Box<str>> {
    let path = Path::new(file);
    match path.extension().and_then(|x| x.to_str()) {
        Some(ext) => Ok(ext.to_string().into_boxed_str()),
        None => Err(anyhow::anyhow!("no extension in {}", file)),
    }
}

///
/// Remove a file or directory if it exists
///
pub fn remove_file(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if path.exists() {
        if path.is_file() {
            std::fs::remove_file(path)?;
        } else {
            std::fs::remove_dir_all(path)?;
        }
    }
    Ok(())
}
