use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use phylotree::tree::Tree;

use crate::error::{QuintetError, Result};
use crate::rooting::RankedRooting;

/// Strip bracketed comments from Newick strings.
///
/// Annotations such as `[&rate=0.123]` or `[100]` carry nothing the rooting
/// needs, and the parser rejects some of them.
fn strip_comments(newick: &str) -> String {
    let mut result = String::with_capacity(newick.len());
    let mut depth = 0usize;

    for ch in newick.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => result.push(ch),
            _ => {}
        }
    }

    result
}

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Reads a whole file, decompressing it when the name ends in `.gz`.
fn read_text(path: &Path) -> io::Result<String> {
    let mut content = String::new();
    if is_gz(path) {
        GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;
    } else {
        File::open(path)?.read_to_string(&mut content)?;
    }
    Ok(content)
}

/// Splits `content` into `;`-terminated trees and parses each one.
pub fn parse_newick_trees(content: &str) -> Result<Vec<Tree>> {
    strip_comments(content)
        .split(';')
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .enumerate()
        .map(|(idx, body)| {
            Tree::from_newick(&format!("{body};"))
                .map_err(|e| QuintetError::Newick(format!("tree {idx}: {e}")))
        })
        .collect()
}

/// All trees in a newick file, one or more per line.
pub fn read_newick_trees<P: AsRef<Path>>(path: P) -> Result<Vec<Tree>> {
    let content = read_text(path.as_ref())?;
    parse_newick_trees(&content).map_err(|e| match e {
        QuintetError::Newick(msg) => {
            QuintetError::Newick(format!("{}: {msg}", path.as_ref().display()))
        }
        other => other,
    })
}

/// The first tree of a newick file.
pub fn read_species_tree<P: AsRef<Path>>(path: P) -> Result<Tree> {
    read_newick_trees(path.as_ref())?
        .into_iter()
        .next()
        .ok_or_else(|| {
            QuintetError::Newick(format!("{}: no tree found", path.as_ref().display()))
        })
}

/// Opens `path` for writing; the output is gzip-compressed if it ends in `.gz`.
fn create_writer(path: &Path) -> io::Result<Box<dyn Write>> {
    let file = File::create(path)?;
    Ok(if is_gz(path) {
        Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
    } else {
        Box::new(BufWriter::new(file))
    })
}

/// Where the ranking of `output` goes: `<output>.rank.cfn`.
pub fn rank_path<P: AsRef<Path>>(output: P) -> PathBuf {
    let mut name = output.as_ref().as_os_str().to_owned();
    name.push(".rank.cfn");
    PathBuf::from(name)
}

/// Write the chosen rooting as a single newick line.
pub fn write_best_tree<P: AsRef<Path>>(path: P, newick: &str) -> io::Result<()> {
    let mut out = create_writer(path.as_ref())?;
    writeln!(&mut out, "{newick}")?;
    out.flush()
}

/// Write every rooting in the given order: its newick line, then its
/// confidence score on the next line.
pub fn write_rank_file<P: AsRef<Path>>(path: P, ranking: &[RankedRooting]) -> io::Result<()> {
    let mut out = create_writer(path.as_ref())?;
    for rooting in ranking {
        writeln!(&mut out, "{}", rooting.newick)?;
        writeln!(&mut out, "{}", rooting.confidence)?;
    }
    out.flush()
}
