//! Plain-text save and load of a mesh's link graph.
//!
//! The format is line oriented (UTF-8, `\n` line ends):
//!
//! ```text
//! <vertex_count> <sentinel_count>
//! <label> <x> <y> <z> [<attribute> ...]     label `*` when absent
//! <neighbour index>                          1-based, clockwise order, one per line
//! ...
//! 0                                          end of the neighbour list
//! ```
//!
//! The vertex block repeats `vertex_count` times: real vertices in insertion order, then
//! the sentinels. Floats are written in their shortest round-trip form, so a save/load
//! round trip reproduces coordinates bit for bit.
//!
//! Loading checks the structure (index ranges, self and duplicate links, link symmetry,
//! terminators, counts, labels) before anything is linked, then re-sorts every link list.
//! Vertex kinds other than sentinel are not stored; Steiner vertices load as ordinary
//! vertices.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::core::algorithms::incremental_insertion::ConstructionStatistics;
use crate::core::builder::ConstructionOptions;
use crate::core::collections::{FastHashMap, FastHashSet, fast_hash_set_with_capacity};
use crate::core::link_store::{LinkStore, VertexKey};
use crate::core::mesh::Mesh;
use crate::core::vertex::{Vertex, VertexKind};
use crate::geometry::point::Point;

const NO_LABEL: &str = "*";

/// Upper bound on records reserved up front from the header count.
const MAX_PREALLOCATED: usize = 1 << 16;

/// Errors raised while saving or loading a mesh.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    /// Reading or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The saved text does not describe a valid mesh.
    #[error("Malformed saved mesh at line {line}: {message}")]
    MalformedSavedMesh {
        /// 1-based line number (0 when the problem is the end of input).
        line: usize,
        /// What is wrong.
        message: String,
    },
    /// A label cannot be written because it is empty, contains whitespace or is `*`.
    #[error("Label {label:?} cannot be saved: it must be non-empty, without spaces, not \"*\"")]
    InvalidLabel {
        /// The offending label.
        label: String,
    },
}

fn malformed(line: usize, message: impl Into<String>) -> PersistenceError {
    PersistenceError::MalformedSavedMesh {
        line,
        message: message.into(),
    }
}

// =============================================================================
// SAVE
// =============================================================================

impl Mesh {
    /// Writes the mesh to `writer`.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::InvalidLabel`] for a label that would not read back, or
    /// [`PersistenceError::Io`] if writing fails.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), PersistenceError> {
        let order: Vec<(VertexKey, &Vertex)> = self
            .store
            .iter()
            .filter(|(_, v)| !v.is_sentinel())
            .chain(self.store.iter().filter(|(_, v)| v.is_sentinel()))
            .collect();
        let index: FastHashMap<VertexKey, usize> = order
            .iter()
            .enumerate()
            .map(|(i, &(k, _))| (k, i + 1))
            .collect();

        writeln!(writer, "{} {}", order.len(), self.sentinel_count())?;
        for &(_, vertex) in &order {
            let label = match vertex.label() {
                Some(label)
                    if label.is_empty()
                        || label == NO_LABEL
                        || label.chars().any(char::is_whitespace) =>
                {
                    return Err(PersistenceError::InvalidLabel {
                        label: label.to_string(),
                    });
                }
                Some(label) => label,
                None => NO_LABEL,
            };
            write!(writer, "{label} {} {} {}", vertex.x(), vertex.y(), vertex.z())?;
            for value in vertex.attributes() {
                write!(writer, " {value}")?;
            }
            writeln!(writer)?;
            for neighbor in vertex.links() {
                writeln!(writer, "{}", index[neighbor])?;
            }
            writeln!(writer, "0")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// The saved form as a string.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::InvalidLabel`] as for [`Mesh::save`].
    pub fn save_to_string(&self) -> Result<String, PersistenceError> {
        let mut buffer = Vec::new();
        self.save(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| malformed(0, e.to_string()))
    }

    /// Saves the mesh to a file, replacing it if it exists.
    ///
    /// # Errors
    ///
    /// See [`Mesh::save`].
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        self.save(BufWriter::new(File::create(path)?))
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    /// Reads a mesh written by [`Mesh::save`], using default construction options for
    /// later lookups and constraint enforcement.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::MalformedSavedMesh`] for structural problems,
    /// [`PersistenceError::Io`] if reading fails.
    pub fn load<R: BufRead>(reader: R) -> Result<Self, PersistenceError> {
        Self::load_with_options(reader, ConstructionOptions::default())
    }

    /// [`Mesh::load`] with explicit options.
    ///
    /// # Errors
    ///
    /// See [`Mesh::load`].
    pub fn load_with_options<R: BufRead>(
        reader: R,
        options: ConstructionOptions,
    ) -> Result<Self, PersistenceError> {
        let records = parse(reader)?;

        let mut labels: FastHashSet<&str> = FastHashSet::default();
        for record in &records.vertices {
            if let Some(label) = record.label.as_deref()
                && !labels.insert(label)
            {
                return Err(malformed(record.line, format!("duplicate label {label:?}")));
            }
        }

        let total = records.vertices.len();
        let real = total - records.sentinels;
        let neighbor_sets: Vec<FastHashSet<usize>> = records
            .vertices
            .iter()
            .map(|r| r.neighbors.iter().copied().collect())
            .collect();
        for (i, record) in records.vertices.iter().enumerate() {
            if let Some(&n) = record.neighbors.iter().find(|&&n| !neighbor_sets[n].contains(&i)) {
                return Err(malformed(
                    record.line,
                    format!("vertex {} lists {} but not the other way round", i + 1, n + 1),
                ));
            }
            if i >= real && record.label.is_some() {
                return Err(malformed(record.line, "sentinel vertex carries a label"));
            }
        }

        let mut store = LinkStore::with_capacity(total);
        let mut statistics = ConstructionStatistics::default();
        let keys: Vec<VertexKey> = records
            .vertices
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let kind = if i >= real {
                    VertexKind::Sentinel
                } else {
                    VertexKind::Input
                };
                store.insert_vertex(Vertex::new(
                    record.point,
                    record.attributes.iter().copied(),
                    record.label.clone(),
                    kind,
                ))
            })
            .collect();
        for (i, record) in records.vertices.iter().enumerate() {
            for &n in record.neighbors.iter().filter(|&&n| n > i) {
                store.link(keys[i], keys[n]);
            }
        }
        store.sort_links();

        statistics.input_points = real;
        statistics.inserted = real;
        statistics.sentinels = records.sentinels;
        tracing::debug!(
            vertices = total,
            sentinels = records.sentinels,
            edges = store.edge_count(),
            "loaded mesh"
        );
        Ok(Self::from_store(store, options, statistics))
    }

    /// Reads a mesh from its saved string form.
    ///
    /// # Errors
    ///
    /// See [`Mesh::load`].
    pub fn load_from_str(text: &str) -> Result<Self, PersistenceError> {
        Self::load(text.as_bytes())
    }

    /// Reads a mesh from a file.
    ///
    /// # Errors
    ///
    /// See [`Mesh::load`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Self::load(BufReader::new(File::open(path)?))
    }
}

// =============================================================================
// PARSING
// =============================================================================

struct VertexRecord {
    line: usize,
    label: Option<String>,
    point: Point,
    attributes: Vec<f64>,
    /// 0-based neighbour indices in file order.
    neighbors: Vec<usize>,
}

struct SavedMesh {
    sentinels: usize,
    vertices: Vec<VertexRecord>,
}

/// Non-empty lines with their 1-based numbers.
struct Lines<R> {
    inner: std::io::Lines<R>,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    fn next_line(&mut self) -> Result<Option<(usize, String)>, PersistenceError> {
        for line in self.inner.by_ref() {
            self.number += 1;
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some((self.number, trimmed.to_string())));
            }
        }
        Ok(None)
    }

    fn expect_line(&mut self, what: &str) -> Result<(usize, String), PersistenceError> {
        self.next_line()?
            .ok_or_else(|| malformed(0, format!("unexpected end of input, expected {what}")))
    }
}

fn parse_number<T: std::str::FromStr>(
    token: &str,
    line: usize,
    what: &str,
) -> Result<T, PersistenceError> {
    token
        .parse()
        .map_err(|_| malformed(line, format!("invalid {what} {token:?}")))
}

fn parse_coordinate(token: &str, line: usize) -> Result<f64, PersistenceError> {
    let value: f64 = parse_number(token, line, "number")?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed(line, format!("non-finite number {token:?}")))
    }
}

fn parse<R: BufRead>(reader: R) -> Result<SavedMesh, PersistenceError> {
    let mut lines = Lines {
        inner: reader.lines(),
        number: 0,
    };

    let (line, header) = lines.expect_line("header")?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    let [total, sentinels] = fields.as_slice() else {
        return Err(malformed(line, "header must be \"<vertex_count> <sentinel_count>\""));
    };
    let total: usize = parse_number(total, line, "vertex count")?;
    let sentinels: usize = parse_number(sentinels, line, "sentinel count")?;
    if sentinels > total {
        return Err(malformed(line, "sentinel count exceeds vertex count"));
    }

    // The header is untrusted until the records are read.
    let mut vertices: Vec<VertexRecord> = Vec::with_capacity(total.min(MAX_PREALLOCATED));
    for i in 0..total {
        let (line, text) = lines.expect_line("vertex record")?;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(malformed(line, "vertex record needs a label and three coordinates"));
        }
        let label = (fields[0] != NO_LABEL).then(|| fields[0].to_string());
        let point = Point::new(
            parse_coordinate(fields[1], line)?,
            parse_coordinate(fields[2], line)?,
            parse_coordinate(fields[3], line)?,
        );
        let attributes = fields[4..]
            .iter()
            .map(|t| parse_coordinate(t, line))
            .collect::<Result<Vec<_>, _>>()?;

        let mut neighbors = Vec::new();
        let mut seen: FastHashSet<usize> = fast_hash_set_with_capacity(8);
        loop {
            let (n_line, text) = lines.expect_line("neighbour index or 0")?;
            let n: usize = parse_number(&text, n_line, "neighbour index")?;
            if n == 0 {
                break;
            }
            if n > total {
                return Err(malformed(
                    n_line,
                    format!("neighbour index {n} out of range 1..={total}"),
                ));
            }
            if n == i + 1 {
                return Err(malformed(n_line, format!("vertex {n} is linked to itself")));
            }
            if !seen.insert(n) {
                return Err(malformed(n_line, format!("neighbour {n} listed twice")));
            }
            neighbors.push(n - 1);
        }

        vertices.push(VertexRecord {
            line,
            label,
            point,
            attributes,
            neighbors,
        });
    }

    if let Some((line, _)) = lines.next_line()? {
        return Err(malformed(line, format!("content after {total} vertex records")));
    }
    Ok(SavedMesh {
        sentinels,
        vertices,
    })
}
