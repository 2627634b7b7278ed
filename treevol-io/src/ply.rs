//! PLY format support
//!
//! A small, dependency-free PLY decoder covering what volume estimation needs:
//! vertex positions and face index lists, in ASCII or binary (little/big
//! endian) encoding. It is not a general PLY library.
//!
//! Binary vertex records are read with a fixed stride derived from the
//! declared vertex property types (see [`vertex_stride`]). The position is
//! always taken from the first 12 bytes of the record as three 4-byte floats.
//! Binary faces are expected as `property list uchar int vertex_indices`.
//!
//! Declared counts are upper bounds. When the data ends early, decoding stops
//! and keeps what was read.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::num::IntErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace, warn};
use treevol_core::{Error, Face, PolygonMesh, Result, Vertex};

/// Bytes of a binary vertex record that hold the position (three `f32`)
pub const POSITION_BYTES: usize = 12;

/// Stride used when no vertex property has a known size
pub const DEFAULT_VERTEX_STRIDE: usize = POSITION_BYTES;

/// Upper bound on up-front allocation, so a bogus count in the header can't
/// reserve gigabytes before any data is read
const MAX_PREALLOCATION: usize = 1 << 20;

/// PLY data encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlyEncoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyEncoding {
    /// Classify the encoding token of a `format` header line.
    ///
    /// Anything mentioning `binary` is binary; `little` selects little endian,
    /// everything else big endian. All other tokens are treated as ASCII.
    pub fn from_format_token(token: &str) -> Self {
        if token.contains("binary") {
            if token.contains("little") {
                PlyEncoding::BinaryLittleEndian
            } else {
                PlyEncoding::BinaryBigEndian
            }
        } else {
            PlyEncoding::Ascii
        }
    }

    /// Token written on the `format` header line
    pub fn format_token(&self) -> &'static str {
        match self {
            PlyEncoding::Ascii => "ascii",
            PlyEncoding::BinaryLittleEndian => "binary_little_endian",
            PlyEncoding::BinaryBigEndian => "binary_big_endian",
        }
    }

    pub fn is_binary(&self) -> bool {
        !matches!(self, PlyEncoding::Ascii)
    }
}

impl std::fmt::Display for PlyEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.format_token())
    }
}

/// Decoded PLY header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyHeader {
    pub encoding: PlyEncoding,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Type names of the vertex properties, in declaration order
    pub vertex_properties: Vec<String>,
}

impl Default for PlyHeader {
    fn default() -> Self {
        Self {
            encoding: PlyEncoding::Ascii,
            vertex_count: 0,
            face_count: 0,
            vertex_properties: Vec::new(),
        }
    }
}

impl PlyHeader {
    /// Byte width of one binary vertex record
    pub fn vertex_stride(&self) -> usize {
        vertex_stride(&self.vertex_properties)
    }
}

/// Byte size of a scalar PLY property type.
///
/// Types outside the table (including `list`) count as 0.
pub fn property_size(type_name: &str) -> usize {
    match type_name {
        "float" | "float32" => 4,
        "double" | "float64" => 8,
        "uchar" | "uint8" | "char" | "int8" => 1,
        "int" | "int32" | "uint" | "uint32" => 4,
        _ => 0,
    }
}

/// Byte width of a binary vertex record with the given property types.
///
/// Falls back to [`DEFAULT_VERTEX_STRIDE`] when nothing has a known size.
pub fn vertex_stride<S: AsRef<str>>(property_types: &[S]) -> usize {
    let stride: usize = property_types
        .iter()
        .map(|t| property_size(t.as_ref()))
        .sum();

    if stride == 0 {
        DEFAULT_VERTEX_STRIDE
    } else {
        stride
    }
}

/// Where the header parser is relative to the element declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Before `element vertex`
    Preamble,
    /// Between `element vertex` and `element face`; `property` lines are
    /// vertex properties
    VertexProperties,
    /// After `element face`
    FaceElement,
    /// `end_header` reached
    Done,
}

/// Line-at-a-time PLY header parser
#[derive(Debug, Clone)]
pub struct HeaderParser {
    state: HeaderState,
    header: PlyHeader,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderParser {
    pub fn new() -> Self {
        Self {
            state: HeaderState::Preamble,
            header: PlyHeader::default(),
        }
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == HeaderState::Done
    }

    /// Feed one header line (without the line terminator)
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line == "end_header" {
            self.state = HeaderState::Done;
            return Ok(());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", encoding, ..] => {
                self.header.encoding = PlyEncoding::from_format_token(encoding);
            }
            ["format"] => {
                return Err(Error::InvalidData("format line without encoding".to_string()));
            }
            ["element", "vertex", .., count] => {
                self.header.vertex_count = parse_token(count, "vertex count")?;
                if self.state == HeaderState::Preamble {
                    self.state = HeaderState::VertexProperties;
                }
            }
            ["element", "face", .., count] => {
                self.header.face_count = parse_token(count, "face count")?;
                self.state = HeaderState::FaceElement;
            }
            ["element", element @ ("vertex" | "face")] => {
                return Err(Error::InvalidData(format!("element {} without a count", element)));
            }
            ["property", type_name, ..] if self.state == HeaderState::VertexProperties => {
                self.header.vertex_properties.push(type_name.to_string());
            }
            _ => {
                // comment, obj_info, magic, other elements and their properties
            }
        }

        Ok(())
    }

    /// Finish parsing. Fails unless `end_header` was seen.
    pub fn finish(self) -> Result<PlyHeader> {
        if self.is_done() {
            Ok(self.header)
        } else {
            Err(Error::InvalidData("Unexpected end of file in PLY header".to_string()))
        }
    }
}

/// A decoded PLY mesh together with its header
#[derive(Debug, Clone)]
pub struct DecodedPly {
    pub header: PlyHeader,
    pub mesh: PolygonMesh,
}

impl DecodedPly {
    /// True when fewer records were decoded than the header declares
    pub fn is_truncated(&self) -> bool {
        self.mesh.vertex_count() < self.header.vertex_count
            || self.mesh.face_count() < self.header.face_count
    }
}

/// Streaming PLY mesh reader
pub struct PlyMeshReader;

impl PlyMeshReader {
    /// Read a PLY file, returning the header and decoded mesh
    pub fn read_ply_file<P: AsRef<Path>>(path: P) -> Result<DecodedPly> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_ply_data(&mut reader)
    }

    /// Read PLY data from a reader positioned at the start of the file
    pub fn read_ply_data<R: BufRead>(reader: &mut R) -> Result<DecodedPly> {
        let header = Self::read_header(reader)?;
        debug!(
            encoding = %header.encoding,
            vertices = header.vertex_count,
            faces = header.face_count,
            stride = header.vertex_stride(),
            "Parsed PLY header"
        );

        let (vertices, faces) = match header.encoding {
            PlyEncoding::Ascii => read_ascii_body(reader, &header)?,
            PlyEncoding::BinaryLittleEndian => read_binary_body::<LittleEndian, _>(reader, &header)?,
            PlyEncoding::BinaryBigEndian => read_binary_body::<BigEndian, _>(reader, &header)?,
        };

        let decoded = DecodedPly {
            header,
            mesh: PolygonMesh::new(vertices, faces),
        };

        if decoded.is_truncated() {
            warn!(
                declared_vertices = decoded.header.vertex_count,
                read_vertices = decoded.mesh.vertex_count(),
                declared_faces = decoded.header.face_count,
                read_faces = decoded.mesh.face_count(),
                "PLY data ended before the declared counts"
            );
        }

        Ok(decoded)
    }

    /// Read only the header of a PLY file
    pub fn read_header_file<P: AsRef<Path>>(path: P) -> Result<PlyHeader> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_header(&mut reader)
    }

    /// Read the header, leaving the reader at the first data byte
    pub fn read_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader> {
        let mut parser = HeaderParser::new();
        let mut buf = Vec::new();

        while !parser.is_done() {
            match read_ascii_line(reader, &mut buf)? {
                Some(line) => parser.feed_line(line)?,
                None => break,
            }
        }

        parser.finish()
    }

    /// Read a PLY file, reporting any failure as `None`.
    ///
    /// Failures are logged at `warn` level. Truncated data is not a failure.
    pub fn read_best_effort<P: AsRef<Path>>(path: P) -> Option<PolygonMesh> {
        let path = path.as_ref();
        match Self::read_ply_file(path) {
            Ok(decoded) => Some(decoded.mesh),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read PLY mesh");
                None
            }
        }
    }
}

/// Read one `\n` terminated line that must be ASCII. `None` at end of input.
fn read_ascii_line<'a, R: BufRead>(reader: &mut R, buf: &'a mut Vec<u8>) -> Result<Option<&'a str>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }

    if !buf.is_ascii() {
        return Err(Error::InvalidData("Non-ASCII text in PLY file".to_string()));
    }

    std::str::from_utf8(buf)
        .map(Some)
        .map_err(|e| Error::InvalidData(e.to_string()))
}

fn parse_token<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse::<T>()
        .map_err(|_| Error::Parse(format!("Invalid {} value: {}", what, token)))
}

/// Parse an ASCII face index. A negative index or one too large for `usize`
/// can never refer to a vertex and gives `None`; a non-numeric token is an error.
fn parse_face_index(token: &str) -> Result<Option<usize>> {
    match token.parse::<i64>() {
        Ok(index) => Ok(usize::try_from(index).ok()),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => Ok(None),
        Err(_) => Err(Error::Parse(format!("Invalid face index value: {}", token))),
    }
}

/// Read up to `len` bytes, returning how many were available
fn read_up_to<R: Read>(reader: &mut R, buf: &mut Vec<u8>, len: usize) -> Result<usize> {
    buf.clear();
    reader.by_ref().take(len as u64).read_to_end(buf)?;
    Ok(buf.len())
}

fn read_binary_body<E: ByteOrder, R: Read>(
    reader: &mut R,
    header: &PlyHeader,
) -> Result<(Vec<Vertex>, Vec<Face>)> {
    let stride = header.vertex_stride();
    let mut buf = Vec::with_capacity(stride);

    let mut vertices: Vec<Vertex> = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATION));
    for _ in 0..header.vertex_count {
        if read_up_to(reader, &mut buf, stride)? < POSITION_BYTES {
            break;
        }
        let x = E::read_f32(&buf[0..4]);
        let y = E::read_f32(&buf[4..8]);
        let z = E::read_f32(&buf[8..12]);
        vertices.push(Vertex::new(x as f64, y as f64, z as f64));
    }

    let mut faces: Vec<Face> = Vec::with_capacity(header.face_count.min(MAX_PREALLOCATION));
    for _ in 0..header.face_count {
        let n = match reader.read_u8() {
            Ok(n) => n as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        let len = n * 4;
        if read_up_to(reader, &mut buf, len)? < len {
            break;
        }
        faces.push(buf.chunks_exact(4).map(|c| E::read_u32(c) as usize).collect());
    }

    Ok((vertices, faces))
}

fn read_ascii_body<R: BufRead>(reader: &mut R, header: &PlyHeader) -> Result<(Vec<Vertex>, Vec<Face>)> {
    let mut buf = Vec::new();

    let mut vertices: Vec<Vertex> = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATION));
    for _ in 0..header.vertex_count {
        let Some(line) = read_ascii_line(reader, &mut buf)? else {
            break;
        };
        let mut tokens = line.split_whitespace();
        let (Some(x), Some(y), Some(z)) = (tokens.next(), tokens.next(), tokens.next()) else {
            break;
        };
        vertices.push(Vertex::new(
            parse_token(x, "vertex coordinate")?,
            parse_token(y, "vertex coordinate")?,
            parse_token(z, "vertex coordinate")?,
        ));
    }

    let mut faces: Vec<Face> = Vec::with_capacity(header.face_count.min(MAX_PREALLOCATION));
    for index in 0..header.face_count {
        let Some(line) = read_ascii_line(reader, &mut buf)? else {
            break;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            trace!(face = index, "Skipping empty face line");
            continue;
        };

        let n: usize = parse_token(first, "face vertex count")?;
        if tokens.len() < n.saturating_add(1) {
            trace!(face = index, declared = n, found = tokens.len() - 1, "Skipping short face line");
            continue;
        }

        let indices = tokens[1..=n]
            .iter()
            .map(|t| parse_face_index(t))
            .collect::<Result<Option<Face>>>()?;
        match indices {
            Some(face) => faces.push(face),
            None => trace!(face = index, "Skipping face with an index outside the vertex range"),
        }
    }

    Ok((vertices, faces))
}

/// PLY write options
#[derive(Debug, Clone)]
pub struct PlyWriteOptions {
    pub encoding: PlyEncoding,
    pub comments: Vec<String>,
}

impl Default for PlyWriteOptions {
    fn default() -> Self {
        Self {
            encoding: PlyEncoding::BinaryLittleEndian,
            comments: Vec::new(),
        }
    }
}

impl PlyWriteOptions {
    pub fn ascii() -> Self {
        Self {
            encoding: PlyEncoding::Ascii,
            ..Self::default()
        }
    }

    pub fn binary_little_endian() -> Self {
        Self::default()
    }

    pub fn binary_big_endian() -> Self {
        Self {
            encoding: PlyEncoding::BinaryBigEndian,
            ..Self::default()
        }
    }

    /// Add a header comment
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comments.push(comment.into());
        self
    }
}

/// PLY mesh writer
///
/// Vertices are written as `float x y z`, faces as
/// `list uchar int vertex_indices`, which is the layout the reader expects.
pub struct PlyMeshWriter;

impl PlyMeshWriter {
    /// Write a mesh to a PLY file
    pub fn write_ply_file<P: AsRef<Path>>(
        mesh: &PolygonMesh,
        path: P,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_ply_data(mesh, &mut writer, options)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a mesh as PLY to any writer
    pub fn write_ply_data<W: Write>(
        mesh: &PolygonMesh,
        writer: &mut W,
        options: &PlyWriteOptions,
    ) -> Result<()> {
        Self::write_header(mesh, writer, options)?;

        match options.encoding {
            PlyEncoding::Ascii => write_ascii_body(mesh, writer),
            PlyEncoding::BinaryLittleEndian => write_binary_body::<LittleEndian, _>(mesh, writer),
            PlyEncoding::BinaryBigEndian => write_binary_body::<BigEndian, _>(mesh, writer),
        }
    }

    fn write_header<W: Write>(mesh: &PolygonMesh, writer: &mut W, options: &PlyWriteOptions) -> Result<()> {
        writeln!(writer, "ply")?;
        writeln!(writer, "format {} 1.0", options.encoding.format_token())?;
        for comment in &options.comments {
            writeln!(writer, "comment {}", comment)?;
        }
        writeln!(writer, "element vertex {}", mesh.vertex_count())?;
        writeln!(writer, "property float x")?;
        writeln!(writer, "property float y")?;
        writeln!(writer, "property float z")?;
        writeln!(writer, "element face {}", mesh.face_count())?;
        writeln!(writer, "property list uchar int vertex_indices")?;
        writeln!(writer, "end_header")?;
        Ok(())
    }
}

fn write_ascii_body<W: Write>(mesh: &PolygonMesh, writer: &mut W) -> Result<()> {
    for v in mesh.vertices() {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for face in mesh.faces() {
        write!(writer, "{}", face.len())?;
        for index in face {
            write!(writer, " {}", index)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn write_binary_body<E: ByteOrder, W: Write>(mesh: &PolygonMesh, writer: &mut W) -> Result<()> {
    for v in mesh.vertices() {
        writer.write_f32::<E>(v.x as f32)?;
        writer.write_f32::<E>(v.y as f32)?;
        writer.write_f32::<E>(v.z as f32)?;
    }

    for face in mesh.faces() {
        let n = u8::try_from(face.len()).map_err(|_| {
            Error::InvalidData(format!("Face with {} vertices does not fit a uchar count", face.len()))
        })?;
        writer.write_u8(n)?;
        for &index in face {
            let index = u32::try_from(index)
                .map_err(|_| Error::InvalidData(format!("Vertex index {} exceeds 32 bits", index)))?;
            writer.write_u32::<E>(index)?;
        }
    }

    Ok(())
}
