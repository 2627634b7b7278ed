//! treevol header command - show the decoded PLY header.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use treevol_io::{PlyEncoding, PlyMeshReader};

use crate::{output, Cli, OutputFormat};

#[derive(Debug, Serialize)]
struct HeaderInfo {
    path: String,
    encoding: PlyEncoding,
    vertices: usize,
    faces: usize,
    vertex_properties: Vec<String>,
    vertex_stride: usize,
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let header = PlyMeshReader::read_header_file(input)
        .with_context(|| format!("Failed to read PLY header from {:?}", input))?;

    let info = HeaderInfo {
        path: input.display().to_string(),
        encoding: header.encoding,
        vertices: header.vertex_count,
        faces: header.face_count,
        vertex_stride: header.vertex_stride(),
        vertex_properties: header.vertex_properties,
    };

    match cli.format {
        OutputFormat::Text if !cli.quiet => {
            println!("File: {}", info.path);
            println!("  Encoding: {}", info.encoding);
            println!("  Vertices: {}", info.vertices);
            println!("  Faces: {}", info.faces);
            println!("  Vertex properties: {}", info.vertex_properties.join(" "));
            println!("  Vertex stride: {} bytes", info.vertex_stride);
        }
        OutputFormat::Text => {}
        format => output::print(&info, format, cli.quiet)?,
    }

    Ok(())
}
