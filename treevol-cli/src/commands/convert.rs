//! treevol convert command - re-encode a PLY mesh.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use treevol_io::{PlyMeshReader, PlyMeshWriter, PlyWriteOptions};

use crate::{Cli, EncodingArg};

impl From<EncodingArg> for PlyWriteOptions {
    fn from(encoding: EncodingArg) -> Self {
        match encoding {
            EncodingArg::Ascii => PlyWriteOptions::ascii(),
            EncodingArg::BinaryLe => PlyWriteOptions::binary_little_endian(),
            EncodingArg::BinaryBe => PlyWriteOptions::binary_big_endian(),
        }
    }
}

pub fn run(input: &Path, destination: &Path, encoding: EncodingArg, cli: &Cli) -> Result<()> {
    let decoded = PlyMeshReader::read_ply_file(input)
        .with_context(|| format!("Failed to read mesh from {:?}", input))?;

    let options = PlyWriteOptions::from(encoding);
    info!(
        from = %decoded.header.encoding,
        to = %options.encoding,
        vertices = decoded.mesh.vertex_count(),
        faces = decoded.mesh.face_count(),
        "Converting mesh"
    );

    PlyMeshWriter::write_ply_file(&decoded.mesh, destination, &options)
        .with_context(|| format!("Failed to write mesh to {:?}", destination))?;

    if !cli.quiet {
        println!(
            "Wrote {} vertices, {} faces to {} ({})",
            decoded.mesh.vertex_count(),
            decoded.mesh.face_count(),
            destination.display(),
            options.encoding
        );
    }

    Ok(())
}
