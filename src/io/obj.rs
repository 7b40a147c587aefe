//! Wavefront OBJ output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::QuadSoup;

/// Write a quad soup as OBJ text.
///
/// Vertices are written in index order and faces use 1-based indices.
pub fn write<W: Write>(soup: &QuadSoup, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by quadpatch")?;
    writeln!(
        writer,
        "# {} vertices, {} quads",
        soup.num_vertices(),
        soup.num_quads()
    )?;

    for p in &soup.positions {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for q in &soup.quads {
        writeln!(writer, "f {} {} {} {}", q[0] + 1, q[1] + 1, q[2] + 1, q[3] + 1)?;
    }
    Ok(())
}

/// Save a quad soup to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use quadpatch::io::obj;
/// use quadpatch::mesh::QuadSoup;
///
/// let soup = QuadSoup::new();
/// obj::save(&soup, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(soup: &QuadSoup, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(soup, &mut writer)?;
    writer.flush()?;
    Ok(())
}
