//! Read and write NDArrays as Numpy arrays

use ndarray::prelude::*;
use std::fs::File;
use std::path::Path;
use std::str;
use std::io::{BufWriter, Read, Write};
use regex::bytes::Regex;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use errors::*;
use memmap::{Mmap, MmapOptions};

const MAGIC: &'static [u8] = b"\x93NUMPY\x01\x00";
/// Magic string, version number and 2 bytes for the header length number
const PREAMBLE_LEN: usize = 10;

/// Write an array as a numpy array (little-endian f64, C order)
pub fn write_matrix<S, P>(path: P, arr: &ArrayBase<S, Ix2>) -> Result<()>
    where S: ndarray::Data<Elem=f64>, P: AsRef<Path> {
    let header_nospace = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        arr.shape()[0], arr.shape()[1]);
    let virtual_len =
        // Calculating how many bytes we have in the header, so we can get alignment
        header_nospace.len()
        + PREAMBLE_LEN
        + 1 ; // Because there will be a \n added
    let padding_needed = (((virtual_len + 15) / 16) * 16) - virtual_len; // to get to the next 16

    // Numpy version 1.0
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_u16::<LittleEndian>((header_nospace.len() + padding_needed + 1) as u16)?;
    write!(writer, "{}{}\n", header_nospace, " ".repeat(padding_needed))?;
    // Iteration is in logical (C) order regardless of the memory layout
    for &x in arr.iter() {
        writer.write_f64::<LittleEndian>(x)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a Numpy matrix into memory. Be careful if it's large. You could run out of memory.
///
/// You need to know the number of dimensions at compile time so for convenience, we assume you
/// need a matrix.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let mut reader = File::open(path.as_ref())
        .map_err(|e| Error::MissingFile(format!("matrix {}", path.as_ref().display()), Some(e)))?;
    let mut content = vec![];
    reader.read_to_end(&mut content)?;
    let (skip, h, w) = parse_header(path.as_ref(), &content)?;
    let bytes = data_bytes(h, w)?;
    let length = content.len() - skip;
    if length != bytes {
        return Err(Error::InvalidDimensions(format!(
            "The numpy file's array is the wrong length for a {}x{} array. \
            It should be {} elements, ({} bytes), but it is actually {} bytes.",
            h, w, h*w, bytes, length)));
    }
    let mut out = vec![0.0f64; h*w];
    let mut data = &content[skip..];
    data.read_f64_into::<LittleEndian>(&mut out)?;
    Ok(Array2::from_shape_vec((h, w), out)?)
}

pub struct MatFile(usize, usize, Mmap);

/// Load a Numpy matrix as an mmap. This only consumes address space. (Part 1)
///
/// This is a two-step process because the Mmap needs to outlive the matrix.
pub fn open_matrix_mmap<P: AsRef<Path>>(path: P) -> Result<MatFile> {
    let mut reader = File::open(path.as_ref())
        .map_err(|e| Error::MissingFile(format!("matrix {}", path.as_ref().display()), Some(e)))?;
    let mut content = vec![0u8; PREAMBLE_LEN];
    reader.read_exact(&mut content)
        .map_err(|_| helpful_complaint(path.as_ref(), &[]))?;
    let header_len = LittleEndian::read_u16(&content[8..PREAMBLE_LEN]) as usize;
    content.resize(PREAMBLE_LEN + header_len, 0);
    reader.read_exact(&mut content[PREAMBLE_LEN..])
        .map_err(|_| helpful_complaint(path.as_ref(), &content))?;
    let (skip, h, w) = parse_header(path.as_ref(), &content)?;
    let bytes = data_bytes(h, w)?;
    let file_len = reader.metadata()?.len() as usize;
    if file_len.checked_sub(skip) != Some(bytes) {
        return Err(Error::InvalidDimensions(format!(
            "{} claims to hold a {}x{} matrix but has {} data bytes",
            path.as_ref().display(), h, w, file_len.saturating_sub(skip))));
    }
    let mmap = unsafe {
        MmapOptions::new().offset(skip as u64).len(bytes).map(&reader)?
    };
    Ok(MatFile(h, w, mmap))
}

/// Load a Numpy matrix as an mmap (Part 2)
///
/// The file you read from must outlive the array, because the array is based on an mmap of that
/// file (so that it doesn't read it into memory). Only works for native little-endian machines.
pub fn read_matrix_mmap<'t>(mmap: &'t MatFile) -> Result<ArrayView2<'t, f64>> {
    let ptr = mmap.2.as_ptr();
    if !cfg!(target_endian = "little") || (ptr as usize) % ::std::mem::align_of::<f64>() != 0 {
        return Err(Error::Other(
            "Can only map little-endian, 8-byte aligned matrices; use read_matrix instead".into()));
    }
    // h*w*8 bytes were checked against the file when it was opened
    unsafe {
        Ok(ArrayView2::from_shape_ptr((mmap.0, mmap.1), ptr as *const f64))
    }
}

/// Size of an `h`×`w` f64 matrix, if it can even be addressed
fn data_bytes(h: usize, w: usize) -> Result<usize> {
    h.checked_mul(w).and_then(|n| n.checked_mul(8))
        .ok_or_else(|| Error::InvalidDimensions(format!("A {}x{} matrix is too large", h, w)))
}

/// Returns where the data starts and the (rows, columns) of the matrix
fn parse_header(p: &Path, content: &[u8]) -> Result<(usize, usize, usize)> {
    let header_match = Regex::new(
        r"^\{'descr': ?'<f8', ?'fortran_order': ?False, ?'shape': ?\((\d+), ?(\d+)\),? ?\} *\n$"
    ).expect("static numpy header pattern");
    if content.len() < PREAMBLE_LEN || &content[..8] != MAGIC {
        return Err(helpful_complaint(p, content));
    }
    let header_len = LittleEndian::read_u16(&content[8..PREAMBLE_LEN]) as usize;
    let skip = PREAMBLE_LEN + header_len;
    if content.len() < skip {
        return Err(helpful_complaint(p, content));
    }
    let captures = header_match.captures(&content[PREAMBLE_LEN..skip])
        .ok_or_else(|| helpful_complaint(p, content))?;
    let dim = |i: usize| -> Result<usize> {
        // The pattern only captures ASCII digits
        let text = str::from_utf8(&captures[i]).unwrap_or("");
        text.parse().map_err(|e| Error::ParseIntError(text.to_string(), e))
    };
    Ok((skip, dim(1)?, dim(2)?))
}

/// Tell the user more info about the file
///
/// It seems verbose but you can see this error often so it save you time.
fn helpful_complaint(p: &Path, header: &[u8]) -> Error {
    let cap = ::std::cmp::min(header.len(), 100);
    let complaint = format!(
        "Expected {} to be an uncompressed numpy (.npy) file, but couldn't \
        parse the header. The first hundred bytes look like:

        {}


        As bytes, the header is as follows:

        {:?}


        It should look something like this example, where . are non-printable characters: \
        NUMPY..{{'descr': '<f8', 'fortran_order': False, 'shape': (34, 27), }}\
        Note: wordbridge only supports 2D little-endian 64-bit float matrices in C order (for \
        simplicity). You may need to change the dtype accordingly.",
        p.display(),
        String::from_utf8_lossy(&header[..cap]),
        &header[..cap]);
    Error::Other(complaint)
}
