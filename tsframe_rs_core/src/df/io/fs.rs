use super::{Header, HEADER_NBYTES};
use crate::{
    df::frame::{Backing, DataFrame},
    error::{Error, Result},
    toolkit::array::AFloat,
};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    path::Path,
    sync::Arc,
};
use tracing::{debug, instrument};

impl<T: AFloat> DataFrame<T> {
    /// Writes the frame to `path`, whatever its ownership is.
    ///
    /// Nothing is done to make the write atomic, a failed save may leave a truncated file.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), shape = ?self.shape()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        self.save_to(&mut file)?;
        file.flush()?;
        debug!("saved");
        Ok(())
    }

    /// Memory maps the file at `path` into a shared frame, nothing is copied until written to.
    ///
    /// The file must not be modified by anyone while the frame (or any frame derived from it
    /// without copying) is alive.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the map is read-only, frames never write through it
        let mmap = unsafe { Mmap::map(&file)? };
        let df = Self::from_backing(Arc::new(Backing::Mmap(mmap)), true)?;
        debug!(shape = ?df.shape(), "mapped");
        Ok(df)
    }

    pub fn save_to(&self, writer: &mut impl Write) -> Result<()> {
        let sections = self.sections()?;
        writer.write_all(&sections.header)?;
        writer.write_all(sections.index)?;
        writer.write_all(sections.columns)?;
        writer.write_all(sections.padding)?;
        writer.write_all(sections.values)?;
        Ok(())
    }

    /// Reads exactly one frame from `reader` into an owned frame.
    ///
    /// The body buffer grows with the bytes actually read, so a header claiming a huge shape
    /// fails with [`Error::CorruptFile`] once the stream runs out.
    pub fn load_from(reader: &mut impl Read) -> Result<Self> {
        let mut header = [0u8; HEADER_NBYTES];
        read_exact(reader, &mut header)?;
        let header = Header::decode::<T>(&header)?;
        let body_nbytes = header.layout::<T>()?.total - HEADER_NBYTES;
        let mut body = Vec::new();
        reader.by_ref().take(body_nbytes as u64).read_to_end(&mut body)?;
        if body.len() < body_nbytes {
            return Err(Error::corrupt(format!(
                "expected {body_nbytes} bytes after the header, got {}",
                body.len()
            )));
        }
        Self::from_body(header, &body)
    }
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => Error::corrupt(format!("expected {} more bytes", buf.len())),
        _ => Error::Io(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::df::{frame::tests::get_test_df, ColumnsDtype};
    use anyhow::Result as AnyResult;
    use ndarray::{Array1, Array2};
    use std::{fs, io::Cursor};
    use tempfile::tempdir;

    macro_rules! test_fs_io {
        ($dtype:ty) => {
            let df = get_test_df::<$dtype>();
            let dir = tempdir()?;
            let file_path = dir.path().join("t0.tsdf");
            df.save(&file_path)?;
            let loaded = DataFrame::<$dtype>::load(&file_path)?;
            assert!(!loaded.is_owned());
            assert_eq!(loaded.index(), df.index());
            assert_eq!(loaded.columns(), df.columns());
            assert_eq!(loaded.values(), df.values());

            let mut file = File::open(&file_path)?;
            let streamed = DataFrame::<$dtype>::load_from(&mut file)?;
            assert!(streamed.is_owned());
            assert_eq!(streamed.values(), df.values());
        };
    }

    #[test]
    fn test_fs_io_f32() -> AnyResult<()> {
        test_fs_io!(f32);
        Ok(())
    }
    #[test]
    fn test_fs_io_f64() -> AnyResult<()> {
        test_fs_io!(f64);
        Ok(())
    }

    #[test]
    fn test_large_round_trip() -> AnyResult<()> {
        let (nrows, ncols) = (239, 5000);
        let index = Array1::from_iter(0..nrows as i64).mapv(|i| i * 1_000_000_000);
        let columns =
            Array1::from_iter((0..ncols).map(|j| ColumnsDtype::from(format!("{j:06}.SZ").as_str())));
        let mut values =
            Array2::from_shape_fn((nrows, ncols), |(i, j)| (i * ncols + j) as f64 * 0.5 - 3.);
        values[[7, 11]] = f64::NAN;
        let df = DataFrame::new(index, columns, values)?;

        let dir = tempdir()?;
        let file_path = dir.path().join("large.tsdf");
        df.save(&file_path)?;
        let loaded = DataFrame::<f64>::load(&file_path)?.into_owned();
        assert!(loaded.is_owned());
        assert_eq!(loaded.index(), df.index());
        assert_eq!(loaded.columns(), df.columns());
        let bits = |df: &DataFrame<f64>| df.values().mapv(f64::to_bits);
        assert_eq!(bits(&loaded), bits(&df));
        Ok(())
    }

    #[test]
    fn test_save_shared_frame() -> AnyResult<()> {
        let df = get_test_df::<f64>();
        let dir = tempdir()?;
        let first = dir.path().join("first.tsdf");
        let second = dir.path().join("second.tsdf");
        df.save(&first)?;
        let loaded = DataFrame::<f64>::load(&first)?;
        loaded.save(&second)?;
        assert_eq!(fs::read(&first)?, fs::read(&second)?);

        let mut copied = loaded.clone();
        copied.values_mut()[[0, 0]] = 42.;
        assert_eq!(loaded.values()[[0, 0]], 1.);
        assert_eq!(DataFrame::<f64>::load(&first)?.values()[[0, 0]], 1.);
        Ok(())
    }

    #[test]
    fn test_load_from_huge_header() {
        let header = Header {
            nrows: 1 << 22,
            ncols: 1 << 22,
        };
        let mut stream = Cursor::new(header.encode::<f64>().to_vec());
        assert!(matches!(
            DataFrame::<f64>::load_from(&mut stream),
            Err(Error::CorruptFile(_))
        ));

        let mut partial = header.encode::<f64>().to_vec();
        partial.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            DataFrame::<f64>::load_from(&mut Cursor::new(partial)),
            Err(Error::CorruptFile(_))
        ));
    }

    #[test]
    fn test_corrupt_file() -> AnyResult<()> {
        let df = get_test_df::<f64>();
        let dir = tempdir()?;
        let file_path = dir.path().join("corrupt.tsdf");
        let bytes = df.to_bytes()?;

        fs::write(&file_path, &bytes[..bytes.len() - 1])?;
        assert!(matches!(
            DataFrame::<f64>::load(&file_path),
            Err(Error::CorruptFile(_))
        ));
        assert!(matches!(
            DataFrame::<f64>::load_from(&mut File::open(&file_path)?),
            Err(Error::CorruptFile(_))
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        fs::write(&file_path, &trailing)?;
        assert!(matches!(
            DataFrame::<f64>::load(&file_path),
            Err(Error::CorruptFile(_))
        ));

        fs::write(&file_path, b"not a frame")?;
        assert!(matches!(
            DataFrame::<f64>::load(&file_path),
            Err(Error::CorruptFile(_))
        ));
        assert!(matches!(
            DataFrame::<f64>::load(dir.path().join("missing.tsdf")),
            Err(Error::Io(_))
        ));
        Ok(())
    }
}
