use crate::error::{file_error, io_error, GtError};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

pub fn get_buf_reader(file_path: &str) -> Result<BufReader<File>, GtError> {
    if file_path.is_empty() {
        return Err(file_error("Empty input file path".to_string()));
    }
    Ok(BufReader::new(File::open(file_path).map_err(|e| {
        file_error(format!("Could not open file '{}' for reading: {}", file_path, e))
    })?))
}

pub fn get_file_lines(file_path: &str) -> Result<impl Iterator<Item = String>, GtError> {
    Ok(get_buf_reader(file_path)?.lines().filter_map(Result::ok))
}

pub struct GtWriter {
    buf_writer: BufWriter<File>,
    file_path: String,
}

impl GtWriter {
    pub fn new(file_path: String) -> Result<Self, GtError> {
        let buf_writer = BufWriter::new(File::create(&file_path).map_err(|e| {
            io_error(format!("Could not create file '{}' for writing: {}", file_path, e))
        })?);
        Ok(Self { buf_writer, file_path })
    }

    #[inline]
    pub fn write_file_lines(
        &mut self,
        lines: impl Iterator<Item = String>,
    ) -> Result<(), GtError> {
        for line in lines {
            self.write_file_line(&line)?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_file_line(&mut self, line: &str) -> Result<(), GtError> {
        self.buf_writer
            .write([line, "\n"].concat().as_bytes())
            .map_err(|e| io_error(format!("Could not write to '{}': {}", self.file_path, e)))?;
        Ok(())
    }
}
