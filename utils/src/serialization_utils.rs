use std::io::{Read, Write};
use std::mem::size_of;

pub fn write_u32<W: Write>(writer: &mut W, v: u32) -> Result<(), std::io::Error> {
    writer.write_all(&v.to_le_bytes())
}

pub fn write_u64<W: Write>(writer: &mut W, v: u64) -> Result<(), std::io::Error> {
    writer.write_all(&v.to_le_bytes())
}

pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32, std::io::Error> {
    let mut buf = [0u8; size_of::<u32>()];
    reader.read_exact(&mut buf[..])?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64, std::io::Error> {
    let mut buf = [0u8; size_of::<u64>()];
    reader.read_exact(&mut buf[..])?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x0102_0304).unwrap();
        write_u64(&mut buf, 7).unwrap();
        assert_eq!(&buf[..4], &[4, 3, 2, 1]);
        assert_eq!(buf.len(), 12);

        let mut r = Cursor::new(buf);
        assert_eq!(read_u32(&mut r).unwrap(), 0x0102_0304);
        assert_eq!(read_u64(&mut r).unwrap(), 7);
        assert!(read_u32(&mut r).is_err());
    }
}
