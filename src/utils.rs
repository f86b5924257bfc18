use crate::error::{Error, Result};

pub fn read_u8(data: &[u8], pos: &mut usize) -> Result<u8> {
    if *pos >= data.len() {
        return Err(Error::ParseError("Unexpected end of data while reading u8".to_string()));
    }

    let value = data[*pos];
    *pos += 1;
    Ok(value)
}

pub fn read_u16(data: &[u8], pos: &mut usize) -> Result<u16> {
    if *pos + 2 > data.len() {
        return Err(Error::ParseError("Unexpected end of data while reading u16".to_string()));
    }

    let value = u16::from_be_bytes([data[*pos], data[*pos + 1]]);
    *pos += 2;
    Ok(value)
}

pub fn read_u24(data: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 3 > data.len() {
        return Err(Error::ParseError("Unexpected end of data while reading u24".to_string()));
    }

    let value = u32::from_be_bytes([0, data[*pos], data[*pos + 1], data[*pos + 2]]);
    *pos += 3;
    Ok(value)
}

pub fn read_u48(data: &[u8], pos: &mut usize) -> Result<u64> {
    let bytes = read_bytes(data, pos, 6)?;
    let mut buf = [0u8; 8];
    buf[2..].copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buf))
}

pub fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    if *pos + len > data.len() {
        return Err(Error::ParseError(format!(
            "Unexpected end of data while reading {} bytes",
            len
        )));
    }

    let bytes = &data[*pos..*pos + len];
    *pos += len;
    Ok(bytes)
}

pub fn read_vector_u8<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u8(data, pos)? as usize;
    read_bytes(data, pos, len)
}

pub fn read_vector_u16<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let len = read_u16(data, pos)? as usize;
    read_bytes(data, pos, len)
}

pub fn write_u8(vec: &mut Vec<u8>, value: u8) {
    vec.push(value);
}

pub fn write_u16(vec: &mut Vec<u8>, value: u16) {
    vec.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u24(vec: &mut Vec<u8>, value: u32) -> Result<()> {
    if value > 0xFF_FFFF {
        return Err(Error::ProtocolError(format!("Value {} too large for u24", value)));
    }
    let bytes = value.to_be_bytes();
    vec.extend_from_slice(&bytes[1..4]);
    Ok(())
}

pub fn write_u48(vec: &mut Vec<u8>, value: u64) -> Result<()> {
    if value > 0xFFFF_FFFF_FFFF {
        return Err(Error::ProtocolError(format!("Value {} too large for u48", value)));
    }
    let bytes = value.to_be_bytes();
    vec.extend_from_slice(&bytes[2..8]);
    Ok(())
}

pub fn write_vector_u8(vec: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    if data.len() > 255 {
        return Err(Error::ProtocolError("Data too large for u8 length prefix".to_string()));
    }
    write_u8(vec, data.len() as u8);
    vec.extend_from_slice(data);
    Ok(())
}

pub fn write_vector_u16(vec: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    if data.len() > 65535 {
        return Err(Error::ProtocolError("Data too large for u16 length prefix".to_string()));
    }
    write_u16(vec, data.len() as u16);
    vec.extend_from_slice(data);
    Ok(())
}
