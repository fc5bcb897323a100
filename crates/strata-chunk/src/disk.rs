use std::io::{self, Read, Write};

use strata_blocks::Block;

use crate::{ChunkBuf, ChunkCoord};

const MAGIC: [u8; 4] = *b"SCK1";

impl ChunkBuf {
    /// Serializes the block grid. Light is not stored; it is recomputed
    /// after load.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_all(&self.coord.cx.to_le_bytes())?;
        w.write_all(&self.coord.cz.to_le_bytes())?;
        w.write_all(&(self.sx as u16).to_le_bytes())?;
        w.write_all(&(self.sy as u16).to_le_bytes())?;
        w.write_all(&(self.sz as u16).to_le_bytes())?;
        let mut bytes = Vec::with_capacity(self.blocks.len() * 2);
        for b in &self.blocks {
            bytes.extend_from_slice(&b.0.to_le_bytes());
        }
        w.write_all(&bytes)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<ChunkBuf> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "bad chunk file magic",
            ));
        }
        let cx = read_i32(r)?;
        let cz = read_i32(r)?;
        let sx = read_u16(r)? as usize;
        let sy = read_u16(r)? as usize;
        let sz = read_u16(r)? as usize;
        let n = sx * sy * sz;
        if n == 0 || n > 1 << 24 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unreasonable chunk dimensions",
            ));
        }
        let mut bytes = vec![0u8; n * 2];
        r.read_exact(&mut bytes)?;
        let blocks = bytes
            .chunks_exact(2)
            .map(|c| Block(u16::from_le_bytes([c[0], c[1]])))
            .collect();
        let mut buf = ChunkBuf::from_blocks(ChunkCoord::new(cx, cz), sx, sy, sz, blocks);
        // Loaded chunks were meshed before being spilled; only light and
        // mesh need rebuilding, they are not "fresh".
        buf.fresh = false;
        Ok(buf)
    }
}

fn read_i32<R: Read>(r: &mut R) -> io::Result<i32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(i32::from_le_bytes(b))
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_survive_a_disk_trip() {
        let mut c = ChunkBuf::with_dims(ChunkCoord::new(-3, 9), 4, 8, 4);
        c.set_block(1, 2, 3, Block(7));
        c.set_block(0, 0, 0, Block(8));
        c.set_light(1, 2, 3, 0.5);
        let mut bytes = Vec::new();
        c.write_to(&mut bytes).unwrap();
        let d = ChunkBuf::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(d.coord, c.coord);
        assert_eq!(d.blocks, c.blocks);
        // Light is recomputed after load, not persisted.
        assert!(d.light_dirty);
        assert!(!d.fresh);
    }

    #[test]
    fn rejects_garbage() {
        let bytes = b"not a chunk".to_vec();
        assert!(ChunkBuf::read_from(&mut bytes.as_slice()).is_err());
    }
}
