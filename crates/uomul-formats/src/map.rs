//! Map land blocks and static blocks
//!
//! ```text
//! mapN.mul: MapBlock × (block_width × block_height), column major
//! MapBlock (196 bytes)
//! ├── header: u32 (unused)
//! └── MapTile × 64 (8 × 8, row major)
//!     ├── id: u16
//!     └── z:  i8
//!
//! staticsN.mul record: StaticTile × n
//! StaticTile (7 bytes)
//! ├── id:  u16
//! ├── x:   u8   (0-7 within the block)
//! ├── y:   u8
//! ├── z:   i8
//! └── hue: i16
//! ```

use crate::error::{EncodeResult, FormatError, Result};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Size of one land block in bytes
pub const MAP_BLOCK_SIZE: usize = 196;

/// Tiles per land block
pub const MAP_BLOCK_TILES: usize = 64;

/// Size of one static tile in bytes
pub const STATIC_TILE_SIZE: usize = 7;

/// A land cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MapTile {
    /// Land art id
    pub id: u16,
    /// Altitude
    pub z: i8,
}

/// An item placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct StaticTile {
    /// Item art id
    pub id: u16,
    /// Column inside the block
    pub x: u8,
    /// Row inside the block
    pub y: u8,
    /// Altitude
    pub z: i8,
    /// Hue id
    pub hue: i16,
}

/// Decoded 8×8 land block
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MapBlock {
    /// Header value, unused by the client
    pub header: u32,
    /// Cells in row-major order
    pub tiles: [MapTile; MAP_BLOCK_TILES],
}

impl MapBlock {
    /// Cell at `(x, y)` inside the block
    pub fn tile(&self, x: usize, y: usize) -> Option<&MapTile> {
        if x >= 8 || y >= 8 {
            return None;
        }
        self.tiles.get((y << 3) + x)
    }
}

/// Decode a land block; the input must be exactly 196 bytes
pub fn decode_map_block(raw: &[u8]) -> Result<MapBlock> {
    if raw.len() != MAP_BLOCK_SIZE {
        return Err(FormatError::UnexpectedLength {
            context: "map block",
            length: raw.len(),
        });
    }
    Ok(MapBlock::read(&mut Cursor::new(raw))?)
}

/// Encode a land block
pub fn encode_map_block(block: &MapBlock) -> EncodeResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(MAP_BLOCK_SIZE));
    block.write(&mut cursor)?;
    Ok(cursor.into_inner())
}

/// Decode a static block; the length must be a multiple of 7
pub fn decode_static_block(raw: &[u8]) -> Result<Vec<StaticTile>> {
    if raw.len() % STATIC_TILE_SIZE != 0 {
        return Err(FormatError::Misaligned {
            context: "static block",
            length: raw.len(),
        });
    }
    let mut cursor = Cursor::new(raw);
    (0..raw.len() / STATIC_TILE_SIZE)
        .map(|_| StaticTile::read(&mut cursor).map_err(FormatError::from))
        .collect()
}

/// Encode a static block
pub fn encode_static_block(tiles: &[StaticTile]) -> EncodeResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(tiles.len() * STATIC_TILE_SIZE));
    for tile in tiles {
        tile.write(&mut cursor)?;
    }
    Ok(cursor.into_inner())
}

/// Size of one of the client's facets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapDefinition {
    /// Facet number, as in `map{id}.mul`
    pub id: u8,
    /// Width in cells
    pub width: u32,
    /// Height in cells
    pub height: u32,
}

impl MapDefinition {
    /// Width in 8×8 blocks
    pub const fn block_width(&self) -> u32 {
        self.width >> 3
    }

    /// Height in 8×8 blocks
    pub const fn block_height(&self) -> u32 {
        self.height >> 3
    }

    /// Whether a block coordinate lies on the facet
    pub const fn in_bounds(&self, block_x: u32, block_y: u32) -> bool {
        block_x < self.block_width() && block_y < self.block_height()
    }

    /// Linear block number, also the record index in `staidx{id}.mul`
    pub const fn block_index(&self, block_x: u32, block_y: u32) -> u64 {
        block_x as u64 * self.block_height() as u64 + block_y as u64
    }

    /// Byte offset of a land block in `map{id}.mul`
    pub const fn block_offset(&self, block_x: u32, block_y: u32) -> u64 {
        self.block_index(block_x, block_y) * MAP_BLOCK_SIZE as u64
    }

    /// Standard facet by id, falling back to Felucca's size for unknown ids
    pub fn for_id(id: u8) -> Self {
        MAP_DEFINITIONS
            .iter()
            .copied()
            .find(|d| d.id == id)
            .unwrap_or(Self {
                id,
                ..MAP_DEFINITIONS[0]
            })
    }
}

/// Facets shipped with the classic client
pub const MAP_DEFINITIONS: [MapDefinition; 6] = [
    MapDefinition { id: 0, width: 6144, height: 4096 },
    MapDefinition { id: 1, width: 6144, height: 4096 },
    MapDefinition { id: 2, width: 2304, height: 1600 },
    MapDefinition { id: 3, width: 2560, height: 2048 },
    MapDefinition { id: 4, width: 1448, height: 1448 },
    MapDefinition { id: 5, width: 1280, height: 4096 },
];

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_block_layout() {
        let mut raw = vec![0u8; MAP_BLOCK_SIZE];
        raw[0..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        // tile 9 = (x 1, y 1)
        raw[4 + 9 * 3..4 + 9 * 3 + 3].copy_from_slice(&[0x34, 0x12, 0xF6]);

        let block = decode_map_block(&raw).unwrap();
        assert_eq!(block.header, 0xDEAD_BEEF);
        assert_eq!(block.tile(1, 1), Some(&MapTile { id: 0x1234, z: -10 }));
        assert!(block.tile(8, 0).is_none());
        assert_eq!(encode_map_block(&block).unwrap(), raw);
    }

    #[test]
    fn test_map_block_length_must_be_exact() {
        for len in [0, 195, 197, 392] {
            assert!(matches!(
                decode_map_block(&vec![0; len]),
                Err(FormatError::UnexpectedLength { .. })
            ));
        }
    }

    #[test]
    fn test_static_block_round_trip() {
        let tiles = vec![
            StaticTile { id: 0x0EED, x: 3, y: 7, z: -5, hue: 0x0481 },
            StaticTile { id: 1, x: 0, y: 0, z: 127, hue: -1 },
        ];
        let raw = encode_static_block(&tiles).unwrap();
        assert_eq!(raw.len(), 14);
        assert_eq!(&raw[..7], &[0xED, 0x0E, 3, 7, 0xFB, 0x81, 0x04]);
        assert_eq!(decode_static_block(&raw).unwrap(), tiles);
        assert!(decode_static_block(&[]).unwrap().is_empty());
        assert!(matches!(
            decode_static_block(&raw[..10]),
            Err(FormatError::Misaligned { length: 10, .. })
        ));
    }

    #[test]
    fn test_definitions() {
        let felucca = MapDefinition::for_id(0);
        assert_eq!((felucca.block_width(), felucca.block_height()), (768, 512));
        assert_eq!(felucca.block_index(2, 3), 2 * 512 + 3);
        assert_eq!(felucca.block_offset(1, 0), 512 * 196);
        assert!(felucca.in_bounds(767, 511));
        assert!(!felucca.in_bounds(768, 0));

        let tokuno = MapDefinition::for_id(4);
        assert_eq!(tokuno.block_width(), 181);

        let unknown = MapDefinition::for_id(9);
        assert_eq!(unknown.id, 9);
        assert_eq!(unknown.width, 6144);
    }
}
