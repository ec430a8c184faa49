use anyhow::Result;
use image::{ImageBuffer, RgbImage};

/// One cell of a tile grid, in grid indices and pixel offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    pub col: u32,
    pub row: u32,
    pub x: u32,
    pub y: u32,
}

/// Row-major grid of square tiles covering a padded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub tile: u32,
    pub cols: u32,
    pub rows: u32,
}

impl GridLayout {
    /// Layout for a page whose dimensions are already multiples of `tile`
    pub fn for_padded(width: u32, height: u32, tile: u32) -> Result<Self> {
        if tile == 0 {
            return Err(anyhow::anyhow!("Tile size must be greater than 0"));
        }
        if width % tile != 0 || height % tile != 0 {
            return Err(anyhow::anyhow!(
                "Page {}x{} is not a multiple of tile size {}",
                width,
                height,
                tile
            ));
        }

        Ok(Self {
            tile,
            cols: width / tile,
            rows: height / tile,
        })
    }

    pub fn page_width(&self) -> u32 {
        self.cols * self.tile
    }

    pub fn page_height(&self) -> u32 {
        self.rows * self.tile
    }

    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Cells in row-major order: row outer, column inner
    pub fn cells(&self) -> impl Iterator<Item = TileCell> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).map(move |col| TileCell {
                col,
                row,
                x: col * self.tile,
                y: row * self.tile,
            })
        })
    }
}

/// `{stem}_r{row:03}_c{col:03}.{ext}`
pub fn tile_file_name(stem: &str, cell: &TileCell, extension: &str) -> String {
    format!("{}_r{:03}_c{:03}.{}", stem, cell.row, cell.col, extension)
}

/// Crop an image to specified dimensions
pub fn crop_image(img: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> Result<RgbImage> {
    let (img_width, img_height) = img.dimensions();

    // Validate crop parameters
    if x + width > img_width || y + height > img_height {
        return Err(anyhow::anyhow!(
            "Crop dimensions exceed image bounds: crop({},{},{}x{}) on {}x{} image",
            x,
            y,
            width,
            height,
            img_width,
            img_height
        ));
    }

    Ok(ImageBuffer::from_fn(width, height, |out_x, out_y| {
        *img.get_pixel(x + out_x, y + out_y)
    }))
}
