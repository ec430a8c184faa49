//! Normalized bounding-box label lines (`class cx cy w h`)
//!
//! A label file holds one line per object. Tiles without objects get no file
//! at all, so a missing label file means "zero objects".

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::image_processing::composite::PasteRegion;

/// Box center and size as fractions of the tile edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn from_region(region: &PasteRegion, tile_size: u32) -> Self {
        let tile = tile_size as f64;
        let (x, y) = (region.x as f64, region.y as f64);
        let (w, h) = (region.width as f64, region.height as f64);

        Self {
            cx: (x + w / 2.0) / tile,
            cy: (y + h / 2.0) / tile,
            width: w / tile,
            height: h / tile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLine {
    pub class_id: u32,
    pub bbox: NormalizedBox,
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.bbox.cx, self.bbox.cy, self.bbox.width, self.bbox.height
        )
    }
}

impl LabelLine {
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(anyhow::anyhow!(
                "Expected 5 fields in label line, got {}: '{}'",
                fields.len(),
                line
            ));
        }

        let class_id = fields[0]
            .parse::<u32>()
            .with_context(|| format!("Invalid class id '{}'", fields[0]))?;
        let mut values = [0.0f64; 4];
        for (value, field) in values.iter_mut().zip(&fields[1..]) {
            *value = field
                .parse::<f64>()
                .with_context(|| format!("Invalid box value '{}'", field))?;
        }

        Ok(Self {
            class_id,
            bbox: NormalizedBox {
                cx: values[0],
                cy: values[1],
                width: values[2],
                height: values[3],
            },
        })
    }
}

/// Write a label file with one line per object, overwriting any existing file
pub fn write_label_file(path: &Path, lines: &[LabelLine]) -> Result<()> {
    let contents: String = lines.iter().map(|line| format!("{}\n", line)).collect();
    fs::write(path, contents)
        .with_context(|| format!("Failed to write label file: {}", path.display()))
}

/// Read every line of a label file; a missing file yields no objects
pub fn read_label_file(path: &Path) -> Result<Vec<LabelLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read label file: {}", path.display()))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(LabelLine::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_region() {
        let region = PasteRegion {
            x: 10,
            y: 20,
            width: 40,
            height: 30,
        };
        let bbox = NormalizedBox::from_region(&region, 128);
        assert_eq!(bbox.cx, 30.0 / 128.0);
        assert_eq!(bbox.cy, 35.0 / 128.0);
        assert_eq!(bbox.width, 40.0 / 128.0);
        assert_eq!(bbox.height, 30.0 / 128.0);
    }

    #[test]
    fn test_format_six_decimals() {
        let line = LabelLine {
            class_id: 0,
            bbox: NormalizedBox::from_region(
                &PasteRegion {
                    x: 0,
                    y: 88,
                    width: 43,
                    height: 40,
                },
                128,
            ),
        };
        assert_eq!(line.to_string(), "0 0.167969 0.843750 0.335938 0.312500");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(LabelLine::parse("0 0.5 0.5 0.1").is_err());
        assert!(LabelLine::parse("x 0.5 0.5 0.1 0.1").is_err());

        let parsed = LabelLine::parse("2 0.500000 0.250000 0.100000 0.200000").unwrap();
        assert_eq!(parsed.class_id, 2);
        assert_eq!(parsed.bbox.cy, 0.25);
    }

    #[test]
    fn test_missing_label_file_means_no_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1__1_r000_c000.txt");
        assert!(read_label_file(&path).unwrap().is_empty());

        let line = LabelLine {
            class_id: 0,
            bbox: NormalizedBox {
                cx: 0.5,
                cy: 0.5,
                width: 0.25,
                height: 0.25,
            },
        };
        write_label_file(&path, &[line]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "0 0.500000 0.500000 0.250000 0.250000\n"
        );
        assert_eq!(read_label_file(&path).unwrap().len(), 1);
    }
}
